//! Remote - the server-side collaborator an entity collection mirrors.
//!
//! Any non-success outcome is a `RemoteError`; callers treat them uniformly
//! as failure and never special-case status codes.

mod error;
mod in_memory;

#[cfg(feature = "http")]
mod config;
#[cfg(feature = "http")]
mod http;

use async_trait::async_trait;

use crate::entity::{Entity, Payload};

pub use error::RemoteError;
pub use in_memory::{CallCounts, InMemoryRemote};

#[cfg(feature = "http")]
pub use config::HttpRemoteConfig;
#[cfg(feature = "http")]
pub use http::HttpRemote;

/// CRUD collaborator for one entity collection.
#[async_trait]
pub trait Remote<E: Entity>: Send + Sync {
    /// Fetch the whole collection.
    async fn list(&self) -> Result<Vec<E>, RemoteError>;

    /// Create an entity; the server assigns the authoritative id.
    async fn create(&self, payload: &Payload) -> Result<E, RemoteError>;

    /// Update the entity with `id` and return the server's version of it.
    async fn update(&self, id: &E::Id, payload: &Payload) -> Result<E, RemoteError>;

    /// Delete the entity with `id`.
    async fn delete(&self, id: &E::Id) -> Result<(), RemoteError>;
}
