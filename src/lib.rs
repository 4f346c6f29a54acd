//! Optimistic client-side entity cache.
//!
//! A [`Collection`] keeps the client's view of a remote resource in an
//! [`EntityStore`], applies mutations to it optimistically, and reconciles
//! with (or rolls back to a snapshot after) the [`Remote`] collaborator's
//! answer. Refetches go through a [`RequestDeduper`] so a stale read never
//! overwrites a newer optimistic write.
//!
//! ```ignore
//! use optimistic_cache::{Collection, InMemoryRemote, Todo};
//! use serde_json::json;
//!
//! let todos = Collection::new(InMemoryRemote::<Todo>::new());
//! todos.refetch().await?;
//!
//! let pending = todos.begin_create(json!({ "title": "Write docs" }))?;
//! // The provisional todo is already visible here.
//! assert_eq!(todos.store().len()?, 1);
//! pending.settle().await?;
//! ```

extern crate self as optimistic_cache;

mod collection;
mod dedupe;
mod entity;
mod error;
mod mutation;
mod remote;
mod store;
mod todo;

#[cfg(feature = "emitter")]
mod emitter;

pub use collection::{Collection, CollectionOptions, RefetchError, RefetchOutcome};
pub use dedupe::{FetchHandle, RequestDeduper};
pub use entity::{Entity, EntityKey, Payload, PayloadError};
pub use error::StoreError;
pub use mutation::{
    Committed, MutationError, MutationExecutor, MutationKind, MutationRecord, MutationStatus,
    PendingMutation,
};
pub use remote::{CallCounts, InMemoryRemote, Remote, RemoteError};
pub use store::{EntityStore, Snapshot, StoreChange, StoreOp};
pub use todo::Todo;

#[cfg(feature = "http")]
pub use remote::{HttpRemote, HttpRemoteConfig};

// Re-export the derive macro
pub use optimistic_cache_macros::Entity;

// Re-export async_trait so custom `Remote` implementations don't need the dependency
pub use async_trait::async_trait;
