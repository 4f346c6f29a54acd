//! Entities - immutable, id-keyed records cached on the client.
//!
//! ## Example
//!
//! ```ignore
//! use optimistic_cache::Entity;
//!
//! #[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
//! #[entity(collection = "posts", name = "post")]
//! struct Post {
//!     #[entity(id)]
//!     pub id: i64,
//!     pub title: String,
//! }
//! ```

mod key;
mod payload;

use serde::{de::DeserializeOwned, Serialize};

pub use key::EntityKey;
pub use payload::{Payload, PayloadError};

pub(crate) use payload::{build, id_from_payload, into_payload, overlay, with_id};

/// Trait for records that can be held in an `EntityStore`.
///
/// Entities are values: a change produces a new entity, the stored one is never
/// mutated in place.
pub trait Entity: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static {
    /// The resource key for this entity type (e.g., "todos").
    /// Used as the remote path segment and as the refetch deduplication key.
    const COLLECTION: &'static str;

    /// Singular noun used in user-facing failure messages (e.g., "todo").
    const NAME: &'static str;

    /// Name of the serialized identity field.
    const ID_FIELD: &'static str = "id";

    type Id: EntityKey;

    /// Returns the unique identifier for this entity within its collection.
    fn id(&self) -> &Self::Id;
}
