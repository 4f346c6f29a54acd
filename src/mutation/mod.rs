//! Optimistic mutations.
//!
//! A mutation runs `Idle → Pending → {Committed, RolledBack}`:
//!
//! 1. [`MutationExecutor::begin`] cancels any in-flight refetch for the
//!    collection, snapshots the store and applies the optimistic write.
//! 2. [`PendingMutation::settle`] issues the remote call. On success the
//!    server's entity replaces the optimistic one; on failure the snapshot is
//!    restored.
//!
//! Each mutation carries its own snapshot. Two mutations that overlap in
//! time can therefore restore each other's writes when one of them fails;
//! there is no cross-mutation serialization.

mod error;
mod executor;
mod record;

pub use error::MutationError;
pub use executor::{MutationExecutor, PendingMutation};
pub use record::{Committed, MutationKind, MutationRecord, MutationStatus};
