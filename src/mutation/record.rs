use std::fmt;

use crate::entity::Entity;
use crate::store::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn verb(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Pending,
    Succeeded,
    Failed,
}

/// One optimistic operation.
///
/// The record exclusively owns the store snapshot taken before its optimistic
/// write. The snapshot is dropped once the mutation settles.
#[derive(Debug, Clone)]
pub struct MutationRecord<E: Entity> {
    pub kind: MutationKind,
    /// The affected id. For creates this is the provisional id.
    pub target_id: E::Id,
    pub previous_snapshot: Option<Snapshot<E>>,
    pub status: MutationStatus,
}

impl<E: Entity> MutationRecord<E> {
    pub(crate) fn pending(kind: MutationKind, target_id: E::Id, snapshot: Snapshot<E>) -> Self {
        Self {
            kind,
            target_id,
            previous_snapshot: Some(snapshot),
            status: MutationStatus::Pending,
        }
    }
}

/// Successful outcome of a mutation.
#[derive(Debug, Clone)]
pub struct Committed<E: Entity> {
    pub record: MutationRecord<E>,
    /// The server-confirmed entity. `None` for deletes.
    pub entity: Option<E>,
}
