use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use super::{Committed, MutationError, MutationKind, MutationRecord, MutationStatus};
use crate::dedupe::RequestDeduper;
use crate::entity::{self, Entity, EntityKey, Payload, PayloadError};
use crate::remote::{Remote, RemoteError};
use crate::store::EntityStore;

/// Runs optimistic mutations against a remote while keeping the store
/// optimistically consistent.
///
/// Clone-friendly (clones share the store, the fetch registry, the remote
/// and the provisional id sequence).
pub struct MutationExecutor<E: Entity, R> {
    store: EntityStore<E>,
    fetches: RequestDeduper,
    remote: Arc<R>,
    provisional_seq: Arc<AtomicU64>,
}

impl<E: Entity, R> Clone for MutationExecutor<E, R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            fetches: self.fetches.clone(),
            remote: Arc::clone(&self.remote),
            provisional_seq: Arc::clone(&self.provisional_seq),
        }
    }
}

enum Request<E: Entity> {
    Create(Payload),
    Update(E::Id, Payload),
    Delete(E::Id),
}

/// A mutation whose optimistic write is applied but whose remote call has
/// not been issued yet.
///
/// Dropping it without [`settle`](Self::settle) leaves the optimistic write
/// in the store.
#[must_use = "a pending mutation does nothing until settled"]
pub struct PendingMutation<'a, E: Entity, R> {
    executor: &'a MutationExecutor<E, R>,
    record: MutationRecord<E>,
    request: Request<E>,
}

impl<E: Entity, R: Remote<E>> MutationExecutor<E, R> {
    pub fn new(store: EntityStore<E>, fetches: RequestDeduper, remote: Arc<R>) -> Self {
        Self {
            store,
            fetches,
            remote,
            provisional_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &EntityStore<E> {
        &self.store
    }

    /// Apply a mutation optimistically. Runs synchronously: once this returns
    /// the store already reflects the expected outcome.
    ///
    /// `payload` must be a JSON object. Updates and deletes read the target
    /// id from its id field.
    pub fn begin(
        &self,
        kind: MutationKind,
        payload: Value,
    ) -> Result<PendingMutation<'_, E, R>, MutationError> {
        let invalid = |source: PayloadError| MutationError::InvalidPayload { kind, source };
        let payload = entity::into_payload(payload).map_err(invalid)?;

        // Validate before touching anything so a bad payload leaves no trace.
        let (target_id, optimistic, request) = match kind {
            MutationKind::Create => {
                let id = self.next_provisional_id()?;
                let provisional: E = entity::build(&id, &payload).map_err(invalid)?;
                (id, Some(provisional), Request::Create(payload))
            }
            MutationKind::Update => {
                let id = entity::id_from_payload::<E>(&payload).map_err(invalid)?;
                let merged = match self.store.get(&id)? {
                    Some(existing) => entity::overlay(&existing, &payload),
                    None => entity::build(&id, &payload),
                }
                .map_err(invalid)?;
                (id.clone(), Some(merged), Request::Update(id, payload))
            }
            MutationKind::Delete => {
                let id = entity::id_from_payload::<E>(&payload).map_err(invalid)?;
                (id.clone(), None, Request::Delete(id))
            }
        };

        // A refetch that lands after this point would clobber the optimistic write.
        self.fetches.cancel(E::COLLECTION)?;

        let snapshot = self.store.snapshot()?;
        match optimistic {
            Some(entity) => self.store.upsert(entity)?,
            None => {
                self.store.remove(&target_id)?;
            }
        }

        tracing::debug!(
            collection = E::COLLECTION,
            %kind,
            id = %target_id,
            "Optimistic write applied"
        );

        Ok(PendingMutation {
            executor: self,
            record: MutationRecord::pending(kind, target_id, snapshot),
            request,
        })
    }

    /// `begin` followed by `settle`.
    pub async fn execute(
        &self,
        kind: MutationKind,
        payload: Value,
    ) -> Result<Committed<E>, MutationError> {
        self.begin(kind, payload)?.settle().await
    }

    /// Next provisional id not already in the store. Ids saturate at the
    /// edge of the id type's range, so the search stops after one more
    /// attempt than there are stored entities.
    fn next_provisional_id(&self) -> Result<E::Id, MutationError> {
        for _ in 0..=self.store.len()? {
            let seq = self.provisional_seq.fetch_add(1, Ordering::Relaxed) + 1;
            let id: E::Id = EntityKey::provisional(seq);
            if !self.store.contains(&id)? {
                return Ok(id);
            }
        }
        tracing::warn!(collection = E::COLLECTION, "Provisional ids exhausted");
        Err(MutationError::ProvisionalIdsExhausted { name: E::NAME })
    }
}

impl<'a, E: Entity, R: Remote<E>> PendingMutation<'a, E, R> {
    pub fn record(&self) -> &MutationRecord<E> {
        &self.record
    }

    pub fn kind(&self) -> MutationKind {
        self.record.kind
    }

    pub fn target_id(&self) -> &E::Id {
        &self.record.target_id
    }

    /// Issue the remote call, then commit the server's answer or roll back.
    pub async fn settle(self) -> Result<Committed<E>, MutationError> {
        let PendingMutation {
            executor,
            mut record,
            request,
        } = self;
        let remote = executor.remote.as_ref();

        let result = match &request {
            Request::Create(payload) => remote.create(payload).await.map(Some),
            Request::Update(id, payload) => remote.update(id, payload).await.map(Some),
            Request::Delete(id) => remote.delete(id).await.map(|_| None),
        };

        match result {
            Ok(confirmed) => {
                let store = &executor.store;
                if let Some(entity) = &confirmed {
                    if record.kind == MutationKind::Create {
                        store.remove(&record.target_id)?;
                    }
                    store.upsert(entity.clone())?;
                }

                record.previous_snapshot = None;
                record.status = MutationStatus::Succeeded;
                tracing::debug!(
                    collection = E::COLLECTION,
                    kind = %record.kind,
                    id = %record.target_id,
                    "Mutation committed"
                );

                Ok(Committed {
                    record,
                    entity: confirmed,
                })
            }
            Err(cause) => {
                if let Some(snapshot) = record.previous_snapshot.take() {
                    executor.store.restore(&snapshot)?;
                }
                record.status = MutationStatus::Failed;

                let message = failure_message::<E>(record.kind, &cause);
                tracing::warn!(
                    collection = E::COLLECTION,
                    kind = %record.kind,
                    id = %record.target_id,
                    error = %cause,
                    "Mutation rolled back"
                );

                Err(MutationError::RolledBack {
                    kind: record.kind,
                    id: record.target_id.to_string(),
                    message,
                    cause,
                })
            }
        }
    }
}

/// Server-supplied message when there is one, else "Failed to <kind> <name>".
fn failure_message<E: Entity>(kind: MutationKind, cause: &RemoteError) -> String {
    match cause.server_message() {
        Some(message) => message.to_string(),
        None => format!("Failed to {} {}", kind.verb(), E::NAME),
    }
}
