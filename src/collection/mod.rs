//! Collection - one remote resource mirrored in a local store.
//!
//! Bundles an [`EntityStore`], the [`RequestDeduper`] guarding its refetches,
//! the [`Remote`] and a [`MutationExecutor`] that share them.

mod error;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::dedupe::{FetchHandle, RequestDeduper};
use crate::entity::{self, Entity};
use crate::mutation::{Committed, MutationError, MutationExecutor, MutationKind, PendingMutation};
use crate::remote::Remote;
use crate::store::EntityStore;

pub use error::RefetchError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionOptions {
    /// Refetch the whole collection after every mutation run through
    /// [`Collection::execute`] (or its shorthands) settles, successful or not.
    pub refetch_on_settle: bool,
}

impl CollectionOptions {
    pub fn refetch_on_settle(mut self, enabled: bool) -> Self {
        self.refetch_on_settle = enabled;
        self
    }
}

/// What a refetch did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchOutcome {
    /// The store now holds exactly the fetched entities.
    Applied { count: usize },
    /// The fetch was superseded or cancelled; its result was dropped.
    Discarded,
}

pub struct Collection<E: Entity, R> {
    store: EntityStore<E>,
    fetches: RequestDeduper,
    remote: Arc<R>,
    executor: MutationExecutor<E, R>,
    options: CollectionOptions,
}

impl<E: Entity, R> Clone for Collection<E, R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            fetches: self.fetches.clone(),
            remote: Arc::clone(&self.remote),
            executor: self.executor.clone(),
            options: self.options,
        }
    }
}

impl<E: Entity, R: Remote<E>> Collection<E, R> {
    pub fn new(remote: R) -> Self {
        Self::with_options(remote, CollectionOptions::default())
    }

    pub fn with_options(remote: R, options: CollectionOptions) -> Self {
        Self::from_parts(EntityStore::new(), Arc::new(remote), options)
    }

    /// Build around an existing store and a shared remote.
    pub fn from_parts(store: EntityStore<E>, remote: Arc<R>, options: CollectionOptions) -> Self {
        let fetches = RequestDeduper::new();
        let executor = MutationExecutor::new(store.clone(), fetches.clone(), Arc::clone(&remote));
        Self {
            store,
            fetches,
            remote,
            executor,
            options,
        }
    }

    pub fn store(&self) -> &EntityStore<E> {
        &self.store
    }

    pub fn fetches(&self) -> &RequestDeduper {
        &self.fetches
    }

    pub fn remote(&self) -> &R {
        self.remote.as_ref()
    }

    pub fn executor(&self) -> &MutationExecutor<E, R> {
        &self.executor
    }

    pub fn options(&self) -> CollectionOptions {
        self.options
    }

    /// Fetch the whole collection and replace the store with it.
    ///
    /// Starting a refetch supersedes any refetch still in flight, and
    /// beginning a mutation cancels it. A superseded or cancelled refetch
    /// returns [`RefetchOutcome::Discarded`] without touching the store.
    pub async fn refetch(&self) -> Result<RefetchOutcome, RefetchError> {
        let mut handle = self.fetches.begin_fetch(E::COLLECTION)?;
        tracing::trace!(
            collection = E::COLLECTION,
            generation = handle.generation(),
            "Refetch started"
        );

        let listed = tokio::select! {
            biased;
            _ = handle.cancelled() => None,
            result = self.remote.list() => Some(result),
        };

        // A stale fetch is dropped whatever it returned, errors included.
        let entities = match listed {
            Some(Ok(entities)) => entities,
            Some(Err(e)) => {
                if !self.fetches.finish(&handle)? {
                    return Ok(self.discarded(&handle));
                }
                tracing::warn!(collection = E::COLLECTION, error = %e, "Refetch failed");
                return Err(RefetchError::Remote(e));
            }
            None => {
                self.fetches.finish(&handle)?;
                return Ok(self.discarded(&handle));
            }
        };

        // Settle the handle under the store lock: a mutation that begins
        // after this check finds no fetch to cancel and waits for the write.
        let count = entities.len();
        let fetches = &self.fetches;
        if !self
            .store
            .replace_all_unless(entities, || Ok(!fetches.finish(&handle)?))?
        {
            return Ok(self.discarded(&handle));
        }
        tracing::debug!(collection = E::COLLECTION, count, "Refetch applied");
        Ok(RefetchOutcome::Applied { count })
    }

    fn discarded(&self, handle: &FetchHandle) -> RefetchOutcome {
        tracing::debug!(
            collection = E::COLLECTION,
            generation = handle.generation(),
            "Stale refetch discarded"
        );
        RefetchOutcome::Discarded
    }

    /// Apply a mutation optimistically; see [`MutationExecutor::begin`].
    ///
    /// Settling the returned mutation does not trigger
    /// [`CollectionOptions::refetch_on_settle`].
    pub fn begin(
        &self,
        kind: MutationKind,
        payload: Value,
    ) -> Result<PendingMutation<'_, E, R>, MutationError> {
        self.executor.begin(kind, payload)
    }

    pub fn begin_create(&self, payload: Value) -> Result<PendingMutation<'_, E, R>, MutationError> {
        self.begin(MutationKind::Create, payload)
    }

    /// Run a mutation to completion.
    pub async fn execute(
        &self,
        kind: MutationKind,
        payload: Value,
    ) -> Result<Committed<E>, MutationError> {
        let result = self.executor.execute(kind, payload).await;
        let settled = !matches!(result, Err(MutationError::InvalidPayload { .. }));
        if self.options.refetch_on_settle && settled {
            self.refetch_after_settle().await;
        }
        result
    }

    pub async fn create(&self, payload: Value) -> Result<Committed<E>, MutationError> {
        self.execute(MutationKind::Create, payload).await
    }

    /// Update the entity with `id`. `fields` must be a JSON object; its id
    /// field, if any, is overwritten with `id`.
    pub async fn update(&self, id: &E::Id, fields: Value) -> Result<Committed<E>, MutationError> {
        let payload = entity::with_id::<E>(id, fields).map_err(|source| {
            MutationError::InvalidPayload {
                kind: MutationKind::Update,
                source,
            }
        })?;
        self.execute(MutationKind::Update, payload).await
    }

    pub async fn delete(&self, id: &E::Id) -> Result<Committed<E>, MutationError> {
        let payload = entity::with_id::<E>(id, Value::Object(Map::new())).map_err(|source| {
            MutationError::InvalidPayload {
                kind: MutationKind::Delete,
                source,
            }
        })?;
        self.execute(MutationKind::Delete, payload).await
    }

    async fn refetch_after_settle(&self) {
        match self.refetch().await {
            Ok(outcome) => {
                tracing::trace!(collection = E::COLLECTION, ?outcome, "Settle refetch done")
            }
            Err(e) => {
                tracing::warn!(collection = E::COLLECTION, error = %e, "Settle refetch failed")
            }
        }
    }
}
