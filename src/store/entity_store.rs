use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entity::Entity;
use crate::error::StoreError;

use super::{Snapshot, StoreOp};

#[cfg(feature = "emitter")]
use super::StoreChange;
#[cfg(feature = "emitter")]
use crate::emitter::ChangeNotifier;

struct StoreState<E> {
    entities: Vec<E>,
    revision: u64,
}

/// In-memory, ordered, id-keyed collection of entities.
///
/// Order is display order: new ids go to the front, replaced ids keep their
/// position. Clone-friendly (cloning shares the same underlying storage).
pub struct EntityStore<E: Entity> {
    state: Arc<RwLock<StoreState<E>>>,
    #[cfg(feature = "emitter")]
    notifier: ChangeNotifier,
}

impl<E: Entity> Clone for EntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            #[cfg(feature = "emitter")]
            notifier: self.notifier.clone(),
        }
    }
}

impl<E: Entity> Default for EntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityStore<E> {
    pub fn new() -> Self {
        Self::from_entities(Vec::new())
    }

    /// Create a store holding `entities` (duplicate ids keep the first occurrence).
    pub fn from_entities(entities: Vec<E>) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState {
                entities: dedupe(entities),
                revision: 0,
            })),
            #[cfg(feature = "emitter")]
            notifier: ChangeNotifier::new(E::COLLECTION),
        }
    }

    /// The current ordered sequence of entities.
    pub fn get_all(&self) -> Result<Vec<E>, StoreError> {
        let state = self.read("get_all")?;
        Ok(state.entities.clone())
    }

    /// Capture the current contents as an immutable snapshot.
    pub fn snapshot(&self) -> Result<Snapshot<E>, StoreError> {
        Ok(Snapshot::new(self.get_all()?))
    }

    pub fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let state = self.read("get")?;
        Ok(state.entities.iter().find(|e| e.id() == id).cloned())
    }

    pub fn contains(&self, id: &E::Id) -> Result<bool, StoreError> {
        let state = self.read("contains")?;
        Ok(state.entities.iter().any(|e| e.id() == id))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read("len")?.entities.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Number of structural writes applied so far.
    pub fn revision(&self) -> Result<u64, StoreError> {
        Ok(self.read("revision")?.revision)
    }

    /// Replace the whole collection, e.g. after a full fetch.
    pub fn replace_all(&self, entities: Vec<E>) -> Result<(), StoreError> {
        self.replace_all_unless(entities, || Ok(false)).map(|_| ())
    }

    /// `replace_all`, skipped if `stale` returns true. `stale` runs under the
    /// write lock, so no other write can slip in between check and replace.
    pub(crate) fn replace_all_unless(
        &self,
        entities: Vec<E>,
        stale: impl FnOnce() -> Result<bool, StoreError>,
    ) -> Result<bool, StoreError> {
        let revision = {
            let mut state = self.write("replace_all")?;
            if stale()? {
                return Ok(false);
            }
            state.entities = dedupe(entities);
            bump(&mut state)
        };
        tracing::trace!(collection = E::COLLECTION, revision, "Store replaced");
        self.changed(StoreOp::ReplaceAll, None, revision);
        Ok(true)
    }

    /// Insert at the front if the id is new, else replace in place.
    pub fn upsert(&self, entity: E) -> Result<(), StoreError> {
        let label = entity.id().to_string();
        let revision = {
            let mut state = self.write("upsert")?;
            match state.entities.iter().position(|e| e.id() == entity.id()) {
                Some(index) => state.entities[index] = entity,
                None => state.entities.insert(0, entity),
            }
            bump(&mut state)
        };
        tracing::trace!(collection = E::COLLECTION, id = %label, revision, "Entity upserted");
        self.changed(StoreOp::Upsert, Some(label), revision);
        Ok(())
    }

    /// Remove the entity with `id`. Absent ids are a no-op; returns whether
    /// anything was removed.
    pub fn remove(&self, id: &E::Id) -> Result<bool, StoreError> {
        let revision = {
            let mut state = self.write("remove")?;
            let Some(index) = state.entities.iter().position(|e| e.id() == id) else {
                return Ok(false);
            };
            state.entities.remove(index);
            bump(&mut state)
        };
        tracing::trace!(collection = E::COLLECTION, id = %id, revision, "Entity removed");
        self.changed(StoreOp::Remove, Some(id.to_string()), revision);
        Ok(true)
    }

    /// Put back exactly the contents captured in `snapshot`.
    pub fn restore(&self, snapshot: &Snapshot<E>) -> Result<(), StoreError> {
        let revision = {
            let mut state = self.write("restore")?;
            state.entities = snapshot.to_vec();
            bump(&mut state)
        };
        tracing::trace!(collection = E::COLLECTION, revision, "Store restored from snapshot");
        self.changed(StoreOp::Restore, None, revision);
        Ok(())
    }

    /// Register a listener called after every structural write.
    #[cfg(feature = "emitter")]
    pub fn on_change<F>(&self, listener: F) -> Result<(), StoreError>
    where
        F: Fn(StoreChange) + Send + Sync + 'static,
    {
        self.notifier.on(listener)
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, StoreState<E>>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, StoreState<E>>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    #[cfg(feature = "emitter")]
    fn changed(&self, op: StoreOp, id: Option<String>, revision: u64) {
        self.notifier.notify(StoreChange {
            collection: E::COLLECTION.to_string(),
            op,
            id,
            revision,
        });
    }

    #[cfg(not(feature = "emitter"))]
    fn changed(&self, _op: StoreOp, _id: Option<String>, _revision: u64) {}
}

fn bump<E>(state: &mut StoreState<E>) -> u64 {
    state.revision += 1;
    state.revision
}

fn dedupe<E: Entity>(entities: Vec<E>) -> Vec<E> {
    let mut seen = HashSet::with_capacity(entities.len());
    entities
        .into_iter()
        .filter(|e| seen.insert(e.id().clone()))
        .collect()
}
