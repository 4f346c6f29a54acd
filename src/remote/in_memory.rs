//! InMemoryRemote - Vec-backed stand-in for a REST collection, for testing and offline development.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::{Remote, RemoteError};
use crate::entity::{self, Entity, EntityKey, Payload};

/// Number of calls served, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

struct ServerState<E> {
    entities: Vec<E>,
    next_id: u64,
    failures: VecDeque<RemoteError>,
    latency: Option<Duration>,
    calls: CallCounts,
}

/// In-memory remote collection.
///
/// Behaves like a small REST backend: creates get sequential ids, updates
/// merge fields, unknown ids are rejected with 404. Failures queued with
/// [`fail_next`](Self::fail_next) are returned by the next calls in order.
///
/// Clone-friendly (cloning shares the same server state).
pub struct InMemoryRemote<E: Entity> {
    state: Arc<Mutex<ServerState<E>>>,
}

impl<E: Entity> Clone for InMemoryRemote<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<E: Entity> Default for InMemoryRemote<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryRemote<E> {
    pub fn new() -> Self {
        Self::with_entities(Vec::new())
    }

    /// Start with `entities` already on the server. New ids continue after
    /// the number of seeded entities, skipping any id a seed already holds.
    pub fn with_entities(entities: Vec<E>) -> Self {
        let next_id = entities.len() as u64 + 1;
        Self {
            state: Arc::new(Mutex::new(ServerState {
                entities,
                next_id,
                failures: VecDeque::new(),
                latency: None,
                calls: CallCounts::default(),
            })),
        }
    }

    /// Delay every call by `latency` before it is served.
    pub fn with_latency(self, latency: Duration) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.latency = Some(latency);
        }
        self
    }

    /// Fail the next call (of any kind) with `error`.
    pub fn fail_next(&self, error: RemoteError) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.push_back(error);
        }
    }

    /// The server-side collection.
    pub fn entities(&self) -> Vec<E> {
        self.state
            .lock()
            .map(|state| state.entities.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> CallCounts {
        self.state
            .lock()
            .map(|state| state.calls)
            .unwrap_or_default()
    }

    async fn serve<T>(
        &self,
        count: impl FnOnce(&mut CallCounts),
        handle: impl FnOnce(&mut ServerState<E>) -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let latency = {
            let mut state = self.lock()?;
            count(&mut state.calls);
            state.latency
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock()?;
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        handle(&mut state)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ServerState<E>>, RemoteError> {
        self.state
            .lock()
            .map_err(|_| RemoteError::Transport("in-memory remote poisoned".into()))
    }
}

fn not_found<E: Entity>(id: &E::Id) -> RemoteError {
    RemoteError::rejected_with(404, format!("{} {} not found", E::NAME, id))
}

/// First sequential id from `next_id` on that no entity holds. Gives up
/// once every candidate could have been taken, which only happens when the
/// id type has run out of room.
fn free_id<E: Entity>(state: &ServerState<E>) -> Result<(u64, E::Id), RemoteError> {
    let mut seq = state.next_id;
    for _ in 0..=state.entities.len() {
        let id: E::Id = EntityKey::sequential(seq);
        if !state.entities.iter().any(|e| e.id() == &id) {
            return Ok((seq, id));
        }
        seq = seq.saturating_add(1);
    }
    Err(RemoteError::rejected_with(409, format!("no free {} id", E::NAME)))
}

fn invalid(err: entity::PayloadError) -> RemoteError {
    RemoteError::rejected_with(400, err.to_string())
}

#[async_trait]
impl<E: Entity> Remote<E> for InMemoryRemote<E> {
    async fn list(&self) -> Result<Vec<E>, RemoteError> {
        self.serve(|calls| calls.list += 1, |state| Ok(state.entities.clone()))
            .await
    }

    async fn create(&self, payload: &Payload) -> Result<E, RemoteError> {
        self.serve(
            |calls| calls.create += 1,
            |state| {
                let (seq, id) = free_id(state)?;
                let created: E = entity::build(&id, payload).map_err(invalid)?;
                state.next_id = seq + 1;
                state.entities.push(created.clone());
                Ok(created)
            },
        )
        .await
    }

    async fn update(&self, id: &E::Id, payload: &Payload) -> Result<E, RemoteError> {
        self.serve(
            |calls| calls.update += 1,
            |state| {
                let slot = state
                    .entities
                    .iter_mut()
                    .find(|e| e.id() == id)
                    .ok_or_else(|| not_found::<E>(id))?;
                let updated = entity::overlay(slot, payload).map_err(invalid)?;
                *slot = updated.clone();
                Ok(updated)
            },
        )
        .await
    }

    async fn delete(&self, id: &E::Id) -> Result<(), RemoteError> {
        self.serve(
            |calls| calls.delete += 1,
            |state| {
                let index = state
                    .entities
                    .iter()
                    .position(|e| e.id() == id)
                    .ok_or_else(|| not_found::<E>(id))?;
                state.entities.remove(index);
                Ok(())
            },
        )
        .await
    }
}
