use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use super::handle::FetchHandle;
use crate::error::StoreError;

struct InFlight {
    generation: u64,
    cancel: watch::Sender<bool>,
}

/// Tracks at most one live "refetch all" per resource key.
///
/// Clone-friendly (cloning shares the same registrations).
#[derive(Clone, Default)]
pub struct RequestDeduper {
    in_flight: Arc<Mutex<HashMap<String, InFlight>>>,
    generation: Arc<AtomicU64>,
}

impl RequestDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new fetch for `key`, cancelling the previous one if any.
    pub fn begin_fetch(&self, key: impl AsRef<str>) -> Result<FetchHandle, StoreError> {
        let key = key.as_ref();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (cancel, cancelled) = watch::channel(false);

        let mut in_flight = self.registry("begin_fetch")?;
        if let Some(previous) = in_flight.insert(
            key.to_string(),
            InFlight {
                generation,
                cancel,
            },
        ) {
            previous.cancel.send_replace(true);
            tracing::debug!(
                key,
                superseded = previous.generation,
                generation,
                "Superseded in-flight fetch"
            );
        }

        Ok(FetchHandle::new(key.to_string(), generation, cancelled))
    }

    /// Cancel the in-flight fetch for `key`. Returns whether one was cancelled.
    pub fn cancel(&self, key: impl AsRef<str>) -> Result<bool, StoreError> {
        let key = key.as_ref();
        let mut in_flight = self.registry("cancel")?;
        match in_flight.remove(key) {
            Some(previous) => {
                previous.cancel.send_replace(true);
                tracing::debug!(key, generation = previous.generation, "Cancelled in-flight fetch");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Unregister a settled fetch. Returns true if the handle was still the
    /// current fetch for its key, i.e. its result may be applied.
    pub fn finish(&self, handle: &FetchHandle) -> Result<bool, StoreError> {
        let mut in_flight = self.registry("finish")?;
        let current = in_flight
            .get(handle.key())
            .map(|entry| entry.generation == handle.generation())
            .unwrap_or(false);

        if current {
            in_flight.remove(handle.key());
        }

        Ok(current && !handle.is_cancelled())
    }

    /// Whether a fetch for `key` is currently registered.
    pub fn in_flight(&self, key: impl AsRef<str>) -> Result<bool, StoreError> {
        Ok(self.registry("in_flight")?.contains_key(key.as_ref()))
    }

    fn registry(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, HashMap<String, InFlight>>, StoreError> {
        self.in_flight
            .lock()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }
}
