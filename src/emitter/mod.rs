//! Change notification for entity stores (requires the `emitter` feature).
//!
//! Every structural write to an `EntityStore` emits a `StoreChange` on the
//! `"<collection>:changed"` event. Listeners run on the emitter's own threads,
//! so they must be `Send + Sync` and must not assume they run before the
//! write call returns.
//!
//! ```ignore
//! store.on_change(|change| {
//!     println!("{} changed ({:?}) at revision {}", change.collection, change.op, change.revision);
//! })?;
//! ```

use std::sync::{Arc, Mutex};

use event_emitter_rs::EventEmitter;
use crate::error::StoreError;
use crate::store::StoreChange;

/// Shared emitter used by a store and all of its clones.
#[derive(Clone)]
pub(crate) struct ChangeNotifier {
    event: String,
    emitter: Arc<Mutex<EventEmitter>>,
}

impl ChangeNotifier {
    pub(crate) fn new(collection: &str) -> Self {
        Self {
            event: format!("{}:changed", collection),
            emitter: Arc::new(Mutex::new(EventEmitter::new())),
        }
    }

    pub(crate) fn on<F>(&self, listener: F) -> Result<(), StoreError>
    where
        F: Fn(StoreChange) + Send + Sync + 'static,
    {
        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| StoreError::LockPoisoned("listener registration"))?;
        emitter.on(&self.event, move |data: String| {
            match serde_json::from_str::<StoreChange>(&data) {
                Ok(change) => listener(change),
                Err(e) => tracing::warn!(error = %e, "Undecodable store change dropped"),
            }
        });
        Ok(())
    }

    pub(crate) fn notify(&self, change: StoreChange) {
        let data = match serde_json::to_string(&change) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "Store change could not be encoded");
                return;
            }
        };

        match self.emitter.lock() {
            Ok(mut emitter) => {
                emitter.emit(&self.event, data);
            }
            Err(_) => {
                tracing::warn!(event = %self.event, "Store change emitter poisoned; change not delivered");
            }
        }
    }
}
