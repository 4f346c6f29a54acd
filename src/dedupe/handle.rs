use tokio::sync::watch;

/// Registration of one in-flight refetch.
///
/// The handle flips to cancelled when a newer fetch for the same key starts
/// or when a mutation preempts the key. A cancelled handle's result must be
/// dropped.
#[derive(Debug)]
pub struct FetchHandle {
    key: String,
    generation: u64,
    cancelled: watch::Receiver<bool>,
}

impl FetchHandle {
    pub(crate) fn new(key: String, generation: u64, cancelled: watch::Receiver<bool>) -> Self {
        FetchHandle {
            key,
            generation,
            cancelled,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once the fetch is cancelled. Pending forever if the fetch
    /// finishes without being cancelled.
    pub async fn cancelled(&mut self) {
        if self.cancelled.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
