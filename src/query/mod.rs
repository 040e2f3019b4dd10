use crate::refresh::{FetchKind, Fetcher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Coalesces bursty search/filter changes into at most one fetch per quiet
/// period.
///
/// Both triggers share a single timer: each change re-arms it, aborting the
/// previously armed one, so a burst of N changes inside a window shorter
/// than the delay yields exactly one fetch, delayed from the last change.
/// The latest values of both triggers live in the session's query channel,
/// which the fetcher reads when the timer finally fires.
pub struct QueryDebouncer {
    delay: Duration,
    fetcher: Arc<Fetcher>,
    alive: Arc<AtomicBool>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl QueryDebouncer {
    pub(crate) fn new(delay: Duration, fetcher: Arc<Fetcher>, alive: Arc<AtomicBool>) -> Self {
        Self {
            delay,
            fetcher,
            alive,
            pending: Mutex::new(None),
        }
    }

    pub(crate) async fn rearm(&self) {
        let mut pending = self.pending.lock().await;
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        let fetcher = Arc::clone(&self.fetcher);
        let alive = Arc::clone(&self.alive);
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if alive.load(Ordering::SeqCst) {
                fetcher.fetch(FetchKind::Loud).await;
            }
        }));
    }

    pub(crate) async fn cancel(&self) {
        if let Some(handle) = self.pending.lock().await.take() {
            handle.abort();
        }
    }
}
