use crate::core::{EngineError, ListQuery};
use crate::remote::RemoteCollection;
use crate::store::SharedStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::debug;

/// Whether a fetch is allowed to show the loading indicator and surface
/// errors. Loud fetches show the indicator only when the store starts empty;
/// quiet fetches never show it and swallow failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Loud,
    Quiet,
}

/// Fetches the remote collection with the current query and reconciles the
/// store against the result: a whole-collection overwrite, discarded when
/// structurally equal to what the store already holds.
pub struct Fetcher {
    store: SharedStore,
    remote: Arc<dyn RemoteCollection>,
    query: watch::Receiver<ListQuery>,
    editing: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    loading: watch::Sender<bool>,
    last_error: watch::Sender<Option<EngineError>>,
}

impl Fetcher {
    pub(crate) fn new(
        store: SharedStore,
        remote: Arc<dyn RemoteCollection>,
        query: watch::Receiver<ListQuery>,
        editing: Arc<AtomicBool>,
        alive: Arc<AtomicBool>,
        loading: watch::Sender<bool>,
        last_error: watch::Sender<Option<EngineError>>,
    ) -> Self {
        Self {
            store,
            remote,
            query,
            editing,
            alive,
            loading,
            last_error,
        }
    }

    pub async fn fetch(&self, kind: FetchKind) {
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }
        // Re-entrancy guard: never overwrite data the user is editing.
        if kind == FetchKind::Quiet && self.editing.load(Ordering::SeqCst) {
            debug!("skipping quiet fetch while an editor is open");
            return;
        }

        let query = self.query.borrow().clone();
        let show_indicator =
            kind == FetchKind::Loud && self.store.read().await.is_empty();
        if show_indicator {
            self.loading.send_replace(true);
        }

        let outcome = self.remote.list(&query).await;

        if show_indicator {
            self.loading.send_replace(false);
        }
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }

        match outcome {
            Ok(fetched) => {
                let mut store = self.store.write().await;
                if !store.same_as(&fetched) {
                    store.replace_all(fetched);
                }
            }
            Err(err) => match kind {
                FetchKind::Loud => {
                    self.last_error.send_replace(Some(err));
                }
                FetchKind::Quiet => {
                    debug!(%err, "quiet fetch failed, retried on next tick");
                }
            },
        }
    }
}
