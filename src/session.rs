use crate::config::EngineConfig;
use crate::core::{EngineError, ListQuery, Note, NoteDraft, NotePatch, Result};
use crate::lifecycle::Activity;
use crate::mutation::MutationExecutor;
use crate::query::QueryDebouncer;
use crate::refresh::{Fetcher, RefreshScheduler};
use crate::remote::RemoteCollection;
use crate::store::{NoteStore, SharedStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

/// One view's session over a note collection.
///
/// Owns the store, the mutation executor, the refresh scheduler and the
/// query debouncer, together with the liveness flag their background tasks
/// consult. Dropping or stopping the session detaches every pending
/// completion from the store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use notesync::{EngineConfig, MockRemote, NoteDraft, NoteSession, lifecycle};
///
/// # tokio_test::block_on(async {
/// let remote = Arc::new(MockRemote::new());
/// let (_activity, activity_rx) = lifecycle::activity_channel();
/// let session = NoteSession::start(remote, activity_rx, EngineConfig::default());
///
/// session.focus_gained().await;
/// session
///     .request_create(NoteDraft::new("Physics", "Newton's laws"))
///     .await
///     .unwrap();
/// assert_eq!(session.snapshot().await.len(), 1);
/// session.stop().await;
/// # });
/// ```
pub struct NoteSession {
    store: SharedStore,
    executor: MutationExecutor,
    scheduler: Arc<RefreshScheduler>,
    debouncer: QueryDebouncer,
    query: watch::Sender<ListQuery>,
    visible: watch::Receiver<Vec<Note>>,
    loading: watch::Receiver<bool>,
    last_error_tx: watch::Sender<Option<EngineError>>,
    last_error: watch::Receiver<Option<EngineError>>,
    editing: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NoteSession {
    /// Wire up a session. Must be called within a Tokio runtime; background
    /// tasks (visible projection, activity watcher) are spawned here.
    pub fn start(
        remote: Arc<dyn RemoteCollection>,
        activity: watch::Receiver<Activity>,
        config: EngineConfig,
    ) -> Self {
        let (store, store_rx) = NoteStore::new();
        let store: SharedStore = Arc::new(tokio::sync::RwLock::new(store));

        let (query_tx, query_rx) = watch::channel(ListQuery::default());
        let (loading_tx, loading_rx) = watch::channel(false);
        let (error_tx, error_rx) = watch::channel(None);
        let alive = Arc::new(AtomicBool::new(true));
        let editing = Arc::new(AtomicBool::new(false));

        let fetcher = Arc::new(Fetcher::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            query_rx.clone(),
            Arc::clone(&editing),
            Arc::clone(&alive),
            loading_tx,
            error_tx.clone(),
        ));
        let scheduler = Arc::new(RefreshScheduler::new(
            Arc::clone(&fetcher),
            &config,
            Arc::clone(&alive),
        ));
        let executor = MutationExecutor::new(
            Arc::clone(&store),
            remote,
            Arc::clone(&scheduler),
            Arc::clone(&editing),
            Arc::clone(&alive),
            error_tx.clone(),
        );
        let debouncer = QueryDebouncer::new(
            config.debounce_delay,
            Arc::clone(&fetcher),
            Arc::clone(&alive),
        );

        let (visible_tx, visible_rx) = watch::channel(Vec::new());
        let projection = Self::spawn_projection(store_rx, query_rx, visible_tx);
        let activity_task = Arc::clone(&scheduler).spawn_activity_task(activity);

        Self {
            store,
            executor,
            scheduler,
            debouncer,
            query: query_tx,
            visible: visible_rx,
            loading: loading_rx,
            last_error_tx: error_tx,
            last_error: error_rx,
            editing,
            alive,
            tasks: Mutex::new(vec![projection, activity_task]),
        }
    }

    /// Create a note optimistically. Fails fast with a validation error
    /// before any store mutation; network failures surface via
    /// [`last_error`](Self::last_error) later.
    pub async fn request_create(&self, draft: NoteDraft) -> Result<()> {
        self.ensure_running()?;
        self.executor.create(draft).await
    }

    /// Patch a note optimistically. A vanished target is a silent no-op
    /// that triggers reconciliation instead.
    pub async fn request_update(&self, id: &str, patch: NotePatch) -> Result<()> {
        self.ensure_running()?;
        self.executor.update(id, patch).await
    }

    /// Delete a note optimistically; a failure restores it at its original
    /// position.
    pub async fn request_delete(&self, id: &str) -> Result<()> {
        self.ensure_running()?;
        self.executor.delete(id).await
    }

    /// Change the search term. The visible sequence re-filters immediately;
    /// the remote re-query is debounced.
    pub async fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        let trimmed = term.trim();
        let next = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        let modified = self.query.send_if_modified(|query| {
            if query.search == next {
                false
            } else {
                query.search = next.clone();
                true
            }
        });
        if modified {
            self.debouncer.rearm().await;
        }
    }

    /// Change the notebook filter. Shares the debounce timer with the
    /// search term.
    pub async fn set_filter(&self, notebook_id: Option<String>) {
        let modified = self.query.send_if_modified(|query| {
            if query.notebook_id == notebook_id {
                false
            } else {
                query.notebook_id = notebook_id.clone();
                true
            }
        });
        if modified {
            self.debouncer.rearm().await;
        }
    }

    pub async fn focus_gained(&self) {
        self.scheduler.focus_gained().await;
    }

    pub async fn focus_lost(&self) {
        self.scheduler.focus_lost().await;
    }

    /// Mark an input surface as open. Quiet reconciliation skips its ticks
    /// until the editor closes; every mutation closes it implicitly.
    pub fn open_editor(&self) {
        self.editing.store(true, Ordering::SeqCst);
    }

    pub fn close_editor(&self) {
        self.editing.store(false, Ordering::SeqCst);
    }

    /// Always-current visible sequence: the store's ordered collection after
    /// client-side filtering by search term and notebook.
    pub fn visible(&self) -> watch::Receiver<Vec<Note>> {
        self.visible.clone()
    }

    /// Whether a loud fetch is in flight against an empty store.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.clone()
    }

    /// Most recent surfaced failure, until dismissed.
    pub fn last_error(&self) -> watch::Receiver<Option<EngineError>> {
        self.last_error.clone()
    }

    pub fn dismiss_error(&self) {
        self.last_error_tx.send_replace(None);
    }

    /// Unfiltered copy of the store's current collection.
    pub async fn snapshot(&self) -> Vec<Note> {
        self.store.read().await.notes().to_vec()
    }

    pub fn is_running(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Stop the session: cancel timers, abort background tasks and detach
    /// in-flight mutation completions from the store.
    pub async fn stop(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.scheduler.shutdown().await;
        self.debouncer.cancel().await;
        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(EngineError::SessionClosed)
        }
    }

    fn spawn_projection(
        mut store_rx: watch::Receiver<Vec<Note>>,
        mut query_rx: watch::Receiver<ListQuery>,
        visible: watch::Sender<Vec<Note>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                {
                    let notes = store_rx.borrow_and_update().clone();
                    let query = query_rx.borrow_and_update().clone();
                    let filtered: Vec<Note> = notes
                        .into_iter()
                        .filter(|note| query.matches(note))
                        .collect();
                    visible.send_replace(filtered);
                }
                tokio::select! {
                    changed = store_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = query_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        })
    }
}
