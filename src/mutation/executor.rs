use super::IdSerializer;
use crate::core::{EngineError, Note, NoteDraft, NotePatch, Result};
use crate::refresh::RefreshScheduler;
use crate::remote::RemoteCollection;
use crate::store::SharedStore;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Applies create/update/delete optimistically to the store, then confirms
/// or rolls back once the remote collection answers.
///
/// Every operation applies its store effect synchronously before returning;
/// remote confirmation runs on a spawned task whose continuation checks the
/// session's liveness flag before touching the store again. Remote calls for
/// the same identifier are serialized so back-to-back mutations on one note
/// cannot overlap on the wire.
pub struct MutationExecutor {
    store: SharedStore,
    remote: Arc<dyn RemoteCollection>,
    scheduler: Arc<RefreshScheduler>,
    editing: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    last_error: watch::Sender<Option<EngineError>>,
    temp_seq: AtomicU64,
    serializer: IdSerializer,
}

impl MutationExecutor {
    pub(crate) fn new(
        store: SharedStore,
        remote: Arc<dyn RemoteCollection>,
        scheduler: Arc<RefreshScheduler>,
        editing: Arc<AtomicBool>,
        alive: Arc<AtomicBool>,
        last_error: watch::Sender<Option<EngineError>>,
    ) -> Self {
        Self {
            store,
            remote,
            scheduler,
            editing,
            alive,
            last_error,
            temp_seq: AtomicU64::new(0),
            serializer: IdSerializer::default(),
        }
    }

    /// Create a note: a provisional record under a temporary identifier
    /// appears at the front of the store immediately and is replaced in
    /// place once the remote confirms.
    ///
    /// A failed create leaves the provisional record behind on purpose; the
    /// scheduled reconciliation removes the orphan once a fetch proves the
    /// server never created it.
    pub async fn create(&self, draft: NoteDraft) -> Result<()> {
        draft.validate()?;

        let temp_id = self.next_temp_id();
        let provisional = draft.clone().into_note(temp_id.clone(), Utc::now());
        self.store.write().await.insert_at(0, provisional);
        self.editing.store(false, Ordering::SeqCst);

        let store = Arc::clone(&self.store);
        let remote = Arc::clone(&self.remote);
        let scheduler = Arc::clone(&self.scheduler);
        let alive = Arc::clone(&self.alive);
        let last_error = self.last_error.clone();
        tokio::spawn(async move {
            match remote.create(&draft).await {
                Ok(confirmed) => {
                    if alive.load(Ordering::SeqCst) {
                        store.write().await.replace(&temp_id, confirmed);
                    }
                }
                Err(err) => {
                    warn!(%temp_id, %err, "create failed, provisional record left for reconciliation");
                    if alive.load(Ordering::SeqCst) {
                        last_error.send_replace(Some(err));
                    }
                }
            }
            if alive.load(Ordering::SeqCst) {
                scheduler.schedule_reconcile();
            }
        });
        Ok(())
    }

    /// Update a note: the patched record replaces the original immediately;
    /// a successful confirmation re-replaces it with the authoritative
    /// record, a failure rolls back to the captured original.
    pub async fn update(&self, id: &str, patch: NotePatch) -> Result<()> {
        let original = match self.capture(id).await {
            Ok(note) => note,
            Err(EngineError::StaleEntity(id)) => {
                debug!(%id, "update target vanished, reconciling instead");
                self.scheduler.schedule_reconcile();
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let mut updated = patch.apply(&original);
        updated.updated_at = Utc::now();
        self.store.write().await.replace(id, updated);
        self.editing.store(false, Ordering::SeqCst);

        let id = id.to_string();
        let store = Arc::clone(&self.store);
        let remote = Arc::clone(&self.remote);
        let scheduler = Arc::clone(&self.scheduler);
        let alive = Arc::clone(&self.alive);
        let last_error = self.last_error.clone();
        let serializer = self.serializer.clone();
        tokio::spawn(async move {
            let slot = serializer.acquire(&id).await;
            let outcome = remote.update(&id, &patch).await;
            if alive.load(Ordering::SeqCst) {
                match outcome {
                    Ok(authoritative) => {
                        // The note may have been deleted while the call was
                        // in flight; only confirm a record that still exists.
                        let mut store = store.write().await;
                        if store.get(&id).is_some() {
                            store.replace(&id, authoritative);
                        }
                    }
                    Err(err) => {
                        warn!(%id, %err, "update failed, rolling back");
                        store.write().await.replace(&id, original);
                        last_error.send_replace(Some(err));
                    }
                }
            }
            drop(slot);
            serializer.release(&id).await;
            if alive.load(Ordering::SeqCst) {
                scheduler.schedule_reconcile();
            }
        });
        Ok(())
    }

    /// Delete a note: removed from the store immediately; a failure restores
    /// it at the position it occupied.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let (original, index) = {
            let mut store = self.store.write().await;
            match store.remove_by_id(id) {
                Some(removed) => removed,
                None => {
                    debug!(%id, "delete target vanished, reconciling instead");
                    self.scheduler.schedule_reconcile();
                    return Ok(());
                }
            }
        };
        self.editing.store(false, Ordering::SeqCst);

        let id = id.to_string();
        let store = Arc::clone(&self.store);
        let remote = Arc::clone(&self.remote);
        let alive = Arc::clone(&self.alive);
        let last_error = self.last_error.clone();
        let serializer = self.serializer.clone();
        tokio::spawn(async move {
            let slot = serializer.acquire(&id).await;
            let outcome = remote.delete(&id).await;
            if alive.load(Ordering::SeqCst) {
                if let Err(err) = outcome {
                    warn!(%id, %err, "delete failed, restoring record");
                    store.write().await.insert_at(index, original);
                    last_error.send_replace(Some(err));
                }
            }
            drop(slot);
            serializer.release(&id).await;
        });
        Ok(())
    }

    async fn capture(&self, id: &str) -> Result<Note> {
        self.store
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::StaleEntity(id.to_string()))
    }

    fn next_temp_id(&self) -> String {
        // Unique within the session by construction.
        format!("local-{}", self.temp_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
