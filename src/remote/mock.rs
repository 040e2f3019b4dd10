use super::RemoteCollection;
use crate::core::{EngineError, ListQuery, Note, NoteDraft, NotePatch, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// In-process stand-in for the remote collection.
///
/// Holds a server-side copy of the collection, supports per-operation
/// failure injection and artificial latency, and counts calls so tests can
/// assert on fetch cadence (debounce, scheduler liveness).
#[derive(Default)]
pub struct MockRemote {
    notes: Mutex<Vec<Note>>,
    last_query: Mutex<Option<ListQuery>>,
    latency_ms: AtomicU64,
    list_fails: AtomicBool,
    create_fails: AtomicBool,
    update_fails: AtomicBool,
    delete_fails: AtomicBool,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the server-side collection wholesale.
    pub async fn seed(&self, notes: Vec<Note>) {
        *self.notes.lock().await = notes;
    }

    /// Current server-side collection, newest first.
    pub async fn server_notes(&self) -> Vec<Note> {
        self.notes.lock().await.clone()
    }

    /// The query passed to the most recent `list` call.
    pub async fn last_query(&self) -> Option<ListQuery> {
        self.last_query.lock().await.clone()
    }

    /// Delay every operation by `latency` before responding.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fail_list(&self, fail: bool) {
        self.list_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.create_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.update_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.delete_fails.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
    }

    fn rejection(operation: &str) -> EngineError {
        EngineError::Network(format!("injected {operation} failure"))
    }
}

#[async_trait]
impl RemoteCollection for MockRemote {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Note>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await;
        *self.last_query.lock().await = Some(query.clone());
        if self.list_fails.load(Ordering::SeqCst) {
            return Err(Self::rejection("list"));
        }
        let notes = self.notes.lock().await;
        Ok(notes
            .iter()
            .filter(|note| query.matches(note))
            .cloned()
            .collect())
    }

    async fn create(&self, draft: &NoteDraft) -> Result<Note> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await;
        if self.create_fails.load(Ordering::SeqCst) {
            return Err(Self::rejection("create"));
        }
        draft.validate()?;
        let note = draft
            .clone()
            .into_note(format!("srv-{}", Uuid::new_v4()), Utc::now());
        self.notes.lock().await.insert(0, note.clone());
        Ok(note)
    }

    async fn update(&self, id: &str, patch: &NotePatch) -> Result<Note> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await;
        if self.update_fails.load(Ordering::SeqCst) {
            return Err(Self::rejection("update"));
        }
        let mut notes = self.notes.lock().await;
        let note = notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or_else(|| EngineError::Network(format!("note '{id}' not found")))?;
        let mut updated = patch.apply(note);
        updated.updated_at = Utc::now();
        *note = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await;
        if self.delete_fails.load(Ordering::SeqCst) {
            return Err(Self::rejection("delete"));
        }
        let mut notes = self.notes.lock().await;
        let index = notes
            .iter()
            .position(|note| note.id == id)
            .ok_or_else(|| EngineError::Network(format!("note '{id}' not found")))?;
        notes.remove(index);
        Ok(())
    }
}
