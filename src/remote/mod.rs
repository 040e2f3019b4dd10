mod mock;

pub use mock::MockRemote;

use crate::core::{ListQuery, Note, NoteDraft, NotePatch, Result};
use async_trait::async_trait;

/// The remote collection the engine reconciles against.
///
/// Transport is an external concern; implement this over whatever client the
/// application uses, or use [`MockRemote`] in tests. Each call is independent
/// and may fail with `EngineError::Network` (transient) or
/// `EngineError::Validation` (caller-correctable).
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Fetch the ordered collection matching `query`.
    async fn list(&self, query: &ListQuery) -> Result<Vec<Note>>;

    /// Create a note; the returned record carries the authoritative identifier.
    async fn create(&self, draft: &NoteDraft) -> Result<Note>;

    /// Apply a partial update and return the authoritative record.
    async fn update(&self, id: &str, patch: &NotePatch) -> Result<Note>;

    /// Delete the note under `id`.
    async fn delete(&self, id: &str) -> Result<()>;
}
