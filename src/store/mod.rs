use crate::core::Note;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

/// Shared handle to the store. All mutations happen under a single write
/// acquisition, so no partially applied collection is ever observable.
pub type SharedStore = Arc<RwLock<NoteStore>>;

/// Single source of truth for what the view currently believes is on the
/// server, with allowance for provisional (not yet confirmed) entries.
///
/// The store holds the ordered collection and publishes a full snapshot
/// after every mutation. It carries no network or timer logic.
pub struct NoteStore {
    notes: Vec<Note>,
    snapshot_tx: watch::Sender<Vec<Note>>,
}

impl NoteStore {
    /// Create an empty store and the receiver half of its snapshot channel.
    pub fn new() -> (Self, watch::Receiver<Vec<Note>>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(Vec::new());
        (
            Self {
                notes: Vec::new(),
                snapshot_tx,
            },
            snapshot_rx,
        )
    }

    /// Atomically swap the whole collection. Used by reconciliation.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        self.publish();
    }

    /// Insert a record at the given position (clamped to the collection
    /// length). Refuses a duplicate identifier so the one-record-per-id
    /// invariant holds; returns whether the insert happened.
    pub fn insert_at(&mut self, index: usize, note: Note) -> bool {
        if self.position(&note.id).is_some() {
            return false;
        }
        let index = index.min(self.notes.len());
        self.notes.insert(index, note);
        self.publish();
        true
    }

    /// Replace the record currently stored under `id`, keeping its slot.
    /// The replacement may carry a different identifier; this is how a
    /// temporary record becomes authoritative in place.
    pub fn replace(&mut self, id: &str, note: Note) -> bool {
        match self.position(id) {
            Some(index) => {
                self.notes[index] = note;
                self.publish();
                true
            }
            None => false,
        }
    }

    /// Remove the record under `id`, returning it together with the index
    /// it occupied so a failed delete can restore it at the same position.
    pub fn remove_by_id(&mut self, id: &str) -> Option<(Note, usize)> {
        let index = self.position(id)?;
        let note = self.notes.remove(index);
        self.publish();
        Some((note, index))
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.position(id).map(|index| &self.notes[index])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Ordered structural equality against a fetched collection. Used to
    /// discard reconciliation results that would not change anything.
    pub fn same_as(&self, other: &[Note]) -> bool {
        self.notes.as_slice() == other
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Note>> {
        self.snapshot_tx.subscribe()
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.notes.clone());
    }
}
