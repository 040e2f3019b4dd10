use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes remote calls per identifier: update and delete issued
/// back-to-back against the same note never overlap on the wire. Acquisition
/// order follows issue order under the cooperative scheduler.
#[derive(Clone, Default)]
pub(crate) struct IdSerializer {
    slots: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl IdSerializer {
    pub(crate) async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(id.to_string()).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Drop the slot once nothing holds or awaits it.
    pub(crate) async fn release(&self, id: &str) {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.get(id) {
            if Arc::strong_count(slot) == 1 {
                slots.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_id_is_exclusive() {
        let serializer = IdSerializer::default();
        let guard = serializer.acquire("n1").await;

        let contender = {
            let serializer = serializer.clone();
            tokio::spawn(async move {
                let _guard = serializer.acquire("n1").await;
            })
        };
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        serializer.release("n1").await;
        assert!(serializer.slots.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_ids_do_not_block() {
        let serializer = IdSerializer::default();
        let _first = serializer.acquire("n1").await;
        let _second = serializer.acquire("n2").await;
    }
}
