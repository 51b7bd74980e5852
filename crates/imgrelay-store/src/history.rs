//! Quota-aware upload history.
//!
//! The store never surfaces persistence failures to callers. A corrupted
//! payload is discarded and the history restarts empty; a write that the
//! backend rejects is retried with progressively fewer entries until it fits,
//! clearing the slot as a last resort. Every eviction is reported through the
//! optional diagnostic channel so operators can see storage pressure.

use bytes::Bytes;
use imgrelay_core::models::HistoryEntry;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::slot::Slot;

/// Eviction thresholds for the history store.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Hard cap on the number of retained entries.
    pub max_items: usize,
    /// Budget for the serialized JSON payload, in bytes.
    pub max_storage_bytes: usize,
    /// How many oldest entries are dropped per eviction round.
    pub eviction_chunk: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: 100,
            max_storage_bytes: 2 * 1024 * 1024,
            eviction_chunk: 3,
        }
    }
}

/// Diagnostic events emitted while keeping the history within budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Oldest entries were dropped to satisfy the count cap or byte budget.
    Evicted { count: usize },
    /// The slot was wiped because nothing smaller could be persisted.
    Cleared,
    /// A stored payload failed to deserialize and was discarded.
    CorruptDiscarded,
}

/// Current footprint of the persisted history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    pub entries: usize,
    pub serialized_bytes: usize,
    pub budget_bytes: usize,
}

/// Most-recent-first upload history persisted in a single byte slot.
pub struct HistoryStore {
    slot: Arc<dyn Slot>,
    config: HistoryConfig,
    events: Option<mpsc::UnboundedSender<StoreEvent>>,
    // One writer at a time; add/remove/clear are read-modify-write.
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(slot: Arc<dyn Slot>, config: HistoryConfig) -> Self {
        Self {
            slot,
            config,
            events: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Attach a diagnostic channel. Events are best-effort; a dropped
    /// receiver is ignored.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<StoreEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Load all entries, newest first. A missing or corrupted payload yields
    /// an empty list; a corrupted one is also discarded from the slot.
    pub async fn list(&self) -> Vec<HistoryEntry> {
        match self.slot.read().await {
            Ok(Some(data)) => match serde_json::from_slice::<Vec<HistoryEntry>>(&data) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding corrupted history payload");
                    self.emit(StoreEvent::CorruptDiscarded);
                    if let Err(e) = self.slot.clear().await {
                        tracing::warn!(error = %e, "Failed to clear corrupted history slot");
                    }
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read history, treating as empty");
                Vec::new()
            }
        }
    }

    /// Prepend a new entry, evicting oldest entries as needed to stay within
    /// the item cap and byte budget.
    pub async fn add(&self, entry: HistoryEntry) {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.list().await;
        entries.insert(0, entry);

        if entries.len() > self.config.max_items {
            let excess = entries.len() - self.config.max_items;
            entries.truncate(self.config.max_items);
            self.emit(StoreEvent::Evicted { count: excess });
        }

        self.persist_within_budget(entries).await;
    }

    /// Remove the entry with the given id. Removing an unknown id is a no-op.
    pub async fn remove(&self, id: &str) {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.list().await;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return;
        }

        self.persist_within_budget(entries).await;
    }

    /// Drop all history.
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.slot.clear().await {
            tracing::warn!(error = %e, "Failed to clear history slot");
        }
    }

    /// Report the current serialized footprint against the byte budget.
    pub async fn usage(&self) -> StorageUsage {
        let entries = self.list().await;
        let serialized_bytes = serde_json::to_vec(&entries)
            .map(|v| v.len())
            .unwrap_or(0);
        StorageUsage {
            entries: entries.len(),
            serialized_bytes,
            budget_bytes: self.config.max_storage_bytes,
        }
    }

    /// Serialize and write, evicting oldest entries until the payload fits
    /// the byte budget and the backend accepts it.
    async fn persist_within_budget(&self, mut entries: Vec<HistoryEntry>) {
        // First satisfy our own byte budget, a chunk of oldest at a time.
        let mut payload = match self.serialize(&entries) {
            Some(p) => p,
            None => return,
        };
        while payload.len() > self.config.max_storage_bytes && !entries.is_empty() {
            let dropped = self.drop_oldest(&mut entries);
            self.emit(StoreEvent::Evicted { count: dropped });
            payload = match self.serialize(&entries) {
                Some(p) => p,
                None => return,
            };
        }

        // Then let the backend have the final say: on a rejected write, keep
        // shrinking until it fits or nothing is left.
        loop {
            match self.slot.write(payload.clone()).await {
                Ok(()) => return,
                Err(e) if entries.is_empty() => {
                    tracing::warn!(error = %e, "History write failed with empty payload, clearing slot");
                    if self.slot.clear().await.is_ok() {
                        self.emit(StoreEvent::Cleared);
                    }
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        entries = entries.len(),
                        "History write rejected, evicting oldest entries"
                    );
                    let dropped = self.drop_oldest(&mut entries);
                    self.emit(StoreEvent::Evicted { count: dropped });
                    payload = match self.serialize(&entries) {
                        Some(p) => p,
                        None => return,
                    };
                }
            }
        }
    }

    /// Drop the oldest entries: a full `eviction_chunk` while more than a
    /// chunk remains, then one at a time. Returns the number dropped.
    fn drop_oldest(&self, entries: &mut Vec<HistoryEntry>) -> usize {
        let chunk = if entries.len() > self.config.eviction_chunk {
            self.config.eviction_chunk
        } else {
            1
        };
        let new_len = entries.len() - chunk;
        entries.truncate(new_len);
        chunk
    }

    fn serialize(&self, entries: &[HistoryEntry]) -> Option<Bytes> {
        match serde_json::to_vec(entries) {
            Ok(v) => Some(Bytes::from(v)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize history");
                None
            }
        }
    }

    fn emit(&self, event: StoreEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{FileSlot, MemorySlot};
    use tempfile::tempdir;

    fn entry(id: &str, url_len: usize) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            filename: format!("{}.jpg", id),
            url: format!("https://i.example.com/{}", "x".repeat(url_len)),
            delete_url: None,
            timestamp: 1_700_000_000_000,
            size: 1024,
        }
    }

    fn store(slot: Arc<dyn Slot>, config: HistoryConfig) -> HistoryStore {
        HistoryStore::new(slot, config)
    }

    #[tokio::test]
    async fn test_add_is_most_recent_first() {
        let s = store(Arc::new(MemorySlot::new()), HistoryConfig::default());
        s.add(entry("a", 10)).await;
        s.add(entry("b", 10)).await;
        s.add(entry("c", 10)).await;

        let entries = s.list().await;
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_item_cap_drops_oldest() {
        let s = store(
            Arc::new(MemorySlot::new()),
            HistoryConfig {
                max_items: 3,
                ..HistoryConfig::default()
            },
        );
        for id in ["a", "b", "c", "d"] {
            s.add(entry(id, 10)).await;
        }

        let ids: Vec<String> = s.list().await.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["d", "c", "b"]);
    }

    #[tokio::test]
    async fn test_byte_budget_evicts_oldest_chunk() {
        // Each entry serializes to roughly 1100 bytes; a 4KB budget holds
        // three but not four. Adding a fourth must evict a chunk of three
        // oldest, leaving only the newest.
        let s = store(
            Arc::new(MemorySlot::new()),
            HistoryConfig {
                max_items: 100,
                max_storage_bytes: 4 * 1024,
                eviction_chunk: 3,
            },
        );
        for id in ["a", "b", "c"] {
            s.add(entry(id, 1000)).await;
        }
        assert_eq!(s.list().await.len(), 3);

        s.add(entry("d", 1000)).await;
        let ids: Vec<String> = s.list().await.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["d"]);
    }

    #[tokio::test]
    async fn test_byte_budget_eviction_emits_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let s = store(
            Arc::new(MemorySlot::new()),
            HistoryConfig {
                max_items: 100,
                max_storage_bytes: 4 * 1024,
                eviction_chunk: 3,
            },
        )
        .with_events(tx);

        for id in ["a", "b", "c", "d"] {
            s.add(entry(id, 1000)).await;
        }

        assert_eq!(rx.try_recv().unwrap(), StoreEvent::Evicted { count: 3 });
    }

    #[tokio::test]
    async fn test_single_oversized_entry_still_dropped() {
        // One entry alone blows the budget: it gets evicted too and the
        // history ends up empty rather than permanently over budget.
        let s = store(
            Arc::new(MemorySlot::new()),
            HistoryConfig {
                max_items: 100,
                max_storage_bytes: 512,
                eviction_chunk: 3,
            },
        );
        s.add(entry("huge", 4096)).await;
        assert!(s.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_backend_quota_degrades_and_retries() {
        // The backend rejects payloads over 2KB even though our own budget
        // allows more. Adds must shrink until the write is accepted.
        let (tx, mut rx) = mpsc::unbounded_channel();
        let s = store(
            Arc::new(MemorySlot::with_capacity(2 * 1024)),
            HistoryConfig {
                max_items: 100,
                max_storage_bytes: 1024 * 1024,
                eviction_chunk: 3,
            },
        )
        .with_events(tx);

        s.add(entry("a", 600)).await;
        s.add(entry("b", 600)).await;
        s.add(entry("c", 600)).await;

        let entries = s.list().await;
        assert!(!entries.is_empty());
        assert!(entries.len() < 3);
        assert_eq!(entries[0].id, "c");
        assert!(matches!(rx.try_recv().unwrap(), StoreEvent::Evicted { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_payload_self_heals() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let slot = Arc::new(MemorySlot::new());
        slot.write(Bytes::from_static(b"{not valid json")).await.unwrap();

        let s = store(slot.clone(), HistoryConfig::default()).with_events(tx);
        assert!(s.list().await.is_empty());
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::CorruptDiscarded);
        // The slot itself was wiped.
        assert!(slot.read().await.unwrap().is_none());

        // A subsequent add starts a fresh history.
        s.add(entry("a", 10)).await;
        assert_eq!(s.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_noop() {
        let s = store(Arc::new(MemorySlot::new()), HistoryConfig::default());
        s.add(entry("a", 10)).await;
        s.remove("missing").await;
        s.remove("a").await;
        s.remove("a").await;
        assert!(s.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_empties_history() {
        let s = store(Arc::new(MemorySlot::new()), HistoryConfig::default());
        s.add(entry("a", 10)).await;
        s.add(entry("b", 10)).await;
        s.clear().await;
        assert!(s.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_usage_reports_footprint() {
        let s = store(Arc::new(MemorySlot::new()), HistoryConfig::default());
        s.add(entry("a", 10)).await;
        let usage = s.usage().await;
        assert_eq!(usage.entries, 1);
        assert!(usage.serialized_bytes > 0);
        assert!(usage.serialized_bytes <= usage.budget_bytes);
    }

    #[tokio::test]
    async fn test_file_slot_persists_across_stores() {
        let dir = tempdir().unwrap();
        let slot = Arc::new(FileSlot::new(dir.path(), "upload_history").await.unwrap());

        let s1 = store(slot.clone(), HistoryConfig::default());
        s1.add(entry("a", 10)).await;
        drop(s1);

        let s2 = store(slot, HistoryConfig::default());
        let entries = s2.list().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "a");
    }
}
