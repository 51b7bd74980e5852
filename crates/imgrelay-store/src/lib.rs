//! Persistent upload history with quota-aware eviction.
//!
//! The history lives in a single fixed-key byte slot (a JSON array,
//! most-recent-first). The store keeps the collection within an item-count
//! cap and a serialized-byte budget by evicting oldest entries, and absorbs
//! all persistence failures: corrupted data self-heals to an empty list,
//! quota-exhausted writes degrade by evicting and retrying. Callers never see
//! a storage error; eviction is observable through diagnostic events.

pub mod history;
pub mod slot;

pub use history::{HistoryConfig, HistoryStore, StorageUsage, StoreEvent};
pub use slot::{FileSlot, MemorySlot, Slot, SlotError};
