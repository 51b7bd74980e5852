//! Upload queue orchestration.
//!
//! The queue owns the in-memory upload items and drives each one through
//! validation, optional processing, and the relay transport, recording
//! successes in the history store. One item's failure never affects another:
//! batch uploads always settle every started item.

pub mod queue;
pub mod transport;

pub use queue::{QueueError, QueueOptions, UploadQueue};
pub use transport::UploadTransport;
