//! Upload progress reporting.

use tokio::sync::watch;

/// Monotonic percentage reporter for a single upload.
///
/// Observed values never decrease, stay within 0-100, and a finished upload
/// always ends on exactly 100 regardless of what the transport reported last.
#[derive(Clone)]
pub struct ProgressSink {
    tx: watch::Sender<u8>,
}

impl ProgressSink {
    /// Create a sink and the receiver observers subscribe to.
    pub fn channel() -> (Self, watch::Receiver<u8>) {
        let (tx, rx) = watch::channel(0);
        (Self { tx }, rx)
    }

    /// Report a percentage. Values below the last reported one are dropped.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        self.tx.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }

    /// Report based on bytes sent out of a total.
    pub fn report_bytes(&self, sent: u64, total: u64) {
        if total == 0 {
            return;
        }
        self.report(((sent.min(total) * 100) / total) as u8);
    }

    /// Mark the upload finished. Always lands on 100.
    pub fn finish(&self) {
        self.report(100);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic() {
        let (sink, rx) = ProgressSink::channel();
        sink.report(40);
        sink.report(20);
        assert_eq!(*rx.borrow(), 40);
        sink.report(80);
        assert_eq!(*rx.borrow(), 80);
    }

    #[test]
    fn test_progress_clamped_to_100() {
        let (sink, rx) = ProgressSink::channel();
        sink.report(250);
        assert_eq!(*rx.borrow(), 100);
    }

    #[test]
    fn test_finish_lands_on_100() {
        let (sink, rx) = ProgressSink::channel();
        sink.report(73);
        sink.finish();
        assert_eq!(*rx.borrow(), 100);
    }

    #[test]
    fn test_report_bytes() {
        let (sink, rx) = ProgressSink::channel();
        sink.report_bytes(512, 1024);
        assert_eq!(*rx.borrow(), 50);
        sink.report_bytes(1024, 1024);
        assert_eq!(*rx.borrow(), 100);
        // Zero total never divides.
        let (sink, rx) = ProgressSink::channel();
        sink.report_bytes(10, 0);
        assert_eq!(*rx.borrow(), 0);
    }
}
