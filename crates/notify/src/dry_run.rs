use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use vigil_core::notify::error::NotifyError;
use vigil_core::notify::port::Notifier;

/// # Summary
/// A notifier that only logs what would have been sent. Used when the service runs in dry-run mode.
///
/// # Invariants
/// - Never performs network I/O and never fails.
/// - Holds constant state for the whole run: messages are logged, only their count is kept.
pub struct DryRunNotifier {
    /// Recipients the message would have been addressed to, for the log line only.
    recipients: Vec<String>,
    /// Number of messages "sent" so far.
    sent: AtomicU64,
}

impl DryRunNotifier {
    pub fn new(recipients: Vec<String>) -> Self {
        Self {
            recipients,
            sent: AtomicU64::new(0),
        }
    }

    /// Number of messages logged so far.
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn notify(&self, subject: &str, content: &str) -> Result<(), NotifyError> {
        info!(
            "[DRY RUN] Would send email to {:?}\nSubject: {}\n{}",
            self.recipients, subject, content
        );
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
