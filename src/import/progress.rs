//! Progress reporting
//!
//! Imports report through [`ProgressReporter`]. Callbacks may fire on a
//! background thread, so implementations must never block: [`ChannelProgress`]
//! forwards events over an unbounded channel to whoever owns the display,
//! [`LogProgress`] writes them to the log.

use crate::types::ImportError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

/// Receiver of import progress
pub trait ProgressReporter: Send + Sync {
    /// Periodic message while rows are being validated
    fn on_progress(&self, message: &str);

    /// The import named `label` committed `total` movements
    fn on_task_complete(&self, label: &str, total: usize);

    /// The import failed; nothing was committed
    fn on_error(&self, error: &ImportError);
}

/// One progress callback, as sent over a channel
#[derive(Debug, Clone, PartialEq)]
pub enum ImportEvent {
    Progress(String),
    Completed { label: String, total: usize },
    Failed(ImportError),
}

/// Reporter forwarding every callback as an [`ImportEvent`]
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: UnboundedSender<ImportEvent>,
}

/// Create a connected reporter and receiver
pub fn progress_channel() -> (ChannelProgress, UnboundedReceiver<ImportEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelProgress { sender }, receiver)
}

impl ChannelProgress {
    // A closed receiver means nobody is listening any more; events are dropped.
    fn send(&self, event: ImportEvent) {
        let _ = self.sender.send(event);
    }
}

impl ProgressReporter for ChannelProgress {
    fn on_progress(&self, message: &str) {
        self.send(ImportEvent::Progress(message.to_string()));
    }

    fn on_task_complete(&self, label: &str, total: usize) {
        self.send(ImportEvent::Completed {
            label: label.to_string(),
            total,
        });
    }

    fn on_error(&self, error: &ImportError) {
        self.send(ImportEvent::Failed(error.clone()));
    }
}

/// Reporter writing to the `tracing` log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn on_progress(&self, message: &str) {
        info!("{}", message);
    }

    fn on_task_complete(&self, label: &str, total: usize) {
        info!(label, total, "import complete");
    }

    fn on_error(&self, error: &ImportError) {
        error!(%error, "import failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StoreError;

    #[test]
    fn test_channel_progress_forwards_events_in_order() {
        let (reporter, mut receiver) = progress_channel();
        let failure = ImportError::from(StoreError::commit_failed("disk full"));

        reporter.on_progress("Validated 100 of 250 deposits");
        reporter.on_task_complete("deposits", 250);
        reporter.on_error(&failure);

        assert_eq!(
            receiver.try_recv().unwrap(),
            ImportEvent::Progress("Validated 100 of 250 deposits".to_string())
        );
        assert_eq!(
            receiver.try_recv().unwrap(),
            ImportEvent::Completed {
                label: "deposits".to_string(),
                total: 250
            }
        );
        assert_eq!(receiver.try_recv().unwrap(), ImportEvent::Failed(failure));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_channel_progress_survives_dropped_receiver() {
        let (reporter, receiver) = progress_channel();
        drop(receiver);
        reporter.on_progress("nobody listening");
    }
}
