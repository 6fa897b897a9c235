use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

/// Fire-and-forget progress channel.
///
/// Sends never block, a dropped receiver is ignored, and the reported
/// percentage never goes backwards.
#[derive(Debug, Default)]
pub struct ProgressReporter {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
    last_percent: AtomicU8,
}

impl ProgressReporter {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self {
            tx: Some(tx),
            last_percent: AtomicU8::new(0),
        }
    }

    /// A reporter with no observer.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn report_stage(&self, percent: u8, stage: impl Into<String>) {
        self.emit(percent, Some(stage.into()), None, None);
    }

    pub fn report_items(&self, current: usize, total: usize) {
        self.emit(percent_of(current, total), None, Some(current), Some(total));
    }

    fn emit(&self, percent: u8, stage: Option<String>, current: Option<usize>, total: Option<usize>) {
        let percent = percent.min(100);
        let previous = self.last_percent.fetch_max(percent, Ordering::Relaxed);
        let percent = percent.max(previous);

        let Some(tx) = &self.tx else {
            return;
        };
        let event = ProgressEvent {
            percent,
            stage,
            current,
            total,
        };
        if tx.send(event).is_err() {
            tracing::debug!("Progress observer disconnected");
        }
    }
}

/// `round(done / total * 100)`; an empty run counts as complete.
pub fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
}
