//! Transient user notifications ("toasts") and loading events.
//!
//! The workflow and the app shell report what happened through an
//! [`Arc<dyn Notifier>`]; the host decides how to show it. The CLI prints
//! coloured lines and drives a spinner; tests record events; library users who
//! don't care pass [`NoopNotifier`].
//!
//! # Example
//!
//! ```rust
//! use subcruncher::notify::{Notifier, NotificationLevel};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ErrorCounter(AtomicUsize);
//!
//! impl Notifier for ErrorCounter {
//!     fn notify(&self, level: NotificationLevel, _message: &str) {
//!         if level == NotificationLevel::Error {
//!             self.0.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let counter = Arc::new(ErrorCounter(AtomicUsize::new(0)));
//! counter.notify(NotificationLevel::Error, "Failed to convert file");
//! assert_eq!(counter.0.load(Ordering::SeqCst), 1);
//! ```

use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Receives notifications and loading-state changes.
///
/// All methods default to no-ops so implementations override only what they
/// show.
pub trait Notifier: Send + Sync {
    /// A transient message for the user.
    fn notify(&self, level: NotificationLevel, message: &str) {
        let _ = (level, message);
    }

    /// A long-running operation (conversion) began.
    fn loading_started(&self, label: &str) {
        let _ = label;
    }

    /// The operation started by the last `loading_started` finished.
    fn loading_finished(&self) {}
}

/// Discards everything.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Keeps every notification in memory. Used by tests and by hosts that poll.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(NotificationLevel, String)>>,
    loading: Mutex<Vec<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(NotificationLevel, String)> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Messages at `level`, oldest first.
    pub fn messages(&self, level: NotificationLevel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    /// `true` for each start, `false` for each finish, in order.
    pub fn loading_transitions(&self) -> Vec<bool> {
        self.loading.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((level, message.to_string()));
    }

    fn loading_started(&self, _label: &str) {
        self.loading
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(true);
    }

    fn loading_finished(&self) {
        self.loading
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_notifier_does_not_panic() {
        let n = NoopNotifier;
        n.notify(NotificationLevel::Info, "Converting file...");
        n.loading_started("convert");
        n.loading_finished();
    }

    #[test]
    fn recording_notifier_keeps_order() {
        let n = RecordingNotifier::new();
        n.notify(NotificationLevel::Info, "a");
        n.notify(NotificationLevel::Error, "b");
        n.notify(NotificationLevel::Success, "c");
        n.loading_started("x");
        n.loading_finished();

        assert_eq!(n.events().len(), 3);
        assert_eq!(n.messages(NotificationLevel::Error), vec!["b".to_string()]);
        assert_eq!(n.loading_transitions(), vec![true, false]);
    }

    #[test]
    fn arc_dyn_notifier_works() {
        let n: SharedNotifier = Arc::new(NoopNotifier);
        n.notify(NotificationLevel::Success, "File converted successfully!");
    }
}
