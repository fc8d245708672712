//! Fire-and-forget administrative notifications.
//!
//! Used for visibility only (window created, overdue attempts force
//! submitted); implementations swallow their own failures so a broken
//! notification channel can never affect grading correctness.

use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &str, payload: Value);
}

/// Default notifier: writes events to the application log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &str, payload: Value) {
        log::info!("notify {}: {}", event, payload);
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records events for assertions.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, event: &str, _payload: Value) {
            self.events.lock().unwrap().push(event.to_string());
        }
    }
}
