use crate::system::Callback;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

/// Logs a message, then hands control back through a callback
#[derive(Debug, Default)]
pub struct Announcer {
    prefix: Option<String>,
    history: Mutex<Vec<String>>,
}

impl Announcer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            history: Mutex::default(),
        }
    }

    /// Format the announcement line
    pub fn render(&self, message: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("[{}] {}", prefix, message),
            None => message.to_string(),
        }
    }

    /// Every line announced so far, oldest first
    pub fn history(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Log `message`, then invoke `on_done` exactly once before returning
    pub fn announce(&self, message: &str, on_done: &impl Callback) {
        self.emit(message);
        on_done.call();
    }

    /// Log `message` once, then invoke each listener once, in order
    pub fn announce_all(&self, message: &str, listeners: &[&dyn Callback]) {
        self.emit(message);
        for listener in listeners {
            listener.call();
        }
    }

    fn emit(&self, message: &str) {
        let line = self.render(message);
        info!(message = %line, "announcement");
        self.lock().push(line);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::RecordingCallback;
    use crate::system::callbacks::MockCallback;
    use std::cell::Cell;

    #[test]
    fn test_announce_invokes_callback_once() {
        let recorder = RecordingCallback::new();

        Announcer::new().announce("hello", &recorder);

        assert!(recorder.was_called_times(1));
    }

    #[test]
    fn test_callback_runs_after_side_effect() {
        let announcer = Announcer::with_prefix("app");
        let seen_at_call = Cell::new(None);

        announcer.announce("start", &|| seen_at_call.set(announcer.history().last().cloned()));

        assert_eq!(seen_at_call.take(), Some("[app] start".to_string()));
    }

    #[test]
    fn test_announce_with_mock_callback() {
        let mut callback = MockCallback::new();
        callback.expect_call().times(1).return_const(());

        Announcer::new().announce("done", &callback);
    }

    #[test]
    fn test_announce_all_fans_out() {
        let first = RecordingCallback::new();
        let second = RecordingCallback::new();
        let announcer = Announcer::new();

        announcer.announce_all("sync complete", &[&first, &second, &first]);

        assert!(first.was_called_times(2));
        assert!(second.was_called_times(1));
        assert_eq!(announcer.history(), vec!["sync complete"]);
    }
}
