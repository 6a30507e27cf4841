use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A zero-argument callback.
///
/// Every `Fn()` closure is a `Callback`, so production code passes closures
/// directly while tests hand in a [`RecordingCallback`] or a mock.
#[cfg_attr(test, mockall::automock)]
pub trait Callback {
    fn call(&self);
}

impl<F: Fn()> Callback for F {
    fn call(&self) {
        self()
    }
}

/// Call-recording stub. Clones share the same record, so one handle can be
/// moved into the code under test while the test keeps another.
#[derive(Debug)]
pub struct CallRecorder<A> {
    calls: Arc<Mutex<Vec<A>>>,
}

impl<A> Clone for CallRecorder<A> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<A> Default for CallRecorder<A> {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<A> CallRecorder<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation with its arguments
    pub fn record(&self, args: A) {
        self.lock().push(args);
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    pub fn was_called_times(&self, times: usize) -> bool {
        self.call_count() == times
    }

    /// Forget every recorded invocation
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<A>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Clone> CallRecorder<A> {
    /// Arguments of every invocation, oldest first
    pub fn calls(&self) -> Vec<A> {
        self.lock().clone()
    }

    pub fn last_call(&self) -> Option<A> {
        self.lock().last().cloned()
    }
}

/// Stub for zero-argument callbacks
pub type RecordingCallback = CallRecorder<()>;

impl Callback for CallRecorder<()> {
    fn call(&self) {
        self.record(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn invoke(callback: &impl Callback) {
        callback.call();
    }

    #[test]
    fn test_closure_is_a_callback() {
        let hits = Cell::new(0);
        invoke(&|| hits.set(hits.get() + 1));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_recording_callback_never_invoked() {
        let recorder = RecordingCallback::new();
        assert!(!recorder.was_called());
        assert!(recorder.was_called_times(0));
    }

    #[test]
    fn test_recording_callback_counts_through_clone() {
        let recorder = RecordingCallback::new();
        let handle = recorder.clone();

        invoke(&handle);

        assert!(recorder.was_called_times(1));
        invoke(&handle);
        assert_eq!(recorder.call_count(), 2);

        recorder.reset();
        assert!(handle.was_called_times(0));
    }

    #[test]
    fn test_recorder_keeps_arguments_in_order() {
        let recorder: CallRecorder<(String, u32)> = CallRecorder::new();
        recorder.record(("first".to_string(), 1));
        recorder.record(("second".to_string(), 2));

        assert_eq!(
            recorder.calls(),
            vec![("first".to_string(), 1), ("second".to_string(), 2)]
        );
        assert_eq!(recorder.last_call(), Some(("second".to_string(), 2)));
    }

    #[test]
    fn test_mock_callback_expectation() {
        let mut mock = MockCallback::new();
        mock.expect_call().times(1).return_const(());

        invoke(&mock);
    }
}
