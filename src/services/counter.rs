use crate::system::{PrefResult, PreferenceError, PreferenceStore};
use tracing::info;

/// Key the counter is stored under
pub const COUNTER_KEY: &str = "counter";

/// Persistent integer counter backed by a preference store
pub struct CounterService<P: PreferenceStore> {
    preferences: P,
}

impl<P: PreferenceStore> CounterService<P> {
    pub fn new(preferences: P) -> Self {
        Self { preferences }
    }

    /// Current value, 0 when it was never written
    pub fn read_counter(&self) -> PrefResult<i64> {
        Ok(self.preferences.get_int(COUNTER_KEY)?.unwrap_or(0))
    }

    pub fn write_counter(&self, value: i64) -> PrefResult<bool> {
        self.preferences.set_int(COUNTER_KEY, value)
    }

    /// Add one and persist, returning the new value. A write the store
    /// does not accept is `WriteRejected`.
    pub fn increment(&self) -> PrefResult<i64> {
        let next = self.read_counter()? + 1;
        if !self.write_counter(next)? {
            return Err(PreferenceError::write_rejected(COUNTER_KEY));
        }
        info!(value = next, "counter incremented");
        Ok(next)
    }

    pub fn preferences(&self) -> &P {
        &self.preferences
    }
}
