//! Mock clock for testing.

use crate::application::ports::Clock;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock clock for testing.
///
/// Allows tests to pin the timestamp written into log lines and to move it
/// explicitly.
///
/// # Examples
///
/// ```
/// use throttled_log::infrastructure::mocks::MockClock;
/// use throttled_log::application::ports::Clock;
/// use std::time::Duration;
///
/// let clock = MockClock::epoch();
/// assert_eq!(clock.now().to_rfc3339(), "1970-01-01T00:00:00+00:00");
///
/// clock.advance(Duration::from_millis(1500));
/// assert_eq!(clock.now().timestamp_millis(), 1500);
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying time value, so advancing time in
/// one clone affects all clones.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a mock clock starting at a specific instant.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// A clock frozen at the Unix epoch.
    pub fn epoch() -> Self {
        Self::new(Utc.timestamp_opt(0, 0).single().unwrap_or_default())
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        let delta = chrono::Duration::from_std(duration)
            .expect("MockClock advance out of range");
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time += delta;
    }

    /// Set the clock to a specific instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time = instant;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}
