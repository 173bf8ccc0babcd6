//! Clock adapters.
//!
//! `SystemClock` for production. `MockClock` is available in test builds and
//! with the `test-helpers` feature.

use crate::ports::outbound::Clock;
use chrono::{DateTime, Local};
use std::time::Instant;

/// System clock: `Instant::now()` and `Local::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_time(&self) -> DateTime<Local> {
        Local::now()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::MockClock;

#[cfg(any(test, feature = "test-helpers"))]
mod mock {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    /// Controllable clock for tests.
    ///
    /// Monotonic and wall time advance together. Clones share state, so
    /// advancing one clone advances all of them.
    #[derive(Debug, Clone)]
    pub struct MockClock {
        state: Arc<Mutex<(Instant, DateTime<Local>)>>,
    }

    impl MockClock {
        pub fn new(wall_time: DateTime<Local>) -> Self {
            Self {
                state: Arc::new(Mutex::new((Instant::now(), wall_time))),
            }
        }

        /// A fixed mid-January date at `hour:00:00` local time, clear of DST
        /// transitions.
        pub fn at_hour(hour: u32) -> Self {
            let wall = Local
                .with_ymd_and_hms(2024, 1, 15, hour, 0, 0)
                .earliest()
                .unwrap_or_else(Local::now);
            Self::new(wall)
        }

        pub fn advance(&self, duration: Duration) {
            let mut state = self.state.lock();
            state.0 += duration;
            state.1 += chrono::Duration::from_std(duration)
                .unwrap_or_else(|_| chrono::Duration::zero());
        }

        /// Move wall time to `hour` on the same day without touching the
        /// monotonic instant.
        pub fn set_hour(&self, hour: u32) {
            let mut state = self.state.lock();
            if let Some(updated) = state.1.with_hour(hour) {
                state.1 = updated;
            }
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            self.state.lock().0
        }

        fn wall_time(&self) -> DateTime<Local> {
            self.state.lock().1
        }
    }
}
