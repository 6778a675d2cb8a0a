//! # Courier Testing
//!
//! Testing utilities for the courier workflow.
//!
//! This crate provides:
//! - Deterministic [`Clock`] implementations (fixed and manually advanced)
//! - A Given/When/Then harness for reducers ([`ReducerTest`])
//! - Assertion helpers for effect lists
//!
//! ## Example
//!
//! ```ignore
//! use courier_testing::{ReducerTest, at};
//!
//! ReducerTest::new(WorkflowReducer::new())
//!     .with_env(environment_at(at("2024-06-01T10:00:00Z")))
//!     .given_state(Session::new(UserId::new(1)))
//!     .when_action(WorkflowAction::BeginOrder)
//!     .then_state(|session| assert!(matches!(session.stage, Stage::SelectingProduct)))
//!     .run();
//! ```


use chrono::{DateTime, Duration, Utc};
use courier_core::environment::Clock;
use std::sync::{Arc, Mutex, PoisonError};

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Arc, Clock, DateTime, Duration, Mutex, PoisonError, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time.
    ///
    /// # Example
    ///
    /// ```
    /// use courier_testing::mocks::FixedClock;
    /// use courier_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to.
    ///
    /// Clones share the same underlying instant, so a test can hand one clone
    /// to the code under test and advance time through another.
    ///
    /// ```
    /// use courier_testing::mocks::ManualClock;
    /// use courier_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = ManualClock::new(Utc::now());
    /// let before = clock.now();
    /// clock.advance(Duration::minutes(61));
    /// assert_eq!(clock.now() - before, Duration::minutes(61));
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward by `by`
        pub fn advance(&self, by: Duration) {
            let mut guard = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *guard += by;
        }

        /// Jump to an absolute instant
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = time;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }
}

/// Parse an RFC 3339 timestamp for use in tests.
///
/// # Panics
///
/// Panics if `rfc3339` is not a valid RFC 3339 timestamp.
#[must_use]
#[allow(clippy::expect_used)] // Test helper: a bad literal is a bug in the test
pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("test timestamp should be valid RFC 3339")
        .with_timezone(&Utc)
}

/// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
#[must_use]
pub fn test_clock() -> mocks::FixedClock {
    mocks::FixedClock::new(at("2025-01-01T00:00:00Z"))
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock};
pub use reducer_test::{ReducerTest, assertions};
