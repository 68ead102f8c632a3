//! # Showroom Testing
//!
//! Helpers shared by the showroom crates' tests:
//!
//! - Deterministic clocks ([`FixedClock`], [`SteppingClock`])
//! - [`ReducerTest`], a Given-When-Then builder for reducers
//! - Effect assertions in [`assertions`]
//!
//! ## Example
//!
//! ```ignore
//! use showroom_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(ConversationReducer)
//!     .with_env(ConversationEnvironment::new(test_clock()))
//!     .given_state(ConversationState::default())
//!     .when_action(ConversationAction::Clear)
//!     .then_state(|state| assert!(state.messages().is_empty()))
//!     .run();
//! ```

use chrono::{DateTime, Duration, Utc};
use showroom_core::environment::Clock;
use std::sync::Mutex;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, Mutex, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time.
    ///
    /// # Example
    ///
    /// ```
    /// use showroom_testing::mocks::FixedClock;
    /// use showroom_core::environment::Clock;
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

    /// Clock that advances by a fixed step on every read
    ///
    /// Useful when a test needs distinct, ordered timestamps.
    #[derive(Debug)]
    pub struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl SteppingClock {
        /// Start at `start`, advancing `step` after each `now()`
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut next = match self.next.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let current = *next;
            *next = current + self.step;
            current
        }
    }

    /// The instant every test clock starts from (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_089)
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(epoch())
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, SteppingClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
