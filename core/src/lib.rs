//! # Showroom Core
//!
//! The small set of abstractions every showroom feature is written against.
//!
//! A feature is described by four pieces:
//!
//! - **State**: owned, cloneable data (e.g. the current showroom view)
//! - **Action**: every input the feature reacts to, user intents and timer feedback alike
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`, synchronous and deterministic
//! - **Environment**: injected dependencies such as the [`environment::Clock`]
//!
//! Reducers never perform I/O. They return [`effect::Effect`] values that the
//! runtime crate executes; an effect may feed a new action back into the
//! reducer, which is how timed transitions settle.
//!
//! ## Example
//!
//! ```
//! use showroom_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//! use std::time::Duration;
//!
//! #[derive(Clone, Debug, Default)]
//! struct DoorState {
//!     open: bool,
//!     closing: bool,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum DoorAction {
//!     Open,
//!     Close,
//!     Closed,
//! }
//!
//! struct DoorReducer;
//!
//! impl Reducer for DoorReducer {
//!     type State = DoorState;
//!     type Action = DoorAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut DoorState,
//!         action: DoorAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<DoorAction>; 4]> {
//!         match action {
//!             DoorAction::Open => {
//!                 state.open = true;
//!                 smallvec![Effect::None]
//!             },
//!             DoorAction::Close => {
//!                 state.closing = true;
//!                 smallvec![Effect::Delay {
//!                     duration: Duration::from_millis(500),
//!                     action: Box::new(DoorAction::Closed),
//!                 }]
//!             },
//!             DoorAction::Closed => {
//!                 state.open = false;
//!                 state.closing = false;
//!                 smallvec![Effect::None]
//!             },
//!         }
//!     }
//! }
//!
//! let mut state = DoorState::default();
//! let effects = DoorReducer.reduce(&mut state, DoorAction::Close, &());
//! assert!(state.closing);
//! assert!(matches!(effects[0], Effect::Delay { .. }));
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Reducer module - the trait every feature implements
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - business logic as a pure state transition
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer owns
    /// - `Action`: The inputs it reacts to
    /// - `Environment`: Injected dependencies
    ///
    /// Most actions produce zero or one effect, so effects are returned in a
    /// [`SmallVec`] that stays on the stack for up to four entries.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Apply `action` to `state` and describe the follow-up work
        ///
        /// Must not block or perform I/O. Invalid actions should leave the
        /// state untouched and return [`Effect::None`].
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed by the reducer. The runtime `Store` runs them
    /// after the reducer returns and feeds any produced action back in.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Dispatch `action` after `duration` has elapsed
        ///
        /// There is no cancellation. Reducers that need to ignore a late
        /// action must tag it (see the showroom transition token).
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// If the future yields `Some(action)`, it is fed back into the reducer.
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Whether this effect does nothing
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) => effects.iter().all(Effect::is_none),
                Effect::Delay { .. } | Effect::Future(_) => false,
            }
        }
    }
}

/// Environment module - dependency injection traits
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time for testability
    ///
    /// Conversation timestamps are taken from the clock so tests can pin them.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock implementation backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}
