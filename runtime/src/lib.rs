//! # Showroom Runtime
//!
//! The [`Store`] owns one feature's state, runs its reducer and executes the
//! effects the reducer returns.
//!
//! ## Responsibilities
//!
//! - **State ownership**: state lives behind a `RwLock`; reducers run one at a time
//! - **Effect execution**: `Delay` and `Future` effects run on spawned tokio tasks
//!   and feed their resulting action back through [`Store::send`]
//! - **Observation**: [`Store::subscribe`] hands out a `watch` receiver of state
//!   snapshots, [`Store::subscribe_actions`] a `broadcast` receiver of the actions
//!   produced by effects
//!
//! ## Example
//!
//! ```ignore
//! use showroom_runtime::Store;
//!
//! let store = Store::new(ShowroomState::default(), ShowroomReducer, env);
//!
//! let mut handle = store.send(ShowroomAction::RotateNext).await?;
//! handle.wait().await; // transition settled
//!
//! let facade = store.state(|s| s.current_facade).await;
//! ```

use showroom_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timed out waiting for effects to complete
        #[error("Timeout waiting for effects")]
        Timeout,
    }
}

pub use error::StoreError;
pub use store::Store;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send`]. Only the effects returned directly for that
/// action are tracked; a `Delay` counts as done once its delayed action has
/// been reduced.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (_, rx) = watch::channel(());
        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of tracked effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracking clone is gone, so the counter is settled.
                break;
            }
        }
    }

    /// Wait for all tracked effects with an upper bound
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when
    /// `timeout` elapses.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Internal: tracking context shared by the effects of one `send`
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: decrements the effect counter on drop, even if the task panics
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Internal: decrements the store-wide pending counter on drop
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreError, broadcast, watch,
    };

    /// The Store - runtime coordinator for a reducer
    ///
    /// Cloning a store is cheap and every clone shares the same state.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        snapshots: Arc<watch::Sender<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Actions produced by effects, for observers.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Clone + Send + 'static,
        S: Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast buffers 16 actions; use
        /// [`Store::with_broadcast_capacity`] for chattier features.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a new store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));
            let (snapshots, _) = watch::channel(initial_state.clone());

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                snapshots: Arc::new(snapshots),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock and runs the reducer
        /// 2. Publishes a state snapshot to [`Store::subscribe`] receivers
        /// 3. Starts the returned effects without waiting for them
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.total").increment(1);
            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                let effects = self.reducer.reduce(&mut *state, action, &*self.environment);
                self.snapshots.send_replace(state.clone());
                effects
            };

            tracing::trace!("Reducer returned {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let view = store.state(|s| s.current_view).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Subscribe to state snapshots
        ///
        /// A snapshot is published after every reduced action, including
        /// actions that left the state unchanged.
        #[must_use]
        pub fn subscribe(&self) -> watch::Receiver<S> {
            self.snapshots.subscribe()
        }

        /// Subscribe to actions produced by effects
        ///
        /// Actions passed to [`Store::send`] directly are not broadcast.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Number of effects still running across all sends
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Stop accepting actions and wait for running effects
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating store shutdown");
            self.shutdown.store(true, Ordering::Release);

            let poll_interval = Duration::from_millis(10);
            let wait = async {
                while self.pending_effects.load(Ordering::Acquire) > 0 {
                    tokio::time::sleep(poll_interval).await;
                }
            };

            if tokio::time::timeout(timeout, wait).await.is_err() {
                let pending = self.pending_effects.load(Ordering::Acquire);
                tracing::error!(pending_effects = pending, "Shutdown timed out");
                return Err(StoreError::ShutdownTimeout(pending));
            }

            tracing::info!("All effects completed, shutdown successful");
            Ok(())
        }

        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Delay { duration, action } => {
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let guards = self.track(tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guards = guards;
                        tokio::time::sleep(duration).await;
                        tracing::trace!(?duration, "Effect::Delay elapsed, sending action");

                        let action = *action;
                        let _ = store.action_broadcast.send(action.clone());
                        if let Err(e) = store.send(action).await {
                            tracing::debug!(error = %e, "Delayed action dropped");
                        }
                    });
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let guards = self.track(tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guards = guards;
                        if let Some(action) = fut.await {
                            let _ = store.action_broadcast.send(action.clone());
                            if let Err(e) = store.send(action).await {
                                tracing::debug!(error = %e, "Effect action dropped");
                            }
                        }
                    });
                },
            }
        }

        fn track(&self, tracking: EffectTracking) -> (DecrementGuard, AtomicCounterGuard) {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            (
                DecrementGuard(tracking),
                AtomicCounterGuard(Arc::clone(&self.pending_effects)),
            )
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                snapshots: Arc::clone(&self.snapshots),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use showroom_core::{SmallVec, smallvec};

    #[derive(Clone, Debug, Default)]
    struct LampState {
        on: bool,
        toggles: u32,
    }

    #[derive(Clone, Debug)]
    enum LampAction {
        Toggle,
        ToggleLater(Duration),
    }

    struct LampReducer;

    impl Reducer for LampReducer {
        type State = LampState;
        type Action = LampAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut LampState,
            action: LampAction,
            _env: &(),
        ) -> SmallVec<[Effect<LampAction>; 4]> {
            match action {
                LampAction::Toggle => {
                    state.on = !state.on;
                    state.toggles += 1;
                    smallvec![Effect::None]
                },
                LampAction::ToggleLater(duration) => smallvec![Effect::Delay {
                    duration,
                    action: Box::new(LampAction::Toggle),
                }],
            }
        }
    }

    #[tokio::test]
    async fn test_send_reduces_synchronously() {
        let store = Store::new(LampState::default(), LampReducer, ());

        let handle = store.send(LampAction::Toggle).await.unwrap();

        assert_eq!(handle.pending(), 0);
        assert!(store.state(|s| s.on).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_feeds_action_back() {
        let store = Store::new(LampState::default(), LampReducer, ());

        let mut handle = store
            .send(LampAction::ToggleLater(Duration::from_millis(800)))
            .await
            .unwrap();
        assert!(!store.state(|s| s.on).await);
        assert_eq!(store.pending_effects(), 1);

        handle.wait().await;

        assert!(store.state(|s| s.on).await);
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn test_snapshots_follow_state() {
        let store = Store::new(LampState::default(), LampReducer, ());
        let mut rx = store.subscribe();

        store.send(LampAction::Toggle).await.unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().toggles, 1);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_actions() {
        let store = Store::new(LampState::default(), LampReducer, ());

        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert!(matches!(
            store.send(LampAction::Toggle).await,
            Err(StoreError::ShutdownInProgress)
        ));
    }

    #[tokio::test]
    async fn test_completed_handle_does_not_block() {
        let mut handle = EffectHandle::completed();
        handle
            .wait_with_timeout(Duration::from_millis(10))
            .await
            .unwrap();
    }
}
