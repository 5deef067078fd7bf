//! # Finanza Runtime
//!
//! Runtime implementation for the Finanza client architecture.
//!
//! The runtime owns the [`store::Store`]: it holds state behind a lock,
//! runs reducers, executes the effects they return, and feeds actions
//! produced by effects back into the reducer.
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution → More Actions
//! ```
//!
//! The Store is the only component that performs I/O; reducers stay pure.

use finanza_core::effect::Effect;
use finanza_core::reducer::Reducer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Store error types
pub mod error {
    use thiserror::Error;

    /// Errors produced by the Store runtime.
    #[derive(Debug, Error, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The store is shutting down and no longer accepts actions.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out with effects still running.
        #[error("Shutdown timeout: {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timed out waiting for a matching action.
        #[error("Timed out waiting for action")]
        Timeout,

        /// The action broadcast channel closed.
        #[error("Action channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Handle for tracking effect completion
///
/// Returned by [`store::Store::send()`] to allow waiting for the effects of
/// an action to complete.
///
/// # Example
///
/// ```ignore
/// let handle = store.send(AuthAction::Bootstrap).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Bootstrap (and nothing more) are now complete
/// ```
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
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete.
    ///
    /// Useful for initialization in loops where you need a `last_handle`.
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Wait for all immediate effects of the action to complete.
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            let _ = self.completion.changed().await;
        }
    }

    /// Wait for all effects to complete with a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: effect tracking context passed through effect execution.
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
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

/// Internal: RAII guard that decrements the effect counter on drop.
///
/// Ensures the counter is always decremented, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking).
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store module - the runtime coordinator for a reducer
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreError,
    };
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = Store::new(
    ///     AuthState::default(),
    ///     AuthReducer::new(),
    ///     production_environment(),
    /// );
    ///
    /// store.send(AuthAction::Bootstrap).await?;
    /// ```
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Action broadcast channel for observing actions produced by effects.
        ///
        /// All actions produced by effects (from `Effect::Future` and
        /// `Effect::Delay`) are broadcast to observers. This enables the
        /// request-response pattern used by user-triggered account actions.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment.
        ///
        /// Default action broadcast capacity is 16; increase with
        /// [`Store::with_broadcast_capacity`] if observers frequently lag.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a new store with a custom action broadcast capacity.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Returns `true` if the store has been asked to shut down.
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }

        /// Initiate graceful shutdown of the store
        ///
        /// This method:
        /// 1. Sets the shutdown flag (rejecting new actions)
        /// 2. Waits for pending effects to complete (with timeout)
        ///
        /// Delayed actions (timeouts, retries) still in flight when shutdown
        /// begins complete their sleep but are rejected at dispatch, so a
        /// torn-down store never applies a stale completion.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires
        /// before all pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(100);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running",
                        pending
                    );
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// This is the primary way to interact with the store:
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Executes returned effects asynchronously
        /// 4. Effects may produce more actions (feedback loop)
        ///
        /// # Concurrency and Effect Execution
        ///
        /// - The reducer executes synchronously while holding a write lock
        /// - Effects execute asynchronously in spawned tasks
        /// - `send()` returns after starting effect execution, not completion
        /// - Multiple concurrent `send()` calls serialize at the reducer level
        /// - Effects may complete in non-deterministic order
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                effects
            };

            tracing::trace!("Executing {} effects", effects.len());
            for effect in effects {
                self.execute_effect_internal(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Designed for request-response flows: subscribe to the action
        /// broadcast BEFORE sending (avoids race conditions), send the
        /// initial action, then wait for the first action produced by
        /// effects that matches the predicate.
        ///
        /// Use correlation ids in the predicate to distinguish concurrent
        /// requests.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: timeout expired before a matching action
        /// - [`StoreError::ChannelClosed`]: broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool + Send,
        {
            let mut actions = self.action_broadcast.subscribe();

            self.send(action).await?;

            let wait = async {
                loop {
                    match actions.recv().await {
                        Ok(candidate) if predicate(&candidate) => return Ok(candidate),
                        Ok(_) => {},
                        // Lagged observers keep waiting; the timeout catches
                        // a dropped terminal action.
                        Err(broadcast::error::RecvError::Lagged(_)) => {},
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            };

            tokio::time::timeout(timeout, wait)
                .await
                .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to actions produced by effects.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// Access state through a closure to ensure the lock is released
        /// promptly:
        ///
        /// ```ignore
        /// let phase = store.state(|s| s.phase()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Execute an effect with tracking
        ///
        /// # Error Handling Strategy
        ///
        /// **Reducer panics**: propagate (fail fast). Reducers should be pure
        /// functions that do not panic.
        ///
        /// **Effect execution failures**: log and continue. Effects are
        /// fire-and-forget; the [`DecrementGuard`] ensures the counter is
        /// always updated even on panic.
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let tracking_clone = tracking.clone();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking_clone);
                        let _pending_guard = pending_guard;

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action");

                            // Broadcast to observers before feedback
                            let _ = store.action_broadcast.send(action.clone());

                            let _ = store.send(action).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let tracking_clone = tracking.clone();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking_clone);
                        let _pending_guard = pending_guard;

                        tokio::time::sleep(duration).await;

                        let _ = store.action_broadcast.send((*action).clone());

                        let _ = store.send(*action).await;
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);

                    for effect in effects {
                        self.execute_effect_internal(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential")
                        .increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let tracking_clone = tracking.clone();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking_clone);
                        let _pending_guard = pending_guard;

                        for effect in effects {
                            let (mut handle, sub_tracking) = EffectHandle::new();
                            store.execute_effect_internal(effect, sub_tracking);
                            handle.wait().await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use finanza_core::{SmallVec, smallvec};

    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    struct CounterState {
        value: i64,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum CounterAction {
        Increment,
        IncrementLater { delay_ms: u64 },
        Doubled { result: i64 },
        Double,
    }

    #[derive(Debug, Clone, Default)]
    struct CounterEnvironment;

    #[derive(Debug, Clone, Default)]
    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Action = CounterAction;
        type Environment = CounterEnvironment;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                CounterAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                CounterAction::IncrementLater { delay_ms } => {
                    smallvec![Effect::Delay {
                        duration: Duration::from_millis(delay_ms),
                        action: Box::new(CounterAction::Increment),
                    }]
                },
                CounterAction::Double => {
                    let current = state.value;
                    smallvec![Effect::Future(Box::pin(async move {
                        Some(CounterAction::Doubled {
                            result: current * 2,
                        })
                    }))]
                },
                CounterAction::Doubled { result } => {
                    state.value = result;
                    smallvec![Effect::None]
                },
            }
        }
    }

    fn test_store() -> Store<CounterState, CounterAction, CounterEnvironment, CounterReducer> {
        Store::new(
            CounterState::default(),
            CounterReducer,
            CounterEnvironment,
        )
    }

    #[tokio::test]
    async fn send_runs_reducer_synchronously() {
        let store = test_store();

        store.send(CounterAction::Increment).await.unwrap();

        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn future_effect_feeds_action_back() {
        let store = test_store();

        store.send(CounterAction::Increment).await.unwrap();
        let mut handle = store.send(CounterAction::Double).await.unwrap();
        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();

        // The Doubled feedback action may still be in flight after the
        // Future effect resolves; poll briefly.
        for _ in 0..50 {
            if store.state(|s| s.value).await == 2 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Doubled action was never applied");
    }

    #[tokio::test]
    async fn delay_effect_dispatches_after_duration() {
        let store = test_store();

        let mut handle = store
            .send(CounterAction::IncrementLater { delay_ms: 20 })
            .await
            .unwrap();
        assert_eq!(store.state(|s| s.value).await, 0);

        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();

        for _ in 0..50 {
            if store.state(|s| s.value).await == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("delayed Increment was never applied");
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_matching_action() {
        let store = test_store();

        store.send(CounterAction::Increment).await.unwrap();
        let result = store
            .send_and_wait_for(
                CounterAction::Double,
                |a| matches!(a, CounterAction::Doubled { .. }),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(result, CounterAction::Doubled { result: 2 });
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = test_store();

        store.shutdown(Duration::from_secs(1)).await.unwrap();

        let result = store.send(CounterAction::Increment).await;
        assert_eq!(result.unwrap_err(), StoreError::ShutdownInProgress);
        assert_eq!(store.state(|s| s.value).await, 0);
    }

    #[tokio::test]
    async fn delayed_action_is_rejected_after_shutdown() {
        let store = test_store();

        store
            .send(CounterAction::IncrementLater { delay_ms: 50 })
            .await
            .unwrap();
        // Shutdown waits out the pending delay, then the dispatch is rejected.
        store.shutdown(Duration::from_secs(2)).await.unwrap();

        assert_eq!(store.state(|s| s.value).await, 0);
    }
}
