//! # Tally Runtime
//!
//! Runtime implementation for the Tally architecture.
//!
//! This crate provides the Store runtime that owns the current state
//! snapshot, coordinates reducer execution and runs effects.
//!
//! ## Core Components
//!
//! - **Store**: Owns the snapshot, reduces one action at a time, publishes every new snapshot
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Cancellation**: Cancellable effects are tracked by id so newer work can abort older work
//!
//! ## Example
//!
//! ```ignore
//! use tally_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//!
//! // React to every new snapshot
//! let mut snapshots = store.subscribe();
//! while let Some(snapshot) = snapshots.recv().await {
//!     render(&snapshot);
//! }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tally_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
};
use tokio::sync::{broadcast, watch, Notify, RwLock};

/// Health reporting
pub mod health;

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for effects or for a matching action
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;
pub use health::{HealthCheck, HealthStatus};

use crate::metrics::StoreMetrics;

/// Configuration for Store instances
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the channel broadcasting actions produced by effects
    pub broadcast_capacity: usize,
    /// Snapshots a subscriber may fall behind before it starts skipping
    pub snapshot_capacity: usize,
    /// Timeout used by [`Store::close`]
    pub shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set how far a snapshot subscriber may fall behind
    #[must_use]
    pub const fn with_snapshot_capacity(mut self, capacity: usize) -> Self {
        self.snapshot_capacity = capacity;
        self
    }

    /// Set the shutdown timeout used by [`Store::close`]
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            snapshot_capacity: 256,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Snapshots published by a [`Store`], in publication order
///
/// Yields the snapshot current at subscription time, then every replacement.
/// A subscriber more than [`StoreConfig::snapshot_capacity`] replacements
/// behind skips the oldest ones and logs a warning.
pub struct SnapshotReceiver<S> {
    current: Option<Arc<S>>,
    replacements: broadcast::Receiver<Arc<S>>,
}

impl<S> SnapshotReceiver<S> {
    /// Next snapshot, or `None` once every handle to the store is gone
    pub async fn recv(&mut self) -> Option<Arc<S>> {
        if let Some(current) = self.current.take() {
            return Some(current);
        }
        loop {
            match self.replacements.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Snapshot subscriber lagged");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next snapshot if one is already published, without waiting
    pub fn try_recv(&mut self) -> Option<Arc<S>> {
        if let Some(current) = self.current.take() {
            return Some(current);
        }
        loop {
            match self.replacements.try_recv() {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Snapshot subscriber lagged");
                },
                Err(_) => return None,
            }
        }
    }

    /// Wait for a snapshot satisfying `predicate`, skipping the ones before it
    ///
    /// Returns `None` if `timeout` elapses first or the store is gone.
    pub async fn wait_for<F>(&mut self, mut predicate: F, timeout: Duration) -> Option<Arc<S>>
    where
        F: FnMut(&S) -> bool,
    {
        let found = tokio::time::timeout(timeout, async {
            while let Some(snapshot) = self.recv().await {
                if predicate(&snapshot) {
                    return Some(snapshot);
                }
            }
            None
        })
        .await;

        found.ok().flatten()
    }
}

impl<S> std::fmt::Debug for SnapshotReceiver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotReceiver")
            .field("unread", &(usize::from(self.current.is_some()) + self.replacements.len()))
            .finish()
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects started by
/// that action. An effect counts as complete once any action it produced has
/// been reduced.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new handle and the tracking context feeding it
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

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
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

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Store-wide count of running effect tasks, with a wakeup when it drains
#[derive(Default)]
struct PendingEffects {
    count: AtomicUsize,
    drained: Notify,
}

impl PendingEffects {
    fn current(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    fn start(self: &Arc<Self>) -> PendingGuard {
        let pending = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        StoreMetrics::record_pending(pending);
        PendingGuard(Arc::clone(self))
    }

    /// Resolve once no effect task is running.
    async fn drained(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.current() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Held by an effect task for as long as it runs
struct PendingGuard(Arc<PendingEffects>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let remaining = self.0.count.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        StoreMetrics::record_pending(remaining);
        if remaining == 0 {
            self.0.drained.notify_waiters();
        }
    }
}

/// Internal: a running cancellable effect
struct InFlight {
    generation: u64,
    abort: tokio::task::AbortHandle,
}

/// Lock a std mutex, recovering the data if a holder panicked.
///
/// The guarded maps stay consistent across panics because every critical
/// section is a single insert or remove.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

const fn effect_kind<A>(effect: &Effect<A>) -> &'static str {
    match effect {
        Effect::None => "none",
        Effect::Parallel(_) => "parallel",
        Effect::Sequential(_) => "sequential",
        Effect::Delay { .. } => "delay",
        Effect::Future(_) => "future",
        Effect::Cancellable { .. } => "cancellable",
        Effect::Cancel(_) => "cancel",
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        effect_kind, lock, Arc, AtomicBool, AtomicU64, DecrementGuard, Duration, Effect,
        EffectHandle, EffectId, EffectTracking, HashMap, HealthCheck, InFlight, Mutex, Ordering,
        PendingEffects, Reducer, RwLock, SnapshotReceiver, StoreConfig, StoreError, StoreMetrics,
    };
    use futures::future::BoxFuture;
    use std::future::Future;
    use tokio::sync::broadcast;
    use tokio::task::JoinHandle;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. The current snapshot (an `Arc<S>` replaced, never mutated, on every action)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// Cloning a Store yields another handle to the same snapshot and effects.
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
        state: Arc<RwLock<Arc<S>>>,
        /// Last published snapshot; subscribers register under this lock
        latest: Arc<Mutex<Arc<S>>>,
        snapshots: broadcast::Sender<Arc<S>>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<PendingEffects>,
        in_flight: Arc<Mutex<HashMap<EffectId, InFlight>>>,
        generations: Arc<AtomicU64>,
        /// Actions produced by effects, after they have been reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with a custom configuration
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));
            let (snapshots, _) = broadcast::channel(config.snapshot_capacity.max(1));
            let initial = Arc::new(initial_state);

            Self {
                latest: Arc::new(Mutex::new(Arc::clone(&initial))),
                state: Arc::new(RwLock::new(initial)),
                snapshots,
                reducer,
                environment,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(PendingEffects::default()),
                in_flight: Arc::new(Mutex::new(HashMap::new())),
                generations: Arc::new(AtomicU64::new(0)),
                action_broadcast,
            }
        }

        /// Perform a health check on the Store
        ///
        /// Unhealthy once shutdown has started, healthy otherwise.
        #[must_use]
        pub fn health(&self) -> HealthCheck {
            let pending = self.pending_effects.current();
            let in_flight = lock(&self.in_flight).len();

            let check = if self.shutdown.load(Ordering::Acquire) {
                HealthCheck::unhealthy("store", "Store is shutting down")
            } else {
                HealthCheck::healthy("store")
            };

            check
                .with_metadata("pending_effects", pending.to_string())
                .with_metadata("cancellable_in_flight", in_flight.to_string())
        }

        /// Stop accepting actions and wait for running effects to drain
        ///
        /// Actions produced by effects that are still running are reduced
        /// normally while the store drains. Calling it again is harmless.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] with the number of effect
        /// tasks still running when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            let already = self.shutdown.swap(true, Ordering::AcqRel);
            tracing::info!(
                pending_effects = self.pending_effects.current(),
                repeated = already,
                "Store shutting down"
            );

            if tokio::time::timeout(timeout, self.pending_effects.drained()).await.is_ok() {
                tracing::info!("Store drained");
                return Ok(());
            }

            let pending = self.pending_effects.current();
            tracing::error!(pending_effects = pending, ?timeout, "Store did not drain in time");
            Err(StoreError::ShutdownTimeout(pending))
        }

        /// Shut down using the configured timeout
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn close(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.shutdown_timeout).await
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on the snapshot
        /// 2. Calls the reducer on a copy of the current snapshot
        /// 3. Publishes the copy as the new snapshot
        /// 4. Starts the returned effects (which may feed more actions back)
        ///
        /// `send()` returns once the new snapshot is published and effects are
        /// started, not when they complete. Concurrent sends are reduced one
        /// at a time.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic propagates to the caller.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                StoreMetrics::record_rejected();
                return Err(StoreError::ShutdownInProgress);
            }

            Ok(self.process(action).await)
        }

        /// Send an action and wait for a matching action produced by its effects
        ///
        /// Subscribes to the action broadcast before sending, so a fast effect
        /// cannot be missed. The matching action has already been reduced when
        /// this returns.
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`] if the store is shutting down
        /// - [`StoreError::Timeout`] if no matching action arrives in time
        /// - [`StoreError::ChannelClosed`] if the broadcast channel closes
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();
            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(candidate) if predicate(&candidate) => return Ok(candidate),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to actions produced by effects
        ///
        /// Every action an effect feeds back is broadcast after it has been reduced.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Subscribe to snapshot replacements
        ///
        /// The receiver starts at the current snapshot and then receives every
        /// replacement in order, including reductions that left the state equal.
        #[must_use]
        pub fn subscribe(&self) -> SnapshotReceiver<S> {
            let latest = lock(&self.latest);
            SnapshotReceiver {
                current: Some(Arc::clone(&*latest)),
                replacements: self.snapshots.subscribe(),
            }
        }

        /// The latest published snapshot
        ///
        /// The returned `Arc` is never modified; later actions publish new ones.
        #[must_use]
        pub fn snapshot(&self) -> Arc<S> {
            Arc::clone(&*lock(&self.latest))
        }

        fn publish(&self, snapshot: Arc<S>) {
            let mut latest = lock(&self.latest);
            *latest = Arc::clone(&snapshot);
            // No subscribers is fine
            let _ = self.snapshots.send(snapshot);
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let clicks = store.state(|s| s.click_count).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Abort the in-flight effect registered under `id`
        ///
        /// Returns `true` if an effect was running under that id.
        pub fn cancel(&self, id: EffectId) -> bool {
            let removed = lock(&self.in_flight).remove(&id);
            match removed {
                Some(in_flight) => {
                    in_flight.abort.abort();
                    StoreMetrics::record_cancelled();
                    tracing::debug!(effect_id = %id, "Cancelled effect");
                    true
                },
                None => false,
            }
        }

        /// Whether a cancellable effect is currently registered under `id`
        #[must_use]
        pub fn is_in_flight(&self, id: EffectId) -> bool {
            lock(&self.in_flight).contains_key(&id)
        }

        /// Reduce an action and start its effects, ignoring the shutdown flag
        async fn process(&self, action: A) -> EffectHandle {
            tracing::debug!("Processing action");

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut current = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let mut next = S::clone(&**current);
                let effects = self.reducer.reduce(&mut next, action, &self.environment);
                let next = Arc::new(next);
                *current = Arc::clone(&next);
                self.publish(next);
                StoreMetrics::record_action(start.elapsed());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect, &tracking);
            }

            handle
        }

        /// Reduce an action produced by an effect and broadcast it
        async fn feedback(&self, action: A) {
            let _ = self.process(action.clone()).await;
            let _ = self.action_broadcast.send(action);
        }

        /// Start an effect with completion tracking
        ///
        /// # Error Handling Strategy
        ///
        /// **Reducer panics**: propagate to the sender.
        ///
        /// **Effect failures**: effects are fire-and-forget. A panicking effect
        /// task is logged by the tokio runtime; the guards keep the counters
        /// correct.
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
            StoreMetrics::record_effect(effect_kind(&effect));

            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Cancel(id) => {
                    self.cancel(id);
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    for effect in effects {
                        self.execute_effect(effect, tracking);
                    }
                },
                Effect::Cancellable { id, effect } => {
                    // Registered before returning so a later send always supersedes this one
                    let (task, generation) = self.start_cancellable(id, *effect);
                    let store = self.clone();
                    self.spawn_tracked(tracking, async move {
                        store.finish_cancellable(id, generation, task).await;
                    });
                },
                effect => {
                    let fut = self.run_effect(effect);
                    self.spawn_tracked(tracking, fut);
                },
            }
        }

        fn spawn_tracked<F>(&self, tracking: &EffectTracking, fut: F)
        where
            F: Future<Output = ()> + Send + 'static,
        {
            tracking.increment();
            let guard = DecrementGuard(tracking.clone());
            let pending_guard = self.pending_effects.start();

            tokio::spawn(async move {
                let _guard = guard;
                let _pending_guard = pending_guard;
                fut.await;
            });
        }

        /// Drive an effect to completion, including reducing what it produces
        fn run_effect(&self, effect: Effect<A>) -> BoxFuture<'static, ()> {
            let store = self.clone();

            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            store.feedback(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    },
                    Effect::Delay { duration, action } => {
                        tokio::time::sleep(duration).await;
                        tracing::trace!("Effect::Delay completed, sending action");
                        store.feedback(*action).await;
                    },
                    Effect::Parallel(effects) => {
                        futures::future::join_all(effects.into_iter().map(|e| store.run_effect(e)))
                            .await;
                    },
                    Effect::Sequential(effects) => {
                        let count = effects.len();
                        for (idx, effect) in effects.into_iter().enumerate() {
                            tracing::trace!("Executing sequential effect {} of {}", idx + 1, count);
                            store.run_effect(effect).await;
                        }
                    },
                    Effect::Cancellable { id, effect } => {
                        let (task, generation) = store.start_cancellable(id, *effect);
                        store.finish_cancellable(id, generation, task).await;
                    },
                    Effect::Cancel(id) => {
                        store.cancel(id);
                    },
                }
            })
        }

        /// Spawn a cancellable effect and register it, aborting its predecessor
        fn start_cancellable(&self, id: EffectId, effect: Effect<A>) -> (JoinHandle<()>, u64) {
            let generation = self.generations.fetch_add(1, Ordering::Relaxed);
            let task = tokio::spawn(self.run_effect(effect));

            let superseded = lock(&self.in_flight).insert(
                id,
                InFlight {
                    generation,
                    abort: task.abort_handle(),
                },
            );

            if let Some(previous) = superseded {
                if !previous.abort.is_finished() {
                    previous.abort.abort();
                    StoreMetrics::record_cancelled();
                    tracing::debug!(effect_id = %id, "Cancelled superseded effect");
                }
            }

            (task, generation)
        }

        /// Await a cancellable effect and drop its registration
        async fn finish_cancellable(&self, id: EffectId, generation: u64, task: JoinHandle<()>) {
            let outcome = task.await;

            {
                let mut in_flight = lock(&self.in_flight);
                if in_flight.get(&id).is_some_and(|f| f.generation == generation) {
                    in_flight.remove(&id);
                }
            }

            match outcome {
                Ok(()) => tracing::trace!(effect_id = %id, "Cancellable effect completed"),
                Err(e) if e.is_cancelled() => {
                    tracing::debug!(effect_id = %id, "Cancellable effect aborted");
                },
                Err(e) => {
                    tracing::error!(effect_id = %id, error = %e, "Cancellable effect panicked");
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
                latest: Arc::clone(&self.latest),
                snapshots: self.snapshots.clone(),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                in_flight: Arc::clone(&self.in_flight),
                generations: Arc::clone(&self.generations),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
