//! Polling controller
//!
//! Periodically invalidates one cached query and stops on its own after a
//! run of consecutive failures.
//!
//! Each call to [`PollingController::start`] creates an activation: one
//! Tokio task holding the interval timer, plus the retry counter for that
//! activation. Invalidation attempts are spawned into a `JoinSet` owned by
//! the task, so a slow attempt may overlap the next tick. Aborting the task
//! cancels the timer together with every attempt still in flight, which
//! keeps late results from leaking into a later activation.

use campus_core::PollConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::runtime::Handle;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{InvalidationFailure, PollError};
use crate::scheduler::Invalidator;

/// Counters of a single activation
#[derive(Debug)]
struct PollState {
    retry_count: AtomicU32,
    active: AtomicBool,
}

impl PollState {
    fn new() -> Self {
        Self {
            retry_count: AtomicU32::new(0),
            active: AtomicBool::new(true),
        }
    }

    /// Applies the outcome of one attempt
    ///
    /// Returns `false` once `max_retries` consecutive failures are reached.
    fn record(&self, outcome: &Result<(), InvalidationFailure>, max_retries: u32) -> bool {
        match outcome {
            Ok(()) => {
                self.retry_count.store(0, Ordering::SeqCst);
                true
            }
            Err(_) => {
                let failures = self.retry_count.fetch_add(1, Ordering::SeqCst) + 1;
                failures < max_retries
            }
        }
    }

    fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::SeqCst)
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

struct Activation {
    id: Uuid,
    config: PollConfig,
    state: Arc<PollState>,
    timer: JoinHandle<()>,
}

/// Drives periodic invalidation of a cached query
///
/// Failures are absorbed: they only advance the retry counter and never
/// reach the caller. Dropping the controller stops polling.
pub struct PollingController {
    invalidator: Arc<dyn Invalidator>,
    activation: Option<Activation>,
}

impl PollingController {
    /// Creates a controller that invalidates through `invalidator`
    pub fn new(invalidator: Arc<dyn Invalidator>) -> Self {
        Self {
            invalidator,
            activation: None,
        }
    }

    /// Starts polling with a fresh retry counter
    ///
    /// The first attempt fires one interval from now. A running activation is
    /// cancelled first, so at most one timer exists per controller. An invalid
    /// configuration is rejected without touching the current activation.
    ///
    /// # Errors
    /// - [`PollError::Disabled`] if `config.enabled` is false
    /// - [`PollError::InvalidConfig`] for a zero interval or zero retry ceiling
    /// - [`PollError::NoRuntime`] when called outside a Tokio runtime
    pub fn start(&mut self, config: PollConfig) -> Result<(), PollError> {
        config.validate()?;
        if !config.enabled {
            return Err(PollError::Disabled(config.key));
        }
        let runtime = Handle::try_current().map_err(|_| PollError::NoRuntime)?;

        self.stop();

        let id = Uuid::new_v4();
        let state = Arc::new(PollState::new());
        let first_tick = Instant::now() + config.interval;

        info!(
            "Polling '{}' every {:?} (max retries: {}, activation {})",
            config.key, config.interval, config.max_retries, id
        );

        let timer = runtime.spawn(Self::run(
            id,
            config.clone(),
            first_tick,
            Arc::clone(&self.invalidator),
            Arc::clone(&state),
        ));

        self.activation = Some(Activation {
            id,
            config,
            state,
            timer,
        });

        Ok(())
    }

    /// Stops polling and discards the retry counter
    ///
    /// Safe to call when not started.
    pub fn stop(&mut self) {
        if let Some(activation) = self.activation.take() {
            activation.timer.abort();
            activation.state.deactivate();
            info!(
                "Stopped polling '{}' (activation {})",
                activation.config.key, activation.id
            );
        }
    }

    /// Reconciles the controller with a possibly changed configuration
    ///
    /// A disabled config stops polling. A config equal to the current
    /// activation's is a no-op, even when that activation already gave up.
    /// Anything else starts a new activation.
    pub fn apply(&mut self, config: PollConfig) -> Result<(), PollError> {
        if !config.enabled {
            self.stop();
            return Ok(());
        }

        if self
            .activation
            .as_ref()
            .is_some_and(|activation| activation.config == config)
        {
            return Ok(());
        }

        self.start(config)
    }

    /// Whether a timer is currently active
    pub fn is_polling(&self) -> bool {
        self.activation
            .as_ref()
            .is_some_and(|activation| activation.state.is_active())
    }

    /// Consecutive failures in the current activation, 0 when stopped
    pub fn retry_count(&self) -> u32 {
        self.activation
            .as_ref()
            .map_or(0, |activation| activation.state.retry_count())
    }

    /// Configuration of the current activation
    pub fn config(&self) -> Option<&PollConfig> {
        self.activation.as_ref().map(|activation| &activation.config)
    }

    /// Timer loop of one activation
    async fn run(
        id: Uuid,
        config: PollConfig,
        first_tick: Instant,
        invalidator: Arc<dyn Invalidator>,
        state: Arc<PollState>,
    ) {
        let mut ticker = time::interval_at(first_tick, config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight: JoinSet<Result<(), InvalidationFailure>> = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let invalidator = Arc::clone(&invalidator);
                    let key = config.key.clone();
                    in_flight.spawn(async move { invalidator.invalidate(&key).await });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    // A panicking invalidator counts as a failed attempt
                    let outcome = joined.unwrap_or_else(|e| {
                        Err(InvalidationFailure::new(format!("invalidation task failed: {}", e)))
                    });

                    let keep_polling = state.record(&outcome, config.max_retries);

                    if let Err(failure) = &outcome {
                        debug!(
                            "Invalidation of '{}' failed ({}/{}): {}",
                            config.key,
                            state.retry_count(),
                            config.max_retries,
                            failure
                        );
                    }

                    if !keep_polling {
                        debug!(
                            "Giving up on '{}' after {} consecutive failures (activation {})",
                            config.key, config.max_retries, id
                        );
                        break;
                    }
                }
            }
        }

        state.deactivate();
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campus_core::QueryKey;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Invalidator that replays a script of outcomes and records every call
    struct ScriptedInvalidator {
        outcomes: Mutex<VecDeque<bool>>,
        fallback: bool,
        latency: Duration,
        calls: Mutex<Vec<Instant>>,
        completed: AtomicUsize,
    }

    impl ScriptedInvalidator {
        fn new(outcomes: &[bool], fallback: bool, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.iter().copied().collect()),
                fallback,
                latency,
                calls: Mutex::new(Vec::new()),
                completed: AtomicUsize::new(0),
            })
        }

        fn always(ok: bool) -> Arc<Self> {
            Self::new(&[], ok, Duration::ZERO)
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }

        fn completed(&self) -> usize {
            self.completed.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Invalidator for ScriptedInvalidator {
        async fn invalidate(&self, _key: &QueryKey) -> Result<(), InvalidationFailure> {
            self.calls.lock().unwrap().push(Instant::now());
            let ok = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.fallback);

            if !self.latency.is_zero() {
                time::sleep(self.latency).await;
            }
            self.completed.fetch_add(1, Ordering::SeqCst);

            if ok {
                Ok(())
            } else {
                Err(InvalidationFailure::new("backend unavailable"))
            }
        }
    }

    struct PanickingInvalidator;

    #[async_trait]
    impl Invalidator for PanickingInvalidator {
        async fn invalidate(&self, _key: &QueryKey) -> Result<(), InvalidationFailure> {
            panic!("cache layer blew up");
        }
    }

    fn config(interval_ms: u64, max_retries: u32) -> PollConfig {
        PollConfig::new(QueryKey::parse("lessons/7/comments").unwrap())
            .with_interval(Duration::from_millis(interval_ms))
            .with_max_retries(max_retries)
    }

    async fn sleep_ms(ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_gives_up_after_max_retries() {
        let invalidator = ScriptedInvalidator::always(false);
        let mut controller = PollingController::new(invalidator.clone());

        let started_at = Instant::now();
        controller.start(config(1000, 3)).unwrap();
        sleep_ms(10_000).await;

        let times = invalidator.call_times();
        assert_eq!(times.len(), 3);
        for (i, at) in times.iter().enumerate() {
            assert_eq!(
                *at - started_at,
                Duration::from_millis(1000 * (i as u64 + 1))
            );
        }
        assert!(!controller.is_polling());
        // The ceiling cancels the timer but keeps the counter
        assert_eq!(controller.retry_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_waits_one_interval() {
        let invalidator = ScriptedInvalidator::always(true);
        let mut controller = PollingController::new(invalidator.clone());

        controller.start(config(1000, 3)).unwrap();
        assert!(controller.is_polling());

        sleep_ms(999).await;
        assert_eq!(invalidator.calls(), 0);

        sleep_ms(2).await;
        assert_eq!(invalidator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_exactly_n_failures() {
        for n in 1..=5u32 {
            let invalidator = ScriptedInvalidator::always(false);
            let mut controller = PollingController::new(invalidator.clone());
            controller.start(config(1000, n)).unwrap();

            sleep_ms(1000 * u64::from(n - 1) + 500).await;
            assert!(controller.is_polling(), "n = {}", n);
            assert_eq!(invalidator.calls(), (n - 1) as usize);

            sleep_ms(1000).await;
            assert!(!controller.is_polling(), "n = {}", n);
            assert_eq!(invalidator.calls(), n as usize);

            sleep_ms(5000).await;
            assert_eq!(invalidator.calls(), n as usize);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_counter() {
        for n in 1..=5u32 {
            let failures = (n - 1) as usize;
            let mut script = vec![false; failures];
            script.push(true);
            script.extend(vec![false; failures]);

            let invalidator = ScriptedInvalidator::new(&script, true, Duration::ZERO);
            let mut controller = PollingController::new(invalidator.clone());
            controller.start(config(1000, n)).unwrap();

            sleep_ms(1000 * script.len() as u64 + 500).await;
            assert_eq!(invalidator.calls(), script.len());
            assert!(controller.is_polling(), "n = {}", n);
            assert_eq!(controller.retry_count(), n - 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fail_succeed_fail_fail_keeps_polling() {
        let invalidator =
            ScriptedInvalidator::new(&[false, false, true, false, false], false, Duration::ZERO);
        let mut controller = PollingController::new(invalidator.clone());
        controller.start(config(1000, 3)).unwrap();

        sleep_ms(5500).await;
        assert_eq!(invalidator.calls(), 5);
        assert!(controller.is_polling());
        assert_eq!(controller.retry_count(), 2);

        // Attempt 6 is the third failure since the last success
        sleep_ms(1000).await;
        assert_eq!(invalidator.calls(), 6);
        assert!(!controller.is_polling());

        sleep_ms(5000).await;
        assert_eq!(invalidator.calls(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_then_start_runs_single_timer() {
        let invalidator = ScriptedInvalidator::always(true);
        let mut controller = PollingController::new(invalidator.clone());

        controller.start(config(1000, 3)).unwrap();
        sleep_ms(500).await;
        controller.stop();
        controller.start(config(1000, 3)).unwrap();

        // Ticks at 1500, 2500, 3500, 4500, 5500
        sleep_ms(5050).await;
        assert_eq!(invalidator.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_started_replaces_timer() {
        let invalidator = ScriptedInvalidator::always(true);
        let mut controller = PollingController::new(invalidator.clone());

        controller.start(config(1000, 3)).unwrap();
        sleep_ms(500).await;
        controller.start(config(1000, 3)).unwrap();
        controller.start(config(1000, 3)).unwrap();

        sleep_ms(5050).await;
        assert_eq!(invalidator.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_mid_cycle_prevents_further_calls() {
        let invalidator = ScriptedInvalidator::always(false);
        let mut controller = PollingController::new(invalidator.clone());

        controller.start(config(1000, 5)).unwrap();
        sleep_ms(2500).await;
        assert_eq!(invalidator.calls(), 2);
        assert_eq!(controller.retry_count(), 2);

        controller.stop();
        assert!(!controller.is_polling());
        assert_eq!(controller.retry_count(), 0);
        assert!(controller.config().is_none());

        sleep_ms(5000).await;
        assert_eq!(invalidator.calls(), 2);
    }

    #[tokio::test]
    async fn test_stop_when_never_started_is_noop() {
        let invalidator = ScriptedInvalidator::always(true);
        let mut controller = PollingController::new(invalidator.clone());

        controller.stop();
        controller.stop();

        assert!(!controller.is_polling());
        assert_eq!(controller.retry_count(), 0);
        assert!(controller.config().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempts_overlap_and_still_count() {
        // Each attempt takes 2.5 intervals to fail
        let invalidator = ScriptedInvalidator::new(&[], false, Duration::from_millis(2500));
        let mut controller = PollingController::new(invalidator.clone());
        controller.start(config(1000, 3)).unwrap();

        // Failures land at 3500, 4500, 5500; ticks keep firing meanwhile
        sleep_ms(5400).await;
        assert!(controller.is_polling());
        assert_eq!(controller.retry_count(), 2);
        assert_eq!(invalidator.calls(), 5);

        sleep_ms(200).await;
        assert!(!controller.is_polling());
        assert_eq!(controller.retry_count(), 3);

        // The attempt still in flight at the ceiling is cancelled with the timer
        sleep_ms(10_000).await;
        assert_eq!(invalidator.calls(), 5);
        assert_eq!(invalidator.completed(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_in_flight_attempts() {
        let invalidator = ScriptedInvalidator::new(&[], true, Duration::from_millis(2500));
        let mut controller = PollingController::new(invalidator.clone());
        controller.start(config(1000, 3)).unwrap();

        sleep_ms(1500).await;
        assert_eq!(invalidator.calls(), 1);
        controller.stop();

        sleep_ms(5000).await;
        assert_eq!(invalidator.calls(), 1);
        assert_eq!(invalidator.completed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_ignores_previous_activation_results() {
        let invalidator = ScriptedInvalidator::new(&[], false, Duration::from_millis(2500));
        let mut controller = PollingController::new(invalidator.clone());
        controller.start(config(1000, 1)).unwrap();

        // First attempt is in flight and would fail at 3500
        sleep_ms(1500).await;
        controller.start(config(1000, 1)).unwrap();

        // New activation's first attempt started at 2500, resolves at 5000
        sleep_ms(2500).await;
        assert!(controller.is_polling());
        assert_eq!(controller.retry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_controller_stops_polling() {
        let invalidator = ScriptedInvalidator::always(true);
        {
            let mut controller = PollingController::new(invalidator.clone());
            controller.start(config(1000, 3)).unwrap();
            sleep_ms(1500).await;
        }

        sleep_ms(5000).await;
        assert_eq!(invalidator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_invalidator_counts_as_failure() {
        let mut controller = PollingController::new(Arc::new(PanickingInvalidator));
        controller.start(config(1000, 2)).unwrap();

        sleep_ms(1500).await;
        assert!(controller.is_polling());
        assert_eq!(controller.retry_count(), 1);

        sleep_ms(1000).await;
        assert!(!controller.is_polling());
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let invalidator = ScriptedInvalidator::always(true);
        let mut controller = PollingController::new(invalidator.clone());

        let err = controller.start(config(1000, 3).enabled(false)).unwrap_err();
        assert!(matches!(err, PollError::Disabled(_)));

        let err = controller.start(config(0, 3)).unwrap_err();
        assert!(matches!(err, PollError::InvalidConfig(_)));

        let err = controller.start(config(1000, 0)).unwrap_err();
        assert!(matches!(err, PollError::InvalidConfig(_)));

        assert!(!controller.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_start_keeps_running_activation() {
        let invalidator = ScriptedInvalidator::always(true);
        let mut controller = PollingController::new(invalidator.clone());

        controller.start(config(1000, 3)).unwrap();
        assert!(controller.start(config(0, 3)).is_err());
        assert!(controller.is_polling());

        sleep_ms(1500).await;
        assert_eq!(invalidator.calls(), 1);
    }

    #[test]
    fn test_start_outside_runtime() {
        let invalidator = ScriptedInvalidator::always(true);
        let mut controller = PollingController::new(invalidator);

        let err = controller.start(config(1000, 3)).unwrap_err();
        assert!(matches!(err, PollError::NoRuntime));
        assert!(!controller.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_follows_enabled_flag() {
        let invalidator = ScriptedInvalidator::always(true);
        let mut controller = PollingController::new(invalidator.clone());

        controller.apply(config(1000, 3).enabled(false)).unwrap();
        assert!(!controller.is_polling());

        controller.apply(config(1000, 3)).unwrap();
        assert!(controller.is_polling());

        controller.apply(config(1000, 3).enabled(false)).unwrap();
        assert!(!controller.is_polling());
        assert!(controller.config().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_same_config_keeps_cadence() {
        let invalidator = ScriptedInvalidator::always(true);
        let mut controller = PollingController::new(invalidator.clone());

        controller.apply(config(1000, 3)).unwrap();
        sleep_ms(1500).await;
        controller.apply(config(1000, 3)).unwrap();

        // A restart at 1500 would move the second attempt to 2500
        sleep_ms(550).await;
        assert_eq!(invalidator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_after_ceiling_needs_changed_config() {
        let invalidator = ScriptedInvalidator::always(false);
        let mut controller = PollingController::new(invalidator.clone());

        controller.apply(config(1000, 1)).unwrap();
        sleep_ms(1500).await;
        assert!(!controller.is_polling());

        controller.apply(config(1000, 1)).unwrap();
        assert!(!controller.is_polling());
        assert_eq!(controller.retry_count(), 1);

        controller.apply(config(500, 1)).unwrap();
        assert!(controller.is_polling());
        assert_eq!(controller.retry_count(), 0);

        sleep_ms(550).await;
        assert_eq!(invalidator.calls(), 2);
        assert!(!controller.is_polling());
    }
}
