//! Lifecycle & power-state coordination.
//!
//! The coordinator owns the tick task and serializes `enable`,
//! `disable`, `on_suspend`, and `on_resume` against each other and
//! against an in-flight tick. Stopping the task is cancel-and-join:
//! the shutdown signal only takes effect between ticks and the task
//! handle is awaited, so a decision in flight always completes before
//! the control call returns.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use corepool_state::SharedParams;

use crate::driver::UnitDriver;
use crate::engine::{Governor, SharedGovernorState};

/// Delay before the first tick after an enable.
pub const DEFAULT_START_DELAY: Duration = Duration::from_millis(20_000);

/// The running tick task.
struct TickTask {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

struct LifecycleState {
    enabled: bool,
    suspended: bool,
    task: Option<TickTask>,
}

/// Gates whether the governor's tick loop is scheduled and applies the
/// suspend/resume pool policy.
pub struct Coordinator {
    governor: Arc<Governor>,
    params: SharedParams,
    state: SharedGovernorState,
    driver: Arc<dyn UnitDriver>,
    start_delay: Duration,
    inner: Mutex<LifecycleState>,
}

impl Coordinator {
    pub fn new(
        governor: Arc<Governor>,
        params: SharedParams,
        driver: Arc<dyn UnitDriver>,
    ) -> Self {
        let state = governor.state();
        Self {
            governor,
            params,
            state,
            driver,
            start_delay: DEFAULT_START_DELAY,
            inner: Mutex::new(LifecycleState {
                enabled: false,
                suspended: false,
                task: None,
            }),
        }
    }

    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub async fn is_enabled(&self) -> bool {
        self.inner.lock().await.enabled
    }

    pub async fn is_suspended(&self) -> bool {
        self.inner.lock().await.suspended
    }

    /// Whether the tick loop is currently scheduled.
    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.task.is_some()
    }

    /// Enable the governor. Idempotent: a second call while enabled is
    /// a no-op. The first tick fires after the start delay. While
    /// suspended, only the flag is set; `on_resume` does the scheduling.
    pub async fn enable(&self) {
        let mut inner = self.inner.lock().await;
        if inner.enabled {
            return;
        }
        inner.enabled = true;
        if !inner.suspended {
            self.spawn_task(&mut inner, self.start_delay);
        }
        info!("governor enabled");
    }

    /// Disable the governor: join any in-flight tick, then restore the
    /// pool to full capacity (regardless of the suspend policy flag).
    pub async fn disable(&self) {
        let mut inner = self.inner.lock().await;
        inner.enabled = false;
        Self::stop_task(&mut inner).await;
        self.restore_full_capacity().await;
        info!("governor disabled, pool restored to full capacity");
    }

    /// System entered the suspended state. Joins any in-flight tick
    /// first so no action races the suspend, then collapses the pool to
    /// the primary unit if `single_unit_on_suspend` is set (ignoring
    /// `min_units`).
    pub async fn on_suspend(&self) {
        let mut inner = self.inner.lock().await;
        if inner.suspended {
            return;
        }
        inner.suspended = true;
        Self::stop_task(&mut inner).await;

        if self.params.read().await.single_unit_on_suspend {
            let mut state = self.state.lock().await;
            let offline: Vec<_> = state
                .pool
                .units()
                .iter()
                .filter(|u| u.online && u.id != 0)
                .map(|u| u.id)
                .collect();
            for id in offline {
                match self.driver.take_offline(id) {
                    Ok(()) => {
                        state.pool.mark_online(id, false);
                    }
                    Err(e) => warn!(unit = id, error = %e, "suspend take-offline failed"),
                }
            }
        }
        info!("governor suspended");
    }

    /// System left the suspended state. Restores full capacity if
    /// `single_unit_on_suspend` is set (a direct restore, not a
    /// load-driven ramp), then reschedules the tick if enabled.
    pub async fn on_resume(&self) {
        let mut inner = self.inner.lock().await;
        if !inner.suspended {
            return;
        }
        inner.suspended = false;

        if self.params.read().await.single_unit_on_suspend {
            self.restore_full_capacity().await;
        }

        if inner.enabled && inner.task.is_none() {
            let delay = Duration::from_millis(self.params.read().await.poll_interval_ms);
            self.spawn_task(&mut inner, delay);
        }
        info!("governor resumed");
    }

    /// Stop the tick loop for process teardown: clears the enabled
    /// flag and joins any in-flight tick. The pool is left as-is.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        inner.enabled = false;
        Self::stop_task(&mut inner).await;
        info!("governor shut down");
    }

    fn spawn_task(&self, inner: &mut LifecycleState, first_delay: Duration) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let governor = self.governor.clone();
        let handle = tokio::spawn(async move {
            governor.run(first_delay, shutdown_rx).await;
        });
        inner.task = Some(TickTask {
            handle,
            shutdown_tx,
        });
    }

    async fn stop_task(inner: &mut LifecycleState) {
        if let Some(task) = inner.task.take() {
            let _ = task.shutdown_tx.send(true);
            // Join, never abort: an in-flight tick runs to completion.
            let _ = task.handle.await;
        }
    }

    async fn restore_full_capacity(&self) {
        let mut state = self.state.lock().await;
        let offline: Vec<_> = state
            .pool
            .units()
            .iter()
            .filter(|u| !u.online)
            .map(|u| u.id)
            .collect();
        for id in offline {
            match self.driver.bring_online(id) {
                Ok(()) => {
                    state.pool.mark_online(id, true);
                }
                Err(e) => warn!(unit = id, error = %e, "restore bring-online failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::{Action, RecordingDriver};
    use crate::engine::GovernorState;
    use crate::sampler::LoadAccumulator;
    use corepool_state::{Params, Pool, shared_params};

    struct Fixture {
        coordinator: Coordinator,
        load: Arc<LoadAccumulator>,
        driver: Arc<RecordingDriver>,
        state: SharedGovernorState,
    }

    fn fixture(params: Params, pool: Pool, start_delay: Duration) -> Fixture {
        let params = shared_params(params);
        let load = Arc::new(LoadAccumulator::new());
        let driver = Arc::new(RecordingDriver::new());
        let state = Arc::new(Mutex::new(GovernorState::new(pool)));
        let governor = Arc::new(Governor::new(
            params.clone(),
            state.clone(),
            load.clone(),
            driver.clone(),
        ));
        let coordinator =
            Coordinator::new(governor, params, driver.clone()).with_start_delay(start_delay);
        Fixture {
            coordinator,
            load,
            driver,
            state,
        }
    }

    fn quiet_params(capacity: u32) -> Params {
        // Long poll interval: lifecycle tests drive ticks themselves.
        let mut p = Params::defaults_for(capacity);
        p.poll_interval_ms = 60_000;
        p
    }

    #[test]
    fn default_start_delay_matches_reference_tuning() {
        assert_eq!(DEFAULT_START_DELAY, Duration::from_millis(20_000));
    }

    #[tokio::test]
    async fn enable_is_idempotent() {
        let fx = fixture(
            quiet_params(4),
            Pool::new(4),
            Duration::from_secs(60),
        );
        fx.coordinator.enable().await;
        fx.coordinator.enable().await;
        assert!(fx.coordinator.is_enabled().await);
        assert!(fx.coordinator.is_running().await);

        fx.coordinator.disable().await;
        assert!(!fx.coordinator.is_enabled().await);
        assert!(!fx.coordinator.is_running().await);
    }

    #[tokio::test]
    async fn disable_restores_full_capacity() {
        let fx = fixture(
            quiet_params(4),
            Pool::with_online(4, &[1]),
            Duration::from_secs(60),
        );
        fx.coordinator.enable().await;
        fx.coordinator.disable().await;

        let state = fx.state.lock().await;
        assert_eq!(state.pool.online_count(), 4);
        assert_eq!(
            fx.driver.actions(),
            vec![Action::Online(2), Action::Online(3)]
        );
    }

    #[tokio::test]
    async fn disable_without_enable_still_restores() {
        let fx = fixture(
            quiet_params(3),
            Pool::with_online(3, &[]),
            Duration::from_secs(60),
        );
        fx.coordinator.disable().await;
        assert_eq!(fx.state.lock().await.pool.online_count(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn disable_joins_in_flight_tick() {
        let mut p = quiet_params(4);
        p.poll_interval_ms = 60_000;
        let fx = fixture(p, Pool::with_online(4, &[]), Duration::from_millis(1));
        // The tick's driver action stalls long enough for disable() to
        // land while the tick is in flight.
        *fx.driver.stall.lock().unwrap() = Some(Duration::from_millis(200));
        fx.load.record(90);

        fx.coordinator.enable().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        fx.coordinator.disable().await;

        // The in-flight scale-up completed before disable proceeded,
        // and the restore then brought the rest online.
        let actions = fx.driver.actions();
        assert_eq!(actions[0], Action::Online(1));
        assert_eq!(fx.state.lock().await.pool.online_count(), 4);
    }

    #[tokio::test]
    async fn suspend_resume_round_trip_restores_online_set() {
        let fx = fixture(quiet_params(4), Pool::new(4), Duration::from_secs(60));
        let before: Vec<_> = fx
            .state
            .lock()
            .await
            .pool
            .units()
            .iter()
            .map(|u| u.online)
            .collect();

        fx.coordinator.on_suspend().await;
        assert_eq!(fx.state.lock().await.pool.online_count(), 1);
        assert!(fx.state.lock().await.pool.unit(0).unwrap().online);

        fx.coordinator.on_resume().await;
        let after: Vec<_> = fx
            .state
            .lock()
            .await
            .pool
            .units()
            .iter()
            .map(|u| u.online)
            .collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn suspend_ignores_min_units() {
        let mut p = quiet_params(4);
        p.min_units = 3;
        let fx = fixture(p, Pool::new(4), Duration::from_secs(60));

        fx.coordinator.on_suspend().await;
        assert_eq!(fx.state.lock().await.pool.online_count(), 1);
    }

    #[tokio::test]
    async fn suspend_with_policy_off_leaves_pool_alone() {
        let mut p = quiet_params(4);
        p.single_unit_on_suspend = false;
        let fx = fixture(p, Pool::with_online(4, &[1, 2]), Duration::from_secs(60));

        fx.coordinator.enable().await;
        fx.coordinator.on_suspend().await;

        assert_eq!(fx.state.lock().await.pool.online_count(), 3);
        assert!(fx.driver.actions().is_empty());
        // The tick is still cancelled.
        assert!(!fx.coordinator.is_running().await);
    }

    #[tokio::test]
    async fn suspend_is_reentrant() {
        let fx = fixture(quiet_params(3), Pool::new(3), Duration::from_secs(60));
        fx.coordinator.on_suspend().await;
        let actions_after_first = fx.driver.actions().len();
        fx.coordinator.on_suspend().await;
        assert_eq!(fx.driver.actions().len(), actions_after_first);
    }

    #[tokio::test]
    async fn resume_without_suspend_is_a_no_op() {
        let fx = fixture(quiet_params(3), Pool::with_online(3, &[]), Duration::from_secs(60));
        fx.coordinator.on_resume().await;
        assert!(fx.driver.actions().is_empty());
        assert_eq!(fx.state.lock().await.pool.online_count(), 1);
    }

    #[tokio::test]
    async fn resume_reschedules_only_when_enabled() {
        let fx = fixture(quiet_params(4), Pool::new(4), Duration::from_secs(60));

        fx.coordinator.on_suspend().await;
        fx.coordinator.on_resume().await;
        assert!(!fx.coordinator.is_running().await);

        fx.coordinator.enable().await;
        fx.coordinator.on_suspend().await;
        assert!(!fx.coordinator.is_running().await);
        fx.coordinator.on_resume().await;
        assert!(fx.coordinator.is_running().await);

        fx.coordinator.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_ticking_and_leaves_pool_as_is() {
        let fx = fixture(
            quiet_params(4),
            Pool::with_online(4, &[1]),
            Duration::from_secs(60),
        );
        fx.coordinator.enable().await;
        fx.coordinator.shutdown().await;

        assert!(!fx.coordinator.is_enabled().await);
        assert!(!fx.coordinator.is_running().await);
        // Unlike disable(), shutdown() does not restore capacity.
        assert_eq!(fx.state.lock().await.pool.online_count(), 2);
        assert!(fx.driver.actions().is_empty());
    }

    #[tokio::test]
    async fn enable_while_suspended_defers_scheduling() {
        let fx = fixture(quiet_params(4), Pool::new(4), Duration::from_secs(60));
        fx.coordinator.on_suspend().await;
        fx.coordinator.enable().await;
        assert!(!fx.coordinator.is_running().await);

        fx.coordinator.on_resume().await;
        assert!(fx.coordinator.is_running().await);
        fx.coordinator.shutdown().await;
    }
}
