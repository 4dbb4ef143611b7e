//! The decision engine — one periodic, atomic scaling decision per tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use corepool_state::{Pool, SharedParams};

use crate::driver::UnitDriver;
use crate::sampler::LoadSource;
use crate::selector;

/// State mutated only inside the locked tick (and by the lifecycle
/// coordinator while no tick is running).
#[derive(Debug)]
pub struct GovernorState {
    pub pool: Pool,
    /// Consecutive qualifying ticks since the last action. Shared
    /// between the up and down directions; cleared only by an action.
    pub cycles: u32,
}

impl GovernorState {
    pub fn new(pool: Pool) -> Self {
        Self { pool, cycles: 0 }
    }
}

pub type SharedGovernorState = Arc<Mutex<GovernorState>>;

/// The periodic control loop. Each tick drains the load accumulator,
/// applies hysteresis, and moves at most one unit.
pub struct Governor {
    params: SharedParams,
    state: SharedGovernorState,
    load: Arc<dyn LoadSource>,
    driver: Arc<dyn UnitDriver>,
}

impl Governor {
    pub fn new(
        params: SharedParams,
        state: SharedGovernorState,
        load: Arc<dyn LoadSource>,
        driver: Arc<dyn UnitDriver>,
    ) -> Self {
        Self {
            params,
            state,
            load,
            driver,
        }
    }

    pub fn state(&self) -> SharedGovernorState {
        self.state.clone()
    }

    /// One complete decision. Holds the state lock from the online
    /// count read through the pool mutation, so control calls never
    /// observe a half-applied decision.
    pub async fn tick(&self) {
        let params = self.params.read().await.clone();

        let load = match self.load.sample_and_reset() {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "load sample unavailable, treating as idle");
                0
            }
        };

        let mut state = self.state.lock().await;
        let online = state.pool.online_count();

        if online < params.max_units && load >= params.load_threshold_up {
            state.cycles = state.cycles.saturating_add(1);
            if state.cycles >= params.cycles_up {
                match selector::next_online_unit(&state.pool) {
                    Ok(id) => match self.driver.bring_online(id) {
                        Ok(()) => {
                            state.pool.mark_online(id, true);
                            state.cycles = 0;
                            info!(unit = id, load, online = online + 1, "unit brought online");
                        }
                        // Counter stays as computed: the same action is
                        // retried on the next qualifying tick.
                        Err(e) => warn!(unit = id, error = %e, "bring-online failed"),
                    },
                    Err(e) => debug!(load, %e, "scale-up skipped"),
                }
            }
        } else if online > params.min_units && load <= params.load_threshold_down {
            state.cycles = state.cycles.saturating_add(1);
            if state.cycles >= params.cycles_down {
                self.refresh_perf(&mut state.pool);
                match selector::next_offline_unit(&state.pool, params.min_units) {
                    Ok(id) => match self.driver.take_offline(id) {
                        Ok(()) => {
                            state.pool.mark_online(id, false);
                            state.cycles = 0;
                            info!(unit = id, load, online = online - 1, "unit taken offline");
                        }
                        Err(e) => warn!(unit = id, error = %e, "take-offline failed"),
                    },
                    Err(e) => debug!(load, %e, "scale-down skipped"),
                }
            }
        }
        // Dead band or saturated bounds: the counter neither increments
        // nor resets.
    }

    /// Pull fresh operating rates for the online units before a
    /// down-selection.
    fn refresh_perf(&self, pool: &mut Pool) {
        let ids: Vec<_> = pool
            .units()
            .iter()
            .filter(|u| u.online)
            .map(|u| u.id)
            .collect();
        for id in ids {
            if let Some(rate) = self.driver.current_rate(id) {
                pool.set_perf(id, rate);
            }
        }
    }

    /// Run the tick loop. The first tick fires after `start_delay`;
    /// thereafter one tick per `poll_interval_ms`. Shutdown is only
    /// observed between ticks, so an in-flight tick always completes
    /// before `run` returns.
    pub async fn run(&self, start_delay: Duration, mut shutdown: watch::Receiver<bool>) {
        debug!(delay_ms = start_delay.as_millis() as u64, "tick loop starting");
        let mut next_delay = start_delay;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(next_delay) => {
                    self.tick().await;
                    next_delay =
                        Duration::from_millis(self.params.read().await.poll_interval_ms);
                }
                _ = shutdown.changed() => {
                    debug!("tick loop stopping");
                    break;
                }
            }
        }
    }
}
