//! Tunable parameters shared between the governor and the API surface.
//!
//! Writes are last-writer-wins with no cross-field transaction: the
//! next tick simply observes whatever values are current. No relation
//! between the fields is enforced — in particular
//! `load_threshold_down >= load_threshold_up` is accepted and makes
//! the dead band vanish (the up branch wins while capacity remains).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// The governor's tunable parameter set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Params {
    /// Tick period in milliseconds.
    pub poll_interval_ms: u64,
    /// Lower bound on online units during normal operation.
    pub min_units: u32,
    /// Upper bound on online units.
    pub max_units: u32,
    /// Load at or above which a tick qualifies for scale-up.
    pub load_threshold_up: u64,
    /// Load at or below which a tick qualifies for scale-down.
    pub load_threshold_down: u64,
    /// Consecutive qualifying ticks required before bringing a unit online.
    pub cycles_up: u32,
    /// Consecutive qualifying ticks required before taking a unit offline.
    pub cycles_down: u32,
    /// Collapse the pool to the primary unit on system suspend.
    pub single_unit_on_suspend: bool,
}

impl Params {
    /// Default tuning for a pool of `capacity` units.
    pub fn defaults_for(capacity: u32) -> Self {
        Self {
            poll_interval_ms: 100,
            min_units: 1,
            max_units: capacity,
            load_threshold_up: 25,
            load_threshold_down: 5,
            cycles_up: 1,
            cycles_down: 5,
            single_unit_on_suspend: true,
        }
    }
}

/// Shared handle to the parameter set. Reads are taken per tick;
/// writes apply immediately.
pub type SharedParams = Arc<RwLock<Params>>;

pub fn shared_params(params: Params) -> SharedParams {
    Arc::new(RwLock::new(params))
}
