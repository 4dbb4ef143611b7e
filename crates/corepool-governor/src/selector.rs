//! Unit selection policy.
//!
//! Scale-up picks the lowest-id offline unit, giving deterministic,
//! reproducible bring-up order. Scale-down picks the slowest online
//! non-primary unit by its performance metric (ties by lowest id), so
//! each removal costs the least aggregate throughput; when no online
//! unit carries a metric, the lowest-id non-primary unit is taken.

use corepool_state::{Pool, SelectError, UnitId};

/// The unit to bring online next: lowest-id offline unit.
pub fn next_online_unit(pool: &Pool) -> Result<UnitId, SelectError> {
    pool.units()
        .iter()
        .find(|u| !u.online)
        .map(|u| u.id)
        .ok_or(SelectError::NoCapacity)
}

/// The unit to take offline next: slowest online non-primary unit.
///
/// Refuses when only the primary is online or the pool is already at
/// `min_units` online.
pub fn next_offline_unit(pool: &Pool, min_units: u32) -> Result<UnitId, SelectError> {
    if pool.online_count() <= min_units {
        return Err(SelectError::NoEligibleUnit);
    }

    let candidates = pool.units().iter().filter(|u| u.online && u.id != 0);

    let mut slowest: Option<(UnitId, u64)> = None;
    let mut fallback: Option<UnitId> = None;
    for unit in candidates {
        if fallback.is_none() {
            fallback = Some(unit.id);
        }
        if let Some(rate) = unit.perf
            && slowest.is_none_or(|(_, slow)| rate < slow)
        {
            slowest = Some((unit.id, rate));
        }
    }

    slowest
        .map(|(id, _)| id)
        .or(fallback)
        .ok_or(SelectError::NoEligibleUnit)
}
