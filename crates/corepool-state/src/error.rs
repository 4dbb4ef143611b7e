//! Error taxonomy for the core-pool governor.
//!
//! Policy-level selection failures (`SelectError`) are expected and
//! non-fatal: the tick skips its action and retries on the next
//! qualifying cycle. They must stay distinguishable from a failure
//! reported by the unit driver (`DriverError`).

use thiserror::Error;

/// Unit selection failures. These are policy outcomes, not faults.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    /// Every unit in the pool is already online.
    #[error("no offline unit available: pool at capacity")]
    NoCapacity,

    /// No online unit may be taken offline (only the primary remains,
    /// or the pool is already at its configured minimum).
    #[error("no eligible unit to take offline")]
    NoEligibleUnit,
}

/// Failures reported by the external power-unit collaborator.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver refused or failed to toggle the unit.
    #[error("unit {unit} action failed: {reason}")]
    ActionFailed { unit: u32, reason: String },

    /// The driver does not know the unit id.
    #[error("unknown unit: {0}")]
    UnknownUnit(u32),
}

/// The load sampler could not produce a reading this tick.
#[derive(Debug, Error)]
#[error("load sample unavailable: {0}")]
pub struct SampleError(pub String);
