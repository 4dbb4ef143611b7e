//! corepool-governor — the adaptive core-pool control loop.
//!
//! A periodic tick reads the accumulated load since the previous tick,
//! compares it against up/down thresholds, and — after the configured
//! number of consecutive qualifying ticks — brings one unit online or
//! takes one offline, within the `[min_units, max_units]` bounds.
//!
//! # Decision tick
//!
//! ```text
//! load   = sampler.sample_and_reset()          (error -> 0, logged)
//! online = pool online count
//!
//! if online < max_units and load >= load_threshold_up:
//!     cycles += 1
//!     if cycles >= cycles_up:   bring lowest-id offline unit online
//! else if online > min_units and load <= load_threshold_down:
//!     cycles += 1
//!     if cycles >= cycles_down: take slowest non-primary unit offline
//! // otherwise the counter neither increments nor resets
//! ```
//!
//! The hysteresis counter is shared between both directions and clears
//! only when an action actually succeeds, so a qualifying streak in one
//! direction banks toward the other. That asymmetry is deliberate and
//! load-bearing for tuning; do not "fix" it.
//!
//! Lifecycle (enable/disable) and system suspend/resume are handled by
//! [`Coordinator`], which owns the tick task and serializes control
//! calls against in-flight ticks (cancel-and-join, never abort).

pub mod driver;
pub mod engine;
pub mod lifecycle;
pub mod power;
pub mod sampler;
pub mod selector;

pub use driver::UnitDriver;
pub use engine::{Governor, GovernorState, SharedGovernorState};
pub use lifecycle::Coordinator;
pub use power::{PowerEvent, PowerEventBus, PowerEventSubscription};
pub use sampler::{LoadAccumulator, LoadSource};
