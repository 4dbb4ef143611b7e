//! corepool-state — domain state for the core-pool governor.
//!
//! Holds the fixed unit pool, the tunable parameter set shared between
//! the governor and the configuration surface, the TOML file config,
//! and the error taxonomy used across the workspace.

pub mod config;
pub mod error;
pub mod params;
pub mod types;

pub use config::CorepoolConfig;
pub use error::{DriverError, SampleError, SelectError};
pub use params::{Params, SharedParams, shared_params};
pub use types::{Pool, PoolSnapshot, Unit, UnitId};
