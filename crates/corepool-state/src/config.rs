//! corepool.toml configuration parser.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::params::Params;

/// File configuration for the daemon. Every field is optional; CLI
/// flags and built-in defaults fill the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorepoolConfig {
    pub pool: Option<PoolConfig>,
    pub governor: Option<GovernorConfig>,
    pub api: Option<ApiConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of units under management.
    pub units: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernorConfig {
    pub poll_interval_ms: Option<u64>,
    pub min_units: Option<u32>,
    pub max_units: Option<u32>,
    pub load_threshold_up: Option<u64>,
    pub load_threshold_down: Option<u64>,
    pub cycles_up: Option<u32>,
    pub cycles_down: Option<u32>,
    pub single_unit_on_suspend: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: Option<u16>,
}

impl CorepoolConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CorepoolConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply the `[governor]` section on top of defaults for `capacity`.
    pub fn params_for(&self, capacity: u32) -> Params {
        let mut params = Params::defaults_for(capacity);
        if let Some(g) = &self.governor {
            if let Some(v) = g.poll_interval_ms {
                params.poll_interval_ms = v;
            }
            if let Some(v) = g.min_units {
                params.min_units = v;
            }
            if let Some(v) = g.max_units {
                params.max_units = v;
            }
            if let Some(v) = g.load_threshold_up {
                params.load_threshold_up = v;
            }
            if let Some(v) = g.load_threshold_down {
                params.load_threshold_down = v;
            }
            if let Some(v) = g.cycles_up {
                params.cycles_up = v;
            }
            if let Some(v) = g.cycles_down {
                params.cycles_down = v;
            }
            if let Some(v) = g.single_unit_on_suspend {
                params.single_unit_on_suspend = v;
            }
        }
        params
    }
}
