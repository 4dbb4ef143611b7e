//! Platform bindings: sysfs CPU hotplug driver and the loadavg feeder.
//!
//! The driver toggles `<root>/cpu{N}/online` the way the kernel's
//! hotplug interface expects; cpu0 carries no `online` file and is
//! accepted as always online. The root path is injectable so tests run
//! against a scratch directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use corepool_governor::{LoadAccumulator, UnitDriver};
use corepool_state::{DriverError, UnitId};

/// Default sysfs location of the CPU devices.
pub const DEFAULT_CPU_ROOT: &str = "/sys/devices/system/cpu";

/// Default load signal source.
pub const DEFAULT_LOADAVG_PATH: &str = "/proc/loadavg";

/// CPU hotplug driver backed by the sysfs online files.
pub struct SysfsUnitDriver {
    root: PathBuf,
}

impl SysfsUnitDriver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Count the `cpu{N}` device directories under the root.
    pub fn detect_units(&self) -> anyhow::Result<u32> {
        let mut count = 0u32;
        while self.root.join(format!("cpu{count}")).is_dir() {
            count += 1;
        }
        anyhow::ensure!(count > 0, "no cpu devices under {}", self.root.display());
        Ok(count)
    }

    fn online_path(&self, id: UnitId) -> PathBuf {
        self.root.join(format!("cpu{id}/online"))
    }

    fn write_online(&self, id: UnitId, online: bool) -> Result<(), DriverError> {
        let path = self.online_path(id);
        if !path.exists() {
            return Err(DriverError::UnknownUnit(id));
        }
        std::fs::write(&path, if online { "1" } else { "0" }).map_err(|e| {
            DriverError::ActionFailed {
                unit: id,
                reason: e.to_string(),
            }
        })
    }
}

impl UnitDriver for SysfsUnitDriver {
    fn bring_online(&self, id: UnitId) -> Result<(), DriverError> {
        if id == 0 {
            // The boot CPU has no online file; it is always online.
            return Ok(());
        }
        self.write_online(id, true)
    }

    fn take_offline(&self, id: UnitId) -> Result<(), DriverError> {
        if id == 0 {
            return Err(DriverError::ActionFailed {
                unit: 0,
                reason: "primary unit cannot go offline".to_string(),
            });
        }
        self.write_online(id, false)
    }

    fn current_rate(&self, id: UnitId) -> Option<u64> {
        let path = self.root.join(format!("cpu{id}/cpufreq/scaling_cur_freq"));
        let raw = std::fs::read_to_string(path).ok()?;
        raw.trim().parse().ok()
    }
}

/// Parse the 1-minute average from a loadavg-format file, scaled by
/// 100 to an integer (`0.42 ...` -> 42).
pub fn read_loadavg(path: &Path) -> Option<u64> {
    let raw = std::fs::read_to_string(path).ok()?;
    let first = raw.split_whitespace().next()?;
    let value: f64 = first.parse().ok()?;
    Some((value * 100.0) as u64)
}

/// The observer collaborator: samples the load file periodically into
/// the governor's accumulator until shutdown.
pub async fn run_loadavg_feeder(
    path: PathBuf,
    accumulator: Arc<LoadAccumulator>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(path = %path.display(), "loadavg feeder started");
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                match read_loadavg(&path) {
                    Some(value) => accumulator.record(value),
                    None => warn!(path = %path.display(), "could not read load average"),
                }
            }
            _ = shutdown.changed() => {
                debug!("loadavg feeder stopped");
                break;
            }
        }
    }
}
