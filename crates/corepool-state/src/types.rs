//! Domain types for the unit pool.
//!
//! The pool is a fixed set of homogeneous compute units created at
//! startup; units are never added or removed, only their `online` flag
//! toggles. Unit 0 is the primary and can never be taken offline.

use serde::{Deserialize, Serialize};

/// Stable identifier of a pool unit. Unit 0 is the primary.
pub type UnitId = u32;

/// One compute unit in the pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    pub online: bool,
    /// Current performance metric (e.g. operating rate in kHz).
    /// Used only for down-selection; `None` when no reading exists.
    pub perf: Option<u64>,
    /// Diagnostic counter: number of online/offline transitions.
    pub times_toggled: u64,
}

/// The fixed set of units managed by the governor.
#[derive(Debug, Clone)]
pub struct Pool {
    units: Vec<Unit>,
}

/// Read-only view of the pool for the API surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub capacity: u32,
    pub online: u32,
    pub units: Vec<Unit>,
}

impl Pool {
    /// Create a pool of `capacity` units, all online (the state a
    /// freshly booted system presents).
    pub fn new(capacity: u32) -> Self {
        assert!(capacity >= 1, "pool needs at least the primary unit");
        let units = (0..capacity)
            .map(|id| Unit {
                id,
                online: true,
                perf: None,
                times_toggled: 0,
            })
            .collect();
        Self { units }
    }

    /// Create a pool with an explicit initial online set. Unit 0 is
    /// forced online.
    pub fn with_online(capacity: u32, online: &[UnitId]) -> Self {
        let mut pool = Self::new(capacity);
        for unit in pool.units.iter_mut() {
            unit.online = unit.id == 0 || online.contains(&unit.id);
        }
        pool
    }

    pub fn capacity(&self) -> u32 {
        self.units.len() as u32
    }

    pub fn online_count(&self) -> u32 {
        self.units.iter().filter(|u| u.online).count() as u32
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id as usize)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Record a unit transition. Returns `false` without touching the
    /// pool when the id is unknown, the unit is already in the target
    /// state, or the caller tries to take the primary offline.
    pub fn mark_online(&mut self, id: UnitId, online: bool) -> bool {
        if id == 0 && !online {
            return false;
        }
        match self.units.get_mut(id as usize) {
            Some(unit) if unit.online != online => {
                unit.online = online;
                unit.times_toggled += 1;
                true
            }
            _ => false,
        }
    }

    /// Update a unit's performance metric.
    pub fn set_perf(&mut self, id: UnitId, perf: u64) {
        if let Some(unit) = self.units.get_mut(id as usize) {
            unit.perf = Some(perf);
        }
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            capacity: self.capacity(),
            online: self.online_count(),
            units: self.units.clone(),
        }
    }

    /// Per-unit toggle counters, compiled in with the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn times_toggled(&self) -> Vec<(UnitId, u64)> {
        self.units.iter().map(|u| (u.id, u.times_toggled)).collect()
    }
}
