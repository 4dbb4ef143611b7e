//! Load sampling — read-and-clear accumulator fed by an external observer.

use std::sync::atomic::{AtomicU64, Ordering};

use corepool_state::SampleError;

/// Source of the per-tick load statistic.
///
/// `sample_and_reset` returns the load accumulated since the previous
/// call and clears the accumulator. An error means no reading could be
/// produced this tick; the engine treats that as load 0 and proceeds.
pub trait LoadSource: Send + Sync {
    fn sample_and_reset(&self) -> Result<u64, SampleError>;
}

/// Lock-free accumulator: the observer collaborator calls [`record`]
/// continuously, the engine drains it once per tick. The statistic is
/// the mean of the recorded samples; 0 when nothing was recorded.
///
/// The sum and count are cleared with two separate atomic swaps, so a
/// sample landing between them slides into the next window. The reader
/// runs once per tick and tolerates that.
///
/// [`record`]: LoadAccumulator::record
#[derive(Debug, Default)]
pub struct LoadAccumulator {
    sum: AtomicU64,
    count: AtomicU64,
}

impl LoadAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one load observation.
    pub fn record(&self, sample: u64) {
        self.sum.fetch_add(sample, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

impl LoadSource for LoadAccumulator {
    fn sample_and_reset(&self) -> Result<u64, SampleError> {
        let count = self.count.swap(0, Ordering::Relaxed);
        let sum = self.sum.swap(0, Ordering::Relaxed);
        if count == 0 {
            Ok(0)
        } else {
            Ok(sum / count)
        }
    }
}
