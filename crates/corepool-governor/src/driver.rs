//! The power-unit collaborator seam.
//!
//! The governor decides *which* unit changes state; a [`UnitDriver`]
//! performs the actual transition and reports success or failure
//! synchronously. Driver failures are retried on the next qualifying
//! tick and must stay distinguishable from selection-policy outcomes.

use corepool_state::{DriverError, UnitId};

/// Performs unit state transitions on behalf of the governor.
///
/// Actions are synchronous and expected to be fast; the tick holds the
/// pool lock across the call.
pub trait UnitDriver: Send + Sync {
    fn bring_online(&self, id: UnitId) -> Result<(), DriverError>;

    fn take_offline(&self, id: UnitId) -> Result<(), DriverError>;

    /// Current operating rate of a unit, if the platform exposes one.
    /// Feeds the per-unit performance metric used for down-selection.
    fn current_rate(&self, id: UnitId) -> Option<u64> {
        let _ = id;
        None
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory driver double shared by the engine and lifecycle tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Action {
        Online(UnitId),
        Offline(UnitId),
    }

    /// Records every action; can be told to fail, or to stall so tests
    /// can overlap a control call with an in-flight tick.
    #[derive(Default)]
    pub struct RecordingDriver {
        pub actions: Mutex<Vec<Action>>,
        pub fail: AtomicBool,
        pub stall: Mutex<Option<Duration>>,
    }

    impl RecordingDriver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn actions(&self) -> Vec<Action> {
            self.actions.lock().unwrap().clone()
        }

        pub fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn act(&self, action: Action) -> Result<(), DriverError> {
            if let Some(pause) = *self.stall.lock().unwrap() {
                std::thread::sleep(pause);
            }
            if self.fail.load(Ordering::SeqCst) {
                let unit = match action {
                    Action::Online(id) | Action::Offline(id) => id,
                };
                return Err(DriverError::ActionFailed {
                    unit,
                    reason: "injected failure".to_string(),
                });
            }
            self.actions.lock().unwrap().push(action);
            Ok(())
        }
    }

    impl UnitDriver for RecordingDriver {
        fn bring_online(&self, id: UnitId) -> Result<(), DriverError> {
            self.act(Action::Online(id))
        }

        fn take_offline(&self, id: UnitId) -> Result<(), DriverError> {
            self.act(Action::Offline(id))
        }
    }
}
