//! Power-state event wiring.
//!
//! The platform's suspend/resume notifications arrive on a broadcast
//! bus; the coordinator subscribes at startup and the subscription
//! guard joins the listener task on detach, so deregistration is
//! guaranteed at teardown.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::lifecycle::Coordinator;

/// A system power-state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    Suspend,
    Resume,
}

/// Broadcast bus for power-state transitions. Cloneable; every
/// subscriber sees every event emitted after it subscribed.
#[derive(Clone)]
pub struct PowerEventBus {
    tx: broadcast::Sender<PowerEvent>,
}

impl PowerEventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn emit(&self, event: PowerEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PowerEvent> {
        self.tx.subscribe()
    }
}

impl Default for PowerEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for a coordinator's registration on the bus. Dropping it
/// without [`detach`] aborts the listener; `detach` joins it cleanly.
///
/// [`detach`]: PowerEventSubscription::detach
pub struct PowerEventSubscription {
    handle: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl PowerEventSubscription {
    /// Stop listening and wait for the listener task to finish.
    pub async fn detach(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for PowerEventSubscription {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Coordinator {
    /// Register this coordinator for suspend/resume events. Events are
    /// applied in arrival order; the returned guard deregisters.
    pub fn attach_power_events(
        self: &Arc<Self>,
        bus: &PowerEventBus,
    ) -> PowerEventSubscription {
        let mut rx = bus.subscribe();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let coordinator = self.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Ok(PowerEvent::Suspend) => coordinator.on_suspend().await,
                        Ok(PowerEvent::Resume) => coordinator.on_resume().await,
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            debug!(missed, "power event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = shutdown_rx.changed() => break,
                }
            }
            debug!("power event listener stopped");
        });

        PowerEventSubscription {
            handle: Some(handle),
            shutdown_tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::RecordingDriver;
    use crate::engine::{Governor, GovernorState};
    use crate::sampler::LoadAccumulator;
    use corepool_state::{Params, Pool, shared_params};
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn coordinator(capacity: u32) -> Arc<Coordinator> {
        let params = shared_params(Params::defaults_for(capacity));
        let driver = Arc::new(RecordingDriver::new());
        let state = Arc::new(Mutex::new(GovernorState::new(Pool::new(capacity))));
        let governor = Arc::new(Governor::new(
            params.clone(),
            state,
            Arc::new(LoadAccumulator::new()),
            driver.clone(),
        ));
        Arc::new(Coordinator::new(governor, params, driver))
    }

    async fn settle(coordinator: &Coordinator, suspended: bool) {
        for _ in 0..100 {
            if coordinator.is_suspended().await == suspended {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("coordinator never reached suspended={suspended}");
    }

    #[tokio::test]
    async fn bus_events_drive_the_coordinator() {
        let coordinator = coordinator(4);
        let bus = PowerEventBus::new();
        let subscription = coordinator.attach_power_events(&bus);

        bus.emit(PowerEvent::Suspend);
        settle(&coordinator, true).await;

        bus.emit(PowerEvent::Resume);
        settle(&coordinator, false).await;

        subscription.detach().await;
    }

    #[tokio::test]
    async fn detached_subscription_ignores_events() {
        let coordinator = coordinator(4);
        let bus = PowerEventBus::new();
        let subscription = coordinator.attach_power_events(&bus);
        subscription.detach().await;

        bus.emit(PowerEvent::Suspend);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!coordinator.is_suspended().await);
    }

    #[tokio::test]
    async fn dropped_subscription_stops_the_listener() {
        let coordinator = coordinator(4);
        let bus = PowerEventBus::new();
        drop(coordinator.attach_power_events(&bus));

        // The listener is gone; events no longer reach the coordinator.
        tokio::time::sleep(Duration::from_millis(20)).await;
        bus.emit(PowerEvent::Suspend);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!coordinator.is_suspended().await);
    }

    #[tokio::test]
    async fn events_before_subscribe_are_not_seen() {
        let coordinator = coordinator(4);
        let bus = PowerEventBus::new();
        bus.emit(PowerEvent::Suspend);

        let subscription = coordinator.attach_power_events(&bus);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!coordinator.is_suspended().await);
        subscription.detach().await;
    }
}
