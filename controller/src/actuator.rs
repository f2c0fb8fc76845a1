use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cloud::CloudPublisher;
use crate::hardware::Relay;
use crate::state::DeviceState;

#[derive(Clone)]
pub struct GateActuator {
    relay: Arc<dyn Relay>,
    device: Arc<DeviceState>,
    publisher: CloudPublisher,
    pulse: Duration,
}

impl GateActuator {
    pub fn new(
        relay: Arc<dyn Relay>,
        device: Arc<DeviceState>,
        publisher: CloudPublisher,
        pulse_secs: u64,
    ) -> Self {
        Self {
            relay,
            device,
            publisher,
            pulse: Duration::from_secs(pulse_secs),
        }
    }

    // One full pulse, or a logged no-op when a pulse is already in flight.
    // The pulse always runs to completion even when spawned fire-and-forget.
    pub async fn trigger(&self) {
        if !self.device.try_begin_pulse() {
            debug!("trigger requested but relay already active");
            return;
        }

        self.relay.set_energized(true);
        self.publisher.publish_relay(true).await;

        tokio::time::sleep(self.pulse).await;

        self.relay.set_energized(false);
        self.device.end_pulse();
        self.publisher.publish_relay(false).await;
        info!("gate toggled");
    }
}
