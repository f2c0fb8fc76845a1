use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use tokio::sync::Mutex;
use tracing::{info, warn};

use gate_common::{
    DoorState, NetworkConfig, TimingConfig, TOPIC_CMD_TRIGGER, TOPIC_DOOR_EVENT, TOPIC_DOOR_STATE,
    TOPIC_RELAY_STATE,
};

use crate::actuator::GateActuator;
use crate::state::DeviceState;

// Publish side of the live session. Empty while no session exists; publishes
// into the void are dropped, matching the device's fire-and-forget telemetry.
#[derive(Clone, Default)]
pub struct CloudPublisher {
    client: Arc<Mutex<Option<AsyncClient>>>,
}

impl CloudPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    async fn attach(&self, client: AsyncClient) {
        *self.client.lock().await = Some(client);
    }

    async fn detach(&self) {
        *self.client.lock().await = None;
    }

    pub async fn publish_relay(&self, active: bool) {
        let signal = if active { "1" } else { "0" };
        self.publish(TOPIC_RELAY_STATE, QoS::AtLeastOnce, true, signal)
            .await;
    }

    pub async fn publish_door(&self, state: DoorState) {
        self.publish(TOPIC_DOOR_STATE, QoS::AtLeastOnce, true, state.as_signal())
            .await;
        self.publish(TOPIC_DOOR_EVENT, QoS::AtMostOnce, false, state.event_name())
            .await;
    }

    async fn publish(&self, topic: &str, qos: QoS, retain: bool, payload: &str) {
        let client = self.client.lock().await;
        if let Some(client) = client.as_ref() {
            if let Err(err) = client.publish(topic, qos, retain, payload).await {
                warn!("cloud publish on {topic} failed: {err}");
            }
        }
    }
}

// Door telemetry is change-only: repeating the same debounced state never
// republishes, even across a session recreation.
pub struct DoorReporter {
    publisher: CloudPublisher,
    last_sent: Option<bool>,
}

impl DoorReporter {
    pub fn new(publisher: CloudPublisher) -> Self {
        Self {
            publisher,
            last_sent: None,
        }
    }

    fn accepts(&mut self, open: bool) -> bool {
        if self.last_sent == Some(open) {
            return false;
        }
        self.last_sent = Some(open);
        true
    }

    pub async fn report(&mut self, open: bool) {
        if !self.accepts(open) {
            return;
        }
        self.publisher.publish_door(DoorState::from_open(open)).await;
    }
}

fn create_session(network: &NetworkConfig) -> (AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(
        "gate-controller",
        network.cloud_host.clone(),
        network.cloud_port,
    );
    options.set_keep_alive(Duration::from_secs(30));
    if !network.auth_token.is_empty() {
        options.set_credentials("gate-controller", network.auth_token.clone());
    }
    AsyncClient::new(options, 64)
}

pub fn spawn_cloud_loop(
    device: Arc<DeviceState>,
    publisher: CloudPublisher,
    actuator: GateActuator,
    network: NetworkConfig,
    timing: TimingConfig,
) {
    tokio::spawn(run_cloud_loop(device, publisher, actuator, network, timing));
}

// Owns the entire session lifecycle, so at most one session can ever exist.
// A pump error drops the session outright and the outer loop recreates it.
async fn run_cloud_loop(
    device: Arc<DeviceState>,
    publisher: CloudPublisher,
    actuator: GateActuator,
    network: NetworkConfig,
    timing: TimingConfig,
) {
    let retry = Duration::from_millis(timing.cloud_retry_interval_ms);

    loop {
        if !device.network_connected() {
            tokio::time::sleep(retry).await;
            continue;
        }

        let (client, mut eventloop) = create_session(&network);
        if let Err(err) = client.subscribe(TOPIC_CMD_TRIGGER, QoS::AtMostOnce).await {
            warn!("cloud command subscribe failed: {err}");
            tokio::time::sleep(retry).await;
            continue;
        }

        publisher.attach(client).await;
        device.set_session_present(true);
        info!("cloud session created");

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("cloud connected");
                    device.touch_cloud_contact();
                }
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    device.touch_cloud_contact();
                    if message.topic == TOPIC_CMD_TRIGGER {
                        info!("remote trigger command received");
                        let actuator = actuator.clone();
                        tokio::spawn(async move { actuator.trigger().await });
                    }
                }
                Ok(_) => {
                    device.touch_cloud_contact();
                }
                Err(err) => {
                    warn!("cloud session lost, dropping for recreation: {err}");
                    break;
                }
            }
        }

        publisher.detach().await;
        device.set_session_present(false);
        tokio::time::sleep(retry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporter_skips_repeated_states() {
        let mut reporter = DoorReporter::new(CloudPublisher::new());

        assert!(reporter.accepts(true));
        assert!(!reporter.accepts(true));
        assert!(reporter.accepts(false));
        assert!(!reporter.accepts(false));
        assert!(reporter.accepts(true));
    }

    #[test]
    fn reporter_sends_first_observation() {
        let mut open_first = DoorReporter::new(CloudPublisher::new());
        let mut closed_first = DoorReporter::new(CloudPublisher::new());

        assert!(open_first.accepts(true));
        assert!(closed_first.accepts(false));
    }
}
