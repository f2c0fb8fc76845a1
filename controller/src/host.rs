use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use gate_common::{
    Debouncer, DoorState, LivenessPolicy, NetworkConfig, SchedulePolicy, SyncedClock, TimingConfig,
    WallTime,
};

use crate::actuator::GateActuator;
use crate::cloud::{spawn_cloud_loop, CloudPublisher, DoorReporter};
use crate::hardware::{
    DoorSensor, ProcessRestarter, Relay, Restarter, SimDoorSensor, SimRelay, SimStatusLed,
    StatusLed,
};
use crate::network::{spawn_network_loop, NetworkLink, TcpProbeLink};
use crate::state::DeviceState;
use crate::store::PolicyStore;
use crate::timesync::{spawn_time_sync_loop, DEFAULT_NTP_SERVER};

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = PolicyStore::new();
    let mut policy = store.load_policy().await.unwrap_or_else(|err| {
        warn!("failed to load schedule policy, using defaults: {err:#}");
        SchedulePolicy::default()
    });
    let loaded = policy.clone();
    policy.sanitize();
    if policy != loaded {
        // Write the corrected values back so the file matches what runs.
        if let Err(err) = store.save_policy(&policy).await {
            warn!("failed to persist sanitized schedule policy: {err:#}");
        }
    }

    let network = network_config_from_env();
    let timing = TimingConfig::default();

    info!(
        "config loaded: ssid=`{}`, cloud=`{}:{}`, open={:02}:{:02}, close={:02}:{:02}, pulse={}s, offset={}, schedule={}",
        network.wifi_ssid,
        network.cloud_host,
        network.cloud_port,
        policy.open_time.0,
        policy.open_time.1,
        policy.close_time.0,
        policy.close_time.1,
        policy.relay_duration,
        policy.melbourne_offset,
        policy.schedule_enabled,
    );

    let device = Arc::new(DeviceState::new());
    let clock = Arc::new(SyncedClock::new());

    let relay: Arc<dyn Relay> = Arc::new(SimRelay::new());
    let sensor: Arc<dyn DoorSensor> = Arc::new(SimDoorSensor::new());
    let led: Arc<dyn StatusLed> = Arc::new(SimStatusLed::new());
    let restarter: Arc<dyn Restarter> = Arc::new(ProcessRestarter);

    let publisher = CloudPublisher::new();
    let actuator = GateActuator::new(
        relay,
        device.clone(),
        publisher.clone(),
        policy.relay_duration,
    );

    // Eager first probe so the cloud loop can usually start right away.
    let link = TcpProbeLink::new(&network.cloud_host, network.cloud_port);
    if link.is_connected().await {
        info!("network reachable at startup");
        device.set_network_connected(true);
    } else {
        warn!("network not reachable at startup");
    }

    spawn_network_loop(device.clone(), link, timing.clone());
    spawn_cloud_loop(
        device.clone(),
        publisher.clone(),
        actuator.clone(),
        network,
        timing.clone(),
    );
    spawn_time_sync_loop(
        device.clone(),
        clock.clone(),
        ntp_server_from_env(),
        timing.clone(),
    );
    spawn_watchdog_loop(device.clone(), restarter, timing.clone());
    spawn_schedule_loop(
        device.clone(),
        clock,
        actuator,
        policy,
        timing.clone(),
    );
    spawn_sensor_loop(
        device.clone(),
        sensor,
        DoorReporter::new(publisher),
        timing.clone(),
    );
    spawn_heartbeat_loop(device, led, timing);

    tokio::signal::ctrl_c().await?;
    info!("stopped");
    Ok(())
}

fn network_config_from_env() -> NetworkConfig {
    let mut network = NetworkConfig::default();
    if let Ok(ssid) = std::env::var("WIFI_SSID") {
        network.wifi_ssid = ssid;
    }
    if let Ok(pass) = std::env::var("WIFI_PASS") {
        network.wifi_pass = pass;
    }
    if let Ok(host) = std::env::var("CLOUD_HOST") {
        network.cloud_host = host;
    }
    network.cloud_port = std::env::var("CLOUD_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(network.cloud_port);
    if let Ok(token) = std::env::var("CLOUD_AUTH_TOKEN") {
        network.auth_token = token;
    }
    network
}

fn ntp_server_from_env() -> String {
    std::env::var("NTP_SERVER").unwrap_or_else(|_| DEFAULT_NTP_SERVER.to_string())
}

fn spawn_schedule_loop<W: WallTime>(
    device: Arc<DeviceState>,
    clock: Arc<W>,
    actuator: GateActuator,
    policy: SchedulePolicy,
    timing: TimingConfig,
) {
    tokio::spawn(run_schedule_loop(device, clock, actuator, policy, timing));
}

// Awaits the pulse, then holds off for a minute so the same boundary cannot
// re-fire.
async fn run_schedule_loop<W: WallTime>(
    device: Arc<DeviceState>,
    clock: Arc<W>,
    actuator: GateActuator,
    policy: SchedulePolicy,
    timing: TimingConfig,
) {
    loop {
        tokio::time::sleep(Duration::from_millis(timing.schedule_tick_ms)).await;
        if !policy.schedule_enabled {
            continue;
        }

        let (hour, minute) = clock.time_of_day(policy.melbourne_offset);
        let Some(action) = policy.due_action(hour, minute, device.sensor_open()) else {
            continue;
        };

        info!("scheduled {}", action.as_str());
        actuator.trigger().await;
        tokio::time::sleep(Duration::from_millis(timing.schedule_refire_holdoff_ms)).await;
    }
}

fn spawn_sensor_loop(
    device: Arc<DeviceState>,
    sensor: Arc<dyn DoorSensor>,
    reporter: DoorReporter,
    timing: TimingConfig,
) {
    tokio::spawn(run_sensor_loop(device, sensor, reporter, timing));
}

async fn run_sensor_loop(
    device: Arc<DeviceState>,
    sensor: Arc<dyn DoorSensor>,
    mut reporter: DoorReporter,
    timing: TimingConfig,
) {
    let mut debouncer = Debouncer::new(timing.debounce_window_ms);
    let mut interval = tokio::time::interval(Duration::from_millis(timing.sensor_poll_ms));

    loop {
        interval.tick().await;
        let raw = sensor.is_open();
        if let Some(event) = debouncer.update(raw, device.now_ms()) {
            device.set_sensor_open(event.open);
            info!("door {}", DoorState::from_open(event.open).as_str());
            reporter.report(event.open).await;
        }
    }
}

fn spawn_watchdog_loop(
    device: Arc<DeviceState>,
    restarter: Arc<dyn Restarter>,
    timing: TimingConfig,
) {
    tokio::spawn(run_watchdog_loop(device, restarter, timing));
}

// Last resort: wedged native network state only clears with a full restart.
async fn run_watchdog_loop(
    device: Arc<DeviceState>,
    restarter: Arc<dyn Restarter>,
    timing: TimingConfig,
) {
    let liveness = LivenessPolicy::new(timing.cloud_offline_timeout_ms);
    let mut interval =
        tokio::time::interval(Duration::from_millis(timing.watchdog_check_interval_ms));

    loop {
        interval.tick().await;
        if liveness.is_stale(device.last_cloud_contact_ms(), device.now_ms()) {
            error!(
                "cloud unreachable for over {}s (network={}, session={}), restarting device",
                timing.cloud_offline_timeout_ms / 1_000,
                device.network_connected(),
                device.session_present(),
            );
            restarter.restart();
        }
    }
}

fn spawn_heartbeat_loop(device: Arc<DeviceState>, led: Arc<dyn StatusLed>, timing: TimingConfig) {
    tokio::spawn(run_heartbeat_loop(device, led, timing));
}

async fn run_heartbeat_loop(
    device: Arc<DeviceState>,
    led: Arc<dyn StatusLed>,
    timing: TimingConfig,
) {
    loop {
        if device.actuator_active() {
            led.set_lit(true);
            tokio::time::sleep(Duration::from_millis(timing.led_active_blink_ms)).await;
        } else {
            led.set_lit(true);
            tokio::time::sleep(Duration::from_millis(timing.led_idle_blink_ms)).await;
            led.set_lit(false);
            tokio::time::sleep(Duration::from_millis(timing.led_idle_blink_ms)).await;
        }
    }
}
