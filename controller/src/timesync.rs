use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{info, warn};

use gate_common::{SyncedClock, TimingConfig};

use crate::state::DeviceState;

pub const DEFAULT_NTP_SERVER: &str = "pool.ntp.org:123";

const NTP_PACKET_LEN: usize = 48;
// Seconds between the NTP era origin (1900) and the unix epoch.
const NTP_UNIX_OFFSET_SECS: i64 = 2_208_988_800;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SntpError {
    #[error("short response: {0} bytes")]
    ShortResponse(usize),
    #[error("server returned a zero transmit timestamp")]
    ZeroTimestamp,
    #[error("transmit timestamp out of range")]
    OutOfRange,
}

fn client_request() -> [u8; NTP_PACKET_LEN] {
    let mut packet = [0u8; NTP_PACKET_LEN];
    // LI = 0, version = 3, mode = 3 (client).
    packet[0] = 0x1B;
    packet
}

fn transmit_timestamp(packet: &[u8]) -> Result<DateTime<Utc>, SntpError> {
    if packet.len() < NTP_PACKET_LEN {
        return Err(SntpError::ShortResponse(packet.len()));
    }

    let mut secs = [0u8; 4];
    let mut frac = [0u8; 4];
    secs.copy_from_slice(&packet[40..44]);
    frac.copy_from_slice(&packet[44..48]);
    let secs = u32::from_be_bytes(secs);
    let frac = u32::from_be_bytes(frac);

    if secs == 0 {
        return Err(SntpError::ZeroTimestamp);
    }

    let unix_secs = i64::from(secs) - NTP_UNIX_OFFSET_SECS;
    if unix_secs < 0 {
        return Err(SntpError::OutOfRange);
    }

    let nanos = ((u64::from(frac) * 1_000_000_000) >> 32) as u32;
    Utc.timestamp_opt(unix_secs, nanos)
        .single()
        .ok_or(SntpError::OutOfRange)
}

pub async fn fetch_network_time(server: &str) -> anyhow::Result<DateTime<Utc>> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .context("failed to bind sntp socket")?;
    socket
        .connect(server)
        .await
        .with_context(|| format!("failed to reach time server {server}"))?;
    socket
        .send(&client_request())
        .await
        .context("sntp request send failed")?;

    let mut response = [0u8; NTP_PACKET_LEN];
    let len = tokio::time::timeout(Duration::from_secs(5), socket.recv(&mut response))
        .await
        .context("sntp response timed out")?
        .context("sntp response receive failed")?;

    Ok(transmit_timestamp(&response[..len])?)
}

pub fn spawn_time_sync_loop(
    device: Arc<DeviceState>,
    clock: Arc<SyncedClock>,
    server: String,
    timing: TimingConfig,
) {
    tokio::spawn(run_time_sync_loop(device, clock, server, timing));
}

// First sync waits for the network and is allowed to fail; the device keeps
// running on the system clock. Resyncs retry on the next interval, never
// escalate.
async fn run_time_sync_loop(
    device: Arc<DeviceState>,
    clock: Arc<SyncedClock>,
    server: String,
    timing: TimingConfig,
) {
    while !device.network_connected() {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    match fetch_network_time(&server).await {
        Ok(now) => {
            clock.apply_sync(now);
            info!("initial time sync done");
        }
        Err(err) => warn!("initial time sync failed: {err:#}"),
    }

    loop {
        tokio::time::sleep(Duration::from_millis(timing.ntp_resync_interval_ms)).await;
        if !device.network_connected() {
            continue;
        }
        match fetch_network_time(&server).await {
            Ok(now) => {
                clock.apply_sync(now);
                info!("time resync done");
            }
            Err(err) => warn!("time resync failed: {err:#}"),
        }
    }
}
