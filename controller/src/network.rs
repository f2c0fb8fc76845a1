use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use gate_common::TimingConfig;

use crate::state::DeviceState;

// Link-layer seam: the host probes TCP reachability of the cloud endpoint;
// an embedded port drives the wireless stack behind the same two calls.
pub trait NetworkLink: Send + Sync + 'static {
    fn connect(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
    fn is_connected(&self) -> impl Future<Output = bool> + Send;
}

pub struct TcpProbeLink {
    target: String,
    timeout: Duration,
}

impl TcpProbeLink {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            target: format!("{host}:{port}"),
            timeout: Duration::from_secs(3),
        }
    }

    async fn probe(&self) -> anyhow::Result<()> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.target))
            .await
            .with_context(|| format!("probe of {} timed out", self.target))?
            .with_context(|| format!("failed to reach {}", self.target))?;
        drop(stream);
        Ok(())
    }
}

impl NetworkLink for TcpProbeLink {
    async fn connect(&self) -> anyhow::Result<()> {
        self.probe().await
    }

    async fn is_connected(&self) -> bool {
        self.probe().await.is_ok()
    }
}

pub fn spawn_network_loop<L: NetworkLink>(device: Arc<DeviceState>, link: L, timing: TimingConfig) {
    tokio::spawn(run_network_loop(device, link, timing));
}

// Keep trying forever. Connect failures are swallowed; the connected flag in
// DeviceState is this loop's only output.
pub async fn run_network_loop<L: NetworkLink>(device: Arc<DeviceState>, link: L, timing: TimingConfig) {
    loop {
        if link.is_connected().await {
            if !device.network_connected() {
                info!("network connected");
                device.set_network_connected(true);
            }
        } else {
            if device.network_connected() {
                warn!("network connection lost");
                device.set_network_connected(false);
            }

            if let Err(err) = link.connect().await {
                debug!("network connect attempt failed: {err:#}");
            }
            for _ in 0..timing.network_connect_attempts {
                if link.is_connected().await {
                    info!("network connected");
                    device.set_network_connected(true);
                    break;
                }
                tokio::time::sleep(Duration::from_millis(timing.network_connect_poll_ms)).await;
            }
        }

        tokio::time::sleep(Duration::from_millis(timing.network_retry_interval_ms)).await;
    }
}
