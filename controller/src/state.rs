use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use tokio::time::Instant;

const SENSOR_UNKNOWN: u8 = 0;
const SENSOR_CLOSED: u8 = 1;
const SENSOR_OPEN: u8 = 2;

// Process-wide device state behind one owning object. Each field has exactly
// one writer loop; everything else only reads. Milliseconds are measured from
// this object's creation at boot.
#[derive(Debug)]
pub struct DeviceState {
    epoch: Instant,
    actuator_active: AtomicBool,
    sensor_open: AtomicU8,
    network_connected: AtomicBool,
    cloud_session_present: AtomicBool,
    last_cloud_contact_ms: AtomicU64,
}

impl DeviceState {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            actuator_active: AtomicBool::new(false),
            sensor_open: AtomicU8::new(SENSOR_UNKNOWN),
            network_connected: AtomicBool::new(false),
            cloud_session_present: AtomicBool::new(false),
            last_cloud_contact_ms: AtomicU64::new(0),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.epoch
            .elapsed()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX)
    }

    // Wins the pulse slot, or reports an already-running pulse.
    pub fn try_begin_pulse(&self) -> bool {
        self.actuator_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn end_pulse(&self) {
        self.actuator_active.store(false, Ordering::Release);
    }

    pub fn actuator_active(&self) -> bool {
        self.actuator_active.load(Ordering::Acquire)
    }

    pub fn set_sensor_open(&self, open: bool) {
        let value = if open { SENSOR_OPEN } else { SENSOR_CLOSED };
        self.sensor_open.store(value, Ordering::Relaxed);
    }

    pub fn sensor_open(&self) -> Option<bool> {
        match self.sensor_open.load(Ordering::Relaxed) {
            SENSOR_CLOSED => Some(false),
            SENSOR_OPEN => Some(true),
            _ => None,
        }
    }

    pub fn set_network_connected(&self, connected: bool) {
        self.network_connected.store(connected, Ordering::Relaxed);
    }

    pub fn network_connected(&self) -> bool {
        self.network_connected.load(Ordering::Relaxed)
    }

    pub fn set_session_present(&self, present: bool) {
        self.cloud_session_present.store(present, Ordering::Relaxed);
    }

    pub fn session_present(&self) -> bool {
        self.cloud_session_present.load(Ordering::Relaxed)
    }

    pub fn touch_cloud_contact(&self) {
        self.last_cloud_contact_ms
            .store(self.now_ms(), Ordering::Relaxed);
    }

    pub fn last_cloud_contact_ms(&self) -> u64 {
        self.last_cloud_contact_ms.load(Ordering::Relaxed)
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}
