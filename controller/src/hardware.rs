use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error};

// Exit code watched for by the supervising init system; anything else is a
// normal stop.
pub const RESTART_EXIT_CODE: i32 = 10;

// Hardware seam. The host build drives simulated pins; an embedded port
// implements these against real GPIO and the SoC reset line.
pub trait Relay: Send + Sync {
    fn set_energized(&self, on: bool);
}

pub trait DoorSensor: Send + Sync {
    // Raw, undebounced level. true = open.
    fn is_open(&self) -> bool;
}

pub trait StatusLed: Send + Sync {
    fn set_lit(&self, on: bool);
}

pub trait Restarter: Send + Sync {
    fn restart(&self);
}

#[derive(Debug, Default)]
pub struct SimRelay {
    energized: AtomicBool,
}

impl SimRelay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Relay for SimRelay {
    fn set_energized(&self, on: bool) {
        let previous = self.energized.swap(on, Ordering::Relaxed);
        if previous != on {
            debug!("relay {}", if on { "energized" } else { "released" });
        }
    }
}

#[derive(Debug, Default)]
pub struct SimDoorSensor {
    open: AtomicBool,
}

impl SimDoorSensor {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::Relaxed);
    }
}

impl DoorSensor for SimDoorSensor {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct SimStatusLed {
    lit: AtomicBool,
}

impl SimStatusLed {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_lit(&self) -> bool {
        self.lit.load(Ordering::Relaxed)
    }
}

impl StatusLed for SimStatusLed {
    fn set_lit(&self, on: bool) {
        self.lit.store(on, Ordering::Relaxed);
    }
}

pub struct ProcessRestarter;

impl Restarter for ProcessRestarter {
    fn restart(&self) {
        error!("full device restart requested");
        std::process::exit(RESTART_EXIT_CODE);
    }
}
