pub mod clock;
pub mod config;
pub mod liveness;
pub mod schedule;
pub mod sensor;
pub mod topics;
pub mod types;

pub use clock::{SyncedClock, WallTime};
pub use config::{NetworkConfig, SchedulePolicy, TimingConfig};
pub use liveness::LivenessPolicy;
pub use schedule::ScheduleAction;
pub use sensor::{Debouncer, SensorEvent};
pub use topics::*;
pub use types::DoorState;
