use serde::{Deserialize, Serialize};

fn default_open_time() -> (u8, u8) {
    (8, 0)
}

fn default_close_time() -> (u8, u8) {
    (18, 0)
}

fn default_relay_duration() -> u64 {
    1
}

fn default_enabled() -> bool {
    true
}

// On-disk shape of gate_schedule.json; every key defaults independently so a
// partially written file still loads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulePolicy {
    #[serde(default = "default_open_time")]
    pub open_time: (u8, u8),
    #[serde(default = "default_close_time")]
    pub close_time: (u8, u8),
    #[serde(default = "default_relay_duration")]
    pub relay_duration: u64,
    #[serde(default = "default_enabled")]
    pub melbourne_offset: bool,
    #[serde(default = "default_enabled")]
    pub schedule_enabled: bool,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            open_time: default_open_time(),
            close_time: default_close_time(),
            relay_duration: default_relay_duration(),
            melbourne_offset: default_enabled(),
            schedule_enabled: default_enabled(),
        }
    }
}

impl SchedulePolicy {
    pub fn sanitize(&mut self) {
        self.open_time = clamp_time(self.open_time);
        self.close_time = clamp_time(self.close_time);
        if self.relay_duration == 0 {
            self.relay_duration = default_relay_duration();
        }
    }
}

fn clamp_time((hour, minute): (u8, u8)) -> (u8, u8) {
    (hour.min(23), minute.min(59))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub sensor_poll_ms: u64,
    pub debounce_window_ms: u64,
    pub schedule_tick_ms: u64,
    pub schedule_refire_holdoff_ms: u64,
    pub ntp_resync_interval_ms: u64,
    pub network_retry_interval_ms: u64,
    pub network_connect_poll_ms: u64,
    pub network_connect_attempts: u32,
    pub cloud_retry_interval_ms: u64,
    pub watchdog_check_interval_ms: u64,
    pub cloud_offline_timeout_ms: u64,
    pub led_active_blink_ms: u64,
    pub led_idle_blink_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sensor_poll_ms: 50,
            debounce_window_ms: 250,
            schedule_tick_ms: 1_000,
            schedule_refire_holdoff_ms: 60_000,
            ntp_resync_interval_ms: 3_600_000,
            network_retry_interval_ms: 5_000,
            network_connect_poll_ms: 1_000,
            network_connect_attempts: 15,
            cloud_retry_interval_ms: 5_000,
            watchdog_check_interval_ms: 10_000,
            cloud_offline_timeout_ms: 300_000,
            led_active_blink_ms: 100,
            led_idle_blink_ms: 150,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub cloud_host: String,
    pub cloud_port: u16,
    pub auth_token: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_pass: String::new(),
            cloud_host: "127.0.0.1".to_string(),
            cloud_port: 1883,
            auth_token: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_keys_default_individually() {
        let policy: SchedulePolicy = serde_json::from_str(r#"{"open_time": [9, 30]}"#).unwrap();

        assert_eq!(policy.open_time, (9, 30));
        assert_eq!(policy.close_time, (18, 0));
        assert_eq!(policy.relay_duration, 1);
        assert!(policy.melbourne_offset);
        assert!(policy.schedule_enabled);
    }

    #[test]
    fn empty_object_yields_defaults() {
        let policy: SchedulePolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, SchedulePolicy::default());
    }

    #[test]
    fn serializes_times_as_arrays() {
        let json = serde_json::to_value(SchedulePolicy::default()).unwrap();

        assert_eq!(json["open_time"], serde_json::json!([8, 0]));
        assert_eq!(json["close_time"], serde_json::json!([18, 0]));
        assert_eq!(json["relay_duration"], serde_json::json!(1));
    }

    #[test]
    fn round_trip_preserves_all_fields() {
        let policy = SchedulePolicy {
            open_time: (6, 45),
            close_time: (21, 15),
            relay_duration: 3,
            melbourne_offset: false,
            schedule_enabled: false,
        };

        let json = serde_json::to_string(&policy).unwrap();
        let restored: SchedulePolicy = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, policy);
    }

    #[test]
    fn sanitize_clamps_invalid_values() {
        let mut policy = SchedulePolicy {
            open_time: (99, 75),
            close_time: (24, 60),
            relay_duration: 0,
            melbourne_offset: true,
            schedule_enabled: true,
        };

        policy.sanitize();

        assert_eq!(policy.open_time, (23, 59));
        assert_eq!(policy.close_time, (23, 59));
        assert_eq!(policy.relay_duration, 1);
    }
}
