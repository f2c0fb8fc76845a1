use crate::config::SchedulePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    Open,
    Close,
}

impl ScheduleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

impl SchedulePolicy {
    // Minute-resolution match against the configured open/close times. The
    // door state gates firing: a door that is already where the schedule
    // wants it produces no action, and an unknown door state (no debounced
    // reading yet) never actuates.
    pub fn due_action(&self, hour: u8, minute: u8, door_open: Option<bool>) -> Option<ScheduleAction> {
        if !self.schedule_enabled {
            return None;
        }

        let now = (hour, minute);
        match door_open {
            Some(false) if now == self.open_time => Some(ScheduleAction::Open),
            Some(true) if now == self.close_time => Some(ScheduleAction::Close),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SchedulePolicy {
        SchedulePolicy::default()
    }

    #[test]
    fn fires_open_at_exact_boundary_when_closed() {
        let action = policy().due_action(8, 0, Some(false));
        assert_eq!(action, Some(ScheduleAction::Open));
    }

    #[test]
    fn no_open_when_door_already_open() {
        assert_eq!(policy().due_action(8, 0, Some(true)), None);
    }

    #[test]
    fn fires_close_when_open() {
        assert_eq!(policy().due_action(18, 0, Some(true)), Some(ScheduleAction::Close));
    }

    #[test]
    fn no_close_when_door_already_closed() {
        assert_eq!(policy().due_action(18, 0, Some(false)), None);
    }

    #[test]
    fn off_boundary_minutes_never_fire() {
        let policy = policy();
        assert_eq!(policy.due_action(8, 1, Some(false)), None);
        assert_eq!(policy.due_action(7, 59, Some(false)), None);
        assert_eq!(policy.due_action(17, 59, Some(true)), None);
    }

    #[test]
    fn disabled_schedule_idles() {
        let mut policy = policy();
        policy.schedule_enabled = false;

        assert_eq!(policy.due_action(8, 0, Some(false)), None);
        assert_eq!(policy.due_action(18, 0, Some(true)), None);
    }

    #[test]
    fn unknown_door_state_never_fires() {
        assert_eq!(policy().due_action(8, 0, None), None);
        assert_eq!(policy().due_action(18, 0, None), None);
    }

    #[test]
    fn equal_open_and_close_times_prefer_open() {
        let mut policy = policy();
        policy.close_time = policy.open_time;

        assert_eq!(policy.due_action(8, 0, Some(false)), Some(ScheduleAction::Open));
        assert_eq!(policy.due_action(8, 0, Some(true)), Some(ScheduleAction::Close));
    }
}
