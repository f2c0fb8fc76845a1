#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorEvent {
    pub open: bool,
    pub observed_at_ms: u64,
}

// Debounce is time-since-last-accepted-change, not consecutive-stable-reads:
// a change is accepted only once the window has elapsed since the previous
// accepted change.
#[derive(Debug)]
pub struct Debouncer {
    window_ms: u64,
    last_state: Option<bool>,
    last_change_ms: u64,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_state: None,
            last_change_ms: 0,
        }
    }

    pub fn last_state(&self) -> Option<bool> {
        self.last_state
    }

    pub fn update(&mut self, raw_open: bool, now_ms: u64) -> Option<SensorEvent> {
        if self.last_state == Some(raw_open) {
            return None;
        }
        if now_ms.saturating_sub(self.last_change_ms) <= self.window_ms {
            return None;
        }

        self.last_state = Some(raw_open);
        self.last_change_ms = now_ms;
        Some(SensorEvent {
            open: raw_open,
            observed_at_ms: now_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reading_emits_after_window() {
        let mut debouncer = Debouncer::new(250);

        assert_eq!(debouncer.update(false, 50), None);
        assert_eq!(
            debouncer.update(false, 300),
            Some(SensorEvent {
                open: false,
                observed_at_ms: 300
            })
        );
    }

    #[test]
    fn steady_state_emits_nothing() {
        let mut debouncer = Debouncer::new(250);
        debouncer.update(false, 300);

        for now in (350..2_000).step_by(50) {
            assert_eq!(debouncer.update(false, now), None);
        }
    }

    #[test]
    fn bounce_within_window_emits_at_most_one_event() {
        let mut debouncer = Debouncer::new(250);
        debouncer.update(false, 300);

        // false -> true -> false inside one window after the accepted change.
        let first = debouncer.update(true, 350);
        let second = debouncer.update(false, 400);

        assert_eq!(first, None);
        assert_eq!(second, None);
        assert_eq!(debouncer.last_state(), Some(false));
    }

    #[test]
    fn transitions_spaced_beyond_window_each_emit() {
        let mut debouncer = Debouncer::new(250);
        debouncer.update(false, 300);

        let opened = debouncer.update(true, 600).unwrap();
        let closed = debouncer.update(false, 900).unwrap();

        assert!(opened.open);
        assert!(!closed.open);
        assert_eq!(opened.observed_at_ms, 600);
        assert_eq!(closed.observed_at_ms, 900);
    }

    #[test]
    fn events_always_alternate() {
        let mut debouncer = Debouncer::new(250);
        let raw = [false, true, true, false, false, true, false, true, true];

        let mut now = 300;
        let mut emitted = Vec::new();
        for state in raw {
            if let Some(event) = debouncer.update(state, now) {
                emitted.push(event.open);
            }
            now += 300;
        }

        for pair in emitted.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }
}
