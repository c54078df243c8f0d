/// Rate limiter for the reconciler's polling cycle.
///
/// Opens when strictly more than `interval_millis` has passed since it last opened; the first
/// opening is measured from boot (time zero).
#[derive(Debug, Clone, Copy)]
pub struct PollGate {
    interval_millis: u64,
    last_open_millis: u64,
}

/// The polling cadence of the clock.
pub const POLL_INTERVAL_MILLIS: u64 = 1_000;

impl PollGate {
    #[must_use]
    pub const fn new(interval_millis: u64) -> Self {
        Self {
            interval_millis,
            last_open_millis: 0,
        }
    }

    /// Whether the gate opens at `now_millis`. Opening restarts the interval.
    pub const fn try_open(&mut self, now_millis: u64) -> bool {
        if now_millis.saturating_sub(self.last_open_millis) > self.interval_millis {
            self.last_open_millis = now_millis;
            true
        } else {
            false
        }
    }
}

impl Default for PollGate {
    fn default() -> Self {
        Self::new(POLL_INTERVAL_MILLIS)
    }
}

#[cfg(test)]
mod tests {
    use super::PollGate;

    #[test]
    fn opens_strictly_after_interval() {
        let mut gate = PollGate::new(1_000);
        assert!(!gate.try_open(500));
        assert!(!gate.try_open(1_000));
        assert!(gate.try_open(1_001));
        assert!(!gate.try_open(1_900));
        assert!(!gate.try_open(2_001));
        assert!(gate.try_open(2_002));
    }
}
