use std::time::{Duration, Instant};

pub const DEFAULT_MIN_DISPLAY: Duration = Duration::from_millis(1200);

const CEILING: f64 = 95.0;
const TAU_SECS: f64 = 2.0;

/// Simulated progress for an operation of unknown length. The bar creeps
/// towards `CEILING` while waiting and only reaches 100 once the real work
/// settled and `min_display` has passed.
#[derive(Debug, Clone, Copy)]
pub struct ProgressGate {
    started: Instant,
    min_display: Duration,
    settled_at: Option<Instant>,
}

impl ProgressGate {
    pub fn start(now: Instant, min_display: Duration) -> Self {
        Self {
            started: now,
            min_display,
            settled_at: None,
        }
    }

    pub fn settle(&mut self, now: Instant) {
        if self.settled_at.is_none() {
            self.settled_at = Some(now);
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        self.is_settled() && now.saturating_duration_since(self.started) >= self.min_display
    }

    /// Time left before a settled gate may complete.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if !self.is_settled() {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.started);
        Some(self.min_display.saturating_sub(elapsed))
    }

    pub fn percent(&self, now: Instant) -> f64 {
        if self.is_complete(now) {
            return 100.0;
        }
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        let creeping = CEILING * (1.0 - (-elapsed / TAU_SECS).exp());
        if !self.is_settled() {
            return creeping;
        }
        let min = self.min_display.as_secs_f64();
        let linear = if min > 0.0 { 100.0 * elapsed / min } else { 100.0 };
        creeping.max(linear).min(99.0)
    }
}

/// A request whose outcome is held back until its progress gate completes.
#[derive(Debug)]
pub struct Gated<T> {
    request_id: u64,
    gate: ProgressGate,
    outcome: Option<T>,
}

impl<T> Gated<T> {
    pub fn new(request_id: u64, now: Instant, min_display: Duration) -> Self {
        Self {
            request_id,
            gate: ProgressGate::start(now, min_display),
            outcome: None,
        }
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Records the outcome if it belongs to this request.
    pub fn accept(&mut self, request_id: u64, outcome: T, now: Instant) -> bool {
        if request_id != self.request_id || self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(outcome);
        self.gate.settle(now);
        true
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        self.gate.is_complete(now)
    }

    pub fn take_if_ready(&mut self, now: Instant) -> Option<T> {
        if self.is_ready(now) {
            self.outcome.take()
        } else {
            None
        }
    }

    pub fn percent(&self, now: Instant) -> f64 {
        self.gate.percent(now)
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.gate.remaining(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_completes_while_unsettled() {
        let start = Instant::now();
        let gate = ProgressGate::start(start, Duration::from_millis(100));
        let late = start + Duration::from_secs(600);
        assert!(!gate.is_complete(late));
        assert!(gate.percent(late) < 100.0);
        assert!(gate.percent(start + Duration::from_secs(1)) < gate.percent(late));
    }

    #[test]
    fn fast_result_waits_for_min_display() {
        let start = Instant::now();
        let mut gate = ProgressGate::start(start, Duration::from_millis(1200));
        gate.settle(start + Duration::from_millis(50));
        assert!(!gate.is_complete(start + Duration::from_millis(600)));
        assert!(gate.percent(start + Duration::from_millis(600)) < 100.0);
        assert_eq!(
            gate.remaining(start + Duration::from_millis(600)),
            Some(Duration::from_millis(600))
        );
        assert!(gate.is_complete(start + Duration::from_millis(1200)));
        assert_eq!(gate.percent(start + Duration::from_millis(1200)), 100.0);
    }

    #[test]
    fn slow_result_completes_on_arrival() {
        let start = Instant::now();
        let mut gate = ProgressGate::start(start, Duration::from_millis(1200));
        let arrival = start + Duration::from_secs(4);
        assert!(!gate.is_complete(arrival));
        gate.settle(arrival);
        assert!(gate.is_complete(arrival));
    }

    #[test]
    fn gated_ignores_foreign_request_ids() {
        let start = Instant::now();
        let mut gated: Gated<&str> = Gated::new(7, start, Duration::from_millis(10));
        assert!(!gated.accept(6, "stale", start));
        assert!(gated.accept(7, "fresh", start));
        assert!(!gated.accept(7, "again", start));
        assert_eq!(gated.take_if_ready(start), None);
        assert_eq!(gated.take_if_ready(start + Duration::from_millis(10)), Some("fresh"));
    }
}
