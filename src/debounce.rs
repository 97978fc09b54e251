use std::time::{Duration, Instant};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Last-write-wins timer. Every `schedule` supersedes whatever was pending,
/// and only the generation that actually fired is accepted afterwards.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    generation: u64,
    fired: Option<u64>,
    pending: Option<Scheduled<T>>,
}

#[derive(Debug)]
struct Scheduled<T> {
    generation: u64,
    due: Instant,
    value: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub generation: u64,
    pub value: T,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            fired: None,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending value and restarts the quiet period.
    pub fn schedule(&mut self, value: T, now: Instant) -> u64 {
        self.generation += 1;
        self.fired = None;
        self.pending = Some(Scheduled {
            generation: self.generation,
            due: now + self.delay,
            value,
        });
        self.generation
    }

    /// Drops the pending value and invalidates the last fired generation.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.fired = None;
        self.pending = None;
    }

    /// Fires `value` right away, superseding anything pending.
    pub fn trigger(&mut self, value: T) -> Fired<T> {
        self.generation += 1;
        self.pending = None;
        self.fired = Some(self.generation);
        Fired {
            generation: self.generation,
            value,
        }
    }

    pub fn poll(&mut self, now: Instant) -> Option<Fired<T>> {
        let due = self.pending.as_ref()?.due;
        if now < due {
            return None;
        }
        let scheduled = self.pending.take()?;
        self.fired = Some(scheduled.generation);
        Some(Fired {
            generation: scheduled.generation,
            value: scheduled.value,
        })
    }

    /// True only for the most recent generation, and only once it fired.
    pub fn accepts(&self, generation: u64) -> bool {
        self.fired == Some(generation) && generation == self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|scheduled| scheduled.due.saturating_duration_since(now))
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rapid_changes_fire_once_with_last_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.schedule("a", start);
        assert!(debouncer.poll(start + Duration::from_millis(100)).is_none());
        debouncer.schedule("ab", start + Duration::from_millis(150));
        assert!(debouncer.poll(start + Duration::from_millis(300)).is_none());
        let last = debouncer.schedule("abc", start + Duration::from_millis(400));

        assert!(debouncer.poll(start + Duration::from_millis(899)).is_none());
        let fired = debouncer.poll(start + Duration::from_millis(900)).unwrap();
        assert_eq!(fired.value, "abc");
        assert_eq!(fired.generation, last);
        assert!(debouncer.poll(start + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn only_fired_generation_is_accepted() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let first = debouncer.schedule(1, start);
        assert!(!debouncer.accepts(first));
        debouncer.poll(start + Duration::from_millis(10)).unwrap();
        assert!(debouncer.accepts(first));

        let second = debouncer.schedule(2, start + Duration::from_millis(20));
        assert!(!debouncer.accepts(first));
        assert!(!debouncer.accepts(second));
    }

    #[test]
    fn cancel_discards_pending_and_in_flight() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let fired = debouncer.schedule("x", start);
        debouncer.poll(start + Duration::from_millis(10)).unwrap();
        debouncer.schedule("y", start + Duration::from_millis(11));
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert!(!debouncer.accepts(fired));
        assert!(debouncer.poll(start + Duration::from_secs(1)).is_none());
        assert_eq!(debouncer.time_until_due(start), None);
    }

    #[test]
    fn trigger_supersedes_pending() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let scheduled = debouncer.schedule("old", start);
        let fired = debouncer.trigger("now");
        assert!(debouncer.accepts(fired.generation));
        assert!(!debouncer.accepts(scheduled));
        assert!(debouncer.poll(start + Duration::from_secs(1)).is_none());
    }
}
