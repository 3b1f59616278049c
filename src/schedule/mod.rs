//! Explicit timers driven by host-supplied timestamps.
//!
//! The list never reads a clock. Every host event carries `now` in
//! milliseconds and [`crate::orchestrator::RecyclerListView::advance`] polls
//! these objects to find out what is due. Each timer is a small state
//! machine, so tests can step time deterministically.
//!
//! - [`Debouncer`]: trailing-edge debounce; rescheduling pushes the deadline out
//! - [`Throttler`]: leading + trailing throttle; the latest sample wins
//! - [`IntervalTimer`]: fixed-period polling

/// Milliseconds on the host's monotonic clock.
pub type Millis = u64;

/// Lifecycle of a one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    /// Nothing scheduled.
    #[default]
    Idle,
    /// Scheduled to fire at `deadline`.
    Pending {
        /// Time at which the timer becomes due.
        deadline: Millis,
    },
    /// Fired and not rescheduled since.
    Fired,
}

/// Trailing-edge debouncer.
///
/// # Examples
///
/// ```
/// use recyclist::schedule::Debouncer;
///
/// let mut refix = Debouncer::new(1500);
/// refix.schedule(0);
/// refix.schedule(1000); // pushes the deadline to 2500
/// assert!(!refix.poll(2000));
/// assert!(refix.poll(2500));
/// assert!(!refix.poll(4000)); // fires once
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    delay: Millis,
    state: TimerState,
}

impl Debouncer {
    /// Create an idle debouncer with the given delay.
    pub fn new(delay: Millis) -> Self {
        Self {
            delay,
            state: TimerState::Idle,
        }
    }

    /// Configured delay.
    pub fn delay(&self) -> Millis {
        self.delay
    }

    /// Current state.
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// (Re)schedule to fire `delay` after `now`.
    pub fn schedule(&mut self, now: Millis) {
        self.state = TimerState::Pending {
            deadline: now.saturating_add(self.delay),
        };
    }

    /// Schedule only if nothing is pending; an existing deadline is kept.
    pub fn schedule_if_idle(&mut self, now: Millis) {
        if !self.is_pending() {
            self.schedule(now);
        }
    }

    /// Drop a pending invocation.
    pub fn cancel(&mut self) {
        self.state = TimerState::Idle;
    }

    /// Fire a pending invocation immediately. Returns whether one was pending.
    pub fn flush(&mut self) -> bool {
        if self.is_pending() {
            self.state = TimerState::Fired;
            true
        } else {
            false
        }
    }

    /// Returns true exactly once when the deadline has passed.
    pub fn poll(&mut self, now: Millis) -> bool {
        match self.state {
            TimerState::Pending { deadline } if now >= deadline => {
                self.state = TimerState::Fired;
                true
            }
            _ => false,
        }
    }

    /// True while an invocation is scheduled.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, TimerState::Pending { .. })
    }

    /// Deadline of the pending invocation, if any.
    pub fn deadline(&self) -> Option<Millis> {
        match self.state {
            TimerState::Pending { deadline } => Some(deadline),
            _ => None,
        }
    }
}

/// Leading + trailing throttle carrying the latest sample.
///
/// The first sample after a quiet period runs immediately. Samples arriving
/// inside the interval replace each other; the last one runs when the
/// interval elapses.
#[derive(Debug, Clone, PartialEq)]
pub struct Throttler<T> {
    interval: Millis,
    last_run: Option<Millis>,
    pending: Option<T>,
}

impl<T> Throttler<T> {
    /// Create a throttler with the given interval.
    pub fn new(interval: Millis) -> Self {
        Self {
            interval,
            last_run: None,
            pending: None,
        }
    }

    /// Offer a sample. Returns it back when it may run now.
    pub fn try_run(&mut self, sample: T, now: Millis) -> Option<T> {
        match self.last_run {
            Some(last) if now < last.saturating_add(self.interval) => {
                self.pending = Some(sample);
                None
            }
            _ => {
                self.last_run = Some(now);
                self.pending = None;
                Some(sample)
            }
        }
    }

    /// Trailing sample, once the interval since the last run has elapsed.
    pub fn poll(&mut self, now: Millis) -> Option<T> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.last_run = Some(now);
        self.pending.take()
    }

    /// Time at which the trailing sample becomes due.
    pub fn deadline(&self) -> Option<Millis> {
        match (&self.pending, self.last_run) {
            (Some(_), Some(last)) => Some(last.saturating_add(self.interval)),
            (Some(_), None) => Some(0),
            _ => None,
        }
    }

    /// Drop the trailing sample and forget the last run.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.last_run = None;
    }

    /// True when a trailing sample is waiting.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Fixed-period timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTimer {
    period: Millis,
    next: Option<Millis>,
}

impl IntervalTimer {
    /// Create a stopped timer.
    pub fn new(period: Millis) -> Self {
        Self { period, next: None }
    }

    /// Start (or restart) ticking from `now`.
    pub fn start(&mut self, now: Millis) {
        self.next = Some(now.saturating_add(self.period));
    }

    /// Stop ticking.
    pub fn stop(&mut self) {
        self.next = None;
    }

    /// True while started.
    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// Time of the next tick while running.
    pub fn next_tick(&self) -> Option<Millis> {
        self.next
    }

    /// Returns true when a tick is due and schedules the next one.
    pub fn poll(&mut self, now: Millis) -> bool {
        match self.next {
            Some(next) if now >= next => {
                self.next = Some(now.saturating_add(self.period));
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod debouncer {
        use super::*;

        #[test]
        fn idle_debouncer_never_fires() {
            let mut d = Debouncer::new(100);
            assert!(!d.poll(1_000));
            assert_eq!(d.state(), TimerState::Idle);
        }

        #[test]
        fn reschedule_pushes_deadline_out() {
            let mut d = Debouncer::new(100);
            d.schedule(0);
            d.schedule(50);
            assert_eq!(d.deadline(), Some(150));
            assert!(!d.poll(120));
            assert!(d.poll(150));
            assert_eq!(d.state(), TimerState::Fired);
        }

        #[test]
        fn schedule_if_idle_keeps_existing_deadline() {
            let mut d = Debouncer::new(100);
            d.schedule(0);
            d.schedule_if_idle(90);
            assert_eq!(d.deadline(), Some(100));
        }

        #[test]
        fn flush_fires_only_pending() {
            let mut d = Debouncer::new(100);
            assert!(!d.flush());
            d.schedule(0);
            assert!(d.flush());
            assert!(!d.poll(500));
        }

        #[test]
        fn cancel_drops_pending() {
            let mut d = Debouncer::new(100);
            d.schedule(0);
            d.cancel();
            assert!(!d.poll(500));
            assert!(!d.is_pending());
        }
    }

    mod throttler {
        use super::*;

        #[test]
        fn first_sample_runs_immediately() {
            let mut t = Throttler::new(6);
            assert_eq!(t.try_run(1, 0), Some(1));
        }

        #[test]
        fn latest_sample_wins_trailing() {
            let mut t = Throttler::new(6);
            assert_eq!(t.try_run(1, 0), Some(1));
            assert_eq!(t.try_run(2, 2), None);
            assert_eq!(t.try_run(3, 4), None);
            assert_eq!(t.deadline(), Some(6));
            assert_eq!(t.poll(5), None);
            assert_eq!(t.poll(6), Some(3));
            assert!(!t.has_pending());
        }

        #[test]
        fn cancel_discards_trailing_sample() {
            let mut t = Throttler::new(6);
            t.try_run(1, 0);
            t.try_run(2, 1);
            t.cancel();
            assert_eq!(t.poll(100), None);
            assert_eq!(t.try_run(3, 2), Some(3));
        }
    }

    mod interval {
        use super::*;

        #[test]
        fn ticks_every_period_until_stopped() {
            let mut timer = IntervalTimer::new(48);
            timer.start(0);
            assert!(!timer.poll(47));
            assert!(timer.poll(48));
            assert!(!timer.poll(60));
            assert!(timer.poll(96));
            timer.stop();
            assert!(!timer.poll(1_000));
            assert!(!timer.is_running());
        }
    }

    proptest! {
        #[test]
        fn throttler_never_runs_twice_within_interval(
            gaps in prop::collection::vec(0u64..20, 1..60),
        ) {
            let interval = 6;
            let mut t = Throttler::new(interval);
            let mut now = 0;
            let mut runs: Vec<Millis> = Vec::new();
            for (i, gap) in gaps.iter().enumerate() {
                now += gap;
                if t.poll(now).is_some() {
                    runs.push(now);
                }
                if t.try_run(i, now).is_some() {
                    runs.push(now);
                }
            }
            for pair in runs.windows(2) {
                prop_assert!(pair[1] >= pair[0] + interval);
            }
        }
    }
}
