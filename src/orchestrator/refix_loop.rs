//! Debounced refix driver.
//!
//! A refix shifts every layout and the scroll offset at once, which is only
//! invisible when nothing else is moving content. The loop therefore waits
//! for a quiet period, re-queues itself while the list is busy, and runs
//! promptly when an edge is visible (drift is most noticeable there).

use crate::schedule::{Debouncer, Millis};

/// Conditions under which a due refix must wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefixGate {
    /// An auto-layout batch for the current layout id has not arrived yet.
    pub pending_auto_layout: bool,
    /// A programmatic scroll holds the fix index.
    pub holding_index: bool,
    /// The user is dragging.
    pub user_dragging: bool,
    /// The list is momentum scrolling.
    pub momentum_scrolling: bool,
    /// The start or end edge is within the edge threshold.
    pub edge_visible: bool,
}

impl RefixGate {
    /// True when a refix would move content under a pending layout, a held
    /// scroll target, or the user's finger.
    pub fn is_suppressed(&self) -> bool {
        self.pending_auto_layout
            || self.holding_index
            || (!self.edge_visible && (self.user_dragging || self.momentum_scrolling))
    }
}

/// What a poll of the loop decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefixTick {
    /// Nothing due.
    Idle,
    /// Due but suppressed; re-queued.
    Suppressed,
    /// Run the refix now.
    Run,
}

/// Refix debounce plus the short edge flush timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefixLoop {
    refix: Debouncer,
    edge_flush: Debouncer,
    flush_only_at_edge: bool,
}

impl RefixLoop {
    /// Create an idle loop.
    pub fn new(debounce: Millis, edge_flush: Millis) -> Self {
        Self {
            refix: Debouncer::new(debounce),
            edge_flush: Debouncer::new(edge_flush),
            flush_only_at_edge: false,
        }
    }

    /// (Re)start the quiet period.
    pub fn queue(&mut self, now: Millis) {
        self.refix.schedule(now);
    }

    /// Flush the pending refix shortly, whatever the edge state by then.
    pub fn schedule_flush(&mut self, now: Millis) {
        self.flush_only_at_edge = false;
        self.edge_flush.schedule_if_idle(now);
    }

    /// Retry after a deferred refix; flush soon when an edge is visible.
    pub fn retrigger(&mut self, now: Millis, edge_visible: bool) {
        self.queue(now);
        if edge_visible {
            self.schedule_flush(now);
        }
    }

    /// Fire whatever is due.
    pub fn poll(&mut self, now: Millis, gate: &RefixGate) -> RefixTick {
        let mut due = self.refix.poll(now);
        if self.edge_flush.poll(now) && (!self.flush_only_at_edge || gate.edge_visible) {
            due |= self.refix.flush();
        }
        if !due {
            return RefixTick::Idle;
        }
        if gate.is_suppressed() {
            self.queue(now);
            if !self.edge_flush.is_pending() {
                self.flush_only_at_edge = true;
                self.edge_flush.schedule(now);
            }
            return RefixTick::Suppressed;
        }
        RefixTick::Run
    }

    /// Drop everything pending.
    pub fn cancel(&mut self) {
        self.refix.cancel();
        self.edge_flush.cancel();
    }

    /// True while a refix is queued.
    pub fn is_pending(&self) -> bool {
        self.refix.is_pending()
    }

    /// Earliest time at which [`RefixLoop::poll`] can do something.
    pub fn next_deadline(&self) -> Option<Millis> {
        match (self.refix.deadline(), self.edge_flush.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> RefixGate {
        RefixGate::default()
    }

    #[test]
    fn runs_after_quiet_period() {
        let mut refix = RefixLoop::new(1500, 100);
        refix.queue(0);
        assert_eq!(refix.poll(1499, &quiet()), RefixTick::Idle);
        assert_eq!(refix.poll(1500, &quiet()), RefixTick::Run);
        assert_eq!(refix.poll(3000, &quiet()), RefixTick::Idle);
    }

    #[test]
    fn new_scroll_pushes_deadline_out() {
        let mut refix = RefixLoop::new(1500, 100);
        refix.queue(0);
        refix.queue(1000);
        assert_eq!(refix.poll(1500, &quiet()), RefixTick::Idle);
        assert_eq!(refix.poll(2500, &quiet()), RefixTick::Run);
    }

    #[test]
    fn edge_flush_runs_early() {
        let mut refix = RefixLoop::new(1500, 100);
        refix.queue(0);
        refix.schedule_flush(0);
        assert_eq!(refix.next_deadline(), Some(100));
        assert_eq!(refix.poll(100, &quiet()), RefixTick::Run);
        assert!(!refix.is_pending());
    }

    #[test]
    fn dragging_away_from_edges_suppresses_and_requeues() {
        let gate = RefixGate {
            user_dragging: true,
            ..RefixGate::default()
        };
        let mut refix = RefixLoop::new(1500, 100);
        refix.queue(0);
        assert_eq!(refix.poll(1500, &gate), RefixTick::Suppressed);
        assert!(refix.is_pending());

        // The conditional flush fires but the edge is still hidden.
        assert_eq!(refix.poll(1600, &gate), RefixTick::Idle);
        assert_eq!(refix.poll(3000, &quiet()), RefixTick::Run);
    }

    #[test]
    fn conditional_flush_runs_once_edge_becomes_visible() {
        let mut refix = RefixLoop::new(1500, 100);
        refix.queue(0);
        let holding = RefixGate {
            holding_index: true,
            ..RefixGate::default()
        };
        assert_eq!(refix.poll(1500, &holding), RefixTick::Suppressed);

        let at_edge = RefixGate {
            edge_visible: true,
            ..RefixGate::default()
        };
        assert_eq!(refix.poll(1600, &at_edge), RefixTick::Run);
    }

    #[test]
    fn dragging_at_an_edge_is_allowed() {
        let gate = RefixGate {
            user_dragging: true,
            edge_visible: true,
            ..RefixGate::default()
        };
        assert!(!gate.is_suppressed());
        let pending = RefixGate {
            pending_auto_layout: true,
            edge_visible: true,
            ..RefixGate::default()
        };
        assert!(pending.is_suppressed());
    }

    #[test]
    fn retrigger_at_edge_flushes_soon() {
        let mut refix = RefixLoop::new(1500, 100);
        refix.retrigger(0, true);
        assert_eq!(refix.next_deadline(), Some(100));
        refix.cancel();
        assert_eq!(refix.next_deadline(), None);
        refix.retrigger(0, false);
        assert_eq!(refix.next_deadline(), Some(1500));
    }
}
