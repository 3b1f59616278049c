//! Start/end reached detection.
//!
//! Each edge fires once per approach: after firing it stays quiet until the
//! offset retreats past its threshold, or until [`EdgeReachedDetector::reset`]
//! re-arms both edges (new data arrived).

use serde::{Deserialize, Serialize};

/// Distances at which the list counts as having reached an edge.
///
/// Absolute values are in pixels; relative values are multiples of the
/// viewport's main-axis size. Either one triggering is enough.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeThresholds {
    /// Start fires when the offset is at most this many pixels.
    pub start_absolute: f64,
    /// Start fires when the offset is at most this many viewports.
    pub start_relative: f64,
    /// End fires when the remaining distance is at most this many pixels.
    pub end_absolute: f64,
    /// End fires when the remaining distance is at most this many viewports.
    pub end_relative: f64,
}

/// Which edge was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Head of the list.
    Start,
    /// Tail of the list.
    End,
}

/// Fires start/end reached once per approach.
///
/// # Examples
///
/// ```
/// use recyclist::viewability::{Edge, EdgeReachedDetector, EdgeThresholds};
///
/// let thresholds = EdgeThresholds { end_absolute: 100.0, ..Default::default() };
/// let mut detector = EdgeReachedDetector::new(thresholds);
///
/// // 5000px of content in a 500px viewport.
/// assert!(detector.check(1000.0, 500.0, 5000.0).is_empty());
/// assert_eq!(detector.check(4450.0, 500.0, 5000.0), vec![Edge::End]);
/// assert!(detector.check(4480.0, 500.0, 5000.0).is_empty()); // already fired
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeReachedDetector {
    thresholds: EdgeThresholds,
    start_fired: bool,
    end_fired: bool,
}

impl EdgeReachedDetector {
    /// Create an armed detector.
    pub fn new(thresholds: EdgeThresholds) -> Self {
        Self {
            thresholds,
            start_fired: false,
            end_fired: false,
        }
    }

    /// Evaluate an offset; returns the edges that fire now.
    pub fn check(&mut self, offset: f64, viewport_main: f64, content_main: f64) -> Vec<Edge> {
        let t = &self.thresholds;
        let mut fired = Vec::new();

        let at_start = offset <= viewport_main * t.start_relative || offset <= t.start_absolute;
        if at_start {
            if !self.start_fired {
                self.start_fired = true;
                fired.push(Edge::Start);
            }
        } else {
            self.start_fired = false;
        }

        let remaining = content_main - viewport_main - offset;
        let at_end = remaining <= viewport_main * t.end_relative || remaining <= t.end_absolute;
        if at_end {
            if !self.end_fired {
                self.end_fired = true;
                fired.push(Edge::End);
            }
        } else {
            self.end_fired = false;
        }

        fired
    }

    /// Re-arm both edges.
    pub fn reset(&mut self) {
        self.start_fired = false;
        self.end_fired = false;
    }

    /// Replace the thresholds, keeping the armed state.
    pub fn set_thresholds(&mut self, thresholds: EdgeThresholds) {
        self.thresholds = thresholds;
    }
}
