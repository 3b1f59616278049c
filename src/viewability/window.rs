//! Windows along the scroll axis and index-set diffs.

use serde::Serialize;

/// A span `[start, end]` along the scroll axis, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct VisibilityWindow {
    /// Window start.
    pub start: f64,
    /// Window end.
    pub end: f64,
}

impl VisibilityWindow {
    /// Create a window.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// True when an item spanning `[item_start, item_end]` intersects.
    ///
    /// An item intersects when either bound lies strictly inside, when it
    /// covers the whole window, or when it has zero size and sits exactly on
    /// one of the window edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use recyclist::viewability::VisibilityWindow;
    ///
    /// let window = VisibilityWindow::new(100.0, 200.0);
    /// assert!(window.intersects(150.0, 250.0));
    /// assert!(window.intersects(0.0, 300.0));
    /// assert!(window.intersects(200.0, 200.0));
    /// assert!(!window.intersects(200.0, 250.0)); // touching is not intersecting
    /// ```
    pub fn intersects(&self, item_start: f64, item_end: f64) -> bool {
        let inside = |bound: f64| self.start < bound && self.end > bound;
        let covers = self.start >= item_start && self.end <= item_end;
        let zero_size_edge =
            item_start == item_end && (self.start == item_start || self.end == item_end);
        inside(item_start) || inside(item_end) || covers || zero_size_edge
    }

    /// Move both ends by `delta`.
    pub fn shift(&mut self, delta: f64) {
        self.start += delta;
        self.end += delta;
    }
}

/// Change of one index set: the full new set plus what entered and left.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct IndexDiff {
    /// All indexes now in the set, ascending.
    pub all: Vec<usize>,
    /// Indexes that entered the set.
    pub now: Vec<usize>,
    /// Indexes that left the set.
    pub not_now: Vec<usize>,
}

impl IndexDiff {
    /// Diff two ascending index lists. `None` when nothing entered or left.
    ///
    /// # Examples
    ///
    /// ```
    /// use recyclist::viewability::IndexDiff;
    ///
    /// let diff = IndexDiff::between(&[1, 2, 3], &[2, 3, 4]).unwrap();
    /// assert_eq!(diff.now, vec![4]);
    /// assert_eq!(diff.not_now, vec![1]);
    /// assert!(IndexDiff::between(&[1, 2], &[1, 2]).is_none());
    /// ```
    pub fn between(old: &[usize], new: &[usize]) -> Option<Self> {
        let now = difference(new, old);
        let not_now = difference(old, new);
        if now.is_empty() && not_now.is_empty() {
            return None;
        }
        Some(Self {
            all: new.to_vec(),
            now,
            not_now,
        })
    }
}

/// Elements of `a` missing from `b`; both ascending.
fn difference(a: &[usize], b: &[usize]) -> Vec<usize> {
    a.iter()
        .copied()
        .filter(|x| b.binary_search(x).is_err())
        .collect()
}

/// Result of one refit: whichever of the two sets changed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WindowChange {
    /// Change of the visible set.
    pub visible: Option<IndexDiff>,
    /// Change of the engaged (render) set.
    pub engaged: Option<IndexDiff>,
}

impl WindowChange {
    /// True when neither set changed.
    pub fn is_empty(&self) -> bool {
        self.visible.is_none() && self.engaged.is_none()
    }
}
