//! Anchor policy: which index keeps its offset across relayouts.
//!
//! The fix index is moved as little as possible, prefers entries whose size
//! was measured, and prefers visible entries. When no measured candidate
//! exists the old fix stays as long as it is still engaged.

use crate::model::Layout;

/// Index bounds of the visible and engaged windows for one anchoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorWindow {
    /// First visible index.
    pub first_visible: usize,
    /// Last visible index.
    pub last_visible: usize,
    /// First engaged (rendered) index.
    pub first_engaged: usize,
    /// Last engaged (rendered) index.
    pub last_engaged: usize,
}

impl AnchorWindow {
    /// Build from sorted visible and engaged index lists.
    ///
    /// Returns `None` when nothing is visible. An empty engaged list is
    /// treated as equal to the visible one.
    pub fn from_indexes(visible: &[usize], engaged: &[usize]) -> Option<Self> {
        let first_visible = *visible.first()?;
        let last_visible = *visible.last()?;
        Some(Self {
            first_visible,
            last_visible,
            first_engaged: engaged.first().copied().unwrap_or(first_visible),
            last_engaged: engaged.last().copied().unwrap_or(last_visible),
        })
    }
}

/// Pick the next fix index. `None` keeps the current one.
///
/// # Examples
///
/// ```
/// use recyclist::layout::anchor::{choose_fix_index, AnchorWindow};
///
/// let window = AnchorWindow {
///     first_visible: 10,
///     last_visible: 15,
///     first_engaged: 7,
///     last_engaged: 18,
/// };
/// // Nothing measured and the old fix fell out of the engaged window:
/// // snap to the first visible index.
/// assert_eq!(choose_fix_index(Some(2), &[], &window), Some(10));
/// ```
pub fn choose_fix_index(current: Option<usize>, layouts: &[Layout], window: &AnchorWindow) -> Option<usize> {
    let measured = |index: usize| layouts.get(index).is_some_and(|l| l.is_overridden);

    match current {
        Some(fix) if fix > window.last_visible => {
            let up = window.last_engaged.saturating_sub(window.last_visible);
            let down = window.last_visible.saturating_sub(window.first_engaged);
            let found = nearest(window.last_visible, up, down, measured);
            found.or_else(|| (fix > window.last_engaged).then_some(window.last_visible))
        }
        Some(fix) if fix >= window.first_visible => None,
        _ => {
            let down = window.first_visible.saturating_sub(window.first_engaged);
            let up = window.last_engaged.saturating_sub(window.first_visible);
            // Ties go toward the old fix, which lies below.
            let found = nearest_downward_first(window.first_visible, down, up, measured);
            let stale = current.map_or(true, |fix| fix < window.first_engaged);
            found.or_else(|| stale.then_some(window.first_visible))
        }
    }
}

/// Search outward from `origin`, upward first at each distance.
fn nearest(origin: usize, up: usize, down: usize, measured: impl Fn(usize) -> bool) -> Option<usize> {
    (0..=up.max(down)).find_map(|d| {
        if d <= up && measured(origin + d) {
            Some(origin + d)
        } else if d >= 1 && d <= down && measured(origin - d) {
            Some(origin - d)
        } else {
            None
        }
    })
}

/// Search outward from `origin`, downward first at each distance.
fn nearest_downward_first(
    origin: usize,
    down: usize,
    up: usize,
    measured: impl Fn(usize) -> bool,
) -> Option<usize> {
    (0..=up.max(down)).find_map(|d| {
        if d <= down && measured(origin - d) {
            Some(origin - d)
        } else if d >= 1 && d <= up && measured(origin + d) {
            Some(origin + d)
        } else {
            None
        }
    })
}
