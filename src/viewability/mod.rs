//! Viewability: which indexes are visible, which are engaged, and when the
//! list reaches its edges.

pub mod edge;
pub mod tracker;
pub mod window;

pub use edge::{Edge, EdgeReachedDetector, EdgeThresholds};
pub use tracker::VisibilityTracker;
pub use window::{IndexDiff, VisibilityWindow, WindowChange};
