//! Geometry primitives shared by every component.
//!
//! Pure data: positions and sizes in pixels, per-index layouts, the scroll
//! orientation and the window correction applied to physical offsets.
//! Nothing here owns behaviour beyond axis bookkeeping.

use serde::{Deserialize, Serialize};

use super::provider::ItemType;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimension {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Dimension {
    /// Create a new dimension.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either side is zero (nothing can be windowed).
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

/// A position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Computed rectangle of one data index.
///
/// # Invariants
/// - One entry per data index once a relayout completes.
/// - `is_overridden` is true only when the size came from a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
    /// Item type the size was computed for.
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Size came from a real measurement rather than an estimate.
    #[serde(default)]
    pub is_overridden: bool,
}

impl Layout {
    /// Create a layout from an origin, a size and a type.
    pub fn new(origin: Point, size: Dimension, item_type: ItemType) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            item_type,
            is_overridden: false,
        }
    }

    /// Zero-size entry inserted ahead of shifted data; sized by the next relayout.
    pub fn placeholder() -> Self {
        Self::new(Point::default(), Dimension::default(), ItemType::default())
    }

    /// Origin of the rectangle.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Size of the rectangle.
    pub fn size(&self) -> Dimension {
        Dimension::new(self.width, self.height)
    }
}

/// Scroll axis of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Items flow top to bottom, rows wrap horizontally.
    #[default]
    Vertical,
    /// Items flow left to right, columns wrap vertically.
    Horizontal,
}

impl Orientation {
    /// True for horizontal lists.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Orientation::Horizontal)
    }

    /// Extent of a dimension along the scroll axis.
    pub fn main(self, dim: Dimension) -> f64 {
        match self {
            Orientation::Vertical => dim.height,
            Orientation::Horizontal => dim.width,
        }
    }

    /// Extent of a dimension across the scroll axis.
    pub fn cross(self, dim: Dimension) -> f64 {
        match self {
            Orientation::Vertical => dim.width,
            Orientation::Horizontal => dim.height,
        }
    }

    /// Scroll-axis component of a point.
    pub fn main_of_point(self, point: Point) -> f64 {
        match self {
            Orientation::Vertical => point.y,
            Orientation::Horizontal => point.x,
        }
    }

    /// Point lying on the scroll axis at `offset`.
    pub fn point_at(self, offset: f64) -> Point {
        match self {
            Orientation::Vertical => Point::new(0.0, offset),
            Orientation::Horizontal => Point::new(offset, 0.0),
        }
    }

    /// Scroll-axis position of a layout.
    pub fn main_pos(self, layout: &Layout) -> f64 {
        match self {
            Orientation::Vertical => layout.y,
            Orientation::Horizontal => layout.x,
        }
    }

    /// Cross-axis position of a layout.
    pub fn cross_pos(self, layout: &Layout) -> f64 {
        match self {
            Orientation::Vertical => layout.x,
            Orientation::Horizontal => layout.y,
        }
    }

    /// Scroll-axis size of a layout.
    pub fn main_size(self, layout: &Layout) -> f64 {
        match self {
            Orientation::Vertical => layout.height,
            Orientation::Horizontal => layout.width,
        }
    }

    /// Move a layout along the scroll axis.
    pub fn set_main_pos(self, layout: &mut Layout, value: f64) {
        match self {
            Orientation::Vertical => layout.y = value,
            Orientation::Horizontal => layout.x = value,
        }
    }

    /// Resize a layout along the scroll axis.
    pub fn set_main_size(self, layout: &mut Layout, value: f64) {
        match self {
            Orientation::Vertical => layout.height = value,
            Orientation::Horizontal => layout.width = value,
        }
    }

    /// Start and end of a layout along the scroll axis.
    pub fn main_bounds(self, layout: &Layout) -> (f64, f64) {
        let start = self.main_pos(layout);
        (start, start + self.main_size(layout))
    }

    /// Build a dimension from scroll-axis and cross-axis extents.
    pub fn dimension(self, main: f64, cross: f64) -> Dimension {
        match self {
            Orientation::Vertical => Dimension::new(cross, main),
            Orientation::Horizontal => Dimension::new(main, cross),
        }
    }

    /// Build a point from scroll-axis and cross-axis positions.
    pub fn point(self, main: f64, cross: f64) -> Point {
        match self {
            Orientation::Vertical => Point::new(cross, main),
            Orientation::Horizontal => Point::new(main, cross),
        }
    }
}

/// Offset between the consumer's physical scroll coordinate and the list's
/// logical coordinate (e.g. a fixed header overlapping the list).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowCorrection {
    /// Added to the start of the visible window.
    pub start_correction: f64,
    /// Added to the end of the visible window.
    pub end_correction: f64,
    /// Shift applied to both ends of the window.
    pub window_shift: f64,
}

impl WindowCorrection {
    /// Correction applied to the window start.
    pub fn start_total(&self) -> f64 {
        self.window_shift + self.start_correction
    }

    /// Correction applied to the window end.
    pub fn end_total(&self) -> f64 {
        self.window_shift + self.end_correction
    }
}
