//! Domain model types (pure).
//!
//! Geometry primitives, collaborator interfaces and the error taxonomy.
//! Nothing in this module schedules work or holds list state.

pub mod error;
pub mod geometry;
pub mod provider;

// Re-export for convenience
pub use error::{AppError, RecyclerError};
pub use geometry::{Dimension, Layout, Orientation, Point, WindowCorrection};
pub use provider::{DataProvider, ItemType, LayoutProvider, LayoutTypeProvider, VecDataProvider};
