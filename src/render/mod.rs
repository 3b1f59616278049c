//! Render window: which slots are mounted and what each one shows.

pub mod coordinator;
pub mod recycle_pool;

pub use coordinator::{RenderSlot, RenderStackEntry, RenderWindowCoordinator};
pub use recycle_pool::{RecyclePool, SlotKey};
