//! Recyclist
//!
//! Headless virtualized list engine. Given a data provider, a layout type
//! provider and a viewport, it computes a wrap-grid layout incrementally,
//! decides which items are visible and which must be rendered, recycles
//! render slots across items of the same type, and keeps the visible content
//! still while measured sizes replace estimates.
//!
//! Rendering is left to a host behind [`orchestrator::ListHost`]; time is
//! passed in explicitly so every decision is deterministic and testable.
//!
//! Layering, bottom-up:
//!
//! - [`model`]: geometry, provider traits and errors
//! - [`schedule`]: debounce, throttle and interval timers over explicit time
//! - [`layout`]: layout manager, anchor policy and refix
//! - [`viewability`]: visible and engaged windows, edge detection
//! - [`render`]: render stack and recycle pool
//! - [`orchestrator`]: the list view state machine and its host seam
//! - [`config`], [`logging`]: ambient plumbing for the simulator binary

pub mod config;
pub mod layout;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod render;
pub mod schedule;
pub mod viewability;
