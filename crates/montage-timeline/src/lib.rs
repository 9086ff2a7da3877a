//! Montage Timeline - Clip store
//!
//! Implements the ordered clip list the montage is built from:
//! - Clips with an immutable source duration and a mutable trim window
//! - Append, remove, single-step reorder and clamped trim edits
//! - Aggregate trimmed duration

pub mod clip;
pub mod store;

pub use clip::{Clip, ClipId, MoveDirection, TrimUpdate};
pub use store::Timeline;
