//! Montage Session - one editing session
//!
//! This crate handles:
//! - Importing and probing files into the timeline
//! - Clip edits with the reset-on-mutation preview policy
//! - Preview and export requests
//! - The user-facing status line

pub mod session;
pub mod status;

pub use session::{probe_sources, ProbedSource, Session};
pub use status::StatusMessage;
