//! Integration test crate for Montage Studio.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the montage crates and their test doubles to verify
//! they work together.

#[cfg(test)]
mod timeline;

#[cfg(test)]
mod preview;

#[cfg(test)]
mod export;
