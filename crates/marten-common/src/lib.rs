//! Common utilities for the Marten renderer.
//!
//! This crate provides shared infrastructure used by all pipeline components:
//! - **Warning System** - colored, deduplicated terminal output for
//!   unsupported or malformed input
//! - **Phase Timing** - running averages for pipeline phases (render, composite)

pub mod timing;
pub mod warning;
