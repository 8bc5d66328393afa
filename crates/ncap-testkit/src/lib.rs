//! NCAP Test Kit - fixtures and mock infrastructure for protocol tests.
//!
//! Provides:
//! - [`CapturingSink`] - event sink that records every protocol event
//! - [`ManualClock`] / [`ManualScheduler`] - deterministic time control
//! - [`CollectingFace`], [`MemoryContentStore`], [`MemoryPending`] -
//!   in-memory collaborator implementations
//! - `fixtures` - builders for tags, interests, and data
//! - [`init_test_tracing`] - tracing output for test runs

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod fixtures;
mod sim;
mod sink;
mod tracing_config;

pub use sim::*;
pub use sink::*;
pub use tracing_config::*;

// Re-export the crates under test for convenience
pub use ncap_core;
pub use ncap_node;
