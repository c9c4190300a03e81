//! Agent Sim – a timed, scripted multi-agent wedding-planning simulator
//!
//! This crate implements a fixed cast of planning agents with:
//! - A scripted timeline player that replays timed steps with cancel/reset
//! - User-triggered two-phase ad-hoc tasks
//! - A single-writer transition engine over a bounded-log entity store
//! - A deterministic virtual-time scheduler with real-time playback
//! - Epoch-tagged delayed callbacks so resets never race stale timers

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Simulator core modules
pub mod runtime;

// Re-export key types for convenience
pub use runtime::{SimConfig, Simulator};

/// Current version of the simulator
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
