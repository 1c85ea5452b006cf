//! # Dungeon Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Scripted random source replaying chosen draws
//! - Fighter and squad fixtures
//! - Determinism harness for seeded battles and batches
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod rng;

/// Re-export proptest for convenience.
pub use proptest;
