//! Headless battle runner for balance testing.
//!
//! This crate drives the `dungeon_core` engine from scenario files:
//!
//! - **Single battles**: Play one battle and render its event stream
//! - **Batches**: Run up to a million battles in parallel and report the
//!   fighters' victory chance and success windows
//! - **Expeditions**: Send one squad through a chain of encounters without
//!   healing between them
//!
//! # Example
//!
//! ```bash
//! # Play one battle with a detailed log
//! cargo run -p dungeon_headless -- battle --scenario scenarios/dungeon_party.ron --detailed
//!
//! # Run a batch and save the results
//! cargo run -p dungeon_headless -- batch --scenario scenarios/dungeon_party.ron --count 100000 --output results/batch.json
//!
//! # Clear as many caves as possible
//! cargo run -p dungeon_headless -- expedition --scenario scenarios/dungeon_party.ron --encounters 20
//! ```

pub mod batch;
pub mod expedition;
pub mod metrics;
pub mod render;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use expedition::{run_expedition, ExpeditionReport};
pub use metrics::{BatchSummary, BattleRecord};
pub use render::{render_board, render_events};
pub use scenario::{load_balance, Placement, Scenario, ScenarioError};
