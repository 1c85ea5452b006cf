//! # Dungeon Core
//!
//! Combat resolution engine for squad-versus-dungeon battles.
//!
//! Two squads stand on fixed 3x2 grids (column 0 is the front line). Every
//! round the units of both squads act in one interleaved order sorted by
//! their hit rating; fighter classes bend targeting and damage through their
//! abilities, and each exchange goes through a contested hit, dodge, crit
//! and defense roll.
//!
//! This crate contains **only** the engine:
//! - No rendering
//! - No IO (balance data is parsed from strings)
//! - Randomness is always injected through [`rand::Rng`]
//!
//! ## Crate Structure
//!
//! - [`stats`] - Stat formulas from allocation points and equipment
//! - [`equipment`] - Tiered equipment stats
//! - [`balance`] - Defense transform and mob stat curve
//! - [`combatant`] - Fighters and mobs
//! - [`squad`] - The 3x2 grid
//! - [`schedule`] - Per-round attack order
//! - [`abilities`] - Class abilities and turn resolution
//! - [`attack`] - Single attack resolution
//! - [`battle`] - Battle loop
//! - [`batch`] - Repeated battles and statistics
//! - [`events`] - Structured battle events

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod abilities;
pub mod attack;
pub mod balance;
pub mod batch;
pub mod battle;
pub mod class;
pub mod combatant;
pub mod equipment;
pub mod error;
pub mod events;
pub mod schedule;
pub mod squad;
pub mod stats;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::attack::{AttackOutcome, PendingEffects};
    pub use crate::balance::{BalanceConfig, MobStats, StatRules};
    pub use crate::batch::{run_batch, run_seeded_batch, BatchStats, CancelToken, SuccessWindows};
    pub use crate::battle::{run_battle, Battle, BattleOutcome, BattleStatus, MAX_ROUNDS};
    pub use crate::class::FighterClass;
    pub use crate::combatant::{Combatant, CombatantKind, FighterSpec};
    pub use crate::equipment::EquipmentStat;
    pub use crate::error::{BattleError, Result};
    pub use crate::events::{BattleEvent, BoardSnapshot, SlotRef, Verbosity};
    pub use crate::squad::{Position, Side, Squad, SquadTemplate};
    pub use crate::stats::{Allocation, DerivedStats, EquipmentBonus};
}
