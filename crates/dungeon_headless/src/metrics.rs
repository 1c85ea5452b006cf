//! Battle metrics and batch summaries.

use dungeon_core::batch::{BatchStats, SuccessWindows};
use dungeon_core::battle::{BattleOutcome, BattleStatus};
use dungeon_core::squad::Side;
use serde::{Deserialize, Serialize};

/// Result of one battle in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord {
    /// Index within the batch.
    pub index: u32,
    /// Seed the battle ran with.
    pub seed: u64,
    /// Winning side.
    pub winner: Side,
    /// Terminal status.
    pub status: BattleStatus,
    /// Rounds played.
    pub rounds: u32,
    /// Mobs' total remaining health.
    pub mobs_remaining_health: f64,
}

impl BattleRecord {
    /// Record an outcome.
    #[must_use]
    pub fn new(index: u32, seed: u64, outcome: &BattleOutcome) -> Self {
        Self {
            index,
            seed,
            winner: outcome.winner,
            status: outcome.status,
            rounds: outcome.rounds,
            mobs_remaining_health: outcome.mobs_remaining_health,
        }
    }
}

/// Aggregate view of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Raw totals.
    pub stats: BatchStats,
    /// Fighter win rate in percent.
    pub victory_chance_percent: f64,
    /// Mean remaining mob health over mob wins.
    pub average_survivor_health: f64,
    /// Mean rounds per battle.
    pub average_rounds: f64,
    /// Dungeons cleared per minute used for the windows.
    pub dungeons_per_minute: f64,
    /// Chance of at least one win per time window.
    pub success_windows: SuccessWindows,
}

impl BatchSummary {
    /// Summarize `stats` for a player clearing `dungeons_per_minute`.
    #[must_use]
    pub fn from_stats(stats: BatchStats, dungeons_per_minute: f64) -> Self {
        Self {
            victory_chance_percent: stats.victory_chance() * 100.0,
            average_survivor_health: stats.average_survivor_health(),
            average_rounds: stats.average_rounds(),
            dungeons_per_minute,
            success_windows: stats.success_windows(dungeons_per_minute),
            stats,
        }
    }

    /// Human-readable report lines.
    #[must_use]
    pub fn report(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Battles played: {}", self.stats.battles),
            format!("Victory chance: {:.2}%", self.victory_chance_percent),
            format!(
                "Average health of surviving mobs: {}",
                self.average_survivor_health
            ),
            format!("Average rounds: {:.1}", self.average_rounds),
            format!(
                "Chance of success within 10 minutes: {:.2}%",
                self.success_windows.ten_minutes * 100.0
            ),
            format!(
                "Chance of success within 30 minutes: {:.2}%",
                self.success_windows.thirty_minutes * 100.0
            ),
            format!(
                "Chance of success within 60 minutes: {:.2}%",
                self.success_windows.sixty_minutes * 100.0
            ),
        ];
        if self.stats.exhaustions > 0 {
            lines.push(format!("Battles lost to exhaustion: {}", self.stats.exhaustions));
        }
        if self.stats.failed_constructions > 0 {
            lines.push(format!(
                "Battles skipped (invalid squad): {}",
                self.stats.failed_constructions
            ));
        }
        lines
    }
}
