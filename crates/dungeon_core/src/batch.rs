//! Repeated battles and their statistics.
//!
//! A batch rebuilds the fighters' squad from a [`SquadTemplate`] and a fresh
//! mobs' squad for every battle, so no state leaks between battles. The
//! statistics accumulated so far stay valid when a batch is cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::balance::StatRules;
use crate::battle::{Battle, BattleOutcome, BattleStatus};
use crate::error::Result;
use crate::squad::{Squad, SquadTemplate};

/// Largest number of battles a single batch will run.
pub const MAX_BATTLES: u32 = 1_000_000;

/// Window lengths, in minutes, reported by [`SuccessWindows`].
pub const SUCCESS_WINDOW_MINUTES: [u32; 3] = [10, 30, 60];

/// Clamp a requested battle count into `1..=MAX_BATTLES`.
#[must_use]
pub fn clamp_battles(requested: u32) -> u32 {
    requested.clamp(1, MAX_BATTLES)
}

/// Cooperative cancellation flag shared between a batch and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Accumulated results over many battles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Battles played to completion.
    pub battles: u32,
    /// Battles the fighters won.
    pub fighter_wins: u32,
    /// Battles the mobs won, exhaustions included.
    pub mob_wins: u32,
    /// Battles that hit the round cap.
    pub exhaustions: u32,
    /// Battles skipped because the fighters' squad could not be built.
    pub failed_constructions: u32,
    /// Sum of the mobs' remaining health over mob wins.
    pub survivor_health_total: f64,
    /// Sum of rounds over all battles.
    pub total_rounds: u64,
}

impl BatchStats {
    /// Fold one battle into the totals.
    pub fn record(&mut self, outcome: &BattleOutcome) {
        self.battles += 1;
        self.total_rounds += u64::from(outcome.rounds);
        match outcome.status {
            BattleStatus::FightersWin => self.fighter_wins += 1,
            BattleStatus::MobsWin | BattleStatus::Exhausted => {
                self.mob_wins += 1;
                self.survivor_health_total += outcome.mobs_remaining_health;
                if outcome.status == BattleStatus::Exhausted {
                    self.exhaustions += 1;
                }
            }
            BattleStatus::Running => {}
        }
    }

    /// Combine two partial results.
    #[must_use]
    pub fn merge(mut self, other: BatchStats) -> BatchStats {
        self.battles += other.battles;
        self.fighter_wins += other.fighter_wins;
        self.mob_wins += other.mob_wins;
        self.exhaustions += other.exhaustions;
        self.failed_constructions += other.failed_constructions;
        self.survivor_health_total += other.survivor_health_total;
        self.total_rounds += other.total_rounds;
        self
    }

    /// Fraction of battles the fighters won.
    #[must_use]
    pub fn victory_chance(&self) -> f64 {
        if self.battles == 0 {
            0.0
        } else {
            f64::from(self.fighter_wins) / f64::from(self.battles)
        }
    }

    /// Mean remaining mob health over mob wins, rounded; zero without any.
    #[must_use]
    pub fn average_survivor_health(&self) -> f64 {
        if self.mob_wins == 0 {
            0.0
        } else {
            (self.survivor_health_total / f64::from(self.mob_wins)).round()
        }
    }

    /// Mean rounds per battle.
    #[must_use]
    pub fn average_rounds(&self) -> f64 {
        if self.battles == 0 {
            0.0
        } else {
            self.total_rounds as f64 / f64::from(self.battles)
        }
    }

    /// Chance of at least one win within `minutes` at `dungeons_per_minute`.
    #[must_use]
    pub fn success_chance(&self, dungeons_per_minute: f64, minutes: u32) -> f64 {
        let attempts = (dungeons_per_minute.max(0.0) * f64::from(minutes)).round();
        1.0 - (1.0 - self.victory_chance()).powf(attempts)
    }

    /// Success chances for the standard windows.
    #[must_use]
    pub fn success_windows(&self, dungeons_per_minute: f64) -> SuccessWindows {
        let [short, medium, long] =
            SUCCESS_WINDOW_MINUTES.map(|m| self.success_chance(dungeons_per_minute, m));
        SuccessWindows {
            ten_minutes: short,
            thirty_minutes: medium,
            sixty_minutes: long,
        }
    }
}

/// Probability of at least one win within fixed time windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuccessWindows {
    /// Within 10 minutes.
    pub ten_minutes: f64,
    /// Within 30 minutes.
    pub thirty_minutes: f64,
    /// Within 60 minutes.
    pub sixty_minutes: f64,
}

/// Play one battle of a batch on a freshly built squad.
pub fn play_one<R: Rng>(
    template: &SquadTemplate,
    mob_level: i32,
    rules: &dyn StatRules,
    rng: R,
) -> Result<BattleOutcome> {
    let fighters = template.build(rules)?;
    let mobs = Squad::mobs_for_level(mob_level, rules);
    Ok(Battle::new(fighters, mobs, rules, rng).run())
}

/// Run up to `battles` battles sequentially on one random source.
///
/// The count is clamped with [`clamp_battles`]. Cancellation is checked
/// between battles.
pub fn run_batch<R: Rng>(
    template: &SquadTemplate,
    mob_level: i32,
    battles: u32,
    rules: &dyn StatRules,
    rng: &mut R,
    cancel: &CancelToken,
) -> BatchStats {
    let battles = clamp_battles(battles);
    let mut stats = BatchStats::default();
    for index in 0..battles {
        if cancel.is_cancelled() {
            tracing::info!(completed = index, requested = battles, "Batch cancelled");
            break;
        }
        match play_one(template, mob_level, rules, &mut *rng) {
            Ok(outcome) => stats.record(&outcome),
            Err(err) => {
                tracing::warn!(error = %err, battle = index, "Skipping battle with unbuildable squad");
                stats.failed_constructions += 1;
            }
        }
    }
    stats
}

/// Run a batch from a seed using [`ChaCha8Rng`].
pub fn run_seeded_batch(
    template: &SquadTemplate,
    mob_level: i32,
    battles: u32,
    rules: &dyn StatRules,
    seed: u64,
    cancel: &CancelToken,
) -> BatchStats {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    run_batch(template, mob_level, battles, rules, &mut rng, cancel)
}
