//! Determinism testing utilities.
//!
//! Battles are stochastic, but every random draw goes through an injected
//! [`rand::Rng`]. Seeding that source must reproduce a battle exactly:
//! same winner, same round count, same remaining health, same event stream.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: scripted draws force individual rolls
//! 2. **Property tests**: random squads still replay identically per seed
//! 3. **Integration tests**: seeded batches reproduce their win counts

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use dungeon_core::balance::StatRules;
use dungeon_core::batch::{run_seeded_batch, BatchStats, CancelToken};
use dungeon_core::battle::{Battle, BattleOutcome};
use dungeon_core::squad::{Squad, SquadTemplate};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Hash the observable result of a battle.
#[must_use]
pub fn outcome_hash(outcome: &BattleOutcome) -> u64 {
    let mut hasher = DefaultHasher::new();
    outcome.winner.hash(&mut hasher);
    outcome.status.hash(&mut hasher);
    outcome.rounds.hash(&mut hasher);
    outcome.message.hash(&mut hasher);
    outcome.mobs_remaining_health.to_bits().hash(&mut hasher);
    hasher.finish()
}

/// Hash batch statistics.
#[must_use]
pub fn stats_hash(stats: &BatchStats) -> u64 {
    let mut hasher = DefaultHasher::new();
    stats.battles.hash(&mut hasher);
    stats.fighter_wins.hash(&mut hasher);
    stats.mob_wins.hash(&mut hasher);
    stats.exhaustions.hash(&mut hasher);
    stats.failed_constructions.hash(&mut hasher);
    stats.survivor_health_total.to_bits().hash(&mut hasher);
    stats.total_rounds.hash(&mut hasher);
    hasher.finish()
}

/// Run the same seeded battle `runs` times and compare outcomes.
///
/// `setup` must build fresh squads on every call.
pub fn verify_battle_determinism<F>(
    runs: usize,
    seed: u64,
    rules: &dyn StatRules,
    setup: F,
) -> DeterminismResult
where
    F: Fn() -> (Squad, Squad),
{
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let (fighters, mobs) = setup();
            let rng = ChaCha8Rng::seed_from_u64(seed);
            outcome_hash(&Battle::new(fighters, mobs, rules, rng).run())
        })
        .collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
    }
}

/// Run the same seeded batch `runs` times and compare statistics.
pub fn verify_batch_determinism(
    runs: usize,
    seed: u64,
    template: &SquadTemplate,
    mob_level: i32,
    battles: u32,
    rules: &dyn StatRules,
) -> DeterminismResult {
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let stats =
                run_seeded_batch(template, mob_level, battles, rules, seed, &CancelToken::new());
            stats_hash(&stats)
        })
        .collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
    }
}

/// Proptest strategies for battle inputs.
pub mod strategies {
    use dungeon_core::class::FighterClass;
    use dungeon_core::combatant::FighterSpec;
    use dungeon_core::squad::{SquadTemplate, CANONICAL_ORDER};
    use dungeon_core::stats::{Allocation, EquipmentBonus};
    use proptest::prelude::*;

    /// Any fighter class.
    pub fn arb_class() -> impl Strategy<Value = FighterClass> {
        proptest::sample::select(FighterClass::ALL.to_vec())
    }

    /// Allocation points in a realistic range.
    pub fn arb_allocation() -> impl Strategy<Value = Allocation> {
        (0u8..=10, 0u8..=10, 0u8..=10, 0u8..=10, 0u8..=10, 0u8..=10).prop_map(
            |(health, damage, hit, defense, crit, dodge)| Allocation {
                health: f64::from(health),
                damage: f64::from(damage),
                hit: f64::from(hit),
                defense: f64::from(defense),
                crit: f64::from(crit),
                dodge: f64::from(dodge),
            },
        )
    }

    /// Flat equipment bonuses in a realistic range.
    pub fn arb_equipment() -> impl Strategy<Value = EquipmentBonus> {
        (0u16..=300, 0u16..=100, 0u16..=100, 0u16..=50, 0u16..=50, 0u16..=100).prop_map(
            |(health, damage, hit, defense, crit, dodge)| EquipmentBonus {
                health: f64::from(health),
                damage: f64::from(damage),
                hit: f64::from(hit),
                defense: f64::from(defense),
                crit: f64::from(crit),
                dodge: f64::from(dodge),
            },
        )
    }

    /// A buildable fighter recipe.
    pub fn arb_fighter_spec() -> impl Strategy<Value = FighterSpec> {
        (arb_class(), arb_allocation(), arb_equipment()).prop_map(|(class, allocation, gear)| {
            FighterSpec::new(class.name())
                .with_allocation(allocation)
                .with_equipment(gear)
        })
    }

    /// A template with at least one fighter.
    pub fn arb_squad_template() -> impl Strategy<Value = SquadTemplate> {
        proptest::collection::vec(proptest::option::of(arb_fighter_spec()), 6)
            .prop_filter("at least one fighter", |slots| slots.iter().any(Option::is_some))
            .prop_map(|slots| {
                let mut template = SquadTemplate::new();
                for (position, spec) in CANONICAL_ORDER.into_iter().zip(slots) {
                    template.set(position, spec);
                }
                template
            })
    }

    /// A mob level covering every offset bracket.
    pub fn arb_mob_level() -> impl Strategy<Value = i32> {
        1i32..=400
    }
}
