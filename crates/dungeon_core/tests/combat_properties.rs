//! Behavioural properties of the combat engine.

use dungeon_core::abilities::{take_turn, TurnContext, TurnFlow};
use dungeon_core::attack::{resolve_attack, AttackOutcome, PendingEffects};
use dungeon_core::balance::StatRules;
use dungeon_core::batch::{run_batch, run_seeded_batch, CancelToken};
use dungeon_core::battle::{Battle, BattleStatus, MAX_ROUNDS};
use dungeon_core::class::FighterClass;
use dungeon_core::events::{EventLog, SlotRef, Verbosity};
use dungeon_core::schedule::attack_order;
use dungeon_core::squad::{Position, Side, Squad};
use dungeon_test_utils::determinism::strategies::{arb_mob_level, arb_squad_template};
use dungeon_test_utils::fixtures;
use dungeon_test_utils::proptest::prelude::*;
use dungeon_test_utils::rng::ScriptedRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn assert_health_bounds(squad: &Squad) {
    for (position, unit) in squad.iter() {
        assert!(
            unit.current_health() >= 0.0 && unit.current_health() <= unit.total_health(),
            "{position} has {} of {} health",
            unit.current_health(),
            unit.total_health()
        );
    }
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_no_class_fighter_against_level_one_mob() {
    let rules = fixtures::rules();
    let fighter = fixtures::fighter(FighterClass::NoClass);
    assert_eq!(fighter.total_health(), 500.0);
    assert_eq!(fighter.stats().damage, 100.0);
    assert_eq!(fighter.stats().hit, 50.0);
    assert_eq!(fighter.stats().dodge, 50.0);
    assert_eq!(fighter.stats().crit, 0.0);

    let mobs = Squad::mobs_for_level(1, &rules);
    assert_eq!(mobs.len(), 1);
    let mob = mobs.get(Position::new(0, 0)).unwrap();
    let expected = rules.mob_stats(1).unwrap();
    assert_eq!(mob.total_health(), expected.total_health);
    assert_eq!(mob.stats().hit, expected.hit);

    let fighters = fixtures::squad_of([(Position::new(0, 0), fighter)]);
    let outcome = Battle::new(fighters, mobs, &rules, ChaCha8Rng::seed_from_u64(1)).run();
    assert!(outcome.rounds >= 1 && outcome.rounds <= MAX_ROUNDS);
}

// ============================================================================
// Turn order
// ============================================================================

#[test]
fn test_higher_hit_always_acts_first() {
    let rules = fixtures::rules();
    let fighters = fixtures::full_template(3.0).build(&rules).unwrap();
    let mobs = Squad::mobs_for_level(200, &rules);
    let order = attack_order(&fighters, &mobs);

    assert_eq!(order.len(), 12);
    for pair in order.windows(2) {
        assert!(pair[0].hit >= pair[1].hit);
    }
}

// ============================================================================
// Class abilities
// ============================================================================

#[test]
fn test_shadow_dancer_double_damage_is_exact() {
    let rules = fixtures::rules();
    let mut plain_dancer = fixtures::fighter(FighterClass::ShadowDancer);
    let mut primed_dancer = fixtures::fighter(FighterClass::ShadowDancer);
    let mut attacker = fixtures::custom_mob(10_000.0, 50.0, 50.0, 50.0);

    // Prime one dancer by evading.
    let evade = resolve_attack(
        &mut attacker,
        &mut primed_dancer,
        PendingEffects::default(),
        0,
        &rules,
        &mut ScriptedRng::new([0.0]),
    );
    assert!(matches!(evade, AttackOutcome::Evaded { .. }));
    assert_eq!(primed_dancer.current_health(), primed_dancer.total_health());

    let mut target_a = fixtures::custom_mob(10_000.0, 0.0, 0.0, 50.0);
    let mut target_b = fixtures::custom_mob(10_000.0, 0.0, 0.0, 50.0);
    let plain = resolve_attack(
        &mut plain_dancer,
        &mut target_a,
        PendingEffects::default(),
        0,
        &rules,
        &mut ScriptedRng::new([0.2, 0.5]),
    );
    let doubled = resolve_attack(
        &mut primed_dancer,
        &mut target_b,
        PendingEffects::default(),
        0,
        &rules,
        &mut ScriptedRng::new([0.2, 0.5]),
    );
    assert_eq!(doubled.damage(), 2.0 * plain.damage());
    assert!(!primed_dancer.double_damage_pending());
}

#[test]
fn test_wounded_berserker_is_never_dodged() {
    let rules = fixtures::rules();
    let mut berserker = fixtures::fighter(FighterClass::Berserker);
    berserker.take_damage(berserker.total_health() * 0.9);
    let mut fighters = fixtures::squad_of([(Position::new(0, 0), berserker)]);
    let mut mobs = fixtures::squad_of([(
        Position::new(0, 0),
        fixtures::custom_mob(10_000.0, 0.0, 0.0, 1_000_000.0),
    )]);

    let mut log = EventLog::new(Verbosity::Summary);
    // Only the crit roll is drawn.
    let mut rng = ScriptedRng::new([0.99]);
    let mut ctx = TurnContext {
        rules: &rules,
        rng: &mut rng,
        log: &mut log,
    };
    let actor = SlotRef::new(Side::Fighters, Position::new(0, 0));
    assert_eq!(
        take_turn(&mut fighters, &mut mobs, actor, &mut ctx),
        TurnFlow::Continue
    );
    assert_eq!(rng.consumed(), 1);

    let mob = mobs.get(Position::new(0, 0)).unwrap();
    assert_eq!(mob.current_health(), 10_000.0 - 175.0);
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn test_seeded_batch_of_thousand_is_reproducible() {
    let rules = fixtures::rules();
    let template = fixtures::full_template(1.0);

    let first = run_seeded_batch(&template, 150, 1000, &rules, 2024, &CancelToken::new());
    let second = run_seeded_batch(&template, 150, 1000, &rules, 2024, &CancelToken::new());
    assert_eq!(first, second);
    assert_eq!(first.battles, 1000);
    assert_eq!(first.fighter_wins + first.mob_wins, 1000);

    let mut rng_a = ChaCha8Rng::seed_from_u64(9);
    let mut rng_b = ChaCha8Rng::seed_from_u64(9);
    let a = run_batch(&template, 150, 1000, &rules, &mut rng_a, &CancelToken::new());
    let b = run_batch(&template, 150, 1000, &rules, &mut rng_b, &CancelToken::new());
    assert_eq!(a.fighter_wins, b.fighter_wins);
}

#[test]
fn test_cancelled_batch_keeps_partial_results() {
    let rules = fixtures::rules();
    let template = fixtures::solo_template(FighterClass::Mage);
    let token = CancelToken::new();
    token.cancel();

    let stats = run_seeded_batch(&template, 10, 500, &rules, 1, &token);
    assert_eq!(stats.battles, 0);
    assert_eq!(stats.victory_chance(), 0.0);
}

#[test]
fn test_invalid_class_only_skips_its_battle() {
    let rules = fixtures::rules();
    let template = fixtures::solo_template(FighterClass::Hunter).with(
        Position::new(1, 0),
        dungeon_core::combatant::FighterSpec::new("Necromancer"),
    );
    let stats = run_seeded_batch(&template, 10, 25, &rules, 3, &CancelToken::new());
    assert_eq!(stats.failed_constructions, 25);
    assert_eq!(stats.battles, 0);
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_health_stays_in_bounds(
        template in arb_squad_template(),
        level in arb_mob_level(),
        seed in any::<u64>(),
    ) {
        let rules = fixtures::rules();
        let fighters = template.build(&rules).unwrap();
        let mobs = Squad::mobs_for_level(level, &rules);
        let mut battle = Battle::new(fighters, mobs, &rules, ChaCha8Rng::seed_from_u64(seed));

        while battle.play_round() == BattleStatus::Running {
            assert_health_bounds(battle.fighters());
            assert_health_bounds(battle.mobs());
        }
        assert_health_bounds(battle.fighters());
        assert_health_bounds(battle.mobs());
        prop_assert!(battle.rounds() <= MAX_ROUNDS);
    }

    #[test]
    fn prop_battle_terminates_with_consistent_outcome(
        template in arb_squad_template(),
        level in arb_mob_level(),
        seed in any::<u64>(),
    ) {
        let rules = fixtures::rules();
        let fighters = template.build(&rules).unwrap();
        let mobs = Squad::mobs_for_level(level, &rules);
        let outcome = Battle::new(fighters, mobs, &rules, ChaCha8Rng::seed_from_u64(seed)).run();

        prop_assert!(outcome.rounds >= 1 && outcome.rounds <= MAX_ROUNDS);
        match outcome.status {
            BattleStatus::FightersWin => {
                prop_assert_eq!(outcome.winner, Side::Fighters);
                prop_assert_eq!(outcome.mobs_remaining_health, 0.0);
            }
            BattleStatus::MobsWin => prop_assert_eq!(outcome.winner, Side::Mobs),
            BattleStatus::Exhausted => {
                prop_assert_eq!(outcome.winner, Side::Mobs);
                prop_assert_eq!(outcome.rounds, MAX_ROUNDS);
                prop_assert_eq!(outcome.message.as_str(), "exhaustion");
            }
            BattleStatus::Running => prop_assert!(false, "battle still running"),
        }
    }

    #[test]
    fn prop_turn_order_is_sorted(
        template in arb_squad_template(),
        level in arb_mob_level(),
    ) {
        let rules = fixtures::rules();
        let fighters = template.build(&rules).unwrap();
        let mobs = Squad::mobs_for_level(level, &rules);
        let order = attack_order(&fighters, &mobs);
        for pair in order.windows(2) {
            prop_assert!(pair[0].hit >= pair[1].hit);
            if pair[0].hit == pair[1].hit {
                prop_assert!(
                    (pair[0].position.col, pair[0].position.row)
                        <= (pair[1].position.col, pair[1].position.row)
                );
            }
        }
    }
}
