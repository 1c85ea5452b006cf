//! Class abilities.
//!
//! Each living unit's turn goes through [`take_turn`]. Fighters dispatch on
//! their [`FighterClass`]; mobs have no class of their own but their attacks
//! are shaped by the defending squad (Sentinel, Paladin, Bastion).
//!
//! The targeting helpers are pure functions over a [`Squad`] so they can be
//! tested without running a battle.

use rand::Rng;

use crate::attack::{crusader_boost, resolve_attack, AttackOutcome, PendingEffects};
use crate::balance::StatRules;
use crate::class::FighterClass;
use crate::events::{Ability, BattleEvent, EventLog, RollKind, SlotRef};
use crate::squad::{Position, Side, Squad, BACK_FIRST_ORDER, COLS, ROWS, ROW_MAJOR_ORDER};

/// Chance that a Brawler attacks twice.
pub const BRAWLER_CHANCE: f64 = 0.15;

/// Chance that a Priest revives a fallen ally.
pub const PRIEST_CHANCE: f64 = 0.1;

/// Hunter damage multiplier per volley target.
pub const HUNTER_MULTIPLIER: f64 = 0.75;

/// Mage damage multiplier per blast target.
pub const MAGE_MULTIPLIER: f64 = 0.5;

/// Health ratio below which a Sentinel steps in.
pub const SENTINEL_THRESHOLD: f64 = 0.25;

/// Whether a turn let the round continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnFlow {
    /// Keep going.
    Continue,
    /// An attack found no living target; the battle ends.
    OutOfTargets,
}

/// Shared state a turn needs besides the two squads.
pub struct TurnContext<'a, R: ?Sized> {
    /// Stat rules for Crusader defense rescaling.
    pub rules: &'a dyn StatRules,
    /// Random source.
    pub rng: &'a mut R,
    /// Event sink.
    pub log: &'a mut EventLog,
}

// ============================================================================
// Targeting
// ============================================================================

/// Assassin target: first living unit, back column first.
#[must_use]
pub fn assassin_target(opponents: &Squad) -> Option<Position> {
    opponents.first_alive(&BACK_FIRST_ORDER)
}

/// Hunter targets: living slots of the first row holding any living unit.
#[must_use]
pub fn hunter_targets(opponents: &Squad) -> Option<(usize, Vec<Position>)> {
    (0..ROWS).find_map(|row| {
        let targets: Vec<Position> = (0..COLS)
            .map(|col| Position::new(row, col))
            .filter(|pos| opponents.alive_at(*pos).is_some())
            .collect();
        (!targets.is_empty()).then_some((row, targets))
    })
}

/// Mage targets: living slots of the first column holding any living unit.
#[must_use]
pub fn mage_targets(opponents: &Squad) -> Option<(usize, Vec<Position>)> {
    (0..COLS).find_map(|col| {
        let targets: Vec<Position> = (0..ROWS)
            .map(|row| Position::new(row, col))
            .filter(|pos| opponents.alive_at(*pos).is_some())
            .collect();
        (!targets.is_empty()).then_some((col, targets))
    })
}

/// Sentinel redirect for an attack on `target`.
///
/// Returns the first living Sentinel in row-major order when `target` is
/// below a quarter of its health.
#[must_use]
pub fn sentinel_redirect(fighters: &Squad, target: Position) -> Option<Position> {
    let defender = fighters.alive_at(target)?;
    if defender.health_ratio() >= SENTINEL_THRESHOLD {
        return None;
    }
    ROW_MAJOR_ORDER.into_iter().find(|pos| {
        fighters
            .alive_at(*pos)
            .is_some_and(|c| c.is_class(FighterClass::Sentinel))
    })
}

/// The living Paladin whose aura protects `target` from a mob attacking out
/// of column `mob_col`.
///
/// The aura keys on the attacking mob's column index and never covers a
/// Paladin target.
#[must_use]
pub fn covering_paladin(fighters: &Squad, target: Position, mob_col: usize) -> Option<Position> {
    let target_is_paladin = fighters
        .get(target)
        .is_some_and(|c| c.is_class(FighterClass::Paladin));
    if target_is_paladin {
        return None;
    }
    (0..ROWS).map(|row| Position::new(row, mob_col)).find(|pos| {
        fighters
            .alive_at(*pos)
            .is_some_and(|c| c.is_class(FighterClass::Paladin))
    })
}

/// Whether a Paladin aura protects `target`; see [`covering_paladin`].
#[must_use]
pub fn paladin_covers(fighters: &Squad, target: Position, mob_col: usize) -> bool {
    covering_paladin(fighters, target, mob_col).is_some()
}

/// Whether a living Bastion stands orthogonally next to `target`.
#[must_use]
pub fn bastion_covers(fighters: &Squad, target: Position) -> bool {
    target.adjacent().any(|pos| {
        fighters
            .alive_at(pos)
            .is_some_and(|c| c.is_class(FighterClass::Bastion))
    })
}

/// Berserker damage multiplier and unavoidability for a health ratio.
#[must_use]
pub fn berserker_profile(health_ratio: f64) -> (f64, bool) {
    if health_ratio >= 0.75 {
        (1.0, false)
    } else if health_ratio >= 0.5 {
        (1.25, false)
    } else if health_ratio >= 0.25 {
        (1.5, false)
    } else {
        (1.75, true)
    }
}

// ============================================================================
// Turns
// ============================================================================

/// Resolve one attack between two slots on opposite sides and record it.
///
/// Returns `None` when either slot is empty.
pub fn strike<R: Rng + ?Sized>(
    fighters: &mut Squad,
    mobs: &mut Squad,
    attacker: SlotRef,
    target: Position,
    effects: PendingEffects,
    ctx: &mut TurnContext<'_, R>,
) -> Option<AttackOutcome> {
    let dead_allies = fighters.dead_positions().len();
    let (attacking, defending) = match attacker.side {
        Side::Fighters => (fighters.get_mut(attacker.position)?, mobs.get_mut(target)?),
        Side::Mobs => (mobs.get_mut(attacker.position)?, fighters.get_mut(target)?),
    };

    let crusader_involved =
        attacking.is_class(FighterClass::Crusader) || defending.is_class(FighterClass::Crusader);
    if crusader_involved && dead_allies > 0 {
        let source = if attacking.is_class(FighterClass::Crusader) {
            attacker
        } else {
            SlotRef::new(Side::Fighters, target)
        };
        ctx.log.summary(|| BattleEvent::AbilityTriggered {
            source,
            ability: Ability::Zeal {
                boost: crusader_boost(dead_allies),
            },
        });
    }

    let outcome = resolve_attack(
        attacking,
        defending,
        effects,
        dead_allies,
        ctx.rules,
        &mut *ctx.rng,
    );
    ctx.log.attack(
        attacker,
        SlotRef::new(attacker.side.opponent(), target),
        outcome,
    );
    Some(outcome)
}

fn standard_attack<R: Rng + ?Sized>(
    fighters: &mut Squad,
    mobs: &mut Squad,
    actor: SlotRef,
    target: Position,
    effects: PendingEffects,
    ctx: &mut TurnContext<'_, R>,
) -> TurnFlow {
    match strike(fighters, mobs, actor, target, effects, ctx) {
        Some(_) => TurnFlow::Continue,
        None => TurnFlow::OutOfTargets,
    }
}

/// Play the turn of the living unit at `actor`.
///
/// The caller has already checked that the opposing squad has a default
/// target and that the actor is alive.
pub fn take_turn<R: Rng + ?Sized>(
    fighters: &mut Squad,
    mobs: &mut Squad,
    actor: SlotRef,
    ctx: &mut TurnContext<'_, R>,
) -> TurnFlow {
    match actor.side {
        Side::Fighters => fighter_turn(fighters, mobs, actor, ctx),
        Side::Mobs => mob_turn(fighters, mobs, actor, ctx),
    }
}

fn fighter_turn<R: Rng + ?Sized>(
    fighters: &mut Squad,
    mobs: &mut Squad,
    actor: SlotRef,
    ctx: &mut TurnContext<'_, R>,
) -> TurnFlow {
    let Some(unit) = fighters.alive_at(actor.position) else {
        return TurnFlow::Continue;
    };
    let Some(class) = unit.class() else {
        return TurnFlow::Continue;
    };
    let health_ratio = unit.health_ratio();
    let Some(default_target) = mobs.default_target() else {
        return TurnFlow::OutOfTargets;
    };

    match class {
        FighterClass::Assassin => {
            let Some(target) = assassin_target(mobs) else {
                return TurnFlow::OutOfTargets;
            };
            if target != default_target {
                ctx.log.summary(|| BattleEvent::AbilityTriggered {
                    source: actor,
                    ability: Ability::Assassinate,
                });
            }
            standard_attack(fighters, mobs, actor, target, PendingEffects::default(), ctx)
        }
        FighterClass::Brawler => {
            let roll: f64 = ctx.rng.gen();
            ctx.log.roll(RollKind::Flurry, roll);
            if roll >= BRAWLER_CHANCE {
                return standard_attack(
                    fighters,
                    mobs,
                    actor,
                    default_target,
                    PendingEffects::default(),
                    ctx,
                );
            }
            ctx.log.summary(|| BattleEvent::AbilityTriggered {
                source: actor,
                ability: Ability::Flurry,
            });
            if strike(fighters, mobs, actor, default_target, PendingEffects::default(), ctx)
                .is_none()
            {
                return TurnFlow::OutOfTargets;
            }
            let Some(second) = mobs.default_target() else {
                return TurnFlow::OutOfTargets;
            };
            standard_attack(fighters, mobs, actor, second, PendingEffects::default(), ctx)
        }
        FighterClass::Hunter => {
            let Some((row, targets)) = hunter_targets(mobs) else {
                return TurnFlow::OutOfTargets;
            };
            ctx.log.summary(|| BattleEvent::AbilityTriggered {
                source: actor,
                ability: Ability::Volley { row },
            });
            for target in targets {
                let effects = PendingEffects::with_multiplier(HUNTER_MULTIPLIER);
                strike(fighters, mobs, actor, target, effects, ctx);
            }
            TurnFlow::Continue
        }
        FighterClass::Mage => {
            let Some((col, targets)) = mage_targets(mobs) else {
                return TurnFlow::OutOfTargets;
            };
            ctx.log.summary(|| BattleEvent::AbilityTriggered {
                source: actor,
                ability: Ability::Blast { col },
            });
            for target in targets {
                let effects = PendingEffects::with_multiplier(MAGE_MULTIPLIER);
                strike(fighters, mobs, actor, target, effects, ctx);
            }
            TurnFlow::Continue
        }
        FighterClass::Priest => {
            try_revive(fighters, actor, ctx);
            standard_attack(
                fighters,
                mobs,
                actor,
                default_target,
                PendingEffects::default(),
                ctx,
            )
        }
        FighterClass::Berserker => {
            let (multiplier, unavoidable) = berserker_profile(health_ratio);
            if multiplier > 1.0 {
                ctx.log.summary(|| BattleEvent::AbilityTriggered {
                    source: actor,
                    ability: Ability::Fury {
                        multiplier,
                        unavoidable,
                    },
                });
            }
            let effects = PendingEffects {
                damage_multiplier: multiplier,
                unavoidable,
                ..Default::default()
            };
            standard_attack(fighters, mobs, actor, default_target, effects, ctx)
        }
        FighterClass::ShadowDancer
        | FighterClass::Crusader
        | FighterClass::Sentinel
        | FighterClass::Paladin
        | FighterClass::Bastion
        | FighterClass::NoClass => standard_attack(
            fighters,
            mobs,
            actor,
            default_target,
            PendingEffects::default(),
            ctx,
        ),
    }
}

fn try_revive<R: Rng + ?Sized>(
    fighters: &mut Squad,
    priest: SlotRef,
    ctx: &mut TurnContext<'_, R>,
) {
    let dead = fighters.dead_positions();
    if dead.is_empty() {
        return;
    }
    let chance: f64 = ctx.rng.gen();
    ctx.log.roll(RollKind::ReviveChance, chance);
    if chance >= PRIEST_CHANCE {
        return;
    }
    let pick: f64 = ctx.rng.gen();
    ctx.log.roll(RollKind::RevivePick, pick);
    let index = ((pick * dead.len() as f64).floor() as usize).min(dead.len() - 1);
    let position = dead[index];
    if let Some(unit) = fighters.get_mut(position) {
        unit.restore();
        tracing::debug!(%position, label = %unit.label(), "Priest revived ally");
        ctx.log.summary(|| BattleEvent::Revived {
            priest,
            target: SlotRef::new(Side::Fighters, position),
        });
    }
}

fn mob_turn<R: Rng + ?Sized>(
    fighters: &mut Squad,
    mobs: &mut Squad,
    actor: SlotRef,
    ctx: &mut TurnContext<'_, R>,
) -> TurnFlow {
    let Some(default_target) = fighters.default_target() else {
        return TurnFlow::OutOfTargets;
    };

    let mut effects = PendingEffects::default();
    if let Some(paladin) = covering_paladin(fighters, default_target, actor.position.col) {
        effects.paladin_aura = true;
        ctx.log.summary(|| BattleEvent::AbilityTriggered {
            source: SlotRef::new(Side::Fighters, paladin),
            ability: Ability::PaladinAura,
        });
    }

    let target = match sentinel_redirect(fighters, default_target) {
        Some(sentinel) if sentinel != default_target => {
            ctx.log.summary(|| BattleEvent::AbilityTriggered {
                source: SlotRef::new(Side::Fighters, sentinel),
                ability: Ability::Guard {
                    from: default_target,
                },
            });
            sentinel
        }
        _ => default_target,
    };

    if bastion_covers(fighters, target) {
        effects.bastion_aura = true;
        ctx.log.summary(|| BattleEvent::AbilityTriggered {
            source: SlotRef::new(Side::Fighters, target),
            ability: Ability::BastionAura,
        });
    }

    standard_attack(fighters, mobs, actor, target, effects, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::BalanceConfig;
    use crate::combatant::{Combatant, FighterSpec};
    use dungeon_test_utils::rng::ScriptedRng;

    fn fighter(class: &str) -> Combatant {
        Combatant::fighter(&FighterSpec::new(class), &BalanceConfig::default()).unwrap()
    }

    fn mob() -> Combatant {
        Combatant::mob(10, &BalanceConfig::default()).unwrap()
    }

    fn dead(mut unit: Combatant) -> Combatant {
        unit.take_damage(f64::MAX);
        unit
    }

    fn squad(units: Vec<(Position, Combatant)>) -> Squad {
        let mut squad = Squad::new();
        for (pos, unit) in units {
            squad.place(pos, unit);
        }
        squad
    }

    // ========================================================================
    // Targeting helpers
    // ========================================================================

    #[test]
    fn test_assassin_prefers_back_column() {
        let mobs = squad(vec![
            (Position::new(0, 0), mob()),
            (Position::new(2, 1), mob()),
        ]);
        assert_eq!(assassin_target(&mobs), Some(Position::new(2, 1)));

        let front_only = squad(vec![(Position::new(1, 0), mob())]);
        assert_eq!(assassin_target(&front_only), Some(Position::new(1, 0)));
    }

    #[test]
    fn test_hunter_picks_first_living_row() {
        let mobs = squad(vec![
            (Position::new(0, 0), dead(mob())),
            (Position::new(1, 1), mob()),
            (Position::new(2, 0), mob()),
        ]);
        assert_eq!(hunter_targets(&mobs), Some((1, vec![Position::new(1, 1)])));
        assert_eq!(hunter_targets(&Squad::new()), None);
    }

    #[test]
    fn test_mage_picks_first_living_column() {
        let mobs = squad(vec![
            (Position::new(0, 0), dead(mob())),
            (Position::new(0, 1), mob()),
            (Position::new(2, 1), mob()),
        ]);
        assert_eq!(
            mage_targets(&mobs),
            Some((1, vec![Position::new(0, 1), Position::new(2, 1)]))
        );
    }

    #[test]
    fn test_sentinel_redirect() {
        let mut weak = fighter("Mage");
        weak.take_damage(400.0);
        let fighters = squad(vec![
            (Position::new(0, 0), weak),
            (Position::new(1, 1), fighter("Sentinel")),
            (Position::new(2, 0), fighter("Sentinel")),
        ]);
        // Row-major: (1,1) comes before (2,0).
        assert_eq!(
            sentinel_redirect(&fighters, Position::new(0, 0)),
            Some(Position::new(1, 1))
        );

        let healthy = squad(vec![
            (Position::new(0, 0), fighter("Mage")),
            (Position::new(1, 1), fighter("Sentinel")),
        ]);
        assert_eq!(sentinel_redirect(&healthy, Position::new(0, 0)), None);
    }

    #[test]
    fn test_paladin_aura_keys_on_mob_column() {
        let fighters = squad(vec![
            (Position::new(0, 0), fighter("Hunter")),
            (Position::new(2, 1), fighter("Paladin")),
        ]);
        assert!(paladin_covers(&fighters, Position::new(0, 0), 1));
        assert!(!paladin_covers(&fighters, Position::new(0, 0), 0));
        assert!(!paladin_covers(&fighters, Position::new(2, 1), 1));
        assert_eq!(
            covering_paladin(&fighters, Position::new(0, 0), 1),
            Some(Position::new(2, 1))
        );

        let fallen = squad(vec![
            (Position::new(0, 0), fighter("Hunter")),
            (Position::new(2, 1), dead(fighter("Paladin"))),
        ]);
        assert!(!paladin_covers(&fallen, Position::new(0, 0), 1));
    }

    #[test]
    fn test_bastion_adjacency() {
        let fighters = squad(vec![
            (Position::new(1, 0), fighter("Bastion")),
            (Position::new(0, 0), fighter("Priest")),
            (Position::new(2, 1), fighter("Priest")),
        ]);
        assert!(bastion_covers(&fighters, Position::new(0, 0)));
        assert!(bastion_covers(&fighters, Position::new(1, 1)));
        assert!(!bastion_covers(&fighters, Position::new(2, 1)));
        assert!(!bastion_covers(&fighters, Position::new(1, 0)));
    }

    #[test]
    fn test_berserker_brackets() {
        assert_eq!(berserker_profile(1.0), (1.0, false));
        assert_eq!(berserker_profile(0.75), (1.0, false));
        assert_eq!(berserker_profile(0.6), (1.25, false));
        assert_eq!(berserker_profile(0.5), (1.25, false));
        assert_eq!(berserker_profile(0.3), (1.5, false));
        assert_eq!(berserker_profile(0.1), (1.75, true));
    }

    // ========================================================================
    // Turns
    // ========================================================================

    #[test]
    fn test_priest_revives_and_attacks() {
        let rules = BalanceConfig::default();
        let mut fallen = fighter("Hunter");
        for _ in 0..3 {
            fallen.record_hit();
        }
        fallen.take_damage(f64::MAX);
        let mut fighters = squad(vec![
            (Position::new(0, 0), fallen),
            (Position::new(1, 0), fighter("Priest")),
        ]);
        let mut mobs = squad(vec![(Position::new(0, 0), mob())]);
        let mut log = EventLog::new(crate::events::Verbosity::Summary);
        // revive chance, revive pick, hit roll (miss)
        let mut rng = ScriptedRng::new([0.05, 0.0, 0.999]);
        let mut ctx = TurnContext {
            rules: &rules,
            rng: &mut rng,
            log: &mut log,
        };

        let priest = SlotRef::new(Side::Fighters, Position::new(1, 0));
        let flow = take_turn(&mut fighters, &mut mobs, priest, &mut ctx);
        assert_eq!(flow, TurnFlow::Continue);

        let revived = fighters.get(Position::new(0, 0)).unwrap();
        assert_eq!(revived.current_health(), revived.total_health());
        assert_eq!(revived.hit_counter(), 0);
        assert!(fighters.dead_positions().is_empty());
        assert!(log.events().iter().any(|e| matches!(e, BattleEvent::Revived { .. })));
    }

    #[test]
    fn test_hunter_volley_hits_whole_row() {
        let rules = BalanceConfig::default();
        let mut fighters = squad(vec![(Position::new(0, 0), fighter("Hunter"))]);
        let mut mobs = squad(vec![
            (Position::new(1, 0), mob()),
            (Position::new(1, 1), mob()),
            (Position::new(2, 0), mob()),
        ]);
        let mut log = EventLog::default();
        // two attacks: hit + crit roll each
        let mut rng = ScriptedRng::new([0.0, 0.9, 0.0, 0.9]);
        let mut ctx = TurnContext {
            rules: &rules,
            rng: &mut rng,
            log: &mut log,
        };

        let hunter = SlotRef::new(Side::Fighters, Position::new(0, 0));
        take_turn(&mut fighters, &mut mobs, hunter, &mut ctx);

        let full = mob().total_health();
        assert!(mobs.get(Position::new(1, 0)).unwrap().current_health() < full);
        assert!(mobs.get(Position::new(1, 1)).unwrap().current_health() < full);
        assert_eq!(mobs.get(Position::new(2, 0)).unwrap().current_health(), full);
        assert_eq!(fighters.get(Position::new(0, 0)).unwrap().hit_counter(), 2);
    }

    fn expected_damage(attacker_damage: f64, defense: f64, effects: PendingEffects) -> f64 {
        ((1.0 - defense) * (1.0 - effects.damage_reduction()) * attacker_damage
            * effects.damage_multiplier)
            .floor()
    }

    fn hit_reports(log: &EventLog) -> Vec<(SlotRef, crate::attack::HitReport)> {
        log.events()
            .iter()
            .filter_map(|e| match e {
                BattleEvent::Attack {
                    target,
                    outcome: AttackOutcome::Hit(report),
                    ..
                } => Some((*target, *report)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_assassin_strikes_back_column() {
        let rules = BalanceConfig::default();
        let mut fighters = squad(vec![(Position::new(0, 0), fighter("Assassin"))]);
        let mut mobs = squad(vec![
            (Position::new(0, 0), mob()),
            (Position::new(1, 1), mob()),
        ]);
        let mut log = EventLog::new(crate::events::Verbosity::Summary);
        let mut rng = ScriptedRng::new([0.0, 0.9]);
        let mut ctx = TurnContext {
            rules: &rules,
            rng: &mut rng,
            log: &mut log,
        };

        let assassin = SlotRef::new(Side::Fighters, Position::new(0, 0));
        let flow = take_turn(&mut fighters, &mut mobs, assassin, &mut ctx);
        assert_eq!(flow, TurnFlow::Continue);

        let full = mob().total_health();
        assert_eq!(mobs.get(Position::new(0, 0)).unwrap().current_health(), full);
        assert!(mobs.get(Position::new(1, 1)).unwrap().current_health() < full);
        assert!(matches!(
            log.events()[0],
            BattleEvent::AbilityTriggered {
                ability: Ability::Assassinate,
                ..
            }
        ));
        let hits = hit_reports(&log);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, SlotRef::new(Side::Mobs, Position::new(1, 1)));
    }

    #[test]
    fn test_mage_blast_hits_first_living_column() {
        let rules = BalanceConfig::default();
        let mut fighters = squad(vec![(Position::new(1, 1), fighter("Mage"))]);
        let mut mobs = squad(vec![
            (Position::new(0, 0), dead(mob())),
            (Position::new(1, 0), mob()),
            (Position::new(2, 0), mob()),
            (Position::new(0, 1), mob()),
        ]);
        let mut log = EventLog::new(crate::events::Verbosity::Summary);
        // two attacks: hit + crit roll each
        let mut rng = ScriptedRng::new([0.0, 0.9, 0.0, 0.9]);
        let mut ctx = TurnContext {
            rules: &rules,
            rng: &mut rng,
            log: &mut log,
        };

        let mage = SlotRef::new(Side::Fighters, Position::new(1, 1));
        take_turn(&mut fighters, &mut mobs, mage, &mut ctx);
        assert_eq!(rng.remaining(), 0);

        let mage_damage = fighters.get(Position::new(1, 1)).unwrap().stats().damage;
        let target = mob();
        let expected = expected_damage(
            mage_damage,
            target.stats().defense,
            PendingEffects::with_multiplier(MAGE_MULTIPLIER),
        );
        let full = target.total_health();
        for pos in [Position::new(1, 0), Position::new(2, 0)] {
            assert_eq!(mobs.get(pos).unwrap().current_health(), full - expected);
        }
        assert_eq!(mobs.get(Position::new(0, 1)).unwrap().current_health(), full);
        assert_eq!(mobs.get(Position::new(0, 0)).unwrap().current_health(), 0.0);
        assert_eq!(fighters.get(Position::new(1, 1)).unwrap().hit_counter(), 2);

        let struck: Vec<SlotRef> = hit_reports(&log).into_iter().map(|(slot, _)| slot).collect();
        assert_eq!(
            struck,
            vec![
                SlotRef::new(Side::Mobs, Position::new(1, 0)),
                SlotRef::new(Side::Mobs, Position::new(2, 0)),
            ]
        );
    }

    #[test]
    fn test_crusader_counts_fallen_allies_at_strike() {
        let rules = BalanceConfig::default();
        let mut fighters = squad(vec![
            (Position::new(0, 0), fighter("Crusader")),
            (Position::new(1, 0), dead(fighter("Hunter"))),
            (Position::new(2, 0), dead(fighter("Priest"))),
        ]);
        let mut mobs = squad(vec![(Position::new(0, 0), mob())]);
        let mut log = EventLog::new(crate::events::Verbosity::Summary);
        let mut rng = ScriptedRng::new([0.0, 0.9]);
        let mut ctx = TurnContext {
            rules: &rules,
            rng: &mut rng,
            log: &mut log,
        };

        let crusader = SlotRef::new(Side::Fighters, Position::new(0, 0));
        take_turn(&mut fighters, &mut mobs, crusader, &mut ctx);

        let boost = crusader_boost(2);
        assert!(log.events().iter().any(|e| matches!(
            e,
            BattleEvent::AbilityTriggered {
                ability: Ability::Zeal { boost: b },
                ..
            } if *b == boost
        )));

        let stats = *fighters.get(Position::new(0, 0)).unwrap().stats();
        let target = mob();
        let hits = hit_reports(&log);
        assert_eq!(hits.len(), 1);
        let report = hits[0].1;
        assert_eq!(
            report.chance,
            crate::attack::hit_chance(stats.hit * boost, target.stats().dodge)
        );
        assert_eq!(
            report.damage,
            expected_damage(stats.damage * boost, target.stats().defense, PendingEffects::default())
        );
    }

    #[test]
    fn test_mob_turn_paladin_then_sentinel_then_bastion() {
        let rules = BalanceConfig::default();
        let mut wounded = fighter("Mage");
        wounded.take_damage(450.0);
        let mut fighters = squad(vec![
            (Position::new(0, 0), wounded),
            (Position::new(0, 1), fighter("Sentinel")),
            (Position::new(1, 1), fighter("Bastion")),
            (Position::new(2, 0), fighter("Paladin")),
        ]);
        let attacker_mob = Combatant::mob(40, &rules).unwrap();
        let mob_damage = attacker_mob.stats().damage;
        let mut mobs = squad(vec![(Position::new(0, 0), attacker_mob)]);
        let mut log = EventLog::new(crate::events::Verbosity::Summary);
        let mut rng = ScriptedRng::new([0.0, 0.9]);
        let mut ctx = TurnContext {
            rules: &rules,
            rng: &mut rng,
            log: &mut log,
        };

        let attacker = SlotRef::new(Side::Mobs, Position::new(0, 0));
        take_turn(&mut fighters, &mut mobs, attacker, &mut ctx);

        let abilities: Vec<(SlotRef, Ability)> = log
            .events()
            .iter()
            .filter_map(|e| match e {
                BattleEvent::AbilityTriggered { source, ability } => Some((*source, *ability)),
                _ => None,
            })
            .collect();
        assert_eq!(
            abilities,
            vec![
                (
                    SlotRef::new(Side::Fighters, Position::new(2, 0)),
                    Ability::PaladinAura
                ),
                (
                    SlotRef::new(Side::Fighters, Position::new(0, 1)),
                    Ability::Guard {
                        from: Position::new(0, 0)
                    }
                ),
                (
                    SlotRef::new(Side::Fighters, Position::new(0, 1)),
                    Ability::BastionAura
                ),
            ]
        );

        let hits = hit_reports(&log);
        assert_eq!(hits.len(), 1);
        let (target, report) = hits[0];
        assert_eq!(target, SlotRef::new(Side::Fighters, Position::new(0, 1)));
        assert!((report.damage_reduction - 0.4).abs() < 1e-12);

        let effects = PendingEffects {
            paladin_aura: true,
            bastion_aura: true,
            ..Default::default()
        };
        let sentinel = fighters.get(Position::new(0, 1)).unwrap();
        let expected = expected_damage(mob_damage, sentinel.stats().defense, effects);
        assert_eq!(report.damage, expected);
        assert_eq!(sentinel.current_health(), sentinel.total_health() - expected);
        assert_eq!(fighters.get(Position::new(0, 0)).unwrap().current_health(), 50.0);
    }

    #[test]
    fn test_mob_turn_paladin_in_other_column() {
        let rules = BalanceConfig::default();
        let mut wounded = fighter("Mage");
        wounded.take_damage(450.0);
        let mut fighters = squad(vec![
            (Position::new(0, 0), wounded),
            (Position::new(0, 1), fighter("Sentinel")),
            (Position::new(1, 1), fighter("Bastion")),
            (Position::new(2, 1), fighter("Paladin")),
        ]);
        let mut mobs = squad(vec![(Position::new(0, 0), Combatant::mob(40, &rules).unwrap())]);
        let mut log = EventLog::new(crate::events::Verbosity::Summary);
        let mut rng = ScriptedRng::new([0.0, 0.9]);
        let mut ctx = TurnContext {
            rules: &rules,
            rng: &mut rng,
            log: &mut log,
        };

        let attacker = SlotRef::new(Side::Mobs, Position::new(0, 0));
        take_turn(&mut fighters, &mut mobs, attacker, &mut ctx);

        assert!(!log.events().iter().any(|e| matches!(
            e,
            BattleEvent::AbilityTriggered {
                ability: Ability::PaladinAura,
                ..
            }
        )));
        let hits = hit_reports(&log);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, SlotRef::new(Side::Fighters, Position::new(0, 1)));
        assert!((hits[0].1.damage_reduction - 0.25).abs() < 1e-12);
        assert_eq!(fighters.get(Position::new(0, 0)).unwrap().current_health(), 50.0);
    }

    #[test]
    fn test_sentinel_takes_hit_for_weak_ally() {
        let rules = BalanceConfig::default();
        let mut weak = fighter("Mage");
        weak.take_damage(450.0);
        let mut fighters = squad(vec![
            (Position::new(0, 0), weak),
            (Position::new(0, 1), fighter("Sentinel")),
        ]);
        let mut mobs = squad(vec![(Position::new(0, 0), mob())]);
        let mut log = EventLog::default();
        let mut rng = ScriptedRng::new([0.0, 0.9]);
        let mut ctx = TurnContext {
            rules: &rules,
            rng: &mut rng,
            log: &mut log,
        };

        let attacker = SlotRef::new(Side::Mobs, Position::new(0, 0));
        take_turn(&mut fighters, &mut mobs, attacker, &mut ctx);

        assert_eq!(fighters.get(Position::new(0, 0)).unwrap().current_health(), 50.0);
        let sentinel = fighters.get(Position::new(0, 1)).unwrap();
        assert!(sentinel.current_health() < sentinel.total_health());
    }

    #[test]
    fn test_brawler_flurry_retargets() {
        let rules = BalanceConfig::default();
        let mut fighters = squad(vec![(Position::new(0, 0), fighter("Brawler"))]);
        let mut almost_dead = mob();
        almost_dead.take_damage(almost_dead.total_health() - 1.0);
        let mut mobs = squad(vec![
            (Position::new(0, 0), almost_dead),
            (Position::new(1, 0), mob()),
        ]);
        let mut log = EventLog::default();
        // flurry roll, then hit + crit for both attacks
        let mut rng = ScriptedRng::new([0.1, 0.0, 0.9, 0.0, 0.9]);
        let mut ctx = TurnContext {
            rules: &rules,
            rng: &mut rng,
            log: &mut log,
        };

        let brawler = SlotRef::new(Side::Fighters, Position::new(0, 0));
        let flow = take_turn(&mut fighters, &mut mobs, brawler, &mut ctx);
        assert_eq!(flow, TurnFlow::Continue);
        assert!(!mobs.get(Position::new(0, 0)).unwrap().is_alive());
        let second = mobs.get(Position::new(1, 0)).unwrap();
        assert!(second.current_health() < second.total_health());
    }

    #[test]
    fn test_brawler_flurry_out_of_targets() {
        let rules = BalanceConfig::default();
        let mut fighters = squad(vec![(Position::new(0, 0), fighter("Brawler"))]);
        let mut almost_dead = mob();
        almost_dead.take_damage(almost_dead.total_health() - 1.0);
        let mut mobs = squad(vec![(Position::new(0, 0), almost_dead)]);
        let mut log = EventLog::default();
        let mut rng = ScriptedRng::new([0.1, 0.0, 0.9]);
        let mut ctx = TurnContext {
            rules: &rules,
            rng: &mut rng,
            log: &mut log,
        };

        let brawler = SlotRef::new(Side::Fighters, Position::new(0, 0));
        let flow = take_turn(&mut fighters, &mut mobs, brawler, &mut ctx);
        assert_eq!(flow, TurnFlow::OutOfTargets);
    }
}
