//! Test fixtures and helpers.
//!
//! Pre-built fighters, squads and balance rules for consistent testing.

use dungeon_core::balance::BalanceConfig;
use dungeon_core::class::FighterClass;
use dungeon_core::combatant::{Combatant, CombatantKind, FighterSpec};
use dungeon_core::squad::{Position, Squad, SquadTemplate};
use dungeon_core::stats::{Allocation, DerivedStats};

/// The shipped balance rules.
#[must_use]
pub fn rules() -> BalanceConfig {
    BalanceConfig::default()
}

/// A fighter recipe of `class` with no points spent.
#[must_use]
pub fn spec(class: FighterClass) -> FighterSpec {
    FighterSpec::new(class.name())
}

/// A fighter recipe with the same number of points in every stat.
#[must_use]
pub fn trained_spec(class: FighterClass, points: f64) -> FighterSpec {
    spec(class).with_allocation(Allocation {
        health: points,
        damage: points,
        hit: points,
        defense: points,
        crit: points,
        dodge: points,
    })
}

/// Build a fighter of `class` with no points spent.
///
/// # Panics
///
/// Never for a [`FighterClass`], whose names always parse.
#[must_use]
pub fn fighter(class: FighterClass) -> Combatant {
    Combatant::fighter(&spec(class), &rules()).expect("class names always parse")
}

/// A mob with hand-picked stats.
#[must_use]
pub fn custom_mob(total_health: f64, damage: f64, hit: f64, dodge: f64) -> Combatant {
    Combatant::from_stats(
        CombatantKind::Mob {
            mob_class: "Dummy".to_string(),
            level: 1,
        },
        DerivedStats {
            total_health,
            damage,
            hit,
            defense: 0.0,
            defense_points: 0.0,
            flat_defense: 0.0,
            crit: 0.0,
            dodge,
        },
    )
}

/// A squad holding `units` at the given positions.
#[must_use]
pub fn squad_of(units: impl IntoIterator<Item = (Position, Combatant)>) -> Squad {
    let mut squad = Squad::new();
    for (position, unit) in units {
        squad.place(position, unit);
    }
    squad
}

/// One untrained fighter of `class` in the top front slot.
#[must_use]
pub fn solo_template(class: FighterClass) -> SquadTemplate {
    SquadTemplate::new().with(Position::new(0, 0), spec(class))
}

/// A balanced six-fighter template with `points` in every stat.
#[must_use]
pub fn full_template(points: f64) -> SquadTemplate {
    SquadTemplate::new()
        .with(Position::new(0, 0), trained_spec(FighterClass::Bastion, points))
        .with(Position::new(1, 0), trained_spec(FighterClass::Berserker, points))
        .with(Position::new(2, 0), trained_spec(FighterClass::Sentinel, points))
        .with(Position::new(0, 1), trained_spec(FighterClass::Priest, points))
        .with(Position::new(1, 1), trained_spec(FighterClass::Mage, points))
        .with(Position::new(2, 1), trained_spec(FighterClass::Hunter, points))
}
