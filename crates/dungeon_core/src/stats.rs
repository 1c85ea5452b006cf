//! Stat formulas.
//!
//! Fighters derive their combat attributes from allocation points (spent by
//! the player) and flat equipment bonuses:
//!
//! ```text
//! total_health = ceil(500 + 100 * health_points) + equipment.health
//! damage       = ceil(100 + 25 * damage_points)  + equipment.damage
//! hit          = ceil(50 + 50 * hit_points)      + equipment.hit
//! defense      = DefenseTransform(25 + 10 * defense_points, equipment.defense)
//! crit         = (0.25 * crit_points + equipment.crit) / 100
//! dodge        = ceil(50 + 50 * dodge_points)    + equipment.dodge
//! ```
//!
//! Negative inputs are clamped to zero before use.

use serde::{Deserialize, Serialize};

use crate::balance::{MobStats, StatRules};

/// Stat points spent by the player.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Allocation {
    /// Health points.
    pub health: f64,
    /// Damage points.
    pub damage: f64,
    /// Hit points.
    pub hit: f64,
    /// Defense points.
    pub defense: f64,
    /// Critical damage points.
    pub crit: f64,
    /// Dodge points.
    pub dodge: f64,
}

impl Allocation {
    /// Copy with every negative entry raised to zero.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            health: self.health.max(0.0),
            damage: self.damage.max(0.0),
            hit: self.hit.max(0.0),
            defense: self.defense.max(0.0),
            crit: self.crit.max(0.0),
            dodge: self.dodge.max(0.0),
        }
    }
}

/// Flat bonuses granted by equipment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentBonus {
    /// Extra health.
    pub health: f64,
    /// Extra damage.
    pub damage: f64,
    /// Extra hit.
    pub hit: f64,
    /// Extra defense points (added after the base formula, before the transform).
    pub defense: f64,
    /// Extra critical damage, in percent.
    pub crit: f64,
    /// Extra dodge.
    pub dodge: f64,
}

impl EquipmentBonus {
    /// Copy with every negative entry raised to zero.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            health: self.health.max(0.0),
            damage: self.damage.max(0.0),
            hit: self.hit.max(0.0),
            defense: self.defense.max(0.0),
            crit: self.crit.max(0.0),
            dodge: self.dodge.max(0.0),
        }
    }
}

/// Combat attributes, fixed for the lifetime of a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    /// Maximum health.
    pub total_health: f64,
    /// Base damage per hit.
    pub damage: f64,
    /// Accuracy rating.
    pub hit: f64,
    /// Damage reduction fraction in [0, 1).
    pub defense: f64,
    /// Pre-transform defense points (`25 + 10 * points` for fighters).
    pub defense_points: f64,
    /// Flat defense bonus fed to the transform alongside `defense_points`.
    pub flat_defense: f64,
    /// Critical damage bonus fraction.
    pub crit: f64,
    /// Evasion rating.
    pub dodge: f64,
}

/// Base defense points before allocation.
pub const BASE_DEFENSE_POINTS: f64 = 25.0;

/// Defense points gained per allocated point.
pub const DEFENSE_POINTS_PER_ALLOCATION: f64 = 10.0;

/// Derive a fighter's stats from allocation and equipment.
#[must_use]
pub fn fighter_stats(
    allocation: &Allocation,
    equipment: &EquipmentBonus,
    rules: &dyn StatRules,
) -> DerivedStats {
    let points = allocation.clamped();
    let gear = equipment.clamped();

    let defense_points = BASE_DEFENSE_POINTS + DEFENSE_POINTS_PER_ALLOCATION * points.defense;

    DerivedStats {
        total_health: (500.0 + 100.0 * points.health).ceil() + gear.health,
        damage: (100.0 + 25.0 * points.damage).ceil() + gear.damage,
        hit: (50.0 + 50.0 * points.hit).ceil() + gear.hit,
        defense: rules.defense_fraction(defense_points, gear.defense),
        defense_points,
        flat_defense: gear.defense,
        crit: (0.25 * points.crit + gear.crit) / 100.0,
        dodge: (50.0 + 50.0 * points.dodge).ceil() + gear.dodge,
    }
}

impl From<&MobStats> for DerivedStats {
    fn from(mob: &MobStats) -> Self {
        Self {
            total_health: mob.total_health,
            damage: mob.damage,
            hit: mob.hit,
            defense: mob.defense,
            defense_points: 0.0,
            flat_defense: 0.0,
            crit: mob.crit,
            dodge: mob.dodge,
        }
    }
}
