//! Attack resolution.
//!
//! One call resolves a single attacker/target exchange. Class auras and
//! ability modifiers arrive through [`PendingEffects`], a record that exists
//! for exactly one attack; nothing carries over to the next call except the
//! Shadow Dancer's double-damage flag, which lives on the combatant.
//!
//! Random draws happen in a fixed order: evade roll (Shadow Dancer targets
//! only), hit roll (skipped for unavoidable attacks), crit roll (hits only).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::balance::StatRules;
use crate::class::FighterClass;
use crate::combatant::Combatant;

/// Probability that a Shadow Dancer evades an incoming attack.
pub const EVADE_CHANCE: f64 = 0.25;

/// Probability that a successful hit is critical.
pub const CRIT_CHANCE: f64 = 0.1;

/// Damage reduction granted by an adjacent Bastion.
pub const BASTION_REDUCTION: f64 = 0.25;

/// Dodge multiplier granted by an adjacent Bastion.
pub const BASTION_DODGE_MULTIPLIER: f64 = 1.5;

/// Damage reduction granted by a Paladin in the attacker's column.
pub const PALADIN_REDUCTION: f64 = 0.15;

/// Crusader stat gain per dead ally.
pub const CRUSADER_GAIN_PER_DEAD: f64 = 0.2;

/// One-shot modifiers for a single attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingEffects {
    /// Ability damage multiplier (Hunter 0.75, Mage 0.5, Berserker 1.0..1.75).
    pub damage_multiplier: f64,
    /// Skip the hit roll entirely.
    pub unavoidable: bool,
    /// Paladin aura applies to this attack.
    pub paladin_aura: bool,
    /// Bastion aura applies to this attack.
    pub bastion_aura: bool,
}

impl Default for PendingEffects {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            unavoidable: false,
            paladin_aura: false,
            bastion_aura: false,
        }
    }
}

impl PendingEffects {
    /// Effects with an ability damage multiplier.
    #[must_use]
    pub fn with_multiplier(damage_multiplier: f64) -> Self {
        Self {
            damage_multiplier,
            ..Default::default()
        }
    }

    /// Total extra damage reduction from auras.
    #[must_use]
    pub fn damage_reduction(&self) -> f64 {
        let mut reduction = 0.0;
        if self.bastion_aura {
            reduction += BASTION_REDUCTION;
        }
        if self.paladin_aura {
            reduction += PALADIN_REDUCTION;
        }
        reduction
    }
}

/// Crusader stat multiplier for `dead_allies` fallen fighters.
#[must_use]
pub fn crusader_boost(dead_allies: usize) -> f64 {
    1.0 + CRUSADER_GAIN_PER_DEAD * dead_allies as f64
}

/// Details of a landed attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitReport {
    /// Hit chance used for the roll.
    pub chance: f64,
    /// Hit roll; `None` when the attack was unavoidable.
    pub roll: Option<f64>,
    /// Crit roll.
    pub crit_roll: f64,
    /// Damage subtracted from the target.
    pub damage: f64,
    /// The crit roll succeeded.
    pub critical: bool,
    /// Shadow Dancer double damage was consumed.
    pub doubled: bool,
    /// Extra damage reduction from auras.
    pub damage_reduction: f64,
    /// Target health after the hit.
    pub remaining_health: f64,
}

/// Result of one attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackOutcome {
    /// A Shadow Dancer target evaded.
    Evaded {
        /// Evade roll.
        roll: f64,
    },
    /// The hit roll failed.
    Missed {
        /// Hit chance used for the roll.
        chance: f64,
        /// Hit roll.
        roll: f64,
    },
    /// The attack landed.
    Hit(HitReport),
}

impl AttackOutcome {
    /// Damage dealt, zero for evasions and misses.
    #[must_use]
    pub fn damage(&self) -> f64 {
        match self {
            AttackOutcome::Hit(report) => report.damage,
            _ => 0.0,
        }
    }
}

/// Attacker-side numbers after Crusader scaling.
#[derive(Debug, Clone, Copy)]
struct Offense {
    hit: f64,
    damage: f64,
    crit: f64,
}

/// Target-side numbers after Crusader scaling and the Bastion aura.
#[derive(Debug, Clone, Copy)]
struct Guard {
    defense: f64,
    dodge: f64,
}

fn offense(attacker: &Combatant, boost: f64) -> Offense {
    let stats = attacker.stats();
    if attacker.is_class(FighterClass::Crusader) {
        Offense {
            hit: stats.hit * boost,
            damage: stats.damage * boost,
            crit: stats.crit * boost,
        }
    } else {
        Offense {
            hit: stats.hit,
            damage: stats.damage,
            crit: stats.crit,
        }
    }
}

fn guard(target: &Combatant, boost: f64, rules: &dyn StatRules) -> Guard {
    let stats = target.stats();
    if target.is_class(FighterClass::Crusader) && boost != 1.0 {
        Guard {
            defense: rules.defense_fraction(stats.defense_points * boost, stats.flat_defense),
            dodge: stats.dodge * boost,
        }
    } else {
        Guard {
            defense: stats.defense,
            dodge: stats.dodge,
        }
    }
}

/// Hit chance for `hit` against `dodge`.
#[must_use]
pub fn hit_chance(hit: f64, dodge: f64) -> f64 {
    let total = hit + dodge;
    if total > 0.0 {
        hit / total
    } else {
        0.0
    }
}

/// Resolve one attack, mutating the target's health and both combatants'
/// one-shot state.
///
/// `dead_allies` is the number of fallen fighters at the moment of the
/// attack; it only matters when either side is a Crusader.
pub fn resolve_attack<R: Rng + ?Sized>(
    attacker: &mut Combatant,
    target: &mut Combatant,
    effects: PendingEffects,
    dead_allies: usize,
    rules: &dyn StatRules,
    rng: &mut R,
) -> AttackOutcome {
    let boost = crusader_boost(dead_allies);
    let offense = offense(attacker, boost);
    let mut guard = guard(target, boost, rules);

    if target.is_class(FighterClass::ShadowDancer) {
        let roll: f64 = rng.gen();
        tracing::trace!(roll, "Evade roll");
        if roll < EVADE_CHANCE {
            attacker.record_hit();
            target.set_double_damage_pending(true);
            return AttackOutcome::Evaded { roll };
        }
    }

    if effects.bastion_aura {
        guard.dodge *= BASTION_DODGE_MULTIPLIER;
    }

    let chance = hit_chance(offense.hit, guard.dodge);
    let roll = if effects.unavoidable {
        None
    } else {
        let roll: f64 = rng.gen();
        tracing::trace!(roll, chance, "Hit roll");
        if roll >= chance {
            return AttackOutcome::Missed { chance, roll };
        }
        Some(roll)
    };

    attacker.record_hit();

    let mut damage = offense.damage;
    let doubled =
        attacker.is_class(FighterClass::ShadowDancer) && attacker.double_damage_pending();
    if doubled {
        damage *= 2.0;
        attacker.set_double_damage_pending(false);
    }

    let damage_reduction = effects.damage_reduction();
    let mut raw =
        (1.0 - guard.defense) * (1.0 - damage_reduction) * damage * effects.damage_multiplier;

    let crit_roll: f64 = rng.gen();
    tracing::trace!(crit_roll, "Crit roll");
    let critical = crit_roll < CRIT_CHANCE;
    if critical {
        raw *= 1.0 + offense.crit;
    }

    let dealt = raw.floor().max(0.0);
    let remaining_health = target.take_damage(dealt);

    AttackOutcome::Hit(HitReport {
        chance,
        roll,
        crit_roll,
        damage: dealt,
        critical,
        doubled,
        damage_reduction,
        remaining_health,
    })
}
