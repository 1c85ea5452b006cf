//! Fighters and mobs.
//!
//! A [`Combatant`] is built once per battle. Its [`DerivedStats`] never change
//! afterwards; only `current_health`, `hit_counter` and the Shadow Dancer's
//! pending double damage move while the battle runs.

use serde::{Deserialize, Serialize};

use crate::balance::StatRules;
use crate::class::FighterClass;
use crate::equipment::{bonus_from_stats, EquipmentStat};
use crate::error::Result;
use crate::stats::{fighter_stats, Allocation, DerivedStats, EquipmentBonus};

/// Recipe for building a fighter.
///
/// The class is kept as the raw tag supplied by the caller so that a bad tag
/// surfaces as [`crate::error::BattleError::InvalidClass`] at construction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FighterSpec {
    /// Class tag, e.g. `"Shadow Dancer"`.
    pub class: String,
    /// Display name; defaults to the class name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Allocated stat points.
    #[serde(default)]
    pub allocation: Allocation,
    /// Flat equipment bonuses.
    #[serde(default)]
    pub equipment: EquipmentBonus,
    /// Tiered item stats, summed on top of `equipment`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<EquipmentStat>,
}

impl FighterSpec {
    /// A fighter of `class` with no points and no equipment.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder method to set allocated points.
    #[must_use]
    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.allocation = allocation;
        self
    }

    /// Builder method to set flat equipment bonuses.
    #[must_use]
    pub fn with_equipment(mut self, equipment: EquipmentBonus) -> Self {
        self.equipment = equipment;
        self
    }

    /// Builder method to add a tiered item stat.
    #[must_use]
    pub fn with_item(mut self, stat: EquipmentStat) -> Self {
        self.items.push(stat);
        self
    }

    /// Flat bonuses plus item stats.
    #[must_use]
    pub fn total_equipment(&self) -> EquipmentBonus {
        let items = bonus_from_stats(&self.items);
        EquipmentBonus {
            health: self.equipment.health + items.health,
            damage: self.equipment.damage + items.damage,
            hit: self.equipment.hit + items.hit,
            defense: self.equipment.defense + items.defense,
            crit: self.equipment.crit + items.crit,
            dodge: self.equipment.dodge + items.dodge,
        }
    }
}

/// Identity of a combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatantKind {
    /// Player-controlled unit.
    Fighter {
        /// Fighter class.
        class: FighterClass,
        /// Display name.
        name: String,
    },
    /// Dungeon monster.
    Mob {
        /// Display label.
        mob_class: String,
        /// Mob level.
        level: i32,
    },
}

/// A unit taking part in a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    kind: CombatantKind,
    stats: DerivedStats,
    current_health: f64,
    hit_counter: u32,
    double_damage_pending: bool,
}

impl Combatant {
    /// Construct a fighter from a class tag and its inputs.
    pub fn fighter(spec: &FighterSpec, rules: &dyn StatRules) -> Result<Self> {
        let class: FighterClass = spec.class.parse()?;
        let stats = fighter_stats(&spec.allocation, &spec.total_equipment(), rules);
        let name = spec
            .name
            .clone()
            .unwrap_or_else(|| class.name().to_string());
        Ok(Self::from_stats(CombatantKind::Fighter { class, name }, stats))
    }

    /// Construct a mob of `level`; `None` when `level <= 0`.
    #[must_use]
    pub fn mob(level: i32, rules: &dyn StatRules) -> Option<Self> {
        let mob = rules.mob_stats(level)?;
        let stats = DerivedStats::from(&mob);
        Some(Self::from_stats(
            CombatantKind::Mob {
                mob_class: mob.mob_class,
                level,
            },
            stats,
        ))
    }

    /// Construct a combatant directly from stats, at full health.
    #[must_use]
    pub fn from_stats(kind: CombatantKind, stats: DerivedStats) -> Self {
        Self {
            kind,
            current_health: stats.total_health,
            stats,
            hit_counter: 0,
            double_damage_pending: false,
        }
    }

    /// Identity.
    #[must_use]
    pub fn kind(&self) -> &CombatantKind {
        &self.kind
    }

    /// Derived stats.
    #[must_use]
    pub fn stats(&self) -> &DerivedStats {
        &self.stats
    }

    /// Fighter class, `None` for mobs.
    #[must_use]
    pub fn class(&self) -> Option<FighterClass> {
        match self.kind {
            CombatantKind::Fighter { class, .. } => Some(class),
            CombatantKind::Mob { .. } => None,
        }
    }

    /// Whether this is a fighter of `class`.
    #[must_use]
    pub fn is_class(&self, class: FighterClass) -> bool {
        self.class() == Some(class)
    }

    /// Whether this is a fighter.
    #[must_use]
    pub fn is_fighter(&self) -> bool {
        matches!(self.kind, CombatantKind::Fighter { .. })
    }

    /// Short display label ("Mage", "Goblin lvl 12").
    #[must_use]
    pub fn label(&self) -> String {
        match &self.kind {
            CombatantKind::Fighter { name, .. } => name.clone(),
            CombatantKind::Mob { mob_class, level } => format!("{mob_class} lvl {level}"),
        }
    }

    /// Maximum health.
    #[must_use]
    pub fn total_health(&self) -> f64 {
        self.stats.total_health
    }

    /// Remaining health.
    #[must_use]
    pub fn current_health(&self) -> f64 {
        self.current_health
    }

    /// Remaining health as a fraction of maximum.
    #[must_use]
    pub fn health_ratio(&self) -> f64 {
        if self.stats.total_health > 0.0 {
            self.current_health / self.stats.total_health
        } else {
            0.0
        }
    }

    /// Whether the combatant can still act and be targeted.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current_health > 0.0
    }

    /// Attacks that were not plain misses.
    #[must_use]
    pub fn hit_counter(&self) -> u32 {
        self.hit_counter
    }

    /// Whether the next successful hit deals double damage.
    #[must_use]
    pub fn double_damage_pending(&self) -> bool {
        self.double_damage_pending
    }

    /// Apply damage, flooring health at zero. Returns remaining health.
    pub fn take_damage(&mut self, amount: f64) -> f64 {
        self.current_health = (self.current_health - amount.max(0.0)).max(0.0);
        self.current_health
    }

    /// Restore to a fresh state: full health, no hits, no pending double damage.
    pub fn restore(&mut self) {
        self.current_health = self.stats.total_health;
        self.hit_counter = 0;
        self.double_damage_pending = false;
    }

    pub(crate) fn record_hit(&mut self) {
        self.hit_counter += 1;
    }

    pub(crate) fn set_double_damage_pending(&mut self, pending: bool) {
        self.double_damage_pending = pending;
    }
}
