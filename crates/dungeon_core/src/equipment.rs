//! Tiered equipment stats.
//!
//! An equipment stat is a `(type, value, tier)` triple. The tier scales the
//! base value, and the type keyword decides which [`EquipmentBonus`] bucket
//! receives it.

use serde::{Deserialize, Serialize};

use crate::stats::EquipmentBonus;

/// Highest tier with a dedicated multiplier.
pub const MAX_TIER: u32 = 12;

/// Value multiplier for an equipment tier.
///
/// Tiers below 1 count as tier 1; tiers above [`MAX_TIER`] fall back to 1.0.
#[must_use]
pub fn tier_multiplier(tier: u32) -> f64 {
    match tier.max(1) {
        1 => 1.1,
        2 => 1.2,
        3 => 1.3,
        4 => 1.4,
        5 => 1.5,
        6 => 1.75,
        7 => 2.0,
        8 => 2.25,
        9 => 2.5,
        10 => 2.75,
        11 => 3.0,
        12 => 3.5,
        _ => 1.0,
    }
}

/// Which bonus bucket an equipment stat feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Maximum health.
    Health,
    /// Damage per hit.
    Damage,
    /// Accuracy.
    Hit,
    /// Defense points.
    Defense,
    /// Critical damage percent.
    CritDamage,
    /// Evasion.
    Dodge,
}

impl StatKind {
    /// Classify a stat type keyword such as `"bonus_health"` or `"critDamage"`.
    ///
    /// Crit damage is checked first so that it never lands in the damage bucket.
    #[must_use]
    pub fn classify(keyword: &str) -> Option<Self> {
        let keyword = keyword.to_lowercase();
        if ["critdamage", "crit_damage", "critical_damage"]
            .iter()
            .any(|k| keyword.contains(k))
        {
            Some(StatKind::CritDamage)
        } else if keyword.contains("health") {
            Some(StatKind::Health)
        } else if keyword.contains("damage") {
            Some(StatKind::Damage)
        } else if keyword.contains("hit") {
            Some(StatKind::Hit)
        } else if keyword.contains("defense") || keyword.contains("defence") {
            Some(StatKind::Defense)
        } else if keyword.contains("dodge") || keyword.contains("evasion") {
            Some(StatKind::Dodge)
        } else {
            None
        }
    }
}

/// A single stat line on an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentStat {
    /// Stat type keyword.
    #[serde(rename = "type")]
    pub kind: String,
    /// Base value before the tier multiplier.
    pub value: f64,
    /// Item tier.
    #[serde(default = "default_tier")]
    pub tier: u32,
}

const fn default_tier() -> u32 {
    1
}

impl EquipmentStat {
    /// Create a stat line.
    pub fn new(kind: impl Into<String>, value: f64, tier: u32) -> Self {
        Self {
            kind: kind.into(),
            value,
            tier,
        }
    }

    /// Effective value after the tier multiplier.
    ///
    /// Crit damage is expressed in percent (`value * multiplier * 100`); every
    /// other stat is rounded to the nearest integer.
    #[must_use]
    pub fn effective_value(&self) -> f64 {
        if self.tier > MAX_TIER {
            tracing::warn!(tier = self.tier, kind = %self.kind, "Equipment tier exceeds maximum");
        }
        let base = self.value.max(0.0);
        let multiplier = tier_multiplier(self.tier);
        match StatKind::classify(&self.kind) {
            Some(StatKind::CritDamage) => base * multiplier * 100.0,
            _ => (base * multiplier).round(),
        }
    }
}

/// Sum a list of stat lines into flat bonuses. Unknown keywords are ignored.
#[must_use]
pub fn bonus_from_stats(stats: &[EquipmentStat]) -> EquipmentBonus {
    let mut bonus = EquipmentBonus::default();
    for stat in stats {
        let value = stat.effective_value();
        match StatKind::classify(&stat.kind) {
            Some(StatKind::Health) => bonus.health += value,
            Some(StatKind::Damage) => bonus.damage += value,
            Some(StatKind::Hit) => bonus.hit += value,
            Some(StatKind::Defense) => bonus.defense += value,
            Some(StatKind::CritDamage) => bonus.crit += value,
            Some(StatKind::Dodge) => bonus.dodge += value,
            None => tracing::debug!(kind = %stat.kind, "Ignoring unknown equipment stat"),
        }
    }
    bonus
}
