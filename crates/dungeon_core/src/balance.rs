//! Balance rules consumed by the engine.
//!
//! Two pure functions shape the numbers without being part of the combat
//! rules themselves: the defense transform (defense points to a damage
//! reduction fraction) and the mob stat curve (level to mob stats). They sit
//! behind the [`StatRules`] trait so callers can plug their own tables in.
//!
//! [`BalanceConfig`] is the data-driven default. It is loaded from RON:
//!
//! ```ron
//! BalanceConfig(
//!     defense_scale: 200.0,
//!     mob_curve: MobCurve(
//!         health: Growth(base: 400.0, per_level: 40.0),
//!         damage: Growth(base: 80.0, per_level: 6.0),
//!         hit: Growth(base: 40.0, per_level: 5.0),
//!         dodge: Growth(base: 40.0, per_level: 5.0),
//!         defense_points: Growth(base: 20.0, per_level: 2.0),
//!         crit_percent: Growth(base: 0.0, per_level: 0.1),
//!     ),
//!     mob_classes: [
//!         MobBracket(min_level: 1, label: "Goblin"),
//!     ],
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};

/// Stats produced by the mob level curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobStats {
    /// Maximum health.
    pub total_health: f64,
    /// Base damage per hit.
    pub damage: f64,
    /// Accuracy rating.
    pub hit: f64,
    /// Damage reduction fraction in [0, 1).
    pub defense: f64,
    /// Critical damage bonus fraction.
    pub crit: f64,
    /// Evasion rating.
    pub dodge: f64,
    /// Display label of the mob.
    pub mob_class: String,
}

/// External stat transforms used by the engine.
pub trait StatRules: Send + Sync {
    /// Convert defense points plus a flat equipment bonus to a damage
    /// reduction fraction in [0, 1). Monotonically increasing.
    fn defense_fraction(&self, base_points: f64, flat_bonus: f64) -> f64;

    /// Stats for a mob of the given level, `None` when `level <= 0`.
    fn mob_stats(&self, level: i32) -> Option<MobStats>;
}

/// Linear growth `base + per_level * level`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Growth {
    /// Value at level zero.
    pub base: f64,
    /// Increase per level.
    pub per_level: f64,
}

impl Growth {
    /// Create a growth curve.
    #[must_use]
    pub const fn new(base: f64, per_level: f64) -> Self {
        Self { base, per_level }
    }

    /// Value at `level`.
    #[must_use]
    pub fn at(&self, level: i32) -> f64 {
        self.base + self.per_level * f64::from(level)
    }
}

/// Per-level growth of every mob stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobCurve {
    /// Maximum health.
    pub health: Growth,
    /// Damage per hit.
    pub damage: Growth,
    /// Accuracy.
    pub hit: Growth,
    /// Evasion.
    pub dodge: Growth,
    /// Defense points, fed through the defense transform.
    pub defense_points: Growth,
    /// Critical damage bonus in percent.
    pub crit_percent: Growth,
}

impl Default for MobCurve {
    fn default() -> Self {
        Self {
            health: Growth::new(400.0, 40.0),
            damage: Growth::new(80.0, 6.0),
            hit: Growth::new(40.0, 5.0),
            dodge: Growth::new(40.0, 5.0),
            defense_points: Growth::new(20.0, 2.0),
            crit_percent: Growth::new(0.0, 0.1),
        }
    }
}

/// Mob label used from `min_level` upwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobBracket {
    /// Lowest level using this label.
    pub min_level: i32,
    /// Display label.
    pub label: String,
}

impl MobBracket {
    fn new(min_level: i32, label: &str) -> Self {
        Self {
            min_level,
            label: label.to_string(),
        }
    }
}

/// Data-driven balance tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Defense points at which damage reduction reaches 50%.
    pub defense_scale: f64,
    /// Mob stat growth.
    pub mob_curve: MobCurve,
    /// Mob labels by level, sorted by `min_level`.
    pub mob_classes: Vec<MobBracket>,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            defense_scale: 200.0,
            mob_curve: MobCurve::default(),
            mob_classes: vec![
                MobBracket::new(1, "Goblin"),
                MobBracket::new(50, "Orc"),
                MobBracket::new(150, "Troll"),
                MobBracket::new(300, "Wraith"),
                MobBracket::new(600, "Dragon"),
            ],
        }
    }
}

impl BalanceConfig {
    /// Parse balance tables from RON text.
    ///
    /// `origin` labels the source in error messages (usually a file path).
    pub fn from_ron_str(ron: &str, origin: &str) -> Result<Self> {
        let config: BalanceConfig =
            ron::from_str(ron).map_err(|e| BattleError::DataParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the tables can produce well-formed stats.
    pub fn validate(&self) -> Result<()> {
        if !(self.defense_scale > 0.0) {
            return Err(BattleError::InvalidConfig(format!(
                "defense_scale must be positive, got {}",
                self.defense_scale
            )));
        }
        if self.mob_classes.is_empty() {
            return Err(BattleError::InvalidConfig(
                "at least one mob class bracket is required".to_string(),
            ));
        }
        if self
            .mob_classes
            .windows(2)
            .any(|w| w[0].min_level >= w[1].min_level)
        {
            return Err(BattleError::InvalidConfig(
                "mob class brackets must be sorted by min_level".to_string(),
            ));
        }
        Ok(())
    }

    /// Label for a mob of `level`.
    #[must_use]
    pub fn mob_class_for(&self, level: i32) -> &str {
        self.mob_classes
            .iter()
            .rev()
            .find(|bracket| bracket.min_level <= level)
            .or_else(|| self.mob_classes.first())
            .map_or("Mob", |bracket| bracket.label.as_str())
    }
}

impl StatRules for BalanceConfig {
    fn defense_fraction(&self, base_points: f64, flat_bonus: f64) -> f64 {
        let points = (base_points + flat_bonus).max(0.0);
        points / (points + self.defense_scale)
    }

    fn mob_stats(&self, level: i32) -> Option<MobStats> {
        if level <= 0 {
            return None;
        }
        let curve = &self.mob_curve;
        Some(MobStats {
            total_health: curve.health.at(level).max(1.0).ceil(),
            damage: curve.damage.at(level).max(0.0).ceil(),
            hit: curve.hit.at(level).max(0.0).ceil(),
            defense: self.defense_fraction(curve.defense_points.at(level), 0.0),
            crit: curve.crit_percent.at(level).max(0.0) / 100.0,
            dodge: curve.dodge.at(level).max(0.0).ceil(),
            mob_class: self.mob_class_for(level).to_string(),
        })
    }
}
