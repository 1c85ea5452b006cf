//! Scenario loading and configuration.
//!
//! A scenario describes one squad against one dungeon level: where each
//! fighter stands, how they are built, how many battles to run and how fast
//! the player clears dungeons (for the success windows).

use std::path::Path;

use dungeon_core::balance::BalanceConfig;
use dungeon_core::combatant::FighterSpec;
use dungeon_core::error::BattleError;
use dungeon_core::squad::{Position, SquadTemplate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A fighter or balance entry was rejected by the engine.
    #[error(transparent)]
    Battle(#[from] BattleError),
    /// Two fighters were placed in the same slot.
    #[error("Two fighters placed at {0}")]
    DuplicateSlot(Position),
    /// The scenario places no fighters.
    #[error("Scenario '{0}' places no fighters")]
    EmptySquad(String),
}

/// One fighter on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Row, 0 to 2.
    pub row: usize,
    /// Column, 0 (front) or 1 (back).
    pub col: usize,
    /// How the fighter is built.
    pub fighter: FighterSpec,
}

fn default_mob_level() -> i32 {
    1
}

fn default_battles() -> u32 {
    1000
}

fn default_rate() -> f64 {
    1.0
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Dungeon level of the strongest mob.
    #[serde(default = "default_mob_level")]
    pub mob_level: i32,
    /// Battles per batch, or encounters per expedition.
    #[serde(default = "default_battles")]
    pub battles: u32,
    /// Dungeons the player clears per minute.
    #[serde(default = "default_rate")]
    pub dungeons_per_minute: f64,
    /// The fighters' squad.
    pub fighters: Vec<Placement>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "Lone Adventurer".to_string(),
            description: "One untrained fighter against a level 1 dungeon".to_string(),
            mob_level: default_mob_level(),
            battles: default_battles(),
            dungeons_per_minute: default_rate(),
            fighters: vec![Placement {
                row: 0,
                col: 0,
                fighter: FighterSpec::new("No Class"),
            }],
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse a scenario from RON text.
    pub fn from_ron_str(contents: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(contents)?;
        Ok(scenario)
    }

    /// Mob level clamped to at least 1.
    #[must_use]
    pub fn effective_mob_level(&self) -> i32 {
        self.mob_level.max(1)
    }

    /// Lay the placements out on a template.
    ///
    /// Class tags are not checked here; a bad tag surfaces when the template
    /// is built for a battle.
    pub fn template(&self) -> Result<SquadTemplate, ScenarioError> {
        if self.fighters.is_empty() {
            return Err(ScenarioError::EmptySquad(self.name.clone()));
        }
        let mut template = SquadTemplate::new();
        for placement in &self.fighters {
            let position = Position::try_new(placement.row, placement.col)?;
            if template.get(position).is_some() {
                return Err(ScenarioError::DuplicateSlot(position));
            }
            template.set(position, Some(placement.fighter.clone()));
        }
        Ok(template)
    }
}

/// Load balance rules from a RON file.
pub fn load_balance<P: AsRef<Path>>(path: P) -> Result<BalanceConfig, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let config = BalanceConfig::from_ron_str(&contents, &path.display().to_string())?;
    Ok(config)
}
