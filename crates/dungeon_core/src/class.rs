//! Fighter classes.
//!
//! Each class carries exactly one special ability. The ability resolver in
//! [`crate::abilities`] matches exhaustively over this enum, so adding a class
//! forces every ability rule to be revisited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BattleError;

/// The twelve fighter classes, including the ability-less "No Class".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FighterClass {
    /// Strikes the enemy back line first.
    Assassin,
    /// Occasionally attacks twice in one turn.
    Brawler,
    /// Hits both slots of the first occupied enemy row.
    Hunter,
    /// Hits the whole first occupied enemy column.
    Mage,
    /// May resurrect a fallen ally before attacking.
    Priest,
    /// May evade incoming attacks and then strike for double damage.
    #[serde(rename = "Shadow Dancer")]
    ShadowDancer,
    /// Deals more damage the more wounded it is.
    Berserker,
    /// Shields allies sharing the attacking column.
    Paladin,
    /// Grows stronger for every fallen ally.
    Crusader,
    /// Intercepts attacks aimed at badly wounded allies.
    Sentinel,
    /// Shields orthogonally adjacent allies.
    Bastion,
    /// No special ability.
    #[default]
    #[serde(rename = "No Class")]
    NoClass,
}

impl FighterClass {
    /// Every class in declaration order.
    pub const ALL: [FighterClass; 12] = [
        FighterClass::Assassin,
        FighterClass::Brawler,
        FighterClass::Hunter,
        FighterClass::Mage,
        FighterClass::Priest,
        FighterClass::ShadowDancer,
        FighterClass::Berserker,
        FighterClass::Paladin,
        FighterClass::Crusader,
        FighterClass::Sentinel,
        FighterClass::Bastion,
        FighterClass::NoClass,
    ];

    /// Display name, as used in class tags.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FighterClass::Assassin => "Assassin",
            FighterClass::Brawler => "Brawler",
            FighterClass::Hunter => "Hunter",
            FighterClass::Mage => "Mage",
            FighterClass::Priest => "Priest",
            FighterClass::ShadowDancer => "Shadow Dancer",
            FighterClass::Berserker => "Berserker",
            FighterClass::Paladin => "Paladin",
            FighterClass::Crusader => "Crusader",
            FighterClass::Sentinel => "Sentinel",
            FighterClass::Bastion => "Bastion",
            FighterClass::NoClass => "No Class",
        }
    }
}

impl fmt::Display for FighterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FighterClass {
    type Err = BattleError;

    /// Parse a class tag.
    ///
    /// Accepts the display name in any case, plus the `snake_case` and
    /// squashed spellings (`shadow_dancer`, `shadowdancer`, `no_class`).
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let normalized: String = tag
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        FighterClass::ALL
            .into_iter()
            .find(|class| {
                class
                    .name()
                    .chars()
                    .filter(|c| *c != ' ')
                    .flat_map(char::to_lowercase)
                    .eq(normalized.chars())
            })
            .ok_or_else(|| BattleError::InvalidClass(tag.to_string()))
    }
}
