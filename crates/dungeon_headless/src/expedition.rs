//! Expeditions: one squad through a chain of encounters.
//!
//! The fighters are built once and carry their wounds from one encounter to
//! the next. Each encounter spawns a fresh mobs' squad at the same level.
//! The expedition stops after the requested number of encounters or as
//! soon as no fighter is left standing.

use dungeon_core::balance::StatRules;
use dungeon_core::battle::{Battle, BattleOutcome};
use dungeon_core::error::BattleError;
use dungeon_core::events::{SlotRef, UnitView};
use dungeon_core::squad::{Side, Squad, SquadTemplate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Summary of an expedition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpeditionReport {
    /// Encounters asked for.
    pub requested: u32,
    /// Encounters actually fought.
    pub fought: u32,
    /// Encounters the fighters won.
    pub won: u32,
    /// Outcome of every encounter fought, in order.
    pub encounters: Vec<BattleOutcome>,
    /// Fighters still alive at the end.
    pub survivors: Vec<UnitView>,
}

impl ExpeditionReport {
    /// Whether every requested encounter was fought and won.
    #[must_use]
    pub fn cleared(&self) -> bool {
        self.won == self.requested
    }

    /// Human-readable report lines.
    #[must_use]
    pub fn report(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Encounters fought: {} of {}", self.fought, self.requested),
            format!("Encounters won: {}", self.won),
        ];
        if self.survivors.is_empty() {
            lines.push("No fighter survived".to_string());
        } else {
            lines.push("Survivors:".to_string());
            lines.extend(self.survivors.iter().map(|unit| {
                format!(
                    "  {} at {}: {}/{}",
                    unit.label, unit.slot.position, unit.current_health, unit.total_health
                )
            }));
        }
        lines
    }
}

fn survivors(fighters: &Squad) -> Vec<UnitView> {
    fighters
        .iter()
        .filter(|(_, unit)| unit.is_alive())
        .map(|(position, unit)| UnitView {
            slot: SlotRef::new(Side::Fighters, position),
            label: unit.label(),
            current_health: unit.current_health(),
            total_health: unit.total_health(),
        })
        .collect()
}

/// Send the squad built from `template` through up to `encounters` battles.
pub fn run_expedition<R: Rng>(
    template: &SquadTemplate,
    mob_level: i32,
    encounters: u32,
    rules: &dyn StatRules,
    rng: &mut R,
) -> Result<ExpeditionReport, BattleError> {
    let mut fighters = template.build(rules)?;
    let mut outcomes = Vec::new();
    let mut won = 0;

    for encounter in 0..encounters {
        if !fighters.any_alive() {
            info!(encounter, "Every fighter has fallen, expedition over");
            break;
        }
        let mobs = Squad::mobs_for_level(mob_level, rules);
        let mut battle = Battle::new(fighters, mobs, rules, &mut *rng);
        let outcome = battle.run();
        debug!(
            encounter,
            winner = %outcome.winner,
            rounds = outcome.rounds,
            "Encounter finished"
        );
        if outcome.winner == Side::Fighters {
            won += 1;
        }
        outcomes.push(outcome);
        fighters = battle.into_parts().0;
    }

    Ok(ExpeditionReport {
        requested: encounters,
        fought: outcomes.len() as u32,
        won,
        encounters: outcomes,
        survivors: survivors(&fighters),
    })
}
