//! Structured battle events.
//!
//! The engine never prints. When verbosity allows it, a battle records a
//! sequence of [`BattleEvent`]s that callers may render, serialize or
//! inspect in tests.

use serde::{Deserialize, Serialize};

use crate::attack::AttackOutcome;
use crate::squad::{Position, Side, Squad};

/// How much of a battle is recorded.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Verbosity {
    /// Record nothing.
    #[default]
    Silent,
    /// Rounds, abilities, attacks, revivals and the result.
    Summary,
    /// Everything in `Summary` plus per-turn board snapshots and raw rolls.
    Detailed,
}

/// A slot on one side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    /// Owning squad.
    pub side: Side,
    /// Grid position.
    pub position: Position,
}

impl SlotRef {
    /// Create a slot reference.
    #[must_use]
    pub const fn new(side: Side, position: Position) -> Self {
        Self { side, position }
    }
}

/// One occupied slot in a [`BoardSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    /// Where the unit stands.
    pub slot: SlotRef,
    /// Display label.
    pub label: String,
    /// Remaining health.
    pub current_health: f64,
    /// Maximum health.
    pub total_health: f64,
}

/// Health of every occupied slot at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Occupied slots, fighters first, each side in canonical order.
    pub units: Vec<UnitView>,
}

impl BoardSnapshot {
    /// Capture both squads.
    #[must_use]
    pub fn capture(fighters: &Squad, mobs: &Squad) -> Self {
        let units = [(Side::Fighters, fighters), (Side::Mobs, mobs)]
            .into_iter()
            .flat_map(|(side, squad)| {
                squad.iter().map(move |(position, unit)| UnitView {
                    slot: SlotRef::new(side, position),
                    label: unit.label(),
                    current_health: unit.current_health(),
                    total_health: unit.total_health(),
                })
            })
            .collect();
        Self { units }
    }

    /// The unit at `slot`, if occupied.
    #[must_use]
    pub fn unit(&self, slot: SlotRef) -> Option<&UnitView> {
        self.units.iter().find(|u| u.slot == slot)
    }
}

/// A class ability that fired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Ability {
    /// Assassin picked a back-line target.
    Assassinate,
    /// Brawler attacks twice.
    Flurry,
    /// Hunter volleys a row.
    Volley {
        /// Targeted row.
        row: usize,
    },
    /// Mage blasts a column.
    Blast {
        /// Targeted column.
        col: usize,
    },
    /// Berserker fury bracket.
    Fury {
        /// Damage multiplier.
        multiplier: f64,
        /// The attack cannot be dodged.
        unavoidable: bool,
    },
    /// Crusader scaling from fallen allies.
    Zeal {
        /// Stat multiplier.
        boost: f64,
    },
    /// Sentinel took an attack meant for a weakened ally.
    Guard {
        /// Original target.
        from: Position,
    },
    /// Paladin aura reduced an attack.
    PaladinAura,
    /// Bastion aura protected an adjacent ally.
    BastionAura,
}

/// What a random draw decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollKind {
    /// Brawler double attack chance.
    Flurry,
    /// Priest revive chance.
    ReviveChance,
    /// Priest revive pick.
    RevivePick,
    /// Shadow Dancer evade.
    Evade,
    /// Hit roll.
    Hit,
    /// Critical roll.
    Crit,
}

/// One recorded battle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum BattleEvent {
    /// A round begins.
    RoundStarted {
        /// Round number, starting at 1.
        round: u32,
    },
    /// A living unit takes its turn.
    TurnStarted {
        /// Acting slot.
        actor: SlotRef,
        /// Board before the turn.
        board: BoardSnapshot,
    },
    /// A class ability fired.
    AbilityTriggered {
        /// Unit the ability belongs to.
        source: SlotRef,
        /// Which ability.
        ability: Ability,
    },
    /// An attack was resolved.
    Attack {
        /// Attacking slot.
        attacker: SlotRef,
        /// Target slot.
        target: SlotRef,
        /// Result.
        outcome: AttackOutcome,
    },
    /// A Priest revived a fallen ally.
    Revived {
        /// Priest slot.
        priest: SlotRef,
        /// Revived slot.
        target: SlotRef,
    },
    /// A raw random draw.
    Roll {
        /// What the draw decided.
        kind: RollKind,
        /// Drawn value in [0, 1).
        value: f64,
    },
    /// A round finished.
    RoundEnded {
        /// Round number.
        round: u32,
        /// Fighters' total remaining health.
        fighters_health: f64,
        /// Mobs' total remaining health.
        mobs_health: f64,
        /// Board after the round.
        board: BoardSnapshot,
    },
    /// The battle is over.
    BattleEnded {
        /// Winning side.
        winner: Side,
        /// Rounds played.
        rounds: u32,
        /// "health depleted" or "exhaustion".
        message: String,
    },
}

/// Event sink filtered by [`Verbosity`].
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    verbosity: Verbosity,
    events: Vec<BattleEvent>,
}

impl EventLog {
    /// An empty log.
    #[must_use]
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            events: Vec::new(),
        }
    }

    /// Configured verbosity.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Recorded events.
    #[must_use]
    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Consume the log.
    #[must_use]
    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    /// Record a summary-level event. The closure only runs when recorded.
    pub fn summary(&mut self, event: impl FnOnce() -> BattleEvent) {
        if self.verbosity >= Verbosity::Summary {
            self.events.push(event());
        }
    }

    /// Record a detail-level event.
    pub fn detail(&mut self, event: impl FnOnce() -> BattleEvent) {
        if self.verbosity >= Verbosity::Detailed {
            self.events.push(event());
        }
    }

    /// Record an attack, plus its raw rolls at detail level.
    pub fn attack(&mut self, attacker: SlotRef, target: SlotRef, outcome: AttackOutcome) {
        if self.verbosity >= Verbosity::Detailed {
            match outcome {
                AttackOutcome::Evaded { roll } => self.roll(RollKind::Evade, roll),
                AttackOutcome::Missed { roll, .. } => self.roll(RollKind::Hit, roll),
                AttackOutcome::Hit(report) => {
                    if let Some(roll) = report.roll {
                        self.roll(RollKind::Hit, roll);
                    }
                    self.roll(RollKind::Crit, report.crit_roll);
                }
            }
        }
        self.summary(|| BattleEvent::Attack {
            attacker,
            target,
            outcome,
        });
    }

    /// Record a raw draw at detail level.
    pub fn roll(&mut self, kind: RollKind, value: f64) {
        self.detail(|| BattleEvent::Roll { kind, value });
    }
}
