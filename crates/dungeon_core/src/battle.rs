//! Battle loop.
//!
//! A [`Battle`] owns both squads for its whole lifetime and drives rounds
//! until one side is wiped out or the round cap is reached.
//!
//! Within a round every one of the twelve scheduled slots is visited. Before
//! a slot acts the opposing squad must still have a default target; if it
//! does not, the round is cut short and the battle ends. Empty or dead slots
//! are skipped.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::abilities::{take_turn, TurnContext, TurnFlow};
use crate::balance::StatRules;
use crate::events::{BattleEvent, BoardSnapshot, EventLog, SlotRef, Verbosity};
use crate::schedule::attack_order;
use crate::squad::{Side, Squad};

/// Rounds after which an undecided battle is exhausted.
pub const MAX_ROUNDS: u32 = 300;

/// Outcome message for a battle decided by health.
pub const MESSAGE_DEPLETED: &str = "health depleted";

/// Outcome message for an exhausted battle.
pub const MESSAGE_EXHAUSTED: &str = "exhaustion";

/// Battle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleStatus {
    /// Rounds remain to be played.
    Running,
    /// Every mob is dead.
    FightersWin,
    /// Every fighter is dead.
    MobsWin,
    /// Round cap reached; counts as a mobs win.
    Exhausted,
}

impl BattleStatus {
    /// Whether the battle is over.
    #[must_use]
    pub fn is_finished(self) -> bool {
        self != BattleStatus::Running
    }

    /// Winning side, `None` while running.
    #[must_use]
    pub fn winner(self) -> Option<Side> {
        match self {
            BattleStatus::Running => None,
            BattleStatus::FightersWin => Some(Side::Fighters),
            BattleStatus::MobsWin | BattleStatus::Exhausted => Some(Side::Mobs),
        }
    }
}

/// Result of a finished battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// Winning side.
    pub winner: Side,
    /// Terminal status.
    pub status: BattleStatus,
    /// Rounds played.
    pub rounds: u32,
    /// "health depleted" or "exhaustion".
    pub message: String,
    /// Mobs' total remaining health.
    pub mobs_remaining_health: f64,
}

/// One battle between a fighters' squad and a mobs' squad.
pub struct Battle<'a, R: Rng> {
    fighters: Squad,
    mobs: Squad,
    rules: &'a dyn StatRules,
    rng: R,
    log: EventLog,
    rounds: u32,
    status: BattleStatus,
    ended: bool,
}

impl<'a, R: Rng> Battle<'a, R> {
    /// Set up a battle that records no events.
    pub fn new(fighters: Squad, mobs: Squad, rules: &'a dyn StatRules, rng: R) -> Self {
        Self {
            fighters,
            mobs,
            rules,
            rng,
            log: EventLog::new(Verbosity::Silent),
            rounds: 0,
            status: BattleStatus::Running,
            ended: false,
        }
    }

    /// Builder method to record events at `verbosity`.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.log = EventLog::new(verbosity);
        self
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> BattleStatus {
        self.status
    }

    /// Rounds played so far.
    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Fighters' squad.
    #[must_use]
    pub fn fighters(&self) -> &Squad {
        &self.fighters
    }

    /// Mobs' squad.
    #[must_use]
    pub fn mobs(&self) -> &Squad {
        &self.mobs
    }

    /// Recorded events.
    #[must_use]
    pub fn events(&self) -> &[BattleEvent] {
        self.log.events()
    }

    /// Hand back both squads and the recorded events.
    #[must_use]
    pub fn into_parts(self) -> (Squad, Squad, Vec<BattleEvent>) {
        (self.fighters, self.mobs, self.log.into_events())
    }

    /// Play one round and return the new status.
    ///
    /// Does nothing once the battle is finished.
    pub fn play_round(&mut self) -> BattleStatus {
        if self.status.is_finished() {
            return self.status;
        }

        let round = self.rounds + 1;
        self.log.summary(|| BattleEvent::RoundStarted { round });

        let mut out_of_targets = false;
        for slot in attack_order(&self.fighters, &self.mobs) {
            let (own, opponents) = match slot.side {
                Side::Fighters => (&self.fighters, &self.mobs),
                Side::Mobs => (&self.mobs, &self.fighters),
            };
            if opponents.default_target().is_none() {
                out_of_targets = true;
                break;
            }
            if own.alive_at(slot.position).is_none() {
                continue;
            }

            let actor = SlotRef::new(slot.side, slot.position);
            let (fighters, mobs) = (&self.fighters, &self.mobs);
            self.log.detail(|| BattleEvent::TurnStarted {
                actor,
                board: BoardSnapshot::capture(fighters, mobs),
            });

            let mut ctx = TurnContext {
                rules: self.rules,
                rng: &mut self.rng,
                log: &mut self.log,
            };
            if take_turn(&mut self.fighters, &mut self.mobs, actor, &mut ctx)
                == TurnFlow::OutOfTargets
            {
                out_of_targets = true;
                break;
            }
        }

        self.rounds = round;
        let fighters_health = self.fighters.total_health();
        let mobs_health = self.mobs.total_health();
        let (fighters, mobs) = (&self.fighters, &self.mobs);
        self.log.summary(|| BattleEvent::RoundEnded {
            round,
            fighters_health,
            mobs_health,
            board: BoardSnapshot::capture(fighters, mobs),
        });

        self.status = if out_of_targets {
            if fighters_health > 0.0 {
                BattleStatus::FightersWin
            } else {
                BattleStatus::MobsWin
            }
        } else if fighters_health <= 0.0 {
            BattleStatus::MobsWin
        } else if mobs_health <= 0.0 {
            BattleStatus::FightersWin
        } else if round >= MAX_ROUNDS {
            BattleStatus::Exhausted
        } else {
            BattleStatus::Running
        };
        self.status
    }

    /// Play rounds until the battle is finished.
    pub fn run(&mut self) -> BattleOutcome {
        while !self.status.is_finished() {
            self.play_round();
        }
        let outcome = self.outcome_snapshot();
        if !self.ended {
            self.ended = true;
            tracing::debug!(
                winner = %outcome.winner,
                rounds = outcome.rounds,
                mobs_remaining_health = outcome.mobs_remaining_health,
                message = %outcome.message,
                "Battle finished"
            );
            let event = BattleEvent::BattleEnded {
                winner: outcome.winner,
                rounds: outcome.rounds,
                message: outcome.message.clone(),
            };
            self.log.summary(|| event);
        }
        outcome
    }

    /// Outcome of a finished battle, `None` while running.
    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.status.is_finished().then(|| self.outcome_snapshot())
    }

    fn outcome_snapshot(&self) -> BattleOutcome {
        let message = if self.status == BattleStatus::Exhausted {
            MESSAGE_EXHAUSTED
        } else {
            MESSAGE_DEPLETED
        };
        BattleOutcome {
            winner: self.status.winner().unwrap_or(Side::Mobs),
            status: self.status,
            rounds: self.rounds,
            message: message.to_string(),
            mobs_remaining_health: self.mobs.total_health(),
        }
    }
}

/// Run a battle to completion and return its outcome with the recorded events.
pub fn run_battle<R: Rng>(
    fighters: Squad,
    mobs: Squad,
    rules: &dyn StatRules,
    verbosity: Verbosity,
    rng: R,
) -> (BattleOutcome, Vec<BattleEvent>) {
    let mut battle = Battle::new(fighters, mobs, rules, rng).with_verbosity(verbosity);
    let outcome = battle.run();
    let (_, _, events) = battle.into_parts();
    (outcome, events)
}
