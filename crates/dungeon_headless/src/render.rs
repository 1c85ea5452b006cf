//! Text rendering of battle event streams.
//!
//! Boards are drawn as a health table with the mobs on the left and the
//! fighters on the right, front lines facing each other:
//!
//! ```text
//! Mobs Back        | Mobs Front       | Fighters Front   | Fighters Back
//! Goblin lvl 1 ... | ...              | *Bastion 900/900 | -
//! ```

use std::fmt::Write as _;

use dungeon_core::attack::AttackOutcome;
use dungeon_core::events::{Ability, BattleEvent, BoardSnapshot, SlotRef};
use dungeon_core::squad::{Position, Side, ROWS};

const CELL_WIDTH: usize = 24;

/// Table columns, left to right.
const COLUMNS: [(Side, usize, &str); 4] = [
    (Side::Mobs, 1, "Mobs Back"),
    (Side::Mobs, 0, "Mobs Front"),
    (Side::Fighters, 0, "Fighters Front"),
    (Side::Fighters, 1, "Fighters Back"),
];

fn cell(board: &BoardSnapshot, slot: SlotRef, actor: Option<SlotRef>) -> String {
    let Some(unit) = board.unit(slot) else {
        return "-".to_string();
    };
    let marker = if actor == Some(slot) { "*" } else { "" };
    format!(
        "{marker}{} {}/{}",
        unit.label, unit.current_health, unit.total_health
    )
}

/// Render a board as a table, marking `actor` with `*`.
#[must_use]
pub fn render_board(board: &BoardSnapshot, actor: Option<SlotRef>) -> String {
    let mut out = String::new();
    let header: Vec<String> = COLUMNS
        .iter()
        .map(|(_, _, title)| format!("{title:<CELL_WIDTH$}"))
        .collect();
    let _ = writeln!(out, "{}", header.join(" | ").trim_end());

    for row in 0..ROWS {
        let cells: Vec<String> = COLUMNS
            .iter()
            .map(|&(side, col, _)| {
                let slot = SlotRef::new(side, Position::new(row, col));
                format!("{:<CELL_WIDTH$}", cell(board, slot, actor))
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join(" | ").trim_end());
    }
    out
}

fn slot_name(slot: SlotRef) -> String {
    format!("{} {}", slot.side, slot.position)
}

fn describe_ability(ability: &Ability) -> String {
    match ability {
        Ability::Assassinate => "assassinates the back line".to_string(),
        Ability::Flurry => "strikes twice".to_string(),
        Ability::Volley { row } => format!("volleys row {row}"),
        Ability::Blast { col } => format!("blasts column {col}"),
        Ability::Fury {
            multiplier,
            unavoidable,
        } => {
            if *unavoidable {
                format!("rages (x{multiplier}, cannot be dodged)")
            } else {
                format!("rages (x{multiplier})")
            }
        }
        Ability::Zeal { boost } => format!("fights on for the fallen (x{boost:.1})"),
        Ability::Guard { from } => format!("guards the ally at {from}"),
        Ability::PaladinAura => "shields the line".to_string(),
        Ability::BastionAura => "covers an adjacent ally".to_string(),
    }
}

fn describe_outcome(outcome: &AttackOutcome) -> String {
    match outcome {
        AttackOutcome::Evaded { .. } => "evaded".to_string(),
        AttackOutcome::Missed { chance, .. } => format!("missed ({:.0}% to hit)", chance * 100.0),
        AttackOutcome::Hit(report) => {
            let mut text = format!("hit for {}", report.damage);
            if report.critical {
                text.push_str(" (critical)");
            }
            if report.doubled {
                text.push_str(" (doubled)");
            }
            let _ = write!(text, ", {} left", report.remaining_health);
            text
        }
    }
}

fn winner_name(side: Side) -> &'static str {
    match side {
        Side::Fighters => "Fighters",
        Side::Mobs => "Mobs",
    }
}

/// Render one event.
#[must_use]
pub fn render_event(event: &BattleEvent) -> String {
    match event {
        BattleEvent::RoundStarted { round } => format!("=== Round {round} ==="),
        BattleEvent::TurnStarted { actor, board } => {
            format!("{} acts\n{}", slot_name(*actor), render_board(board, Some(*actor)))
        }
        BattleEvent::AbilityTriggered { source, ability } => {
            format!("{} {}", slot_name(*source), describe_ability(ability))
        }
        BattleEvent::Attack {
            attacker,
            target,
            outcome,
        } => format!(
            "{} -> {}: {}",
            slot_name(*attacker),
            slot_name(*target),
            describe_outcome(outcome)
        ),
        BattleEvent::Revived { priest, target } => {
            format!("{} revives {}", slot_name(*priest), slot_name(*target))
        }
        BattleEvent::Roll { kind, value } => format!("  roll {kind:?}: {value:.4}"),
        BattleEvent::RoundEnded {
            fighters_health,
            mobs_health,
            board,
            ..
        } => {
            if board.units.is_empty() {
                format!("Fighters health: {fighters_health}, mobs health: {mobs_health}")
            } else {
                format!(
                    "{}Fighters health: {fighters_health}, mobs health: {mobs_health}",
                    render_board(board, None)
                )
            }
        }
        BattleEvent::BattleEnded {
            winner,
            rounds,
            message,
        } => format!(
            "{} win after {rounds} rounds ({message})",
            winner_name(*winner)
        ),
    }
}

/// Render a whole event stream, one event per line.
#[must_use]
pub fn render_events(events: &[BattleEvent]) -> String {
    let mut out = String::new();
    for line in events.iter().map(render_event) {
        out.push_str(&line);
        if !line.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}
