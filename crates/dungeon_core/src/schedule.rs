//! Turn order.
//!
//! Every round both squads are merged into one attack order of twelve slots.
//! Slots are sorted by hit (highest first), then front column before back
//! column, then top row before bottom row. Empty slots and dead occupants
//! carry a hit of zero and sink to the end. The sort is stable, so when a
//! fighter slot and a mob slot tie completely the fighter acts first.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::squad::{Position, Side, Squad, CANONICAL_ORDER};

/// One entry of the round's attack order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnSlot {
    /// Squad the slot belongs to.
    pub side: Side,
    /// Grid position.
    pub position: Position,
    /// Hit of the living occupant, zero otherwise.
    pub hit: f64,
}

fn slot_hit(squad: &Squad, position: Position) -> f64 {
    squad.alive_at(position).map_or(0.0, |c| c.stats().hit)
}

fn turn_ordering(a: &TurnSlot, b: &TurnSlot) -> Ordering {
    b.hit
        .total_cmp(&a.hit)
        .then(a.position.col.cmp(&b.position.col))
        .then(a.position.row.cmp(&b.position.row))
}

/// Compute the attack order for one round.
#[must_use]
pub fn attack_order(fighters: &Squad, mobs: &Squad) -> Vec<TurnSlot> {
    let mut order: Vec<TurnSlot> = CANONICAL_ORDER
        .into_iter()
        .flat_map(|position| {
            [
                TurnSlot {
                    side: Side::Fighters,
                    position,
                    hit: slot_hit(fighters, position),
                },
                TurnSlot {
                    side: Side::Mobs,
                    position,
                    hit: slot_hit(mobs, position),
                },
            ]
        })
        .collect();
    order.sort_by(turn_ordering);
    order
}
