//! The 3x2 squad grid.
//!
//! Rows run top to bottom (0..3), columns front to back (0 = front line,
//! 1 = back line). Targeting and serialization visit positions in
//! [`CANONICAL_ORDER`]: the front column top to bottom, then the back column.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::balance::StatRules;
use crate::combatant::{Combatant, FighterSpec};
use crate::error::{BattleError, Result};

/// Number of rows in a squad.
pub const ROWS: usize = 3;

/// Number of columns in a squad.
pub const COLS: usize = 2;

/// A slot in the squad grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Row, 0 (top) to 2 (bottom).
    pub row: usize,
    /// Column, 0 (front) or 1 (back).
    pub col: usize,
}

impl Position {
    /// Create a position from grid coordinates known to be valid.
    ///
    /// # Panics
    ///
    /// When `row >= ROWS` or `col >= COLS`. Use [`Position::try_new`] for
    /// untrusted input.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        assert!(row < ROWS && col < COLS, "position outside the 3x2 grid");
        Self { row, col }
    }

    /// Checked constructor.
    pub fn try_new(row: usize, col: usize) -> Result<Self> {
        if row < ROWS && col < COLS {
            Ok(Self { row, col })
        } else {
            Err(BattleError::InvalidPosition { row, col })
        }
    }

    /// Orthogonal neighbours inside the grid (up, down, left, right).
    pub fn adjacent(self) -> impl Iterator<Item = Position> {
        const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        DIRECTIONS.into_iter().filter_map(move |(dr, dc)| {
            let row = self.row.checked_add_signed(dr)?;
            let col = self.col.checked_add_signed(dc)?;
            (row < ROWS && col < COLS).then_some(Position { row, col })
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Front column top to bottom, then back column top to bottom.
pub const CANONICAL_ORDER: [Position; 6] = [
    Position { row: 0, col: 0 },
    Position { row: 1, col: 0 },
    Position { row: 2, col: 0 },
    Position { row: 0, col: 1 },
    Position { row: 1, col: 1 },
    Position { row: 2, col: 1 },
];

/// Back column top to bottom, then front column top to bottom.
pub const BACK_FIRST_ORDER: [Position; 6] = [
    Position { row: 0, col: 1 },
    Position { row: 1, col: 1 },
    Position { row: 2, col: 1 },
    Position { row: 0, col: 0 },
    Position { row: 1, col: 0 },
    Position { row: 2, col: 0 },
];

/// Row by row, front slot before back slot.
pub const ROW_MAJOR_ORDER: [Position; 6] = [
    Position { row: 0, col: 0 },
    Position { row: 0, col: 1 },
    Position { row: 1, col: 0 },
    Position { row: 1, col: 1 },
    Position { row: 2, col: 0 },
    Position { row: 2, col: 1 },
];

/// Level offsets of a mob squad relative to the dungeon level, per position.
///
/// The front line is closest to the dungeon level; the back line is weaker.
pub const MOB_LEVEL_OFFSETS: [(Position, i32); 6] = [
    (Position { row: 0, col: 0 }, 0),
    (Position { row: 0, col: 1 }, -75),
    (Position { row: 1, col: 0 }, -25),
    (Position { row: 1, col: 1 }, -100),
    (Position { row: 2, col: 0 }, -50),
    (Position { row: 2, col: 1 }, -125),
];

/// Which squad a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Player squad.
    Fighters,
    /// Dungeon squad.
    Mobs,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Side {
        match self {
            Side::Fighters => Side::Mobs,
            Side::Mobs => Side::Fighters,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Fighters => f.write_str("fighters"),
            Side::Mobs => f.write_str("mobs"),
        }
    }
}

/// A 3x2 grid of optional combatants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    slots: [[Option<Combatant>; COLS]; ROWS],
}

impl Squad {
    /// An empty squad.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the dungeon squad for `base_level`.
    ///
    /// Positions whose offset level is not positive stay empty.
    #[must_use]
    pub fn mobs_for_level(base_level: i32, rules: &dyn StatRules) -> Self {
        let mut squad = Self::new();
        for (position, offset) in MOB_LEVEL_OFFSETS {
            squad.slots[position.row][position.col] =
                Combatant::mob(base_level.saturating_add(offset), rules);
        }
        squad
    }

    /// Put a combatant in a slot, returning the previous occupant.
    pub fn place(&mut self, position: Position, combatant: Combatant) -> Option<Combatant> {
        self.slots[position.row][position.col].replace(combatant)
    }

    /// Empty a slot.
    pub fn remove(&mut self, position: Position) -> Option<Combatant> {
        self.slots[position.row][position.col].take()
    }

    /// Occupant of a slot.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<&Combatant> {
        self.slots[position.row][position.col].as_ref()
    }

    /// Mutable occupant of a slot.
    pub fn get_mut(&mut self, position: Position) -> Option<&mut Combatant> {
        self.slots[position.row][position.col].as_mut()
    }

    /// Living occupant of a slot.
    #[must_use]
    pub fn alive_at(&self, position: Position) -> Option<&Combatant> {
        self.get(position).filter(|c| c.is_alive())
    }

    /// Occupied slots in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Combatant)> {
        CANONICAL_ORDER
            .into_iter()
            .filter_map(move |pos| self.get(pos).map(|c| (pos, c)))
    }

    /// First living combatant's position following `order`.
    #[must_use]
    pub fn first_alive(&self, order: &[Position]) -> Option<Position> {
        order
            .iter()
            .copied()
            .find(|pos| self.alive_at(*pos).is_some())
    }

    /// Default target: first living combatant in canonical order.
    #[must_use]
    pub fn default_target(&self) -> Option<Position> {
        self.first_alive(&CANONICAL_ORDER)
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether every slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of current health over all occupants.
    #[must_use]
    pub fn total_health(&self) -> f64 {
        self.iter().map(|(_, c)| c.current_health()).sum()
    }

    /// Whether any occupant is alive.
    #[must_use]
    pub fn any_alive(&self) -> bool {
        self.iter().any(|(_, c)| c.is_alive())
    }

    /// Positions of dead occupants, in canonical order.
    #[must_use]
    pub fn dead_positions(&self) -> Vec<Position> {
        self.iter()
            .filter(|(_, c)| !c.is_alive())
            .map(|(pos, _)| pos)
            .collect()
    }
}

/// Fighter recipes laid out on the grid.
///
/// Templates are rebuilt into a fresh [`Squad`] for every battle so that no
/// combatant state leaks between battles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SquadTemplate {
    slots: [[Option<FighterSpec>; COLS]; ROWS],
}

impl SquadTemplate {
    /// An empty template.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to place a fighter recipe.
    #[must_use]
    pub fn with(mut self, position: Position, spec: FighterSpec) -> Self {
        self.set(position, Some(spec));
        self
    }

    /// Set or clear a slot.
    pub fn set(&mut self, position: Position, spec: Option<FighterSpec>) {
        self.slots[position.row][position.col] = spec;
    }

    /// Recipe in a slot.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<&FighterSpec> {
        self.slots[position.row][position.col].as_ref()
    }

    /// Occupied slots in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &FighterSpec)> {
        CANONICAL_ORDER
            .into_iter()
            .filter_map(move |pos| self.get(pos).map(|s| (pos, s)))
    }

    /// Build a fresh fighters' squad. Fails on the first invalid class.
    pub fn build(&self, rules: &dyn StatRules) -> Result<Squad> {
        let mut squad = Squad::new();
        for (position, spec) in self.iter() {
            squad.place(position, Combatant::fighter(spec, rules)?);
        }
        Ok(squad)
    }
}
