//! Core type definitions used throughout the codebase

use std::fmt;
use std::str::FromStr;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::core::error::SimError;

/// Stable identifier for agents, assigned densely from 0 at construction
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display(fmt = "agent#{}", _0)]
pub struct AgentId(pub u32);

/// Simulation tick counter
pub type Tick = u64;

/// Integer grid cell
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[display(fmt = "({}, {})", x, y)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two cells
    #[inline]
    pub fn manhattan(&self, other: &Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// One step toward `target`, moving along the axis with the larger
    /// absolute offset. Ties go to the x axis.
    pub fn step_toward(&self, target: Position) -> Position {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        if dx == 0 && dy == 0 {
            return *self;
        }
        if dx.abs() >= dy.abs() {
            Position::new(self.x + dx.signum(), self.y)
        } else {
            Position::new(self.x, self.y + dy.signum())
        }
    }

    /// One step toward `target` along the x axis only
    pub fn step_x_toward(&self, target: Position) -> Position {
        Position::new(self.x + (target.x - self.x).signum(), self.y)
    }

    /// One step toward `target` along the y axis only
    pub fn step_y_toward(&self, target: Position) -> Position {
        Position::new(self.x, self.y + (target.y - self.y).signum())
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Kind of tradeable good
///
/// Utility functions read `A` as their first argument and `B` as their
/// second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Good {
    A,
    B,
}

impl Good {
    pub const ALL: [Good; 2] = [Good::A, Good::B];

    pub fn as_str(self) -> &'static str {
        match self {
            Good::A => "A",
            Good::B => "B",
        }
    }
}

impl fmt::Display for Good {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Good {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" | "good1" => Ok(Good::A),
            "B" | "b" | "good2" => Ok(Good::B),
            other => Err(SimError::UnknownGood(other.to_string())),
        }
    }
}

impl TryFrom<String> for Good {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Good> for String {
    fn from(good: Good) -> Self {
        good.as_str().to_string()
    }
}
