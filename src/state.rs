use std::{fmt, str::FromStr};

use crate::{
    error::Error,
    grid::{Direction, Grid, Pos},
};

/// How many consecutive moves a path must (`min_run`) and may (`max_run`) take in one direction
/// before turning. `min_run` also applies to stopping at the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunPolicy {
    pub min_run: u8,
    pub max_run: u8,
}

impl RunPolicy {
    pub const CLASSIC: Self = Self {
        min_run: 1,
        max_run: 3,
    };
    pub const ULTRA: Self = Self {
        min_run: 4,
        max_run: 10,
    };
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self::CLASSIC
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    Classic,
    Ultra,
}

impl Variant {
    pub fn policy(self) -> RunPolicy {
        match self {
            Self::Classic => RunPolicy::CLASSIC,
            Self::Ultra => RunPolicy::ULTRA,
        }
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "ultra" => Ok(Self::Ultra),
            _ => Err(Error::UnknownVariant(s.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Classic => "classic",
            Self::Ultra => "ultra",
        })
    }
}

/// Everything about a partial route that matters for its future: where it is, how it got there
/// and what it has paid. The route itself is not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathState {
    pub pos: Pos,
    /// `None` only at the start, before the first move.
    pub direction: Option<Direction>,
    /// Consecutive moves taken in `direction`.
    pub run: u8,
    pub cost: u32,
}

/// Dedupe signature of a [`PathState`]. Runs at or above the policy maximum all allow the same
/// moves and are folded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReducedKey {
    pub pos: Pos,
    pub direction: Option<Direction>,
    pub run: u8,
}

impl PathState {
    pub fn initial() -> Self {
        Self {
            pos: Pos::new(0, 0),
            direction: None,
            run: 0,
            cost: 0,
        }
    }

    /// Candidate `(direction, run)` pairs before bounds checking. Reversing is never offered.
    fn moves(&self, policy: RunPolicy) -> [Option<(Direction, u8)>; 4] {
        match self.direction {
            None => Direction::ALL.map(|dir| Some((dir, 1))),
            Some(dir) => {
                let may_turn = self.run >= policy.min_run;
                let may_continue = self.run < policy.max_run;
                [
                    may_turn.then(|| (dir.turn_left(), 1)),
                    may_turn.then(|| (dir.turn_right(), 1)),
                    may_continue.then(|| (dir, self.run + 1)),
                    None,
                ]
            }
        }
    }

    /// Successors that stay on the grid and respect `policy`, each charged the cost of the cell
    /// it enters. A successor whose cost would overflow `u32` is dropped. Order: left, right, straight (or east, south, west, north from the start).
    pub fn expand<'g>(
        &self,
        grid: &'g Grid,
        policy: RunPolicy,
    ) -> impl Iterator<Item = PathState> + 'g {
        let from = *self;
        self.moves(policy)
            .into_iter()
            .flatten()
            .filter_map(move |(dir, run)| {
                let pos = dir.step(from.pos)?;
                let cost = from.cost.checked_add(grid.get(pos)?)?;
                Some(PathState {
                    pos,
                    direction: Some(dir),
                    run,
                    cost,
                })
            })
    }

    /// Whether the route may end here. The start counts as a finished route only when the
    /// policy has no real minimum.
    pub fn can_stop(&self, policy: RunPolicy) -> bool {
        match self.direction {
            None => policy.min_run <= 1,
            Some(_) => self.run >= policy.min_run,
        }
    }

    pub fn is_goal(&self, grid: &Grid, policy: RunPolicy) -> bool {
        self.pos == grid.goal() && self.can_stop(policy)
    }

    pub fn reduced_key(&self, policy: RunPolicy) -> ReducedKey {
        ReducedKey {
            pos: self.pos,
            direction: self.direction,
            run: self.run.min(policy.max_run),
        }
    }
}
