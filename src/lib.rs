//! Cheapest routes for a crucible that may not go straight for too long.
//!
//! A [`Grid`] of digit costs is searched from the top-left to the bottom-right cell. Every route
//! must follow a [`RunPolicy`]: it may never reverse, must turn after `max_run` straight moves and
//! may only turn or stop after `min_run` of them.

mod error;
mod frontier;
mod grid;
mod search;
mod solutions;
mod state;

use anyhow::{Context, Result};

pub use error::{Error, ParseError};
pub use frontier::Frontier;
pub use grid::{Direction, Grid, Pos};
pub use search::{Heuristic, ProgressLog, Search, SearchConfig, SearchObserver, SearchStats, Status};
pub use solutions::{day17, HeatLoss};
pub use state::{PathState, ReducedKey, RunPolicy, Variant};

/// Minimal total cost of a route through `grid_text` under `variant`.
pub fn solve(grid_text: &str, variant: Variant) -> Result<u32, Error> {
    let grid = Grid::load(grid_text)?;
    Search::new(&grid, variant.into()).run()
}

pub fn load_input(path: impl AsRef<std::path::Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn default_input(n: usize) -> Result<String> {
    load_input(format!("inputs/{}.txt", n))
}
