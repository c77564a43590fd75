use std::fmt;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::{Error, Grid, Search, Variant};

/// One part's answer. An unreachable goal is a result, not a failure of the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatLoss {
    Min(u32),
    NoPath,
}

impl fmt::Display for HeatLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Min(cost) => write!(f, "{cost}"),
            Self::NoPath => f.write_str("no path"),
        }
    }
}

fn min_heat_loss(grid: &Grid, variant: Variant) -> Result<HeatLoss> {
    let mut search = Search::new(grid, variant.into());
    let cost = match search.run() {
        Ok(cost) => cost,
        Err(Error::NoPathFound) => {
            warn!(%variant, "goal unreachable");
            return Ok(HeatLoss::NoPath);
        }
        Err(err) => return Err(err).with_context(|| format!("{variant} crucible")),
    };
    if let Some(route) = search.route() {
        debug!(
            %variant,
            cost,
            steps = route.len() - 1,
            "route:\n{}",
            grid.render_route(&route)
        );
    }
    Ok(HeatLoss::Min(cost))
}

pub fn day17(input: &str) -> Result<(HeatLoss, HeatLoss)> {
    let grid = Grid::load(input)?;
    let part1 = min_heat_loss(&grid, Variant::Classic)?;
    let part2 = min_heat_loss(&grid, Variant::Ultra)?;
    Ok((part1, part2))
}
