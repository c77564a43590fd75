use rustc_hash::FxHashMap;
use tracing::{debug, info, trace};

use crate::{
    error::Error,
    frontier::Frontier,
    grid::{Grid, Pos},
    state::{PathState, ReducedKey, RunPolicy, Variant},
};

/// Ordering hint added to a state's cost when ranking the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Heuristic {
    /// Plain Dijkstra.
    None,
    /// Manhattan distance to the goal times the grid's cheapest cell. Never overestimates.
    #[default]
    Manhattan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchConfig {
    pub policy: RunPolicy,
    pub heuristic: Heuristic,
    /// Give up with [`Error::BudgetExceeded`] after this many pops.
    pub budget: Option<u64>,
    /// Bound the frontier size. Approximate: see [`Frontier::with_capacity_limit`].
    pub frontier_cap: Option<usize>,
}

impl SearchConfig {
    pub fn with_policy(mut self, policy: RunPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_frontier_cap(mut self, cap: usize) -> Self {
        self.frontier_cap = Some(cap);
        self
    }
}

impl From<Variant> for SearchConfig {
    fn from(variant: Variant) -> Self {
        Self::default().with_policy(variant.policy())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Found { cost: u32 },
    /// Every reachable state was settled without stopping at the goal.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStats {
    pub pops: u64,
    pub pushes: u64,
    /// Pops skipped because their key was already settled at least as cheaply.
    pub discarded: u64,
    pub peak_frontier: usize,
}

/// Hooks into the search loop for diagnostics. All methods default to doing nothing.
pub trait SearchObserver {
    fn on_pop(&mut self, _state: &PathState, _frontier_len: usize) {}

    fn on_push(&mut self, _state: &PathState) {}

    fn on_finish(&mut self, _status: Status, _stats: &SearchStats) {}
}

impl SearchObserver for () {}

impl<O: SearchObserver + ?Sized> SearchObserver for &mut O {
    fn on_pop(&mut self, state: &PathState, frontier_len: usize) {
        (**self).on_pop(state, frontier_len)
    }

    fn on_push(&mut self, state: &PathState) {
        (**self).on_push(state)
    }

    fn on_finish(&mut self, status: Status, stats: &SearchStats) {
        (**self).on_finish(status, stats)
    }
}

/// Logs a progress line every `every` pops.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    every: u64,
    pops: u64,
}

impl ProgressLog {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            pops: 0,
        }
    }
}

impl SearchObserver for ProgressLog {
    fn on_pop(&mut self, state: &PathState, frontier_len: usize) {
        self.pops += 1;
        if self.pops % self.every == 0 {
            info!(
                pops = self.pops,
                frontier = frontier_len,
                cost = state.cost,
                "at {}",
                state.pos
            );
        }
    }

    fn on_finish(&mut self, status: Status, stats: &SearchStats) {
        info!(?status, pops = stats.pops, "search finished");
    }
}

struct Node {
    state: PathState,
    parent: Option<ReducedKey>,
}

struct Settled {
    cost: u32,
    parent: Option<ReducedKey>,
}

/// Best-first search for the cheapest route from the top-left to the bottom-right cell.
///
/// A state is settled the first time it is popped with a cost strictly below anything recorded for
/// its [`ReducedKey`]; only settled states are expanded. The first settled state that may stop at
/// the goal ends the search.
pub struct Search<'g, O = ()> {
    grid: &'g Grid,
    config: SearchConfig,
    frontier: Frontier<Node>,
    settled: FxHashMap<ReducedKey, Settled>,
    goal: Option<ReducedKey>,
    status: Status,
    stats: SearchStats,
    observer: O,
}

impl<'g> Search<'g> {
    pub fn new(grid: &'g Grid, config: SearchConfig) -> Self {
        Self::with_observer(grid, config, ())
    }
}

impl<'g, O: SearchObserver> Search<'g, O> {
    pub fn with_observer(grid: &'g Grid, config: SearchConfig, observer: O) -> Self {
        let frontier = match config.frontier_cap {
            Some(cap) => Frontier::with_capacity_limit(cap),
            None => Frontier::new(),
        };
        let mut search = Self {
            grid,
            config,
            frontier,
            settled: FxHashMap::default(),
            goal: None,
            status: Status::Running,
            stats: SearchStats::default(),
            observer,
        };
        search.push(PathState::initial(), None);
        search
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    fn heuristic(&self, pos: Pos) -> u32 {
        match self.config.heuristic {
            Heuristic::None => 0,
            Heuristic::Manhattan => {
                let steps = u32::try_from(pos.manhattan(self.grid.goal())).unwrap_or(u32::MAX);
                steps.saturating_mul(self.grid.min_cost())
            }
        }
    }

    fn push(&mut self, state: PathState, parent: Option<ReducedKey>) {
        let priority = state.cost.saturating_add(self.heuristic(state.pos));
        self.observer.on_push(&state);
        self.frontier.push(priority, Node { state, parent });
        self.stats.pushes += 1;
        self.stats.peak_frontier = self.stats.peak_frontier.max(self.frontier.len());
    }

    fn is_settled_within(&self, key: &ReducedKey, cost: u32) -> bool {
        self.settled.get(key).is_some_and(|s| s.cost <= cost)
    }

    fn finish(&mut self, status: Status) -> Status {
        self.status = status;
        debug!(
            ?status,
            pops = self.stats.pops,
            pushes = self.stats.pushes,
            discarded = self.stats.discarded,
            peak_frontier = self.stats.peak_frontier,
            dropped = self.frontier.dropped(),
            "search done"
        );
        self.observer.on_finish(status, &self.stats);
        status
    }

    /// Advances the search by one pop. Terminal statuses are sticky.
    pub fn step(&mut self) -> Result<Status, Error> {
        if self.status != Status::Running {
            return Ok(self.status);
        }
        if self.frontier.is_empty() {
            return Ok(self.finish(Status::Exhausted));
        }
        if let Some(limit) = self.config.budget {
            if self.stats.pops >= limit {
                return Err(Error::BudgetExceeded { limit });
            }
        }

        let Some((_, Node { state, parent })) = self.frontier.pop_min() else {
            return Ok(self.finish(Status::Exhausted));
        };
        self.stats.pops += 1;
        self.observer.on_pop(&state, self.frontier.len());

        let policy = self.config.policy;
        let key = state.reduced_key(policy);
        if self.is_settled_within(&key, state.cost) {
            self.stats.discarded += 1;
            trace!(?key, cost = state.cost, "already settled");
            return Ok(Status::Running);
        }
        self.settled.insert(
            key,
            Settled {
                cost: state.cost,
                parent,
            },
        );

        if state.is_goal(self.grid, policy) {
            self.goal = Some(key);
            return Ok(self.finish(Status::Found { cost: state.cost }));
        }

        let grid = self.grid;
        for next in state.expand(grid, policy) {
            if !self.is_settled_within(&next.reduced_key(policy), next.cost) {
                self.push(next, Some(key));
            }
        }
        Ok(Status::Running)
    }

    /// Runs to completion and returns the minimal cost.
    pub fn run(&mut self) -> Result<u32, Error> {
        loop {
            match self.step()? {
                Status::Running => continue,
                Status::Found { cost } => return Ok(cost),
                Status::Exhausted => return Err(Error::NoPathFound),
            }
        }
    }

    /// Cells visited by the cheapest route, start first. Only available once the goal was found.
    pub fn route(&self) -> Option<Vec<Pos>> {
        let mut key = self.goal?;
        let mut route = vec![key.pos];
        while let Some(parent) = self.settled.get(&key)?.parent {
            route.push(parent.pos);
            key = parent;
            if route.len() > self.settled.len() {
                return None;
            }
        }
        route.reverse();
        Some(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;
    use indoc::indoc;
    use proptest::prelude::*;

    use crate::grid::Direction;

    const EXAMPLE: &str = indoc! {"
        2413432311323
        3215453535623
        3255245654254
        3446585845452
        4546657867536
        1438598798454
        4457876987766
        3637877979653
        4654967986887
        4564679986453
        1224686865563
        2546548887735
        4322674655533
    "};

    const LONG_CORRIDOR: &str = indoc! {"
        111111111111
        999999999991
        999999999991
        999999999991
        999999999991
    "};

    fn min_cost(grid: &Grid, config: SearchConfig) -> Result<u32, Error> {
        Search::new(grid, config).run()
    }

    /// Checks that consecutive cells are neighbours and that every run obeys `policy`.
    fn assert_route_follows(route: &[Pos], policy: RunPolicy) {
        let dirs: Vec<Direction> = route
            .windows(2)
            .map(|pair| Direction::between(pair[0], pair[1]).expect("orthogonal step"))
            .collect();
        let mut runs = Vec::new();
        for &dir in &dirs {
            if let Some((last, len)) = runs.last_mut() {
                if *last == dir {
                    *len += 1;
                    continue;
                }
            }
            runs.push((dir, 1u8));
        }
        for pair in runs.windows(2) {
            assert_ne!(pair[0].0.turn_left().turn_left(), pair[1].0, "reversal");
        }
        for (_, len) in runs {
            assert!(len >= policy.min_run && len <= policy.max_run, "run of {len}");
        }
    }

    #[test]
    fn example_classic() -> Result<()> {
        let grid = Grid::load(EXAMPLE)?;
        assert_eq!(min_cost(&grid, Variant::Classic.into())?, 102);
        Ok(())
    }

    #[test]
    fn example_ultra() -> Result<()> {
        let grid = Grid::load(EXAMPLE)?;
        assert_eq!(min_cost(&grid, Variant::Ultra.into())?, 94);
        let corridor = Grid::load(LONG_CORRIDOR)?;
        assert_eq!(min_cost(&corridor, Variant::Ultra.into())?, 71);
        Ok(())
    }

    #[test]
    fn dijkstra_agrees_with_heuristic() -> Result<()> {
        let grid = Grid::load(EXAMPLE)?;
        for variant in [Variant::Classic, Variant::Ultra] {
            let config = SearchConfig::from(variant);
            let guided = min_cost(&grid, config)?;
            let plain = min_cost(&grid, config.with_heuristic(Heuristic::None))?;
            assert_eq!(guided, plain);
        }
        Ok(())
    }

    #[test]
    fn single_cell() -> Result<()> {
        let grid = Grid::load("1\n")?;
        assert_eq!(min_cost(&grid, Variant::Classic.into())?, 0);
        assert_eq!(
            min_cost(&grid, Variant::Ultra.into()),
            Err(Error::NoPathFound)
        );
        Ok(())
    }

    #[test]
    fn unreachable_goal_exhausts() -> Result<()> {
        // Four steps east with no room to turn.
        let grid = Grid::load("11111\n")?;
        let mut search = Search::new(&grid, SearchConfig::default());
        assert_eq!(search.run(), Err(Error::NoPathFound));
        assert_eq!(search.status(), Status::Exhausted);
        assert_eq!(search.route(), None);
        assert_eq!(search.step()?, Status::Exhausted);

        let wide = Grid::load("1111\n")?;
        assert_eq!(min_cost(&wide, SearchConfig::default())?, 3);
        Ok(())
    }

    #[test]
    fn exhaustion_wins_over_a_spent_budget() -> Result<()> {
        let grid = Grid::load("11111\n")?;
        let mut unlimited = Search::new(&grid, SearchConfig::default());
        assert_eq!(unlimited.run(), Err(Error::NoPathFound));
        assert_eq!(unlimited.stats().pops, 4);

        let mut exact = Search::new(&grid, SearchConfig::default().with_budget(4));
        assert_eq!(exact.run(), Err(Error::NoPathFound));
        assert_eq!(exact.status(), Status::Exhausted);

        let mut short = Search::new(&grid, SearchConfig::default().with_budget(3));
        assert_eq!(short.run(), Err(Error::BudgetExceeded { limit: 3 }));
        Ok(())
    }

    #[test]
    fn huge_cells_do_not_overflow() -> Result<()> {
        // Every route enters two `u32::MAX` cells.
        let walled = Grid::from_rows(&[vec![0, u32::MAX], vec![u32::MAX, u32::MAX]])?;
        for variant in [Variant::Classic, Variant::Ultra] {
            let config = SearchConfig::from(variant);
            assert_eq!(min_cost(&walled, config), Err(Error::NoPathFound));
            assert_eq!(
                min_cost(&walled, config.with_heuristic(Heuristic::None)),
                Err(Error::NoPathFound)
            );
        }

        let detour = Grid::from_rows(&[vec![0, u32::MAX], vec![1, 2]])?;
        assert_eq!(min_cost(&detour, SearchConfig::default())?, 3);

        let single_max = Grid::from_rows(&[vec![0, u32::MAX]])?;
        assert_eq!(min_cost(&single_max, SearchConfig::default())?, u32::MAX);
        Ok(())
    }

    #[test]
    fn budget_is_enforced() -> Result<()> {
        let grid = Grid::load(EXAMPLE)?;
        let mut search = Search::new(&grid, SearchConfig::default().with_budget(10));
        assert_eq!(search.run(), Err(Error::BudgetExceeded { limit: 10 }));
        assert_eq!(search.status(), Status::Running);
        assert_eq!(search.stats().pops, 10);

        let generous = SearchConfig::default().with_budget(1_000_000);
        assert_eq!(min_cost(&grid, generous)?, 102);
        Ok(())
    }

    #[test]
    fn route_matches_cost_and_policy() -> Result<()> {
        let grid = Grid::load(EXAMPLE)?;
        for variant in [Variant::Classic, Variant::Ultra] {
            let mut search = Search::new(&grid, variant.into());
            let cost = search.run()?;
            let route = search.route().expect("route after Found");
            assert_eq!(route.first(), Some(&Pos::new(0, 0)));
            assert_eq!(route.last(), Some(&grid.goal()));
            assert_eq!(grid.route_cost(&route)?, cost);
            assert_route_follows(&route, variant.policy());
        }
        Ok(())
    }

    #[test]
    fn observer_sees_every_pop_and_push() -> Result<()> {
        #[derive(Default)]
        struct Counter {
            pops: u64,
            pushes: u64,
            finished: Option<Status>,
        }

        impl SearchObserver for Counter {
            fn on_pop(&mut self, _state: &PathState, _frontier_len: usize) {
                self.pops += 1;
            }

            fn on_push(&mut self, _state: &PathState) {
                self.pushes += 1;
            }

            fn on_finish(&mut self, status: Status, _stats: &SearchStats) {
                self.finished = Some(status);
            }
        }

        let grid = Grid::load(EXAMPLE)?;
        let mut counter = Counter::default();
        let mut search = Search::with_observer(&grid, SearchConfig::default(), &mut counter);
        search.run()?;
        let stats = *search.stats();
        drop(search);
        assert_eq!(counter.pops, stats.pops);
        assert_eq!(counter.pushes, stats.pushes);
        assert_eq!(counter.finished, Some(Status::Found { cost: 102 }));
        assert!(stats.peak_frontier > 0);
        Ok(())
    }

    #[test]
    fn progress_log_observer_runs() -> Result<()> {
        let grid = Grid::load(EXAMPLE)?;
        let mut search = Search::with_observer(&grid, Variant::Ultra.into(), ProgressLog::new(100));
        assert_eq!(search.run()?, 94);
        Ok(())
    }

    #[test]
    fn roomy_frontier_cap_keeps_the_optimum() -> Result<()> {
        let grid = Grid::load(EXAMPLE)?;
        let config = SearchConfig::default().with_frontier_cap(100_000);
        assert_eq!(min_cost(&grid, config)?, 102);

        // A tiny frontier still terminates, with some answer or none.
        let tiny = SearchConfig::default().with_frontier_cap(4);
        match min_cost(&grid, tiny) {
            Ok(cost) => assert!(cost >= 102),
            Err(err) => assert_eq!(err, Error::NoPathFound),
        }
        Ok(())
    }

    #[test]
    fn repeated_runs_agree() -> Result<()> {
        let grid = Grid::load(EXAMPLE)?;
        let first = {
            let mut search = Search::new(&grid, SearchConfig::default());
            (search.run()?, search.route(), *search.stats())
        };
        let second = {
            let mut search = Search::new(&grid, SearchConfig::default());
            (search.run()?, search.route(), *search.stats())
        };
        assert_eq!(first, second);
        Ok(())
    }

    fn grid_rows() -> impl Strategy<Value = Vec<Vec<u32>>> {
        (1usize..7, 1usize..7).prop_flat_map(|(width, height)| {
            prop::collection::vec(prop::collection::vec(1u32..=9, width), height)
        })
    }

    fn variants() -> impl Strategy<Value = Variant> {
        prop_oneof![Just(Variant::Classic), Just(Variant::Ultra)]
    }

    proptest! {
        #[test]
        fn solving_is_deterministic(rows in grid_rows(), variant in variants()) {
            let grid = Grid::from_rows(&rows).unwrap();
            let a = min_cost(&grid, variant.into());
            let b = min_cost(&grid, variant.into());
            prop_assert_eq!(a, b);
        }

        #[test]
        fn heuristic_never_changes_the_answer(rows in grid_rows(), variant in variants()) {
            let grid = Grid::from_rows(&rows).unwrap();
            let config = SearchConfig::from(variant);
            prop_assert_eq!(
                min_cost(&grid, config),
                min_cost(&grid, config.with_heuristic(Heuristic::None))
            );
        }

        #[test]
        fn raising_a_cell_never_lowers_the_cost(
            rows in grid_rows(),
            variant in variants(),
            pick in any::<prop::sample::Index>(),
            extra in 1u32..20,
        ) {
            let grid = Grid::from_rows(&rows).unwrap();
            let mut raised_rows = rows.clone();
            let width = rows[0].len();
            let i = pick.index(width * rows.len());
            raised_rows[i / width][i % width] += extra;
            let raised = Grid::from_rows(&raised_rows).unwrap();

            let config = SearchConfig::from(variant);
            match (min_cost(&grid, config), min_cost(&raised, config)) {
                (Ok(before), Ok(after)) => prop_assert!(after >= before),
                (before, after) => {
                    prop_assert_eq!(before, Err(Error::NoPathFound));
                    prop_assert_eq!(after, Err(Error::NoPathFound));
                }
            }
        }

        #[test]
        fn found_routes_pay_what_they_report(rows in grid_rows(), variant in variants()) {
            let grid = Grid::from_rows(&rows).unwrap();
            let mut search = Search::new(&grid, variant.into());
            if let Ok(cost) = search.run() {
                let route = search.route().unwrap();
                prop_assert_eq!(grid.route_cost(&route).unwrap(), cost);
            }
        }
    }
}
