//! Path search from an agent's head to a goal cell.
//!
//! Three interchangeable strategies share one contract: depth-first search,
//! uniform-cost search and A*. All of them expand neighbors through
//! [`Grid::neighbors`], mark cells visited when they are popped (not when they
//! are pushed) and report an unreachable goal as an empty path rather than an
//! error.

mod a_star;
mod depth_first;
mod frontier;
mod uniform_cost;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::grid::{Grid, ObstacleSet};
use crate::types::{Coord, Direction};

/// Which path finder to run
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PathStrategy {
    /// Stack-based, produces *a* path, not necessarily the shortest
    DepthFirst,
    /// Priority queue on path length, produces a shortest path
    UniformCost,
    /// Priority queue on path length plus Euclidean distance to goal
    AStar,
}

impl PathStrategy {
    pub fn all() -> [PathStrategy; 3] {
        [
            PathStrategy::DepthFirst,
            PathStrategy::UniformCost,
            PathStrategy::AStar,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathStrategy::DepthFirst => "dfs",
            PathStrategy::UniformCost => "ucs",
            PathStrategy::AStar => "astar",
        }
    }

    /// Runs the search and returns the path together with the exploration trace
    pub fn search(
        &self,
        start: Coord,
        goal: Coord,
        obstacles: &ObstacleSet,
        grid: &Grid,
    ) -> Result<SearchOutcome, EngineError> {
        grid.check(start)?;
        grid.check(goal)?;

        let outcome = match self {
            PathStrategy::DepthFirst => depth_first::search(start, goal, obstacles, grid),
            PathStrategy::UniformCost => uniform_cost::search(start, goal, obstacles, grid),
            PathStrategy::AStar => a_star::search(start, goal, obstacles, grid),
        };

        debug!(
            "{} {} -> {}: reached={} path_len={} explored={}",
            self.as_str(),
            start,
            goal,
            outcome.reached,
            outcome.path.len(),
            outcome.explored.len()
        );

        Ok(outcome)
    }

    /// Directions leading from `start` to `goal`; empty when the goal is unreachable
    pub fn find_path(
        &self,
        start: Coord,
        goal: Coord,
        obstacles: &ObstacleSet,
        grid: &Grid,
    ) -> Result<Vec<Direction>, EngineError> {
        self.search(start, goal, obstacles, grid)
            .map(|outcome| outcome.path)
    }
}

/// Result of a path search
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchOutcome {
    /// Moves from start to goal, in order
    pub path: Vec<Direction>,
    /// Every position popped from the frontier, in pop order
    pub explored: Vec<Coord>,
    /// False when the frontier was exhausted without reaching the goal
    pub reached: bool,
}

impl SearchOutcome {
    fn unreachable(explored: Vec<Coord>) -> Self {
        SearchOutcome {
            path: Vec::new(),
            explored,
            reached: false,
        }
    }

    /// Cells visited when following the path from `start`, excluding `start`
    pub fn cells(&self, start: Coord, grid: &Grid) -> Vec<Coord> {
        let mut pos = start;
        let mut cells = Vec::with_capacity(self.path.len());
        for &dir in &self.path {
            match grid.step(pos, dir) {
                Some(next) => {
                    cells.push(next);
                    pos = next;
                }
                None => break,
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_equals_goal_is_reached_with_empty_path() {
        let grid = Grid::clamped(5, 5).unwrap();
        for strategy in PathStrategy::all() {
            let outcome = strategy
                .search(Coord::new(2, 2), Coord::new(2, 2), &ObstacleSet::new(), &grid)
                .unwrap();
            assert!(outcome.reached, "{} should report reached", strategy.as_str());
            assert!(outcome.path.is_empty());
        }
    }

    #[test]
    fn test_goal_outside_grid_is_a_contract_violation() {
        let grid = Grid::clamped(5, 5).unwrap();
        let result = PathStrategy::AStar.find_path(
            Coord::new(0, 0),
            Coord::new(5, 0),
            &ObstacleSet::new(),
            &grid,
        );
        assert!(matches!(result, Err(EngineError::OutOfBounds { .. })));
    }

    #[test]
    fn test_cells_follow_path() {
        let grid = Grid::clamped(5, 5).unwrap();
        let outcome = SearchOutcome {
            path: vec![Direction::Right, Direction::Down],
            explored: vec![],
            reached: true,
        };
        assert_eq!(
            outcome.cells(Coord::new(0, 0), &grid),
            vec![Coord::new(1, 0), Coord::new(1, 1)]
        );
    }
}
