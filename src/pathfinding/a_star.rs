use super::frontier::best_first;
use super::SearchOutcome;
use crate::grid::{euclidean, Grid, ObstacleSet};
use crate::types::Coord;

/// A* with straight-line distance as the heuristic.
///
/// Callers must not rely on the result being a shortest path.
pub(super) fn search(start: Coord, goal: Coord, obstacles: &ObstacleSet, grid: &Grid) -> SearchOutcome {
    best_first(start, goal, obstacles, grid, |next| euclidean(next, goal))
}
