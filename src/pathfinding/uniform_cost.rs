use super::frontier::best_first;
use super::SearchOutcome;
use crate::grid::{Grid, ObstacleSet};
use crate::types::Coord;

/// Uniform-cost search: every edge costs 1, so this returns a shortest path.
pub(super) fn search(start: Coord, goal: Coord, obstacles: &ObstacleSet, grid: &Grid) -> SearchOutcome {
    best_first(start, goal, obstacles, grid, |_| 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    #[test]
    fn test_ucs_ties_prefer_lower_position() {
        // (1,1) is reachable via (0,1) or (1,0) at equal cost; the heap pops (0,1)
        // first because positions compare by column, then row.
        let grid = Grid::clamped(3, 3).unwrap();
        let outcome = search(Coord::new(0, 0), Coord::new(1, 1), &ObstacleSet::new(), &grid);
        assert!(outcome.reached);
        assert_eq!(outcome.path, vec![Direction::Down, Direction::Right]);
    }

    #[test]
    fn test_ucs_routes_around_wall() {
        let grid = Grid::clamped(5, 5).unwrap();
        let wall: ObstacleSet = (0..4).map(|y| Coord::new(2, y)).collect();
        let outcome = search(Coord::new(0, 0), Coord::new(4, 0), &wall, &grid);
        assert!(outcome.reached);
        // Down to row 4, across, and back up
        assert_eq!(outcome.path.len(), 12);
    }
}
