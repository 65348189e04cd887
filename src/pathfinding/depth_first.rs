use std::collections::{HashMap, HashSet};

use super::SearchOutcome;
use crate::grid::{is_occupied, Grid, ObstacleSet};
use crate::types::{Coord, Direction};

/// Stack-based depth-first search.
///
/// A cell is marked visited when popped, so the same cell can sit on the stack
/// several times. Each push overwrites the cell's parent link; since the most
/// recent push is popped first, the link that survives is the one the cell was
/// actually expanded from.
pub(super) fn search(start: Coord, goal: Coord, obstacles: &ObstacleSet, grid: &Grid) -> SearchOutcome {
    let mut stack = vec![start];
    let mut parent: HashMap<Coord, (Coord, Direction)> = HashMap::new();
    let mut visited: HashSet<Coord> = HashSet::new();
    let mut explored = Vec::new();

    while let Some(position) = stack.pop() {
        explored.push(position);

        if position == goal {
            return SearchOutcome {
                path: reconstruct(&parent, start, goal),
                explored,
                reached: true,
            };
        }

        if !visited.insert(position) {
            continue;
        }

        for (dir, next) in grid.neighbors(position) {
            if is_occupied(next, obstacles) || visited.contains(&next) {
                continue;
            }
            stack.push(next);
            parent.insert(next, (position, dir));
        }
    }

    SearchOutcome::unreachable(explored)
}

fn reconstruct(parent: &HashMap<Coord, (Coord, Direction)>, start: Coord, goal: Coord) -> Vec<Direction> {
    let mut path = Vec::new();
    let mut position = goal;

    while position != start {
        match parent.get(&position) {
            Some(&(prev, dir)) => {
                path.push(dir);
                position = prev;
            }
            None => break,
        }
    }

    path.reverse();
    path
}
