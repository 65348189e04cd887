use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use super::SearchOutcome;
use crate::grid::{is_occupied, Grid, ObstacleSet};
use crate::types::{Coord, Direction};

/// One discovered route to a cell. Routes live in an arena and point at their parent.
struct Trail {
    parent: Option<usize>,
    step: Option<Direction>,
    cost: u32,
}

#[derive(Clone, Copy)]
struct Node {
    priority: f64,
    position: Coord,
    trail: usize,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

// BinaryHeap is a max-heap; every comparison is flipped so the lowest priority
// pops first. Ties fall back to the position, then to discovery order.
impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.position.cmp(&self.position))
            .then_with(|| other.trail.cmp(&self.trail))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best-first search keyed by `cost + heuristic(next)`, unit cost per step.
///
/// Cells are marked visited on pop; a cell may be queued several times, each
/// with its own route.
pub(super) fn best_first<H>(
    start: Coord,
    goal: Coord,
    obstacles: &ObstacleSet,
    grid: &Grid,
    heuristic: H,
) -> SearchOutcome
where
    H: Fn(Coord) -> f64,
{
    let mut trails = vec![Trail {
        parent: None,
        step: None,
        cost: 0,
    }];
    let mut heap = BinaryHeap::new();
    heap.push(Node {
        priority: 0.0,
        position: start,
        trail: 0,
    });

    let mut visited: HashSet<Coord> = HashSet::new();
    let mut explored = Vec::new();

    while let Some(node) = heap.pop() {
        explored.push(node.position);

        if node.position == goal {
            return SearchOutcome {
                path: reconstruct(&trails, node.trail),
                explored,
                reached: true,
            };
        }

        if !visited.insert(node.position) {
            continue;
        }

        let cost = trails[node.trail].cost + 1;
        for (dir, next) in grid.neighbors(node.position) {
            if is_occupied(next, obstacles) || visited.contains(&next) {
                continue;
            }

            trails.push(Trail {
                parent: Some(node.trail),
                step: Some(dir),
                cost,
            });
            heap.push(Node {
                priority: cost as f64 + heuristic(next),
                position: next,
                trail: trails.len() - 1,
            });
        }
    }

    SearchOutcome::unreachable(explored)
}

fn reconstruct(trails: &[Trail], mut index: usize) -> Vec<Direction> {
    let mut path = Vec::with_capacity(trails[index].cost as usize);
    while let Some(dir) = trails[index].step {
        path.push(dir);
        match trails[index].parent {
            Some(parent) => index = parent,
            None => break,
        }
    }
    path.reverse();
    path
}
