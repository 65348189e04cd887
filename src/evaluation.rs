// Static evaluation of a two-agent position, higher is better for `self`
//
// Terms, in order:
//   head off the grid             -> fixed penalty, nothing else counts
//   head on the goal              -> fixed bonus, nothing else counts
//   base - manhattan(head, goal)
//   + cells free of either body
//   - opponent proximity penalty   (nearest opponent cell closer than threshold)
//   - self overlap penalty         (head on a segment past the neck)
//   - boundary penalty per axis    (head on an edge row/column, clamped grids)

use serde::{Deserialize, Serialize};

use crate::grid::{manhattan, Grid, OccupancyScratch};
use crate::types::{BoundaryPolicy, Coord};

/// When the edge penalty applies
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPenaltyMode {
    /// Only on clamped grids
    #[default]
    Auto,
    Always,
    Never,
}

/// Fixed evaluation constants
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EvalWeights {
    pub goal_bonus: f64,
    pub out_of_bounds_penalty: f64,
    pub base_score: f64,
    pub opponent_proximity_threshold: i32,
    pub opponent_proximity_penalty: f64,
    pub self_overlap_penalty: f64,
    pub boundary_penalty: f64,
    pub boundary_penalty_mode: BoundaryPenaltyMode,
    /// Upper bound of the uniform noise minimax may add to leaf scores. 0 disables it.
    pub tie_break_jitter: f64,
}

impl Default for EvalWeights {
    fn default() -> Self {
        EvalWeights {
            goal_bonus: 10000.0,
            out_of_bounds_penalty: 10000.0,
            base_score: 1000.0,
            opponent_proximity_threshold: 2,
            opponent_proximity_penalty: 50.0,
            self_overlap_penalty: 100.0,
            boundary_penalty: 50.0,
            boundary_penalty_mode: BoundaryPenaltyMode::Auto,
            tie_break_jitter: 0.0,
        }
    }
}

impl EvalWeights {
    pub fn boundary_penalty_applies(&self, grid: &Grid) -> bool {
        match self.boundary_penalty_mode {
            BoundaryPenaltyMode::Auto => grid.boundary() == BoundaryPolicy::Clamped,
            BoundaryPenaltyMode::Always => true,
            BoundaryPenaltyMode::Never => false,
        }
    }
}

/// Evaluator with a reusable occupancy buffer for the free-cell count.
///
/// Never mutates either body; the scratch buffer is the only state and does not
/// affect results.
#[derive(Debug, Clone)]
pub struct Evaluator {
    weights: EvalWeights,
    scratch: OccupancyScratch,
    boundary_penalty: bool,
}

impl Evaluator {
    pub fn new(grid: &Grid, weights: EvalWeights) -> Self {
        Evaluator {
            boundary_penalty: weights.boundary_penalty_applies(grid),
            scratch: OccupancyScratch::new(grid),
            weights,
        }
    }

    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    /// Scores the position for the owner of `self_body`
    pub fn evaluate(
        &mut self,
        self_body: &[Coord],
        opponent_body: &[Coord],
        goal: Coord,
        grid: &Grid,
    ) -> f64 {
        let Some(&head) = self_body.first() else {
            return -self.weights.out_of_bounds_penalty;
        };

        if !grid.in_bounds(head) {
            return -self.weights.out_of_bounds_penalty;
        }

        if head == goal {
            return self.weights.goal_bonus;
        }

        let distance_to_goal = manhattan(head, goal) as f64;

        let opponent_penalty = match opponent_body.iter().map(|&cell| manhattan(head, cell)).min() {
            Some(d) if d < self.weights.opponent_proximity_threshold => {
                self.weights.opponent_proximity_penalty
            }
            _ => 0.0,
        };

        let self_penalty = if self_body.iter().skip(2).any(|&cell| cell == head) {
            self.weights.self_overlap_penalty
        } else {
            0.0
        };

        let mut boundary_penalty = 0.0;
        if self.boundary_penalty {
            if grid.on_edge_x(head) {
                boundary_penalty += self.weights.boundary_penalty;
            }
            if grid.on_edge_y(head) {
                boundary_penalty += self.weights.boundary_penalty;
            }
        }

        let free_cells = self.scratch.count_free(grid, &[self_body, opponent_body]) as f64;

        self.weights.base_score - distance_to_goal + free_cells
            - opponent_penalty
            - self_penalty
            - boundary_penalty
    }
}

/// One-shot evaluation with a fresh scratch buffer
pub fn evaluate(
    self_body: &[Coord],
    opponent_body: &[Coord],
    goal: Coord,
    grid: &Grid,
    weights: &EvalWeights,
) -> f64 {
    Evaluator::new(grid, weights.clone()).evaluate(self_body, opponent_body, goal, grid)
}
