// Two-agent adversarial search: depth-limited minimax with alpha-beta pruning
//
// Plies alternate between `self` (maximizing) and the opponent (minimizing).
// A ply moves one body: new head in front, tail dropped. Bodies for each ply
// are written into per-depth buffers that are reused across siblings, so the
// search does not allocate once the arena has been sized.

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::evaluation::{EvalWeights, Evaluator};
use crate::grid::{shift_body_into, Grid};
use crate::types::{Coord, Direction};

/// Whether alpha-beta cutoffs are taken. `Disabled` searches the full tree.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Pruning {
    #[default]
    AlphaBeta,
    Disabled,
}

/// Counters for one `search` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub leaf_evaluations: u64,
    pub cutoffs: u64,
}

/// Result of a root search
#[derive(Debug, Clone, PartialEq)]
pub struct MinimaxDecision {
    pub direction: Direction,
    /// Best root score, `None` when no root move was legal
    pub score: Option<f64>,
    /// Every root move that reached the best score, in expansion order
    pub candidates: Vec<Direction>,
    /// True when no root move was legal and the direction was drawn at random
    pub fallback: bool,
    pub stats: SearchStats,
}

/// Per-depth body buffers reused across sibling nodes
#[derive(Debug, Default)]
struct BodyArena {
    levels: Vec<Vec<Coord>>,
}

impl BodyArena {
    fn prepare(&mut self, depth: u32, capacity: usize) {
        let levels = depth as usize + 1;
        if self.levels.len() < levels {
            self.levels.resize_with(levels, Vec::new);
        }
        for level in &mut self.levels {
            level.clear();
            level.reserve(capacity);
        }
    }

    fn take(&mut self, depth: u32) -> Vec<Coord> {
        std::mem::take(&mut self.levels[depth as usize])
    }

    fn put_back(&mut self, depth: u32, buffer: Vec<Coord>) {
        self.levels[depth as usize] = buffer;
    }
}

/// Alpha-beta minimax engine. Holds only per-call scratch state.
#[derive(Debug)]
pub struct MinimaxEngine {
    grid: Grid,
    evaluator: Evaluator,
    pruning: Pruning,
    arena: BodyArena,
    stats: SearchStats,
}

impl MinimaxEngine {
    pub fn new(grid: Grid, weights: EvalWeights) -> Self {
        MinimaxEngine {
            evaluator: Evaluator::new(&grid, weights),
            grid,
            pruning: Pruning::AlphaBeta,
            arena: BodyArena::default(),
            stats: SearchStats::default(),
        }
    }

    pub fn with_pruning(mut self, pruning: Pruning) -> Self {
        self.pruning = pruning;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Chooses a direction for `self_body` looking `depth` plies ahead
    pub fn best_move<R: Rng>(
        &mut self,
        self_body: &[Coord],
        opponent_body: &[Coord],
        goal: Coord,
        depth: u32,
        rng: &mut R,
    ) -> Result<Direction, EngineError> {
        self.search(self_body, opponent_body, goal, depth, rng)
            .map(|decision| decision.direction)
    }

    /// Root search.
    ///
    /// Each legal root move is searched with a full window so its score is
    /// exact; the best-scoring moves are collected and one is drawn from `rng`.
    /// With no legal root move, any of the four directions is drawn instead.
    pub fn search<R: Rng>(
        &mut self,
        self_body: &[Coord],
        opponent_body: &[Coord],
        goal: Coord,
        depth: u32,
        rng: &mut R,
    ) -> Result<MinimaxDecision, EngineError> {
        if depth == 0 {
            return Err(EngineError::InvalidDepth);
        }
        self.grid.check_body(self_body)?;
        self.grid.check_body(opponent_body)?;
        self.grid.check(goal)?;

        self.stats = SearchStats::default();
        self.arena
            .prepare(depth, self_body.len().max(opponent_body.len()));

        let head = self_body[0];
        let heading = self.grid.infer_heading(self_body);
        let mut best_score: Option<f64> = None;
        let mut candidates: Vec<Direction> = Vec::with_capacity(4);

        let mut buffer = self.arena.take(depth);
        for dir in self.grid.expansion_order() {
            if !self.grid.permits(heading, dir) {
                continue;
            }
            let Some(new_head) = self.grid.step(head, dir) else {
                continue;
            };
            if !is_legal(new_head, self_body, opponent_body) {
                continue;
            }

            shift_body_into(self_body, new_head, &mut buffer);
            let score = self.minimax(
                depth - 1,
                false,
                &buffer,
                opponent_body,
                goal,
                f64::NEG_INFINITY,
                f64::INFINITY,
                rng,
            );

            match best_score {
                Some(best) if score < best => {}
                Some(best) if score == best => candidates.push(dir),
                _ => {
                    best_score = Some(score);
                    candidates.clear();
                    candidates.push(dir);
                }
            }
        }
        self.arena.put_back(depth, buffer);

        let (direction, fallback) = if candidates.is_empty() {
            let all = Direction::all();
            let direction = all[rng.random_range(0..all.len())];
            warn!("minimax: no legal move from {}, picked {} at random", head, direction);
            (direction, true)
        } else {
            (candidates[rng.random_range(0..candidates.len())], false)
        };

        debug!(
            "minimax depth {} from {}: {} (score: {:?}, ties: {}, nodes: {}, leaves: {}, cutoffs: {}{})",
            depth,
            head,
            direction,
            best_score,
            candidates.len(),
            self.stats.nodes,
            self.stats.leaf_evaluations,
            self.stats.cutoffs,
            if fallback { ", random fallback" } else { "" }
        );

        Ok(MinimaxDecision {
            direction,
            score: best_score,
            candidates,
            fallback,
            stats: self.stats,
        })
    }

    /// Value of the position for `self`. A side with no legal move scores as a
    /// loss for that side (negative infinity for `self`, positive for the opponent).
    #[allow(clippy::too_many_arguments)]
    fn minimax<R: Rng>(
        &mut self,
        depth: u32,
        maximizing: bool,
        self_body: &[Coord],
        opponent_body: &[Coord],
        goal: Coord,
        mut alpha: f64,
        mut beta: f64,
        rng: &mut R,
    ) -> f64 {
        self.stats.nodes += 1;

        let (mover, other) = if maximizing {
            (self_body, opponent_body)
        } else {
            (opponent_body, self_body)
        };

        if depth == 0 || self.is_colliding(mover, other) {
            return self.leaf(self_body, opponent_body, goal, rng);
        }

        let head = mover[0];
        let mut value = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        let mut buffer = self.arena.take(depth);
        for dir in self.grid.expansion_order() {
            let Some(new_head) = self.grid.step(head, dir) else {
                continue;
            };
            if !is_legal(new_head, mover, other) {
                continue;
            }

            shift_body_into(mover, new_head, &mut buffer);

            if maximizing {
                let child = self.minimax(depth - 1, false, &buffer, opponent_body, goal, alpha, beta, rng);
                value = value.max(child);
                alpha = alpha.max(child);
            } else {
                let child = self.minimax(depth - 1, true, self_body, &buffer, goal, alpha, beta, rng);
                value = value.min(child);
                beta = beta.min(child);
            }

            if self.pruning == Pruning::AlphaBeta && beta <= alpha {
                self.stats.cutoffs += 1;
                break;
            }
        }
        self.arena.put_back(depth, buffer);

        value
    }

    fn leaf<R: Rng>(&mut self, self_body: &[Coord], opponent_body: &[Coord], goal: Coord, rng: &mut R) -> f64 {
        self.stats.leaf_evaluations += 1;
        let score = self
            .evaluator
            .evaluate(self_body, opponent_body, goal, &self.grid);

        let jitter = self.evaluator.weights().tie_break_jitter;
        if jitter > 0.0 {
            score + rng.random::<f64>() * jitter
        } else {
            score
        }
    }

    /// Head of `mover` off the grid, on its own body past the head, or on `other`
    fn is_colliding(&self, mover: &[Coord], other: &[Coord]) -> bool {
        let head = mover[0];
        !self.grid.in_bounds(head) || mover[1..].contains(&head) || other.contains(&head)
    }
}

/// A new head is legal when it avoids the mover's body (its tail vacates) and
/// every cell of the other body.
fn is_legal(new_head: Coord, mover: &[Coord], other: &[Coord]) -> bool {
    !mover[..mover.len() - 1].contains(&new_head) && !other.contains(&new_head)
}

/// One-shot `best_move` with a fresh engine
pub fn best_move<R: Rng>(
    self_body: &[Coord],
    opponent_body: &[Coord],
    goal: Coord,
    depth: u32,
    grid: &Grid,
    weights: &EvalWeights,
    rng: &mut R,
) -> Result<Direction, EngineError> {
    MinimaxEngine::new(grid.clone(), weights.clone()).best_move(self_body, opponent_body, goal, depth, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_depth_zero_is_rejected() {
        let grid = Grid::clamped(6, 6).unwrap();
        let mut engine = MinimaxEngine::new(grid, EvalWeights::default());
        let mut rng = StdRng::seed_from_u64(1);
        let result = engine.search(&[Coord::new(1, 1)], &[Coord::new(4, 4)], Coord::new(0, 0), 0, &mut rng);
        assert_eq!(result, Err(EngineError::InvalidDepth));
    }

    #[test]
    fn test_arena_is_reused_across_calls() {
        let grid = Grid::clamped(6, 6).unwrap();
        let mut engine = MinimaxEngine::new(grid, EvalWeights::default());
        let mut rng = StdRng::seed_from_u64(1);
        engine
            .search(&[Coord::new(1, 1)], &[Coord::new(4, 4)], Coord::new(0, 0), 3, &mut rng)
            .unwrap();
        assert_eq!(engine.arena.levels.len(), 4);
        engine
            .search(&[Coord::new(1, 1)], &[Coord::new(4, 4)], Coord::new(0, 0), 2, &mut rng)
            .unwrap();
        assert_eq!(engine.arena.levels.len(), 4);
    }

    #[test]
    fn test_legality_allows_own_tail_but_not_other_body() {
        let mover = [Coord::new(1, 1), Coord::new(1, 2), Coord::new(2, 2)];
        let other = [Coord::new(0, 1)];
        assert!(is_legal(Coord::new(2, 2), &mover, &other));
        assert!(!is_legal(Coord::new(1, 2), &mover, &other));
        assert!(!is_legal(Coord::new(0, 1), &mover, &other));
    }
}
