// Local-search heuristics: single-step direction choice without a path
//
// Hill climbing takes the neighbor closest to the goal. Simulated annealing
// samples random neighbors and sometimes accepts a worse one while the
// temperature is still high. Neither ever returns "no move": when nothing is
// legal they keep the current heading and leave collision handling to the caller.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::grid::{euclidean, Grid};
use crate::types::{Coord, Direction};

/// Cooling schedule for simulated annealing
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct AnnealingSchedule {
    pub initial_temperature: f64,
    /// Multiplier applied every iteration, strictly between 0 and 1
    pub cooling_rate: f64,
    /// Loop runs while temperature is above this, strictly positive
    pub temperature_floor: f64,
}

impl Default for AnnealingSchedule {
    fn default() -> Self {
        AnnealingSchedule {
            initial_temperature: 10.0,
            cooling_rate: 0.99,
            temperature_floor: 0.1,
        }
    }
}

impl AnnealingSchedule {
    pub fn new(
        initial_temperature: f64,
        cooling_rate: f64,
        temperature_floor: f64,
    ) -> Result<Self, EngineError> {
        let schedule = AnnealingSchedule {
            initial_temperature,
            cooling_rate,
            temperature_floor,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(EngineError::InvalidSchedule {
                msg: "cooling rate must be in (0, 1)",
            });
        }
        if !(self.temperature_floor > 0.0) {
            return Err(EngineError::InvalidSchedule {
                msg: "temperature floor must be positive",
            });
        }
        if !(self.initial_temperature > 0.0) || !self.initial_temperature.is_finite() {
            return Err(EngineError::InvalidSchedule {
                msg: "initial temperature must be positive and finite",
            });
        }
        Ok(())
    }

    /// Number of iterations the schedule runs for
    pub fn iterations(&self) -> usize {
        let mut temperature = self.initial_temperature;
        let mut count = 0;
        while temperature > self.temperature_floor {
            temperature *= self.cooling_rate;
            count += 1;
        }
        count
    }
}

/// Which local-search heuristic to run
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocalSearch {
    HillClimbing,
    SimulatedAnnealing(AnnealingSchedule),
}

impl LocalSearch {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalSearch::HillClimbing => "hill_climbing",
            LocalSearch::SimulatedAnnealing(_) => "simulated_annealing",
        }
    }

    /// Picks the next direction for `body`. `heading` is the direction the agent
    /// is currently moving and doubles as the fallback.
    pub fn choose_direction<R: Rng>(
        &self,
        body: &[Coord],
        heading: Direction,
        goal: Coord,
        grid: &Grid,
        rng: &mut R,
    ) -> Result<Direction, EngineError> {
        match self {
            LocalSearch::HillClimbing => hill_climbing(body, heading, goal, grid),
            LocalSearch::SimulatedAnnealing(schedule) => {
                simulated_annealing(body, heading, goal, grid, schedule, rng)
                    .map(|outcome| outcome.direction)
            }
        }
    }
}

/// Legal for a local step: inside the grid after the boundary policy, not on
/// the body (the tail is excluded since it vacates), and allowed by the
/// reversal policy.
fn candidate(body: &[Coord], heading: Direction, grid: &Grid, dir: Direction) -> Option<Coord> {
    if !grid.permits(Some(heading), dir) {
        return None;
    }
    let next = grid.step(body[0], dir)?;
    let blocking = &body[..body.len() - 1];
    (!blocking.contains(&next)).then_some(next)
}

fn check_inputs(body: &[Coord], goal: Coord, grid: &Grid) -> Result<(), EngineError> {
    grid.check_body(body)?;
    grid.check(goal)
}

/// Greedy choice of the neighbor closest (Euclidean) to `goal`.
///
/// Ties go to the first direction in the grid's expansion order. Keeps
/// `heading` when no neighbor is legal.
pub fn hill_climbing(
    body: &[Coord],
    heading: Direction,
    goal: Coord,
    grid: &Grid,
) -> Result<Direction, EngineError> {
    check_inputs(body, goal, grid)?;

    let mut best: Option<(Direction, f64)> = None;
    for dir in grid.expansion_order() {
        let Some(next) = candidate(body, heading, grid, dir) else {
            continue;
        };
        let distance = euclidean(next, goal);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((dir, distance));
        }
    }

    let chosen = best.map(|(dir, _)| dir).unwrap_or(heading);
    debug!("hill_climbing {} -> {}: {}", body[0], goal, chosen);
    Ok(chosen)
}

/// Result of one annealing run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingOutcome {
    pub direction: Direction,
    pub iterations: usize,
    /// Samples that replaced the incumbent
    pub accepted: usize,
    /// Samples thrown out for leaving the grid or hitting the body
    pub rejected: usize,
}

/// Stochastic refinement of the heading.
///
/// Starts from `heading` and the head's own distance to `goal` as the
/// incumbent. Each iteration samples a random direction; illegal samples are
/// skipped, strict improvements are always taken and anything else is taken
/// with probability `exp((incumbent - candidate) / temperature)`. The
/// temperature cools every iteration and the run ends once it drops to the floor.
pub fn simulated_annealing<R: Rng>(
    body: &[Coord],
    heading: Direction,
    goal: Coord,
    grid: &Grid,
    schedule: &AnnealingSchedule,
    rng: &mut R,
) -> Result<AnnealingOutcome, EngineError> {
    check_inputs(body, goal, grid)?;
    schedule.validate()?;

    let directions = grid.expansion_order();
    let mut current_direction = heading;
    let mut current_distance = euclidean(body[0], goal);
    let mut temperature = schedule.initial_temperature;
    let mut outcome = AnnealingOutcome {
        direction: heading,
        iterations: 0,
        accepted: 0,
        rejected: 0,
    };

    // temperature > floor > 0 holds for every division below
    while temperature > schedule.temperature_floor {
        outcome.iterations += 1;
        let dir = directions[rng.random_range(0..directions.len())];

        match candidate(body, heading, grid, dir) {
            None => outcome.rejected += 1,
            Some(next) => {
                let new_distance = euclidean(next, goal);
                let accept = new_distance < current_distance || {
                    let probability = ((current_distance - new_distance) / temperature).exp();
                    rng.random::<f64>() < probability
                };
                if accept {
                    current_direction = dir;
                    current_distance = new_distance;
                    outcome.accepted += 1;
                }
            }
        }

        temperature *= schedule.cooling_rate;
    }

    outcome.direction = current_direction;
    debug!(
        "simulated_annealing {} -> {}: {} (iterations={}, accepted={}, rejected={})",
        body[0], goal, current_direction, outcome.iterations, outcome.accepted, outcome.rejected
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_schedule_iteration_count() {
        // 10.0 * 0.99^n <= 0.1  =>  n = ceil(ln(0.01) / ln(0.99)) = 459
        assert_eq!(AnnealingSchedule::default().iterations(), 459);
    }

    #[test]
    fn test_invalid_schedules_are_rejected() {
        assert!(AnnealingSchedule::new(10.0, 1.0, 0.1).is_err());
        assert!(AnnealingSchedule::new(10.0, 0.0, 0.1).is_err());
        assert!(AnnealingSchedule::new(10.0, 0.9, 0.0).is_err());
        assert!(AnnealingSchedule::new(-1.0, 0.9, 0.1).is_err());
        assert!(AnnealingSchedule::new(f64::NAN, 0.9, 0.1).is_err());
        assert!(AnnealingSchedule::new(10.0, 0.9, 0.1).is_ok());
    }

    #[test]
    fn test_hill_climbing_tie_goes_to_first_in_order() {
        // Goal diagonal from the head: left and up are equally close,
        // left comes first in the default order.
        let grid = Grid::clamped(10, 10).unwrap();
        let body = [Coord::new(5, 5)];
        let dir = hill_climbing(&body, Direction::Right, Coord::new(2, 2), &grid).unwrap();
        assert_eq!(dir, Direction::Left);
    }

    #[test]
    fn test_hill_climbing_keeps_heading_when_boxed_in() {
        let grid = Grid::clamped(3, 3).unwrap();
        // Head in the corner, every neighbor is a non-tail segment
        let body = [
            Coord::new(0, 0),
            Coord::new(1, 0),
            Coord::new(1, 1),
            Coord::new(0, 1),
            Coord::new(0, 2),
        ];
        let dir = hill_climbing(&body, Direction::Up, Coord::new(2, 2), &grid).unwrap();
        assert_eq!(dir, Direction::Up);
    }

    #[test]
    fn test_hill_climbing_may_enter_tail_cell() {
        let grid = Grid::clamped(5, 5).unwrap();
        // Tail at (2,1) is the only cell next to the goal side
        let body = [Coord::new(2, 2), Coord::new(3, 2), Coord::new(3, 1), Coord::new(2, 1)];
        let dir = hill_climbing(&body, Direction::Left, Coord::new(2, 0), &grid).unwrap();
        assert_eq!(dir, Direction::Up);
    }

    #[test]
    fn test_annealing_boxed_in_returns_starting_heading() {
        let grid = Grid::clamped(3, 3).unwrap();
        let body = [
            Coord::new(0, 0),
            Coord::new(1, 0),
            Coord::new(1, 1),
            Coord::new(0, 1),
            Coord::new(0, 2),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let outcome = simulated_annealing(
            &body,
            Direction::Down,
            Coord::new(2, 2),
            &grid,
            &AnnealingSchedule::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.direction, Direction::Down);
        assert_eq!(outcome.accepted, 0);
        assert_eq!(outcome.rejected, outcome.iterations);
    }

    #[test]
    fn test_annealing_takes_only_legal_direction() {
        let grid = Grid::clamped(3, 3).unwrap();
        // Corner head; only (0,1) below is free
        let body = [Coord::new(0, 0), Coord::new(1, 0), Coord::new(1, 1), Coord::new(2, 1)];
        let mut rng = StdRng::seed_from_u64(42);
        let outcome = simulated_annealing(
            &body,
            Direction::Left,
            Coord::new(0, 2),
            &grid,
            &AnnealingSchedule::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.direction, Direction::Down);
        assert!(outcome.accepted >= 1);
    }

    #[test]
    fn test_empty_body_is_rejected() {
        let grid = Grid::clamped(3, 3).unwrap();
        assert_eq!(
            hill_climbing(&[], Direction::Up, Coord::new(1, 1), &grid),
            Err(EngineError::EmptyBody)
        );
    }
}
