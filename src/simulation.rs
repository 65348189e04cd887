// Headless match runner: the caller side of the engine
//
// Holds the mutable game state (bodies, headings, goal), asks the engine for
// one decision per live contender per tick against the same snapshot, applies
// the moves and resolves growth and collisions. No rendering, input or frame pacing.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::EngineError;
use crate::grid::{build_obstacles, Grid};
use crate::local_search::{hill_climbing, simulated_annealing, AnnealingSchedule};
use crate::match_logger::{timestamp_now, DecisionRecord, MatchLogger};
use crate::minimax::MinimaxEngine;
use crate::pathfinding::PathStrategy;
use crate::types::{Coord, Direction};

/// Decision policy a contender plays with
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    /// Re-plans a path every tick and takes its first step; falls back to hill
    /// climbing when no path exists
    Path { strategy: PathStrategy },
    HillClimbing,
    SimulatedAnnealing,
    Minimax { depth: u32 },
}

impl Policy {
    /// Parses CLI names: dfs, ucs, astar, hill, anneal, minimax or minimax:<depth>
    pub fn parse(s: &str, default_depth: u32) -> Result<Policy, String> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "dfs" => Ok(Policy::Path { strategy: PathStrategy::DepthFirst }),
            "ucs" => Ok(Policy::Path { strategy: PathStrategy::UniformCost }),
            "astar" | "a*" => Ok(Policy::Path { strategy: PathStrategy::AStar }),
            "hill" | "hill_climbing" => Ok(Policy::HillClimbing),
            "anneal" | "simulated_annealing" => Ok(Policy::SimulatedAnnealing),
            "minimax" => Ok(Policy::Minimax { depth: default_depth }),
            other => match other.strip_prefix("minimax:") {
                Some(depth) => depth
                    .parse::<u32>()
                    .map_err(|e| format!("Invalid minimax depth '{}': {}", depth, e))
                    .map(|depth| Policy::Minimax { depth }),
                None => Err(format!("Unknown policy: {}", s)),
            },
        }
    }

    pub fn label(&self) -> String {
        match self {
            Policy::Path { strategy } => strategy.as_str().to_string(),
            Policy::HillClimbing => "hill".to_string(),
            Policy::SimulatedAnnealing => "anneal".to_string(),
            Policy::Minimax { depth } => format!("minimax:{}", depth),
        }
    }
}

/// One agent in a match
#[derive(Debug, Clone, PartialEq)]
pub struct Contender {
    pub policy: Policy,
    pub body: Vec<Coord>,
    pub heading: Direction,
    pub alive: bool,
    pub score: u32,
}

/// Why a match stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    AllDead,
    LastSurvivor,
    TickLimit,
    BoardFull,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContenderSummary {
    pub policy: String,
    pub alive: bool,
    pub score: u32,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub game: u32,
    pub seed: u64,
    pub ticks: u32,
    pub end_reason: EndReason,
    /// Index of the sole survivor in a two-contender match
    pub winner: Option<usize>,
    pub contenders: Vec<ContenderSummary>,
}

/// Per-policy decision dispatch shared by live matches and replay
#[derive(Debug)]
pub struct Planner {
    grid: Grid,
    schedule: AnnealingSchedule,
    engine: MinimaxEngine,
}

impl Planner {
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let grid = config.grid()?;
        let schedule = config.annealing_schedule()?;
        let engine = MinimaxEngine::new(grid.clone(), config.eval_weights())
            .with_pruning(config.minimax.pruning);
        Ok(Planner {
            grid,
            schedule,
            engine,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn engine_mut(&mut self) -> &mut MinimaxEngine {
        &mut self.engine
    }

    /// One decision for `body` under `policy`.
    ///
    /// Path policies take the first step of a fresh path and fall back to hill
    /// climbing when none exists; minimax without an opponent does the same.
    pub fn plan<R: Rng>(
        &mut self,
        policy: Policy,
        body: &[Coord],
        heading: Direction,
        opponent: Option<&[Coord]>,
        goal: Coord,
        rng: &mut R,
    ) -> Result<Direction, EngineError> {
        self.grid.check_body(body)?;

        match policy {
            Policy::Path { strategy } => {
                let others: Vec<&[Coord]> = opponent.into_iter().collect();
                let obstacles = build_obstacles(body, &others);
                let path = strategy.find_path(body[0], goal, &obstacles, &self.grid)?;
                match path.first() {
                    Some(&dir) => Ok(dir),
                    None => {
                        info!(
                            "No {} path from {} to {}, falling back to hill climbing",
                            strategy.as_str(),
                            body[0],
                            goal
                        );
                        hill_climbing(body, heading, goal, &self.grid)
                    }
                }
            }
            Policy::HillClimbing => hill_climbing(body, heading, goal, &self.grid),
            Policy::SimulatedAnnealing => {
                simulated_annealing(body, heading, goal, &self.grid, &self.schedule, rng)
                    .map(|outcome| outcome.direction)
            }
            Policy::Minimax { depth } => match opponent {
                Some(opponent) => self.engine.best_move(body, opponent, goal, depth, rng),
                None => hill_climbing(body, heading, goal, &self.grid),
            },
        }
    }
}

/// A single headless match
pub struct Match {
    game: u32,
    seed: u64,
    planner: Planner,
    contenders: Vec<Contender>,
    goal: Coord,
    tick: u32,
    max_ticks: u32,
    rng: StdRng,
    logger: MatchLogger,
}

impl Match {
    /// Sets up one or two contenders on the configured grid.
    ///
    /// A single contender starts in the middle; two start at a quarter and
    /// three quarters of the width on the middle row, both heading right.
    pub fn new(
        config: &Config,
        policies: &[Policy],
        game: u32,
        seed: u64,
        logger: MatchLogger,
    ) -> Result<Self, String> {
        if policies.is_empty() || policies.len() > 2 {
            return Err(format!("A match takes 1 or 2 contenders, got {}", policies.len()));
        }
        if policies.len() == 1 && matches!(policies[0], Policy::Minimax { .. }) {
            return Err("Minimax needs an opponent".to_string());
        }
        if policies.contains(&Policy::Minimax { depth: 0 }) {
            return Err("Minimax depth must be at least 1".to_string());
        }

        config.validate()?;
        let planner = Planner::from_config(config).map_err(|e| e.to_string())?;

        let (w, h) = (planner.grid().width(), planner.grid().height());
        let starts: Vec<Coord> = if policies.len() == 1 {
            vec![Coord::new(w / 2, h / 2)]
        } else {
            vec![Coord::new(w / 4, h / 2), Coord::new(3 * w / 4, h / 2)]
        };
        if starts.len() == 2 && starts[0] == starts[1] {
            return Err(format!("Grid {}x{} is too narrow for two contenders", w, h));
        }

        let contenders = policies
            .iter()
            .zip(starts)
            .map(|(&policy, start)| Contender {
                policy,
                body: initial_body(start, config.simulation.initial_length),
                heading: Direction::Right,
                alive: true,
                score: 0,
            })
            .collect();

        let mut game_match = Match {
            game,
            seed,
            planner,
            contenders,
            goal: Coord::new(0, 0),
            tick: 0,
            max_ticks: config.simulation.max_ticks,
            rng: StdRng::seed_from_u64(seed),
            logger,
        };
        game_match.goal = game_match
            .spawn_goal()
            .ok_or_else(|| "No free cell for the goal".to_string())?;

        info!(
            "Game {} (seed {}): {} on {}x{}",
            game,
            seed,
            policies.iter().map(|p| p.label()).collect::<Vec<_>>().join(" vs "),
            w,
            h
        );

        Ok(game_match)
    }

    pub fn contenders(&self) -> &[Contender] {
        &self.contenders
    }

    pub fn goal(&self) -> Coord {
        self.goal
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn grid(&self) -> &Grid {
        self.planner.grid()
    }

    /// Moves the goal, for scripted scenarios
    pub fn set_goal(&mut self, goal: Coord) -> Result<(), EngineError> {
        self.planner.grid().check(goal)?;
        self.goal = goal;
        Ok(())
    }

    /// Decision for contender `idx` against the current snapshot
    pub fn decide(&mut self, idx: usize) -> Result<Direction, EngineError> {
        let me = &self.contenders[idx];
        let opponent = self
            .contenders
            .iter()
            .enumerate()
            .find(|(i, c)| *i != idx && c.alive)
            .map(|(_, c)| c.body.as_slice());

        let direction = self
            .planner
            .plan(me.policy, &me.body, me.heading, opponent, self.goal, &mut self.rng)?;

        if self.logger.is_enabled() {
            self.logger.log_decision(&DecisionRecord {
                game: self.game,
                seed: self.seed,
                tick: self.tick,
                contender: idx,
                policy: me.policy,
                heading: me.heading,
                body: me.body.clone(),
                opponent: opponent.map(|body| body.to_vec()),
                goal: self.goal,
                chosen_move: direction,
                timestamp: timestamp_now(),
            });
        }

        Ok(direction)
    }

    /// Advances the match by one tick. Returns `Some` once the match is over.
    pub fn step(&mut self) -> Result<Option<EndReason>, EngineError> {
        if let Some(reason) = self.end_reason() {
            return Ok(Some(reason));
        }

        let live: Vec<usize> = (0..self.contenders.len())
            .filter(|&i| self.contenders[i].alive)
            .collect();

        let mut moves = Vec::with_capacity(live.len());
        for &idx in &live {
            moves.push((idx, self.decide(idx)?));
        }

        // Apply every move against the same snapshot
        let mut ate_goal = false;
        for &(idx, dir) in &moves {
            let contender = &mut self.contenders[idx];
            contender.heading = dir;
            let grid = self.planner.grid();
            let grows = grid.step(contender.body[0], dir) == Some(self.goal);
            match grid.advance(&contender.body, dir, grows) {
                Some(body) => {
                    contender.body = body;
                    if grows {
                        contender.score += 1;
                        ate_goal = true;
                    }
                }
                None => {
                    info!("Tick {}: contender {} left the grid", self.tick, idx);
                    contender.alive = false;
                }
            }
        }

        self.resolve_collisions(&live);
        self.tick += 1;

        if ate_goal {
            match self.spawn_goal() {
                Some(goal) => {
                    debug!("Tick {}: goal eaten, respawned at {}", self.tick, goal);
                    self.goal = goal;
                }
                None => return Ok(Some(EndReason::BoardFull)),
            }
        }

        Ok(self.end_reason())
    }

    /// Runs until the match ends
    pub fn run(&mut self) -> Result<MatchSummary, EngineError> {
        let reason = loop {
            if let Some(reason) = self.step()? {
                break reason;
            }
        };
        self.logger.flush();

        let summary = self.summary(reason);
        info!(
            "Game {} over after {} ticks: {:?}, scores {:?}",
            self.game,
            self.tick,
            reason,
            summary.contenders.iter().map(|c| c.score).collect::<Vec<_>>()
        );
        Ok(summary)
    }

    fn resolve_collisions(&mut self, moved: &[usize]) {
        let mut dead = Vec::new();

        for &i in moved {
            let me = &self.contenders[i];
            if !me.alive {
                continue;
            }
            let head = me.body[0];

            if me.body[1..].contains(&head) {
                info!("Tick {}: contender {} ran into itself", self.tick, i);
                dead.push(i);
                continue;
            }

            for (j, other) in self.contenders.iter().enumerate() {
                if j == i || !other.alive {
                    continue;
                }
                if other.body.contains(&head) {
                    info!("Tick {}: contender {} hit contender {}", self.tick, i, j);
                    dead.push(i);
                    break;
                }
            }
        }

        for i in dead {
            self.contenders[i].alive = false;
        }
    }

    fn end_reason(&self) -> Option<EndReason> {
        let alive = self.contenders.iter().filter(|c| c.alive).count();
        if alive == 0 {
            Some(EndReason::AllDead)
        } else if self.contenders.len() > 1 && alive == 1 {
            Some(EndReason::LastSurvivor)
        } else if self.tick >= self.max_ticks {
            Some(EndReason::TickLimit)
        } else {
            None
        }
    }

    /// Random cell outside every live body, `None` when the board is full
    fn spawn_goal(&mut self) -> Option<Coord> {
        let occupied = |c: &Coord| {
            self.contenders
                .iter()
                .filter(|s| s.alive)
                .any(|s| s.body.contains(c))
        };
        let (width, height) = (self.grid().width(), self.grid().height());
        let free: Vec<Coord> = (0..height)
            .flat_map(|y| (0..width).map(move |x| Coord::new(x, y)))
            .filter(|c| !occupied(c))
            .collect();

        if free.is_empty() {
            return None;
        }
        Some(free[self.rng.random_range(0..free.len())])
    }

    fn summary(&self, end_reason: EndReason) -> MatchSummary {
        let winner = if self.contenders.len() > 1 && end_reason == EndReason::LastSurvivor {
            self.contenders.iter().position(|c| c.alive)
        } else {
            None
        };

        MatchSummary {
            game: self.game,
            seed: self.seed,
            ticks: self.tick,
            end_reason,
            winner,
            contenders: self
                .contenders
                .iter()
                .map(|c| ContenderSummary {
                    policy: c.policy.label(),
                    alive: c.alive,
                    score: c.score,
                    length: c.body.len(),
                })
                .collect(),
        }
    }
}

/// Straight body trailing to the left of `head`, cut short at the grid edge
fn initial_body(head: Coord, length: usize) -> Vec<Coord> {
    (0..length as i32)
        .map(|i| Coord::new(head.x - i, head.y))
        .take_while(|c| c.x >= 0)
        .collect()
}

/// Runs `games` independent matches in parallel. Match `i` uses seed `base_seed + i`.
pub fn run_batch(
    config: &Config,
    policies: &[Policy],
    games: u32,
    base_seed: u64,
    logger: &MatchLogger,
) -> Result<Vec<MatchSummary>, String> {
    (0..games)
        .into_par_iter()
        .map(|game| {
            let seed = base_seed.wrapping_add(game as u64);
            let mut game_match = Match::new(config, policies, game, seed, logger.clone())?;
            game_match.run().map_err(|e| format!("Game {} failed: {}", game, e))
        })
        .collect()
}
