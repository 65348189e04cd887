// Replay module for re-running the engine on logged match decisions
//
// This module provides functionality to:
// 1. Parse JSONL match logs
// 2. Re-run the logged policy on each snapshot
// 3. Compare logged vs replayed moves
// 4. Generate a match-rate report

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::match_logger::DecisionRecord;
use crate::simulation::{Planner, Policy};
use crate::types::Direction;

/// How a replayed decision relates to the logged one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Mismatch,
    /// Stochastic decision that cannot be reproduced from the snapshot alone
    NotComparable,
}

/// Result of replaying a single decision
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayResult {
    pub game: u32,
    pub tick: u32,
    pub contender: usize,
    pub policy: Policy,
    pub original_move: Direction,
    pub replayed_move: Direction,
    /// Moves the engine considers equally good; a single entry for deterministic policies
    pub acceptable: Vec<Direction>,
    pub verdict: Verdict,
    pub computation_time_us: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default, PartialEq)]
pub struct ReplayStats {
    pub total_decisions: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub not_comparable: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing match logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all decision records from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<DecisionRecord>, String> {
        let file = File::open(log_path.as_ref())
            .map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: DecisionRecord = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Re-runs the logged policy on one snapshot and compares the result
    pub fn replay_entry(&self, entry: &DecisionRecord) -> Result<ReplayResult, String> {
        let mut planner = Planner::from_config(&self.config).map_err(|e| e.to_string())?;
        let mut rng = StdRng::seed_from_u64(entry.seed);
        let start_time = Instant::now();

        let (replayed_move, acceptable, comparable) = match (entry.policy, entry.opponent.as_deref()) {
            (Policy::Minimax { depth }, Some(opponent)) => {
                let decision = planner
                    .engine_mut()
                    .search(&entry.body, opponent, entry.goal, depth, &mut rng)
                    .map_err(|e| e.to_string())?;
                // Ties are broken by the match rng, so any tied root move counts
                let comparable = !decision.fallback && self.config.evaluation.tie_break_jitter == 0.0;
                (decision.direction, decision.candidates, comparable)
            }
            (Policy::SimulatedAnnealing, _) => {
                let direction = planner
                    .plan(entry.policy, &entry.body, entry.heading, None, entry.goal, &mut rng)
                    .map_err(|e| e.to_string())?;
                (direction, vec![direction], false)
            }
            (policy, opponent) => {
                let direction = planner
                    .plan(policy, &entry.body, entry.heading, opponent, entry.goal, &mut rng)
                    .map_err(|e| e.to_string())?;
                (direction, vec![direction], true)
            }
        };

        let computation_time = start_time.elapsed().as_micros();
        let verdict = if !comparable {
            Verdict::NotComparable
        } else if acceptable.contains(&entry.chosen_move) {
            Verdict::Match
        } else {
            Verdict::Mismatch
        };

        if self.verbose {
            match verdict {
                Verdict::Match => info!(
                    "Game {} tick {} #{} ({}): MATCH - {} ({}us)",
                    entry.game,
                    entry.tick,
                    entry.contender,
                    entry.policy.label(),
                    entry.chosen_move,
                    computation_time
                ),
                Verdict::Mismatch => warn!(
                    "Game {} tick {} #{} ({}): MISMATCH - logged {}, replayed {} (acceptable: {:?})",
                    entry.game,
                    entry.tick,
                    entry.contender,
                    entry.policy.label(),
                    entry.chosen_move,
                    replayed_move,
                    acceptable.iter().map(|d| d.as_str()).collect::<Vec<_>>()
                ),
                Verdict::NotComparable => info!(
                    "Game {} tick {} #{} ({}): not comparable - logged {}, replayed {}",
                    entry.game,
                    entry.tick,
                    entry.contender,
                    entry.policy.label(),
                    entry.chosen_move,
                    replayed_move
                ),
            }
        }

        Ok(ReplayResult {
            game: entry.game,
            tick: entry.tick,
            contender: entry.contender,
            policy: entry.policy,
            original_move: entry.chosen_move,
            replayed_move,
            acceptable,
            verdict,
            computation_time_us: computation_time,
        })
    }

    /// Replays all entries in a log file
    pub fn replay_all(&self, entries: &[DecisionRecord]) -> Vec<ReplayResult> {
        let mut results = Vec::new();

        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay game {} tick {}: {}", entry.game, entry.tick, e);
                }
            }
        }

        results
    }

    /// Replays every decision logged at the given ticks
    pub fn replay_ticks(
        &self,
        entries: &[DecisionRecord],
        ticks: &[u32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for tick in ticks {
            let selected: Vec<&DecisionRecord> = entries.iter().filter(|e| e.tick == *tick).collect();
            if selected.is_empty() {
                return Err(format!("Tick {} not found in log file", tick));
            }

            for entry in selected {
                match self.replay_entry(entry) {
                    Ok(result) => results.push(result),
                    Err(e) => warn!("Failed to replay tick {}: {}", tick, e),
                }
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let count = |verdict: Verdict| results.iter().filter(|r| r.verdict == verdict).count();
        let matches = count(Verdict::Match);
        let mismatches = count(Verdict::Mismatch);
        let compared = matches + mismatches;
        let match_rate = if compared > 0 {
            (matches as f64 / compared as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_decisions: results.len(),
            matches,
            mismatches,
            not_comparable: count(Verdict::NotComparable),
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Decisions: {}", stats.total_decisions);
        println!("Matches:         {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:      {}", stats.mismatches);
        println!("Not Comparable:  {}", stats.not_comparable);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results.iter().map(|r| r.computation_time_us as f64).sum::<f64>()
                / results.len() as f64;
            println!("Average Computation Time:   {:.1}us\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| r.verdict == Verdict::Mismatch).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Game {} tick {} #{} ({}): {} → {}",
                    result.game,
                    result.tick,
                    result.contender,
                    result.policy.label(),
                    result.original_move,
                    result.replayed_move
                );
            }
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::PathStrategy;
    use crate::types::Coord;

    fn record(policy: Policy, chosen_move: Direction) -> DecisionRecord {
        DecisionRecord {
            game: 0,
            seed: 7,
            tick: 3,
            contender: 0,
            policy,
            heading: Direction::Right,
            body: vec![Coord::new(5, 5)],
            opponent: Some(vec![Coord::new(8, 8)]),
            goal: Coord::new(5, 0),
            chosen_move,
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_deterministic_policy_matches() {
        let mut config = Config::default_hardcoded();
        config.grid.width = 10;
        config.grid.height = 10;
        let engine = ReplayEngine::new(config, false);

        let ucs = Policy::Path { strategy: PathStrategy::UniformCost };
        let result = engine.replay_entry(&record(ucs, Direction::Up)).unwrap();
        assert_eq!(result.verdict, Verdict::Match);

        let result = engine.replay_entry(&record(ucs, Direction::Left)).unwrap();
        assert_eq!(result.verdict, Verdict::Mismatch);
        assert_eq!(result.replayed_move, Direction::Up);
    }

    #[test]
    fn test_annealing_is_not_compared() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        let result = engine
            .replay_entry(&record(Policy::SimulatedAnnealing, Direction::Down))
            .unwrap();
        assert_eq!(result.verdict, Verdict::NotComparable);

        let stats = engine.generate_stats(&[result]);
        assert_eq!(stats.not_comparable, 1);
        assert_eq!(stats.match_rate, 0.0);
    }
}
