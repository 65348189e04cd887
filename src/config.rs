// Configuration module for reading Engine.toml
// Every engine entry point receives its settings from here; there is no process-wide state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::EngineError;
use crate::evaluation::{BoundaryPenaltyMode, EvalWeights};
use crate::grid::{Grid, DEFAULT_EXPANSION_ORDER};
use crate::local_search::AnnealingSchedule;
use crate::minimax::Pruning;
use crate::types::{BoundaryPolicy, Direction, GridDimensions, ReversalPolicy};

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    pub grid: GridConfig,
    pub annealing: AnnealingConfig,
    pub minimax: MinimaxConfig,
    pub evaluation: EvaluationConfig,
    pub simulation: SimulationConfig,
    pub debug: DebugConfig,
}

/// Board geometry and movement rules
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GridConfig {
    pub width: i32,
    pub height: i32,
    pub boundary: BoundaryPolicy,
    pub reversal: ReversalPolicy,
    pub expansion_order: [Direction; 4],
}

/// Simulated annealing cooling schedule
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnnealingConfig {
    pub initial_temperature: f64,
    pub cooling_rate: f64,
    pub temperature_floor: f64,
}

/// Adversarial search settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MinimaxConfig {
    pub depth: u32,
    pub pruning: Pruning,
}

/// Static evaluation weights
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EvaluationConfig {
    pub goal_bonus: f64,
    pub out_of_bounds_penalty: f64,
    pub base_score: f64,
    pub opponent_proximity_threshold: i32,
    pub opponent_proximity_penalty: f64,
    pub self_overlap_penalty: f64,
    pub boundary_penalty: f64,
    pub boundary_penalty_mode: BoundaryPenaltyMode,
    pub tie_break_jitter: f64,
}

/// Headless match settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimulationConfig {
    pub max_ticks: u32,
    pub games: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub initial_length: usize,
}

/// Debug configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Engine.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&contents)
    }

    /// Parses configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Engine.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Engine.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Engine.toml
    pub fn default_hardcoded() -> Self {
        let weights = EvalWeights::default();
        let schedule = AnnealingSchedule::default();

        Config {
            grid: GridConfig {
                width: 32,
                height: 24,
                boundary: BoundaryPolicy::Clamped,
                reversal: ReversalPolicy::Allow,
                expansion_order: DEFAULT_EXPANSION_ORDER,
            },
            annealing: AnnealingConfig {
                initial_temperature: schedule.initial_temperature,
                cooling_rate: schedule.cooling_rate,
                temperature_floor: schedule.temperature_floor,
            },
            minimax: MinimaxConfig {
                depth: 2,
                pruning: Pruning::AlphaBeta,
            },
            evaluation: EvaluationConfig {
                goal_bonus: weights.goal_bonus,
                out_of_bounds_penalty: weights.out_of_bounds_penalty,
                base_score: weights.base_score,
                opponent_proximity_threshold: weights.opponent_proximity_threshold,
                opponent_proximity_penalty: weights.opponent_proximity_penalty,
                self_overlap_penalty: weights.self_overlap_penalty,
                boundary_penalty: weights.boundary_penalty,
                boundary_penalty_mode: weights.boundary_penalty_mode,
                tie_break_jitter: weights.tie_break_jitter,
            },
            simulation: SimulationConfig {
                max_ticks: 1000,
                games: 1,
                seed: None,
                initial_length: 1,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "snake_match.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Engine.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }

    /// Movement model described by the `[grid]` section
    pub fn grid(&self) -> Result<Grid, EngineError> {
        let dims = GridDimensions::new(self.grid.width, self.grid.height);
        Grid::new(dims, self.grid.boundary)?
            .with_reversal(self.grid.reversal)
            .with_expansion_order(self.grid.expansion_order)
    }

    /// Validated cooling schedule from the `[annealing]` section
    pub fn annealing_schedule(&self) -> Result<AnnealingSchedule, EngineError> {
        AnnealingSchedule::new(
            self.annealing.initial_temperature,
            self.annealing.cooling_rate,
            self.annealing.temperature_floor,
        )
    }

    pub fn eval_weights(&self) -> EvalWeights {
        let e = &self.evaluation;
        EvalWeights {
            goal_bonus: e.goal_bonus,
            out_of_bounds_penalty: e.out_of_bounds_penalty,
            base_score: e.base_score,
            opponent_proximity_threshold: e.opponent_proximity_threshold,
            opponent_proximity_penalty: e.opponent_proximity_penalty,
            self_overlap_penalty: e.self_overlap_penalty,
            boundary_penalty: e.boundary_penalty,
            boundary_penalty_mode: e.boundary_penalty_mode,
            tie_break_jitter: e.tie_break_jitter,
        }
    }

    /// Checks every section that the engine builders do not already reject
    pub fn validate(&self) -> Result<(), String> {
        if self.minimax.depth == 0 {
            return Err("minimax depth must be at least 1".to_string());
        }
        if self.simulation.initial_length == 0 {
            return Err("initial_length must be at least 1".to_string());
        }
        self.grid().map_err(|e| e.to_string())?;
        self.annealing_schedule().map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_can_be_created() {
        let config = Config::default_hardcoded();
        assert_eq!(config.minimax.depth, 2);
        assert_eq!(config.annealing.cooling_rate, 0.99);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_engine_toml_can_be_parsed() {
        // This test ensures Engine.toml is valid and can be parsed
        let result = Config::from_file("Engine.toml");
        assert!(
            result.is_ok(),
            "Failed to parse Engine.toml: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file_config = Config::from_file("Engine.toml")
            .expect("Engine.toml should be parseable");
        let hardcoded_config = Config::default_hardcoded();

        assert_eq!(file_config.grid, hardcoded_config.grid);
        assert_eq!(file_config.annealing, hardcoded_config.annealing);
        assert_eq!(file_config.minimax, hardcoded_config.minimax);
        assert_eq!(file_config.evaluation, hardcoded_config.evaluation);
        assert_eq!(file_config.simulation, hardcoded_config.simulation);
        assert_eq!(file_config.debug, hardcoded_config.debug);
    }

    #[test]
    fn test_hardcoded_defaults_round_trip_through_toml() {
        let config = Config::default_hardcoded();
        let text = toml::to_string(&config).expect("config should serialize");
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_grid_section_builds_movement_model() {
        let mut config = Config::default_hardcoded();
        config.grid.boundary = BoundaryPolicy::Wrapping;
        config.grid.expansion_order = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

        let grid = config.grid().unwrap();
        assert_eq!(grid.boundary(), BoundaryPolicy::Wrapping);
        assert_eq!(grid.expansion_order()[0], Direction::Up);
    }

    #[test]
    fn test_duplicate_expansion_order_is_rejected() {
        let mut config = Config::default_hardcoded();
        config.grid.expansion_order = [Direction::Up; 4];
        assert!(matches!(
            config.grid(),
            Err(EngineError::InvalidExpansionOrder { .. })
        ));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        // Test with a non-existent file
        let result = Config::from_file("nonexistent.toml");
        assert!(result.is_err());
        assert!(Config::from_toml_str("[grid]\nwidth = \"wide\"").is_err());
    }
}
