// Library exports for the snake search engine
// The arena and replay binaries both drive the engine through these modules

pub mod config;
pub mod error;
pub mod evaluation;
pub mod grid;
pub mod local_search;
pub mod match_logger;
pub mod minimax;
pub mod pathfinding;
pub mod replay;
pub mod simulation;
pub mod types;
