use thiserror::Error;

use crate::types::{Coord, Direction};

/// Caller contract violations. "No path" and "no legal move" are not errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Coordinate {coord} is outside the {width}x{height} grid")]
    OutOfBounds { coord: Coord, width: i32, height: i32 },
    #[error("Agent body has no segments")]
    EmptyBody,
    #[error("Invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
    #[error("Invalid annealing schedule: {msg}")]
    InvalidSchedule { msg: &'static str },
    #[error("Expansion order {order:?} is not a permutation of the four directions")]
    InvalidExpansionOrder { order: [Direction; 4] },
    #[error("Minimax depth must be at least 1")]
    InvalidDepth,
}
