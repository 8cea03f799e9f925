use thiserror::Error;

use crate::identifiers::PlayerId;
use crate::vec2::Vec2;

/// Engine invariant failures. None of these describe a player losing; they
/// mean the simulation can no longer continue safely.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("map dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },
    #[error("failed to grow {what} storage to {capacity} entries")]
    Allocation { what: &'static str, capacity: usize },
    #[error("segment {segment} is not adjacent to {neighbour}")]
    NotAdjacent { segment: Vec2, neighbour: Vec2 },
    #[error("segment {segment} would fold the snake back onto itself")]
    ReversalIntoNeck { segment: Vec2 },
    #[error("player {0} is already alive")]
    AlreadyAlive(PlayerId),
    #[error("player {0} is not alive")]
    NotAlive(PlayerId),
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("position {pos} is outside the {width}x{height} map")]
    OutOfBounds { pos: Vec2, width: i32, height: i32 },
}
