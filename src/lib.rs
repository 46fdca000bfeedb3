//! Sokoban level engine: parsing, move physics with undo, deadlock marking,
//! crate-push reachability, player pathfinding and orientation-independent
//! level fingerprints.

mod bits;
mod deadlocks;
mod error;
mod fingerprint;
mod grid;
mod level;
mod levels;
mod pathfinding;
mod pqueue;
mod reachability;
mod tile;

pub use bits::Bitboard;
pub use error::{Error, FormatError, Result};
pub use grid::{ALL_DIRECTIONS, Direction, Grid, Move, Position};
pub use level::Level;
pub use levels::Levels;
pub use pathfinding::directions;
pub use reachability::PushTree;
pub use tile::Tile;
