use std::io;

use thiserror::Error;

use crate::grid::Position;

/// Reasons a level text cannot be turned into a `Level`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unknown symbol {symbol:?} at ({x}, {y})")]
    UnknownSymbol { symbol: char, x: usize, y: usize },
    #[error("comment block is missing its `comment-end:` line")]
    UnterminatedComment,
    #[error("level contains no map")]
    Empty,
    #[error("no player found on map")]
    MissingPlayer,
    #[error("multiple players found on map")]
    MultiplePlayers,
    #[error("unknown movement {0:?}")]
    UnknownMove(char),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid level: {0}")]
    Format(#[from] FormatError),
    #[error("position {0} is outside the grid")]
    OutOfRange(Position),
}

pub type Result<T> = std::result::Result<T, Error>;
