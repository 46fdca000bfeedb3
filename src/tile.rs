use std::fmt;
use std::ops::{BitAnd, BitOr};

/// A set of flags describing the contents of one grid cell.
///
/// Cells combine freely (`FLOOR | CRATE | TARGET` is a crate resting on a
/// target), except that a wall never carries anything else.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    bits: u8,
}

impl Tile {
    pub const EMPTY: Tile = Tile { bits: 0 };
    pub const FLOOR: Tile = Tile { bits: 1 << 0 };
    pub const WALL: Tile = Tile { bits: 1 << 1 };
    pub const CRATE: Tile = Tile { bits: 1 << 2 };
    pub const TARGET: Tile = Tile { bits: 1 << 3 };
    pub const PLAYER: Tile = Tile { bits: 1 << 4 };

    pub const DEADLOCKED: Tile = Tile { bits: 1 << 5 };
    pub const PLAYER_REACHABLE: Tile = Tile { bits: 1 << 6 };
    pub const CRATE_REACHABLE: Tile = Tile { bits: 1 << 7 };

    /// Cells a crate can never be moved through or out of.
    pub const UNMOVABLE: Tile = Tile {
        bits: Self::WALL.bits | Self::DEADLOCKED.bits,
    };

    /// Flags that are part of the level itself rather than analysis output.
    pub const PERSISTENT: Tile = Tile {
        bits: Self::FLOOR.bits
            | Self::WALL.bits
            | Self::CRATE.bits
            | Self::TARGET.bits
            | Self::PLAYER.bits,
    };

    /// Hints written by the reachability queries for renderers.
    pub const MARKERS: Tile = Tile {
        bits: Self::PLAYER_REACHABLE.bits | Self::CRATE_REACHABLE.bits,
    };

    pub const fn from_bits(bits: u8) -> Self {
        Tile { bits }
    }

    pub const fn bits(self) -> u8 {
        self.bits
    }

    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// True if every flag of `other` is set.
    pub const fn contains(self, other: Tile) -> bool {
        self.bits & other.bits == other.bits
    }

    /// True if at least one flag of `other` is set.
    pub const fn intersects(self, other: Tile) -> bool {
        self.bits & other.bits != 0
    }

    pub fn insert(&mut self, other: Tile) {
        self.bits |= other.bits;
    }

    pub fn remove(&mut self, other: Tile) {
        self.bits &= !other.bits;
    }

    pub const fn union(self, other: Tile) -> Tile {
        Tile {
            bits: self.bits | other.bits,
        }
    }

    pub const fn intersection(self, other: Tile) -> Tile {
        Tile {
            bits: self.bits & other.bits,
        }
    }

    pub const fn is_floor(self) -> bool {
        self.intersects(Self::FLOOR)
    }

    pub const fn is_wall(self) -> bool {
        self.intersects(Self::WALL)
    }

    pub const fn is_crate(self) -> bool {
        self.intersects(Self::CRATE)
    }

    pub const fn is_target(self) -> bool {
        self.intersects(Self::TARGET)
    }

    pub const fn is_player(self) -> bool {
        self.intersects(Self::PLAYER)
    }

    pub const fn is_deadlocked(self) -> bool {
        self.intersects(Self::DEADLOCKED)
    }

    pub const fn is_unmovable(self) -> bool {
        self.intersects(Self::UNMOVABLE)
    }

    pub const fn is_player_reachable(self) -> bool {
        self.intersects(Self::PLAYER_REACHABLE)
    }

    pub const fn is_crate_reachable(self) -> bool {
        self.intersects(Self::CRATE_REACHABLE)
    }

    /// XSB symbol of the cell, `_` for anything without a symbol of its own.
    pub fn symbol(self) -> char {
        match (
            self.is_wall(),
            self.is_crate(),
            self.is_target(),
            self.is_player(),
        ) {
            (true, false, false, false) => '#',
            (false, true, false, false) => '$',
            (false, false, true, false) => '.',
            (false, false, false, true) => '@',
            (false, true, true, false) => '*',
            (false, false, true, true) => '+',
            _ => '_',
        }
    }

    /// Tile for an XSB symbol, or `None` if the symbol is unknown.
    pub fn from_symbol(symbol: char) -> Option<Tile> {
        match symbol {
            ' ' | '-' | '_' | '\r' => Some(Self::EMPTY),
            '#' => Some(Self::WALL),
            '$' | 'X' => Some(Self::CRATE),
            '.' => Some(Self::TARGET),
            '@' => Some(Self::PLAYER),
            '*' => Some(Self::CRATE | Self::TARGET),
            '+' => Some(Self::PLAYER | Self::TARGET),
            _ => None,
        }
    }
}

impl BitOr for Tile {
    type Output = Tile;

    fn bitor(self, rhs: Tile) -> Tile {
        self.union(rhs)
    }
}

impl BitAnd for Tile {
    type Output = Tile;

    fn bitand(self, rhs: Tile) -> Tile {
        self.intersection(rhs)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
