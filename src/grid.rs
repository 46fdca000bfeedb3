use std::fmt;
use std::ops::{Add, Sub};

use arrayvec::ArrayVec;

use crate::bits::Bitboard;
use crate::error::{Error, Result};
use crate::tile::Tile;

/// A grid-relative cell coordinate. Not bounded by itself; every lookup is
/// checked against the grid it is used with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    pub fn manhattan_distance(self, other: Position) -> usize {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as usize
    }

    pub fn neighbors(self) -> ArrayVec<Position, 4> {
        ALL_DIRECTIONS.iter().map(|&dir| self + dir).collect()
    }
}

impl Add<Direction> for Position {
    type Output = Position;

    fn add(self, dir: Direction) -> Position {
        let (dx, dy) = dir.delta();
        Position::new(self.x + dx, self.y + dy)
    }
}

impl Sub<Direction> for Position {
    type Output = Position;

    fn sub(self, dir: Direction) -> Position {
        self + dir.reverse()
    }
}

impl Add<(i32, i32)> for Position {
    type Output = Position;

    fn add(self, (dx, dy): (i32, i32)) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    fn from_delta(delta: (i32, i32)) -> Option<Direction> {
        match delta {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Rotate clockwise by `quarter_turns` * 90 degrees (in screen
    /// coordinates, y pointing down).
    pub fn rotate(self, quarter_turns: u8) -> Direction {
        let mut dir = self;
        for _ in 0..quarter_turns % 4 {
            let (dx, dy) = dir.delta();
            dir = Direction::from_delta((-dy, dx)).unwrap_or(dir);
        }
        dir
    }

    /// Mirror across the vertical axis.
    pub fn mirror(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            other => other,
        }
    }

    /// Direction of a single orthogonal step from `from` towards `to`,
    /// or `None` if they do not share a row or column.
    pub fn between(from: Position, to: Position) -> Option<Direction> {
        if from == to || (from.x != to.x && from.y != to.y) {
            return None;
        }
        Direction::from_delta(((to.x - from.x).signum(), (to.y - from.y).signum()))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

/// One entry of the movement log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub direction: Direction,
    pub push: bool,
}

impl Move {
    pub fn step(direction: Direction) -> Self {
        Move {
            direction,
            push: false,
        }
    }

    pub fn push(direction: Direction) -> Self {
        Move {
            direction,
            push: true,
        }
    }

    /// LURD code: lowercase for a step, uppercase for a push.
    pub fn code(self) -> char {
        let c = match self.direction {
            Direction::Up => 'u',
            Direction::Down => 'd',
            Direction::Left => 'l',
            Direction::Right => 'r',
        };
        if self.push { c.to_ascii_uppercase() } else { c }
    }

    pub fn from_code(code: char) -> Option<Move> {
        let direction = match code.to_ascii_lowercase() {
            'u' => Direction::Up,
            'd' => Direction::Down,
            'l' => Direction::Left,
            'r' => Direction::Right,
            _ => return None,
        };
        Some(Move {
            direction,
            push: code.is_ascii_uppercase(),
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Row-major tile storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    tiles: Vec<Tile>,
    width: usize,
    height: usize,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            tiles: vec![Tile::EMPTY; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.index(pos).is_some()
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    pub fn get(&self, pos: Position) -> Option<Tile> {
        self.index(pos).map(|i| self.tiles[i])
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        self.index(pos).map(|i| &mut self.tiles[i])
    }

    /// Like `get`, but reports positions outside the grid as an error.
    pub fn tile(&self, pos: Position) -> Result<Tile> {
        self.get(pos).ok_or(Error::OutOfRange(pos))
    }

    /// Tile at `pos`, with everything outside the grid reading as wall.
    pub fn at(&self, pos: Position) -> Tile {
        self.get(pos).unwrap_or(Tile::WALL)
    }

    pub fn insert(&mut self, pos: Position, flags: Tile) -> Result<()> {
        let i = self.index(pos).ok_or(Error::OutOfRange(pos))?;
        self.tiles[i].insert(flags);
        Ok(())
    }

    pub fn remove(&mut self, pos: Position, flags: Tile) -> Result<()> {
        let i = self.index(pos).ok_or(Error::OutOfRange(pos))?;
        self.tiles[i].remove(flags);
        Ok(())
    }

    /// Remove `flags` from every cell.
    pub fn clear(&mut self, flags: Tile) {
        for tile in &mut self.tiles {
            tile.remove(flags);
        }
    }

    /// Flood fill from `start`, adding `value` to every cell reached without
    /// crossing a cell that carries any flag of `border`.
    pub fn fill(&mut self, start: Position, value: Tile, border: Tile) {
        let reached = self.flood(start, |tile| tile.intersects(border));
        for pos in reached.iter() {
            if let Some(i) = self.index(pos) {
                self.tiles[i].insert(value);
            }
        }
    }

    /// Cells connected to `start` through cells for which `blocked` is false.
    /// `start` itself is always included when it lies on the grid.
    pub fn flood(&self, start: Position, blocked: impl Fn(Tile) -> bool) -> Bitboard {
        self.flood_at(start, |pos| self.get(pos).is_none_or(&blocked))
    }

    /// Position-aware variant of `flood`, used when the caller overlays
    /// simulated contents on top of the stored tiles.
    pub fn flood_at(&self, start: Position, blocked: impl Fn(Position) -> bool) -> Bitboard {
        let mut visited = Bitboard::new(self.width, self.height);
        if !self.contains(start) {
            return visited;
        }

        let mut stack = vec![start];
        visited.set(start);

        while let Some(pos) = stack.pop() {
            for next in pos.neighbors() {
                if self.contains(next) && !visited.get(next) && !blocked(next) {
                    visited.set(next);
                    stack.push(next);
                }
            }
        }

        visited
    }

    /// Swap rows and columns.
    pub fn transpose(&mut self) {
        let mut tiles = Vec::with_capacity(self.tiles.len());
        for x in 0..self.width {
            for y in 0..self.height {
                tiles.push(self.tiles[y * self.width + x]);
            }
        }
        self.tiles = tiles;
        std::mem::swap(&mut self.width, &mut self.height);
    }

    /// Reverse every row.
    pub fn mirror(&mut self) {
        if self.width == 0 {
            return;
        }
        for row in self.tiles.chunks_mut(self.width) {
            row.reverse();
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.width.max(1))
    }

    /// Raw tile bytes restricted to `mask`, row-major.
    pub fn bytes(&self, mask: Tile) -> Vec<u8> {
        self.tiles
            .iter()
            .map(|tile| tile.intersection(mask).bits())
            .collect()
    }

    pub fn count(&self, flags: Tile) -> usize {
        self.tiles
            .iter()
            .filter(|tile| tile.intersects(flags))
            .count()
    }
}
