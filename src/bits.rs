use crate::grid::Position;

/// A set of grid cells stored one bit per cell, row-major.
///
/// Positions outside the board are never members; setting one is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitboard {
    words: Vec<u64>,
    width: usize,
    height: usize,
}

impl Bitboard {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            words: vec![0; (width * height).div_ceil(64)],
            width,
            height,
        }
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

    pub fn get(&self, pos: Position) -> bool {
        match self.index(pos) {
            Some(i) => (self.words[i / 64] & (1u64 << (i % 64))) != 0,
            None => false,
        }
    }

    pub fn set(&mut self, pos: Position) {
        if let Some(i) = self.index(pos) {
            self.words[i / 64] |= 1u64 << (i % 64);
        }
    }

    pub fn len(&self) -> usize {
        self.words
            .iter()
            .map(|&word| word.count_ones() as usize)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// Iterate over member positions in row-major order.
    pub fn iter(&self) -> BitboardIter<'_> {
        BitboardIter {
            board: self,
            word_idx: 0,
            bits: self.words.first().copied().unwrap_or(0),
        }
    }
}

pub struct BitboardIter<'a> {
    board: &'a Bitboard,
    word_idx: usize,
    bits: u64,
}

impl Iterator for BitboardIter<'_> {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.bits != 0 {
                let bit = self.bits.trailing_zeros() as usize;
                self.bits &= self.bits - 1; // Clear the lowest set bit
                let index = self.word_idx * 64 + bit;
                return Some(Position::new(
                    (index % self.board.width) as i32,
                    (index / self.board.width) as i32,
                ));
            }

            self.word_idx += 1;
            if self.word_idx >= self.board.words.len() {
                return None;
            }
            self.bits = self.board.words[self.word_idx];
        }
    }
}
