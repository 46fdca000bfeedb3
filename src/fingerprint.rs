use std::collections::BTreeSet;

use log::debug;

use crate::grid::Position;
use crate::level::Level;
use crate::tile::Tile;

fn remap(positions: &BTreeSet<Position>, f: impl Fn(Position) -> Position) -> BTreeSet<Position> {
    positions.iter().map(|&pos| f(pos)).collect()
}

impl Level {
    /// Turn the level a quarter clockwise.
    pub fn rotate(&mut self) {
        // (x, y) -> (h - 1 - y, x) with h the height before turning
        let h = self.height() as i32;
        let turn = |pos: Position| Position::new(h - 1 - pos.y, pos.x);

        self.grid.transpose();
        self.grid.mirror();
        self.player = turn(self.player);
        self.crates = remap(&self.crates, turn);
        self.targets = remap(&self.targets, turn);
        self.rotation = (self.rotation + 1) % 4;
    }

    /// Mirror the level left to right.
    pub fn flip(&mut self) {
        let w = self.width() as i32;
        let mirror = |pos: Position| Position::new(w - 1 - pos.x, pos.y);

        self.grid.mirror();
        self.player = mirror(self.player);
        self.crates = remap(&self.crates, mirror);
        self.targets = remap(&self.targets, mirror);
        // Mirroring after a turn equals turning back after mirroring.
        self.rotation = (4 - self.rotation) % 4;
        self.flipped = !self.flipped;
    }

    /// Swap rows and columns, i.e. mirror along the main diagonal.
    pub fn transpose(&mut self) {
        self.rotate();
        self.flip();
    }

    /// CRC-32 identifying the level independently of how it is turned.
    ///
    /// The level is reset on a copy first, so progress does not change the
    /// result. Mirror images get different fingerprints.
    pub fn fingerprint(&self) -> u32 {
        let mut level = self.clone();
        level.reset();

        let mut best = u32::MAX;
        for _ in 0..4 {
            best = best.min(crc32fast::hash(&level.grid.bytes(Tile::PERSISTENT)));
            level.rotate();
        }
        debug!("fingerprint {:08x}", best);
        best
    }
}
