use crate::grid::Position;
use crate::level::Level;
use crate::tile::Tile;

/// Orthogonal neighbours, clockwise from up.
const ORTHOGONAL: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// All eight neighbours, clockwise from up.
const SURROUNDING: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// `(a, b, c)`: locked when `a` and `b` share a blocking flag and `c` holds
/// a crate.
// FIXME: these only cover some of the L-shaped freezes, and two rows repeat.
//  #      #
//  $$  $# $$   $#
//   # #$   #  #$
const L_SHAPES: [[(i32, i32); 3]; 8] = [
    [(0, -1), (1, 1), (1, 0)],
    [(1, 0), (-1, 1), (0, 1)],
    [(-1, -1), (0, 1), (-1, 0)],
    [(0, -1), (-1, 1), (0, -1)],
    [(-1, -1), (0, -1), (-1, 0)],
    [(1, -1), (-1, 0), (0, -1)],
    [(0, -1), (1, 1), (1, 0)],
    [(1, 0), (-1, 1), (0, 1)],
];

/// True if all of `tiles` carry one and the same flag out of `mask`.
fn share(tiles: &[Tile], mask: Tile) -> bool {
    !tiles
        .iter()
        .fold(mask, |common, &tile| common.intersection(tile))
        .is_empty()
}

impl Level {
    fn neighbor(&self, pos: Position, offset: (i32, i32)) -> Tile {
        self.grid.at(pos + offset)
    }

    /// True if the crate at `pos` provably can never be moved onto a target.
    ///
    /// Only local patterns are checked, so a `false` answer proves nothing.
    pub fn is_crate_locked(&self, pos: Position) -> bool {
        if !self.grid.at(pos).is_crate() {
            return false;
        }

        // #$
        //  #
        for i in 0..4 {
            let a = self.neighbor(pos, ORTHOGONAL[i]);
            let b = self.neighbor(pos, ORTHOGONAL[(i + 1) % 4]);
            if a.is_unmovable() && b.is_unmovable() {
                return true;
            }
        }

        // $$
        // ##
        for i in (0..8).step_by(2) {
            let side = self.neighbor(pos, SURROUNDING[i]);
            let corner = self.neighbor(pos, SURROUNDING[i + 1]);
            let next = self.neighbor(pos, SURROUNDING[(i + 2) % 8]);
            if side.is_crate() && share(&[corner, next], Tile::UNMOVABLE) {
                return true;
            }
            if share(&[side, corner], Tile::UNMOVABLE) && next.is_crate() {
                return true;
            }
        }

        for [a, b, c] in L_SHAPES {
            if share(&[self.neighbor(pos, a), self.neighbor(pos, b)], Tile::UNMOVABLE)
                && self.neighbor(pos, c).is_crate()
            {
                return true;
            }
        }

        // $X
        // XX
        for i in (0..8).step_by(2) {
            let block = [
                self.neighbor(pos, SURROUNDING[i]),
                self.neighbor(pos, SURROUNDING[i + 1]),
                self.neighbor(pos, SURROUNDING[(i + 2) % 8]),
            ];
            if share(&block, Tile::UNMOVABLE | Tile::CRATE) {
                return true;
            }
        }

        false
    }

    /// Mark the crate at `pos` as deadlocked if it is locked, then re-check
    /// its unmarked neighbouring crates, which may now be locked against it.
    pub fn check_deadlock(&mut self, pos: Position) {
        let mut stack = vec![pos];

        while let Some(pos) = stack.pop() {
            if self.grid.at(pos).is_deadlocked() || !self.is_crate_locked(pos) {
                continue;
            }
            if let Some(tile) = self.grid.get_mut(pos) {
                tile.insert(Tile::DEADLOCKED);
            }

            for &offset in ORTHOGONAL.iter().rev() {
                let next = pos + offset;
                let tile = self.grid.at(next);
                if tile.is_crate() && !tile.is_deadlocked() {
                    stack.push(next);
                }
            }
        }
    }

    /// Forget every deadlock mark and check all crates from scratch.
    pub fn refresh_deadlocks(&mut self) {
        self.grid.clear(Tile::DEADLOCKED);
        let crates: Vec<Position> = self.crates.iter().copied().collect();
        for pos in crates {
            self.check_deadlock(pos);
        }
    }

    pub fn deadlocked_crates(&self) -> impl Iterator<Item = Position> + '_ {
        self.crates
            .iter()
            .copied()
            .filter(|&pos| self.grid.at(pos).is_deadlocked())
    }
}
