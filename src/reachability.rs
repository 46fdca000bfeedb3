use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use log::debug;

use crate::bits::Bitboard;
use crate::grid::{ALL_DIRECTIONS, Direction, Position};
use crate::level::Level;
use crate::tile::Tile;

/// Every position one crate can be pushed to, each linked to the position the
/// crate is pushed from on the way there. Forms a tree rooted at the crate's
/// current position; the root itself has no parent and is not a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTree {
    root: Position,
    parents: BTreeMap<Position, Position>,
}

impl PushTree {
    fn new(root: Position) -> Self {
        PushTree {
            root,
            parents: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> Position {
        self.root
    }

    pub fn parent(&self, pos: Position) -> Option<Position> {
        self.parents.get(&pos).copied()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.parents.contains_key(&pos)
    }

    pub fn destinations(&self) -> impl Iterator<Item = Position> + '_ {
        self.parents.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Positions the crate stops at on its way from the root to `dest`, both
    /// ends included. Consecutive entries share a row or column. Empty if
    /// `dest` is not a destination.
    pub fn path_to(&self, dest: Position) -> Vec<Position> {
        if !self.contains(dest) {
            return Vec::new();
        }
        let mut path = vec![dest];
        let mut pos = dest;
        while let Some(parent) = self.parent(pos) {
            path.push(parent);
            pos = parent;
        }
        path.reverse();
        path
    }
}

/// A crate position under consideration and where the player stands once it
/// has been pushed there.
#[derive(Debug, Clone, Copy)]
struct Frame {
    crate_pos: Position,
    player: Position,
}

impl Level {
    /// Cells the player can walk to from `start` without pushing anything.
    pub fn player_reachable(&self, start: Position) -> Bitboard {
        self.grid
            .flood(start, |tile| tile.intersects(Tile::WALL | Tile::CRATE))
    }

    /// Flag every cell the player can currently walk to.
    pub fn mark_player_reachable(&mut self) {
        let reachable = self.player_reachable(self.player);
        for pos in reachable.iter() {
            if let Some(tile) = self.grid.get_mut(pos) {
                tile.insert(Tile::PLAYER_REACHABLE);
            }
        }
    }

    /// Every position the crate at `origin` can be moved to by a sequence of
    /// pushes while all other crates stay put. Empty if there is no crate at
    /// `origin`.
    pub fn crate_reachable(&self, origin: Position) -> PushTree {
        let mut tree = PushTree::new(origin);
        if !self.grid.at(origin).is_crate() {
            return tree;
        }

        let timer = Instant::now();
        let mut visited = Bitboard::new(self.width(), self.height());
        visited.set(origin);

        let mut queue = VecDeque::from([Frame {
            crate_pos: origin,
            player: self.player,
        }]);
        let mut frames = 0;

        while let Some(frame) = queue.pop_front() {
            frames += 1;
            let pos = frame.crate_pos;

            // The crate has left `origin` and now sits at `pos`.
            let blocked = |cell: Position| {
                cell == pos
                    || (cell != origin && self.grid.at(cell).intersects(Tile::WALL | Tile::CRATE))
            };
            let reachable = self.grid.flood_at(frame.player, blocked);

            for dir in ALL_DIRECTIONS {
                if !reachable.get(pos - dir) {
                    continue;
                }

                let mut next = pos + dir;
                loop {
                    if next != origin {
                        if visited.get(next)
                            || !self.grid.contains(next)
                            || self.grid.at(next).intersects(Tile::UNMOVABLE | Tile::CRATE)
                        {
                            break;
                        }
                        visited.set(next);
                        tree.parents.insert(next, pos);
                        queue.push_back(Frame {
                            crate_pos: next,
                            player: next - dir,
                        });
                    }
                    next = next + dir;
                }
            }
        }

        debug!(
            "crate at {}: {} destinations from {} positions in {} us",
            origin,
            tree.len(),
            frames,
            timer.elapsed().as_micros()
        );
        tree
    }

    /// Flag every destination of the crate at `origin` and return them.
    pub fn mark_crate_reachable(&mut self, origin: Position) -> PushTree {
        let tree = self.crate_reachable(origin);
        for pos in tree.destinations() {
            if let Some(tile) = self.grid.get_mut(pos) {
                tile.insert(Tile::CRATE_REACHABLE);
            }
        }
        tree
    }

    /// Push the crate at `origin` to `dest`, walking the player behind it
    /// before each straight run of pushes. Returns false, leaving the level
    /// untouched, if `dest` is not reachable for that crate.
    pub fn push_crate_to(&mut self, origin: Position, dest: Position) -> bool {
        let stops = self.crate_reachable(origin).path_to(dest);
        if stops.len() < 2 {
            return false;
        }

        let logged = self.move_count();
        for run in stops.windows(2) {
            if !self.push_run(run[0], run[1]) {
                while self.move_count() > logged {
                    self.undo();
                }
                return false;
            }
        }
        true
    }

    fn push_run(&mut self, from: Position, to: Position) -> bool {
        let Some(dir) = Direction::between(from, to) else {
            return false;
        };
        if !self.move_to(from - dir) {
            return false;
        }

        let mut pos = from;
        while pos != to {
            if !self.apply_move(dir) {
                return false;
            }
            pos = pos + dir;
        }
        true
    }
}
