use std::time::Instant;

use log::debug;

use crate::bits::Bitboard;
use crate::grid::{Direction, Position};
use crate::level::Level;
use crate::pqueue::PriorityQueue;
use crate::tile::Tile;

/// Step directions along a path of orthogonally adjacent cells.
pub fn directions(path: &[Position]) -> Vec<Direction> {
    path.windows(2)
        .filter_map(|step| Direction::between(step[0], step[1]))
        .collect()
}

impl Level {
    /// Shortest path from `start` to `end` through cells carrying none of the
    /// `blocking` flags, both ends included. Empty if `end` cannot be reached.
    ///
    /// `start` itself is never checked against `blocking`.
    pub fn find_path(&self, start: Position, end: Position, blocking: Tile) -> Vec<Position> {
        let grid = &self.grid;
        if !grid.contains(start) || !grid.contains(end) {
            return Vec::new();
        }
        if start == end {
            return vec![start];
        }

        let timer = Instant::now();
        let (width, height) = (grid.width(), grid.height());
        let index = |pos: Position| pos.y as usize * width + pos.x as usize;

        // Path lengths stay below the cell count and the estimate below
        // width + height, which bounds every priority.
        let mut queue = PriorityQueue::new(width * height + width + height + 1);
        let mut cost = vec![usize::MAX; width * height];
        let mut came_from: Vec<Option<Position>> = vec![None; width * height];
        let mut closed = Bitboard::new(width, height);

        cost[index(start)] = 0;
        queue.push(start.manhattan_distance(end), start);

        while let Some(pos) = queue.pop_min() {
            if pos == end {
                break;
            }
            if closed.get(pos) {
                continue;
            }
            closed.set(pos);

            let g = cost[index(pos)] + 1;
            for next in pos.neighbors() {
                if !grid.contains(next) || grid.at(next).intersects(blocking) {
                    continue;
                }
                if g < cost[index(next)] {
                    cost[index(next)] = g;
                    came_from[index(next)] = Some(pos);
                    queue.push(g + next.manhattan_distance(end), next);
                }
            }
        }

        let mut path = Vec::new();
        if cost[index(end)] != usize::MAX {
            let mut pos = end;
            path.push(pos);
            while let Some(prev) = came_from[index(pos)] {
                path.push(prev);
                pos = prev;
            }
            path.reverse();
        }

        debug!(
            "path {} -> {}: {} cells in {} us",
            start,
            end,
            path.len(),
            timer.elapsed().as_micros()
        );
        path
    }

    /// Walk the player to `dest` without pushing anything. Returns false,
    /// leaving the level untouched, if no such walk exists.
    pub fn move_to(&mut self, dest: Position) -> bool {
        let path = self.find_path(self.player, dest, Tile::WALL | Tile::CRATE);
        if path.is_empty() {
            return false;
        }
        for dir in directions(&path) {
            self.apply_move(dir);
        }
        true
    }
}
