use std::collections::BTreeSet;
use std::fmt;

use log::trace;

use crate::error::{FormatError, Result};
use crate::grid::{Direction, Grid, Move, Position};
use crate::tile::Tile;

/// A playable puzzle instance.
///
/// The grid is the source of truth for what each cell holds; the position
/// sets mirror the `CRATE`/`TARGET`/`PLAYER` flags so lookups don't have to
/// scan it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub(crate) grid: Grid,
    pub(crate) player: Position,
    pub(crate) crates: BTreeSet<Position>,
    pub(crate) targets: BTreeSet<Position>,
    pub(crate) metadata: Vec<(String, String)>,
    pub(crate) movements: Vec<Move>,
    // Display orientation relative to the parsed map: mirror first (if
    // flipped), then rotate clockwise `rotation` quarter turns.
    pub(crate) rotation: u8,
    pub(crate) flipped: bool,
}

impl Level {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn tile(&self, pos: Position) -> Result<Tile> {
        self.grid.tile(pos)
    }

    pub fn player_position(&self) -> Position {
        self.player
    }

    pub fn crate_positions(&self) -> &BTreeSet<Position> {
        &self.crates
    }

    pub fn target_positions(&self) -> &BTreeSet<Position> {
        &self.targets
    }

    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    /// Value of a metadata entry, looked up case-insensitively.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata_value("title")
    }

    pub fn author(&self) -> Option<&str> {
        self.metadata_value("author")
    }

    /// Known solution in LURD format, if the level text carried one.
    pub fn solution(&self) -> Option<&str> {
        self.metadata_value("solution")
    }

    pub fn movements(&self) -> &[Move] {
        &self.movements
    }

    /// The movement log in LURD format.
    pub fn movement(&self) -> String {
        self.movements.iter().map(|m| m.code()).collect()
    }

    pub fn move_count(&self) -> usize {
        self.movements.len()
    }

    pub fn push_count(&self) -> usize {
        self.movements.iter().filter(|m| m.push).count()
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// True when every crate rests on a target.
    pub fn passed(&self) -> bool {
        self.crates == self.targets
    }

    /// Map back to the parsed orientation.
    pub(crate) fn to_parsed_orientation(&self, dir: Direction) -> Direction {
        let dir = dir.rotate(4 - self.rotation);
        if self.flipped { dir.mirror() } else { dir }
    }

    /// Map from the parsed orientation to the one currently displayed.
    pub(crate) fn to_display_orientation(&self, dir: Direction) -> Direction {
        let dir = if self.flipped { dir.mirror() } else { dir };
        dir.rotate(self.rotation)
    }

    /// Move the player one cell in `dir`, pushing a crate if one is in the
    /// way. Returns false, leaving the level untouched, if the move is
    /// blocked by a wall or by a crate that cannot be pushed.
    pub fn apply_move(&mut self, dir: Direction) -> bool {
        let next = self.player + dir;
        let tile = self.grid.at(next);
        if tile.is_wall() {
            return false;
        }

        let push = tile.is_crate();
        if push {
            let beyond = next + dir;
            if self.grid.at(beyond).intersects(Tile::WALL | Tile::CRATE) {
                return false;
            }
            self.move_crate(next, beyond);
            self.check_deadlock(beyond);
        }
        self.move_player(next);

        let logged = Move {
            direction: self.to_parsed_orientation(dir),
            push,
        };
        trace!("move {} -> player at {}", logged, self.player);
        self.movements.push(logged);
        true
    }

    /// Apply a LURD string in the current display orientation. Case is
    /// ignored; whether a move pushes is decided by the board. Blocked moves
    /// are skipped.
    pub fn play(&mut self, lurd: &str) -> Result<()> {
        let moves = lurd
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| Move::from_code(c).ok_or(FormatError::UnknownMove(c)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for m in moves {
            self.apply_move(m.direction);
        }
        Ok(())
    }

    /// Take back the last move. Does nothing when the log is empty.
    pub fn undo(&mut self) -> bool {
        let Some(last) = self.movements.pop() else {
            return false;
        };
        let dir = self.to_display_orientation(last.direction);

        if last.push {
            let crate_pos = self.player + dir;
            self.move_crate(crate_pos, self.player);
        }
        self.move_player(self.player - dir);

        if last.push {
            self.refresh_deadlocks();
        }
        self.clear_markers();
        trace!("undo {} -> player at {}", last, self.player);
        true
    }

    /// Undo everything and return to the parsed orientation.
    pub fn reset(&mut self) {
        while self.undo() {}
        if self.flipped {
            self.flip();
        }
        while self.rotation != 0 {
            self.rotate();
        }
        // Patterns are not symmetric, so flags found in a rotated view can
        // differ from the ones found in the parsed orientation.
        self.refresh_deadlocks();
        self.clear_markers();
    }

    /// Remove the reachability hints written by `mark_player_reachable` and
    /// `mark_crate_reachable`.
    pub fn clear_markers(&mut self) {
        self.grid.clear(Tile::MARKERS);
    }

    // Callers only ever move onto cells they have just looked up on the grid.
    fn move_player(&mut self, to: Position) {
        if let Some(tile) = self.grid.get_mut(self.player) {
            tile.remove(Tile::PLAYER);
        }
        if let Some(tile) = self.grid.get_mut(to) {
            tile.insert(Tile::PLAYER);
        }
        self.player = to;
    }

    fn move_crate(&mut self, from: Position, to: Position) {
        if let Some(tile) = self.grid.get_mut(from) {
            tile.remove(Tile::CRATE);
        }
        if let Some(tile) = self.grid.get_mut(to) {
            tile.insert(Tile::CRATE);
        }
        self.crates.remove(&from);
        self.crates.insert(to);
    }

    /// The map in XSB symbols, one line per row.
    pub fn ascii_map(&self) -> String {
        let mut map = String::with_capacity((self.width() + 1) * self.height());
        for row in self.grid.rows().take(self.height()) {
            map.extend(row.iter().map(|tile| tile.symbol()));
            map.push('\n');
        }
        map
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ascii_map())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use crate::grid::ALL_DIRECTIONS;

    fn level(text: &str) -> Level {
        Level::from_text(text).unwrap()
    }

    const MICROCOSMOS: &str = "  #####\n\
                               ###   #\n\
                               #.@$  #\n\
                               ### $.#\n\
                               #.##$ #\n\
                               # # . ##\n\
                               #$ *$$.#\n\
                               #   .  #\n\
                               ########";

    #[test]
    fn test_push_into_wall_is_noop() {
        let mut level = level("#.#\n#@$\n#.#");
        let before = level.clone();

        assert!(!level.apply_move(Direction::Right));
        assert_eq!(level.player_position(), Position::new(1, 1));
        assert_eq!(level.crate_positions(), before.crate_positions());
        assert!(level.movements().is_empty());
    }

    #[test]
    fn test_single_push_completes_level() {
        let mut level = level("#####\n#@$.#\n#####");
        assert!(!level.passed());

        assert!(level.apply_move(Direction::Right));
        assert!(level.passed());
        assert_eq!(level.movement(), "R");
        assert_eq!(level.player_position(), Position::new(2, 1));
        assert_eq!(level.push_count(), 1);
    }

    #[test]
    fn test_step_into_wall_is_noop() {
        let mut level = level("####\n#@ #\n####");
        assert!(!level.apply_move(Direction::Up));
        assert!(!level.apply_move(Direction::Left));
        assert!(level.apply_move(Direction::Right));
        assert_eq!(level.movement(), "r");
    }

    #[test]
    fn test_push_into_crate_is_noop() {
        let mut level = level("######\n#@$$.#\n#   .#\n######");
        assert!(!level.apply_move(Direction::Right));
        assert_eq!(level.player_position(), Position::new(1, 1));
    }

    #[test]
    fn test_undo_push() {
        let mut level = level("######\n#@$ .#\n######");
        let original = level.clone();

        level.play("RR").unwrap();
        assert!(level.passed());
        assert!(level.undo());
        assert_eq!(level.movement(), "R");
        assert!(level.undo());
        assert_eq!(level, original);
    }

    #[test]
    fn test_undo_empty_log() {
        let mut level = level("####\n#@ #\n####");
        let original = level.clone();
        assert!(!level.undo());
        assert_eq!(level, original);
    }

    #[test]
    fn test_play_rejects_unknown_moves() {
        let mut level = level("####\n#@ #\n####");
        assert!(level.play("rx").is_err());
        assert!(level.movements().is_empty());
    }

    #[test]
    fn test_play_ignores_case() {
        let mut level = level("######\n#@$ .#\n######");
        level.play("rR").unwrap();
        assert_eq!(level.movement(), "RR");
    }

    #[test]
    fn test_crate_and_player_sets_match_grid() {
        let mut level = level(MICROCOSMOS);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let dir = ALL_DIRECTIONS[rng.gen_range(0..4)];
            level.apply_move(dir);

            assert_eq!(level.crate_positions().len(), level.grid().count(Tile::CRATE));
            assert_eq!(level.grid().count(Tile::PLAYER), 1);
            for pos in level.crate_positions() {
                assert!(level.tile(*pos).unwrap().is_crate());
            }
            assert!(level.tile(level.player_position()).unwrap().is_player());
        }
    }

    #[test]
    fn test_replay_reproduces_grid() {
        let original = level(MICROCOSMOS);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut played = original.clone();
        for _ in 0..300 {
            played.apply_move(ALL_DIRECTIONS[rng.gen_range(0..4)]);
        }

        let mut replayed = original.clone();
        replayed.play(&played.movement()).unwrap();
        assert_eq!(replayed.grid(), played.grid());
        assert_eq!(replayed.movement(), played.movement());
    }

    #[test]
    fn test_replay_after_undo_reproduces_map() {
        let original = level(MICROCOSMOS);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut played = original.clone();
        for _ in 0..400 {
            if rng.gen_range(0..5) == 0 {
                played.undo();
            } else {
                played.apply_move(ALL_DIRECTIONS[rng.gen_range(0..4)]);
            }
        }

        let mut replayed = original.clone();
        replayed.play(&played.movement()).unwrap();
        assert_eq!(replayed.ascii_map(), played.ascii_map());
        assert_eq!(replayed.player_position(), played.player_position());
        assert_eq!(replayed.crate_positions(), played.crate_positions());
    }

    #[test]
    fn test_undo_restores_initial_grid() {
        let original = level(MICROCOSMOS);
        let mut rng = ChaCha8Rng::seed_from_u64(1234);
        let mut played = original.clone();
        for _ in 0..300 {
            played.apply_move(ALL_DIRECTIONS[rng.gen_range(0..4)]);
        }
        while played.undo() {}
        assert_eq!(played, original);
    }

    #[test]
    fn test_log_is_orientation_independent() {
        let original = level("######\n#@$ .#\n######");
        let mut rotated = original.clone();
        rotated.rotate();

        // The corridor now runs top to bottom; pushing "down" on screen is
        // "right" in the parsed map.
        assert!(rotated.apply_move(Direction::Down));
        assert_eq!(rotated.movement(), "R");

        rotated.reset();
        assert_eq!(rotated, original);
    }

    #[test]
    fn test_undo_after_rotation() {
        let mut level = level("######\n#@$ .#\n######");
        level.apply_move(Direction::Right);
        level.rotate();
        level.rotate();
        let crate_before = *level.crate_positions().iter().next().unwrap();

        assert!(level.undo());
        let crate_after = *level.crate_positions().iter().next().unwrap();
        // Rotated by 180 degrees: the crate goes back towards screen right.
        assert_eq!(crate_after, crate_before + Direction::Right);
    }

    #[test]
    fn test_reset() {
        let original = level(MICROCOSMOS);
        let mut level = original.clone();
        level.play("rrdllulu").unwrap();
        level.rotate();
        level.flip();
        level.play("dd").unwrap();
        level.rotate();

        level.reset();
        assert_eq!(level, original);
        assert_eq!(level.rotation(), 0);
        assert!(!level.is_flipped());
    }

    #[test]
    fn test_ascii_map() {
        let level = level("#####\n#@$.#\n# * #\n#####");
        assert_eq!(level.ascii_map(), "#####\n#@$.#\n#_*_#\n#####\n");
        assert_eq!(level.to_string(), level.ascii_map());
    }
}
