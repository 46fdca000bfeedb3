use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{Error, FormatError, Result};
use crate::grid::{Grid, Position};
use crate::level::Level;
use crate::tile::Tile;

const COMMENT_START: &str = "comment:";
const COMMENT_END: &str = "comment-end:";

fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

impl Level {
    /// Parse a single level in XSB format.
    ///
    /// Lines starting with `;` are ignored. Lines containing `:` are metadata
    /// (`key: value`); a `comment:` entry runs until a `comment-end:` line.
    /// Every other non-empty line is a map row:
    /// - `#` = Wall
    /// - ` `, `-`, `_` = nothing
    /// - `.` = Target
    /// - `$`, `X` = Crate
    /// - `@` = Player
    /// - `*` = Crate on target
    /// - `+` = Player on target
    pub fn from_text(text: &str) -> Result<Self> {
        let mut rows: Vec<&str> = Vec::new();
        let mut metadata = Vec::new();

        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            if line.starts_with(';') || line.is_empty() {
                continue;
            }

            let Some(colon) = line.find(':') else {
                rows.push(line);
                continue;
            };

            let key = line[..colon].trim().to_ascii_lowercase();
            let mut value = line[colon + 1..].trim().to_string();
            if starts_with_ignore_case(line, COMMENT_START) {
                if !value.is_empty() {
                    value.push('\n');
                }
                loop {
                    let body = lines.next().ok_or(FormatError::UnterminatedComment)?;
                    if starts_with_ignore_case(body, COMMENT_END) {
                        break;
                    }
                    value.push_str(body);
                    value.push('\n');
                }
            }
            metadata.push((key, value));
        }

        if rows.is_empty() {
            return Err(FormatError::Empty.into());
        }

        let mut level = Self::parse_map(&rows)?;
        level.metadata = metadata;
        debug!(
            "parsed {}x{} level with {} crates and {} targets",
            level.width(),
            level.height(),
            level.crates.len(),
            level.targets.len()
        );
        Ok(level)
    }

    fn parse_map(rows: &[&str]) -> Result<Self> {
        let height = rows.len();
        let width = rows
            .iter()
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(0);

        let mut grid = Grid::new(width, height);
        let mut player = None;
        let mut crates = BTreeSet::new();
        let mut targets = BTreeSet::new();

        for (y, row) in rows.iter().enumerate() {
            for (x, symbol) in row.chars().enumerate() {
                let tile = Tile::from_symbol(symbol)
                    .ok_or(FormatError::UnknownSymbol { symbol, x, y })?;
                let pos = Position::new(x as i32, y as i32);

                if tile.is_player() {
                    if player.is_some() {
                        return Err(FormatError::MultiplePlayers.into());
                    }
                    player = Some(pos);
                }
                if tile.is_crate() {
                    crates.insert(pos);
                }
                if tile.is_target() {
                    targets.insert(pos);
                }
                grid.insert(pos, tile)?;
            }
        }

        let player = player.ok_or(FormatError::MissingPlayer)?;

        // Everything the player can reach without crossing a wall is inside.
        grid.fill(player, Tile::FLOOR, Tile::WALL);

        let mut level = Level {
            grid,
            player,
            crates,
            targets,
            metadata: Vec::new(),
            movements: Vec::new(),
            rotation: 0,
            flipped: false,
        };
        level.refresh_deadlocks();
        Ok(level)
    }
}

/// A collection of Sokoban levels in XSB format.
#[derive(Debug)]
pub struct Levels {
    levels: Vec<Level>,
}

impl Levels {
    /// Parse XSB-formatted levels from a string.
    ///
    /// Levels are separated by empty lines; a `comment:` block may itself
    /// contain empty lines. Blocks that carry no map (file headers, notes)
    /// are skipped.
    pub fn from_text(contents: &str) -> Result<Self> {
        let mut levels = Vec::new();
        let mut current_level = String::new();

        let mut lines = contents.lines();
        while let Some(line) = lines.next() {
            if line.trim_end_matches('\r').is_empty() {
                Self::push_block(&mut levels, &current_level)?;
                current_level.clear();
                continue;
            }

            if starts_with_ignore_case(line, COMMENT_START) {
                current_level.push_str(line);
                current_level.push('\n');
                loop {
                    let body = lines.next().ok_or(FormatError::UnterminatedComment)?;
                    current_level.push_str(body);
                    current_level.push('\n');
                    if starts_with_ignore_case(body, COMMENT_END) {
                        break;
                    }
                }
                continue;
            }

            current_level.push_str(line);
            current_level.push('\n');
        }

        // Don't forget the last level if file doesn't end with empty line
        Self::push_block(&mut levels, &current_level)?;

        debug!("loaded {} levels", levels.len());
        Ok(Levels { levels })
    }

    fn push_block(levels: &mut Vec<Level>, block: &str) -> Result<()> {
        match Level::from_text(block) {
            Ok(level) => levels.push(level),
            Err(Error::Format(FormatError::Empty)) => {}
            Err(err) => return Err(err),
        }
        Ok(())
    }

    /// Parse XSB-formatted levels from a text file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    /// Get the nth level (0-indexed).
    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }
}

impl IntoIterator for Levels {
    type Item = Level;
    type IntoIter = std::vec::IntoIter<Level>;

    fn into_iter(self) -> Self::IntoIter {
        self.levels.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_level() {
        let input = "####\n\
                     # .#\n\
                     #  ###\n\
                     #*@  #\n\
                     #  $ #\n\
                     #  ###\n\
                     ####";
        let level = Level::from_text(input).unwrap();

        assert_eq!(level.width(), 6);
        assert_eq!(level.height(), 7);
        assert_eq!(level.player_position(), Position::new(2, 3));
        assert_eq!(level.crate_positions().len(), 2);
        assert_eq!(level.target_positions().len(), 2);
        assert!(level.crate_positions().contains(&Position::new(1, 3)));
        assert!(level.target_positions().contains(&Position::new(2, 1)));
    }

    #[test]
    fn test_alternative_symbols() {
        let level = Level::from_text("#####\n#@X-#\n#_._#\n#####").unwrap();
        assert!(level.crate_positions().contains(&Position::new(2, 1)));
        assert_eq!(level.ascii_map(), "#####\n#@$_#\n#_._#\n#####\n");
    }

    #[test]
    fn test_carriage_returns() {
        let level = Level::from_text("####\r\n#@.#\r\n####\r\n").unwrap();
        assert_eq!(level.width(), 4);
        assert_eq!(level.ascii_map(), "####\n#@.#\n####\n");
    }

    #[test]
    fn test_unknown_symbol() {
        let result = Level::from_text("####\n#@?#\n####");
        assert!(matches!(
            result,
            Err(Error::Format(FormatError::UnknownSymbol {
                symbol: '?',
                x: 2,
                y: 1
            }))
        ));
    }

    #[test]
    fn test_no_player() {
        let result = Level::from_text("####\n#  #\n####");
        assert!(matches!(
            result,
            Err(Error::Format(FormatError::MissingPlayer))
        ));
    }

    #[test]
    fn test_multiple_players() {
        let result = Level::from_text("####\n#@@#\n####");
        assert!(matches!(
            result,
            Err(Error::Format(FormatError::MultiplePlayers))
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            Level::from_text(""),
            Err(Error::Format(FormatError::Empty))
        ));
        assert!(matches!(
            Level::from_text("; only a comment\nTitle: nothing"),
            Err(Error::Format(FormatError::Empty))
        ));
    }

    #[test]
    fn test_floor_fill() {
        let input = "#####\n\
                     #@ ##\n\
                     #####\n\
                     #   #\n\
                     #####";
        let level = Level::from_text(input).unwrap();

        assert!(level.tile(Position::new(1, 1)).unwrap().is_floor());
        assert!(level.tile(Position::new(2, 1)).unwrap().is_floor());
        assert!(!level.tile(Position::new(0, 0)).unwrap().is_floor());
        // Sealed pocket below the wall stays outside
        assert!(!level.tile(Position::new(2, 3)).unwrap().is_floor());
    }

    #[test]
    fn test_metadata() {
        let input = "Title: Microban 1\n\
                     ; a remark\n\
                     ####\n\
                     #@$.#\n\
                     ####\n\
                     Author:   David W. Skinner  \n\
                     Comment: first line\n\
                     second line\n\
                     third: line\n\
                     Comment-End:\n\
                     Solution: R";
        let level = Level::from_text(input).unwrap();

        assert_eq!(level.title(), Some("Microban 1"));
        assert_eq!(level.author(), Some("David W. Skinner"));
        assert_eq!(
            level.metadata_value("comment"),
            Some("first line\nsecond line\nthird: line\n")
        );
        assert_eq!(level.solution(), Some("R"));
        let keys: Vec<&str> = level.metadata().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["title", "author", "comment", "solution"]);
        assert_eq!(level.height(), 3);
    }

    #[test]
    fn test_unterminated_comment() {
        let input = "####\n#@.#\n####\nComment:\nnever closed\n";
        assert!(matches!(
            Level::from_text(input),
            Err(Error::Format(FormatError::UnterminatedComment))
        ));
    }

    #[test]
    fn test_from_text_basic() {
        let level1 = "####\n\
                      # .#\n\
                      #  ###\n\
                      #*@  #\n\
                      #  $ #\n\
                      #  ###\n\
                      ####";

        let level2 = "######\n\
                      #    #\n\
                      # #@ #\n\
                      # $* #\n\
                      # .* #\n\
                      #    #\n\
                      ######";

        let level3 = "  ####\n\
                      ###  ####\n\
                      #     $ #\n\
                      # #  #$ #\n\
                      # . .#@ #\n\
                      #########";

        let xsb_content = format!(
            "; 1\n\n{}\n\n; 2\n\n{}\n\n; 3\n\n{}\n",
            level1, level2, level3
        );

        let levels = Levels::from_text(&xsb_content).unwrap();

        assert_eq!(levels.len(), 3);
        for (level, text) in levels.iter().zip([level1, level2, level3]) {
            assert_eq!(level, &Level::from_text(text).unwrap());
        }
    }

    #[test]
    fn test_from_text_comment_spans_blank_lines() {
        let content = "Title: A\n\
                       Comment:\n\
                       \n\
                       still the comment\n\
                       comment-end:\n\
                       ####\n\
                       #@.#\n\
                       ####\n\
                       \n\
                       Title: B\n\
                       #####\n\
                       #@$.#\n\
                       #####\n";
        let levels = Levels::from_text(content).unwrap();

        assert_eq!(levels.len(), 2);
        assert_eq!(levels.get(0).unwrap().title(), Some("A"));
        assert_eq!(
            levels.get(0).unwrap().metadata_value("comment"),
            Some("\nstill the comment\n")
        );
        assert_eq!(levels.get(1).unwrap().title(), Some("B"));
    }

    #[test]
    fn test_from_text_skips_blocks_without_map() {
        let content = "; header\nCollection: test\n\n\n####\n#@.#\n####\n\nAuthor: nobody\n";
        let levels = Levels::from_text(content).unwrap();
        assert_eq!(levels.len(), 1);
    }

    #[test]
    fn test_from_text_invalid_level() {
        let xsb_content = "; 1

####
# .#
#@@  #
####
";

        let result = Levels::from_text(xsb_content);
        assert!(matches!(
            result,
            Err(Error::Format(FormatError::MultiplePlayers))
        ));
    }

    #[test]
    fn test_from_text_unterminated_comment() {
        let result = Levels::from_text("####\n#@.#\n####\ncomment:\n\nno end");
        assert!(matches!(
            result,
            Err(Error::Format(FormatError::UnterminatedComment))
        ));
    }

    #[test]
    fn test_from_file_no_file() {
        let result = Levels::from_file("nonexistent_file.xsb");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("sokoban_levels_{}.xsb", std::process::id()));
        fs::write(&path, "; 1\n\n####\n#@.#\n####\n\n; 2\n\n#####\n#@$.#\n#####\n").unwrap();

        let result = Levels::from_file(&path);
        fs::remove_file(&path).unwrap();

        let levels = result.unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels.get(1).unwrap().crate_positions().len(), 1);
    }
}
