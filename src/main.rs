use clap::Parser;
use log::debug;
use sokoban::{Level, Levels, Position};

#[derive(Parser)]
#[command(name = "sokoban")]
#[command(about = "Play and inspect Sokoban levels", long_about = None)]
struct Args {
    /// Path to the levels file (XSB format)
    #[arg(value_name = "FILE")]
    levels_file: String,

    /// Level number to load (1-indexed)
    #[arg(value_name = "LEVEL", default_value = "1")]
    level_num: usize,

    /// Moves to play, in LURD format
    #[arg(short, long)]
    moves: Option<String>,

    /// Replay the solution stored with the level
    #[arg(short, long)]
    solution: bool,

    /// Quarter turns clockwise to apply before playing
    #[arg(short, long, default_value = "0")]
    rotate: u8,

    /// Mirror the level left to right before playing
    #[arg(short, long)]
    flip: bool,

    /// Walk the player to a cell
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    walk: Option<Vec<i32>>,

    /// Show where the crate at this cell can be pushed
    #[arg(long = "crate", num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    crate_pos: Option<Vec<i32>>,

    /// Push the crate selected with --crate to this cell
    #[arg(long, num_args = 2, value_names = ["X", "Y"], requires = "crate_pos", allow_negative_numbers = true)]
    push: Option<Vec<i32>>,

    /// Number of moves to take back at the end
    #[arg(short, long, default_value = "0")]
    undo: usize,
}

fn position(coords: &[i32]) -> Position {
    Position::new(coords[0], coords[1])
}

fn print_level(level_num: usize, level: &Level) {
    println!(
        "level: {:<3}  title: {}  author: {}",
        level_num,
        level.title().unwrap_or("-"),
        level.author().unwrap_or("-")
    );
    println!("{}", level);
    println!(
        "fingerprint: {:08x}  pushes: {:<5}  moves: {:<5}  passed: {}",
        level.fingerprint(),
        level.push_count(),
        level.move_count(),
        if level.passed() { 'Y' } else { 'N' }
    );
    println!("lurd: {}", level.movement());
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    // Load levels from file
    let levels = match Levels::from_file(&args.levels_file) {
        Ok(levels) => levels,
        Err(e) => {
            eprintln!("Error loading levels: {}", e);
            std::process::exit(1);
        }
    };

    if args.level_num == 0 {
        eprintln!("Error: level numbers must be at least 1");
        std::process::exit(1);
    }

    let Some(level) = levels.get(args.level_num - 1) else {
        eprintln!(
            "Error: level {} not found (file contains {} levels)",
            args.level_num,
            levels.len()
        );
        std::process::exit(1);
    };
    let mut level = level.clone();

    // Solutions are recorded against the parsed orientation.
    if args.solution {
        let Some(solution) = level.solution().map(str::to_string) else {
            eprintln!("Error: level {} has no solution", args.level_num);
            std::process::exit(1);
        };
        if let Err(e) = level.play(&solution) {
            eprintln!("Error replaying solution: {}", e);
            std::process::exit(1);
        }
        debug!("solution replayed, passed: {}", level.passed());
    }

    for _ in 0..args.rotate % 4 {
        level.rotate();
    }
    if args.flip {
        level.flip();
    }

    if let Some(ref moves) = args.moves {
        if let Err(e) = level.play(moves) {
            eprintln!("Error playing moves: {}", e);
            std::process::exit(1);
        }
    }

    if let Some(ref coords) = args.walk {
        let dest = position(coords);
        if !level.move_to(dest) {
            eprintln!("Error: player cannot walk to {}", dest);
            std::process::exit(1);
        }
    }

    if let Some(ref coords) = args.crate_pos {
        let origin = position(coords);
        match args.push {
            Some(ref coords) => {
                let dest = position(coords);
                if !level.push_crate_to(origin, dest) {
                    eprintln!("Error: crate at {} cannot be pushed to {}", origin, dest);
                    std::process::exit(1);
                }
            }
            None => {
                let tree = level.crate_reachable(origin);
                println!("crate at {} can reach {} cells:", origin, tree.len());
                for dest in tree.destinations() {
                    let stops: Vec<String> =
                        tree.path_to(dest).iter().map(|pos| pos.to_string()).collect();
                    println!("  {}", stops.join(" -> "));
                }
            }
        }
    }

    for _ in 0..args.undo {
        if !level.undo() {
            break;
        }
    }

    print_level(args.level_num, &level);
}
