//! Headless driver for the monster adventure core.
//!
//! Walks the player through the world with the AI fighting every battle and
//! prints the battle narration. Useful for watching the rules play out and
//! for producing save files.

use clap::Parser;
use monster_adventure::services::{InputFrame, Key};
use monster_adventure::world::map::Direction;
use monster_adventure::{Game, GameConfig, GameData, GameResult};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Run the monster adventure core without a window
#[derive(Parser, Debug)]
#[command(name = "monster-adventure")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the RON tables and an optional config.ron.
    /// The bundled tables are used when omitted.
    #[arg(short = 'd', long = "data")]
    data_dir: Option<PathBuf>,

    /// Seed for encounters and battle rolls
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(short = 't', long = "ticks", default_value_t = 600)]
    ticks: u32,

    /// Seconds per tick
    #[arg(long = "dt", default_value_t = 0.1)]
    dt: f32,

    /// Ticks spent walking right from the spawn before standing still
    #[arg(short = 'w', long = "walk", default_value_t = 12)]
    walk_ticks: u32,

    /// Save file to load before the run
    #[arg(short = 'l', long = "load")]
    load: Option<PathBuf>,

    /// Where to write a save once the run ends
    #[arg(long = "save")]
    save: Option<PathBuf>,
}

fn build_game(args: &Args) -> GameResult<Game> {
    let (data, mut config) = match &args.data_dir {
        Some(dir) => (GameData::load(dir)?, GameConfig::load(dir)?),
        None => (GameData::bundled()?, GameConfig::default()),
    };
    config.auto_battle = true;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let mut game = Game::headless(Arc::new(data), config)?;
    if let Some(path) = &args.load {
        if let Err(err) = game.load_game(path) {
            log::warn!("Could not load {}: {}. Starting a new game.", path.display(), err);
        }
    }
    Ok(game)
}

fn run(args: &Args) -> GameResult<()> {
    let mut game = build_game(args)?;
    println!("Starting in {} with:", game.current_world());
    for (slot, monster) in game.roster().iter() {
        println!("  [{}] {}", slot, monster);
    }

    for tick in 0..args.ticks {
        let input = if tick < args.walk_ticks {
            InputFrame::new().moving(Direction::Right)
        } else {
            InputFrame::new().press(Key::Confirm)
        };
        game.update(args.dt, &input)?;
        for message in game.take_messages() {
            println!("{}", message);
        }
        if !game.is_running() {
            break;
        }
    }

    println!();
    println!("Finished in {} at {:?}", game.current_world(), game.player().pos);
    for (slot, monster) in game.roster().iter() {
        let ((health, max_health), (energy, max_energy)) = monster.get_info();
        println!(
            "  [{}] {} HP {}/{} EP {}/{} EXP {}/{}",
            slot, monster, health, max_health, energy, max_energy, monster.exp, monster.level_up
        );
    }

    if let Some(path) = &args.save {
        game.save_game(path)?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
