//! Tengen: a Go engine with full rules, scoring, and pluggable opponents.
//!
//! ## Usage
//!
//! - `tengen` - Run the self-play demo
//! - `tengen gtp [--size N]` - Start the GTP server for GUI integration
//! - `tengen demo [--size N] [--save FILE]` - Self-play demo with options
//!
//! Logging goes to stderr so the GTP protocol stream on stdout stays
//! clean; set `RUST_LOG=debug` to watch the traffic.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};
use clap::{Parser, Subcommand};

use tengen::bot::{Bot, BotMove, Difficulty};
use tengen::constants::{DEFAULT_BOARD_SIZE, EASY_SEARCH_DEPTH, SUPPORTED_SIZES};
use tengen::game::Game;
use tengen::gtp::{format_vertex, GtpServer};
use tengen::minimax::MinimaxBot;
use tengen::save::{save_game, GameMode, GameStatus, SaveInfo};
use tengen::territory;

/// Tengen: Go rules engine with minimax and external-engine opponents
#[derive(Parser)]
#[command(name = "tengen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GTP (Go Text Protocol) server for use with GUI applications
    Gtp {
        /// Board size (9, 13, or 19)
        #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
        size: usize,
    },
    /// Play the built-in searcher against itself and print the result
    Demo {
        /// Board size (9, 13, or 19)
        #[arg(long, default_value_t = 9)]
        size: usize,
        /// Write the finished game to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    )
    .target(env_logger::Target::Stderr)
    .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Gtp { size }) => {
            check_size(size)?;
            let mut server = GtpServer::new(size);
            server.run();
            Ok(())
        }
        Some(Commands::Demo { size, save }) => {
            check_size(size)?;
            run_demo(size, save.as_deref())
        }
        None => run_demo(9, None),
    }
}

fn check_size(size: usize) -> anyhow::Result<()> {
    ensure!(
        SUPPORTED_SIZES.contains(&size),
        "unsupported board size {size}, expected one of {SUPPORTED_SIZES:?}"
    );
    Ok(())
}

fn run_demo(size: usize, save_path: Option<&Path>) -> anyhow::Result<()> {
    println!("Tengen: minimax self-play on {size}x{size}\n");

    let black = MinimaxBot::new(size, EASY_SEARCH_DEPTH);
    let white = MinimaxBot::new(size, EASY_SEARCH_DEPTH);
    black.init();
    white.init();

    let mut game = Game::new(size);
    let move_cap = size * size * 2;
    let mut ply = 0;

    while !game.is_over() && ply < move_cap {
        ply += 1;
        let to_move = game.black_to_move();
        let label = if to_move { "B" } else { "W" };
        let mover = if to_move { &black } else { &white };

        // The mirrors are rebuilt from the authoritative board each turn,
        // so captures from either side are always reflected.
        mover.set_position(game.board());

        match mover.generate_move(to_move) {
            BotMove::Play((x, y)) => {
                if game.attempt_move(x, y).is_ok() {
                    println!("{ply:>3}. {label} {}", format_vertex((x, y), size));
                } else {
                    game.attempt_pass();
                    println!("{ply:>3}. {label} pass");
                }
            }
            BotMove::Pass | BotMove::Resign => {
                game.attempt_pass();
                println!("{ply:>3}. {label} pass");
            }
        }
    }

    println!("\nFinal position:\n{}", game.board());

    let summary = territory::score(game.board(), &[], game.komi());
    println!(
        "Black: {} stones + {} territory = {}",
        summary.black_stones,
        summary.black_territory,
        summary.black_total()
    );
    println!(
        "White: {} stones + {} territory + {} komi = {}",
        summary.white_stones,
        summary.white_territory,
        summary.komi,
        summary.white_total()
    );
    let margin = summary.margin();
    if margin > 0.0 {
        println!("Black wins by {margin:.1}");
    } else {
        println!("White wins by {:.1}", -margin);
    }

    if let Some(path) = save_path {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs().to_string())
            .unwrap_or_default();
        let info = SaveInfo {
            title: "Demo game".to_string(),
            timestamp,
            board_size: size,
            mode: GameMode::PlayerVsAi,
            status: if game.is_over() {
                GameStatus::Finished
            } else {
                GameStatus::Ongoing
            },
            difficulty: Difficulty::Easy,
            end_reason: if game.is_over() {
                "Both players passed".to_string()
            } else {
                String::new()
            },
        };
        save_game(path, &game, &info, 0.0, 0.0)
            .with_context(|| format!("saving demo game to {}", path.display()))?;
        println!("Saved to {}", path.display());
    }

    Ok(())
}
