// SPDX-License-Identifier: MIT OR Apache-2.0

//! kifu - replay and explore Go game records from the terminal
//!
//! Moves given on the command line are played in order. With `--interactive`
//! further commands are read from stdin, one per line.

use anyhow::{Context, Result};
use clap::Parser;
use kifu_cli::{describe_current, execute, new_game, parse_command, summary_json, Flow};
use kifu_core::ModelConfig;
use std::io::BufRead;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(name = "kifu", about = "Go move-tree explorer", version)]
struct Args {
    /// Board size for square boards
    #[clap(short, long, default_value = "19")]
    size: u8,

    /// Board width, overrides --size
    #[clap(long)]
    width: Option<u8>,

    /// Board height, overrides --size
    #[clap(long)]
    height: Option<u8>,

    /// Rule-set: chinese, japanese or nz
    #[clap(short, long, default_value = "chinese")]
    rules: String,

    /// TOML model config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Reject moves by the side not on turn
    #[clap(long)]
    strict: bool,

    /// Handicap stones given to Black
    #[clap(long)]
    handicap: Option<u8>,

    /// Read more commands from stdin
    #[clap(short, long)]
    interactive: bool,

    /// Print a JSON summary instead of the board
    #[clap(long)]
    json: bool,

    /// Enable debug logging
    #[clap(long)]
    debug: bool,

    /// Commands such as `B:D4`, `W:pass`, `undo`
    commands: Vec<String>,
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<ModelConfig> {
    let mut config = match &args.config {
        Some(path) => ModelConfig::load(path)?,
        None => ModelConfig::default(),
    };
    if args.strict {
        config.strict_turns = true;
    }
    if let Some(handicap) = args.handicap {
        config.handicap = handicap;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let config = load_config(&args)?;
    let width = args.width.unwrap_or(args.size);
    let height = args.height.unwrap_or(args.size);
    let mut game = new_game(width, height, &args.rules, config)?;
    tracing::debug!(?game, "game ready");

    for (i, text) in args.commands.iter().enumerate() {
        let command = parse_command(text)
            .with_context(|| format!("Command {} ({:?}) is invalid", i + 1, text))?;
        let flow = execute(&mut game, &command)
            .with_context(|| format!("Command {} ({:?}) failed", i + 1, text))?;
        if flow == Flow::Stop {
            return finish(&game, args.json);
        }
    }

    if args.interactive {
        println!("{}", describe_current(&game)?);
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line.context("Failed to read from stdin")?;
            if line.trim().is_empty() {
                continue;
            }
            // Mistakes at the prompt are reported, not fatal
            match parse_command(&line).and_then(|command| execute(&mut game, &command)) {
                Ok(Flow::Stop) => break,
                Ok(Flow::Continue) => println!("{}", describe_current(&game)?),
                Err(e) => eprintln!("error: {:#}", e),
            }
        }
    }

    finish(&game, args.json)
}

fn finish(game: &kifu_core::GameModel, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&summary_json(game)?)?);
    } else {
        println!("{}", describe_current(game)?);
    }
    Ok(())
}
