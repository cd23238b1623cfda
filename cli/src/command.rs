// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text commands understood by the CLI.
//!
//! Points use board notation: a column letter (A-Z without I) followed by
//! a 1-based row number, so `D4` is x=3, y=3.

use anyhow::{anyhow, bail, Context, Result};
use kifu_core::{Color, Coord, GameModel};

/// What a player does on their turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Stone(Coord),
    Pass,
    Resign,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(Color, Action),
    Undo,
    Redo,
    /// Step to the parent node
    Back,
    /// Step into the given variation
    Forward(usize),
    /// Remove the current node and everything after it
    Remove,
    Comment(String),
    Show,
    Quit,
}

/// Result of running one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Parse one command. `B:D4` and `B D4` are both accepted for moves.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let separator = line
        .char_indices()
        .find(|(_, c)| *c == ':' || c.is_whitespace());
    let (head, rest) = match separator {
        Some((split, c)) => (&line[..split], line[split + c.len_utf8()..].trim()),
        None => (line, ""),
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "b" | "black" => Command::Play(Color::Black, parse_action(rest)?),
        "w" | "white" => Command::Play(Color::White, parse_action(rest)?),
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "back" => Command::Back,
        "forward" | "fwd" => {
            let variation = if rest.is_empty() {
                0
            } else {
                rest.parse()
                    .with_context(|| format!("Invalid variation number: {}", rest))?
            };
            Command::Forward(variation)
        }
        "remove" => Command::Remove,
        "comment" => Command::Comment(rest.to_string()),
        "show" | "board" => Command::Show,
        "quit" | "exit" => Command::Quit,
        "" => bail!("Empty command"),
        other => bail!("Unknown command: {}", other),
    };
    Ok(command)
}

fn parse_action(text: &str) -> Result<Action> {
    match text.to_ascii_lowercase().as_str() {
        "pass" => Ok(Action::Pass),
        "resign" => Ok(Action::Resign),
        _ => parse_point(text).map(Action::Stone),
    }
}

/// Parse a point such as `D4` or `t19`
pub fn parse_point(text: &str) -> Result<Coord> {
    let mut chars = text.chars();
    let letter = chars
        .next()
        .ok_or_else(|| anyhow!("Missing point"))?
        .to_ascii_uppercase();
    if !letter.is_ascii_uppercase() || letter == 'I' {
        bail!("Invalid column: {}", letter);
    }
    // Columns skip I
    let mut x = letter as u8 - b'A';
    if letter > 'I' {
        x -= 1;
    }

    let row: u8 = chars
        .as_str()
        .parse()
        .with_context(|| format!("Invalid row in point: {}", text))?;
    if row == 0 {
        bail!("Rows start at 1: {}", text);
    }
    Ok(Coord::new(x, row - 1))
}

/// Widest or tallest board that column letters can label
pub const MAX_BOARD_SIZE: u8 = 25;

/// Column letter for an x coordinate, `?` past the last letter
pub fn column_char(x: u8) -> char {
    match x {
        0..=7 => (b'A' + x) as char,
        8..=24 => (b'A' + x + 1) as char,
        _ => '?',
    }
}

/// Run a command against the game
pub fn execute(game: &mut GameModel, command: &Command) -> Result<Flow> {
    match command {
        Command::Play(color, action) => {
            let node = match action {
                Action::Stone(coord) => game.play(*color, *coord),
                Action::Pass => game.pass(*color),
                Action::Resign => game.resign(*color),
            }?;
            tracing::info!(?color, ?action, ?node, "played");
        }
        Command::Undo => game.undo()?,
        Command::Redo => game.redo()?,
        Command::Back => {
            if !game.step_back() {
                bail!("Already at the start of the game");
            }
        }
        Command::Forward(variation) => {
            if !game.step_forward(*variation) {
                bail!("No variation {} here", variation);
            }
        }
        Command::Remove => game.remove_node(game.current())?,
        Command::Comment(text) => {
            let current = game.current();
            if text.is_empty() {
                game.remove_metadata(current, "C", None)?;
            } else {
                game.set_metadata(current, "C", text, None)?;
            }
        }
        Command::Show => {}
        Command::Quit => return Ok(Flow::Stop),
    }
    Ok(Flow::Continue)
}
