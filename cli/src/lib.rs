// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end for kifu game records

pub mod command;
pub mod render;

use anyhow::{anyhow, bail, Context, Result};
use kifu_core::{ruleset, GameModel, ModelConfig, StateDelta};
use std::sync::Arc;

pub use command::{execute, parse_command, Action, Command, Flow};

/// Build a game for the named rule-set
pub fn new_game(width: u8, height: u8, rules: &str, config: ModelConfig) -> Result<GameModel> {
    if width > command::MAX_BOARD_SIZE || height > command::MAX_BOARD_SIZE {
        bail!(
            "Board {}x{} is too large to label (at most {} lines each way)",
            width,
            height,
            command::MAX_BOARD_SIZE
        );
    }
    let policy = ruleset::by_identifier(rules)
        .ok_or_else(|| anyhow!("Unknown rule-set: {} (expected chinese, japanese or nz)", rules))?;
    GameModel::with_config(width, height, Arc::from(policy), config)
        .with_context(|| format!("Failed to create a {}x{} game", width, height))
}

/// Board plus status line for the node under the cursor
pub fn describe_current(game: &GameModel) -> Result<String> {
    let snapshot = game.resolve_current()?;
    let last = game.node(game.current()).and_then(|node| match &node.data().delta {
        StateDelta::MovePlayed { stone, .. } => Some(stone.coord),
        _ => None,
    });
    let mut text = render::render_board(&snapshot.board, last);
    text.push_str(&render::render_status(&snapshot, game.to_play()?));
    if let Some(comment) = game.metadata(game.current(), "C")? {
        text.push_str(&format!("\n> {}", comment));
    }
    Ok(text)
}

/// Machine readable summary of the node under the cursor
pub fn summary_json(game: &GameModel) -> Result<serde_json::Value> {
    let snapshot = game.resolve_current()?;
    Ok(serde_json::json!({
        "rules": game.rules().identifier(),
        "width": game.width(),
        "height": game.height(),
        "move_number": snapshot.move_number,
        "prisoners": snapshot.prisoners,
        "to_play": game.to_play()?,
        "hash": format!("{:016x}", snapshot.hash),
        "compensation": game.compensation(),
        "nodes": game.tree().len(),
    }))
}
