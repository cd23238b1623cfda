// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for integration tests

#![allow(dead_code)]

use kifu_core::ruleset::{ChineseRules, RulesPolicy};
use kifu_core::{Color, Coord, GameModel, StoneChange};
use std::sync::Arc;

/// Suicide allowed, no superko: isolates self-capture from repetition
#[derive(Debug)]
pub struct SelfCaptureRules;

impl RulesPolicy for SelfCaptureRules {
    fn identifier(&self) -> &'static str {
        "test-self-capture"
    }

    fn default_compensation(&self, _handicap_count: u8) -> f32 {
        0.0
    }

    fn allows_self_capture(&self) -> bool {
        true
    }
}

pub fn chinese(width: u8, height: u8) -> GameModel {
    GameModel::new(width, height, Arc::new(ChineseRules)).unwrap()
}

pub fn with_rules(size: u8, rules: Arc<dyn RulesPolicy>) -> GameModel {
    GameModel::new(size, size, rules).unwrap()
}

pub fn b(x: u8, y: u8) -> StoneChange {
    StoneChange::new(x, y, Color::Black)
}

pub fn w(x: u8, y: u8) -> StoneChange {
    StoneChange::new(x, y, Color::White)
}

pub fn at(x: u8, y: u8) -> Coord {
    Coord::new(x, y)
}
