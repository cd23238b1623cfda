// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule-set policies
//!
//! A policy answers the handful of questions where rule-sets disagree. It holds
//! no state, so one instance can be shared by any number of games.

use crate::Color;

/// Capabilities a rule-set provides to the engine
pub trait RulesPolicy: Send + Sync + std::fmt::Debug {
    /// Stable name used when a game record is saved and loaded again
    fn identifier(&self) -> &'static str;

    /// Compensation points for White given the number of handicap stones
    fn default_compensation(&self, handicap_count: u8) -> f32;

    /// Whether a move may capture its own group
    fn allows_self_capture(&self) -> bool;

    /// Whether recreating any earlier whole-board position is forbidden
    fn forbids_position_repeat(&self) -> bool {
        false
    }

    /// Side to move for the given move number.
    ///
    /// Black moves first in an even game. With handicap stones on the board
    /// White takes move 0 instead.
    fn color_to_play(&self, move_number: u32, handicap_used: bool) -> Color {
        let first = if handicap_used {
            Color::White
        } else {
            Color::Black
        };
        if move_number % 2 == 0 {
            first
        } else {
            first.opposite()
        }
    }
}

/// Chinese area rules with positional superko
#[derive(Debug, Clone, Copy, Default)]
pub struct ChineseRules;

impl RulesPolicy for ChineseRules {
    fn identifier(&self) -> &'static str {
        "chinese"
    }

    fn default_compensation(&self, handicap_count: u8) -> f32 {
        if handicap_count > 0 {
            0.5
        } else {
            7.5
        }
    }

    fn allows_self_capture(&self) -> bool {
        false
    }

    fn forbids_position_repeat(&self) -> bool {
        true
    }
}

/// Japanese territory rules; only the basic ko rule applies
#[derive(Debug, Clone, Copy, Default)]
pub struct JapaneseRules;

impl RulesPolicy for JapaneseRules {
    fn identifier(&self) -> &'static str {
        "japanese"
    }

    fn default_compensation(&self, handicap_count: u8) -> f32 {
        if handicap_count > 0 {
            0.5
        } else {
            6.5
        }
    }

    fn allows_self_capture(&self) -> bool {
        false
    }
}

/// New Zealand rules: superko, and multi-stone suicide is allowed
#[derive(Debug, Clone, Copy, Default)]
pub struct NewZealandRules;

impl RulesPolicy for NewZealandRules {
    fn identifier(&self) -> &'static str {
        "nz"
    }

    fn default_compensation(&self, handicap_count: u8) -> f32 {
        if handicap_count > 0 {
            0.0
        } else {
            7.0
        }
    }

    fn allows_self_capture(&self) -> bool {
        true
    }

    fn forbids_position_repeat(&self) -> bool {
        true
    }
}

/// Look up one of the bundled rule-sets by its identifier
pub fn by_identifier(identifier: &str) -> Option<Box<dyn RulesPolicy>> {
    match identifier {
        "chinese" => Some(Box::new(ChineseRules)),
        "japanese" => Some(Box::new(JapaneseRules)),
        "nz" => Some(Box::new(NewZealandRules)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_starts_even_games() {
        let rules = ChineseRules;
        assert_eq!(rules.color_to_play(0, false), Color::Black);
        assert_eq!(rules.color_to_play(1, false), Color::White);
        assert_eq!(rules.color_to_play(6, false), Color::Black);
    }

    #[test]
    fn white_starts_handicap_games() {
        let rules = JapaneseRules;
        assert_eq!(rules.color_to_play(0, true), Color::White);
        assert_eq!(rules.color_to_play(1, true), Color::Black);
    }

    #[test]
    fn identifiers_round_trip() {
        for rules in [
            &ChineseRules as &dyn RulesPolicy,
            &JapaneseRules,
            &NewZealandRules,
        ] {
            let found = by_identifier(rules.identifier()).unwrap();
            assert_eq!(found.identifier(), rules.identifier());
        }
        assert!(by_identifier("ing").is_none());
    }

    #[test]
    fn handicap_lowers_compensation() {
        assert_eq!(ChineseRules.default_compensation(0), 7.5);
        assert_eq!(ChineseRules.default_compensation(4), 0.5);
        assert_eq!(NewZealandRules.default_compensation(2), 0.0);
    }
}
