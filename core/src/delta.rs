// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-node state deltas and node payloads
//!
//! A node never stores a whole board. It stores what changed relative to its
//! parent, together with the hash of the position that results.

use crate::{board::Board, Color, ConfigError, Coord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One colored stone at one intersection.
///
/// Inside a delta a change is always a toggle: it either puts the stone on an
/// empty intersection or takes that same stone off again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoneChange {
    pub coord: Coord,
    pub color: Color,
}

impl StoneChange {
    pub fn new(x: u8, y: u8, color: Color) -> Self {
        Self {
            coord: Coord::new(x, y),
            color,
        }
    }
}

/// What a node contributes relative to its parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateDelta {
    /// The root of the tree; its hash is the empty position's
    Root,
    /// A stone played under the rules, with everything it captured
    MovePlayed {
        stone: StoneChange,
        captured: Vec<StoneChange>,
    },
    /// The given side passed
    Pass(Color),
    /// The given side resigned
    Resign(Color),
    /// Manual setup outside normal play
    StoneEdit {
        added: Vec<StoneChange>,
        removed: Vec<StoneChange>,
    },
}

impl StateDelta {
    /// Apply this delta to a board, in place.
    pub fn apply(&self, board: &mut Board) {
        match self {
            StateDelta::MovePlayed { stone, captured } => {
                // Captured stones may include the placed stone itself (self-capture)
                let _ = board.set(stone.coord, Some(stone.color));
                for c in captured {
                    let _ = board.set(c.coord, None);
                }
            }
            StateDelta::StoneEdit { added, removed } => {
                for c in removed {
                    let _ = board.set(c.coord, None);
                }
                for c in added {
                    let _ = board.set(c.coord, Some(c.color));
                }
            }
            StateDelta::Root | StateDelta::Pass(_) | StateDelta::Resign(_) => {}
        }
    }

    /// Every stone toggled by this delta, for incremental hashing
    pub fn stone_changes(&self) -> Vec<StoneChange> {
        match self {
            StateDelta::MovePlayed { stone, captured } => {
                let mut changes = Vec::with_capacity(captured.len() + 1);
                changes.push(*stone);
                changes.extend_from_slice(captured);
                changes
            }
            StateDelta::StoneEdit { added, removed } => {
                removed.iter().chain(added.iter()).copied().collect()
            }
            StateDelta::Root | StateDelta::Pass(_) | StateDelta::Resign(_) => Vec::new(),
        }
    }

    /// Whether this delta counts as a turn taken (move, pass or resignation)
    pub fn is_move(&self) -> bool {
        matches!(
            self,
            StateDelta::MovePlayed { .. } | StateDelta::Pass(_) | StateDelta::Resign(_)
        )
    }

    /// The side that made this move, if it is one
    pub fn mover(&self) -> Option<Color> {
        match self {
            StateDelta::MovePlayed { stone, .. } => Some(stone.color),
            StateDelta::Pass(color) | StateDelta::Resign(color) => Some(*color),
            StateDelta::Root | StateDelta::StoneEdit { .. } => None,
        }
    }

    /// Whether the node's position takes part in repetition checks
    pub fn counts_for_repetition(&self) -> bool {
        !matches!(self, StateDelta::Pass(_) | StateDelta::Resign(_))
    }
}

/// Board markup shown at a single node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Annotation {
    Circle(Coord),
    Square(Coord),
    Triangle(Coord),
    Cross(Coord),
    Label(Coord, String),
}

impl Annotation {
    pub fn coord(&self) -> Coord {
        match self {
            Annotation::Circle(c)
            | Annotation::Square(c)
            | Annotation::Triangle(c)
            | Annotation::Cross(c)
            | Annotation::Label(c, _) => *c,
        }
    }
}

/// Everything a tree node carries besides its links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub delta: StateDelta,
    /// Hash of the full position after `delta` is applied
    pub hash: u64,
    pub annotations: Vec<Annotation>,
    pub metadata: BTreeMap<String, String>,
}

impl NodeData {
    pub fn new(delta: StateDelta, hash: u64) -> Self {
        Self {
            delta,
            hash,
            annotations: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Check a metadata key: non-empty, alphanumeric only.
pub fn validate_metadata_key(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() || !key.chars().all(char::is_alphanumeric) {
        tracing::debug!(key, "rejecting metadata key");
        return Err(ConfigError::InvalidMetadataKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stone_change_equality_uses_color() {
        let black = StoneChange::new(2, 3, Color::Black);
        let white = StoneChange::new(2, 3, Color::White);
        assert_ne!(black, white);
        assert_eq!(black, StoneChange::new(2, 3, Color::Black));
    }

    #[test]
    fn self_capture_leaves_point_empty() {
        let mut board = Board::new(3, 3).unwrap();
        let stone = StoneChange::new(0, 0, Color::White);
        let delta = StateDelta::MovePlayed {
            stone,
            captured: vec![stone],
        };
        delta.apply(&mut board);
        assert_eq!(board.get(Coord::new(0, 0)), None);
    }

    #[test]
    fn edit_replaces_color() {
        let mut board = Board::new(3, 3).unwrap();
        board.set(Coord::new(1, 1), Some(Color::Black)).unwrap();
        let delta = StateDelta::StoneEdit {
            added: vec![StoneChange::new(1, 1, Color::White)],
            removed: vec![StoneChange::new(1, 1, Color::Black)],
        };
        delta.apply(&mut board);
        assert_eq!(board.get(Coord::new(1, 1)), Some(Color::White));
    }

    #[test]
    fn metadata_keys() {
        assert!(validate_metadata_key("PB").is_ok());
        assert!(validate_metadata_key("GN2").is_ok());
        assert!(validate_metadata_key("").is_err());
        assert!(validate_metadata_key("P B").is_err());
        assert!(validate_metadata_key("KM-").is_err());
        assert!(validate_metadata_key("\t").is_err());
    }

    #[test]
    fn pass_is_a_move_without_stones() {
        let delta = StateDelta::Pass(Color::White);
        assert!(delta.is_move());
        assert!(delta.stone_changes().is_empty());
        assert_eq!(delta.mover(), Some(Color::White));
        assert!(!delta.counts_for_repetition());
    }
}
