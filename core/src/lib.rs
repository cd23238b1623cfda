// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kifu Core - Game Record Trees and Rules
//!
//! This crate provides the incremental game-state engine for Go records:
//! - Position buffers and Zobrist state hashing
//! - A move tree of delta-encoded nodes with variations
//! - Legality checking, captures, ko and positional repetition
//! - A bounded undo/redo log with mergeable edits
//! - The `GameModel` façade with asynchronous change notifications

#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod board;
pub mod config;
pub mod delta;
pub mod edit;
pub mod hash;
pub mod history;
pub mod model;
pub mod notify;
pub mod resolver;
pub mod rules;
pub mod ruleset;
pub mod tree;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Player color in a Go game (Black or White)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    /// Black player (traditionally goes first)
    Black,
    /// White player
    White,
}

impl Color {
    /// Returns the opposite color
    pub fn opposite(&self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

/// Board coordinate representing an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// X coordinate (column)
    pub x: u8,
    /// Y coordinate (row)
    pub y: u8,
}

impl Coord {
    /// Create a new coordinate
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Check if coordinate lies on a board of the given dimensions
    pub fn is_valid(&self, width: u8, height: u8) -> bool {
        self.x < width && self.y < height
    }
}

/// Reasons a move is refused by the rules engine.
///
/// These are expected outcomes, returned to the caller so it can explain the
/// refusal. No state is changed when one of these is produced.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IllegalMove {
    /// The coordinate is outside the board
    #[error("coordinate ({x}, {y}) is outside the board")]
    OutOfBounds { x: u8, y: u8 },

    /// The intersection already holds a stone
    #[error("intersection is already occupied")]
    NonEmptyIntersection,

    /// Strict turn order is enforced and it is the other side's move
    #[error("it is {expected:?}'s turn")]
    WrongColorForTurn { expected: Color },

    /// The move would leave its own group without liberties
    #[error("move would be suicide")]
    MoveSuicidal,

    /// The move immediately retakes a ko
    #[error("move retakes the ko")]
    KoRecapture,

    /// The move recreates an earlier whole-board position
    #[error("move repeats an earlier position")]
    PositionRepeat,
}

/// Misuse of move tree operations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The node is not part of this tree (or its id is stale)
    #[error("node is not part of the tree")]
    NotInTree,

    /// The child already has a parent
    #[error("node is already attached to a parent")]
    AlreadyAttached,

    /// The root cannot become somebody's child
    #[error("the root node cannot be attached as a child")]
    RootReuse,

    /// A node cannot be its own parent
    #[error("a node cannot be its own parent")]
    SelfParent,

    /// The root cannot be removed from its own tree
    #[error("the root node cannot be removed")]
    RootRemoval,
}

/// Undo/redo requested with nothing to act on
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

/// Invalid construction input or a broken environment
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Board dimensions must both be positive
    #[error("invalid board dimensions {width}x{height}")]
    InvalidDimensions { width: u8, height: u8 },

    /// The random source kept producing values already in the hash table
    #[error("hash table construction gave up after {retries} colliding draws")]
    HashCollision { retries: u32 },

    /// Metadata keys must be non-empty and alphanumeric
    #[error("invalid metadata key {0:?}")]
    InvalidMetadataKey(String),

    /// The notification worker thread could not be started
    #[error("failed to start notification worker: {0}")]
    Notifier(#[from] std::io::Error),
}

/// Any error produced by the game model
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Move(#[from] IllegalMove),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A node's stored hash disagrees with a full recomputation
    #[error("stored hash {stored:#018x} does not match computed hash {computed:#018x}")]
    HashMismatch { stored: u64, computed: u64 },
}

pub use board::Board;
pub use config::ModelConfig;
pub use delta::{Annotation, NodeData, StateDelta, StoneChange};
pub use hash::StateHasher;
pub use model::GameModel;
pub use notify::{Hook, ModelEvent};
pub use resolver::{Prisoners, Snapshot};
pub use ruleset::RulesPolicy;
pub use tree::{MoveTree, NodeId};
