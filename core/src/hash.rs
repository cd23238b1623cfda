// SPDX-License-Identifier: MIT OR Apache-2.0

//! Zobrist hashing of board positions
//!
//! Every (intersection, color) pair gets an independent random 64-bit key.
//! Empty intersections contribute nothing, so adding or removing a stone is a
//! single XOR and a node's hash follows from its parent's hash and its delta.

use crate::{board::Board, delta::StoneChange, Color, ConfigError};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::collections::HashSet;

/// Consecutive colliding draws tolerated for one table slot
const MAX_REDRAWS: u32 = 10;

/// Keeps hashes of different board sizes apart
const IDENTITY_SALT: u64 = 0x6b69_6675_7a6f_6272;

/// Precomputed hash keys for one board size
#[derive(Debug, Clone)]
pub struct StateHasher {
    width: u8,
    height: u8,
    /// `[black, white]` keys per intersection index
    keys: Vec<[u64; 2]>,
    /// Hash of the empty board
    identity: u64,
}

impl StateHasher {
    /// Build the table from a seed derived from the board dimensions, so every
    /// hasher for the same size agrees.
    pub fn new(width: u8, height: u8) -> Result<Self, ConfigError> {
        let mut rng = StdRng::seed_from_u64(splitmix64(dimension_key(width, height)));
        Self::with_rng(width, height, &mut rng)
    }

    /// Build the table from an arbitrary random source.
    pub fn with_rng<R: RngCore>(width: u8, height: u8, rng: &mut R) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }

        let cells = (width as usize) * (height as usize);
        let mut seen = HashSet::with_capacity(cells * 2);
        let mut keys = Vec::with_capacity(cells);

        for _ in 0..cells {
            let black = draw_unique(rng, &mut seen)?;
            let white = draw_unique(rng, &mut seen)?;
            keys.push([black, white]);
        }

        Ok(Self {
            width,
            height,
            keys,
            identity: splitmix64(dimension_key(width, height) ^ IDENTITY_SALT),
        })
    }

    /// Hash of the empty board of this size
    pub fn empty_hash(&self) -> u64 {
        self.identity
    }

    /// Hash of a whole position by scanning every intersection
    pub fn full_hash(&self, board: &Board) -> u64 {
        debug_assert_eq!((board.width(), board.height()), (self.width, self.height));

        board
            .stones()
            .fold(self.identity, |hash, (coord, color)| {
                hash ^ self.key(board.index_of(coord), color)
            })
    }

    /// Update a hash with stone changes. Each change flips one colored stone
    /// on or off the board.
    pub fn incremental_hash(&self, previous: u64, changes: &[StoneChange]) -> u64 {
        changes.iter().fold(previous, |hash, change| {
            let idx = (change.coord.y as usize) * (self.width as usize) + (change.coord.x as usize);
            hash ^ self.key(idx, change.color)
        })
    }

    fn key(&self, idx: usize, color: Color) -> u64 {
        match color {
            Color::Black => self.keys[idx][0],
            Color::White => self.keys[idx][1],
        }
    }
}

fn draw_unique<R: RngCore>(rng: &mut R, seen: &mut HashSet<u64>) -> Result<u64, ConfigError> {
    let mut redraws = 0;
    loop {
        let value = rng.next_u64();
        // Zero would make a stone indistinguishable from an empty point
        if value != 0 && seen.insert(value) {
            return Ok(value);
        }

        redraws += 1;
        if redraws > MAX_REDRAWS {
            tracing::error!(redraws, "random source keeps colliding while building hash table");
            return Err(ConfigError::HashCollision {
                retries: MAX_REDRAWS,
            });
        }
        tracing::trace!(redraws, "hash key collision, redrawing");
    }
}

fn dimension_key(width: u8, height: u8) -> u64 {
    ((width as u64) << 8) | height as u64
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}
