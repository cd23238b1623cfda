// SPDX-License-Identifier: MIT OR Apache-2.0

//! Materializes full game state at a tree node by replaying deltas

use crate::{
    board::Board,
    delta::{Annotation, StateDelta},
    tree::{MoveTree, NodeId},
    Color, TreeError,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Stones captured by each side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prisoners {
    /// Stones Black has captured
    pub black: u32,
    /// Stones White has captured
    pub white: u32,
}

impl Prisoners {
    /// Credit one captured stone of `captured` color to its opponent
    fn credit(&mut self, captured: Color) {
        match captured {
            Color::Black => self.white += 1,
            Color::White => self.black += 1,
        }
    }
}

/// Game state at one node
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub board: Board,
    pub prisoners: Prisoners,
    /// Hash stored on the node when it was appended
    pub hash: u64,
    /// Moves, passes and resignations from the root to this node
    pub move_number: u32,
    /// Markup attached to this node
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Default)]
struct Cache {
    entries: HashMap<NodeId, Arc<Snapshot>>,
    /// Insertion order, oldest first
    order: VecDeque<NodeId>,
}

/// Replays deltas with a small cache of already resolved nodes
#[derive(Debug)]
pub struct Resolver {
    empty: Board,
    capacity: usize,
    cache: Mutex<Cache>,
}

impl Resolver {
    pub fn new(empty: Board, capacity: usize) -> Self {
        Self {
            empty,
            capacity,
            cache: Mutex::new(Cache::default()),
        }
    }

    /// Resolve the state at `node`.
    ///
    /// Walks up to the nearest cached ancestor (or the root), then applies the
    /// collected deltas in root-to-node order.
    pub fn resolve(&self, tree: &MoveTree, node: NodeId) -> Result<Snapshot, TreeError> {
        if !tree.is_descendant(node) {
            return Err(TreeError::NotInTree);
        }

        let mut pending = Vec::new();
        let mut base = None;
        {
            let cache = self.cache.lock();
            let mut cursor = Some(node);
            while let Some(id) = cursor {
                if let Some(hit) = cache.entries.get(&id) {
                    base = Some(Arc::clone(hit));
                    break;
                }
                pending.push(id);
                cursor = tree.parent(id);
            }
        }

        let (mut board, mut prisoners, mut move_number) = match &base {
            Some(snapshot) => (
                snapshot.board.clone(),
                snapshot.prisoners,
                snapshot.move_number,
            ),
            None => (self.empty.clone(), Prisoners::default(), 0),
        };
        tracing::trace!(
            replayed = pending.len(),
            cached = base.is_some(),
            "resolving node"
        );

        let mut hash = base.as_ref().map_or(0, |snapshot| snapshot.hash);
        for id in pending.iter().rev() {
            let data = tree.get(*id).ok_or(TreeError::NotInTree)?.data();
            data.delta.apply(&mut board);
            if let StateDelta::MovePlayed { captured, .. } = &data.delta {
                for stone in captured {
                    prisoners.credit(stone.color);
                }
            }
            if data.delta.is_move() {
                move_number += 1;
            }
            hash = data.hash;
        }

        let target = tree.get(node).ok_or(TreeError::NotInTree)?;
        let snapshot = Snapshot {
            board,
            prisoners,
            hash,
            move_number,
            annotations: Vec::new(),
        };

        if !pending.is_empty() {
            self.remember(node, snapshot.clone());
        }

        Ok(Snapshot {
            annotations: target.data().annotations.clone(),
            ..snapshot
        })
    }

    /// Drop every cached state
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock();
        cache.entries.clear();
        cache.order.clear();
    }

    fn remember(&self, node: NodeId, snapshot: Snapshot) {
        if self.capacity == 0 {
            return;
        }

        let mut cache = self.cache.lock();
        if cache.entries.insert(node, Arc::new(snapshot)).is_none() {
            cache.order.push_back(node);
        }
        while cache.order.len() > self.capacity {
            if let Some(oldest) = cache.order.pop_front() {
                cache.entries.remove(&oldest);
            }
        }
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.cache.lock().entries.len()
    }
}
