// SPDX-License-Identifier: MIT OR Apache-2.0

//! The game model façade
//!
//! `GameModel` owns a move tree, a rule-set, a cursor and an undo history.
//! All changes go through its methods, which keep the tree, the cursor and
//! the history consistent and queue change notifications once committed.
//!
//! Mutation is single-writer: callers must serialize `&mut self` calls.
//! `&self` methods (resolving, legality checks) may run concurrently.

use crate::{
    board::Board,
    config::ModelConfig,
    delta::{validate_metadata_key, Annotation, NodeData, StateDelta, StoneChange},
    edit::{Edit, SessionId},
    hash::StateHasher,
    history::EditLog,
    notify::{Hook, ListenerId, ModelEvent, Notifier},
    resolver::{Resolver, Snapshot},
    rules::{MoveContext, MoveDecision, RuleValidator},
    ruleset::RulesPolicy,
    tree::{MoveTree, Node, NodeId},
    Color, ConfigError, Coord, GameError, IllegalMove, TreeError,
};
use std::collections::HashSet;
use std::sync::Arc;

pub struct GameModel {
    width: u8,
    height: u8,
    rules: Arc<dyn RulesPolicy>,
    config: ModelConfig,
    hasher: StateHasher,
    tree: MoveTree,
    current: NodeId,
    history: EditLog<Edit>,
    resolver: Resolver,
    notifier: Notifier,
}

impl GameModel {
    /// Create a game with default configuration
    pub fn new(width: u8, height: u8, rules: Arc<dyn RulesPolicy>) -> Result<Self, GameError> {
        Self::with_config(width, height, rules, ModelConfig::default())
    }

    pub fn with_config(
        width: u8,
        height: u8,
        rules: Arc<dyn RulesPolicy>,
        config: ModelConfig,
    ) -> Result<Self, GameError> {
        let empty = Board::new(width, height)?;
        let hasher = StateHasher::new(width, height)?;
        let tree = MoveTree::new(NodeData::new(StateDelta::Root, hasher.empty_hash()));
        let notifier = Notifier::new().map_err(ConfigError::from)?;

        tracing::debug!(
            width,
            height,
            rules = rules.identifier(),
            "created game model"
        );

        Ok(Self {
            width,
            height,
            current: tree.root(),
            history: EditLog::new(config.max_history),
            resolver: Resolver::new(empty, config.resolve_cache),
            rules,
            config,
            hasher,
            tree,
            notifier,
        })
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn rules(&self) -> &dyn RulesPolicy {
        self.rules.as_ref()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn hasher(&self) -> &StateHasher {
        &self.hasher
    }

    pub fn tree(&self) -> &MoveTree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    /// A node that is part of this game's tree
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.tree.get(id).filter(|_| self.tree.is_descendant(id))
    }

    /// Compensation for White under the rule-set and configured handicap
    pub fn compensation(&self) -> f32 {
        self.rules.default_compensation(self.config.handicap)
    }

    // Navigation

    /// Move the cursor to any node of the tree
    pub fn set_current(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.tree.is_descendant(id) {
            return Err(TreeError::NotInTree);
        }
        if id != self.current {
            let previous = std::mem::replace(&mut self.current, id);
            self.notifier.emit(ModelEvent::CurrentNodeChanged {
                previous,
                current: id,
            });
        }
        Ok(())
    }

    /// Move the cursor to its parent; false at the root
    pub fn step_back(&mut self) -> bool {
        match self.tree.parent(self.current) {
            Some(parent) => self.set_current(parent).is_ok(),
            None => false,
        }
    }

    /// Move the cursor into a variation of the current node; false if absent
    pub fn step_forward(&mut self, variation: usize) -> bool {
        match self.tree.children(self.current).get(variation).copied() {
            Some(child) => self.set_current(child).is_ok(),
            None => false,
        }
    }

    // State

    /// Full game state at a node
    pub fn resolve(&self, id: NodeId) -> Result<Snapshot, GameError> {
        Ok(self.resolver.resolve(&self.tree, id)?)
    }

    pub fn resolve_current(&self) -> Result<Snapshot, GameError> {
        self.resolve(self.current)
    }

    /// Recompute a node's hash from scratch and compare it to the stored one
    pub fn validate(&self, id: NodeId) -> Result<(), GameError> {
        let snapshot = self.resolve(id)?;
        let computed = self.hasher.full_hash(&snapshot.board);
        if computed != snapshot.hash {
            tracing::error!(?id, "stored hash disagrees with position");
            return Err(GameError::HashMismatch {
                stored: snapshot.hash,
                computed,
            });
        }
        Ok(())
    }

    /// Side to move after the given node
    pub fn to_play_at(&self, id: NodeId) -> Result<Color, GameError> {
        let snapshot = self.resolve(id)?;
        Ok(self
            .rules
            .color_to_play(snapshot.move_number, self.config.handicap > 0))
    }

    pub fn to_play(&self) -> Result<Color, GameError> {
        self.to_play_at(self.current)
    }

    // Moves at the cursor

    /// Check whether a stone could be played at the cursor, without playing it
    pub fn check_move(&self, color: Color, coord: Coord) -> Result<(), GameError> {
        self.decide(self.current, color, coord).map(|_| ())
    }

    /// Play a stone at the cursor and move onto the resulting node
    pub fn play(&mut self, color: Color, coord: Coord) -> Result<NodeId, GameError> {
        let decision = self.decide(self.current, color, coord)?;
        self.add_child(
            self.current,
            NodeData::new(decision.delta, decision.hash),
            true,
        )
    }

    pub fn pass(&mut self, color: Color) -> Result<NodeId, GameError> {
        let data = self.carry_forward(self.current, StateDelta::Pass(color))?;
        self.add_child(self.current, data, true)
    }

    pub fn resign(&mut self, color: Color) -> Result<NodeId, GameError> {
        let data = self.carry_forward(self.current, StateDelta::Resign(color))?;
        self.add_child(self.current, data, true)
    }

    /// Add and remove stones at the cursor outside normal play
    pub fn edit_stones(
        &mut self,
        added: &[StoneChange],
        removed: &[Coord],
    ) -> Result<NodeId, GameError> {
        let data = self.stone_edit(self.current, added, removed)?;
        self.add_child(self.current, data, true)
    }

    // Building the tree anywhere (used by record importers)

    /// Append a played stone under `parent`, leaving the cursor alone
    pub fn append_move(
        &mut self,
        parent: NodeId,
        color: Color,
        coord: Coord,
    ) -> Result<NodeId, GameError> {
        let decision = self.decide(parent, color, coord)?;
        self.add_child(parent, NodeData::new(decision.delta, decision.hash), false)
    }

    pub fn append_pass(&mut self, parent: NodeId, color: Color) -> Result<NodeId, GameError> {
        let data = self.carry_forward(parent, StateDelta::Pass(color))?;
        self.add_child(parent, data, false)
    }

    pub fn append_resign(&mut self, parent: NodeId, color: Color) -> Result<NodeId, GameError> {
        let data = self.carry_forward(parent, StateDelta::Resign(color))?;
        self.add_child(parent, data, false)
    }

    pub fn append_stone_edit(
        &mut self,
        parent: NodeId,
        added: &[StoneChange],
        removed: &[Coord],
    ) -> Result<NodeId, GameError> {
        let data = self.stone_edit(parent, added, removed)?;
        self.add_child(parent, data, false)
    }

    /// Take a node and its subtree out of the tree (undoable)
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GameError> {
        let (parent, index) = self.detach_node(id)?;
        self.record_edit(Edit::Detach {
            parent,
            node: id,
            index,
        });
        Ok(())
    }

    // Node data

    pub fn annotations(&self, id: NodeId) -> Option<&[Annotation]> {
        self.node(id).map(|node| node.data().annotations.as_slice())
    }

    /// Add a marker to a node; false if it was already there
    pub fn add_annotation(
        &mut self,
        id: NodeId,
        annotation: Annotation,
        session: Option<SessionId>,
    ) -> Result<bool, GameError> {
        let before = self.annotations(id).ok_or(TreeError::NotInTree)?.to_vec();
        if before.contains(&annotation) {
            return Ok(false);
        }
        let mut after = before.clone();
        after.push(annotation);
        self.change_annotations(id, before, after, session)?;
        Ok(true)
    }

    /// Remove a marker from a node; false if it was not there
    pub fn remove_annotation(
        &mut self,
        id: NodeId,
        annotation: &Annotation,
        session: Option<SessionId>,
    ) -> Result<bool, GameError> {
        let before = self.annotations(id).ok_or(TreeError::NotInTree)?.to_vec();
        if !before.contains(annotation) {
            return Ok(false);
        }
        let after = before.iter().filter(|a| *a != annotation).cloned().collect();
        self.change_annotations(id, before, after, session)?;
        Ok(true)
    }

    /// Look up a metadata value; the key must be well formed
    pub fn metadata(&self, id: NodeId, key: &str) -> Result<Option<&str>, GameError> {
        validate_metadata_key(key)?;
        let node = self.node(id).ok_or(TreeError::NotInTree)?;
        Ok(node.data().metadata.get(key).map(String::as_str))
    }

    pub fn set_metadata(
        &mut self,
        id: NodeId,
        key: &str,
        value: &str,
        session: Option<SessionId>,
    ) -> Result<(), GameError> {
        self.change_metadata(id, key, Some(value.to_string()), session)
    }

    pub fn remove_metadata(
        &mut self,
        id: NodeId,
        key: &str,
        session: Option<SessionId>,
    ) -> Result<(), GameError> {
        self.change_metadata(id, key, None, session)
    }

    // History

    pub fn undo(&mut self) -> Result<(), GameError> {
        let edit = self.history.undo()?.clone();
        tracing::debug!(?edit, "undo");
        edit.rollback(self)
    }

    pub fn redo(&mut self) -> Result<(), GameError> {
        let edit = self.history.redo()?.clone();
        tracing::debug!(?edit, "redo");
        edit.perform(self)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &EditLog<Edit> {
        &self.history
    }

    /// Change the undo bound; this drops all history
    pub fn set_max_history(&mut self, max: usize) {
        self.history.set_max_size(max);
        self.config.max_history = max;
        // Only history entries could still refer to detached nodes
        self.tree.purge_detached();
    }

    // Notifications

    pub fn subscribe<F>(&self, hook: Hook, listener: F) -> ListenerId
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(hook, listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Wait until every queued notification has been delivered
    pub fn flush_notifications(&self) {
        self.notifier.flush()
    }

    // Primitives shared with `Edit`; these never touch the history

    pub(crate) fn attach_node(
        &mut self,
        parent: NodeId,
        node: NodeId,
        index: usize,
    ) -> Result<(), GameError> {
        self.tree.insert(parent, node, index)?;
        self.notifier.emit(ModelEvent::NodeAdded { node, parent });
        Ok(())
    }

    pub(crate) fn detach_node(&mut self, node: NodeId) -> Result<(NodeId, usize), GameError> {
        let cursor_inside = self.tree.is_ancestor_of(node, self.current);
        let (parent, index) = self.tree.detach(node)?;
        self.resolver.invalidate();
        self.notifier.emit(ModelEvent::NodeRemoved { node, parent });

        if cursor_inside {
            self.set_current(parent)?;
        }
        Ok((parent, index))
    }

    pub(crate) fn write_annotations(
        &mut self,
        node: NodeId,
        annotations: Vec<Annotation>,
    ) -> Result<(), GameError> {
        let data = self.tree.data_mut(node).ok_or(TreeError::NotInTree)?;
        data.annotations = annotations;
        self.data_updated(node);
        Ok(())
    }

    pub(crate) fn write_metadata(
        &mut self,
        node: NodeId,
        key: &str,
        value: Option<String>,
    ) -> Result<(), GameError> {
        let data = self.tree.data_mut(node).ok_or(TreeError::NotInTree)?;
        match value {
            Some(value) => data.metadata.insert(key.to_string(), value),
            None => data.metadata.remove(key),
        };
        self.data_updated(node);
        Ok(())
    }

    // Internals

    /// Run the rules engine for a stone played under `parent`
    fn decide(&self, parent: NodeId, color: Color, coord: Coord) -> Result<MoveDecision, GameError> {
        let position = self.resolve(parent)?;

        let to_play = self.config.strict_turns.then(|| {
            self.rules
                .color_to_play(position.move_number, self.config.handicap > 0)
        });
        let ko_hash = self
            .tree
            .parent(parent)
            .and_then(|grandparent| self.tree.get(grandparent))
            .map(|node| node.data().hash);
        let history = if self.rules.forbids_position_repeat() {
            Some(self.position_history(parent)?)
        } else {
            None
        };

        let ctx = MoveContext {
            position: &position,
            to_play,
            ko_hash,
            history: history.as_ref(),
        };
        let validator = RuleValidator::new(&self.hasher, self.rules.as_ref());
        validator.check_move(&ctx, coord, color).map_err(|reason| {
            tracing::debug!(?color, ?coord, %reason, "move rejected");
            GameError::from(reason)
        })
    }

    /// Hashes of every position from the root to `id`, passes excluded
    fn position_history(&self, id: NodeId) -> Result<HashSet<u64>, TreeError> {
        let path = self.tree.path_from_root(id)?;
        Ok(path
            .into_iter()
            .filter_map(|node| self.tree.get(node))
            .map(Node::data)
            .filter(|data| data.delta.counts_for_repetition())
            .map(|data| data.hash)
            .collect())
    }

    /// Node data for a delta that leaves the position unchanged
    fn carry_forward(&self, parent: NodeId, delta: StateDelta) -> Result<NodeData, GameError> {
        let node = self.node(parent).ok_or(TreeError::NotInTree)?;
        Ok(NodeData::new(delta, node.data().hash))
    }

    /// Work out the toggles of a manual edit against the position at `parent`
    fn stone_edit(
        &self,
        parent: NodeId,
        added: &[StoneChange],
        removed: &[Coord],
    ) -> Result<NodeData, GameError> {
        let position = self.resolve(parent)?;
        let mut board = position.board;
        let mut taken = Vec::new();
        let mut put = Vec::new();

        for &coord in removed {
            if !board.contains(coord) {
                return Err(IllegalMove::OutOfBounds {
                    x: coord.x,
                    y: coord.y,
                }
                .into());
            }
            if let Some(color) = board.get(coord) {
                taken.push(StoneChange { coord, color });
                board.set(coord, None)?;
            }
        }

        for change in added {
            if !board.contains(change.coord) {
                return Err(IllegalMove::OutOfBounds {
                    x: change.coord.x,
                    y: change.coord.y,
                }
                .into());
            }
            match board.get(change.coord) {
                Some(color) if color == change.color => continue,
                Some(color) => taken.push(StoneChange {
                    coord: change.coord,
                    color,
                }),
                None => {}
            }
            put.push(*change);
            board.set(change.coord, Some(change.color))?;
        }

        let changes: Vec<StoneChange> = taken.iter().chain(put.iter()).copied().collect();
        let hash = self.hasher.incremental_hash(position.hash, &changes);
        Ok(NodeData::new(
            StateDelta::StoneEdit {
                added: put,
                removed: taken,
            },
            hash,
        ))
    }

    /// Attach new node data under `parent`, reusing an identical variation
    fn add_child(
        &mut self,
        parent: NodeId,
        data: NodeData,
        select: bool,
    ) -> Result<NodeId, GameError> {
        let existing = self
            .tree
            .children(parent)
            .iter()
            .copied()
            .find(|child| {
                self.tree
                    .get(*child)
                    .is_some_and(|node| node.data().delta == data.delta)
            });

        if let Some(child) = existing {
            tracing::trace!(?child, "following existing variation");
            if select {
                self.set_current(child)?;
            }
            return Ok(child);
        }

        let node = self.tree.create_node(data);
        self.attach_node(parent, node, usize::MAX)?;
        let index = self.tree.children(parent).len() - 1;
        if select {
            self.set_current(node)?;
        }
        self.record_edit(Edit::Attach {
            parent,
            node,
            index,
            select,
        });
        Ok(node)
    }

    /// Record an edit, freeing nodes that only the dropped entries could
    /// have brought back into the tree
    fn record_edit(&mut self, edit: Edit) {
        let discarded = self.history.record(edit);
        if discarded.is_empty() {
            return;
        }

        let stranded = discarded
            .undone
            .iter()
            .filter_map(|edit| edit.stranded_node(false))
            .chain(
                discarded
                    .evicted
                    .iter()
                    .filter_map(|edit| edit.stranded_node(true)),
            );
        let mut freed = 0;
        for node in stranded {
            if let Ok(count) = self.tree.discard(node) {
                freed += count;
            }
        }
        if freed > 0 {
            tracing::debug!(freed, "released nodes dropped from history");
        }
    }

    fn change_annotations(
        &mut self,
        node: NodeId,
        before: Vec<Annotation>,
        after: Vec<Annotation>,
        session: Option<SessionId>,
    ) -> Result<(), GameError> {
        self.write_annotations(node, after.clone())?;
        self.record_edit(Edit::Annotations {
            node,
            before,
            after,
            session,
        });
        Ok(())
    }

    fn change_metadata(
        &mut self,
        node: NodeId,
        key: &str,
        value: Option<String>,
        session: Option<SessionId>,
    ) -> Result<(), GameError> {
        let before = self.metadata(node, key)?.map(str::to_string);
        if before == value {
            return Ok(());
        }
        self.write_metadata(node, key, value.clone())?;
        self.record_edit(Edit::Metadata {
            node,
            key: key.to_string(),
            before,
            after: value,
            session,
        });
        Ok(())
    }

    fn data_updated(&self, node: NodeId) {
        self.notifier.emit(ModelEvent::NodeDataUpdated { node });
        if node == self.current {
            self.notifier
                .emit(ModelEvent::CurrentNodeDataUpdated { node });
        }
    }
}

impl std::fmt::Debug for GameModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameModel")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rules", &self.rules.identifier())
            .field("nodes", &self.tree.len())
            .field("current", &self.current)
            .finish()
    }
}
