// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reversible edits recorded in a game's undo history

use crate::{
    delta::Annotation, history::Mergeable, model::GameModel, tree::NodeId, GameError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Groups consecutive edits made as one user action, such as dragging over
/// several points with a marker tool. Edits sharing a session collapse into
/// a single undo step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// One undoable change to a game model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// A node (with its subtree) was put under `parent` at `index`
    Attach {
        parent: NodeId,
        node: NodeId,
        index: usize,
        /// Whether the cursor moved onto the node
        select: bool,
    },
    /// A node (with its subtree) was taken out from under `parent`
    Detach {
        parent: NodeId,
        node: NodeId,
        index: usize,
    },
    Annotations {
        node: NodeId,
        before: Vec<Annotation>,
        after: Vec<Annotation>,
        session: Option<SessionId>,
    },
    Metadata {
        node: NodeId,
        key: String,
        before: Option<String>,
        after: Option<String>,
        session: Option<SessionId>,
    },
}

impl Edit {
    /// Apply the edit (again) to the model
    pub fn perform(&self, model: &mut GameModel) -> Result<(), GameError> {
        match self {
            Edit::Attach {
                parent,
                node,
                index,
                select,
            } => {
                model.attach_node(*parent, *node, *index)?;
                if *select {
                    model.set_current(*node)?;
                }
                Ok(())
            }
            Edit::Detach { node, .. } => model.detach_node(*node).map(|_| ()),
            Edit::Annotations { node, after, .. } => {
                model.write_annotations(*node, after.clone())
            }
            Edit::Metadata {
                node, key, after, ..
            } => model.write_metadata(*node, key, after.clone()),
        }
    }

    /// Undo the edit's effect on the model
    pub fn rollback(&self, model: &mut GameModel) -> Result<(), GameError> {
        match self {
            Edit::Attach { node, .. } => model.detach_node(*node).map(|_| ()),
            Edit::Detach {
                parent,
                node,
                index,
            } => model.attach_node(*parent, *node, *index),
            Edit::Annotations { node, before, .. } => {
                model.write_annotations(*node, before.clone())
            }
            Edit::Metadata {
                node, key, before, ..
            } => model.write_metadata(*node, key, before.clone()),
        }
    }

    /// The node this edit leaves outside the tree, given whether the edit is
    /// currently applied
    pub fn stranded_node(&self, applied: bool) -> Option<NodeId> {
        match self {
            Edit::Attach { node, .. } if !applied => Some(*node),
            Edit::Detach { node, .. } if applied => Some(*node),
            _ => None,
        }
    }
}

impl Mergeable for Edit {
    fn merge(&mut self, next: &Self) -> bool {
        match (self, next) {
            (
                Edit::Annotations {
                    node,
                    after,
                    session: Some(session),
                    ..
                },
                Edit::Annotations {
                    node: next_node,
                    after: next_after,
                    session: Some(next_session),
                    ..
                },
            ) if node == next_node && session == next_session => {
                *after = next_after.clone();
                true
            }
            (
                Edit::Metadata {
                    node,
                    key,
                    after,
                    session: Some(session),
                    ..
                },
                Edit::Metadata {
                    node: next_node,
                    key: next_key,
                    after: next_after,
                    session: Some(next_session),
                    ..
                },
            ) if node == next_node && key == next_key && session == next_session => {
                *after = next_after.clone();
                true
            }
            _ => false,
        }
    }
}
