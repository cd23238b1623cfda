// SPDX-License-Identifier: MIT OR Apache-2.0

//! Move tree with arena-allocated nodes.
//!
//! Nodes live in a flat arena and refer to each other by `NodeId`. An id
//! carries a generation, so once a node is freed every old id for that slot
//! stops resolving instead of silently pointing at a newer node.
//!
//! A node can be allocated but detached: it then has no membership in the
//! tree until it is appended somewhere. Undo keeps removed subtrees in that
//! state so they can be put back unchanged.

use crate::{delta::NodeData, TreeError};
use serde::{Deserialize, Serialize};

/// Stable handle to a node in a `MoveTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// A node in the move tree
#[derive(Debug, Clone)]
pub struct Node {
    data: NodeData,
    /// Distance to the root; the root is 0
    depth: u32,
    parent: Option<NodeId>,
    /// Variations in insertion order; index 0 is the main line
    children: Vec<NodeId>,
    is_root: bool,
    /// Root of the tree this node belongs to, `None` while detached
    tree_root: Option<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            depth: 0,
            parent: None,
            children: Vec::new(),
            is_root: false,
            tree_root: None,
        }
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Rooted tree of game nodes
#[derive(Debug, Clone)]
pub struct MoveTree {
    slots: Vec<Slot>,
    /// Freed slot indices ready for reuse
    free: Vec<u32>,
    root: NodeId,
}

impl MoveTree {
    /// Create a tree holding only a root node
    pub fn new(root_data: NodeData) -> Self {
        let root = NodeId {
            index: 0,
            generation: 0,
        };
        let mut node = Node::new(root_data);
        node.is_root = true;
        node.tree_root = Some(root);

        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(node),
            }],
            free: Vec::new(),
            root,
        }
    }

    /// The root node ID
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a live node, attached or not
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Mutable access to a node's payload
    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.get_mut(id).map(|node| &mut node.data)
    }

    /// Allocate a detached node
    pub fn create_node(&mut self, data: NodeData) -> NodeId {
        let node = Some(Node::new(data));
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = node;
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node,
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Whether the node is currently part of this tree
    pub fn is_descendant(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|node| node.tree_root == Some(self.root))
    }

    /// Whether `node` is `ancestor` or lies below it, following parent links.
    /// Works for detached subtrees as well.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Attach `child` as the last variation of `parent`
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.insert(parent, child, usize::MAX)
    }

    /// Attach `child` under `parent` at the given variation index (clamped)
    pub fn insert(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<(), TreeError> {
        if parent == child {
            return Err(TreeError::SelfParent);
        }
        if !self.is_descendant(parent) {
            return Err(TreeError::NotInTree);
        }

        let node = self.get(child).ok_or(TreeError::NotInTree)?;
        if node.parent == Some(parent) {
            return Ok(());
        }
        if node.parent.is_some() {
            return Err(TreeError::AlreadyAttached);
        }
        if node.is_root {
            return Err(TreeError::RootReuse);
        }

        let parent_node = self.get_mut(parent).ok_or(TreeError::NotInTree)?;
        let depth = parent_node.depth + 1;
        let at = index.min(parent_node.children.len());
        parent_node.children.insert(at, child);

        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        self.adopt(child, depth);
        Ok(())
    }

    /// Detach `node` with its whole subtree, keeping it allocated.
    ///
    /// Returns the former parent and the variation index the node held.
    pub fn detach(&mut self, id: NodeId) -> Result<(NodeId, usize), TreeError> {
        if !self.is_descendant(id) {
            return Err(TreeError::NotInTree);
        }
        if id == self.root {
            return Err(TreeError::RootRemoval);
        }

        let parent = self.parent(id).ok_or(TreeError::NotInTree)?;
        let parent_node = self.get_mut(parent).ok_or(TreeError::NotInTree)?;
        let index = parent_node
            .children
            .iter()
            .position(|c| *c == id)
            .ok_or(TreeError::NotInTree)?;
        parent_node.children.remove(index);

        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
        self.disown(id);
        Ok((parent, index))
    }

    /// Remove a single node. Its children are orphaned: they keep their own
    /// subtrees but lose their parent and their membership.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.detach(id)?;

        let children = self
            .get_mut(id)
            .map(|node| std::mem::take(&mut node.children))
            .unwrap_or_default();
        for child in children {
            if let Some(node) = self.get_mut(child) {
                node.parent = None;
            }
        }
        Ok(())
    }

    /// Remove a node and every descendant, invalidating all their ids
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<usize, TreeError> {
        self.detach(id)?;
        Ok(self.free_subtree(id))
    }

    /// Free a detached subtree whose top node has no parent
    pub fn discard(&mut self, id: NodeId) -> Result<usize, TreeError> {
        let node = self.get(id).ok_or(TreeError::NotInTree)?;
        if node.tree_root.is_some() || node.parent.is_some() {
            return Err(TreeError::AlreadyAttached);
        }
        Ok(self.free_subtree(id))
    }

    /// Free every allocated node that is not part of the tree
    pub fn purge_detached(&mut self) -> usize {
        let root = self.root;
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let detached = slot
                .node
                .as_ref()
                .is_some_and(|node| node.tree_root != Some(root));
            if detached {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }
        if freed > 0 {
            tracing::debug!(freed, "purged detached nodes");
        }
        freed
    }

    /// Nodes from the root down to `id`, inclusive
    pub fn path_from_root(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        if !self.is_descendant(id) {
            return Err(TreeError::NotInTree);
        }

        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            path.push(current);
            cursor = self.parent(current);
        }
        path.reverse();
        Ok(path)
    }

    /// Number of nodes currently in the tree
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| slot.node.as_ref())
            .filter(|node| node.tree_root == Some(self.root))
            .count()
    }

    /// A tree always holds at least its root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Set depth and membership for a subtree that just got a parent
    fn adopt(&mut self, id: NodeId, depth: u32) {
        let root = self.root;
        let mut stack = vec![(id, depth)];
        while let Some((current, depth)) = stack.pop() {
            if let Some(node) = self.get_mut(current) {
                node.depth = depth;
                node.tree_root = Some(root);
                stack.extend(node.children.iter().map(|c| (*c, depth + 1)));
            }
        }
    }

    /// Clear membership for a subtree that just lost its parent
    fn disown(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.get_mut(current) {
                node.tree_root = None;
                stack.extend(node.children.iter().copied());
            }
        }
    }

    fn free_subtree(&mut self, id: NodeId) -> usize {
        let mut stack = vec![id];
        let mut freed = 0;
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                stack.extend(node.children);
                freed += 1;
            }
        }
        freed
    }
}
