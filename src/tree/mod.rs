//! The editable feature tree.
//!
//! Children are held behind `Arc`, and every mutation goes through
//! [`Arc::make_mut`] along the root-to-node path. Cloning a tree is therefore
//! cheap, and a clone never observes later edits: only the nodes on the edited
//! path are copied, every other subtree stays shared. [`HistoryManager`] relies
//! on this to keep many versions without deep copies.

mod history;

pub use history::*;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{button_rank, ButtonOperation, ButtonTemplate, FeatureNode, NodeField, NodeKind};

/// Errors from tree mutations. A failed mutation leaves the tree unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),
    #[error("Button not found: {0}")]
    ButtonNotFound(Uuid),
    #[error("Cannot move node {node} under {target}: target is the node or one of its descendants")]
    Cycle { node: Uuid, target: Uuid },
    #[error("Node {0} has children; buttons belong on menus only")]
    NotAMenu(Uuid),
    #[error("Node {0} has buttons; remove them before nesting nodes under it")]
    HasButtons(Uuid),
    #[error("Id {0} is already used in the tree")]
    DuplicateId(Uuid),
    #[error("Node {node} already has a button named {name:?}")]
    DuplicateButtonName { node: Uuid, name: String },
}

/// A node visited by [`FeatureTree::walk`].
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub node: &'a FeatureNode,
    pub depth: usize,
}

impl Visit<'_> {
    pub fn kind(&self) -> NodeKind {
        NodeKind::classify(self.depth, self.node)
    }
}

/// Node and button counts by derived kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub modules: usize,
    pub submodules: usize,
    pub menus: usize,
    pub buttons: usize,
}

/// Ordered forest of feature nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureTree {
    roots: Vec<Arc<FeatureNode>>,
}

impl<'de> Deserialize<'de> for FeatureTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let roots = Option::<Vec<Arc<FeatureNode>>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Self::from_roots(roots))
    }
}

impl FeatureTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from top-level nodes, rewriting every `parent_id`.
    ///
    /// Ids that repeat (nodes or buttons) are replaced with fresh ones, so
    /// every lookup addresses exactly one element.
    pub fn from_roots(roots: Vec<Arc<FeatureNode>>) -> Self {
        let mut tree = Self { roots };
        let mut seen = HashSet::new();
        for root in tree.roots.iter_mut() {
            reassign_duplicates(root, &mut seen);
            relink(root, None);
        }
        tree
    }

    pub fn roots(&self) -> &[Arc<FeatureNode>] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    // ============================================================
    // Queries
    // ============================================================

    pub fn find(&self, id: Uuid) -> Option<&FeatureNode> {
        let path = self.path_to(id)?;
        Some(self.node_at(&path))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.path_to(id).is_some()
    }

    /// Depth of a node; top-level nodes are at depth 0.
    pub fn depth_of(&self, id: Uuid) -> Option<usize> {
        self.path_to(id).map(|path| path.len() - 1)
    }

    /// Kind of a node, derived from the live tree.
    pub fn kind_of(&self, id: Uuid) -> Option<NodeKind> {
        let path = self.path_to(id)?;
        Some(NodeKind::classify(path.len() - 1, self.node_at(&path)))
    }

    /// Pre-order traversal with depth.
    pub fn walk(&self) -> Vec<Visit<'_>> {
        fn visit<'a>(nodes: &'a [Arc<FeatureNode>], depth: usize, out: &mut Vec<Visit<'a>>) {
            for node in nodes {
                out.push(Visit { node, depth });
                visit(&node.children, depth + 1, out);
            }
        }

        let mut out = Vec::new();
        visit(&self.roots, 0, &mut out);
        out
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        for visit in self.walk() {
            match visit.kind() {
                NodeKind::Module => stats.modules += 1,
                NodeKind::Submodule => stats.submodules += 1,
                NodeKind::Menu => stats.menus += 1,
            }
            stats.buttons += visit.node.buttons.len();
        }
        stats
    }

    /// Whether `candidate` is `ancestor` itself or sits anywhere beneath it.
    pub fn is_within(&self, ancestor: Uuid, candidate: Uuid) -> bool {
        fn holds(node: &FeatureNode, id: Uuid) -> bool {
            node.id == id || node.children.iter().any(|c| holds(c, id))
        }

        self.find(ancestor).is_some_and(|node| holds(node, candidate))
    }

    // ============================================================
    // Mutations
    // ============================================================

    /// Append `node` to the children of `parent_id`, or to the top level.
    ///
    /// Every id in the inserted subtree must be new to the tree, and the
    /// parent must not carry buttons.
    pub fn insert_node(&mut self, parent_id: Option<Uuid>, node: FeatureNode) -> Result<Uuid, TreeError> {
        let parent_path = self.resolve_parent(parent_id)?;
        if let Some(parent) = parent_id {
            self.ensure_accepts_children(parent)?;
        }

        let mut incoming = Vec::new();
        collect_ids(&node, &mut incoming);
        let mut taken = self.ids();
        if let Some(duplicate) = incoming.into_iter().find(|id| !taken.insert(*id)) {
            return Err(TreeError::DuplicateId(duplicate));
        }

        let id = node.id;
        let mut node = Arc::new(node);
        relink(&mut node, parent_id);
        self.children_mut(parent_path.as_deref()).push(node);
        tracing::debug!(%id, ?parent_id, "inserted node");
        Ok(id)
    }

    /// Move a node under `new_parent_id` at `new_index` (clamped to the
    /// sibling count). Rejects moves under the node itself or a descendant.
    pub fn move_node(&mut self, node_id: Uuid, new_parent_id: Option<Uuid>, new_index: usize) -> Result<(), TreeError> {
        if !self.contains(node_id) {
            return Err(TreeError::NodeNotFound(node_id));
        }
        if let Some(target) = new_parent_id {
            if !self.contains(target) {
                return Err(TreeError::NodeNotFound(target));
            }
            if self.is_within(node_id, target) {
                return Err(TreeError::Cycle { node: node_id, target });
            }
            self.ensure_accepts_children(target)?;
        }

        let mut node = self.detach(node_id)?;
        // The target cannot be inside the detached subtree, so it still resolves.
        let parent_path = self.resolve_parent(new_parent_id)?;
        relink(&mut node, new_parent_id);
        let siblings = self.children_mut(parent_path.as_deref());
        let index = new_index.min(siblings.len());
        siblings.insert(index, node);
        tracing::debug!(%node_id, ?new_parent_id, index, "moved node");
        Ok(())
    }

    /// Remove a node and its subtree. Returns every removed id, nodes and
    /// buttons alike, so callers can drop selections that pointed into it.
    pub fn delete_node(&mut self, node_id: Uuid) -> Result<Vec<Uuid>, TreeError> {
        let removed = self.detach(node_id)?;
        let mut ids = Vec::new();
        collect_ids(&removed, &mut ids);
        tracing::debug!(%node_id, removed = ids.len(), "deleted subtree");
        Ok(ids)
    }

    pub fn update_field(&mut self, node_id: Uuid, field: NodeField) -> Result<(), TreeError> {
        let path = self.path_to(node_id).ok_or(TreeError::NodeNotFound(node_id))?;
        field.apply_to_node(self.node_at_mut(&path));
        Ok(())
    }

    /// Add buttons whose names the node does not carry yet, then restore
    /// canonical order. Returns the number of buttons added.
    pub fn add_buttons(&mut self, node_id: Uuid, templates: &[ButtonTemplate]) -> Result<usize, TreeError> {
        let path = self.path_to(node_id).ok_or(TreeError::NodeNotFound(node_id))?;
        if !self.node_at(&path).is_leaf() {
            return Err(TreeError::NotAMenu(node_id));
        }

        let node = self.node_at_mut(&path);
        let mut names: HashSet<String> = node.buttons.iter().map(|b| b.name.clone()).collect();
        let mut added = 0;
        for template in templates {
            if !names.insert(template.name.clone()) {
                continue;
            }
            let mut button = ButtonOperation::new(template.name.clone());
            button.complexity = template.complexity;
            button.priority = template.priority;
            node.buttons.push(button);
            added += 1;
        }
        // Stable: custom names keep their insertion order.
        node.buttons.sort_by_key(|b| button_rank(&b.name));
        Ok(added)
    }

    pub fn update_button(&mut self, node_id: Uuid, button_id: Uuid, field: NodeField) -> Result<(), TreeError> {
        let path = self.path_to(node_id).ok_or(TreeError::NodeNotFound(node_id))?;
        let buttons = &self.node_at(&path).buttons;
        if !buttons.iter().any(|b| b.id == button_id) {
            return Err(TreeError::ButtonNotFound(button_id));
        }
        if let NodeField::Name(name) = &field {
            if buttons.iter().any(|b| b.id != button_id && b.name == *name) {
                return Err(TreeError::DuplicateButtonName {
                    node: node_id,
                    name: name.clone(),
                });
            }
        }
        let node = self.node_at_mut(&path);
        if let Some(button) = node.buttons.iter_mut().find(|b| b.id == button_id) {
            field.apply_to_button(button);
        }
        node.buttons.sort_by_key(|b| button_rank(&b.name));
        Ok(())
    }

    pub fn remove_button(&mut self, node_id: Uuid, button_id: Uuid) -> Result<ButtonOperation, TreeError> {
        let path = self.path_to(node_id).ok_or(TreeError::NodeNotFound(node_id))?;
        let index = self
            .node_at(&path)
            .buttons
            .iter()
            .position(|b| b.id == button_id)
            .ok_or(TreeError::ButtonNotFound(button_id))?;
        Ok(self.node_at_mut(&path).buttons.remove(index))
    }

    // ============================================================
    // Path helpers
    // ============================================================

    /// Every node and button id currently in the tree.
    fn ids(&self) -> HashSet<Uuid> {
        let mut ids = Vec::new();
        for root in &self.roots {
            collect_ids(root, &mut ids);
        }
        ids.into_iter().collect()
    }

    /// Nodes carrying buttons are menus and cannot take children.
    fn ensure_accepts_children(&self, id: Uuid) -> Result<(), TreeError> {
        let node = self.find(id).ok_or(TreeError::NodeNotFound(id))?;
        if node.buttons.is_empty() {
            Ok(())
        } else {
            Err(TreeError::HasButtons(id))
        }
    }

    /// Child indices from the top level down to `id`.
    fn path_to(&self, id: Uuid) -> Option<Vec<usize>> {
        fn search(nodes: &[Arc<FeatureNode>], id: Uuid, path: &mut Vec<usize>) -> bool {
            for (i, node) in nodes.iter().enumerate() {
                path.push(i);
                if node.id == id || search(&node.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        search(&self.roots, id, &mut path).then_some(path)
    }

    fn resolve_parent(&self, parent_id: Option<Uuid>) -> Result<Option<Vec<usize>>, TreeError> {
        parent_id
            .map(|id| self.path_to(id).ok_or(TreeError::NodeNotFound(id)))
            .transpose()
    }

    fn node_at(&self, path: &[usize]) -> &FeatureNode {
        let (first, rest) = path.split_first().expect("node path is never empty");
        let mut node = self.roots[*first].as_ref();
        for &i in rest {
            node = node.children[i].as_ref();
        }
        node
    }

    /// Copy-on-write access: clones each shared node along the path.
    fn node_at_mut(&mut self, path: &[usize]) -> &mut FeatureNode {
        let (first, rest) = path.split_first().expect("node path is never empty");
        let mut node = Arc::make_mut(&mut self.roots[*first]);
        for &i in rest {
            node = Arc::make_mut(&mut node.children[i]);
        }
        node
    }

    fn children_mut(&mut self, parent: Option<&[usize]>) -> &mut Vec<Arc<FeatureNode>> {
        match parent {
            Some(path) => &mut self.node_at_mut(path).children,
            None => &mut self.roots,
        }
    }

    fn detach(&mut self, id: Uuid) -> Result<Arc<FeatureNode>, TreeError> {
        let path = self.path_to(id).ok_or(TreeError::NodeNotFound(id))?;
        let (index, parent) = path.split_last().expect("node path is never empty");
        let parent = (!parent.is_empty()).then_some(parent);
        Ok(self.children_mut(parent).remove(*index))
    }
}

/// Point `node` at `parent_id` and its descendants at their parents.
///
/// Only nodes whose back-reference is wrong are copied.
fn relink(node: &mut Arc<FeatureNode>, parent_id: Option<Uuid>) {
    if node.parent_id != parent_id {
        Arc::make_mut(node).parent_id = parent_id;
    }
    let id = node.id;
    if node.children.iter().any(|c| !is_linked(c, id)) {
        for child in Arc::make_mut(node).children.iter_mut() {
            relink(child, Some(id));
        }
    }
}

/// Give every node and button whose id was already seen a fresh id.
fn reassign_duplicates(node: &mut Arc<FeatureNode>, seen: &mut HashSet<Uuid>) {
    if !seen.insert(node.id) {
        let fresh = Uuid::new_v4();
        tracing::warn!(duplicate = %node.id, %fresh, "reassigned duplicate node id");
        Arc::make_mut(node).id = fresh;
        seen.insert(fresh);
    }

    let repeated: Vec<usize> = node
        .buttons
        .iter()
        .enumerate()
        .filter(|(_, b)| !seen.insert(b.id))
        .map(|(i, _)| i)
        .collect();
    if !repeated.is_empty() {
        let node = Arc::make_mut(node);
        for i in repeated {
            let fresh = Uuid::new_v4();
            tracing::warn!(duplicate = %node.buttons[i].id, %fresh, "reassigned duplicate button id");
            node.buttons[i].id = fresh;
            seen.insert(fresh);
        }
    }

    if !node.children.is_empty() {
        for child in Arc::make_mut(node).children.iter_mut() {
            reassign_duplicates(child, seen);
        }
    }
}

fn is_linked(node: &FeatureNode, parent_id: Uuid) -> bool {
    node.parent_id == Some(parent_id) && node.children.iter().all(|c| is_linked(c, node.id))
}

fn collect_ids(node: &FeatureNode, out: &mut Vec<Uuid>) {
    out.push(node.id);
    out.extend(node.buttons.iter().map(|b| b.id));
    for child in &node.children {
        collect_ids(child, out);
    }
}
