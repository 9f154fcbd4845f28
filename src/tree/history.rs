use std::collections::VecDeque;

use super::FeatureTree;

/// Default number of versions kept before the oldest is evicted.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Linear undo/redo log of tree versions.
///
/// Snapshots are `FeatureTree` clones, which share unchanged subtrees with
/// each other and with the live tree. Committing after an undo discards the
/// redo branch. Once `capacity` versions are held, each commit evicts the
/// oldest one.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    snapshots: VecDeque<FeatureTree>,
    cursor: usize,
    capacity: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryManager {
    /// Start with a single empty-tree version. A capacity below 1 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self::starting_from(FeatureTree::new(), capacity)
    }

    /// Start with `tree` as the only version, e.g. after loading a document.
    pub fn starting_from(tree: FeatureTree, capacity: usize) -> Self {
        let mut snapshots = VecDeque::new();
        snapshots.push_back(tree);
        Self {
            snapshots,
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record `tree` as the newest version.
    pub fn commit(&mut self, tree: &FeatureTree) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push_back(tree.clone());
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        self.cursor = self.snapshots.len() - 1;
        tracing::debug!(cursor = self.cursor, versions = self.snapshots.len(), "committed tree version");
    }

    /// Step back one version. `None` when already at the oldest.
    pub fn undo(&mut self) -> Option<FeatureTree> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.snapshots[self.cursor].clone())
    }

    /// Step forward one version. `None` when already at the newest.
    pub fn redo(&mut self) -> Option<FeatureTree> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.snapshots[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// The version the cursor points at.
    pub fn current(&self) -> &FeatureTree {
        &self.snapshots[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every version and start over from `tree`.
    pub fn reset(&mut self, tree: FeatureTree) {
        self.snapshots.clear();
        self.snapshots.push_back(tree);
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureNode;

    fn tree_with(names: &[&str]) -> FeatureTree {
        let mut tree = FeatureTree::new();
        for name in names {
            tree.insert_node(None, FeatureNode::new(*name)).unwrap();
        }
        tree
    }

    #[test]
    fn starts_with_one_empty_version() {
        let history = HistoryManager::default();
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert!(history.current().is_empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_and_redo_are_noops_at_the_ends() {
        let mut history = HistoryManager::default();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());

        history.commit(&tree_with(&["A"]));
        assert!(history.redo().is_none());
        assert!(history.undo().is_some());
        assert!(history.undo().is_none());
    }

    #[test]
    fn commit_after_undo_discards_redo_branch() {
        let mut history = HistoryManager::default();
        history.commit(&tree_with(&["A"]));
        history.commit(&tree_with(&["A", "B"]));
        history.undo();

        history.commit(&tree_with(&["C"]));
        assert_eq!(history.len(), 3);
        assert!(!history.can_redo());
        assert_eq!(history.current().roots()[0].name, "C");
    }

    #[test]
    fn capacity_evicts_oldest_versions() {
        let mut history = HistoryManager::new(3);
        for name in ["A", "B", "C", "D"] {
            history.commit(&tree_with(&[name]));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);

        history.undo();
        let oldest = history.undo().unwrap();
        assert_eq!(oldest.roots()[0].name, "B");
        assert!(history.undo().is_none());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut history = HistoryManager::new(0);
        history.commit(&tree_with(&["A"]));
        assert_eq!(history.len(), 1);
        assert_eq!(history.capacity(), 1);
        assert!(!history.can_undo());
    }
}
