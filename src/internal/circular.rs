//! Per-call resolution path for cycle detection.
//!
//! The path travels explicitly with each top-level request instead of living
//! in thread-local state, so nested requests on other threads never observe
//! frames that are not their own. Every request runs in a single scope
//! instance, so a node appears on the path at most once.

use crate::graph::NodeId;

/// Stack of nodes currently being resolved, oldest first.
#[derive(Debug)]
pub(crate) struct ResolutionPath {
    nodes: Vec<NodeId>,
    max_depth: usize,
}

impl ResolutionPath {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(16),
            max_depth,
        }
    }

    /// Position of `node` on the path, if it is in progress.
    pub(crate) fn position(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|&frame| frame == node)
    }

    /// Nodes from `start` to the top of the path, oldest first.
    pub(crate) fn nodes_from(&self, start: usize) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[start..].iter().copied()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.nodes.len() >= self.max_depth
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn push(&mut self, node: NodeId) {
        self.nodes.push(node);
    }

    pub(crate) fn pop(&mut self) {
        let popped = self.nodes.pop();
        debug_assert!(popped.is_some(), "unbalanced resolution path");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_and_suffix() {
        let mut path = ResolutionPath::new(8);
        let a = NodeId::from_index(0);
        let b = NodeId::from_index(1);
        let c = NodeId::from_index(2);

        path.push(a);
        path.push(b);

        assert_eq!(path.position(a), Some(0));
        assert_eq!(path.position(b), Some(1));
        assert_eq!(path.position(c), None);
        assert_eq!(path.nodes_from(1).collect::<Vec<_>>(), vec![b]);

        path.pop();
        assert_eq!(path.nodes_from(0).count(), 1);
    }

    #[test]
    fn full_at_max_depth() {
        let mut path = ResolutionPath::new(2);
        path.push(NodeId::from_index(0));
        assert!(!path.is_full());
        path.push(NodeId::from_index(1));
        assert!(path.is_full());
        assert_eq!(path.max_depth(), 2);
    }
}
