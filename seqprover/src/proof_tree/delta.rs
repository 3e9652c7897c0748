//! Change notification for proof trees.

use crate::proof_tree::NodeId;
use indexmap::IndexMap;

/// What changed on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A rule was applied or removed.
    Rule,
    /// Children were attached or pruned.
    Children,
    /// Open/closed status or confidence changed.
    Confidence,
    Comment,
}

/// Changes made to a proof tree by one operation or batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofTreeDelta {
    changes: IndexMap<NodeId, Vec<ChangeKind>>,
}

impl ProofTreeDelta {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Nodes that changed, in the order they were first touched.
    pub fn changed_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.changes.keys().copied()
    }

    /// Kinds of change recorded for `node`.
    pub fn kinds(&self, node: NodeId) -> &[ChangeKind] {
        self.changes.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, node: NodeId, kind: ChangeKind) -> bool {
        self.kinds(node).contains(&kind)
    }

    pub(crate) fn record(&mut self, node: NodeId, kind: ChangeKind) {
        let kinds = self.changes.entry(node).or_default();
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    /// Drop every change recorded for `node`.
    pub(crate) fn forget(&mut self, node: NodeId) {
        self.changes.shift_remove(&node);
    }
}

/// Callback invoked after each change to a tree.
pub type ProofTreeListener = Box<dyn FnMut(&ProofTreeDelta) + Send>;

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
