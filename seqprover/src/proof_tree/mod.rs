//! Proof trees.
//!
//! A [`ProofTree`] records which rules were applied where while proving a
//! root sequent. Nodes live in an arena owned by the tree and are addressed
//! by [`NodeId`] handles. Handles carry a generation, so a handle to a node
//! that was pruned away is simply no longer found in the tree.
//!
//! ## Node states
//!
//! - **open**: no rule applied
//! - **pending**: not closed (open, or with an open descendant)
//! - **closed**: rule applied and every child closed
//!
//! Status, confidence and proof dependencies are recomputed along the
//! ancestor chain after every change, so reading them is always consistent
//! with the current shape of the tree.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use seqprover::formula::{Predicate, TypeEnvironment};
//! use seqprover::proof_tree::ProofTree;
//! use seqprover::reasoner::{EmptyInput, NullMonitor, Reasoner, ReasonerInput};
//! use seqprover::reasoners::TrueGoal;
//! use seqprover::sequent::Sequent;
//!
//! let seq = Sequent::builder(TypeEnvironment::new())
//!     .goal(Predicate::True)
//!     .build()
//!     .unwrap();
//! let mut tree = ProofTree::new(seq.clone());
//!
//! let input: Arc<dyn ReasonerInput> = Arc::new(EmptyInput);
//! let rule = TrueGoal.apply(&seq, &input, &NullMonitor).into_rule().unwrap();
//! assert!(tree.apply_rule(tree.root(), &rule));
//! assert!(tree.is_closed());
//! ```

pub mod delta;
#[cfg(test)]
mod proptest;
pub mod skeleton;

pub use delta::{ChangeKind, ListenerId, ProofTreeDelta, ProofTreeListener};
pub use skeleton::{ProofSkeleton, RuleRecord, SkeletonRecord};

use crate::confidence::Confidence;
use crate::dependencies::{rule_dependencies, ProofDependencies};
use crate::reasoner::NullMonitor;
use crate::rule::{ProofRule, RuleError};
use crate::sequent::Sequent;
use std::fmt;
use tracing::{debug, instrument, warn};

/// Handle to a node of a [`ProofTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct NodeData {
    sequent: Sequent,
    rule: Option<ProofRule>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    comment: String,
    closed: bool,
    confidence: Confidence,
    deps: ProofDependencies,
}

impl NodeData {
    fn open(sequent: Sequent, parent: Option<NodeId>) -> Self {
        Self {
            sequent,
            rule: None,
            children: Vec::new(),
            parent,
            comment: String::new(),
            closed: false,
            confidence: Confidence::PENDING,
            deps: ProofDependencies::none(),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

/// Read-only view of a node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    id: NodeId,
    data: &'a NodeData,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn sequent(&self) -> &'a Sequent {
        &self.data.sequent
    }

    pub fn rule(&self) -> Option<&'a ProofRule> {
        self.data.rule.as_ref()
    }

    pub fn children(&self) -> &'a [NodeId] {
        &self.data.children
    }

    pub fn has_children(&self) -> bool {
        !self.data.children.is_empty()
    }

    /// Parent node; `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.data.parent
    }

    pub fn comment(&self) -> &'a str {
        &self.data.comment
    }

    /// No rule applied.
    pub fn is_open(&self) -> bool {
        self.data.rule.is_none()
    }

    /// Rule applied and every descendant closed.
    pub fn is_closed(&self) -> bool {
        self.data.closed
    }

    /// [`Confidence::PENDING`] unless closed.
    pub fn confidence(&self) -> Confidence {
        self.data.confidence
    }

    /// Dependencies of the subtree; empty unless closed.
    pub fn dependencies(&self) -> &'a ProofDependencies {
        &self.data.deps
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("sequent", &self.data.sequent)
            .field("rule", &self.data.rule.as_ref().map(|r| r.display_name()))
            .field("closed", &self.data.closed)
            .finish()
    }
}

/// A proof tree over a root sequent.
pub struct ProofTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    listeners: Vec<(ListenerId, ProofTreeListener)>,
    next_listener: u64,
    batch_depth: usize,
    pending: ProofTreeDelta,
    log_ill_formed_rules: bool,
}

impl ProofTree {
    /// Create a tree whose root is an open node for `root`.
    pub fn new(root: Sequent) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            listeners: Vec::new(),
            next_listener: 0,
            batch_depth: 0,
            pending: ProofTreeDelta::default(),
            log_ill_formed_rules: true,
        };
        tree.root = tree.alloc(NodeData::open(root, None));
        tree
    }

    /// Whether ill-formed rules are reported with `warn!`.
    pub fn set_log_ill_formed_rules(&mut self, enabled: bool) {
        self.log_ill_formed_rules = enabled;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> NodeRef<'_> {
        NodeRef {
            id: self.root,
            data: self.data(self.root).unwrap_or_else(|| unreachable!("root is never freed")),
        }
    }

    pub fn root_sequent(&self) -> &Sequent {
        self.root_node().sequent()
    }

    /// Whether the whole proof is closed.
    pub fn is_closed(&self) -> bool {
        self.root_node().is_closed()
    }

    /// Confidence of the whole proof.
    pub fn confidence(&self) -> Confidence {
        self.root_node().confidence()
    }

    /// Whether `id` denotes a node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    /// View of a node, or `None` if `id` is not (or no longer) in this tree.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.data(id).map(|data| NodeRef { id, data })
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|d| d.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Distance from the root.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.data(id)?;
        while let Some(parent) = current.parent {
            current = self.data(parent)?;
            depth += 1;
        }
        Some(depth)
    }

    // -- traversal --

    fn preorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(from) {
            return out;
        }
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    fn is_open_node(&self, id: NodeId) -> bool {
        self.data(id).is_some_and(|d| d.rule.is_none())
    }

    /// Open nodes of the subtree of `id`, in pre-order.
    pub fn open_descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.preorder(id)
            .into_iter()
            .filter(|n| self.is_open_node(*n))
            .collect()
    }

    /// First open node of the subtree of `id` in pre-order; `id` itself if
    /// it is open.
    pub fn first_open_descendant(&self, id: NodeId) -> Option<NodeId> {
        self.preorder(id).into_iter().find(|n| self.is_open_node(*n))
    }

    /// Next open node after `id` in pre-order over the whole tree, wrapping
    /// around to the root. Returns `id` itself when it is open.
    pub fn next_open_node(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        if self.is_open_node(id) {
            return Some(id);
        }
        let order = self.preorder(self.root);
        let pos = order.iter().position(|n| *n == id)?;
        order[pos + 1..]
            .iter()
            .chain(&order[..pos])
            .copied()
            .find(|n| self.is_open_node(*n))
    }

    /// First node of the subtree of `id`, in pre-order, accepted by `filter`.
    pub fn next_node<F>(&self, id: NodeId, root_included: bool, mut filter: F) -> Option<NodeId>
    where
        F: FnMut(NodeRef<'_>) -> bool,
    {
        let skip = usize::from(!root_included);
        self.preorder(id)
            .into_iter()
            .skip(skip)
            .find(|n| self.node(*n).is_some_and(&mut filter))
    }

    // -- mutation --

    /// Apply `rule` to the open node `id`.
    ///
    /// Creates one open child per antecedent. Returns `false` without
    /// changing anything when the node is not open or the rule does not
    /// apply to its sequent.
    #[instrument(level = "debug", skip(self, rule), fields(rule = %rule))]
    pub fn apply_rule(&mut self, id: NodeId, rule: &ProofRule) -> bool {
        match self.try_apply_rule(id, rule) {
            Ok(_) => true,
            Err(None) => false,
            Err(Some(err)) => {
                if err.is_ill_formed() && self.log_ill_formed_rules {
                    warn!(rule = %rule, reasoner = %rule.generated_by(), "{}", err);
                } else {
                    debug!("Rule not applicable: {}", err);
                }
                false
            }
        }
    }

    fn try_apply_rule(
        &mut self,
        id: NodeId,
        rule: &ProofRule,
    ) -> Result<Vec<NodeId>, Option<RuleError>> {
        let seq = match self.data(id) {
            Some(data) if data.rule.is_none() => data.sequent.clone(),
            Some(_) => {
                debug!("Node already has a rule");
                return Err(None);
            }
            None => {
                debug!("Node is not in this tree");
                return Err(None);
            }
        };
        let children = rule.apply(&seq).map_err(Some)?;

        let child_ids: Vec<NodeId> = children
            .into_iter()
            .map(|child| self.alloc(NodeData::open(child, Some(id))))
            .collect();
        if let Some(data) = self.data_mut(id) {
            data.rule = Some(rule.clone());
            data.children = child_ids.clone();
        }
        self.pending.record(id, ChangeKind::Rule);
        self.pending.record(id, ChangeKind::Children);
        self.update_ancestors(id);
        self.flush();
        Ok(child_ids)
    }

    /// Detach the children of `id`, reopening it.
    ///
    /// Each child subtree is returned as an independent tree. Returns `None`
    /// when the node has no rule.
    pub fn prune_children(&mut self, id: NodeId) -> Option<Vec<ProofTree>> {
        let data = self.data(id)?;
        data.rule.as_ref()?;
        let children = data.children.clone();

        let pruned: Vec<ProofTree> = children
            .iter()
            .filter_map(|child| self.copy_sub_tree(*child))
            .collect();
        for child in children {
            self.free_subtree(child);
        }
        if let Some(data) = self.data_mut(id) {
            data.rule = None;
            data.children.clear();
        }
        self.pending.record(id, ChangeKind::Rule);
        self.pending.record(id, ChangeKind::Children);
        self.update_ancestors(id);
        self.flush();
        Some(pruned)
    }

    /// Set the comment of a node. Returns `false` for unknown nodes.
    pub fn set_comment(&mut self, id: NodeId, comment: impl Into<String>) -> bool {
        let comment = comment.into();
        let Some(data) = self.data_mut(id) else {
            return false;
        };
        if data.comment != comment {
            data.comment = comment;
            self.pending.record(id, ChangeKind::Comment);
            self.flush();
        }
        true
    }

    /// Replay the proof of `source` on the open node `id`.
    ///
    /// The source proof must be reusable on the node's sequent (see
    /// [`ProofDependencies::is_reusable`]) and every one of its rules must
    /// apply again; otherwise the node is left open and `false` returned.
    pub fn graft(&mut self, id: NodeId, source: &ProofTree) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if !node.is_open() {
            return false;
        }
        let comment = node.comment().to_string();
        if !source.root_node().dependencies().is_reusable(node.sequent()) {
            debug!("Graft rejected: source proof is not reusable here");
            return false;
        }
        let Some(skeleton) = source.copy_proof_skeleton(source.root()) else {
            return false;
        };

        let saved = self.pending.clone();
        self.batch(|tree| {
            if crate::replay::reuse(tree, id, &skeleton, &NullMonitor) {
                return true;
            }
            debug!("Graft failed, rolling back");
            tree.prune_children(id);
            tree.set_comment(id, comment);
            tree.pending = saved;
            false
        })
    }

    /// Run `f` with notifications coalesced into a single delta.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        self.flush();
        result
    }

    /// Register a listener, called after every change.
    pub fn add_listener(
        &mut self,
        listener: impl FnMut(&ProofTreeDelta) + Send + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    // -- copies --

    /// Independent copy of the subtree rooted at `id`.
    pub fn copy_sub_tree(&self, id: NodeId) -> Option<ProofTree> {
        let data = self.data(id)?;
        let mut copy = ProofTree::new(data.sequent.clone());
        copy.log_ill_formed_rules = self.log_ill_formed_rules;
        let root = copy.root;
        self.copy_into(id, &mut copy, root);
        Some(copy)
    }

    fn copy_into(&self, src: NodeId, dst: &mut ProofTree, dst_id: NodeId) {
        let Some(data) = self.data(src) else {
            return;
        };
        let children: Vec<NodeId> = data
            .children
            .iter()
            .filter_map(|child| {
                let child_data = self.data(*child)?;
                let copy = NodeData {
                    children: Vec::new(),
                    parent: Some(dst_id),
                    ..child_data.clone()
                };
                let new_id = dst.alloc(copy);
                self.copy_into(*child, dst, new_id);
                Some(new_id)
            })
            .collect();
        if let Some(target) = dst.data_mut(dst_id) {
            *target = NodeData {
                children,
                parent: target.parent,
                ..data.clone()
            };
        }
    }

    /// Rules and comments of the subtree rooted at `id`.
    pub fn copy_proof_skeleton(&self, id: NodeId) -> Option<ProofSkeleton> {
        let data = self.data(id)?;
        let children = data
            .children
            .iter()
            .filter_map(|child| self.copy_proof_skeleton(*child))
            .collect();
        Some(ProofSkeleton::new(
            data.rule.clone(),
            children,
            data.comment.clone(),
        ))
    }

    // -- arena --

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(data);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(data),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        for node in self.preorder(id) {
            if let Some(slot) = self.slots.get_mut(node.index as usize) {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node.index);
            }
            self.pending.forget(node);
        }
    }

    /// Recompute status, confidence and dependencies from `id` up to the
    /// root.
    fn update_ancestors(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            let Some((closed, confidence, deps)) = self.compute_status(node) else {
                return;
            };
            let Some(data) = self.data_mut(node) else {
                return;
            };
            let changed = data.closed != closed || data.confidence != confidence;
            data.closed = closed;
            data.confidence = confidence;
            data.deps = deps;
            current = data.parent;
            if changed {
                self.pending.record(node, ChangeKind::Confidence);
            }
        }
    }

    fn compute_status(&self, id: NodeId) -> Option<(bool, Confidence, ProofDependencies)> {
        let data = self.data(id)?;
        let Some(rule) = &data.rule else {
            return Some((false, Confidence::PENDING, ProofDependencies::none()));
        };
        let children: Vec<&NodeData> = data
            .children
            .iter()
            .filter_map(|child| self.data(*child))
            .collect();
        if !children.iter().all(|child| child.closed) {
            return Some((false, Confidence::PENDING, ProofDependencies::none()));
        }

        let confidence = children
            .iter()
            .map(|child| child.confidence)
            .fold(rule.confidence(), Confidence::min);
        let pairs: Vec<(&ProofDependencies, &Sequent)> = children
            .iter()
            .map(|child| (&child.deps, &child.sequent))
            .collect();
        let deps = rule_dependencies(rule, &data.sequent, &pairs);
        Some((true, confidence, deps))
    }

    fn flush(&mut self) {
        if self.batch_depth > 0 || self.pending.is_empty() {
            return;
        }
        let delta = std::mem::take(&mut self.pending);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&delta);
        }
    }
}

impl fmt::Debug for ProofTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofTree")
            .field("root", &self.root_sequent())
            .field("nodes", &self.node_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Expression, Predicate, Type, TypeEnvironment};
    use crate::reasoner::{EmptyInput, ReasonerDesc};
    use crate::rule::Antecedent;
    use std::sync::{Arc, Mutex};

    fn x_lt(n: i64) -> Predicate {
        Predicate::lt(Expression::ident("x"), Expression::int(n))
    }

    fn seq(goal: Predicate) -> Sequent {
        let mut env = TypeEnvironment::new();
        env.add_name("x", Type::Integer).unwrap();
        Sequent::builder(env)
            .selected(x_lt(1))
            .goal(goal)
            .build()
            .unwrap()
    }

    fn rule(goal: Predicate, antecedents: Vec<Antecedent>) -> ProofRule {
        ProofRule::builder(ReasonerDesc::new("test", None), Arc::new(EmptyInput))
            .goal(goal)
            .antecedents(antecedents)
            .build()
    }

    fn discharge(goal: Predicate, confidence: Confidence) -> ProofRule {
        ProofRule::builder(ReasonerDesc::new("close", None), Arc::new(EmptyInput))
            .goal(goal)
            .confidence(confidence)
            .build()
    }

    fn split_tree() -> (ProofTree, NodeId, NodeId) {
        let mut tree = ProofTree::new(seq(x_lt(10)));
        let root = tree.root();
        let split = rule(x_lt(10), vec![Antecedent::new(x_lt(2)), Antecedent::new(x_lt(3))]);
        assert!(tree.apply_rule(root, &split));
        let children = tree.children(root).to_vec();
        (tree, children[0], children[1])
    }

    #[test]
    fn test_new_tree_is_open() {
        let tree = ProofTree::new(seq(x_lt(10)));
        let root = tree.root_node();
        assert!(root.is_open());
        assert!(!root.is_closed());
        assert_eq!(root.confidence(), Confidence::PENDING);
        assert_eq!(root.parent(), None);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_zero_antecedent_rule_closes_immediately() {
        let mut tree = ProofTree::new(seq(x_lt(10)));
        let root = tree.root();
        assert!(tree.apply_rule(root, &discharge(x_lt(10), Confidence::REVIEWED_MAX)));
        assert!(tree.is_closed());
        assert!(!tree.root_node().has_children());
        assert_eq!(tree.confidence(), Confidence::REVIEWED_MAX);
    }

    #[test]
    fn test_rule_on_non_open_node_fails() {
        let mut tree = ProofTree::new(seq(x_lt(10)));
        let root = tree.root();
        assert!(tree.apply_rule(root, &discharge(x_lt(10), Confidence::DISCHARGED_MAX)));
        assert!(!tree.apply_rule(root, &discharge(x_lt(10), Confidence::DISCHARGED_MAX)));
    }

    #[test]
    fn test_inapplicable_rule_changes_nothing() {
        let mut tree = ProofTree::new(seq(x_lt(10)));
        let root = tree.root();
        assert!(!tree.apply_rule(root, &discharge(x_lt(11), Confidence::DISCHARGED_MAX)));
        assert!(tree.root_node().is_open());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_pending_confidence_rule_is_refused() {
        let mut tree = ProofTree::new(seq(x_lt(10)));
        let root = tree.root();
        assert!(!tree.apply_rule(root, &discharge(x_lt(10), Confidence::PENDING)));
        assert!(tree.root_node().is_open());
        assert_eq!(tree.confidence(), Confidence::PENDING);
    }

    #[test]
    fn test_confidence_is_minimum_over_subtree() {
        let (mut tree, a, b) = split_tree();
        assert!(!tree.is_closed());
        assert!(tree.apply_rule(a, &discharge(x_lt(2), Confidence::REVIEWED_MAX)));
        assert!(!tree.is_closed());
        assert!(tree.apply_rule(b, &discharge(x_lt(3), Confidence::DISCHARGED_MAX)));
        assert!(tree.is_closed());
        assert_eq!(tree.confidence(), Confidence::REVIEWED_MAX);
    }

    #[test]
    fn test_prune_returns_independent_trees() {
        let (mut tree, a, b) = split_tree();
        tree.apply_rule(a, &discharge(x_lt(2), Confidence::DISCHARGED_MAX));
        tree.apply_rule(b, &discharge(x_lt(3), Confidence::DISCHARGED_MAX));
        let root = tree.root();

        let pruned = tree.prune_children(root).unwrap();
        assert_eq!(pruned.len(), 2);
        assert_eq!(pruned[0].root_sequent().goal(), &x_lt(2));
        assert_eq!(pruned[1].root_sequent().goal(), &x_lt(3));
        assert!(pruned.iter().all(|t| t.is_closed() && t.root_node().parent().is_none()));

        assert!(tree.root_node().is_open());
        assert!(!tree.contains(a));
        assert!(tree.node(b).is_none());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_prune_open_node_is_noop() {
        let mut tree = ProofTree::new(seq(x_lt(10)));
        let root = tree.root();
        assert!(tree.prune_children(root).is_none());
    }

    #[test]
    fn test_stale_handle_is_not_reused() {
        let (mut tree, a, _) = split_tree();
        let root = tree.root();
        tree.prune_children(root);
        let split = rule(x_lt(10), vec![Antecedent::new(x_lt(4))]);
        tree.apply_rule(root, &split);
        let fresh = tree.children(root)[0];
        assert_ne!(fresh, a);
        assert!(!tree.contains(a));
        assert!(!tree.set_comment(a, "stale"));
    }

    #[test]
    fn test_open_node_navigation() {
        let (mut tree, a, b) = split_tree();
        let root = tree.root();
        assert_eq!(tree.first_open_descendant(root), Some(a));
        assert_eq!(tree.open_descendants(root), vec![a, b]);
        assert_eq!(tree.next_open_node(a), Some(a));
        assert_eq!(tree.next_open_node(root), Some(a));

        tree.apply_rule(a, &discharge(x_lt(2), Confidence::DISCHARGED_MAX));
        assert_eq!(tree.next_open_node(a), Some(b));
        assert_eq!(tree.first_open_descendant(root), Some(b));
        assert_eq!(tree.depth(b), Some(1));
    }

    #[test]
    fn test_next_open_node_wraps_to_root() {
        let (mut tree, a, b) = split_tree();
        let inner = rule(x_lt(3), vec![Antecedent::new(x_lt(5))]);
        tree.apply_rule(b, &inner);
        assert_eq!(tree.next_open_node(b), Some(tree.children(b)[0]));
        tree.apply_rule(tree.children(b)[0], &discharge(x_lt(5), Confidence::DISCHARGED_MAX));
        assert_eq!(tree.next_open_node(b), Some(a));
    }

    #[test]
    fn test_next_node_with_filter() {
        let (tree, a, b) = split_tree();
        let root = tree.root();
        assert_eq!(tree.next_node(root, true, |n| n.has_children()), Some(root));
        assert_eq!(tree.next_node(root, false, |n| n.has_children()), None);
        assert_eq!(
            tree.next_node(root, false, |n| n.sequent().goal() == &x_lt(3)),
            Some(b)
        );
        assert_eq!(tree.next_node(a, false, |_| true), None);
    }

    #[test]
    fn test_listeners_receive_deltas() {
        let deltas = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&deltas);
        let mut tree = ProofTree::new(seq(x_lt(10)));
        let listener = tree.add_listener(move |d| sink.lock().unwrap().push(d.clone()));
        let root = tree.root();

        tree.apply_rule(root, &discharge(x_lt(10), Confidence::DISCHARGED_MAX));
        tree.set_comment(root, "done");
        {
            let seen = deltas.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert!(seen[0].contains(root, ChangeKind::Rule));
            assert!(seen[0].contains(root, ChangeKind::Confidence));
            assert_eq!(seen[1].kinds(root), &[ChangeKind::Comment]);
        }

        assert!(tree.remove_listener(listener));
        tree.prune_children(root);
        assert_eq!(deltas.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_batch_coalesces_notifications() {
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let (mut tree, a, b) = split_tree();
        tree.add_listener(move |_| *sink.lock().unwrap() += 1);

        tree.batch(|t| {
            t.apply_rule(a, &discharge(x_lt(2), Confidence::DISCHARGED_MAX));
            t.apply_rule(b, &discharge(x_lt(3), Confidence::DISCHARGED_MAX));
        });
        assert_eq!(*count.lock().unwrap(), 1);
        assert!(tree.is_closed());
    }

    #[test]
    fn test_copy_sub_tree_and_skeleton() {
        let (mut tree, a, _) = split_tree();
        tree.set_comment(a, "left");
        tree.apply_rule(a, &discharge(x_lt(2), Confidence::DISCHARGED_MAX));

        let copy = tree.copy_sub_tree(tree.root()).unwrap();
        assert_eq!(copy.node_count(), 3);
        let copied_a = copy.children(copy.root())[0];
        assert_eq!(copy.node(copied_a).unwrap().comment(), "left");
        assert!(copy.node(copied_a).unwrap().is_closed());

        let skeleton = tree.copy_proof_skeleton(tree.root()).unwrap();
        assert_eq!(skeleton.children().len(), 2);
        assert_eq!(skeleton.children()[0].comment(), "left");
        assert!(skeleton.children()[1].rule().is_none());
    }

    #[test]
    fn test_graft_replays_reusable_proof() {
        let mut source = ProofTree::new(seq(x_lt(10)));
        let root = source.root();
        source.apply_rule(root, &discharge(x_lt(10), Confidence::DISCHARGED_MAX));

        let mut target = ProofTree::new(seq(x_lt(10)));
        assert!(target.graft(target.root(), &source));
        assert!(target.is_closed());

        let mut other = ProofTree::new(seq(x_lt(11)));
        assert!(!other.graft(other.root(), &source));
        assert!(other.root_node().is_open());
    }

    #[test]
    fn test_dependencies_of_closed_node() {
        let mut tree = ProofTree::new(seq(x_lt(10)));
        let root = tree.root();
        let uses_hyp = ProofRule::builder(ReasonerDesc::new("hyp", None), Arc::new(EmptyInput))
            .goal(x_lt(10))
            .needed_hyp(x_lt(1))
            .build();
        tree.apply_rule(root, &uses_hyp);

        let deps = tree.root_node().dependencies();
        assert!(deps.has_deps());
        assert_eq!(deps.goal(), Some(&x_lt(10)));
        assert!(deps.used_hypotheses().contains(&x_lt(1)));
        assert!(deps.used_free_idents().contains("x"));
    }
}
