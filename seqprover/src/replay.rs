//! Replaying proof skeletons onto proof tree nodes.
//!
//! [`reuse`] applies the stored rules as they are. [`rebuild`] also falls
//! back to running the generating reasoner again with its stored input,
//! which recovers proofs whose sequent changed in ways the stored rules no
//! longer match. Both stop at the first cancellation and report whether
//! every rule of the skeleton made it into the tree.

use crate::config::SequentProver;
use crate::proof_tree::{NodeId, ProofSkeleton, ProofTree};
use crate::reasoner::{ProofMonitor, ReasonerOutput};
use crate::rule::ProofRule;
use tracing::{debug, instrument, warn};

/// Re-apply the rules of `skeleton` at `node`.
///
/// Comments are copied onto the nodes they belong to. Returns `true` iff
/// every rule of the skeleton was applied.
#[instrument(level = "debug", skip_all, fields(rules = skeleton.rule_count()))]
pub fn reuse(
    tree: &mut ProofTree,
    node: NodeId,
    skeleton: &ProofSkeleton,
    monitor: &dyn ProofMonitor,
) -> bool {
    replay(tree, node, skeleton, monitor, &mut |tree, node, rule| {
        tree.apply_rule(node, rule)
    })
}

/// Re-apply the rules of `skeleton` at `node`, re-running reasoners where
/// the stored rule cannot be used.
///
/// What is tried first is governed by the prover configuration: stored
/// rules or reasoners, and whether a reasoner at another version than the
/// one that made the rule is trusted.
#[instrument(level = "debug", skip_all, fields(rules = skeleton.rule_count()))]
pub fn rebuild(
    tree: &mut ProofTree,
    node: NodeId,
    skeleton: &ProofSkeleton,
    prover: &SequentProver,
    monitor: &dyn ProofMonitor,
) -> bool {
    replay(tree, node, skeleton, monitor, &mut |tree, node, rule| {
        rebuild_rule(tree, node, rule, prover, monitor)
    })
}

fn replay(
    tree: &mut ProofTree,
    node: NodeId,
    skeleton: &ProofSkeleton,
    monitor: &dyn ProofMonitor,
    apply: &mut dyn FnMut(&mut ProofTree, NodeId, &ProofRule) -> bool,
) -> bool {
    if monitor.is_canceled() {
        debug!("Replay canceled");
        return false;
    }
    if !tree.set_comment(node, skeleton.comment()) {
        return false;
    }
    let Some(rule) = skeleton.rule() else {
        return true;
    };
    if !apply(tree, node, rule) {
        return false;
    }

    let children = tree.children(node).to_vec();
    let mut complete = children.len() == skeleton.children().len();
    for (child, child_skeleton) in children.into_iter().zip(skeleton.children()) {
        complete &= replay(tree, child, child_skeleton, monitor, apply);
        if monitor.is_canceled() {
            return false;
        }
    }
    complete
}

fn rebuild_rule(
    tree: &mut ProofTree,
    node: NodeId,
    rule: &ProofRule,
    prover: &SequentProver,
    monitor: &dyn ProofMonitor,
) -> bool {
    let config = prover.config();
    let conflict = prover.registry().has_version_conflict(rule.generated_by());
    if conflict && !config.rebuild_on_version_conflict {
        warn!(reasoner = %rule.generated_by(), "Keeping rule made by another reasoner version");
    }
    let trust_stored = !conflict || !config.rebuild_on_version_conflict;

    if trust_stored && config.reuse_rules_first && tree.apply_rule(node, rule) {
        return true;
    }
    if regenerate(tree, node, rule, prover, monitor) {
        return true;
    }
    trust_stored && !config.reuse_rules_first && tree.apply_rule(node, rule)
}

/// Run the reasoner that generated `rule` again on the node's sequent.
fn regenerate(
    tree: &mut ProofTree,
    node: NodeId,
    rule: &ProofRule,
    prover: &SequentProver,
    monitor: &dyn ProofMonitor,
) -> bool {
    let Some(seq) = tree.node(node).map(|n| n.sequent().clone()) else {
        return false;
    };
    let reasoner = prover.registry().lookup(rule.generated_by());
    match reasoner.apply(&seq, rule.generated_using(), monitor) {
        ReasonerOutput::Rule(fresh) => tree.apply_rule(node, &fresh),
        ReasonerOutput::Failure(failure) => {
            debug!(%failure, "Reasoner could not rebuild rule");
            false
        }
    }
}
