//! Basic tactics.
//!
//! A tactic drives a proof tree from a node: it applies rules produced by
//! reasoners, possibly to many nodes. Tactics only use the public node API
//! of [`ProofTree`].

use crate::proof_tree::{NodeId, ProofTree};
use crate::reasoner::{ProofMonitor, Reasoner, ReasonerInput, ReasonerOutput};
use std::sync::Arc;
use tracing::trace;

/// Something that works on a proof tree at a node.
///
/// Returns `Err` with a reason when it could not do anything useful.
pub trait Tactic {
    fn apply(
        &self,
        tree: &mut ProofTree,
        node: NodeId,
        monitor: &dyn ProofMonitor,
    ) -> Result<(), String>;
}

impl<F> Tactic for F
where
    F: Fn(&mut ProofTree, NodeId, &dyn ProofMonitor) -> Result<(), String>,
{
    fn apply(
        &self,
        tree: &mut ProofTree,
        node: NodeId,
        monitor: &dyn ProofMonitor,
    ) -> Result<(), String> {
        self(tree, node, monitor)
    }
}

/// Run `reasoner` on the sequent of an open node and apply its rule there.
pub fn reasoner_tac(reasoner: Arc<dyn Reasoner>, input: Arc<dyn ReasonerInput>) -> impl Tactic {
    move |tree: &mut ProofTree, node: NodeId, monitor: &dyn ProofMonitor| {
        let seq = match tree.node(node) {
            Some(n) if n.is_open() => n.sequent().clone(),
            Some(_) => return Err("Node already has a rule".to_string()),
            None => return Err("Node is not in the tree".to_string()),
        };
        monitor.set_task(reasoner.id());
        match reasoner.apply(&seq, &input, monitor) {
            ReasonerOutput::Rule(rule) => {
                if tree.apply_rule(node, &rule) {
                    Ok(())
                } else {
                    Err(format!("Rule {} is not applicable", rule))
                }
            }
            ReasonerOutput::Failure(failure) => Err(failure.reason),
        }
    }
}

/// Apply `tactic` to every open node below `node`.
///
/// Succeeds when the tactic succeeded on at least one of them.
pub fn on_all_pending<T: Tactic>(tactic: T) -> impl Tactic {
    move |tree: &mut ProofTree, node: NodeId, monitor: &dyn ProofMonitor| {
        let mut applied = false;
        let mut last_error = None;
        for open in tree.open_descendants(node) {
            if monitor.is_canceled() {
                return Err("Canceled".to_string());
            }
            match tactic.apply(tree, open, monitor) {
                Ok(()) => applied = true,
                Err(reason) => {
                    trace!(%reason, "Tactic failed on pending node");
                    last_error = Some(reason);
                }
            }
        }
        if applied {
            Ok(())
        } else {
            Err(last_error.unwrap_or_else(|| "No pending nodes".to_string()))
        }
    }
}

/// Try `tactics` in order until one succeeds.
pub fn first_success(tactics: Vec<Box<dyn Tactic>>) -> impl Tactic {
    move |tree: &mut ProofTree, node: NodeId, monitor: &dyn ProofMonitor| {
        let mut reasons = Vec::new();
        for tactic in &tactics {
            if monitor.is_canceled() {
                return Err("Canceled".to_string());
            }
            match tactic.apply(tree, node, monitor) {
                Ok(()) => return Ok(()),
                Err(reason) => reasons.push(reason),
            }
        }
        Err(format!("All tactics failed: {}", reasons.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Expression, Predicate, Type, TypeEnvironment};
    use crate::reasoner::{EmptyInput, NullMonitor};
    use crate::reasoners::{ConjI, Hyp, TrueGoal, CONJ_I_ID, HYP_ID, TRUE_GOAL_ID};
    use crate::sequent::Sequent;
    use std::sync::Mutex;

    fn x_lt(n: i64) -> Predicate {
        Predicate::lt(Expression::ident("x"), Expression::int(n))
    }

    fn tree() -> ProofTree {
        let mut env = TypeEnvironment::new();
        env.add_name("x", Type::Integer).unwrap();
        let seq = Sequent::builder(env)
            .selected(x_lt(1))
            .goal(Predicate::and([x_lt(1), Predicate::True, x_lt(1)]))
            .build()
            .unwrap();
        ProofTree::new(seq)
    }

    fn tac(reasoner: Arc<dyn Reasoner>) -> Box<dyn Tactic> {
        Box::new(reasoner_tac(reasoner, Arc::new(EmptyInput)))
    }

    #[test]
    fn test_reasoner_tac_applies_rule() {
        let mut tree = tree();
        let root = tree.root();
        assert!(tac(Arc::new(ConjI)).apply(&mut tree, root, &NullMonitor).is_ok());
        assert_eq!(tree.children(root).len(), 3);

        let err = tac(Arc::new(ConjI)).apply(&mut tree, root, &NullMonitor).unwrap_err();
        assert!(err.contains("already has a rule"));
    }

    #[test]
    fn test_reasoner_failure_is_reported() {
        let mut tree = tree();
        let root = tree.root();
        assert!(tac(Arc::new(TrueGoal)).apply(&mut tree, root, &NullMonitor).is_err());
        assert!(tree.root_node().is_open());
    }

    #[test]
    fn test_combinators_close_the_tree() {
        let mut tree = tree();
        let root = tree.root();
        tac(Arc::new(ConjI)).apply(&mut tree, root, &NullMonitor).unwrap();

        let close = on_all_pending(first_success(vec![
            tac(Arc::new(TrueGoal)),
            tac(Arc::new(Hyp)),
        ]));
        assert!(close.apply(&mut tree, root, &NullMonitor).is_ok());
        assert!(tree.is_closed());
        assert!(close.apply(&mut tree, root, &NullMonitor).is_err());
    }

    #[derive(Default)]
    struct TaskLog(Mutex<Vec<String>>);

    impl ProofMonitor for TaskLog {
        fn is_canceled(&self) -> bool {
            false
        }

        fn set_task(&self, name: &str) {
            self.0.lock().unwrap().push(name.to_string());
        }
    }

    #[test]
    fn test_reasoner_tac_names_the_task() {
        let mut tree = tree();
        let root = tree.root();
        let log = TaskLog::default();
        tac(Arc::new(ConjI)).apply(&mut tree, root, &log).unwrap();
        let close = on_all_pending(first_success(vec![
            tac(Arc::new(TrueGoal)),
            tac(Arc::new(Hyp)),
        ]));
        close.apply(&mut tree, root, &log).unwrap();

        // Both x<1 conjuncts try ⊤ goal before hyp.
        let tasks = log.0.lock().unwrap().clone();
        assert_eq!(
            tasks,
            vec![CONJ_I_ID, TRUE_GOAL_ID, HYP_ID, TRUE_GOAL_ID, TRUE_GOAL_ID, HYP_ID]
        );
    }
}
