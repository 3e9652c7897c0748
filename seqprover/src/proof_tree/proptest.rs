//! Property-based tests for proof tree status.
//!
//! - A node is closed exactly when its subtree has no open node
//! - The confidence of a closed tree is the minimum over its rules
//! - Pruning reopens the node and every ancestor

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::sync::Arc;

    use crate::confidence::Confidence;
    use crate::formula::{Expression, Predicate, Type, TypeEnvironment};
    use crate::proof_tree::ProofTree;
    use crate::reasoner::{EmptyInput, ReasonerDesc};
    use crate::rule::{Antecedent, ProofRule};
    use crate::sequent::Sequent;

    fn x_lt(n: i64) -> Predicate {
        Predicate::lt(Expression::ident("x"), Expression::int(n))
    }

    fn root_seq() -> Sequent {
        let mut env = TypeEnvironment::new();
        env.add_name("x", Type::Integer).unwrap();
        Sequent::builder(env).goal(x_lt(0)).build().unwrap()
    }

    #[derive(Debug, Clone)]
    enum Step {
        Split { pick: usize, width: usize },
        Close { pick: usize, confidence: u32 },
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (any::<usize>(), 1usize..3).prop_map(|(pick, width)| Step::Split { pick, width }),
            (any::<usize>(), 1u32..=1000)
                .prop_map(|(pick, confidence)| Step::Close { pick, confidence }),
        ]
    }

    /// Run `steps` on a fresh tree; returns the tree and every confidence
    /// used by a rule that was applied.
    fn build(steps: &[Step]) -> (ProofTree, Vec<Confidence>) {
        let mut tree = ProofTree::new(root_seq());
        let mut used = Vec::new();
        let mut next_goal = 1;
        for step in steps {
            let open = tree.open_descendants(tree.root());
            if open.is_empty() {
                break;
            }
            let (pick, antecedents, confidence) = match step {
                Step::Split { pick, width } => {
                    let antecedents: Vec<Antecedent> = (0..*width)
                        .map(|i| Antecedent::new(x_lt(next_goal + i as i64)))
                        .collect();
                    next_goal += *width as i64;
                    (*pick, antecedents, Confidence::DISCHARGED_MAX)
                }
                Step::Close { pick, confidence } => {
                    let confidence = Confidence::new(*confidence).unwrap();
                    (*pick, Vec::new(), confidence)
                }
            };
            let node = open[pick % open.len()];
            let goal = tree.node(node).unwrap().sequent().goal().clone();
            let rule = ProofRule::builder(ReasonerDesc::new("p", None), Arc::new(EmptyInput))
                .goal(goal)
                .confidence(confidence)
                .antecedents(antecedents)
                .build();
            assert!(tree.apply_rule(node, &rule));
            used.push(confidence);
        }
        (tree, used)
    }

    proptest! {
        /// Closed status agrees with the absence of open descendants.
        #[test]
        fn closed_iff_no_open_descendant(steps in prop::collection::vec(step(), 0..20)) {
            let (tree, _) = build(&steps);
            let mut stack = vec![tree.root()];
            while let Some(id) = stack.pop() {
                let node = tree.node(id).unwrap();
                prop_assert_eq!(node.is_closed(), tree.open_descendants(id).is_empty());
                prop_assert_eq!(node.is_closed(), !node.confidence().is_pending());
                stack.extend(node.children().iter().copied());
            }
        }

        /// A closed tree has the confidence of its weakest rule.
        #[test]
        fn confidence_is_minimum_of_rules(steps in prop::collection::vec(step(), 0..20)) {
            let (tree, used) = build(&steps);
            if tree.is_closed() {
                prop_assert_eq!(Some(tree.confidence()), used.iter().copied().min());
            } else {
                prop_assert_eq!(tree.confidence(), Confidence::PENDING);
            }
        }

        /// Pruning any node with a rule leaves it and its ancestors pending.
        #[test]
        fn pruning_reopens_ancestors(
            steps in prop::collection::vec(step(), 1..20),
            pick in any::<usize>(),
        ) {
            let (mut tree, _) = build(&steps);
            let mut with_rule = Vec::new();
            let mut stack = vec![tree.root()];
            while let Some(id) = stack.pop() {
                if !tree.node(id).unwrap().is_open() {
                    with_rule.push(id);
                }
                stack.extend(tree.children(id).iter().copied());
            }
            prop_assume!(!with_rule.is_empty());

            let node = with_rule[pick % with_rule.len()];
            prop_assert!(tree.prune_children(node).is_some());
            prop_assert!(tree.node(node).unwrap().is_open());
            let mut current = Some(node);
            while let Some(id) = current {
                prop_assert!(!tree.node(id).unwrap().is_closed());
                current = tree.parent(id);
            }
        }
    }
}
