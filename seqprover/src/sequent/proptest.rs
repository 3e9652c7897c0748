//! Property-based tests for sequent transformations.
//!
//! - No-op edits return the identical instance
//! - Hidden and selected hypotheses stay disjoint under any edit sequence
//! - Visibility edits never change the hypothesis set or the goal

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::formula::{Expression, Predicate, Type, TypeEnvironment};
    use crate::sequent::{HypothesisAction, Sequent};

    const POOL: i64 = 8;

    fn pred(n: i64) -> Predicate {
        Predicate::lt(Expression::ident("x"), Expression::int(n))
    }

    fn sequent(hyps: &[i64], selected: &[i64]) -> Sequent {
        let mut env = TypeEnvironment::new();
        env.add_name("x", Type::Integer).unwrap();
        let mut builder = Sequent::builder(env).goal(Predicate::False);
        for n in hyps {
            builder = builder.hypothesis(pred(*n));
        }
        for n in selected {
            builder = builder.selected(pred(*n));
        }
        builder.build().unwrap()
    }

    // Hypothesis indices, possibly naming predicates absent from the sequent
    fn subset() -> impl Strategy<Value = Vec<i64>> {
        prop::collection::vec(0..POOL, 0..5)
    }

    fn action() -> impl Strategy<Value = HypothesisAction> {
        let preds = || subset().prop_map(|ns| ns.into_iter().map(pred).collect::<Vec<_>>());
        prop_oneof![
            preds().prop_map(HypothesisAction::Select),
            preds().prop_map(HypothesisAction::Deselect),
            preds().prop_map(HypothesisAction::Hide),
            preds().prop_map(HypothesisAction::Show),
        ]
    }

    proptest! {
        /// Empty edits are identity operations.
        #[test]
        fn empty_edits_are_identity(hyps in subset(), selected in subset()) {
            let seq = sequent(&hyps, &selected);
            let none: Vec<Predicate> = Vec::new();
            prop_assert!(Sequent::ptr_eq(&seq, &seq.select_hypotheses(&none)));
            prop_assert!(Sequent::ptr_eq(&seq, &seq.deselect_hypotheses(&none)));
            prop_assert!(Sequent::ptr_eq(&seq, &seq.hide_hypotheses(&none)));
            prop_assert!(Sequent::ptr_eq(&seq, &seq.show_hypotheses(&none)));
            prop_assert!(Sequent::ptr_eq(&seq, &seq.modify(&[], &[], None).unwrap()));
            prop_assert!(Sequent::ptr_eq(&seq, &seq.perform_forward_inference(&[], &[], &[])));
        }

        /// Repeating an edit that already holds returns the same instance.
        #[test]
        fn idempotent_edits_are_identity(hyps in subset(), edit in action()) {
            let seq = sequent(&hyps, &[]);
            let once = edit.apply(&seq);
            let twice = edit.apply(&once);
            prop_assert!(Sequent::ptr_eq(&once, &twice));
        }

        /// Hidden and selected hypotheses never overlap.
        #[test]
        fn hidden_and_selected_stay_disjoint(
            hyps in subset(),
            selected in subset(),
            actions in prop::collection::vec(action(), 0..12)
        ) {
            let seq = HypothesisAction::apply_all(&actions, &sequent(&hyps, &selected));
            for hyp in seq.selected_hyps() {
                prop_assert!(!seq.is_hidden(hyp), "{} is both selected and hidden", hyp);
            }
            for hyp in seq.hidden_hyps() {
                prop_assert!(seq.contains_hypothesis(hyp));
            }
        }

        /// Visibility edits keep the hypotheses and the goal.
        #[test]
        fn visibility_edits_keep_content(
            hyps in subset(),
            actions in prop::collection::vec(action(), 0..12)
        ) {
            let seq = sequent(&hyps, &[]);
            let edited = HypothesisAction::apply_all(&actions, &seq);
            let before: Vec<&Predicate> = seq.hypotheses().collect();
            let after: Vec<&Predicate> = edited.hypotheses().collect();
            prop_assert_eq!(before, after);
            prop_assert_eq!(seq.goal(), edited.goal());
        }
    }
}
