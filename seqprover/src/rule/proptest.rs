//! Property-based tests for rule application.
//!
//! - A rule applies only if every antecedent can be generated
//! - A successful application yields one child per antecedent, in order

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::sync::Arc;

    use crate::formula::{Expression, FreeIdentifier, Predicate, Type, TypeEnvironment};
    use crate::reasoner::{EmptyInput, ReasonerDesc};
    use crate::rule::{Antecedent, ProofRule};
    use crate::sequent::Sequent;

    fn x_lt(n: i64) -> Predicate {
        Predicate::lt(Expression::ident("x"), Expression::int(n))
    }

    fn seq() -> Sequent {
        let mut env = TypeEnvironment::new();
        env.add_name("x", Type::Integer).unwrap();
        Sequent::builder(env)
            .selected(x_lt(0))
            .goal(x_lt(100))
            .build()
            .unwrap()
    }

    // (antecedent, whether it can be generated on `seq()`)
    fn antecedent() -> impl Strategy<Value = (Antecedent, bool)> {
        prop_oneof![
            (0i64..50).prop_map(|n| {
                (Antecedent::new(x_lt(n)).with_added_hyps([x_lt(n + 1)]), true)
            }),
            (0i64..50).prop_map(|n| (Antecedent::new(x_lt(n)), true)),
            Just((
                Antecedent::new(x_lt(1))
                    .with_free_idents([FreeIdentifier::new("x", Type::Integer)]),
                false
            )),
            Just((
                Antecedent::new(x_lt(1))
                    .with_added_hyps([Predicate::lt(Expression::ident("z"), Expression::int(1))]),
                false
            )),
        ]
    }

    proptest! {
        /// Application succeeds exactly when every antecedent does.
        #[test]
        fn application_is_all_or_nothing(
            antecedents in prop::collection::vec(antecedent(), 0..6)
        ) {
            let expected_ok = antecedents.iter().all(|(_, ok)| *ok);
            let rule = ProofRule::builder(ReasonerDesc::new("p", None), Arc::new(EmptyInput))
                .goal(x_lt(100))
                .antecedents(antecedents.iter().map(|(a, _)| a.clone()))
                .build();

            let s = seq();
            match rule.apply(&s) {
                Ok(children) => {
                    prop_assert!(expected_ok);
                    prop_assert_eq!(children.len(), antecedents.len());
                    for (child, (ante, _)) in children.iter().zip(&antecedents) {
                        prop_assert_eq!(Some(child.goal()), ante.goal());
                    }
                }
                Err(err) => {
                    prop_assert!(!expected_ok, "unexpected failure: {}", err);
                    prop_assert!(!err.is_ill_formed());
                }
            }
            prop_assert_eq!(s, seq());
        }
    }
}
