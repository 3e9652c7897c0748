//! Propositional and quantifier reasoners.

use crate::formula::{FreeIdentifier, Predicate};
use crate::reasoner::{
    check_hypothesis, deserialize_as, make_failure, reasoner_desc, typed_input, EmptyInput,
    ProofMonitor, Reasoner, ReasonerInput, ReasonerInputReader, ReasonerOutput, SerializeError,
};
use crate::rule::{Antecedent, ProofRule, ProofRuleBuilder};
use crate::sequent::{HypothesisAction, Sequent};
use indexmap::IndexSet;
use std::sync::Arc;

use super::{ALL_I_ID, CONJ_E_ID, CONJ_I_ID, FALSE_HYP_ID, HYP_ID, IMP_I_ID, TRUE_GOAL_ID};

/// Input naming one hypothesis of the sequent.
#[derive(Debug, Clone, PartialEq, Eq, ReasonerInput)]
pub struct HypInput {
    pub pred: Predicate,
}

impl HypInput {
    pub fn new(pred: Predicate) -> Self {
        Self { pred }
    }
}

fn rule(
    reasoner: &dyn Reasoner,
    input: &Arc<dyn ReasonerInput>,
    display_name: &str,
) -> ProofRuleBuilder {
    ProofRule::builder(reasoner_desc(reasoner), Arc::clone(input)).display_name(display_name)
}

/// Discharges the goal `⊤`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrueGoal;

impl Reasoner for TrueGoal {
    fn id(&self) -> &str {
        TRUE_GOAL_ID
    }

    fn apply(
        &self,
        seq: &Sequent,
        input: &Arc<dyn ReasonerInput>,
        _monitor: &dyn ProofMonitor,
    ) -> ReasonerOutput {
        if seq.goal() != &Predicate::True {
            return make_failure(self, input, "Goal is not ⊤");
        }
        ReasonerOutput::Rule(rule(self, input, "⊤ goal").goal(Predicate::True).build())
    }

    fn deserialize_input(
        &self,
        reader: &dyn ReasonerInputReader,
    ) -> Result<Arc<dyn ReasonerInput>, SerializeError> {
        deserialize_as::<EmptyInput>(reader)
    }
}

/// Discharges a goal that is also a hypothesis.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hyp;

impl Reasoner for Hyp {
    fn id(&self) -> &str {
        HYP_ID
    }

    fn apply(
        &self,
        seq: &Sequent,
        input: &Arc<dyn ReasonerInput>,
        _monitor: &dyn ProofMonitor,
    ) -> ReasonerOutput {
        let goal = seq.goal();
        if !seq.contains_hypothesis(goal) {
            return make_failure(self, input, "Goal not in hypotheses");
        }
        ReasonerOutput::Rule(
            rule(self, input, "hyp")
                .goal(goal.clone())
                .needed_hyp(goal.clone())
                .build(),
        )
    }

    fn deserialize_input(
        &self,
        reader: &dyn ReasonerInputReader,
    ) -> Result<Arc<dyn ReasonerInput>, SerializeError> {
        deserialize_as::<EmptyInput>(reader)
    }
}

/// Discharges any goal when `⊥` is a hypothesis.
#[derive(Debug, Clone, Copy, Default)]
pub struct FalseHyp;

impl Reasoner for FalseHyp {
    fn id(&self) -> &str {
        FALSE_HYP_ID
    }

    fn apply(
        &self,
        seq: &Sequent,
        input: &Arc<dyn ReasonerInput>,
        _monitor: &dyn ProofMonitor,
    ) -> ReasonerOutput {
        if let Err(reason) = check_hypothesis(seq, &Predicate::False) {
            return make_failure(self, input, reason);
        }
        ReasonerOutput::Rule(rule(self, input, "⊥ hyp").needed_hyp(Predicate::False).build())
    }

    fn deserialize_input(
        &self,
        reader: &dyn ReasonerInputReader,
    ) -> Result<Arc<dyn ReasonerInput>, SerializeError> {
        deserialize_as::<EmptyInput>(reader)
    }
}

/// Splits a conjunctive hypothesis into its conjuncts and hides it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConjE;

impl Reasoner for ConjE {
    fn id(&self) -> &str {
        CONJ_E_ID
    }

    fn apply(
        &self,
        seq: &Sequent,
        input: &Arc<dyn ReasonerInput>,
        _monitor: &dyn ProofMonitor,
    ) -> ReasonerOutput {
        let hyp = match typed_input::<HypInput>(input) {
            Ok(typed) => &typed.pred,
            Err(reason) => return make_failure(self, input, reason),
        };
        if let Err(reason) = check_hypothesis(seq, hyp) {
            return make_failure(self, input, reason);
        }
        let Some(conjuncts) = hyp.conjuncts() else {
            return make_failure(self, input, format!("Hypothesis is not a conjunction: {}", hyp));
        };

        let antecedent = Antecedent::inherit_goal()
            .with_added_hyps(conjuncts.iter().cloned())
            .with_hyp_action(HypothesisAction::hide([hyp.clone()]));
        ReasonerOutput::Rule(
            rule(self, input, "∧ hyp")
                .needed_hyp(hyp.clone())
                .antecedent(antecedent)
                .build(),
        )
    }

    fn deserialize_input(
        &self,
        reader: &dyn ReasonerInputReader,
    ) -> Result<Arc<dyn ReasonerInput>, SerializeError> {
        deserialize_as::<HypInput>(reader)
    }
}

/// Splits a conjunctive goal into one antecedent per conjunct.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConjI;

impl Reasoner for ConjI {
    fn id(&self) -> &str {
        CONJ_I_ID
    }

    fn apply(
        &self,
        seq: &Sequent,
        input: &Arc<dyn ReasonerInput>,
        _monitor: &dyn ProofMonitor,
    ) -> ReasonerOutput {
        let goal = seq.goal();
        let Some(conjuncts) = goal.conjuncts() else {
            return make_failure(self, input, "Goal is not a conjunction");
        };
        ReasonerOutput::Rule(
            rule(self, input, "∧ goal")
                .goal(goal.clone())
                .antecedents(conjuncts.iter().cloned().map(Antecedent::new))
                .build(),
        )
    }

    fn deserialize_input(
        &self,
        reader: &dyn ReasonerInputReader,
    ) -> Result<Arc<dyn ReasonerInput>, SerializeError> {
        deserialize_as::<EmptyInput>(reader)
    }
}

/// Moves the left side of an implication goal into the hypotheses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImpI;

impl Reasoner for ImpI {
    fn id(&self) -> &str {
        IMP_I_ID
    }

    fn apply(
        &self,
        seq: &Sequent,
        input: &Arc<dyn ReasonerInput>,
        _monitor: &dyn ProofMonitor,
    ) -> ReasonerOutput {
        let goal = seq.goal();
        let Predicate::Implies(lhs, rhs) = goal else {
            return make_failure(self, input, "Goal is not an implication");
        };
        let antecedent =
            Antecedent::new(rhs.as_ref().clone()).with_added_hyps([lhs.as_ref().clone()]);
        ReasonerOutput::Rule(
            rule(self, input, "⇒ goal")
                .goal(goal.clone())
                .antecedent(antecedent)
                .build(),
        )
    }

    fn deserialize_input(
        &self,
        reader: &dyn ReasonerInputReader,
    ) -> Result<Arc<dyn ReasonerInput>, SerializeError> {
        deserialize_as::<EmptyInput>(reader)
    }
}

/// Instantiates a universal goal with fresh free identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllI;

impl Reasoner for AllI {
    fn id(&self) -> &str {
        ALL_I_ID
    }

    fn apply(
        &self,
        seq: &Sequent,
        input: &Arc<dyn ReasonerInput>,
        _monitor: &dyn ProofMonitor,
    ) -> ReasonerOutput {
        let goal = seq.goal();
        let Predicate::Forall { bound, .. } = goal else {
            return make_failure(self, input, "Goal is not universally quantified");
        };

        // Fresh names must not capture anything already in the goal
        let env = seq.type_environment();
        let mut avoid: IndexSet<String> = goal.identifier_names();
        let fresh: Vec<FreeIdentifier> = bound
            .iter()
            .map(|decl| {
                let name = env.fresh_name(&decl.name, &avoid);
                avoid.insert(name.clone());
                FreeIdentifier::new(name, decl.ty.clone())
            })
            .collect();
        let Some(body) = goal.instantiate(&fresh) else {
            return make_failure(self, input, "Could not instantiate goal");
        };

        ReasonerOutput::Rule(
            rule(self, input, "∀ goal")
                .goal(goal.clone())
                .antecedent(Antecedent::new(body).with_free_idents(fresh))
                .build(),
        )
    }

    fn deserialize_input(
        &self,
        reader: &dyn ReasonerInputReader,
    ) -> Result<Arc<dyn ReasonerInput>, SerializeError> {
        deserialize_as::<EmptyInput>(reader)
    }
}
