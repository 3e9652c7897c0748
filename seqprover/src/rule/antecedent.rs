//! Antecedents: the child obligations of a rule.

use crate::formula::{FreeIdentifier, Predicate};
use crate::rule::RuleError;
use crate::sequent::{HypothesisAction, Sequent};
use serde::{Deserialize, Serialize};

/// One child obligation produced by a rule.
///
/// A missing goal stands for the goal the parent rule was applied to; that
/// is only allowed in rules without a goal of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Antecedent {
    goal: Option<Predicate>,
    added_hyps: Vec<Predicate>,
    added_free_idents: Vec<FreeIdentifier>,
    hyp_actions: Vec<HypothesisAction>,
}

impl Antecedent {
    /// Antecedent with an explicit goal.
    pub fn new(goal: Predicate) -> Self {
        Self {
            goal: Some(goal),
            ..Self::default()
        }
    }

    /// Antecedent inheriting the goal the rule is applied to.
    pub fn inherit_goal() -> Self {
        Self::default()
    }

    pub fn with_added_hyps(mut self, hyps: impl IntoIterator<Item = Predicate>) -> Self {
        for hyp in hyps {
            if !self.added_hyps.contains(&hyp) {
                self.added_hyps.push(hyp);
            }
        }
        self
    }

    pub fn with_free_idents(mut self, idents: impl IntoIterator<Item = FreeIdentifier>) -> Self {
        self.added_free_idents.extend(idents);
        self
    }

    pub fn with_hyp_action(mut self, action: HypothesisAction) -> Self {
        self.hyp_actions.push(action);
        self
    }

    pub fn with_hyp_actions(mut self, actions: impl IntoIterator<Item = HypothesisAction>) -> Self {
        self.hyp_actions.extend(actions);
        self
    }

    pub fn goal(&self) -> Option<&Predicate> {
        self.goal.as_ref()
    }

    pub fn added_hyps(&self) -> &[Predicate] {
        &self.added_hyps
    }

    pub fn added_free_idents(&self) -> &[FreeIdentifier] {
        &self.added_free_idents
    }

    pub fn hyp_actions(&self) -> &[HypothesisAction] {
        &self.hyp_actions
    }

    /// Reject actions that refer to hypotheses this antecedent adds.
    pub(crate) fn check_well_formed(&self) -> Result<(), RuleError> {
        let touched = self
            .hyp_actions
            .iter()
            .flat_map(|action| action.referenced_hyps())
            .find(|hyp| self.added_hyps.contains(hyp));
        match touched {
            Some(hyp) => Err(RuleError::IllFormed(format!(
                "hypothesis action refers to added hypothesis '{}'",
                hyp
            ))),
            None => Ok(()),
        }
    }

    /// Child sequent of `seq`.
    ///
    /// `instantiation` is the goal of `seq` when the rule has no goal of its
    /// own; exactly one of it and this antecedent's goal must be present.
    pub(crate) fn generate(
        &self,
        seq: &Sequent,
        instantiation: Option<&Predicate>,
    ) -> Result<Sequent, RuleError> {
        let goal = match (&self.goal, instantiation) {
            (Some(goal), None) => goal,
            (None, Some(goal)) => goal,
            (Some(_), Some(_)) => {
                return Err(RuleError::IllFormed(
                    "antecedent has a goal but the rule has none".to_string(),
                ))
            }
            (None, None) => {
                return Err(RuleError::IllFormed(
                    "antecedent has no goal but the rule has one".to_string(),
                ))
            }
        };
        let child = seq.modify(&self.added_free_idents, &self.added_hyps, Some(goal))?;
        Ok(HypothesisAction::apply_all(&self.hyp_actions, &child))
    }
}
