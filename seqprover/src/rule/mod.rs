//! Proof rules.
//!
//! A [`ProofRule`] is the atomic step of a proof: a precondition (goal and
//! needed hypotheses) and zero or more [`Antecedent`]s. Applying a rule to a
//! sequent yields one child sequent per antecedent, or fails as a whole.
//!
//! A rule without a goal matches any sequent; its antecedents then inherit
//! the goal of the sequent the rule is applied to.
//!
//! ```rust
//! use std::sync::Arc;
//! use seqprover::formula::{Expression, Predicate, Type, TypeEnvironment};
//! use seqprover::reasoner::{EmptyInput, ReasonerDesc};
//! use seqprover::rule::{Antecedent, ProofRule};
//! use seqprover::sequent::Sequent;
//!
//! let mut env = TypeEnvironment::new();
//! env.add_name("x", Type::Integer).unwrap();
//! let p = Predicate::lt(Expression::ident("x"), Expression::int(1));
//! let seq = Sequent::builder(env).goal(p.clone()).build().unwrap();
//!
//! let rule = ProofRule::builder(ReasonerDesc::new("cut", None), Arc::new(EmptyInput))
//!     .antecedent(Antecedent::inherit_goal().with_added_hyps([Predicate::True]))
//!     .build();
//! let children = rule.apply(&seq).unwrap();
//! assert_eq!(children.len(), 1);
//! assert!(children[0].is_selected(&Predicate::True));
//! ```

mod antecedent;
#[cfg(test)]
mod proptest;

pub use antecedent::Antecedent;

use crate::confidence::Confidence;
use crate::error::Error;
use crate::formula::Predicate;
use crate::reasoner::{ReasonerDesc, ReasonerInput};
use crate::sequent::Sequent;
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Why a rule could not be applied to a sequent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Needed hypotheses are missing: {}", join(.0))]
    MissingNeededHypotheses(Vec<Predicate>),

    #[error("Rule goal '{expected}' does not match sequent goal '{actual}'")]
    GoalMismatch { expected: Predicate, actual: Predicate },

    #[error("Ill-formed rule: {0}")]
    IllFormed(String),

    #[error("Name clash on '{name}'")]
    NameClash { name: String },

    #[error("'{predicate}' does not type-check")]
    TypeCheck { predicate: String },
}

impl RuleError {
    /// Whether the rule itself is defective, as opposed to inapplicable.
    pub fn is_ill_formed(&self) -> bool {
        matches!(self, Self::IllFormed(_))
    }
}

impl From<Error> for RuleError {
    fn from(err: Error) -> Self {
        match err {
            Error::NameClash { name } => Self::NameClash { name },
            Error::TypeCheck { predicate } => Self::TypeCheck { predicate },
            other => Self::IllFormed(other.to_string()),
        }
    }
}

fn join(preds: &[Predicate]) -> String {
    preds
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// An immutable proof rule. Clones share the same data.
#[derive(Clone)]
pub struct ProofRule(Arc<RuleData>);

struct RuleData {
    generated_by: ReasonerDesc,
    generated_using: Arc<dyn ReasonerInput>,
    display_name: String,
    goal: Option<Predicate>,
    needed_hyps: IndexSet<Predicate>,
    confidence: Confidence,
    antecedents: Vec<Antecedent>,
}

impl ProofRule {
    /// Start a rule generated by `generated_by` from `input`.
    pub fn builder(generated_by: ReasonerDesc, input: Arc<dyn ReasonerInput>) -> ProofRuleBuilder {
        ProofRuleBuilder::new(generated_by, input)
    }

    /// Whether two handles share the same rule.
    pub fn ptr_eq(a: &ProofRule, b: &ProofRule) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn generated_by(&self) -> &ReasonerDesc {
        &self.0.generated_by
    }

    pub fn generated_using(&self) -> &Arc<dyn ReasonerInput> {
        &self.0.generated_using
    }

    pub fn display_name(&self) -> &str {
        &self.0.display_name
    }

    /// Goal the rule applies to; `None` matches any goal.
    pub fn goal(&self) -> Option<&Predicate> {
        self.0.goal.as_ref()
    }

    pub fn needed_hyps(&self) -> &IndexSet<Predicate> {
        &self.0.needed_hyps
    }

    pub fn confidence(&self) -> Confidence {
        self.0.confidence
    }

    pub fn antecedents(&self) -> &[Antecedent] {
        &self.0.antecedents
    }

    /// Check the confidence, the goal shape of the antecedents and their
    /// actions.
    pub fn check_well_formed(&self) -> Result<(), RuleError> {
        if self.0.confidence.is_pending() {
            return Err(RuleError::IllFormed(
                "rule confidence must be above pending".to_string(),
            ));
        }
        for antecedent in &self.0.antecedents {
            match (&self.0.goal, antecedent.goal()) {
                (Some(_), None) => {
                    return Err(RuleError::IllFormed(
                        "antecedent without goal in a rule with a goal".to_string(),
                    ))
                }
                (None, Some(_)) => {
                    return Err(RuleError::IllFormed(
                        "antecedent with a goal in a rule without goal".to_string(),
                    ))
                }
                _ => {}
            }
            antecedent.check_well_formed()?;
        }
        Ok(())
    }

    /// Apply the rule to `seq`, returning one child per antecedent.
    ///
    /// Nothing is produced unless every antecedent can be generated.
    pub fn apply(&self, seq: &Sequent) -> Result<Vec<Sequent>, RuleError> {
        let missing: Vec<Predicate> = self
            .0
            .needed_hyps
            .iter()
            .filter(|hyp| !seq.contains_hypothesis(hyp))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(RuleError::MissingNeededHypotheses(missing));
        }

        let instantiation = match &self.0.goal {
            Some(goal) if goal != seq.goal() => {
                return Err(RuleError::GoalMismatch {
                    expected: goal.clone(),
                    actual: seq.goal().clone(),
                })
            }
            Some(_) => None,
            None => Some(seq.goal()),
        };

        self.check_well_formed()?;
        self.0
            .antecedents
            .iter()
            .map(|antecedent| antecedent.generate(seq, instantiation))
            .collect()
    }

    /// Structural equality, ignoring the identity of the generating input.
    pub fn deep_equals(&self, other: &ProofRule) -> bool {
        if ProofRule::ptr_eq(self, other) {
            return true;
        }
        let (a, b) = (&*self.0, &*other.0);
        a.generated_by == b.generated_by
            && a.display_name == b.display_name
            && a.goal == b.goal
            && a.needed_hyps == b.needed_hyps
            && a.confidence == b.confidence
            && a.antecedents == b.antecedents
    }
}

impl fmt::Debug for ProofRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofRule")
            .field("generated_by", &self.0.generated_by)
            .field("display_name", &self.0.display_name)
            .field("goal", &self.0.goal)
            .field("needed_hyps", &self.0.needed_hyps)
            .field("confidence", &self.0.confidence)
            .field("antecedents", &self.0.antecedents)
            .finish()
    }
}

impl fmt::Display for ProofRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.display_name)
    }
}

/// Builder for [`ProofRule`].
pub struct ProofRuleBuilder {
    generated_by: ReasonerDesc,
    generated_using: Arc<dyn ReasonerInput>,
    display_name: Option<String>,
    goal: Option<Predicate>,
    needed_hyps: IndexSet<Predicate>,
    confidence: Confidence,
    antecedents: Vec<Antecedent>,
}

impl ProofRuleBuilder {
    pub fn new(generated_by: ReasonerDesc, input: Arc<dyn ReasonerInput>) -> Self {
        Self {
            generated_by,
            generated_using: input,
            display_name: None,
            goal: None,
            needed_hyps: IndexSet::new(),
            confidence: Confidence::DISCHARGED_MAX,
            antecedents: Vec::new(),
        }
    }

    /// Name shown to users. Defaults to the reasoner id.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn goal(mut self, goal: Predicate) -> Self {
        self.goal = Some(goal);
        self
    }

    pub fn needed_hyp(mut self, hyp: Predicate) -> Self {
        self.needed_hyps.insert(hyp);
        self
    }

    pub fn needed_hyps(mut self, hyps: impl IntoIterator<Item = Predicate>) -> Self {
        self.needed_hyps.extend(hyps);
        self
    }

    /// Confidence of the rule. [`Confidence::PENDING`] makes the rule
    /// ill-formed, so it is refused by [`ProofRule::apply`].
    pub fn confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn antecedent(mut self, antecedent: Antecedent) -> Self {
        self.antecedents.push(antecedent);
        self
    }

    pub fn antecedents(mut self, antecedents: impl IntoIterator<Item = Antecedent>) -> Self {
        self.antecedents.extend(antecedents);
        self
    }

    pub fn build(self) -> ProofRule {
        let display_name = self
            .display_name
            .unwrap_or_else(|| self.generated_by.id.clone());
        ProofRule(Arc::new(RuleData {
            generated_by: self.generated_by,
            generated_using: self.generated_using,
            display_name,
            goal: self.goal,
            needed_hyps: self.needed_hyps,
            confidence: self.confidence,
            antecedents: self.antecedents,
        }))
    }
}
