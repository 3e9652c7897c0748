//! Proof dependencies and the reuse check.
//!
//! The dependencies of a closed proof record what the proof actually relies
//! on: the goal it proves, the hypotheses it consumes, the free identifiers
//! those mention and the identifiers it introduces itself. A proof can be
//! replayed on another sequent when that sequent provides all of them (see
//! [`ProofDependencies::is_reusable`]).
//!
//! Dependencies are computed bottom-up. Each node starts from the
//! dependencies of its children and undoes, per antecedent, what the rule
//! added to the child sequent.

use crate::formula::{FreeIdentifier, Predicate, TypeEnvironment};
use crate::rule::ProofRule;
use crate::sequent::Sequent;
use indexmap::IndexSet;
use tracing::trace;

/// Dependencies of a proof (sub)tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofDependencies {
    has_deps: bool,
    goal: Option<Predicate>,
    used_hypotheses: IndexSet<Predicate>,
    used_free_idents: TypeEnvironment,
    introduced_free_idents: IndexSet<String>,
}

impl ProofDependencies {
    /// Dependencies of a proof that constrains nothing, such as an open node.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether anything was recorded.
    pub fn has_deps(&self) -> bool {
        self.has_deps
    }

    /// Goal the proof discharges, when it depends on it.
    pub fn goal(&self) -> Option<&Predicate> {
        self.goal.as_ref()
    }

    pub fn used_hypotheses(&self) -> &IndexSet<Predicate> {
        &self.used_hypotheses
    }

    pub fn used_free_idents(&self) -> &TypeEnvironment {
        &self.used_free_idents
    }

    pub fn introduced_free_idents(&self) -> &IndexSet<String> {
        &self.introduced_free_idents
    }

    /// Whether a proof with these dependencies can be replayed on `seq`.
    ///
    /// The goal must match, every used hypothesis must be present, every
    /// used identifier must be declared with the same type and no
    /// introduced identifier may already be declared.
    pub fn is_reusable(&self, seq: &Sequent) -> bool {
        if !self.has_deps {
            return true;
        }
        if self.goal.as_ref().is_some_and(|goal| goal != seq.goal()) {
            return false;
        }
        if !seq.contains_hypotheses(&self.used_hypotheses) {
            return false;
        }
        let env = seq.type_environment();
        if !env.contains_all(&self.used_free_idents) {
            return false;
        }
        let clashes = env.clashes(self.introduced_free_idents.iter().map(String::as_str));
        if !clashes.is_empty() {
            trace!(?clashes, "Introduced identifiers are already declared");
            return false;
        }
        true
    }

    /// Builder seeded with these dependencies.
    pub fn to_builder(&self) -> ProofDependenciesBuilder {
        ProofDependenciesBuilder {
            goal: self.goal.clone(),
            used_hypotheses: self.used_hypotheses.clone(),
            used_free_idents: self.used_free_idents.clone(),
            introduced_free_idents: self.introduced_free_idents.clone(),
        }
    }
}

/// Accumulates dependencies while walking a proof upwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofDependenciesBuilder {
    goal: Option<Predicate>,
    used_hypotheses: IndexSet<Predicate>,
    used_free_idents: TypeEnvironment,
    introduced_free_idents: IndexSet<String>,
}

impl ProofDependenciesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn goal(&self) -> Option<&Predicate> {
        self.goal.as_ref()
    }

    pub fn set_goal(&mut self, goal: Option<Predicate>) {
        self.goal = goal;
    }

    pub fn used_hypotheses(&self) -> &IndexSet<Predicate> {
        &self.used_hypotheses
    }

    pub fn used_free_idents(&self) -> &TypeEnvironment {
        &self.used_free_idents
    }

    pub fn introduced_free_idents(&self) -> &IndexSet<String> {
        &self.introduced_free_idents
    }

    pub fn add_used_hypothesis(&mut self, hyp: Predicate) {
        self.used_hypotheses.insert(hyp);
    }

    /// Forget a used hypothesis. Returns whether it was recorded.
    pub fn remove_used_hypothesis(&mut self, hyp: &Predicate) -> bool {
        self.used_hypotheses.shift_remove(hyp)
    }

    /// Record a used free identifier.
    pub fn add_used_free_ident(&mut self, ident: &FreeIdentifier) {
        if self.used_free_idents.get(&ident.name) != Some(&ident.ty) {
            self.used_free_idents.set(ident.name.clone(), ident.ty.clone());
        }
    }

    /// Record the free identifiers of `pred`, typed by `type_env`.
    pub fn add_free_idents_of(&mut self, pred: &Predicate, type_env: &TypeEnvironment) {
        for ident in type_env.free_identifiers_of(pred) {
            self.add_used_free_ident(&ident);
        }
    }

    /// Forget a used identifier. Returns whether it was recorded.
    pub fn remove_used_free_ident(&mut self, name: &str) -> bool {
        self.used_free_idents.remove(name).is_some()
    }

    pub fn add_introduced_free_ident(&mut self, name: &str) {
        self.introduced_free_idents.insert(name.to_string());
    }

    /// Union the hypotheses and identifiers of `other` into this builder.
    /// The goal is left untouched.
    pub fn merge(&mut self, other: ProofDependenciesBuilder) {
        self.used_hypotheses.extend(other.used_hypotheses);
        self.used_free_idents.merge(&other.used_free_idents);
        self.introduced_free_idents
            .extend(other.introduced_free_idents);
    }

    pub fn finished(self) -> ProofDependencies {
        ProofDependencies {
            has_deps: true,
            goal: self.goal,
            used_hypotheses: self.used_hypotheses,
            used_free_idents: self.used_free_idents,
            introduced_free_idents: self.introduced_free_idents,
        }
    }
}

/// Dependencies of a node closed by `rule`.
///
/// `children` pairs the dependencies of each child with the child's
/// sequent, in antecedent order.
pub(crate) fn rule_dependencies(
    rule: &ProofRule,
    seq: &Sequent,
    children: &[(&ProofDependencies, &Sequent)],
) -> ProofDependencies {
    let mut result = ProofDependenciesBuilder::new();
    let mut goal_instantiation: Option<Predicate> = None;

    for (antecedent, (child_deps, child_seq)) in rule.antecedents().iter().zip(children) {
        let mut deps = child_deps.to_builder();
        let env = child_seq.type_environment();

        // Actions ran last when the child was generated, so undo them first
        for action in antecedent.hyp_actions().iter().rev() {
            action.collect_dependencies(&mut deps, env);
        }
        for hyp in antecedent.added_hyps() {
            deps.remove_used_hypothesis(hyp);
        }
        match antecedent.goal() {
            Some(goal) => deps.add_free_idents_of(goal, env),
            None => {
                if let Some(goal) = deps.goal.take() {
                    debug_assert!(
                        goal_instantiation.as_ref().map_or(true, |g| *g == goal),
                        "antecedents disagree on the goal instantiation"
                    );
                    goal_instantiation = Some(goal);
                }
            }
        }
        for hyp in antecedent.added_hyps() {
            deps.add_free_idents_of(hyp, env);
        }
        for ident in antecedent.added_free_idents() {
            deps.remove_used_free_ident(&ident.name);
            deps.add_introduced_free_ident(&ident.name);
        }
        result.merge(deps);
    }

    let env = seq.type_environment();
    match rule.goal() {
        Some(goal) => {
            result.add_free_idents_of(goal, env);
            result.goal = Some(goal.clone());
        }
        None => {
            if let Some(goal) = &goal_instantiation {
                result.add_free_idents_of(goal, env);
            }
            result.goal = goal_instantiation;
        }
    }
    for hyp in rule.needed_hyps() {
        result.add_free_idents_of(hyp, env);
        result.add_used_hypothesis(hyp.clone());
    }
    result.finished()
}
