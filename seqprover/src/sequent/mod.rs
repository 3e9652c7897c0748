//! Immutable prover sequents with structural sharing.
//!
//! A [`Sequent`] is a goal together with its hypotheses and type
//! environment. Sequents are values: every transformation returns a new
//! sequent sharing the untouched hypothesis collections with its source, or
//! the very same instance when nothing changed. Callers compare with
//! [`Sequent::ptr_eq`] to short-circuit downstream work.
//!
//! Hypotheses are split into:
//!
//! - **global**: the hypotheses of the root sequent, shared by every sequent
//!   derived from it
//! - **local**: hypotheses added on top of the global ones
//! - **hidden** / **selected**: disjoint visibility subsets of global ∪ local
//!
//! ## Example
//!
//! ```rust
//! use seqprover::formula::{Expression, Predicate, Type, TypeEnvironment};
//! use seqprover::sequent::Sequent;
//!
//! let mut env = TypeEnvironment::new();
//! env.add_name("x", Type::Integer).unwrap();
//! let h = Predicate::lt(Expression::ident("x"), Expression::int(3));
//!
//! let seq = Sequent::builder(env)
//!     .selected(h.clone())
//!     .goal(Predicate::le(Expression::ident("x"), Expression::int(3)))
//!     .build()
//!     .unwrap();
//!
//! let hidden = seq.hide_hypotheses([&h]);
//! assert!(hidden.is_hidden(&h));
//! assert!(!hidden.is_selected(&h));
//! assert!(Sequent::ptr_eq(&seq, &seq.show_hypotheses([&h])));
//! ```

pub mod hyp_action;
#[cfg(test)]
mod proptest;

pub use hyp_action::HypothesisAction;

use crate::error::{Error, Result};
use crate::formula::{FreeIdentifier, Predicate, TypeEnvironment};
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

type HypSet = Arc<IndexSet<Predicate>>;

/// An immutable sequent.
#[derive(Clone)]
pub struct Sequent(Arc<SequentData>);

#[derive(Debug)]
struct SequentData {
    type_env: TypeEnvironment,
    global_hyps: HypSet,
    local_hyps: HypSet,
    hidden: HypSet,
    selected: HypSet,
    goal: Predicate,
}

impl Sequent {
    /// Start building a root sequent over the given type environment.
    pub fn builder(type_env: TypeEnvironment) -> SequentBuilder {
        SequentBuilder::new(type_env)
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(a: &Sequent, b: &Sequent) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// The type environment.
    pub fn type_environment(&self) -> &TypeEnvironment {
        &self.0.type_env
    }

    /// The goal.
    pub fn goal(&self) -> &Predicate {
        &self.0.goal
    }

    /// All hypotheses: global ones first, then local ones.
    pub fn hypotheses(&self) -> impl Iterator<Item = &Predicate> {
        self.0.global_hyps.iter().chain(self.0.local_hyps.iter())
    }

    /// Number of hypotheses.
    pub fn hypothesis_count(&self) -> usize {
        self.0.global_hyps.len() + self.0.local_hyps.len()
    }

    /// Hypotheses shared with the root of this sequent family.
    pub fn global_hypotheses(&self) -> impl Iterator<Item = &Predicate> {
        self.0.global_hyps.iter()
    }

    /// Hypotheses added on top of the global ones.
    pub fn local_hypotheses(&self) -> impl Iterator<Item = &Predicate> {
        self.0.local_hyps.iter()
    }

    /// Whether `hyp` is a hypothesis of this sequent.
    pub fn contains_hypothesis(&self, hyp: &Predicate) -> bool {
        self.0.global_hyps.contains(hyp) || self.0.local_hyps.contains(hyp)
    }

    /// Whether every predicate of `hyps` is a hypothesis of this sequent.
    pub fn contains_hypotheses<'a>(&self, hyps: impl IntoIterator<Item = &'a Predicate>) -> bool {
        hyps.into_iter().all(|h| self.contains_hypothesis(h))
    }

    /// Hypotheses that are not hidden, in insertion order.
    pub fn visible_hyps(&self) -> impl Iterator<Item = &Predicate> {
        self.hypotheses().filter(move |h| !self.0.hidden.contains(*h))
    }

    /// Visible hypotheses that are not selected.
    pub fn visible_minus_selected(&self) -> impl Iterator<Item = &Predicate> {
        self.visible_hyps()
            .filter(move |h| !self.0.selected.contains(*h))
    }

    /// Selected hypotheses, in selection order.
    pub fn selected_hyps(&self) -> impl Iterator<Item = &Predicate> {
        self.0.selected.iter()
    }

    /// Hidden hypotheses, in hiding order.
    pub fn hidden_hyps(&self) -> impl Iterator<Item = &Predicate> {
        self.0.hidden.iter()
    }

    /// Whether `hyp` is a hidden hypothesis.
    pub fn is_hidden(&self, hyp: &Predicate) -> bool {
        self.0.hidden.contains(hyp)
    }

    /// Whether `hyp` is a selected hypothesis.
    pub fn is_selected(&self, hyp: &Predicate) -> bool {
        self.0.selected.contains(hyp)
    }

    /// Extend the type environment, add hypotheses and optionally replace the goal.
    ///
    /// Added hypotheses end up selected and not hidden, whether or not they
    /// were already present. Fails without producing anything when a fresh
    /// identifier clashes or when a hypothesis or the new goal does not
    /// close-type-check in the extended environment. Returns this very
    /// instance when nothing changes.
    pub fn modify(
        &self,
        fresh_idents: &[FreeIdentifier],
        added_hyps: &[Predicate],
        new_goal: Option<&Predicate>,
    ) -> Result<Sequent> {
        let type_env = self.0.type_env.with_identifiers(fresh_idents)?;

        if let Some(bad) = added_hyps.iter().find(|h| !type_env.is_closed(h)) {
            return Err(Error::type_check(bad));
        }
        if let Some(goal) = new_goal {
            if !type_env.is_closed(goal) {
                return Err(Error::type_check(goal));
            }
        }

        let mut local = Arc::clone(&self.0.local_hyps);
        let mut selected = Arc::clone(&self.0.selected);
        let mut hidden = Arc::clone(&self.0.hidden);
        for hyp in added_hyps {
            if !self.contains_hypothesis(hyp) && !local.contains(hyp) {
                Arc::make_mut(&mut local).insert(hyp.clone());
            }
            if !selected.contains(hyp) {
                Arc::make_mut(&mut selected).insert(hyp.clone());
            }
            if hidden.contains(hyp) {
                Arc::make_mut(&mut hidden).shift_remove(hyp);
            }
        }

        let goal = match new_goal {
            Some(goal) if goal != self.goal() => goal.clone(),
            _ => self.0.goal.clone(),
        };
        let goal_changed = new_goal.is_some_and(|g| g != self.goal());

        let unchanged = TypeEnvironment::ptr_eq(&type_env, &self.0.type_env)
            && Arc::ptr_eq(&local, &self.0.local_hyps)
            && Arc::ptr_eq(&selected, &self.0.selected)
            && Arc::ptr_eq(&hidden, &self.0.hidden)
            && !goal_changed;
        if unchanged {
            return Ok(self.clone());
        }

        Ok(Sequent(Arc::new(SequentData {
            type_env,
            global_hyps: Arc::clone(&self.0.global_hyps),
            local_hyps: local,
            hidden,
            selected,
            goal,
        })))
    }

    /// Select hypotheses, un-hiding them. Non-hypotheses are ignored.
    pub fn select_hypotheses<'a>(&self, hyps: impl IntoIterator<Item = &'a Predicate>) -> Sequent {
        let mut selected = Arc::clone(&self.0.selected);
        let mut hidden = Arc::clone(&self.0.hidden);
        for hyp in hyps {
            if !self.contains_hypothesis(hyp) {
                continue;
            }
            if !selected.contains(hyp) {
                Arc::make_mut(&mut selected).insert(hyp.clone());
            }
            if hidden.contains(hyp) {
                Arc::make_mut(&mut hidden).shift_remove(hyp);
            }
        }
        self.with_visibility(selected, hidden)
    }

    /// Remove hypotheses from the selection.
    pub fn deselect_hypotheses<'a>(
        &self,
        hyps: impl IntoIterator<Item = &'a Predicate>,
    ) -> Sequent {
        let mut selected = Arc::clone(&self.0.selected);
        for hyp in hyps {
            if selected.contains(hyp) {
                Arc::make_mut(&mut selected).shift_remove(hyp);
            }
        }
        let hidden = Arc::clone(&self.0.hidden);
        self.with_visibility(selected, hidden)
    }

    /// Hide hypotheses, deselecting them. Non-hypotheses are ignored.
    pub fn hide_hypotheses<'a>(&self, hyps: impl IntoIterator<Item = &'a Predicate>) -> Sequent {
        let mut selected = Arc::clone(&self.0.selected);
        let mut hidden = Arc::clone(&self.0.hidden);
        for hyp in hyps {
            if !self.contains_hypothesis(hyp) {
                continue;
            }
            if !hidden.contains(hyp) {
                Arc::make_mut(&mut hidden).insert(hyp.clone());
            }
            if selected.contains(hyp) {
                Arc::make_mut(&mut selected).shift_remove(hyp);
            }
        }
        self.with_visibility(selected, hidden)
    }

    /// Un-hide hypotheses.
    pub fn show_hypotheses<'a>(&self, hyps: impl IntoIterator<Item = &'a Predicate>) -> Sequent {
        let mut hidden = Arc::clone(&self.0.hidden);
        for hyp in hyps {
            if hidden.contains(hyp) {
                Arc::make_mut(&mut hidden).shift_remove(hyp);
            }
        }
        let selected = Arc::clone(&self.0.selected);
        self.with_visibility(selected, hidden)
    }

    fn with_visibility(&self, selected: HypSet, hidden: HypSet) -> Sequent {
        if Arc::ptr_eq(&selected, &self.0.selected) && Arc::ptr_eq(&hidden, &self.0.hidden) {
            return self.clone();
        }
        Sequent(Arc::new(SequentData {
            type_env: self.0.type_env.clone(),
            global_hyps: Arc::clone(&self.0.global_hyps),
            local_hyps: Arc::clone(&self.0.local_hyps),
            hidden,
            selected,
            goal: self.0.goal.clone(),
        }))
    }

    /// Add hypotheses inferred from existing ones.
    ///
    /// New hypotheses are selected when some used hypothesis is selected,
    /// otherwise hidden when all used hypotheses are hidden, otherwise only
    /// visible. Hypotheses already present keep their status.
    ///
    /// The whole inference is skipped, returning this instance, when a used
    /// hypothesis is missing, a fresh identifier clashes or an inferred
    /// hypothesis does not close-type-check.
    pub fn perform_forward_inference(
        &self,
        used_hyps: &[Predicate],
        added_idents: &[FreeIdentifier],
        inferred_hyps: &[Predicate],
    ) -> Sequent {
        if !self.contains_hypotheses(used_hyps) {
            trace!("forward inference skipped: used hypotheses missing");
            return self.clone();
        }
        let type_env = match self.0.type_env.with_identifiers(added_idents) {
            Ok(env) => env,
            Err(err) => {
                trace!("forward inference skipped: {}", err);
                return self.clone();
            }
        };
        if let Some(bad) = inferred_hyps.iter().find(|h| !type_env.is_closed(h)) {
            trace!("forward inference skipped: '{}' does not type-check", bad);
            return self.clone();
        }

        let select = used_hyps.iter().any(|h| self.is_selected(h));
        let hide = !select && !used_hyps.is_empty() && used_hyps.iter().all(|h| self.is_hidden(h));

        let mut local = Arc::clone(&self.0.local_hyps);
        let mut selected = Arc::clone(&self.0.selected);
        let mut hidden = Arc::clone(&self.0.hidden);
        for hyp in inferred_hyps {
            if self.contains_hypothesis(hyp) || local.contains(hyp) {
                continue;
            }
            Arc::make_mut(&mut local).insert(hyp.clone());
            if select {
                Arc::make_mut(&mut selected).insert(hyp.clone());
            } else if hide {
                Arc::make_mut(&mut hidden).insert(hyp.clone());
            }
        }

        if TypeEnvironment::ptr_eq(&type_env, &self.0.type_env)
            && Arc::ptr_eq(&local, &self.0.local_hyps)
        {
            return self.clone();
        }

        Sequent(Arc::new(SequentData {
            type_env,
            global_hyps: Arc::clone(&self.0.global_hyps),
            local_hyps: local,
            hidden,
            selected,
            goal: self.0.goal.clone(),
        }))
    }
}

impl PartialEq for Sequent {
    fn eq(&self, other: &Self) -> bool {
        if Sequent::ptr_eq(self, other) {
            return true;
        }
        self.0.goal == other.0.goal
            && self.0.type_env == other.0.type_env
            && self.0.hidden == other.0.hidden
            && self.0.selected == other.0.selected
            && self.hypothesis_count() == other.hypothesis_count()
            && other.contains_hypotheses(self.hypotheses())
    }
}

impl Eq for Sequent {}

impl fmt::Debug for Sequent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequent")
            .field("type_env", &self.0.type_env)
            .field("global_hyps", &self.0.global_hyps)
            .field("local_hyps", &self.0.local_hyps)
            .field("hidden", &self.0.hidden)
            .field("selected", &self.0.selected)
            .field("goal", &self.0.goal)
            .finish()
    }
}

impl fmt::Display for Sequent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env: Vec<String> = self
            .0
            .type_env
            .iter()
            .map(|(name, ty)| format!("{} ⦂ {}", name, ty))
            .collect();
        let join = |hyps: Vec<&Predicate>| {
            hyps.iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>()
                .join(" ;; ")
        };
        write!(
            f,
            "{{{}}} [{}] [{}] [{}] ⊢ {}",
            env.join(", "),
            join(self.hidden_hyps().collect()),
            join(self.visible_minus_selected().collect()),
            join(self.selected_hyps().collect()),
            self.goal()
        )
    }
}

/// Builder for root sequents.
///
/// All hypotheses given to the builder become global hypotheses.
#[derive(Debug, Clone)]
pub struct SequentBuilder {
    type_env: TypeEnvironment,
    hyps: IndexSet<Predicate>,
    hidden: IndexSet<Predicate>,
    selected: IndexSet<Predicate>,
    goal: Option<Predicate>,
}

impl SequentBuilder {
    /// Create a builder over a type environment.
    pub fn new(type_env: TypeEnvironment) -> Self {
        Self {
            type_env,
            hyps: IndexSet::new(),
            hidden: IndexSet::new(),
            selected: IndexSet::new(),
            goal: None,
        }
    }

    /// Add a visible, unselected hypothesis.
    pub fn hypothesis(mut self, hyp: Predicate) -> Self {
        self.hyps.insert(hyp);
        self
    }

    /// Add several visible, unselected hypotheses.
    pub fn hypotheses(mut self, hyps: impl IntoIterator<Item = Predicate>) -> Self {
        self.hyps.extend(hyps);
        self
    }

    /// Add a selected hypothesis.
    pub fn selected(mut self, hyp: Predicate) -> Self {
        self.hyps.insert(hyp.clone());
        self.selected.insert(hyp);
        self
    }

    /// Add a hidden hypothesis.
    pub fn hidden(mut self, hyp: Predicate) -> Self {
        self.hyps.insert(hyp.clone());
        self.hidden.insert(hyp);
        self
    }

    /// Set the goal.
    pub fn goal(mut self, goal: Predicate) -> Self {
        self.goal = Some(goal);
        self
    }

    /// Build the sequent, type-checking every hypothesis and the goal.
    pub fn build(self) -> Result<Sequent> {
        let goal = self
            .goal
            .ok_or_else(|| Error::IllFormedSequent("missing goal".to_string()))?;
        if let Some(both) = self.hidden.iter().find(|h| self.selected.contains(*h)) {
            return Err(Error::IllFormedSequent(format!(
                "'{}' is both hidden and selected",
                both
            )));
        }
        if let Some(bad) = self.hyps.iter().find(|h| !self.type_env.is_closed(h)) {
            return Err(Error::type_check(bad));
        }
        if !self.type_env.is_closed(&goal) {
            return Err(Error::type_check(&goal));
        }

        Ok(Sequent(Arc::new(SequentData {
            type_env: self.type_env,
            global_hyps: Arc::new(self.hyps),
            local_hyps: Arc::new(IndexSet::new()),
            hidden: Arc::new(self.hidden),
            selected: Arc::new(self.selected),
            goal,
        })))
    }
}
