//! Hypothesis actions carried by antecedents.
//!
//! An action either changes the visibility of hypotheses or adds hypotheses
//! derived from existing ones (forward inference). Actions are applied in
//! list order after an antecedent's own hypotheses have been added.

use crate::dependencies::ProofDependenciesBuilder;
use crate::formula::{FreeIdentifier, Predicate, TypeEnvironment};
use crate::sequent::Sequent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A hypothesis action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HypothesisAction {
    /// Select hypotheses (and un-hide them).
    Select(Vec<Predicate>),
    /// Remove hypotheses from the selection.
    Deselect(Vec<Predicate>),
    /// Hide hypotheses (and deselect them).
    Hide(Vec<Predicate>),
    /// Un-hide hypotheses.
    Show(Vec<Predicate>),
    /// Add hypotheses inferred from `used_hyps`, possibly introducing fresh
    /// identifiers.
    ForwardInference {
        used_hyps: Vec<Predicate>,
        added_free_idents: Vec<FreeIdentifier>,
        inferred_hyps: Vec<Predicate>,
    },
}

impl HypothesisAction {
    /// Create a select action.
    pub fn select(hyps: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Select(hyps.into_iter().collect())
    }

    /// Create a deselect action.
    pub fn deselect(hyps: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Deselect(hyps.into_iter().collect())
    }

    /// Create a hide action.
    pub fn hide(hyps: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Hide(hyps.into_iter().collect())
    }

    /// Create a show action.
    pub fn show(hyps: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Show(hyps.into_iter().collect())
    }

    /// Create a forward inference action.
    pub fn forward_inference(
        used_hyps: impl IntoIterator<Item = Predicate>,
        added_free_idents: impl IntoIterator<Item = FreeIdentifier>,
        inferred_hyps: impl IntoIterator<Item = Predicate>,
    ) -> Self {
        Self::ForwardInference {
            used_hyps: used_hyps.into_iter().collect(),
            added_free_idents: added_free_idents.into_iter().collect(),
            inferred_hyps: inferred_hyps.into_iter().collect(),
        }
    }

    /// Stable name of the action kind.
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Deselect(_) => "DESELECT",
            Self::Hide(_) => "HIDE",
            Self::Show(_) => "SHOW",
            Self::ForwardInference { .. } => "FORWARD_INF",
        }
    }

    /// Hypotheses the action refers to in the sequent it is applied to.
    ///
    /// For a forward inference these are the used hypotheses; the inferred
    /// ones are produced by the action itself.
    pub fn referenced_hyps(&self) -> &[Predicate] {
        match self {
            Self::Select(hyps) | Self::Deselect(hyps) | Self::Hide(hyps) | Self::Show(hyps) => hyps,
            Self::ForwardInference { used_hyps, .. } => used_hyps,
        }
    }

    /// Whether this is a pure visibility change.
    pub fn is_selection(&self) -> bool {
        !matches!(self, Self::ForwardInference { .. })
    }

    /// Apply the action to a sequent.
    pub fn apply(&self, seq: &Sequent) -> Sequent {
        match self {
            Self::Select(hyps) => seq.select_hypotheses(hyps),
            Self::Deselect(hyps) => seq.deselect_hypotheses(hyps),
            Self::Hide(hyps) => seq.hide_hypotheses(hyps),
            Self::Show(hyps) => seq.show_hypotheses(hyps),
            Self::ForwardInference {
                used_hyps,
                added_free_idents,
                inferred_hyps,
            } => seq.perform_forward_inference(used_hyps, added_free_idents, inferred_hyps),
        }
    }

    /// Apply actions in list order.
    pub fn apply_all(actions: &[HypothesisAction], seq: &Sequent) -> Sequent {
        actions
            .iter()
            .fold(seq.clone(), |current, action| action.apply(&current))
    }

    /// Record the action's effect on the dependencies of the proof below it.
    ///
    /// `type_env` is the environment of the sequent the action was applied
    /// to; it gives the types of the identifiers of the used hypotheses.
    pub fn collect_dependencies(
        &self,
        deps: &mut ProofDependenciesBuilder,
        type_env: &TypeEnvironment,
    ) {
        let Self::ForwardInference {
            used_hyps,
            added_free_idents,
            inferred_hyps,
        } = self
        else {
            return;
        };

        // A target that already declares an added ident skips the inference,
        // so the idents are introduced only when the proof relies on its result.
        let mut relied_on = false;
        for hyp in inferred_hyps {
            relied_on |= deps.remove_used_hypothesis(hyp);
        }
        for ident in added_free_idents {
            relied_on |= deps.remove_used_free_ident(&ident.name);
        }
        if relied_on {
            for ident in added_free_idents {
                deps.add_introduced_free_ident(&ident.name);
            }
        }
        for hyp in used_hyps {
            deps.add_free_idents_of(hyp, type_env);
        }
        for hyp in used_hyps {
            deps.add_used_hypothesis(hyp.clone());
        }
    }
}

impl fmt::Display for HypothesisAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |hyps: &[Predicate]| {
            hyps.iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Self::ForwardInference {
                used_hyps,
                added_free_idents,
                inferred_hyps,
            } => {
                let idents: Vec<String> =
                    added_free_idents.iter().map(|i| i.name.clone()).collect();
                write!(
                    f,
                    "{}[{}] ({}) ⇒ [{}]",
                    self.action_type(),
                    list(used_hyps),
                    idents.join(", "),
                    list(inferred_hyps)
                )
            }
            _ => write!(f, "{}[{}]", self.action_type(), list(self.referenced_hyps())),
        }
    }
}
