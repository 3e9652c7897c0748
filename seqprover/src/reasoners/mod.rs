//! Reasoners shipped with the crate.
//!
//! These are small clients of the reasoner protocol: enough inference to
//! close simple goals and to exercise every part of the kernel (fresh
//! identifiers, hypothesis actions, versioned reasoners, manual review).
//!
//! | Id                   | Reasoner   | Closes / splits            |
//! |----------------------|------------|----------------------------|
//! | `seqprover.trueGoal` | [`TrueGoal`] | `⊤` goal                 |
//! | `seqprover.hyp`      | [`Hyp`]      | goal among hypotheses    |
//! | `seqprover.falseHyp` | [`FalseHyp`] | `⊥` hypothesis           |
//! | `seqprover.conjE`    | [`ConjE`]    | conjunctive hypothesis   |
//! | `seqprover.conjI`    | [`ConjI`]    | conjunctive goal         |
//! | `seqprover.impI`     | [`ImpI`]     | implication goal         |
//! | `seqprover.allI`     | [`AllI`]     | universal goal           |
//! | `seqprover.review`   | [`Review`]   | any goal, by review      |
//! | `seqprover.mngHyp`   | [`MngHyp`]   | hypothesis selection     |

mod logic;
mod manual;

pub use logic::{AllI, ConjE, ConjI, FalseHyp, Hyp, HypInput, ImpI, TrueGoal};
pub use manual::{MngHyp, MngHypInput, Review, ReviewInput};

use crate::reasoner::{Reasoner, ReasonerRegistry};
use std::sync::Arc;
use tracing::warn;

pub const TRUE_GOAL_ID: &str = "seqprover.trueGoal";
pub const HYP_ID: &str = "seqprover.hyp";
pub const FALSE_HYP_ID: &str = "seqprover.falseHyp";
pub const CONJ_E_ID: &str = "seqprover.conjE";
pub const CONJ_I_ID: &str = "seqprover.conjI";
pub const IMP_I_ID: &str = "seqprover.impI";
pub const ALL_I_ID: &str = "seqprover.allI";
pub const REVIEW_ID: &str = "seqprover.review";
pub const MNG_HYP_ID: &str = "seqprover.mngHyp";

/// Install every reasoner of this module into `registry`.
///
/// Ids already taken are left alone.
pub fn register_builtin(registry: &mut ReasonerRegistry) {
    let manifest: [(&str, fn() -> Arc<dyn Reasoner>); 9] = [
        (TRUE_GOAL_ID, || Arc::new(TrueGoal)),
        (HYP_ID, || Arc::new(Hyp)),
        (FALSE_HYP_ID, || Arc::new(FalseHyp)),
        (CONJ_E_ID, || Arc::new(ConjE)),
        (CONJ_I_ID, || Arc::new(ConjI)),
        (IMP_I_ID, || Arc::new(ImpI)),
        (ALL_I_ID, || Arc::new(AllI)),
        (REVIEW_ID, || Arc::new(Review)),
        (MNG_HYP_ID, || Arc::new(MngHyp)),
    ];
    for (id, factory) in manifest {
        if let Err(err) = registry.register(id, factory) {
            warn!(%err, "Skipping built-in reasoner");
        }
    }
}
