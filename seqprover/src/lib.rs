//! # seqprover
//!
//! The kernel of an interactive sequent prover.
//!
//! ## Core Components
//!
//! - **Sequent**: immutable hypotheses plus goal, with hypothesis selection
//! - **Rule**: proof rules produced by reasoners and applied to sequents
//! - **Reasoner**: pluggable rule producers, their inputs and their registry
//! - **Proof tree**: the mutable proof under construction, with listeners
//! - **Dependencies**: what a finished proof actually relies on
//! - **Replay**: reusing or rebuilding stored proof skeletons
//!
//! ## Example
//!
//! ```rust
//! use seqprover::formula::{Expression, Predicate, Type, TypeEnvironment};
//! use seqprover::reasoner::{EmptyInput, NullMonitor};
//! use seqprover::reasoners::{CONJ_I_ID, HYP_ID, TRUE_GOAL_ID};
//! use seqprover::tactics::{first_success, on_all_pending, reasoner_tac, Tactic};
//! use seqprover::{Sequent, SequentProver};
//! use std::sync::Arc;
//!
//! let mut env = TypeEnvironment::new();
//! env.add_name("x", Type::Integer).unwrap();
//! let x_lt_1 = Predicate::lt(Expression::ident("x"), Expression::int(1));
//! let seq = Sequent::builder(env)
//!     .selected(x_lt_1.clone())
//!     .goal(Predicate::and([x_lt_1, Predicate::True]))
//!     .build()
//!     .unwrap();
//!
//! let prover = SequentProver::default();
//! let mut tree = prover.new_proof_tree(seq);
//! let tac = |id| reasoner_tac(prover.reasoner(id).unwrap(), Arc::new(EmptyInput));
//!
//! let root = tree.root();
//! tac(CONJ_I_ID).apply(&mut tree, root, &NullMonitor).unwrap();
//! let close = on_all_pending(first_success(vec![
//!     Box::new(tac(TRUE_GOAL_ID)),
//!     Box::new(tac(HYP_ID)),
//! ]));
//! close.apply(&mut tree, root, &NullMonitor).unwrap();
//! assert!(tree.is_closed());
//! ```

// Self-alias for derive macro support within the crate
extern crate self as seqprover;

pub mod confidence;
pub mod config;
pub mod dependencies;
pub mod error;
pub mod formula;
pub mod proof_tree;
pub mod reasoner;
pub mod reasoners;
pub mod replay;
pub mod rule;
pub mod sequent;
pub mod tactics;

// Re-exports for convenience
pub use confidence::Confidence;
pub use config::{ProverConfig, SequentProver, SequentProverBuilder};
pub use dependencies::{ProofDependencies, ProofDependenciesBuilder};
pub use error::{Error, Result};
pub use formula::{Expression, Predicate, Type, TypeEnvironment};
pub use proof_tree::{
    ChangeKind, ListenerId, NodeId, NodeRef, ProofSkeleton, ProofTree, ProofTreeDelta,
    ProofTreeListener, SkeletonRecord,
};
pub use reasoner::{
    CancellationFlag, NullMonitor, ProofMonitor, Reasoner, ReasonerDesc, ReasonerFailure,
    ReasonerInput, ReasonerOutput, ReasonerRegistry, SerializeError,
};
pub use rule::{Antecedent, ProofRule, ProofRuleBuilder, RuleError};
pub use sequent::{HypothesisAction, Sequent, SequentBuilder};
pub use tactics::Tactic;
