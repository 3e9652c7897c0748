//! Error types for seqprover.
//!
//! Only conditions that abort an operation are errors. An inapplicable rule
//! is reported through [`RuleError`](crate::rule::RuleError) and a reasoner
//! that cannot help produces a
//! [`ReasonerFailure`](crate::reasoner::ReasonerFailure) value.

use crate::reasoner::input::SerializeError;
use thiserror::Error;

/// Result type alias using seqprover's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or transforming prover values.
#[derive(Error, Debug)]
pub enum Error {
    /// A fresh identifier is already declared in the type environment
    #[error("Name clash: identifier '{name}' is already declared")]
    NameClash { name: String },

    /// A hypothesis or goal does not type-check in the target environment
    #[error("Type-check failure: '{predicate}' is not closed in the type environment")]
    TypeCheck { predicate: String },

    /// A root sequent was given inconsistent data
    #[error("Ill-formed sequent: {0}")]
    IllFormedSequent(String),

    /// A reasoner id was registered twice
    #[error("Reasoner '{id}' is already registered")]
    DuplicateReasoner { id: String },

    /// Reading or writing a reasoner input or proof skeleton failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializeError),

    /// JSON interchange of skeleton records failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a name clash error.
    pub fn name_clash(name: impl Into<String>) -> Self {
        Self::NameClash { name: name.into() }
    }

    /// Create a type-check error for a predicate.
    pub fn type_check(predicate: impl std::fmt::Display) -> Self {
        Self::TypeCheck {
            predicate: predicate.to_string(),
        }
    }

    /// Create a duplicate registration error.
    pub fn duplicate_reasoner(id: impl Into<String>) -> Self {
        Self::DuplicateReasoner { id: id.into() }
    }
}
