//! Reasoners: the pluggable producers of proof rules.
//!
//! A [`Reasoner`] looks at a sequent and an input and either produces a
//! [`ProofRule`] or explains why it cannot. Failing is a normal outcome, so
//! it is returned as [`ReasonerOutput::Failure`] rather than as an error.
//!
//! Reasoners are identified by a stable id and may carry a version that
//! changes whenever their semantics change. The pair is encoded as
//! `id` or `id~version` (see [`ReasonerDesc`]) so that stored proofs made by
//! an older version can be detected.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use seqprover::formula::{Predicate, TypeEnvironment};
//! use seqprover::reasoner::{input::EmptyInput, NullMonitor, Reasoner, ReasonerInput};
//! use seqprover::reasoners::TrueGoal;
//! use seqprover::sequent::Sequent;
//!
//! let seq = Sequent::builder(TypeEnvironment::new())
//!     .goal(Predicate::True)
//!     .build()
//!     .unwrap();
//! let input: Arc<dyn ReasonerInput> = Arc::new(EmptyInput);
//!
//! let output = TrueGoal.apply(&seq, &input, &NullMonitor);
//! let rule = output.rule().unwrap();
//! assert!(rule.apply(&seq).unwrap().is_empty());
//! ```

pub mod input;
pub mod registry;

pub use input::{
    DeserializeInput, EmptyInput, InputRecord, ReasonerInput, ReasonerInputReader,
    ReasonerInputWriter, SerializeError,
};
pub use registry::{DummyReasoner, ReasonerFactory, ReasonerRegistry};

use crate::formula::Predicate;
use crate::rule::ProofRule;
use crate::sequent::Sequent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Separator between a reasoner id and its version.
pub const VERSION_SEPARATOR: char = '~';

/// Identity of the reasoner that generated a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReasonerDesc {
    /// Base id, without version.
    pub id: String,
    /// Version, for versioned reasoners.
    pub version: Option<u32>,
}

impl ReasonerDesc {
    pub fn new(id: impl Into<String>, version: Option<u32>) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Encoded form: `id` or `id~version`.
    pub fn encoded(&self) -> String {
        match self.version {
            Some(version) => format!("{}{}{}", self.id, VERSION_SEPARATOR, version),
            None => self.id.clone(),
        }
    }

    /// Parse an encoded id.
    pub fn decode(encoded: &str) -> Result<Self, SerializeError> {
        let malformed = || SerializeError::MalformedId(encoded.to_string());
        match encoded.rsplit_once(VERSION_SEPARATOR) {
            Some((id, version)) => {
                let version = version.parse().map_err(|_| malformed())?;
                if id.is_empty() {
                    return Err(malformed());
                }
                Ok(Self::new(id, Some(version)))
            }
            None if encoded.is_empty() => Err(malformed()),
            None => Ok(Self::new(encoded, None)),
        }
    }
}

impl fmt::Display for ReasonerDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded())
    }
}

/// Cooperative cancellation and progress reporting.
///
/// Long-running reasoners poll [`is_canceled`](Self::is_canceled) and return
/// a failure promptly once it reports true.
pub trait ProofMonitor: Send + Sync {
    fn is_canceled(&self) -> bool;

    /// Name the current subtask.
    fn set_task(&self, _name: &str) {}
}

/// Monitor that is never canceled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMonitor;

impl ProofMonitor for NullMonitor {
    fn is_canceled(&self) -> bool {
        false
    }
}

/// Shareable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl ProofMonitor for CancellationFlag {
    fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a reasoner could not produce a rule.
#[derive(Debug, Clone)]
pub struct ReasonerFailure {
    pub generated_by: ReasonerDesc,
    pub input: Arc<dyn ReasonerInput>,
    pub reason: String,
}

impl fmt::Display for ReasonerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.generated_by, self.reason)
    }
}

/// Outcome of a reasoner call.
#[derive(Debug, Clone)]
pub enum ReasonerOutput {
    Rule(ProofRule),
    Failure(ReasonerFailure),
}

impl ReasonerOutput {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Rule(_))
    }

    pub fn rule(&self) -> Option<&ProofRule> {
        match self {
            Self::Rule(rule) => Some(rule),
            Self::Failure(_) => None,
        }
    }

    pub fn into_rule(self) -> Option<ProofRule> {
        match self {
            Self::Rule(rule) => Some(rule),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ReasonerFailure> {
        match self {
            Self::Rule(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

/// A producer of proof rules.
pub trait Reasoner: Send + Sync {
    /// Stable id, without version.
    fn id(&self) -> &str;

    /// Version, for reasoners whose semantics have changed over time.
    fn version(&self) -> Option<u32> {
        None
    }

    /// Produce a rule for `seq` or explain why not.
    fn apply(
        &self,
        seq: &Sequent,
        input: &Arc<dyn ReasonerInput>,
        monitor: &dyn ProofMonitor,
    ) -> ReasonerOutput;

    /// Read back an input written by a rule this reasoner generated.
    fn deserialize_input(
        &self,
        reader: &dyn ReasonerInputReader,
    ) -> Result<Arc<dyn ReasonerInput>, SerializeError>;
}

/// Descriptor of the running version of `reasoner`.
pub fn reasoner_desc(reasoner: &dyn Reasoner) -> ReasonerDesc {
    ReasonerDesc::new(reasoner.id(), reasoner.version())
}

/// Failure output attributed to `reasoner`.
pub fn make_failure(
    reasoner: &dyn Reasoner,
    input: &Arc<dyn ReasonerInput>,
    reason: impl Into<String>,
) -> ReasonerOutput {
    ReasonerOutput::Failure(ReasonerFailure {
        generated_by: reasoner_desc(reasoner),
        input: Arc::clone(input),
        reason: reason.into(),
    })
}

/// Check that `hyp` is a hypothesis of `seq`.
pub fn check_hypothesis(seq: &Sequent, hyp: &Predicate) -> Result<(), String> {
    if seq.contains_hypothesis(hyp) {
        Ok(())
    } else {
        Err(format!("Nonexistent hypothesis: {}", hyp))
    }
}

/// Downcast an input to the type a reasoner expects.
///
/// Fails with a reason when the input has the wrong type or reports an
/// error of its own.
pub fn typed_input<T: ReasonerInput>(input: &Arc<dyn ReasonerInput>) -> Result<&T, String> {
    let typed = input
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| format!("Unexpected input type: {:?}", input))?;
    match typed.error() {
        Some(error) => Err(error),
        None => Ok(typed),
    }
}

/// Deserialize an input of type `T` into a shared trait object.
pub fn deserialize_as<T>(
    reader: &dyn ReasonerInputReader,
) -> Result<Arc<dyn ReasonerInput>, SerializeError>
where
    T: ReasonerInput + DeserializeInput,
{
    Ok(Arc::new(T::deserialize(reader)?))
}
