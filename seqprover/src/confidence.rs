//! Proof confidence levels.
//!
//! A confidence measures how much a closed proof should be trusted. Open
//! and pending nodes report [`Confidence::PENDING`]; a closed node reports
//! the minimum over its rule and its children.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Confidence of a rule or of a proof tree node.
///
/// Stored as its raw value. Only rule confidences are ever stored, so
/// decoding rejects anything outside `(PENDING, DISCHARGED_MAX]`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct Confidence(u32);

/// A raw value that is not a rule confidence.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Confidence {0} is outside (0, 1000]")]
pub struct ConfidenceOutOfRange(pub u32);

impl Confidence {
    /// Sentinel for open and pending nodes. Lower than any rule confidence.
    pub const PENDING: Confidence = Confidence(0);

    /// Highest confidence of a manually reviewed proof.
    pub const REVIEWED_MAX: Confidence = Confidence(500);

    /// Highest confidence of a discharged proof.
    pub const DISCHARGED_MAX: Confidence = Confidence(1000);

    /// Create a rule confidence. Values outside `(PENDING, DISCHARGED_MAX]`
    /// are rejected.
    pub fn new(value: u32) -> Option<Self> {
        (value > Self::PENDING.0 && value <= Self::DISCHARGED_MAX.0).then_some(Self(value))
    }

    /// Raw value.
    pub fn value(self) -> u32 {
        self.0
    }

    pub fn is_pending(self) -> bool {
        self == Self::PENDING
    }

    /// Above the manual review band.
    pub fn is_discharged(self) -> bool {
        self > Self::REVIEWED_MAX
    }

    /// In the manual review band `(PENDING, REVIEWED_MAX]`.
    pub fn is_reviewed(self) -> bool {
        self > Self::PENDING && self <= Self::REVIEWED_MAX
    }
}

impl TryFrom<u32> for Confidence {
    type Error = ConfidenceOutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ConfidenceOutOfRange(value))
    }
}

impl From<Confidence> for u32 {
    fn from(confidence: Confidence) -> u32 {
        confidence.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::DISCHARGED_MAX
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::PENDING => write!(f, "pending"),
            Self::DISCHARGED_MAX => write!(f, "discharged"),
            c => write!(f, "{}", c.0),
        }
    }
}
