//! Reasoner inputs and their keyed serialization.
//!
//! A reasoner input is whatever a reasoner needs besides the sequent: a
//! hypothesis to split, a list of actions, a confidence level. Inputs are
//! stored next to the rules they produced so that a proof can be rebuilt
//! by running the reasoner again. They are written to and read from a
//! keyed store of strings, predicates and expressions.
//!
//! Most inputs derive the serialization code:
//!
//! ```rust
//! use seqprover::formula::Predicate;
//! use seqprover::reasoner::input::{DeserializeInput, InputRecord, ReasonerInput};
//!
//! #[derive(Debug, ReasonerInput)]
//! struct SplitInput {
//!     #[input(key = "pred")]
//!     hyp: Predicate,
//!     note: String,
//! }
//!
//! let input = SplitInput { hyp: Predicate::True, note: "x".to_string() };
//! let mut record = InputRecord::new();
//! input.serialize(&mut record).unwrap();
//!
//! let back = SplitInput::deserialize(&record).unwrap();
//! assert_eq!(back.hyp, Predicate::True);
//! ```

use crate::formula::{Expression, Predicate};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub use seqprover_derive::ReasonerInput;

/// Errors raised while reading or writing reasoner inputs and skeletons.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    #[error("Missing key '{0}'")]
    MissingKey(String),

    #[error("Key '{0}' was written twice")]
    DuplicateKey(String),

    #[error("Key '{key}' holds {found}, expected {expected}")]
    WrongKind {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Key '{key}' holds {found} values, expected {expected}")]
    WrongArity {
        key: String,
        expected: &'static str,
        found: usize,
    },

    #[error("Invalid value for key '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Unknown reasoner '{0}'")]
    UnknownReasoner(String),

    #[error("Malformed reasoner id '{0}'")]
    MalformedId(String),
}

/// Input given to a reasoner.
///
/// Implementations are usually derived with `#[derive(ReasonerInput)]`.
pub trait ReasonerInput: fmt::Debug + Send + Sync + Any {
    /// Description of what is wrong with this input, if anything.
    fn error(&self) -> Option<String> {
        None
    }

    /// Write the input to a keyed store.
    fn serialize(&self, writer: &mut dyn ReasonerInputWriter) -> Result<(), SerializeError>;

    fn as_any(&self) -> &dyn Any;
}

/// Inputs that can be read back from a keyed store.
pub trait DeserializeInput: Sized {
    fn deserialize(reader: &dyn ReasonerInputReader) -> Result<Self, SerializeError>;
}

/// Keyed sink for reasoner inputs.
pub trait ReasonerInputWriter {
    fn put_string(&mut self, key: &str, value: &str) -> Result<(), SerializeError>;
    fn put_predicates(&mut self, key: &str, preds: &[Predicate]) -> Result<(), SerializeError>;
    fn put_expressions(&mut self, key: &str, exprs: &[Expression]) -> Result<(), SerializeError>;
}

/// Keyed source for reasoner inputs.
pub trait ReasonerInputReader {
    fn get_string(&self, key: &str) -> Result<String, SerializeError>;
    fn get_predicates(&self, key: &str) -> Result<Vec<Predicate>, SerializeError>;
    fn get_expressions(&self, key: &str) -> Result<Vec<Expression>, SerializeError>;

    /// Every entry, for inputs whose reasoner is not installed.
    fn to_record(&self) -> InputRecord;
}

/// A value stored under one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InputValue {
    String(String),
    Predicates(Vec<Predicate>),
    Expressions(Vec<Expression>),
}

impl InputValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "a string",
            Self::Predicates(_) => "predicates",
            Self::Expressions(_) => "expressions",
        }
    }
}

/// In-memory keyed store, used for persistence records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputRecord {
    entries: BTreeMap<String, InputValue>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&InputValue> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    fn put(&mut self, key: &str, value: InputValue) -> Result<(), SerializeError> {
        if self.entries.contains_key(key) {
            return Err(SerializeError::DuplicateKey(key.to_string()));
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<&InputValue, SerializeError> {
        self.entries
            .get(key)
            .ok_or_else(|| SerializeError::MissingKey(key.to_string()))
    }

    fn wrong_kind(key: &str, expected: &'static str, found: &InputValue) -> SerializeError {
        SerializeError::WrongKind {
            key: key.to_string(),
            expected,
            found: found.kind(),
        }
    }
}

impl ReasonerInputWriter for InputRecord {
    fn put_string(&mut self, key: &str, value: &str) -> Result<(), SerializeError> {
        self.put(key, InputValue::String(value.to_string()))
    }

    fn put_predicates(&mut self, key: &str, preds: &[Predicate]) -> Result<(), SerializeError> {
        self.put(key, InputValue::Predicates(preds.to_vec()))
    }

    fn put_expressions(&mut self, key: &str, exprs: &[Expression]) -> Result<(), SerializeError> {
        self.put(key, InputValue::Expressions(exprs.to_vec()))
    }
}

impl ReasonerInputReader for InputRecord {
    fn get_string(&self, key: &str) -> Result<String, SerializeError> {
        match self.lookup(key)? {
            InputValue::String(s) => Ok(s.clone()),
            other => Err(Self::wrong_kind(key, "a string", other)),
        }
    }

    fn get_predicates(&self, key: &str) -> Result<Vec<Predicate>, SerializeError> {
        match self.lookup(key)? {
            InputValue::Predicates(preds) => Ok(preds.clone()),
            other => Err(Self::wrong_kind(key, "predicates", other)),
        }
    }

    fn get_expressions(&self, key: &str) -> Result<Vec<Expression>, SerializeError> {
        match self.lookup(key)? {
            InputValue::Expressions(exprs) => Ok(exprs.clone()),
            other => Err(Self::wrong_kind(key, "expressions", other)),
        }
    }

    fn to_record(&self) -> InputRecord {
        self.clone()
    }
}

/// A field type that derived inputs know how to store.
pub trait InputField: Sized {
    fn write_field(
        &self,
        key: &str,
        writer: &mut dyn ReasonerInputWriter,
    ) -> Result<(), SerializeError>;

    fn read_field(key: &str, reader: &dyn ReasonerInputReader) -> Result<Self, SerializeError>;
}

fn single<T>(key: &str, mut values: Vec<T>) -> Result<T, SerializeError> {
    if values.len() != 1 {
        return Err(SerializeError::WrongArity {
            key: key.to_string(),
            expected: "exactly one",
            found: values.len(),
        });
    }
    values.pop().ok_or_else(|| SerializeError::MissingKey(key.to_string()))
}

impl InputField for String {
    fn write_field(
        &self,
        key: &str,
        writer: &mut dyn ReasonerInputWriter,
    ) -> Result<(), SerializeError> {
        writer.put_string(key, self)
    }

    fn read_field(key: &str, reader: &dyn ReasonerInputReader) -> Result<Self, SerializeError> {
        reader.get_string(key)
    }
}

impl InputField for Predicate {
    fn write_field(
        &self,
        key: &str,
        writer: &mut dyn ReasonerInputWriter,
    ) -> Result<(), SerializeError> {
        writer.put_predicates(key, std::slice::from_ref(self))
    }

    fn read_field(key: &str, reader: &dyn ReasonerInputReader) -> Result<Self, SerializeError> {
        single(key, reader.get_predicates(key)?)
    }
}

impl InputField for Option<Predicate> {
    fn write_field(
        &self,
        key: &str,
        writer: &mut dyn ReasonerInputWriter,
    ) -> Result<(), SerializeError> {
        writer.put_predicates(key, self.as_slice())
    }

    fn read_field(key: &str, reader: &dyn ReasonerInputReader) -> Result<Self, SerializeError> {
        let mut preds = reader.get_predicates(key)?;
        if preds.len() > 1 {
            return Err(SerializeError::WrongArity {
                key: key.to_string(),
                expected: "at most one",
                found: preds.len(),
            });
        }
        Ok(preds.pop())
    }
}

impl InputField for Vec<Predicate> {
    fn write_field(
        &self,
        key: &str,
        writer: &mut dyn ReasonerInputWriter,
    ) -> Result<(), SerializeError> {
        writer.put_predicates(key, self)
    }

    fn read_field(key: &str, reader: &dyn ReasonerInputReader) -> Result<Self, SerializeError> {
        reader.get_predicates(key)
    }
}

impl InputField for Expression {
    fn write_field(
        &self,
        key: &str,
        writer: &mut dyn ReasonerInputWriter,
    ) -> Result<(), SerializeError> {
        writer.put_expressions(key, std::slice::from_ref(self))
    }

    fn read_field(key: &str, reader: &dyn ReasonerInputReader) -> Result<Self, SerializeError> {
        single(key, reader.get_expressions(key)?)
    }
}

impl InputField for Vec<Expression> {
    fn write_field(
        &self,
        key: &str,
        writer: &mut dyn ReasonerInputWriter,
    ) -> Result<(), SerializeError> {
        writer.put_expressions(key, self)
    }

    fn read_field(key: &str, reader: &dyn ReasonerInputReader) -> Result<Self, SerializeError> {
        reader.get_expressions(key)
    }
}

/// Input of reasoners that need nothing but the sequent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ReasonerInput)]
pub struct EmptyInput;

/// Input kept verbatim for a reasoner that is not installed.
///
/// Writing it back reproduces the stored entries, so proofs using unknown
/// reasoners survive a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpaqueInput(pub InputRecord);

impl ReasonerInput for OpaqueInput {
    fn serialize(&self, writer: &mut dyn ReasonerInputWriter) -> Result<(), SerializeError> {
        for (key, value) in self.0.iter() {
            match value {
                InputValue::String(s) => writer.put_string(key, s)?,
                InputValue::Predicates(preds) => writer.put_predicates(key, preds)?,
                InputValue::Expressions(exprs) => writer.put_expressions(key, exprs)?,
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Expression;
    use pretty_assertions::assert_eq;

    fn x_lt(n: i64) -> Predicate {
        Predicate::lt(Expression::ident("x"), Expression::int(n))
    }

    #[derive(Debug, PartialEq, ReasonerInput)]
    struct Sample {
        #[input(key = "pred")]
        hyp: Predicate,
        maybe: Option<Predicate>,
        hyps: Vec<Predicate>,
        witness: Expression,
        name: String,
    }

    fn sample() -> Sample {
        Sample {
            hyp: x_lt(1),
            maybe: None,
            hyps: vec![x_lt(2), x_lt(3)],
            witness: Expression::int(4),
            name: "n".to_string(),
        }
    }

    #[test]
    fn test_derived_input_uses_field_keys() {
        let mut record = InputRecord::new();
        sample().serialize(&mut record).unwrap();

        assert_eq!(record.get("pred"), Some(&InputValue::Predicates(vec![x_lt(1)])));
        assert_eq!(record.get("maybe"), Some(&InputValue::Predicates(vec![])));
        assert_eq!(record.get("name"), Some(&InputValue::String("n".to_string())));
        assert!(record.get("hyp").is_none());
        assert_eq!(Sample::deserialize(&record).unwrap(), sample());
    }

    #[test]
    fn test_missing_key_and_wrong_kind() {
        let mut record = InputRecord::new();
        record.put_string("pred", "oops").unwrap();

        assert_eq!(
            Predicate::read_field("pred", &record),
            Err(SerializeError::WrongKind {
                key: "pred".to_string(),
                expected: "predicates",
                found: "a string",
            })
        );
        assert_eq!(
            String::read_field("other", &record),
            Err(SerializeError::MissingKey("other".to_string()))
        );
    }

    #[test]
    fn test_arity_is_checked() {
        let mut record = InputRecord::new();
        record.put_predicates("two", &[x_lt(1), x_lt(2)]).unwrap();

        assert!(matches!(
            Predicate::read_field("two", &record),
            Err(SerializeError::WrongArity { found: 2, .. })
        ));
        assert!(matches!(
            Option::<Predicate>::read_field("two", &record),
            Err(SerializeError::WrongArity { found: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let mut record = InputRecord::new();
        record.put_string("k", "a").unwrap();
        assert_eq!(
            record.put_string("k", "b"),
            Err(SerializeError::DuplicateKey("k".to_string()))
        );
    }

    #[test]
    fn test_opaque_input_writes_back_entries() {
        let mut record = InputRecord::new();
        record.put_string("a", "1").unwrap();
        record.put_expressions("e", &[Expression::int(2)]).unwrap();

        let opaque = OpaqueInput(record.to_record());
        let mut copy = InputRecord::new();
        opaque.serialize(&mut copy).unwrap();
        assert_eq!(copy, record);
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let mut record = InputRecord::new();
        EmptyInput.serialize(&mut record).unwrap();
        assert!(record.is_empty());
        assert_eq!(EmptyInput::deserialize(&record).unwrap(), EmptyInput);
    }
}
