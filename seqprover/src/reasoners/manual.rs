//! Reasoners driven by user decisions: manual review and hypothesis
//! management.

use crate::confidence::Confidence;
use crate::formula::Predicate;
use crate::reasoner::input::InputField;
use crate::reasoner::{
    check_hypothesis, deserialize_as, make_failure, reasoner_desc, typed_input, DeserializeInput,
    ProofMonitor, Reasoner, ReasonerInput, ReasonerInputReader, ReasonerInputWriter,
    ReasonerOutput, SerializeError,
};
use crate::rule::{Antecedent, ProofRule};
use crate::sequent::{HypothesisAction, Sequent};
use std::any::Any;
use std::sync::Arc;

use super::{MNG_HYP_ID, REVIEW_ID};

/// A user's claim that the goal follows from some hypotheses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    pub hyps: Vec<Predicate>,
    pub goal: Predicate,
    /// Raw confidence; must lie in the review band.
    pub confidence: u32,
    pub comment: String,
}

impl ReviewInput {
    pub fn new(hyps: Vec<Predicate>, goal: Predicate, confidence: u32) -> Self {
        Self {
            hyps,
            goal,
            confidence,
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    fn reviewed_confidence(&self) -> Option<Confidence> {
        Confidence::new(self.confidence).filter(|c| c.is_reviewed())
    }
}

impl ReasonerInput for ReviewInput {
    fn error(&self) -> Option<String> {
        match self.reviewed_confidence() {
            Some(_) => None,
            None => Some(format!(
                "Confidence {} is outside the review band (0, {}]",
                self.confidence,
                Confidence::REVIEWED_MAX.value()
            )),
        }
    }

    fn serialize(&self, writer: &mut dyn ReasonerInputWriter) -> Result<(), SerializeError> {
        writer.put_predicates("hyps", &self.hyps)?;
        self.goal.write_field("goal", writer)?;
        writer.put_string("confidence", &self.confidence.to_string())?;
        writer.put_string("comment", &self.comment)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DeserializeInput for ReviewInput {
    fn deserialize(reader: &dyn ReasonerInputReader) -> Result<Self, SerializeError> {
        let raw = reader.get_string("confidence")?;
        let invalid = |reason: String| SerializeError::InvalidValue {
            key: "confidence".to_string(),
            reason,
        };
        let confidence: u32 = raw
            .parse()
            .map_err(|_| invalid(format!("'{}' is not a number", raw)))?;
        let input = Self {
            hyps: reader.get_predicates("hyps")?,
            goal: Predicate::read_field("goal", reader)?,
            confidence,
            comment: reader.get_string("comment")?,
        };
        if let Some(reason) = input.error() {
            return Err(invalid(reason));
        }
        Ok(input)
    }
}

/// Closes a goal on the strength of a manual review.
///
/// Versioned: version 2 records the reviewed hypotheses as needed
/// hypotheses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Review;

impl Reasoner for Review {
    fn id(&self) -> &str {
        REVIEW_ID
    }

    fn version(&self) -> Option<u32> {
        Some(2)
    }

    fn apply(
        &self,
        seq: &Sequent,
        input: &Arc<dyn ReasonerInput>,
        _monitor: &dyn ProofMonitor,
    ) -> ReasonerOutput {
        let review = match typed_input::<ReviewInput>(input) {
            Ok(review) => review,
            Err(reason) => return make_failure(self, input, reason),
        };
        if &review.goal != seq.goal() {
            return make_failure(self, input, "Reviewed goal is not the sequent goal");
        }
        for hyp in &review.hyps {
            if let Err(reason) = check_hypothesis(seq, hyp) {
                return make_failure(self, input, reason);
            }
        }
        let Some(confidence) = review.reviewed_confidence() else {
            return make_failure(self, input, "Invalid review confidence");
        };

        let rule = ProofRule::builder(reasoner_desc(self), Arc::clone(input))
            .display_name("review")
            .goal(review.goal.clone())
            .needed_hyps(review.hyps.iter().cloned())
            .confidence(confidence)
            .build();
        ReasonerOutput::Rule(rule)
    }

    fn deserialize_input(
        &self,
        reader: &dyn ReasonerInputReader,
    ) -> Result<Arc<dyn ReasonerInput>, SerializeError> {
        deserialize_as::<ReviewInput>(reader)
    }
}

/// A list of selection actions to run on the sequent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MngHypInput(pub Vec<HypothesisAction>);

impl MngHypInput {
    pub fn new(actions: Vec<HypothesisAction>) -> Self {
        Self(actions)
    }

    pub fn actions(&self) -> &[HypothesisAction] {
        &self.0
    }

    fn decode(kind: &str, hyps: Vec<Predicate>) -> Option<HypothesisAction> {
        match kind {
            "SELECT" => Some(HypothesisAction::Select(hyps)),
            "DESELECT" => Some(HypothesisAction::Deselect(hyps)),
            "HIDE" => Some(HypothesisAction::Hide(hyps)),
            "SHOW" => Some(HypothesisAction::Show(hyps)),
            _ => None,
        }
    }
}

impl ReasonerInput for MngHypInput {
    fn error(&self) -> Option<String> {
        self.0
            .iter()
            .find(|action| !action.is_selection())
            .map(|action| format!("Not a selection action: {}", action.action_type()))
    }

    fn serialize(&self, writer: &mut dyn ReasonerInputWriter) -> Result<(), SerializeError> {
        writer.put_string("count", &self.0.len().to_string())?;
        for (i, action) in self.0.iter().enumerate() {
            writer.put_string(&format!("action{}", i), action.action_type())?;
            writer.put_predicates(&format!("hyps{}", i), action.referenced_hyps())?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DeserializeInput for MngHypInput {
    fn deserialize(reader: &dyn ReasonerInputReader) -> Result<Self, SerializeError> {
        let raw = reader.get_string("count")?;
        let count: usize = raw.parse().map_err(|_| SerializeError::InvalidValue {
            key: "count".to_string(),
            reason: format!("'{}' is not a number", raw),
        })?;
        let actions = (0..count)
            .map(|i| {
                let key = format!("action{}", i);
                let kind = reader.get_string(&key)?;
                let hyps = reader.get_predicates(&format!("hyps{}", i))?;
                Self::decode(&kind, hyps).ok_or_else(|| SerializeError::InvalidValue {
                    key,
                    reason: format!("unknown action type '{}'", kind),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self(actions))
    }
}

/// Runs selection actions on the sequent without changing its goal.
#[derive(Debug, Clone, Copy, Default)]
pub struct MngHyp;

impl Reasoner for MngHyp {
    fn id(&self) -> &str {
        MNG_HYP_ID
    }

    fn apply(
        &self,
        _seq: &Sequent,
        input: &Arc<dyn ReasonerInput>,
        _monitor: &dyn ProofMonitor,
    ) -> ReasonerOutput {
        let actions = match typed_input::<MngHypInput>(input) {
            Ok(typed) => typed.actions(),
            Err(reason) => return make_failure(self, input, reason),
        };
        if actions.is_empty() {
            return make_failure(self, input, "No hypothesis actions");
        }
        let antecedent = Antecedent::inherit_goal().with_hyp_actions(actions.iter().cloned());
        let rule = ProofRule::builder(reasoner_desc(self), Arc::clone(input))
            .display_name("mh")
            .antecedent(antecedent)
            .build();
        ReasonerOutput::Rule(rule)
    }

    fn deserialize_input(
        &self,
        reader: &dyn ReasonerInputReader,
    ) -> Result<Arc<dyn ReasonerInput>, SerializeError> {
        deserialize_as::<MngHypInput>(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Expression, FreeIdentifier, Type, TypeEnvironment};
    use crate::reasoner::{InputRecord, NullMonitor};
    use pretty_assertions::assert_eq;

    fn x_lt(n: i64) -> Predicate {
        Predicate::lt(Expression::ident("x"), Expression::int(n))
    }

    fn seq() -> Sequent {
        let mut env = TypeEnvironment::new();
        env.add_name("x", Type::Integer).unwrap();
        Sequent::builder(env)
            .selected(x_lt(1))
            .hypothesis(x_lt(2))
            .goal(x_lt(3))
            .build()
            .unwrap()
    }

    fn run(reasoner: &dyn Reasoner, input: impl ReasonerInput) -> ReasonerOutput {
        let input: Arc<dyn ReasonerInput> = Arc::new(input);
        reasoner.apply(&seq(), &input, &NullMonitor)
    }

    #[test]
    fn test_review_sets_confidence() {
        let rule = run(&Review, ReviewInput::new(vec![x_lt(1)], x_lt(3), 120))
            .into_rule()
            .unwrap();
        assert_eq!(rule.confidence().value(), 120);
        assert_eq!(rule.generated_by().version, Some(2));
        assert!(rule.needed_hyps().contains(&x_lt(1)));
        assert!(rule.apply(&seq()).unwrap().is_empty());
    }

    #[test]
    fn test_review_rejects_bad_input() {
        assert!(!run(&Review, ReviewInput::new(vec![], x_lt(4), 100)).is_success());
        assert!(!run(&Review, ReviewInput::new(vec![x_lt(9)], x_lt(3), 100)).is_success());
        let output = run(&Review, ReviewInput::new(vec![], x_lt(3), 900));
        assert!(output.failure().unwrap().reason.contains("review band"));
    }

    #[test]
    fn test_review_input_round_trip() {
        let input = ReviewInput::new(vec![x_lt(1)], x_lt(3), 500).with_comment("checked");
        let mut record = InputRecord::new();
        input.serialize(&mut record).unwrap();
        assert_eq!(ReviewInput::deserialize(&record).unwrap(), input);
    }

    #[test]
    fn test_review_input_rejects_out_of_band_confidence() {
        let mut record = InputRecord::new();
        record.put_predicates("hyps", &[]).unwrap();
        record.put_predicates("goal", &[x_lt(3)]).unwrap();
        record.put_string("confidence", "1000").unwrap();
        record.put_string("comment", "").unwrap();
        assert!(matches!(
            ReviewInput::deserialize(&record),
            Err(SerializeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_mng_hyp_applies_actions() {
        let input = MngHypInput::new(vec![
            HypothesisAction::select([x_lt(2)]),
            HypothesisAction::deselect([x_lt(1)]),
        ]);
        let rule = run(&MngHyp, input).into_rule().unwrap();
        let child = &rule.apply(&seq()).unwrap()[0];
        assert!(child.is_selected(&x_lt(2)));
        assert!(!child.is_selected(&x_lt(1)));
        assert_eq!(child.goal(), &x_lt(3));
    }

    #[test]
    fn test_mng_hyp_rejects_forward_inference() {
        let input = MngHypInput::new(vec![HypothesisAction::forward_inference(
            [x_lt(1)],
            Vec::<FreeIdentifier>::new(),
            [x_lt(5)],
        )]);
        assert!(input.error().is_some());
        assert!(!run(&MngHyp, input).is_success());
        assert!(!run(&MngHyp, MngHypInput::default()).is_success());
    }

    #[test]
    fn test_mng_hyp_input_round_trip() {
        let input = MngHypInput::new(vec![
            HypothesisAction::hide([x_lt(1), x_lt(2)]),
            HypothesisAction::show([x_lt(2)]),
        ]);
        let mut record = InputRecord::new();
        input.serialize(&mut record).unwrap();
        assert_eq!(MngHypInput::deserialize(&record).unwrap(), input);

        let mut bad = InputRecord::new();
        bad.put_string("count", "1").unwrap();
        bad.put_string("action0", "FORWARD_INF").unwrap();
        bad.put_predicates("hyps0", &[]).unwrap();
        assert!(MngHypInput::deserialize(&bad).is_err());
    }
}
