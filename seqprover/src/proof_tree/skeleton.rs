//! Proof skeletons and their persistence records.
//!
//! A [`ProofSkeleton`] is the shape of a proof with no live tree identity:
//! the rule and comment of every node. It is what gets stored and later
//! replayed on a (possibly changed) sequent.
//!
//! [`SkeletonRecord`] is the storable form. Rules are recorded with the
//! encoded id of their reasoner and their input written through a
//! [`ReasonerInputWriter`](crate::reasoner::ReasonerInputWriter); reading a
//! record back asks the registered reasoner to deserialize the input.

use crate::confidence::Confidence;
use crate::error::Result;
use crate::formula::Predicate;
use crate::reasoner::{InputRecord, ReasonerDesc, ReasonerRegistry, SerializeError};
use crate::rule::{Antecedent, ProofRule};
use serde::{Deserialize, Serialize};

/// Rules and comments of a proof, without tree identity.
#[derive(Debug, Clone)]
pub struct ProofSkeleton {
    comment: String,
    rule: Option<ProofRule>,
    children: Vec<ProofSkeleton>,
}

impl ProofSkeleton {
    pub fn new(rule: Option<ProofRule>, children: Vec<ProofSkeleton>, comment: String) -> Self {
        Self {
            comment,
            rule,
            children,
        }
    }

    /// Skeleton of an open node.
    pub fn open() -> Self {
        Self::new(None, Vec::new(), String::new())
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn rule(&self) -> Option<&ProofRule> {
        self.rule.as_ref()
    }

    pub fn children(&self) -> &[ProofSkeleton] {
        &self.children
    }

    /// Number of rules in the skeleton.
    pub fn rule_count(&self) -> usize {
        usize::from(self.rule.is_some())
            + self.children.iter().map(ProofSkeleton::rule_count).sum::<usize>()
    }

    /// Structural equality using [`ProofRule::deep_equals`].
    pub fn deep_equals(&self, other: &ProofSkeleton) -> bool {
        let rules_equal = match (&self.rule, &other.rule) {
            (Some(a), Some(b)) => a.deep_equals(b),
            (None, None) => true,
            _ => false,
        };
        rules_equal
            && self.comment == other.comment
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.deep_equals(b))
    }

    /// Storable form of the skeleton.
    pub fn to_record(&self) -> std::result::Result<SkeletonRecord, SerializeError> {
        let rule = self.rule.as_ref().map(RuleRecord::from_rule).transpose()?;
        let children = self
            .children
            .iter()
            .map(ProofSkeleton::to_record)
            .collect::<std::result::Result<_, _>>()?;
        Ok(SkeletonRecord {
            comment: self.comment.clone(),
            rule,
            children,
        })
    }
}

/// Storable form of a [`ProofSkeleton`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    pub rule: Option<RuleRecord>,
    #[serde(default)]
    pub children: Vec<SkeletonRecord>,
}

impl SkeletonRecord {
    /// Rebuild the skeleton, deserializing every input with the reasoner
    /// registered for it. Unknown reasoners keep their input verbatim.
    pub fn into_skeleton(
        self,
        registry: &ReasonerRegistry,
    ) -> std::result::Result<ProofSkeleton, SerializeError> {
        let rule = self
            .rule
            .map(|record| record.into_rule(registry))
            .transpose()?;
        let children = self
            .children
            .into_iter()
            .map(|child| child.into_skeleton(registry))
            .collect::<std::result::Result<_, _>>()?;
        Ok(ProofSkeleton::new(rule, children, self.comment))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Storable form of a [`ProofRule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Encoded reasoner id, `id` or `id~version`.
    pub reasoner: String,
    pub display_name: String,
    pub confidence: Confidence,
    pub goal: Option<Predicate>,
    pub needed_hyps: Vec<Predicate>,
    pub antecedents: Vec<Antecedent>,
    pub input: InputRecord,
}

impl RuleRecord {
    pub fn from_rule(rule: &ProofRule) -> std::result::Result<Self, SerializeError> {
        let mut input = InputRecord::new();
        rule.generated_using().serialize(&mut input)?;
        Ok(Self {
            reasoner: rule.generated_by().encoded(),
            display_name: rule.display_name().to_string(),
            confidence: rule.confidence(),
            goal: rule.goal().cloned(),
            needed_hyps: rule.needed_hyps().iter().cloned().collect(),
            antecedents: rule.antecedents().to_vec(),
            input,
        })
    }

    pub fn into_rule(
        self,
        registry: &ReasonerRegistry,
    ) -> std::result::Result<ProofRule, SerializeError> {
        let desc = ReasonerDesc::decode(&self.reasoner)?;
        let reasoner = registry.lookup(&desc);
        let input = reasoner.deserialize_input(&self.input)?;

        let mut builder = ProofRule::builder(desc, input)
            .display_name(self.display_name)
            .confidence(self.confidence)
            .needed_hyps(self.needed_hyps)
            .antecedents(self.antecedents);
        if let Some(goal) = self.goal {
            builder = builder.goal(goal);
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Expression, TypeEnvironment};
    use crate::proof_tree::ProofTree;
    use crate::reasoner::input::OpaqueInput;
    use crate::reasoner::{NullMonitor, Reasoner, ReasonerInput};
    use crate::reasoners::{ConjE, HypInput, TrueGoal};
    use crate::sequent::Sequent;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn p(n: i64) -> Predicate {
        Predicate::eq(Expression::int(n), Expression::int(n))
    }

    fn closed_tree() -> ProofTree {
        let conj = Predicate::and([p(1), Predicate::True]);
        let seq = Sequent::builder(TypeEnvironment::new())
            .selected(conj.clone())
            .goal(Predicate::True)
            .build()
            .unwrap();
        let mut tree = ProofTree::new(seq.clone());
        let root = tree.root();

        let input: Arc<dyn ReasonerInput> = Arc::new(HypInput::new(conj));
        let split = ConjE.apply(&seq, &input, &NullMonitor).into_rule().unwrap();
        assert!(tree.apply_rule(root, &split));
        tree.set_comment(root, "split first");

        let child = tree.children(root)[0];
        let child_seq = tree.node(child).unwrap().sequent().clone();
        let empty: Arc<dyn ReasonerInput> = Arc::new(crate::reasoner::EmptyInput);
        let close = TrueGoal.apply(&child_seq, &empty, &NullMonitor).into_rule().unwrap();
        assert!(tree.apply_rule(child, &close));
        tree
    }

    #[test]
    fn test_record_round_trip_through_registry() {
        let tree = closed_tree();
        let skeleton = tree.copy_proof_skeleton(tree.root()).unwrap();
        let record = skeleton.to_record().unwrap();
        assert_eq!(record.comment, "split first");
        assert_eq!(skeleton.rule_count(), 2);

        let registry = ReasonerRegistry::with_builtin();
        let back = record.clone().into_skeleton(&registry).unwrap();
        assert!(back.deep_equals(&skeleton));
        assert_eq!(back.to_record().unwrap(), record);
    }

    #[test]
    fn test_json_interchange() {
        let tree = closed_tree();
        let record = tree
            .copy_proof_skeleton(tree.root())
            .unwrap()
            .to_record()
            .unwrap();
        let json = record.to_json().unwrap();
        assert_eq!(SkeletonRecord::from_json(&json).unwrap(), record);
        assert!(SkeletonRecord::from_json("{").is_err());
    }

    #[test]
    fn test_json_rejects_out_of_range_confidence() {
        let tree = closed_tree();
        let record = tree
            .copy_proof_skeleton(tree.root())
            .unwrap()
            .to_record()
            .unwrap();
        let json = record.to_json().unwrap();
        assert!(json.contains("\"confidence\": 1000"));

        for bad in ["0", "5000"] {
            let tampered =
                json.replace("\"confidence\": 1000", &format!("\"confidence\": {bad}"));
            assert!(SkeletonRecord::from_json(&tampered).is_err());
        }
    }

    #[test]
    fn test_unknown_reasoner_keeps_input() {
        let tree = closed_tree();
        let mut record = tree
            .copy_proof_skeleton(tree.root())
            .unwrap()
            .to_record()
            .unwrap();
        record.rule.as_mut().unwrap().reasoner = "elsewhere~4".to_string();

        let skeleton = record.clone().into_skeleton(&ReasonerRegistry::new()).unwrap();
        let rule = skeleton.rule().unwrap();
        assert_eq!(rule.generated_by(), &ReasonerDesc::new("elsewhere", Some(4)));
        assert!(rule.generated_using().as_any().is::<OpaqueInput>());
        assert_eq!(skeleton.to_record().unwrap().rule, record.rule);
    }

    #[test]
    fn test_malformed_reasoner_id() {
        let tree = closed_tree();
        let mut record = tree
            .copy_proof_skeleton(tree.root())
            .unwrap()
            .to_record()
            .unwrap();
        record.rule.as_mut().unwrap().reasoner = "bad~x".to_string();
        assert_eq!(
            record.into_skeleton(&ReasonerRegistry::new()).unwrap_err(),
            SerializeError::MalformedId("bad~x".to_string())
        );
    }
}
