//! Predicate, expression and type trees.
//!
//! All trees are plain values with structural equality and hashing, which is
//! what the kernel relies on when it stores them in hypothesis sets.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
    /// Integers (`ℤ`).
    Integer,
    /// Booleans (`BOOL`).
    Boolean,
    /// A carrier set introduced by a model (e.g. `S`).
    Given(String),
    /// Power set of a type (`ℙ(T)`).
    PowerSet(Box<Type>),
}

impl Type {
    /// Create a given-set type.
    pub fn given(name: impl Into<String>) -> Self {
        Self::Given(name.into())
    }

    /// Create the power set of a type.
    pub fn power_set(base: Type) -> Self {
        Self::PowerSet(Box::new(base))
    }

    /// Element type if this is a power set.
    pub fn base_type(&self) -> Option<&Type> {
        match self {
            Self::PowerSet(base) => Some(base),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "ℤ"),
            Self::Boolean => write!(f, "BOOL"),
            Self::Given(name) => write!(f, "{}", name),
            Self::PowerSet(base) => write!(f, "ℙ({})", base),
        }
    }
}

/// Free identifier together with its type.
///
/// Used both for identifiers introduced by antecedents and for the
/// identifiers a proof depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FreeIdentifier {
    /// Identifier name.
    pub name: String,
    /// Declared type.
    pub ty: Type,
}

impl FreeIdentifier {
    /// Create a new free identifier.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Expression referring to this identifier.
    pub fn to_expression(&self) -> Expression {
        Expression::Ident(self.name.clone())
    }
}

impl fmt::Display for FreeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ⦂ {}", self.name, self.ty)
    }
}

/// Identifier declared by a quantifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundIdentifier {
    /// Declared name.
    pub name: String,
    /// Declared type.
    pub ty: Type,
}

impl BoundIdentifier {
    /// Create a new bound identifier declaration.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    Plus,
    Minus,
    Times,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "−"),
            Self::Times => write!(f, "∗"),
        }
    }
}

/// Expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    /// Identifier reference (free or bound, resolved by scope).
    Ident(String),
    /// Integer literal.
    Integer(i64),
    /// Binary arithmetic.
    Binary {
        op: ArithOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
}

impl Expression {
    /// Identifier reference.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    /// Integer literal.
    pub fn int(value: i64) -> Self {
        Self::Integer(value)
    }

    /// `lhs + rhs`.
    pub fn plus(lhs: Expression, rhs: Expression) -> Self {
        Self::binary(ArithOp::Plus, lhs, rhs)
    }

    /// `lhs − rhs`.
    pub fn minus(lhs: Expression, rhs: Expression) -> Self {
        Self::binary(ArithOp::Minus, lhs, rhs)
    }

    /// `lhs ∗ rhs`.
    pub fn times(lhs: Expression, rhs: Expression) -> Self {
        Self::binary(ArithOp::Times, lhs, rhs)
    }

    fn binary(op: ArithOp, lhs: Expression, rhs: Expression) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Free identifiers in order of first occurrence.
    pub fn free_identifiers(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        self.collect_free(&mut Vec::new(), &mut out);
        out
    }

    fn collect_free(&self, bound: &mut Vec<String>, out: &mut IndexSet<String>) {
        match self {
            Self::Ident(name) => {
                if !bound.iter().any(|b| b == name) {
                    out.insert(name.clone());
                }
            }
            Self::Integer(_) => {}
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_free(bound, out);
                rhs.collect_free(bound, out);
            }
        }
    }

    fn rename_free(&self, from: &str, to: &str) -> Expression {
        match self {
            Self::Ident(name) if name == from => Self::Ident(to.to_string()),
            Self::Ident(_) | Self::Integer(_) => self.clone(),
            Self::Binary { op, lhs, rhs } => Self::Binary {
                op: *op,
                lhs: Box::new(lhs.rename_free(from, to)),
                rhs: Box::new(rhs.rename_free(from, to)),
            },
        }
    }

    fn collect_names(&self, out: &mut IndexSet<String>) {
        match self {
            Self::Ident(name) => {
                out.insert(name.clone());
            }
            Self::Integer(_) => {}
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_names(out);
                rhs.collect_names(out);
            }
        }
    }

    fn is_atomic(&self) -> bool {
        !matches!(self, Self::Binary { .. })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "{}", name),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Binary { op, lhs, rhs } => {
                write_expr_operand(f, lhs)?;
                write!(f, " {} ", op)?;
                write_expr_operand(f, rhs)
            }
        }
    }
}

fn write_expr_operand(f: &mut fmt::Formatter<'_>, expr: &Expression) -> fmt::Result {
    if expr.is_atomic() {
        write!(f, "{}", expr)
    } else {
        write!(f, "({})", expr)
    }
}

/// Relational operators between two expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelOp {
    /// Equality, both sides of the same type.
    Eq,
    /// Integer strict ordering.
    Lt,
    /// Integer ordering.
    Le,
    /// Set membership, `lhs ∈ rhs` with `rhs : ℙ(type of lhs)`.
    In,
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "≤"),
            Self::In => write!(f, "∈"),
        }
    }
}

/// Predicate tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    /// `⊤`
    True,
    /// `⊥`
    False,
    /// `¬P`
    Not(Box<Predicate>),
    /// `P₁ ∧ … ∧ Pₙ`
    And(Vec<Predicate>),
    /// `P₁ ∨ … ∨ Pₙ`
    Or(Vec<Predicate>),
    /// `P ⇒ Q`
    Implies(Box<Predicate>, Box<Predicate>),
    /// `P ⇔ Q`
    Equiv(Box<Predicate>, Box<Predicate>),
    /// Relation between two expressions.
    Relation {
        op: RelOp,
        lhs: Expression,
        rhs: Expression,
    },
    /// `∀x,…·P`
    Forall {
        bound: Vec<BoundIdentifier>,
        body: Box<Predicate>,
    },
    /// `∃x,…·P`
    Exists {
        bound: Vec<BoundIdentifier>,
        body: Box<Predicate>,
    },
}

impl Predicate {
    /// `¬p`
    pub fn not(p: Predicate) -> Self {
        Self::Not(Box::new(p))
    }

    /// Conjunction of the given predicates.
    pub fn and(conjuncts: impl IntoIterator<Item = Predicate>) -> Self {
        Self::And(conjuncts.into_iter().collect())
    }

    /// Disjunction of the given predicates.
    pub fn or(disjuncts: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Or(disjuncts.into_iter().collect())
    }

    /// `lhs ⇒ rhs`
    pub fn implies(lhs: Predicate, rhs: Predicate) -> Self {
        Self::Implies(Box::new(lhs), Box::new(rhs))
    }

    /// `lhs ⇔ rhs`
    pub fn equiv(lhs: Predicate, rhs: Predicate) -> Self {
        Self::Equiv(Box::new(lhs), Box::new(rhs))
    }

    /// `lhs = rhs`
    pub fn eq(lhs: Expression, rhs: Expression) -> Self {
        Self::relation(RelOp::Eq, lhs, rhs)
    }

    /// `lhs < rhs`
    pub fn lt(lhs: Expression, rhs: Expression) -> Self {
        Self::relation(RelOp::Lt, lhs, rhs)
    }

    /// `lhs ≤ rhs`
    pub fn le(lhs: Expression, rhs: Expression) -> Self {
        Self::relation(RelOp::Le, lhs, rhs)
    }

    /// `lhs ∈ rhs`
    pub fn member(lhs: Expression, rhs: Expression) -> Self {
        Self::relation(RelOp::In, lhs, rhs)
    }

    /// Relation between two expressions.
    pub fn relation(op: RelOp, lhs: Expression, rhs: Expression) -> Self {
        Self::Relation { op, lhs, rhs }
    }

    /// Universal quantification.
    pub fn forall(bound: Vec<BoundIdentifier>, body: Predicate) -> Self {
        Self::Forall {
            bound,
            body: Box::new(body),
        }
    }

    /// Existential quantification.
    pub fn exists(bound: Vec<BoundIdentifier>, body: Predicate) -> Self {
        Self::Exists {
            bound,
            body: Box::new(body),
        }
    }

    /// Conjuncts if this is a conjunction.
    pub fn conjuncts(&self) -> Option<&[Predicate]> {
        match self {
            Self::And(conjuncts) => Some(conjuncts),
            _ => None,
        }
    }

    /// Free identifiers in order of first occurrence.
    pub fn free_identifiers(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        self.collect_free(&mut Vec::new(), &mut out);
        out
    }

    fn collect_free(&self, bound: &mut Vec<String>, out: &mut IndexSet<String>) {
        match self {
            Self::True | Self::False => {}
            Self::Not(p) => p.collect_free(bound, out),
            Self::And(ps) | Self::Or(ps) => {
                for p in ps {
                    p.collect_free(bound, out);
                }
            }
            Self::Implies(lhs, rhs) | Self::Equiv(lhs, rhs) => {
                lhs.collect_free(bound, out);
                rhs.collect_free(bound, out);
            }
            Self::Relation { lhs, rhs, .. } => {
                lhs.collect_free(bound, out);
                rhs.collect_free(bound, out);
            }
            Self::Forall { bound: decls, body } | Self::Exists { bound: decls, body } => {
                let depth = bound.len();
                bound.extend(decls.iter().map(|d| d.name.clone()));
                body.collect_free(bound, out);
                bound.truncate(depth);
            }
        }
    }

    /// Every identifier name occurring in the predicate, including bound
    /// declarations. Used to pick names that cannot be captured.
    pub fn identifier_names(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names(&self, out: &mut IndexSet<String>) {
        match self {
            Self::True | Self::False => {}
            Self::Not(p) => p.collect_names(out),
            Self::And(ps) | Self::Or(ps) => {
                for p in ps {
                    p.collect_names(out);
                }
            }
            Self::Implies(lhs, rhs) | Self::Equiv(lhs, rhs) => {
                lhs.collect_names(out);
                rhs.collect_names(out);
            }
            Self::Relation { lhs, rhs, .. } => {
                lhs.collect_names(out);
                rhs.collect_names(out);
            }
            Self::Forall { bound, body } | Self::Exists { bound, body } => {
                out.extend(bound.iter().map(|d| d.name.clone()));
                body.collect_names(out);
            }
        }
    }

    /// Rename the free occurrences of `from` to `to`.
    ///
    /// Occurrences under a quantifier that rebinds `from` are left alone.
    /// The caller picks `to` so that it is not bound anywhere in `self`.
    pub fn rename_free(&self, from: &str, to: &str) -> Predicate {
        match self {
            Self::True | Self::False => self.clone(),
            Self::Not(p) => Self::not(p.rename_free(from, to)),
            Self::And(ps) => Self::And(ps.iter().map(|p| p.rename_free(from, to)).collect()),
            Self::Or(ps) => Self::Or(ps.iter().map(|p| p.rename_free(from, to)).collect()),
            Self::Implies(lhs, rhs) => {
                Self::implies(lhs.rename_free(from, to), rhs.rename_free(from, to))
            }
            Self::Equiv(lhs, rhs) => {
                Self::equiv(lhs.rename_free(from, to), rhs.rename_free(from, to))
            }
            Self::Relation { op, lhs, rhs } => Self::Relation {
                op: *op,
                lhs: lhs.rename_free(from, to),
                rhs: rhs.rename_free(from, to),
            },
            Self::Forall { bound, body } | Self::Exists { bound, body } => {
                let body = if bound.iter().any(|d| d.name == from) {
                    body.as_ref().clone()
                } else {
                    body.rename_free(from, to)
                };
                if matches!(self, Self::Forall { .. }) {
                    Self::forall(bound.clone(), body)
                } else {
                    Self::exists(bound.clone(), body)
                }
            }
        }
    }

    /// Body of a quantified predicate with its bound identifiers replaced by
    /// `fresh`, in declaration order.
    ///
    /// Returns `None` when `self` is not quantified or the arities differ.
    /// Fresh names must not occur in `self`.
    pub fn instantiate(&self, fresh: &[FreeIdentifier]) -> Option<Predicate> {
        let (Self::Forall { bound, body } | Self::Exists { bound, body }) = self else {
            return None;
        };
        if bound.len() != fresh.len() {
            return None;
        }
        Some(
            bound
                .iter()
                .zip(fresh)
                .fold(body.as_ref().clone(), |acc, (decl, ident)| {
                    acc.rename_free(&decl.name, &ident.name)
                }),
        )
    }

    fn is_atomic(&self) -> bool {
        matches!(
            self,
            Self::True | Self::False | Self::Not(_) | Self::Relation { .. }
        )
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "⊤"),
            Self::False => write!(f, "⊥"),
            Self::Not(p) => {
                write!(f, "¬")?;
                write_pred_operand(f, p)
            }
            Self::And(ps) => write_joined(f, ps, " ∧ "),
            Self::Or(ps) => write_joined(f, ps, " ∨ "),
            Self::Implies(lhs, rhs) => {
                write_pred_operand(f, lhs)?;
                write!(f, " ⇒ ")?;
                write_pred_operand(f, rhs)
            }
            Self::Equiv(lhs, rhs) => {
                write_pred_operand(f, lhs)?;
                write!(f, " ⇔ ")?;
                write_pred_operand(f, rhs)
            }
            Self::Relation { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
            Self::Forall { bound, body } => write_quantified(f, "∀", bound, body),
            Self::Exists { bound, body } => write_quantified(f, "∃", bound, body),
        }
    }
}

fn write_pred_operand(f: &mut fmt::Formatter<'_>, p: &Predicate) -> fmt::Result {
    if p.is_atomic() {
        write!(f, "{}", p)
    } else {
        write!(f, "({})", p)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, ps: &[Predicate], sep: &str) -> fmt::Result {
    for (i, p) in ps.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write_pred_operand(f, p)?;
    }
    Ok(())
}

fn write_quantified(
    f: &mut fmt::Formatter<'_>,
    symbol: &str,
    bound: &[BoundIdentifier],
    body: &Predicate,
) -> fmt::Result {
    let names: Vec<&str> = bound.iter().map(|d| d.name.as_str()).collect();
    write!(f, "{}{}·", symbol, names.join(","))?;
    write_pred_operand(f, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expression {
        Expression::ident("x")
    }

    #[test]
    fn test_display_connectives() {
        let p = Predicate::and([
            Predicate::eq(x(), Expression::int(1)),
            Predicate::implies(Predicate::True, Predicate::not(Predicate::False)),
        ]);
        assert_eq!(p.to_string(), "x = 1 ∧ (⊤ ⇒ ¬⊥)");
    }

    #[test]
    fn test_display_quantifier_and_arith() {
        let p = Predicate::forall(
            vec![BoundIdentifier::new("y", Type::Integer)],
            Predicate::le(x(), Expression::plus(Expression::ident("y"), Expression::int(2))),
        );
        assert_eq!(p.to_string(), "∀y·x ≤ y + 2");
        assert_eq!(Type::power_set(Type::given("S")).to_string(), "ℙ(S)");
    }

    #[test]
    fn test_free_identifiers_skip_bound() {
        let p = Predicate::exists(
            vec![BoundIdentifier::new("y", Type::Integer)],
            Predicate::lt(Expression::ident("y"), Expression::plus(x(), Expression::ident("z"))),
        );
        let free: Vec<String> = p.free_identifiers().into_iter().collect();
        assert_eq!(free, vec!["x".to_string(), "z".to_string()]);
        assert!(p.identifier_names().contains("y"));
    }

    #[test]
    fn test_rename_free_respects_shadowing() {
        let inner = Predicate::forall(
            vec![BoundIdentifier::new("x", Type::Integer)],
            Predicate::eq(x(), Expression::int(0)),
        );
        let p = Predicate::and([Predicate::eq(x(), Expression::int(1)), inner.clone()]);

        let renamed = p.rename_free("x", "x0");
        assert_eq!(
            renamed,
            Predicate::and([Predicate::eq(Expression::ident("x0"), Expression::int(1)), inner])
        );
    }

    #[test]
    fn test_instantiate_quantifier() {
        let p = Predicate::forall(
            vec![BoundIdentifier::new("y", Type::Integer)],
            Predicate::lt(x(), Expression::ident("y")),
        );
        let fresh = [FreeIdentifier::new("y0", Type::Integer)];
        assert_eq!(
            p.instantiate(&fresh),
            Some(Predicate::lt(x(), Expression::ident("y0")))
        );
        assert_eq!(Predicate::True.instantiate(&fresh), None);
        assert_eq!(p.instantiate(&[]), None);
    }

    #[test]
    fn test_structural_equality() {
        let a = Predicate::eq(x(), Expression::int(1));
        let b = Predicate::eq(Expression::ident("x"), Expression::int(1));
        assert_eq!(a, b);
        assert_ne!(a, Predicate::eq(x(), Expression::int(2)));
    }
}
