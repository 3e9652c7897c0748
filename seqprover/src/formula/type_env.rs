//! Type environments and closed type-checking.

use crate::error::{Error, Result};
use crate::formula::ast::{Expression, FreeIdentifier, Predicate, RelOp, Type};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// Mapping from free identifier names to types.
///
/// Cloning is cheap: the map is shared until one of the copies is modified,
/// so the sequents of one proof family share a single environment for as
/// long as no fresh identifier is introduced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeEnvironment {
    names: Arc<IndexMap<String, Type>>,
}

impl TypeEnvironment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether two environments share the same underlying map.
    pub fn ptr_eq(a: &TypeEnvironment, b: &TypeEnvironment) -> bool {
        Arc::ptr_eq(&a.names, &b.names)
    }

    /// Add a fresh identifier. Fails if the name is already declared.
    pub fn add_name(&mut self, name: impl Into<String>, ty: Type) -> Result<()> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(Error::name_clash(name));
        }
        Arc::make_mut(&mut self.names).insert(name, ty);
        Ok(())
    }

    /// Add several fresh identifiers at once.
    ///
    /// Either all identifiers are added or, on the first clash (with the
    /// environment or among the identifiers themselves), none is.
    pub fn add_all(&mut self, idents: &[FreeIdentifier]) -> Result<()> {
        if let Some(name) = self.first_clash(idents) {
            return Err(Error::name_clash(name));
        }
        if idents.is_empty() {
            return Ok(());
        }
        let names = Arc::make_mut(&mut self.names);
        for ident in idents {
            names.insert(ident.name.clone(), ident.ty.clone());
        }
        Ok(())
    }

    /// Copy of this environment extended with fresh identifiers.
    ///
    /// Returns a clone sharing the same map when `idents` is empty.
    pub fn with_identifiers(&self, idents: &[FreeIdentifier]) -> Result<Self> {
        let mut env = self.clone();
        env.add_all(idents)?;
        Ok(env)
    }

    fn first_clash(&self, idents: &[FreeIdentifier]) -> Option<String> {
        let mut seen = IndexSet::new();
        for ident in idents {
            if self.names.contains_key(&ident.name) || !seen.insert(ident.name.as_str()) {
                return Some(ident.name.clone());
            }
        }
        None
    }

    /// Set the type of a name, replacing any previous declaration.
    ///
    /// Only used for environments that record dependencies rather than
    /// declarations.
    pub(crate) fn set(&mut self, name: impl Into<String>, ty: Type) {
        Arc::make_mut(&mut self.names).insert(name.into(), ty);
    }

    /// Remove a name, returning its type if it was declared.
    pub fn remove(&mut self, name: &str) -> Option<Type> {
        if !self.names.contains_key(name) {
            return None;
        }
        Arc::make_mut(&mut self.names).shift_remove(name)
    }

    /// Add every declaration of `other` whose name is not yet present.
    pub fn merge(&mut self, other: &TypeEnvironment) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            self.names = Arc::clone(&other.names);
            return;
        }
        let names = Arc::make_mut(&mut self.names);
        for (name, ty) in other.names.iter() {
            names.entry(name.clone()).or_insert_with(|| ty.clone());
        }
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Type of `name`, if declared.
    pub fn get(&self, name: &str) -> Option<&Type> {
        self.names.get(name)
    }

    /// Whether every declaration of `other` is present here with the same type.
    pub fn contains_all(&self, other: &TypeEnvironment) -> bool {
        other
            .names
            .iter()
            .all(|(name, ty)| self.names.get(name) == Some(ty))
    }

    /// Names from `names` that are already declared here.
    pub fn clashes<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        names
            .into_iter()
            .filter(|name| self.contains(name))
            .map(String::from)
            .collect()
    }

    /// Number of declared names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no name is declared.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over declarations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.names.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    /// Declarations as free identifiers.
    pub fn identifiers(&self) -> Vec<FreeIdentifier> {
        self.iter()
            .map(|(name, ty)| FreeIdentifier::new(name, ty.clone()))
            .collect()
    }

    /// Declarations of the free identifiers of `pred` that are known here.
    pub fn free_identifiers_of(&self, pred: &Predicate) -> Vec<FreeIdentifier> {
        pred.free_identifiers()
            .into_iter()
            .filter_map(|name| self.get(&name).cloned().map(|ty| FreeIdentifier::new(name, ty)))
            .collect()
    }

    /// A name based on `base` that is neither declared here nor in `avoid`.
    pub fn fresh_name(&self, base: &str, avoid: &IndexSet<String>) -> String {
        if !self.contains(base) && !avoid.contains(base) {
            return base.to_string();
        }
        (0..)
            .map(|i| format!("{}{}", base, i))
            .find(|candidate| !self.contains(candidate) && !avoid.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Type-check a predicate against this environment.
    ///
    /// Identifiers that are not declared get their type inferred from the
    /// context; those inferences are reported in
    /// [`TypeCheckResult::inferred`].
    pub fn type_check(&self, pred: &Predicate) -> TypeCheckResult {
        let mut checker = Checker::new(self);
        checker.predicate(pred);
        TypeCheckResult {
            success: checker.ok,
            inferred: TypeEnvironment {
                names: Arc::new(checker.inferred),
            },
        }
    }

    /// Whether `pred` type-checks without inferring any new name.
    pub fn is_closed(&self, pred: &Predicate) -> bool {
        self.type_check(pred).is_closed()
    }
}

/// Outcome of [`TypeEnvironment::type_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCheckResult {
    /// Whether the predicate is well-typed.
    pub success: bool,
    /// Names whose types had to be inferred.
    pub inferred: TypeEnvironment,
}

impl TypeCheckResult {
    /// Well-typed with no inferred names.
    pub fn is_closed(&self) -> bool {
        self.success && self.inferred.is_empty()
    }
}

struct Checker<'a> {
    env: &'a TypeEnvironment,
    inferred: IndexMap<String, Type>,
    scope: Vec<(String, Type)>,
    ok: bool,
}

impl<'a> Checker<'a> {
    fn new(env: &'a TypeEnvironment) -> Self {
        Self {
            env,
            inferred: IndexMap::new(),
            scope: Vec::new(),
            ok: true,
        }
    }

    fn lookup(&self, name: &str) -> Option<Type> {
        self.scope
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, ty)| ty.clone())
            .or_else(|| self.env.get(name).cloned())
            .or_else(|| self.inferred.get(name).cloned())
    }

    fn synth(&mut self, expr: &Expression) -> Option<Type> {
        match expr {
            Expression::Ident(name) => self.lookup(name),
            Expression::Integer(_) => Some(Type::Integer),
            Expression::Binary { lhs, rhs, .. } => {
                self.check(lhs, &Type::Integer);
                self.check(rhs, &Type::Integer);
                Some(Type::Integer)
            }
        }
    }

    fn check(&mut self, expr: &Expression, expected: &Type) {
        match expr {
            Expression::Ident(name) => match self.lookup(name) {
                Some(ty) => self.ok &= ty == *expected,
                None => {
                    self.inferred.insert(name.clone(), expected.clone());
                }
            },
            Expression::Integer(_) => self.ok &= *expected == Type::Integer,
            Expression::Binary { lhs, rhs, .. } => {
                self.ok &= *expected == Type::Integer;
                self.check(lhs, &Type::Integer);
                self.check(rhs, &Type::Integer);
            }
        }
    }

    fn predicate(&mut self, pred: &Predicate) {
        match pred {
            Predicate::True | Predicate::False => {}
            Predicate::Not(p) => self.predicate(p),
            Predicate::And(ps) | Predicate::Or(ps) => {
                for p in ps {
                    self.predicate(p);
                }
            }
            Predicate::Implies(lhs, rhs) | Predicate::Equiv(lhs, rhs) => {
                self.predicate(lhs);
                self.predicate(rhs);
            }
            Predicate::Relation { op, lhs, rhs } => self.relation(*op, lhs, rhs),
            Predicate::Forall { bound, body } | Predicate::Exists { bound, body } => {
                let depth = self.scope.len();
                self.scope
                    .extend(bound.iter().map(|d| (d.name.clone(), d.ty.clone())));
                self.predicate(body);
                self.scope.truncate(depth);
            }
        }
    }

    fn relation(&mut self, op: RelOp, lhs: &Expression, rhs: &Expression) {
        match op {
            RelOp::Eq => {
                let ty = self.synth(lhs).or_else(|| self.synth(rhs));
                match ty {
                    Some(ty) => {
                        self.check(lhs, &ty);
                        self.check(rhs, &ty);
                    }
                    None => self.ok = false,
                }
            }
            RelOp::Lt | RelOp::Le => {
                self.check(lhs, &Type::Integer);
                self.check(rhs, &Type::Integer);
            }
            RelOp::In => {
                if let Some(set_ty) = self.synth(rhs) {
                    match set_ty.base_type() {
                        Some(base) => self.check(lhs, base),
                        None => self.ok = false,
                    }
                } else if let Some(elem_ty) = self.synth(lhs) {
                    self.check(rhs, &Type::power_set(elem_ty));
                } else {
                    self.ok = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::ast::BoundIdentifier;

    fn env_xy() -> TypeEnvironment {
        let mut env = TypeEnvironment::new();
        env.add_name("x", Type::Integer).unwrap();
        env.add_name("s", Type::power_set(Type::given("S"))).unwrap();
        env
    }

    #[test]
    fn test_add_name_clash() {
        let mut env = env_xy();
        let err = env.add_name("x", Type::Boolean).unwrap_err();
        assert!(matches!(err, Error::NameClash { name } if name == "x"));
        assert_eq!(env.get("x"), Some(&Type::Integer));
    }

    #[test]
    fn test_add_all_is_atomic() {
        let mut env = env_xy();
        let idents = vec![
            FreeIdentifier::new("y", Type::Integer),
            FreeIdentifier::new("x", Type::Integer),
        ];
        assert!(env.add_all(&idents).is_err());
        assert!(!env.contains("y"));

        let dup = vec![
            FreeIdentifier::new("z", Type::Integer),
            FreeIdentifier::new("z", Type::Boolean),
        ];
        assert!(env.add_all(&dup).is_err());
        assert!(!env.contains("z"));
    }

    #[test]
    fn test_clone_shares_until_modified() {
        let env = env_xy();
        let same = env.with_identifiers(&[]).unwrap();
        assert!(TypeEnvironment::ptr_eq(&env, &same));

        let extended = env
            .with_identifiers(&[FreeIdentifier::new("y", Type::Integer)])
            .unwrap();
        assert!(!TypeEnvironment::ptr_eq(&env, &extended));
        assert!(!env.contains("y"));
        assert!(extended.contains_all(&env));
    }

    #[test]
    fn test_closed_type_check() {
        let env = env_xy();
        let closed = Predicate::lt(Expression::ident("x"), Expression::int(2));
        assert!(env.is_closed(&closed));

        let open = Predicate::eq(Expression::ident("x"), Expression::ident("y"));
        let result = env.type_check(&open);
        assert!(result.success);
        assert_eq!(result.inferred.get("y"), Some(&Type::Integer));
        assert!(!result.is_closed());
    }

    #[test]
    fn test_type_mismatch_fails() {
        let env = env_xy();
        let bad = Predicate::member(Expression::ident("x"), Expression::ident("s"));
        assert!(!env.type_check(&bad).success);

        let ambiguous = Predicate::eq(Expression::ident("a"), Expression::ident("b"));
        assert!(!env.type_check(&ambiguous).success);
    }

    #[test]
    fn test_bound_identifiers_shadow_environment() {
        let env = env_xy();
        let p = Predicate::forall(
            vec![BoundIdentifier::new("x", Type::given("S"))],
            Predicate::member(Expression::ident("x"), Expression::ident("s")),
        );
        assert!(env.is_closed(&p));
    }

    #[test]
    fn test_contains_all_requires_same_type() {
        let env = env_xy();
        let mut other = TypeEnvironment::new();
        other.add_name("x", Type::Boolean).unwrap();
        assert!(!env.contains_all(&other));
        assert_eq!(env.clashes(["x", "q"]), vec!["x".to_string()]);
    }

    #[test]
    fn test_fresh_name() {
        let env = env_xy();
        let mut avoid = IndexSet::new();
        avoid.insert("x0".to_string());
        assert_eq!(env.fresh_name("x", &avoid), "x1");
        assert_eq!(env.fresh_name("y", &avoid), "y");
    }
}
