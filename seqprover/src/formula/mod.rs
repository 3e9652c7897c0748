//! Formula boundary consumed by the prover kernel.
//!
//! The kernel treats formulas as opaque values compared by structural
//! equality. This module provides the small surface it actually calls into:
//!
//! - **AST** (`ast.rs`): [`Predicate`], [`Expression`] and [`Type`]
//! - **Type environments** (`type_env.rs`): [`TypeEnvironment`] with
//!   name-clash detection and closed type-checking
//!
//! No parser is provided. Formulas are built with the constructor
//! functions on each AST type.
//!
//! ## Example
//!
//! ```rust
//! use seqprover::formula::{Expression, Predicate, Type, TypeEnvironment};
//!
//! let mut env = TypeEnvironment::new();
//! env.add_name("x", Type::Integer).unwrap();
//!
//! let p = Predicate::lt(Expression::ident("x"), Expression::int(3));
//! assert!(env.is_closed(&p));
//! assert_eq!(p.to_string(), "x < 3");
//! ```

pub mod ast;
pub mod type_env;

pub use ast::{ArithOp, BoundIdentifier, Expression, FreeIdentifier, Predicate, RelOp, Type};
pub use type_env::{TypeCheckResult, TypeEnvironment};
