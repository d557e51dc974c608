//! Interpreter core for the Cb programming language: a tree-walking
//! evaluator over an already-parsed AST (spec §1 "the parser is an
//! external collaborator"). Laid out the way the teacher crate this
//! was grown from lays out its own compiler pipeline — one module per
//! pipeline stage, re-exported from a thin crate root.
pub mod ast;
pub mod diagnostics;
pub mod dispatch;
pub mod env;
pub mod eval;
pub mod lifetime;
pub mod pattern;
pub mod runtime;
pub mod scheduler;
pub mod types;
pub mod value;
