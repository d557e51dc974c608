//! The typed AST representation (spec §3 "typed AST representation",
//! §6 "Parser contract").
//!
//! Mirrors the teacher's `src/ast/mod.rs` layout — one file per node
//! kind, re-exported with `pub use self::x::*` — generalized to the
//! full Cb surface (generics, interfaces/impl, enums, unions,
//! pointers/references, async, defer, match/switch, modules). No
//! parsing logic lives here: per spec §1 the lexer/parser is an
//! external collaborator and hands this crate an already-built tree;
//! every node simply carries its [`Position`] for diagnostics, as
//! spec §6 requires ("every AST node carries source location").
mod decl;
mod expr;
mod pattern;
mod stmt;

pub use self::decl::*;
pub use self::expr::*;
pub use self::pattern::*;
pub use self::stmt::*;

pub use crate::diagnostics::Position;
/// AST-level type annotations reuse the runtime `Type` descriptor
/// directly (an unresolved name surfaces as `Type::Named`), so there
/// is exactly one type representation shared between parsing and
/// evaluation, per spec §3's remark that typedefs "resolve on use".
pub use crate::types::Type as TypeAnnotation;

/// A single compilation unit: the parser's root node (spec §6).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Ast {
    pub items: Vec<Item>,
}

impl Ast {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }
}

/// A top-level declaration (spec §6 "functions, structs, enums,
/// unions, interfaces, impls, typedefs, module/namespace/using/
/// import/export directives, preprocessor-resolved globals").
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Item {
    Function(FunctionDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Union(UnionDecl),
    Interface(InterfaceDecl),
    Impl(ImplBlock),
    Typedef(TypedefDecl),
    Global(VarDecl),
    Module(ModuleDecl),
    Using(UsingDirective),
    Import(ImportDirective),
}
