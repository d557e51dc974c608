use super::{Expr, Position, TypeAnnotation};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub type_annotation: TypeAnnotation,
    pub initializer: Option<Expr>,
    pub is_const: bool,
    pub is_static: bool,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

/// An lvalue: the set of assignable targets from spec §4.4
/// ("variable, array element, struct member, dereferenced pointer").
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum LValue {
    Ident(String),
    Index { target: Box<LValue>, index: Box<Expr> },
    Member { target: Box<LValue>, field: String },
    Deref(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Assignment {
    pub target: LValue,
    pub op: AssignOp,
    pub value: Expr,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_block: Option<Box<ElseBranch>>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ElseBranch {
    Block(Block),
    If(IfStmt),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WhileLoop {
    pub condition: Expr,
    pub body: Block,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ForLoop {
    pub init: Option<Box<Stmt>>,
    pub condition: Option<Expr>,
    pub step: Option<Box<Stmt>>,
    pub body: Block,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SwitchCase {
    /// A set of literal values, possibly an OR-list; `None` for
    /// `default`/`else`.
    pub values: Option<Vec<CaseValue>>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CaseValue {
    Literal(Expr),
    Range(Expr, Expr),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SwitchStmt {
    pub discriminant: Expr,
    pub cases: Vec<SwitchCase>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Stmt {
    VarDecl(VarDecl),
    Assignment(Assignment),
    ExprStmt(Expr),
    If(IfStmt),
    While(WhileLoop),
    For(ForLoop),
    Switch(SwitchStmt),
    Break(Position),
    Continue(Position),
    Return(Option<Expr>, Position),
    Defer(Box<Stmt>, Position),
    Yield(Position),
    Block(Block),
}

impl Stmt {
    pub fn position(&self) -> &Position {
        match self {
            Stmt::VarDecl(d) => &d.position,
            Stmt::Assignment(a) => &a.position,
            Stmt::ExprStmt(e) => e.position(),
            Stmt::If(s) => &s.position,
            Stmt::While(s) => &s.position,
            Stmt::For(s) => &s.position,
            Stmt::Switch(s) => &s.position,
            Stmt::Break(p) | Stmt::Continue(p) | Stmt::Yield(p) => p,
            Stmt::Return(_, p) => p,
            Stmt::Defer(_, p) => p,
            Stmt::Block(b) => &b.position,
        }
    }
}
