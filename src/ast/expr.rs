use super::{MatchArm, Position, TypeAnnotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    /// `&expr` — address-of / take-reference.
    Ref,
    /// `*expr` — pointer dereference.
    Deref,
}

/// A segment of a string-interpolation literal (spec §4.4).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum InterpSegment {
    Literal(String),
    Expr { expr: Box<Expr>, format: Option<String> },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldInit {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expr {
    IntLiteral { value: i64, position: Position },
    FloatLiteral { value: f64, position: Position },
    BoolLiteral { value: bool, position: Position },
    CharLiteral { value: char, position: Position },
    StringLiteral { value: String, position: Position },
    Interpolated { segments: Vec<InterpSegment>, position: Position },
    Ident { name: String, position: Position },
    /// `a::b::name`.
    QualifiedIdent { path: Vec<String>, name: String, position: Position },

    Member { target: Box<Expr>, field: String, position: Position },
    Index { target: Box<Expr>, index: Box<Expr>, position: Position },

    Unary { op: UnaryOp, operand: Box<Expr>, position: Position },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr>, position: Position },
    Ternary { condition: Box<Expr>, then_branch: Box<Expr>, else_branch: Box<Expr>, position: Position },

    Call { callee: Box<Expr>, type_args: Vec<TypeAnnotation>, args: Vec<Expr>, position: Position },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        type_args: Vec<TypeAnnotation>,
        args: Vec<Expr>,
        position: Position,
    },

    StructLiteral { type_name: String, type_args: Vec<TypeAnnotation>, fields: Vec<FieldInit>, position: Position },
    ArrayLiteral { elements: Vec<Expr>, position: Position },
    EnumLiteral { enum_name: Option<String>, variant: String, payload: Option<Box<Expr>>, position: Position },

    Match { scrutinee: Box<Expr>, arms: Vec<MatchArm>, position: Position },

    New { type_annotation: TypeAnnotation, args: Vec<Expr>, position: Position },
    NewArray { element_type: TypeAnnotation, count: Box<Expr>, position: Position },
    Delete { pointer: Box<Expr>, position: Position },
    SizeOf { type_annotation: TypeAnnotation, position: Position },

    /// `expr?` (spec §4.4).
    Try { expr: Box<Expr>, position: Position },
    /// `await expr`.
    Await { expr: Box<Expr>, position: Position },

    Lambda { params: Vec<super::Param>, return_type: TypeAnnotation, is_async: bool, body: Box<super::Block>, position: Position },

    Block(Box<super::Block>),
}

impl Expr {
    pub fn position(&self) -> &Position {
        use Expr::*;
        match self {
            IntLiteral { position, .. }
            | FloatLiteral { position, .. }
            | BoolLiteral { position, .. }
            | CharLiteral { position, .. }
            | StringLiteral { position, .. }
            | Interpolated { position, .. }
            | Ident { position, .. }
            | QualifiedIdent { position, .. }
            | Member { position, .. }
            | Index { position, .. }
            | Unary { position, .. }
            | Binary { position, .. }
            | Ternary { position, .. }
            | Call { position, .. }
            | MethodCall { position, .. }
            | StructLiteral { position, .. }
            | ArrayLiteral { position, .. }
            | EnumLiteral { position, .. }
            | Match { position, .. }
            | New { position, .. }
            | NewArray { position, .. }
            | Delete { position, .. }
            | SizeOf { position, .. }
            | Try { position, .. }
            | Await { position, .. }
            | Lambda { position, .. } => position,
            Block(block) => &block.position,
        }
    }
}
