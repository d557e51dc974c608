use super::Expr;

/// A `match`/`switch`/`case` pattern (spec §4.8). The AST keeps these
/// distinct from [`crate::pattern`]'s runtime matcher, which consumes
/// them against a concrete [`crate::value::Value`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Pattern {
    /// `VariantName`, no payload binder.
    Variant(String),
    /// `VariantName(binder)`.
    VariantBind(String, String),
    /// Exact-equality literal: integer, string, bool or char.
    Literal(Expr),
    /// `a | b | ...`.
    Or(Vec<Pattern>),
    /// `a ... b`, integer types only.
    Range(i64, i64),
    /// `_`.
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: super::MatchBody,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MatchBody {
    Expr(Box<Expr>),
    Block(super::Block),
}
