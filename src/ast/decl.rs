use super::{Block, Position, TypeAnnotation};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Param {
    pub name: String,
    pub type_annotation: TypeAnnotation,
    pub default: Option<super::Expr>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub type_params: Vec<TypeParamDecl>,
    pub params: Vec<Param>,
    pub varargs: bool,
    pub return_type: TypeAnnotation,
    pub is_async: bool,
    pub body: Block,
    pub exported: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TypeParamDecl {
    pub name: String,
    /// Interface names this parameter must implement; `T: A + B`.
    pub bounds: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StructDecl {
    pub name: String,
    pub type_params: Vec<TypeParamDecl>,
    pub members: Vec<StructMember>,
    pub exported: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StructMember {
    pub name: String,
    pub type_annotation: TypeAnnotation,
    pub default: Option<super::Expr>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnumDecl {
    pub name: String,
    pub type_params: Vec<TypeParamDecl>,
    /// Variant name, optional payload type, optional explicit
    /// discriminant (spec §3 `Enum.discriminants`).
    pub variants: Vec<(String, Option<TypeAnnotation>, Option<i64>)>,
    pub exported: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UnionDecl {
    pub name: String,
    pub alternatives: Vec<UnionAlternative>,
    pub exported: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum UnionAlternative {
    IntLiteral(i64),
    StringLiteral(String),
    BoolLiteral(bool),
    Type(TypeAnnotation),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    pub methods: Vec<InterfaceMethod>,
    pub exported: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InterfaceMethod {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeAnnotation,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImplBlock {
    /// `impl Interface for Type { ... }`, or `impl Type { ... }` when `None`.
    pub interface_name: Option<String>,
    pub type_name: String,
    pub type_params: Vec<TypeParamDecl>,
    pub methods: Vec<FunctionDecl>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TypedefDecl {
    pub name: String,
    pub target: TypeAnnotation,
    pub exported: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    pub items: Vec<super::Item>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UsingDirective {
    pub namespace: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImportDirective {
    pub path: String,
    /// `None` means import the whole module under its namespace name;
    /// `Some(names)` is the selective `import { a, b } from "path"` form.
    pub selective: Option<Vec<String>>,
    pub position: Position,
}
