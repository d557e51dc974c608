use std::collections::HashMap;

use crate::ast::{
    Block, CaseValue, ElseBranch, EnumDecl, Expr, ForLoop, FunctionDecl, IfStmt, InterpSegment,
    LValue, MatchArm, MatchBody, Param, Stmt, StructDecl, StructMember, SwitchCase, SwitchStmt,
    VarDecl, WhileLoop,
};
use crate::types::Type;

/// Replace every occurrence of a bound type parameter with its
/// argument, recursing through compound types (spec §4.5
/// "monomorphization via AST substitution").
pub fn substitute_type(ty: &Type, bindings: &HashMap<String, Type>) -> Type {
    match ty {
        Type::TypeParam { name, .. } => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
        Type::Named(name) => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
        Type::Array { element, dimensions } => Type::Array {
            element: Box::new(substitute_type(element, bindings)),
            dimensions: dimensions.clone(),
        },
        Type::Pointer { pointee, mutability } => Type::Pointer {
            pointee: Box::new(substitute_type(pointee, bindings)),
            mutability: *mutability,
        },
        Type::Reference { referent } => {
            Type::Reference { referent: Box::new(substitute_type(referent, bindings)) }
        }
        Type::Future { inner } => Type::Future { inner: Box::new(substitute_type(inner, bindings)) },
        Type::Generic { base, type_args } => Type::Generic {
            base: base.clone(),
            type_args: type_args.iter().map(|t| substitute_type(t, bindings)).collect(),
        },
        Type::Struct { qualified_name, members } => Type::Struct {
            qualified_name: qualified_name.clone(),
            members: members
                .iter()
                .map(|(n, t, d)| (n.clone(), substitute_type(t, bindings), d.clone()))
                .collect(),
        },
        _ => ty.clone(),
    }
}

fn substitute_param(param: &Param, bindings: &HashMap<String, Type>) -> Param {
    Param {
        name: param.name.clone(),
        type_annotation: substitute_type(&param.type_annotation, bindings),
        default: param.default.as_ref().map(|e| substitute_expr(e, bindings)),
    }
}

fn substitute_expr(expr: &Expr, bindings: &HashMap<String, Type>) -> Expr {
    match expr {
        Expr::Member { target, field, position } => Expr::Member {
            target: Box::new(substitute_expr(target, bindings)),
            field: field.clone(),
            position: position.clone(),
        },
        Expr::Index { target, index, position } => Expr::Index {
            target: Box::new(substitute_expr(target, bindings)),
            index: Box::new(substitute_expr(index, bindings)),
            position: position.clone(),
        },
        Expr::Unary { op, operand, position } => {
            Expr::Unary { op: *op, operand: Box::new(substitute_expr(operand, bindings)), position: position.clone() }
        }
        Expr::Binary { op, lhs, rhs, position } => Expr::Binary {
            op: *op,
            lhs: Box::new(substitute_expr(lhs, bindings)),
            rhs: Box::new(substitute_expr(rhs, bindings)),
            position: position.clone(),
        },
        Expr::Ternary { condition, then_branch, else_branch, position } => Expr::Ternary {
            condition: Box::new(substitute_expr(condition, bindings)),
            then_branch: Box::new(substitute_expr(then_branch, bindings)),
            else_branch: Box::new(substitute_expr(else_branch, bindings)),
            position: position.clone(),
        },
        Expr::Call { callee, type_args, args, position } => Expr::Call {
            callee: Box::new(substitute_expr(callee, bindings)),
            type_args: type_args.iter().map(|t| substitute_type(t, bindings)).collect(),
            args: args.iter().map(|a| substitute_expr(a, bindings)).collect(),
            position: position.clone(),
        },
        Expr::MethodCall { receiver, method, type_args, args, position } => Expr::MethodCall {
            receiver: Box::new(substitute_expr(receiver, bindings)),
            method: method.clone(),
            type_args: type_args.iter().map(|t| substitute_type(t, bindings)).collect(),
            args: args.iter().map(|a| substitute_expr(a, bindings)).collect(),
            position: position.clone(),
        },
        Expr::StructLiteral { type_name, type_args, fields, position } => Expr::StructLiteral {
            type_name: type_name.clone(),
            type_args: type_args.iter().map(|t| substitute_type(t, bindings)).collect(),
            fields: fields
                .iter()
                .map(|f| crate::ast::FieldInit { name: f.name.clone(), value: substitute_expr(&f.value, bindings) })
                .collect(),
            position: position.clone(),
        },
        Expr::ArrayLiteral { elements, position } => Expr::ArrayLiteral {
            elements: elements.iter().map(|e| substitute_expr(e, bindings)).collect(),
            position: position.clone(),
        },
        Expr::EnumLiteral { enum_name, variant, payload, position } => Expr::EnumLiteral {
            enum_name: enum_name.clone(),
            variant: variant.clone(),
            payload: payload.as_ref().map(|p| Box::new(substitute_expr(p, bindings))),
            position: position.clone(),
        },
        Expr::Match { scrutinee, arms, position } => Expr::Match {
            scrutinee: Box::new(substitute_expr(scrutinee, bindings)),
            arms: arms
                .iter()
                .map(|arm| MatchArm {
                    pattern: arm.pattern.clone(),
                    body: match &arm.body {
                        MatchBody::Expr(e) => MatchBody::Expr(Box::new(substitute_expr(e, bindings))),
                        MatchBody::Block(b) => MatchBody::Block(substitute_block(b, bindings)),
                    },
                })
                .collect(),
            position: position.clone(),
        },
        Expr::New { type_annotation, args, position } => Expr::New {
            type_annotation: substitute_type(type_annotation, bindings),
            args: args.iter().map(|a| substitute_expr(a, bindings)).collect(),
            position: position.clone(),
        },
        Expr::NewArray { element_type, count, position } => Expr::NewArray {
            element_type: substitute_type(element_type, bindings),
            count: Box::new(substitute_expr(count, bindings)),
            position: position.clone(),
        },
        Expr::Delete { pointer, position } => {
            Expr::Delete { pointer: Box::new(substitute_expr(pointer, bindings)), position: position.clone() }
        }
        Expr::SizeOf { type_annotation, position } => {
            Expr::SizeOf { type_annotation: substitute_type(type_annotation, bindings), position: position.clone() }
        }
        Expr::Try { expr, position } => {
            Expr::Try { expr: Box::new(substitute_expr(expr, bindings)), position: position.clone() }
        }
        Expr::Await { expr, position } => {
            Expr::Await { expr: Box::new(substitute_expr(expr, bindings)), position: position.clone() }
        }
        Expr::Lambda { params, return_type, is_async, body, position } => Expr::Lambda {
            params: params.iter().map(|p| substitute_param(p, bindings)).collect(),
            return_type: substitute_type(return_type, bindings),
            is_async: *is_async,
            body: Box::new(substitute_block(body, bindings)),
            position: position.clone(),
        },
        Expr::Interpolated { segments, position } => Expr::Interpolated {
            segments: segments
                .iter()
                .map(|seg| match seg {
                    InterpSegment::Literal(s) => InterpSegment::Literal(s.clone()),
                    InterpSegment::Expr { expr, format } => InterpSegment::Expr {
                        expr: Box::new(substitute_expr(expr, bindings)),
                        format: format.clone(),
                    },
                })
                .collect(),
            position: position.clone(),
        },
        Expr::Block(block) => Expr::Block(Box::new(substitute_block(block, bindings))),
        // Literals and bare identifiers carry no type annotation to substitute.
        other => other.clone(),
    }
}

fn substitute_lvalue(lvalue: &LValue, bindings: &HashMap<String, Type>) -> LValue {
    match lvalue {
        LValue::Ident(name) => LValue::Ident(name.clone()),
        LValue::Index { target, index } => LValue::Index {
            target: Box::new(substitute_lvalue(target, bindings)),
            index: Box::new(substitute_expr(index, bindings)),
        },
        LValue::Member { target, field } => {
            LValue::Member { target: Box::new(substitute_lvalue(target, bindings)), field: field.clone() }
        }
        LValue::Deref(expr) => LValue::Deref(Box::new(substitute_expr(expr, bindings))),
    }
}

fn substitute_stmt(stmt: &Stmt, bindings: &HashMap<String, Type>) -> Stmt {
    match stmt {
        Stmt::VarDecl(decl) => Stmt::VarDecl(VarDecl {
            name: decl.name.clone(),
            type_annotation: substitute_type(&decl.type_annotation, bindings),
            initializer: decl.initializer.as_ref().map(|e| substitute_expr(e, bindings)),
            is_const: decl.is_const,
            is_static: decl.is_static,
            position: decl.position.clone(),
        }),
        Stmt::Assignment(a) => Stmt::Assignment(crate::ast::Assignment {
            target: substitute_lvalue(&a.target, bindings),
            op: a.op,
            value: substitute_expr(&a.value, bindings),
            position: a.position.clone(),
        }),
        Stmt::ExprStmt(e) => Stmt::ExprStmt(substitute_expr(e, bindings)),
        Stmt::If(s) => Stmt::If(IfStmt {
            condition: substitute_expr(&s.condition, bindings),
            then_block: substitute_block(&s.then_block, bindings),
            else_block: s.else_block.as_ref().map(|eb| {
                Box::new(match eb.as_ref() {
                    ElseBranch::Block(b) => ElseBranch::Block(substitute_block(b, bindings)),
                    ElseBranch::If(i) => ElseBranch::If(match substitute_stmt(&Stmt::If(i.clone()), bindings) {
                        Stmt::If(inner) => inner,
                        _ => unreachable!(),
                    }),
                })
            }),
            position: s.position.clone(),
        }),
        Stmt::While(w) => Stmt::While(WhileLoop {
            condition: substitute_expr(&w.condition, bindings),
            body: substitute_block(&w.body, bindings),
            position: w.position.clone(),
        }),
        Stmt::For(f) => Stmt::For(ForLoop {
            init: f.init.as_ref().map(|s| Box::new(substitute_stmt(s, bindings))),
            condition: f.condition.as_ref().map(|c| substitute_expr(c, bindings)),
            step: f.step.as_ref().map(|s| Box::new(substitute_stmt(s, bindings))),
            body: substitute_block(&f.body, bindings),
            position: f.position.clone(),
        }),
        Stmt::Switch(s) => Stmt::Switch(SwitchStmt {
            discriminant: substitute_expr(&s.discriminant, bindings),
            cases: s
                .cases
                .iter()
                .map(|case| SwitchCase {
                    values: case.values.as_ref().map(|vs| {
                        vs.iter()
                            .map(|v| match v {
                                CaseValue::Literal(e) => CaseValue::Literal(substitute_expr(e, bindings)),
                                CaseValue::Range(a, b) => {
                                    CaseValue::Range(substitute_expr(a, bindings), substitute_expr(b, bindings))
                                }
                            })
                            .collect()
                    }),
                    body: substitute_block(&case.body, bindings),
                })
                .collect(),
            position: s.position.clone(),
        }),
        Stmt::Break(p) => Stmt::Break(p.clone()),
        Stmt::Continue(p) => Stmt::Continue(p.clone()),
        Stmt::Return(expr, p) => Stmt::Return(expr.as_ref().map(|e| substitute_expr(e, bindings)), p.clone()),
        Stmt::Defer(inner, p) => Stmt::Defer(Box::new(substitute_stmt(inner, bindings)), p.clone()),
        Stmt::Yield(p) => Stmt::Yield(p.clone()),
        Stmt::Block(b) => Stmt::Block(substitute_block(b, bindings)),
    }
}

fn substitute_block(block: &Block, bindings: &HashMap<String, Type>) -> Block {
    Block {
        statements: block.statements.iter().map(|s| substitute_stmt(s, bindings)).collect(),
        position: block.position.clone(),
    }
}

fn bindings_for(type_params: &[crate::ast::TypeParamDecl], type_args: &[Type]) -> HashMap<String, Type> {
    type_params.iter().zip(type_args.iter()).map(|(p, a)| (p.name.clone(), a.clone())).collect()
}

/// Monomorphize a generic function against concrete `type_args` by
/// substituting every occurrence of its type parameters throughout the
/// signature and body (spec §4.5). The caller is responsible for
/// caching the result under [`crate::env::GenericKey`].
pub fn instantiate_function(base: &FunctionDecl, type_args: &[Type]) -> FunctionDecl {
    let bindings = bindings_for(&base.type_params, type_args);
    FunctionDecl {
        name: base.name.clone(),
        type_params: vec![],
        params: base.params.iter().map(|p| substitute_param(p, &bindings)).collect(),
        varargs: base.varargs,
        return_type: substitute_type(&base.return_type, &bindings),
        is_async: base.is_async,
        body: substitute_block(&base.body, &bindings),
        exported: base.exported,
        position: base.position.clone(),
    }
}

/// Monomorphize a generic struct against concrete `type_args`.
pub fn instantiate_struct(base: &StructDecl, type_args: &[Type]) -> StructDecl {
    let bindings = bindings_for(&base.type_params, type_args);
    StructDecl {
        name: base.name.clone(),
        type_params: vec![],
        members: base
            .members
            .iter()
            .map(|m| StructMember {
                name: m.name.clone(),
                type_annotation: substitute_type(&m.type_annotation, &bindings),
                default: m.default.as_ref().map(|e| substitute_expr(e, &bindings)),
            })
            .collect(),
        exported: base.exported,
        position: base.position.clone(),
    }
}

/// Monomorphize a generic enum against concrete `type_args`.
pub fn instantiate_enum(base: &EnumDecl, type_args: &[Type]) -> EnumDecl {
    let bindings = bindings_for(&base.type_params, type_args);
    EnumDecl {
        name: base.name.clone(),
        type_params: vec![],
        variants: base
            .variants
            .iter()
            .map(|(name, payload, discriminant)| {
                (name.clone(), payload.as_ref().map(|t| substitute_type(t, &bindings)), *discriminant)
            })
            .collect(),
        exported: base.exported,
        position: base.position.clone(),
    }
}

/// Method-name conflict detection for a type parameter's interface
/// bounds (spec §4.5): if two bounds both declare a method with the
/// same name, the parameter can't be used polymorphically through
/// either without ambiguity.
pub fn conflicting_bound_methods(
    bounds: &[(String, Vec<String>)],
) -> Option<String> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (interface, methods) in bounds {
        for method in methods {
            if let Some(owner) = seen.get(method.as_str()) {
                if *owner != interface.as_str() {
                    return Some(method.clone());
                }
            } else {
                seen.insert(method.as_str(), interface.as_str());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Position, TypeParamDecl};
    use crate::types::{IntWidth, Type};

    fn pos() -> Position {
        Position::new("t", 1, 1)
    }

    #[test]
    fn substitute_type_replaces_bound_type_param() {
        let mut bindings = HashMap::new();
        bindings.insert("T".to_owned(), Type::int());
        let ty = Type::TypeParam { name: "T".to_owned(), bounds: vec![] };
        assert_eq!(substitute_type(&ty, &bindings), Type::int());
    }

    #[test]
    fn substitute_type_recurses_into_array_element() {
        let mut bindings = HashMap::new();
        bindings.insert("T".to_owned(), Type::Bool);
        let ty = Type::Array {
            element: Box::new(Type::TypeParam { name: "T".to_owned(), bounds: vec![] }),
            dimensions: vec![],
        };
        let result = substitute_type(&ty, &bindings);
        assert_eq!(result, Type::Array { element: Box::new(Type::Bool), dimensions: vec![] });
    }

    #[test]
    fn instantiate_function_substitutes_params_and_return_type() {
        let base = FunctionDecl {
            name: "identity".to_owned(),
            type_params: vec![TypeParamDecl { name: "T".to_owned(), bounds: vec![] }],
            params: vec![Param {
                name: "x".to_owned(),
                type_annotation: Type::TypeParam { name: "T".to_owned(), bounds: vec![] },
                default: None,
            }],
            varargs: false,
            return_type: Type::TypeParam { name: "T".to_owned(), bounds: vec![] },
            is_async: false,
            body: Block { statements: vec![], position: pos() },
            exported: true,
            position: pos(),
        };
        let instantiated = instantiate_function(&base, &[Type::Integer { width: IntWidth::Int, signed: true }]);
        assert!(instantiated.type_params.is_empty());
        assert_eq!(instantiated.params[0].type_annotation, Type::int());
        assert_eq!(instantiated.return_type, Type::int());
    }

    #[test]
    fn conflicting_bound_methods_detects_shared_name_across_distinct_interfaces() {
        let bounds = vec![
            ("A".to_owned(), vec!["go".to_owned()]),
            ("B".to_owned(), vec!["go".to_owned()]),
        ];
        assert_eq!(conflicting_bound_methods(&bounds), Some("go".to_owned()));
    }

    #[test]
    fn no_conflict_when_method_names_are_distinct() {
        let bounds = vec![("A".to_owned(), vec!["go".to_owned()]), ("B".to_owned(), vec!["stop".to_owned()])];
        assert_eq!(conflicting_bound_methods(&bounds), None);
    }
}
