//! The Evaluator (spec §4.4, component C4): statement/expression
//! execution, function and method dispatch, and the scope-exit hooks
//! that drive the Lifetime Manager.
mod call;
mod commit;
mod control;
mod defaults;
mod evaluator;
mod expr;
mod format;
mod hooks;
mod lvalue;
mod stmt;

pub use self::control::{ControlFlow, Unwind};
pub use self::evaluator::{Evaluator, TaskFrame};
pub use self::format::{format_interp_value, format_printf};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::diagnostics::Position;
    use crate::value::Value;

    fn pos() -> Position {
        Position::new("t", 1, 1)
    }

    fn block(statements: Vec<Stmt>) -> Block {
        Block { statements, position: pos() }
    }

    fn function(name: &str, body: Block, return_type: Type) -> FunctionDecl {
        FunctionDecl {
            name: name.to_owned(),
            type_params: vec![],
            params: vec![],
            varargs: false,
            return_type,
            is_async: false,
            body,
            exported: true,
            position: pos(),
        }
    }

    #[test]
    fn runs_a_function_returning_a_literal() {
        let mut eval = Evaluator::new();
        let decl = function(
            "answer",
            block(vec![Stmt::Return(
                Some(Expr::IntLiteral { value: 42, position: pos() }),
                pos(),
            )]),
            Type::int(),
        );
        eval.env.register_function("answer".to_owned(), decl);
        let result = eval.run_function("answer", vec![]).unwrap();
        assert_eq!(result, Value::Integer(42));
    }

    #[test]
    fn while_loop_accumulates_into_a_local() {
        let mut eval = Evaluator::new();
        let body = block(vec![
            Stmt::VarDecl(VarDecl {
                name: "total".to_owned(),
                type_annotation: Type::int(),
                initializer: Some(Expr::IntLiteral { value: 0, position: pos() }),
                is_const: false,
                is_static: false,
                position: pos(),
            }),
            Stmt::VarDecl(VarDecl {
                name: "i".to_owned(),
                type_annotation: Type::int(),
                initializer: Some(Expr::IntLiteral { value: 0, position: pos() }),
                is_const: false,
                is_static: false,
                position: pos(),
            }),
            Stmt::While(WhileLoop {
                condition: Expr::Binary {
                    op: BinaryOp::Lt,
                    lhs: Box::new(Expr::Ident { name: "i".to_owned(), position: pos() }),
                    rhs: Box::new(Expr::IntLiteral { value: 5, position: pos() }),
                    position: pos(),
                },
                body: block(vec![
                    Stmt::Assignment(Assignment {
                        target: LValue::Ident("total".to_owned()),
                        op: AssignOp::AddAssign,
                        value: Expr::Ident { name: "i".to_owned(), position: pos() },
                        position: pos(),
                    }),
                    Stmt::Assignment(Assignment {
                        target: LValue::Ident("i".to_owned()),
                        op: AssignOp::AddAssign,
                        value: Expr::IntLiteral { value: 1, position: pos() },
                        position: pos(),
                    }),
                ]),
                position: pos(),
            }),
            Stmt::Return(Some(Expr::Ident { name: "total".to_owned(), position: pos() }), pos()),
        ]);
        let decl = function("sum_to_five", body, Type::int());
        eval.env.register_function("sum_to_five".to_owned(), decl);
        let result = eval.run_function("sum_to_five", vec![]).unwrap();
        assert_eq!(result, Value::Integer(10));
    }

    #[test]
    fn break_exits_the_nearest_loop_only() {
        let mut eval = Evaluator::new();
        let body = block(vec![
            Stmt::VarDecl(VarDecl {
                name: "i".to_owned(),
                type_annotation: Type::int(),
                initializer: Some(Expr::IntLiteral { value: 0, position: pos() }),
                is_const: false,
                is_static: false,
                position: pos(),
            }),
            Stmt::While(WhileLoop {
                condition: Expr::BoolLiteral { value: true, position: pos() },
                body: block(vec![
                    Stmt::If(IfStmt {
                        condition: Expr::Binary {
                            op: BinaryOp::Ge,
                            lhs: Box::new(Expr::Ident { name: "i".to_owned(), position: pos() }),
                            rhs: Box::new(Expr::IntLiteral { value: 3, position: pos() }),
                            position: pos(),
                        },
                        then_block: block(vec![Stmt::Break(pos())]),
                        else_block: None,
                        position: pos(),
                    }),
                    Stmt::Assignment(Assignment {
                        target: LValue::Ident("i".to_owned()),
                        op: AssignOp::AddAssign,
                        value: Expr::IntLiteral { value: 1, position: pos() },
                        position: pos(),
                    }),
                ]),
                position: pos(),
            }),
            Stmt::Return(Some(Expr::Ident { name: "i".to_owned(), position: pos() }), pos()),
        ]);
        let decl = function("count_to_three", body, Type::int());
        eval.env.register_function("count_to_three".to_owned(), decl);
        let result = eval.run_function("count_to_three", vec![]).unwrap();
        assert_eq!(result, Value::Integer(3));
    }
}
