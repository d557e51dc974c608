//! Function calls, recursion, and argument binding, built straight
//! from AST nodes rather than parsed source (no parser lives in this
//! crate; see `spec.md` §1).
use cb::ast::*;
use cb::diagnostics::Position;
use cb::runtime::Runtime;
use cb::value::Value;

fn pos() -> Position {
    Position::new("functions.rs", 1, 1)
}

fn block(statements: Vec<Stmt>) -> Block {
    Block { statements, position: pos() }
}

fn ident(name: &str) -> Expr {
    Expr::Ident { name: name.to_owned(), position: pos() }
}

fn int(value: i64) -> Expr {
    Expr::IntLiteral { value, position: pos() }
}

fn param(name: &str) -> Param {
    Param { name: name.to_owned(), type_annotation: Type::int(), default: None }
}

/// `fib(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); }`
fn fib_decl() -> FunctionDecl {
    let body = block(vec![
        Stmt::If(IfStmt {
            condition: Expr::Binary {
                op: BinaryOp::Lt,
                lhs: Box::new(ident("n")),
                rhs: Box::new(int(2)),
                position: pos(),
            },
            then_block: block(vec![Stmt::Return(Some(ident("n")), pos())]),
            else_block: None,
            position: pos(),
        }),
        Stmt::Return(
            Some(Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expr::Call {
                    callee: Box::new(ident("fib")),
                    type_args: vec![],
                    args: vec![Expr::Binary {
                        op: BinaryOp::Sub,
                        lhs: Box::new(ident("n")),
                        rhs: Box::new(int(1)),
                        position: pos(),
                    }],
                    position: pos(),
                }),
                rhs: Box::new(Expr::Call {
                    callee: Box::new(ident("fib")),
                    type_args: vec![],
                    args: vec![Expr::Binary {
                        op: BinaryOp::Sub,
                        lhs: Box::new(ident("n")),
                        rhs: Box::new(int(2)),
                        position: pos(),
                    }],
                    position: pos(),
                }),
                position: pos(),
            }),
            pos(),
        ),
    ]);
    FunctionDecl {
        name: "fib".to_owned(),
        type_params: vec![],
        params: vec![param("n")],
        varargs: false,
        return_type: Type::int(),
        is_async: false,
        body,
        exported: true,
        position: pos(),
    }
}

#[test]
fn recursive_fibonacci() {
    let ast = Ast::new(vec![Item::Function(fib_decl())]);
    let mut runtime = Runtime::new();
    runtime.load(&ast).unwrap();
    let result = runtime.run("fib", vec![Value::Integer(10)]).unwrap();
    assert_eq!(result, Value::Integer(55));
}

#[test]
fn missing_argument_is_an_argument_count_error() {
    let ast = Ast::new(vec![Item::Function(fib_decl())]);
    let mut runtime = Runtime::new();
    runtime.load(&ast).unwrap();
    let err = runtime.run("fib", vec![]).unwrap_err();
    assert!(matches!(err, cb::diagnostics::CbError::ArgumentCountMismatch { .. }));
}
