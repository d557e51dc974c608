//! Struct construction, inherent methods, and `self` mutation
//! propagating back through a chained method call (spec §4.5, §4.7).
use cb::ast::*;
use cb::diagnostics::Position;
use cb::runtime::Runtime;
use cb::value::Value;

fn pos() -> Position {
    Position::new("structs_and_methods.rs", 1, 1)
}

fn block(statements: Vec<Stmt>) -> Block {
    Block { statements, position: pos() }
}

/// ```text
/// struct Counter { count: int }
/// impl Counter {
///     inc(self) { self.count = self.count + 1; return self; }
/// }
/// ```
fn counter_struct() -> StructDecl {
    StructDecl {
        name: "Counter".to_owned(),
        type_params: vec![],
        members: vec![StructMember {
            name: "count".to_owned(),
            type_annotation: Type::int(),
            default: Some(Expr::IntLiteral { value: 0, position: pos() }),
        }],
        exported: true,
        position: pos(),
    }
}

fn inc_method() -> FunctionDecl {
    let member = Box::new(Expr::Member {
        target: Box::new(Expr::Ident { name: "self".to_owned(), position: pos() }),
        field: "count".to_owned(),
        position: pos(),
    });
    let body = block(vec![
        Stmt::Assignment(Assignment {
            target: LValue::Member {
                target: Box::new(LValue::Ident("self".to_owned())),
                field: "count".to_owned(),
            },
            op: AssignOp::Assign,
            value: Expr::Binary {
                op: BinaryOp::Add,
                lhs: member,
                rhs: Box::new(Expr::IntLiteral { value: 1, position: pos() }),
                position: pos(),
            },
            position: pos(),
        }),
        Stmt::Return(
            Some(Expr::Ident { name: "self".to_owned(), position: pos() }),
            pos(),
        ),
    ]);
    FunctionDecl {
        name: "inc".to_owned(),
        type_params: vec![],
        params: vec![],
        varargs: false,
        return_type: Type::Named("Counter".to_owned()),
        is_async: false,
        body,
        exported: true,
        position: pos(),
    }
}

fn counter_impl() -> ImplBlock {
    ImplBlock {
        interface_name: None,
        type_name: "Counter".to_owned(),
        type_params: vec![],
        methods: vec![inc_method()],
        position: pos(),
    }
}

/// `main() { Counter c; return c.inc().inc().inc().count; }`
fn main_decl() -> FunctionDecl {
    let var_decl = Stmt::VarDecl(VarDecl {
        name: "c".to_owned(),
        type_annotation: Type::Named("Counter".to_owned()),
        initializer: None,
        is_const: false,
        is_static: false,
        position: pos(),
    });
    let chained = Expr::Member {
        target: Box::new(Expr::MethodCall {
            receiver: Box::new(Expr::MethodCall {
                receiver: Box::new(Expr::MethodCall {
                    receiver: Box::new(Expr::Ident { name: "c".to_owned(), position: pos() }),
                    method: "inc".to_owned(),
                    type_args: vec![],
                    args: vec![],
                    position: pos(),
                }),
                method: "inc".to_owned(),
                type_args: vec![],
                args: vec![],
                position: pos(),
            }),
            method: "inc".to_owned(),
            type_args: vec![],
            args: vec![],
            position: pos(),
        }),
        field: "count".to_owned(),
        position: pos(),
    };
    FunctionDecl {
        name: "main".to_owned(),
        type_params: vec![],
        params: vec![],
        varargs: false,
        return_type: Type::int(),
        is_async: false,
        body: block(vec![var_decl, Stmt::Return(Some(chained), pos())]),
        exported: true,
        position: pos(),
    }
}

#[test]
fn chained_method_calls_mutate_through_every_link() {
    let ast = Ast::new(vec![
        Item::Struct(counter_struct()),
        Item::Impl(counter_impl()),
        Item::Function(main_decl()),
    ]);
    let mut runtime = Runtime::new();
    runtime.load(&ast).unwrap();
    let result = runtime.run("main", vec![]).unwrap();
    assert_eq!(result, Value::Integer(3));
}
