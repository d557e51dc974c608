//! End-to-end LIFO ordering of `defer` and struct destructors across
//! nested scopes (spec §4.7, §9 "Defer vs destructor ordering"); unit
//! coverage of the ordering rule itself lives in
//! `src/lifetime/mod.rs`, this exercises the real evaluator wiring.
use cb::ast::*;
use cb::diagnostics::Position;
use cb::runtime::Runtime;

fn pos() -> Position {
    Position::new("defer_and_destructors.rs", 1, 1)
}

fn block(statements: Vec<Stmt>) -> Block {
    Block { statements, position: pos() }
}

fn println_tag() -> Stmt {
    let member = Expr::Member {
        target: Box::new(Expr::Ident { name: "self".to_owned(), position: pos() }),
        field: "tag".to_owned(),
        position: pos(),
    };
    Stmt::ExprStmt(Expr::Call {
        callee: Box::new(Expr::Ident { name: "println".to_owned(), position: pos() }),
        type_args: vec![],
        args: vec![member],
        position: pos(),
    })
}

fn res_struct() -> StructDecl {
    StructDecl {
        name: "Res".to_owned(),
        type_params: vec![],
        members: vec![StructMember {
            name: "tag".to_owned(),
            type_annotation: Type::int(),
            default: Some(Expr::IntLiteral { value: 0, position: pos() }),
        }],
        exported: true,
        position: pos(),
    }
}

/// `impl Res { ~Res() { println(self.tag); } }`
fn res_destructor_impl() -> ImplBlock {
    let dtor = FunctionDecl {
        name: "~Res".to_owned(),
        type_params: vec![],
        params: vec![],
        varargs: false,
        return_type: Type::Void,
        is_async: false,
        body: block(vec![println_tag()]),
        exported: false,
        position: pos(),
    };
    ImplBlock { interface_name: None, type_name: "Res".to_owned(), type_params: vec![], methods: vec![dtor], position: pos() }
}

fn tagged_decl(name: &str, tag: i64) -> Stmt {
    Stmt::VarDecl(VarDecl {
        name: name.to_owned(),
        type_annotation: Type::Named("Res".to_owned()),
        initializer: Some(Expr::StructLiteral {
            type_name: "Res".to_owned(),
            type_args: vec![],
            fields: vec![FieldInit { name: "tag".to_owned(), value: Expr::IntLiteral { value: tag, position: pos() } }],
            position: pos(),
        }),
        is_const: false,
        is_static: false,
        position: pos(),
    })
}

/// ```text
/// main() {
///     { Res a = Res{tag: 1}; { Res b = Res{tag: 2}; } Res c = Res{tag: 3}; }
///     return 0;
/// }
/// ```
fn main_decl() -> FunctionDecl {
    let inner = Stmt::Block(block(vec![tagged_decl("b", 2)]));
    let outer = Stmt::Block(block(vec![tagged_decl("a", 1), inner, tagged_decl("c", 3)]));
    FunctionDecl {
        name: "main".to_owned(),
        type_params: vec![],
        params: vec![],
        varargs: false,
        return_type: Type::int(),
        is_async: false,
        body: block(vec![outer, Stmt::Return(Some(Expr::IntLiteral { value: 0, position: pos() }), pos())]),
        exported: true,
        position: pos(),
    }
}

#[test]
fn nested_scope_destructors_run_innermost_first() {
    let ast = Ast::new(vec![
        Item::Struct(res_struct()),
        Item::Impl(res_destructor_impl()),
        Item::Function(main_decl()),
    ]);
    let mut runtime = Runtime::new();
    runtime.load(&ast).unwrap();
    runtime.run("main", vec![]).unwrap();
    assert_eq!(runtime.output(), "2\n3\n1\n");
}

/// `defer` registered before a destructible local runs before that
/// local's destructor on scope exit (spec §9).
fn main_with_defer_decl() -> FunctionDecl {
    let defer_println = Stmt::Defer(
        Box::new(Stmt::ExprStmt(Expr::Call {
            callee: Box::new(Expr::Ident { name: "println".to_owned(), position: pos() }),
            type_args: vec![],
            args: vec![Expr::IntLiteral { value: 99, position: pos() }],
            position: pos(),
        })),
        pos(),
    );
    let body = block(vec![tagged_decl("a", 1), defer_println]);
    FunctionDecl {
        name: "main".to_owned(),
        type_params: vec![],
        params: vec![],
        varargs: false,
        return_type: Type::int(),
        is_async: false,
        body,
        exported: true,
        position: pos(),
    }
}

#[test]
fn defer_runs_before_a_later_destructor_on_unwind() {
    let ast = Ast::new(vec![
        Item::Struct(res_struct()),
        Item::Impl(res_destructor_impl()),
        Item::Function(main_with_defer_decl()),
    ]);
    let mut runtime = Runtime::new();
    runtime.load(&ast).unwrap();
    runtime.run("main", vec![]).unwrap();
    assert_eq!(runtime.output(), "99\n1\n");
}

