//! Enum construction and `match` dispatch over variant payloads,
//! including the built-in `Option`-shaped `Maybe<int>` pattern (spec
//! §4.8).
use cb::ast::*;
use cb::diagnostics::Position;
use cb::runtime::Runtime;
use cb::value::Value;

fn pos() -> Position {
    Position::new("enums_and_match.rs", 1, 1)
}

fn block(statements: Vec<Stmt>) -> Block {
    Block { statements, position: pos() }
}

/// `enum Maybe { Some(int), None }`
fn maybe_decl() -> EnumDecl {
    EnumDecl {
        name: "Maybe".to_owned(),
        type_params: vec![],
        variants: vec![
            ("Some".to_owned(), Some(Type::int()), None),
            ("None".to_owned(), None, None),
        ],
        exported: true,
        position: pos(),
    }
}

/// ```text
/// unwrap_or(m, fallback) {
///     return match (m) {
///         Some(x) => x,
///         None => fallback,
///     };
/// }
/// ```
fn unwrap_or_decl() -> FunctionDecl {
    let arms = vec![
        MatchArm {
            pattern: Pattern::VariantBind("Some".to_owned(), "x".to_owned()),
            body: MatchBody::Expr(Box::new(Expr::Ident { name: "x".to_owned(), position: pos() })),
        },
        MatchArm {
            pattern: Pattern::Variant("None".to_owned()),
            body: MatchBody::Expr(Box::new(Expr::Ident { name: "fallback".to_owned(), position: pos() })),
        },
    ];
    let body = block(vec![Stmt::Return(
        Some(Expr::Match {
            scrutinee: Box::new(Expr::Ident { name: "m".to_owned(), position: pos() }),
            arms,
            position: pos(),
        }),
        pos(),
    )]);
    FunctionDecl {
        name: "unwrap_or".to_owned(),
        type_params: vec![],
        params: vec![
            Param { name: "m".to_owned(), type_annotation: Type::Named("Maybe".to_owned()), default: None },
            Param { name: "fallback".to_owned(), type_annotation: Type::int(), default: None },
        ],
        varargs: false,
        return_type: Type::int(),
        is_async: false,
        body,
        exported: true,
        position: pos(),
    }
}

fn ast() -> Ast {
    Ast::new(vec![Item::Enum(maybe_decl()), Item::Function(unwrap_or_decl())])
}

#[test]
fn some_variant_unwraps_to_its_payload() {
    let mut runtime = Runtime::new();
    runtime.load(&ast()).unwrap();
    let some_42 = Value::Enum(cb::value::EnumValue {
        enum_name: "Maybe".to_owned(),
        variant: "Some".to_owned(),
        payload: Some(Box::new(Value::Integer(42))),
    });
    let result = runtime.run("unwrap_or", vec![some_42, Value::Integer(-1)]).unwrap();
    assert_eq!(result, Value::Integer(42));
}

#[test]
fn none_variant_falls_back() {
    let mut runtime = Runtime::new();
    runtime.load(&ast()).unwrap();
    let none = Value::Enum(cb::value::EnumValue {
        enum_name: "Maybe".to_owned(),
        variant: "None".to_owned(),
        payload: None,
    });
    let result = runtime.run("unwrap_or", vec![none, Value::Integer(-1)]).unwrap();
    assert_eq!(result, Value::Integer(-1));
}
