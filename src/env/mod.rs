//! Environment & Scopes (spec §4.3, component C3).
mod environment;
mod heap;
mod namespace;
mod scope;
mod variable;

pub use self::environment::{Environment, GenericCacheEntry, GenericKey, ImplKey, ImplMethod};
pub use self::heap::{Heap, HeapSlot};
pub use self::namespace::NamespaceSearch;
pub use self::scope::{DeferEntry, Scope, ScopeEntry};
pub use self::variable::Variable;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CbError, Position};
    use crate::types::Type;
    use crate::value::Value;

    fn var(name: &str) -> Variable {
        Variable::new(name, Type::int(), Value::Integer(0), Position::new("t", 1, 1))
    }

    #[test]
    fn shadowing_in_inner_scope_does_not_affect_outer() {
        let mut env = Environment::new();
        env.declare(var("x")).unwrap();
        env.push_scope();
        env.declare(Variable::new("x", Type::int(), Value::Integer(1), Position::new("t", 1, 1)))
            .unwrap();
        assert_eq!(env.find_variable("x").unwrap().value, Value::Integer(1));
        env.pop_scope();
        assert_eq!(env.find_variable("x").unwrap().value, Value::Integer(0));
    }

    #[test]
    fn duplicate_declaration_in_same_scope_fails() {
        let mut env = Environment::new();
        env.push_scope();
        env.declare(var("x")).unwrap();
        let err = env.declare(var("x"));
        assert!(matches!(err, Err(CbError::DuplicateDeclaration { .. })));
    }

    #[test]
    fn function_lookup_follows_using_search_order() {
        use crate::ast::{Block, FunctionDecl, Position as AstPos};
        let mut env = Environment::new();
        let decl = FunctionDecl {
            name: "helper".to_owned(),
            type_params: vec![],
            params: vec![],
            varargs: false,
            return_type: Type::Void,
            is_async: false,
            body: Block { statements: vec![], position: AstPos::new("t", 1, 1) },
            exported: true,
            position: AstPos::new("t", 1, 1),
        };
        env.register_function("util::helper", decl);
        assert!(env.lookup_function("helper").is_none());
        env.namespaces.add_using("util");
        assert!(env.lookup_function("helper").is_some());
    }
}
