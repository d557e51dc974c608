use crate::ast::FunctionDecl;
use crate::diagnostics::CbError;
use crate::env::Environment;

#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    pub decl: FunctionDecl,
    /// The interface this method was found through, if dispatch fell
    /// through to step 2 (spec §4.5) rather than an inherent impl.
    pub via_interface: Option<String>,
}

/// Call resolution order for `x.m(args)` (spec §4.5):
/// 1. inherent impl (`impl T { m }`) — use it.
/// 2. otherwise collect candidates from every `impl I for T`.
/// 3. exactly one candidate -> call it; several -> `AmbiguousMethod`;
///    none -> `UndefinedMethod`.
pub fn resolve_method(
    env: &Environment,
    type_name: &str,
    method_name: &str,
) -> Result<ResolvedMethod, CbError> {
    if let Some(methods) = env.impls.get(&(None, type_name.to_owned())) {
        if let Some(m) = methods.iter().find(|m| m.name == method_name) {
            return Ok(ResolvedMethod { decl: m.decl.clone(), via_interface: None });
        }
    }

    let mut candidates: Vec<(String, FunctionDecl)> = Vec::new();
    for ((interface, ty), methods) in env.impls.iter() {
        let Some(interface) = interface else { continue };
        if ty != type_name {
            continue;
        }
        if let Some(m) = methods.iter().find(|m| m.name == method_name) {
            candidates.push((interface.clone(), m.decl.clone()));
        }
    }

    match candidates.len() {
        0 => Err(CbError::UndefinedMethod {
            name: method_name.to_owned(),
            type_name: type_name.to_owned(),
            position: None,
        }),
        1 => {
            let (interface, decl) = candidates.remove(0);
            Ok(ResolvedMethod { decl, via_interface: Some(interface) })
        }
        _ => Err(CbError::AmbiguousMethod {
            name: method_name.to_owned(),
            type_name: type_name.to_owned(),
            position: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Position};
    use crate::types::Type;

    fn decl(name: &str) -> FunctionDecl {
        FunctionDecl {
            name: name.to_owned(),
            type_params: vec![],
            params: vec![],
            varargs: false,
            return_type: Type::Void,
            is_async: false,
            body: Block { statements: vec![], position: Position::new("t", 1, 1) },
            exported: false,
            position: Position::new("t", 1, 1),
        }
    }

    #[test]
    fn inherent_impl_wins_over_interface_impls() {
        let mut env = Environment::new();
        env.register_impl_method(
            (None, "C".to_owned()),
            crate::env::ImplMethod { name: "inc".to_owned(), decl: decl("inc") },
        );
        env.register_impl_method(
            (Some("Inc".to_owned()), "C".to_owned()),
            crate::env::ImplMethod { name: "inc".to_owned(), decl: decl("inc") },
        );
        let resolved = resolve_method(&env, "C", "inc").unwrap();
        assert!(resolved.via_interface.is_none());
    }

    #[test]
    fn single_interface_candidate_resolves() {
        let mut env = Environment::new();
        env.register_impl_method(
            (Some("Inc".to_owned()), "C".to_owned()),
            crate::env::ImplMethod { name: "inc".to_owned(), decl: decl("inc") },
        );
        let resolved = resolve_method(&env, "C", "inc").unwrap();
        assert_eq!(resolved.via_interface.as_deref(), Some("Inc"));
    }

    #[test]
    fn two_interface_candidates_are_ambiguous() {
        let mut env = Environment::new();
        env.register_impl_method(
            (Some("A".to_owned()), "C".to_owned()),
            crate::env::ImplMethod { name: "m".to_owned(), decl: decl("m") },
        );
        env.register_impl_method(
            (Some("B".to_owned()), "C".to_owned()),
            crate::env::ImplMethod { name: "m".to_owned(), decl: decl("m") },
        );
        assert!(matches!(resolve_method(&env, "C", "m"), Err(CbError::AmbiguousMethod { .. })));
    }

    #[test]
    fn no_candidates_is_undefined() {
        let env = Environment::new();
        assert!(matches!(resolve_method(&env, "C", "m"), Err(CbError::UndefinedMethod { .. })));
    }
}
