//! The Lifetime Manager (spec §4.7, component C7).
//!
//! Orchestrates constructor/destructor invocation, `defer` sequencing,
//! and heap tracking. Running a `defer` statement or a destructor
//! method both require re-entering full statement/call evaluation, so
//! this module takes the actual execution as a closure supplied by
//! [`crate::eval`] rather than depending on it directly — the same
//! inversion the teacher's `Scope` uses to stay independent of the
//! interpreter's own `run_*` functions.
use crate::ast::Stmt;
use crate::diagnostics::CbError;
use crate::env::{Scope, ScopeEntry};
use crate::value::Value;

/// Callbacks the Evaluator supplies so this module never has to know
/// how to run a statement or invoke a method itself.
pub trait Hooks {
    fn run_defer_statement(&mut self, statement: &Stmt) -> Result<(), CbError>;
    /// Invoke `~TypeName()` on `value`, if one is registered. A no-op
    /// (not an error) if the type has no destructor.
    fn invoke_destructor(&mut self, type_name: &str, value: &Value) -> Result<(), CbError>;
}

/// Unwind one scope: run its timeline in reverse, firing defers and
/// destructors interleaved exactly as they were registered (spec §4.7,
/// §9 "Defer vs destructor ordering"). Called on every scope exit,
/// normal or abnormal (`return`/`break`/`continue`) — the caller is
/// responsible for invoking this once per scope popped while
/// unwinding, innermost first.
pub fn unwind_scope(scope: &Scope, hooks: &mut dyn Hooks) -> Result<(), CbError> {
    for entry in scope.timeline.iter().rev() {
        match entry {
            ScopeEntry::Defer(idx) => {
                hooks.run_defer_statement(&scope.defers[*idx].statement)?;
            }
            ScopeEntry::Variable(idx) => {
                let var = &scope.bindings[*idx];
                if var.has_destructor {
                    destroy_value(&var.declared_type, &var.value, hooks)?;
                }
            }
        }
    }
    Ok(())
}

/// Destroy a value: run its own destructor, then recursively destroy
/// any member structs, in reverse declaration order, parent before
/// members (spec §4.7 "(c) recursively destroy value-member structs
/// ... parent destructor runs before its members' destructors").
pub fn destroy_value(
    declared_type: &crate::types::Type,
    value: &Value,
    hooks: &mut dyn Hooks,
) -> Result<(), CbError> {
    let type_name = declared_type.to_string();
    hooks.invoke_destructor(&type_name, value)?;
    if let Value::Struct(s) = value {
        for (_, member_value) in s.members.iter().rev() {
            if let Value::Struct(inner) = member_value {
                let inner_type = crate::types::Type::Named(inner.type_name.clone());
                destroy_value(&inner_type, member_value, hooks)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Position;
    use crate::env::Variable;
    use crate::types::Type;

    struct Recorder {
        log: Vec<String>,
    }

    impl Hooks for Recorder {
        fn run_defer_statement(&mut self, _statement: &Stmt) -> Result<(), CbError> {
            self.log.push("defer".to_owned());
            Ok(())
        }

        fn invoke_destructor(&mut self, type_name: &str, value: &Value) -> Result<(), CbError> {
            if let Value::Struct(s) = value {
                self.log.push(format!("~{}({})", type_name, s.type_name));
            }
            Ok(())
        }
    }

    fn struct_var(name: &str) -> Variable {
        let value = Value::Struct(crate::value::StructValue {
            type_name: name.to_owned(),
            members: vec![],
        });
        let mut var = Variable::new(name, Type::Named(name.to_owned()), value, Position::new("t", 1, 1));
        var.has_destructor = true;
        var
    }

    #[test]
    fn scenario_a_lifo_destructors_with_nested_scopes() {
        // { R a(1); { R b(2); } R c(3); }
        // Expected destructor order: b(2), c(3), a(1).
        let mut outer = Scope::new();
        outer.declare(struct_var("a"));
        let mut inner = Scope::new();
        inner.declare(struct_var("b"));
        outer.declare(struct_var("c"));

        let mut recorder = Recorder { log: vec![] };
        unwind_scope(&inner, &mut recorder).unwrap();
        unwind_scope(&outer, &mut recorder).unwrap();

        assert_eq!(recorder.log, vec!["~b(b)", "~c(c)", "~a(a)"]);
    }

    #[test]
    fn defer_after_a_variable_runs_before_that_variables_destructor() {
        let mut scope = Scope::new();
        scope.declare(struct_var("a"));
        scope.push_defer(Stmt::Break(Position::new("t", 1, 1)));

        let mut recorder = Recorder { log: vec![] };
        unwind_scope(&scope, &mut recorder).unwrap();

        assert_eq!(recorder.log, vec!["defer", "~a(a)"]);
    }
}
