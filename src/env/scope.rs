use crate::ast::Stmt;

use super::Variable;

/// A `defer` entry: the statement to run, recorded in registration
/// order (spec §4.4 `defer`).
#[derive(Debug, Clone)]
pub struct DeferEntry {
    pub statement: Stmt,
}

/// One registration on a scope's timeline, in the order it happened.
/// Keeping variable declarations and `defer` registrations on a
/// single timeline (rather than two separate stacks) is what lets
/// scope exit honor spec §9's "defers registered after variable `v`
/// run before `v`'s destructor": walking the timeline in reverse and
/// firing defers/destructors as they're encountered reproduces that
/// rule directly, with no extra bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeEntry {
    Variable(usize),
    Defer(usize),
}

/// A lexical scope (spec §3 "Scope"): bindings in declaration order
/// (so LIFO destruction is just "iterate in reverse"), a pending
/// `defer` stack, and nothing else — the link to the enclosing scope
/// is implicit in [`crate::env::Environment`]'s scope stack rather
/// than a back-pointer, since the whole stack is always addressable.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub bindings: Vec<Variable>,
    pub defers: Vec<DeferEntry>,
    pub timeline: Vec<ScopeEntry>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, name: &str) -> Option<&Variable> {
        self.bindings.iter().rev().find(|v| v.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.bindings.iter_mut().rev().find(|v| v.name == name)
    }

    pub fn declare(&mut self, variable: Variable) -> bool {
        if self.bindings.iter().any(|v| v.name == variable.name) {
            return false;
        }
        self.timeline.push(ScopeEntry::Variable(self.bindings.len()));
        self.bindings.push(variable);
        true
    }

    pub fn push_defer(&mut self, statement: Stmt) {
        self.timeline.push(ScopeEntry::Defer(self.defers.len()));
        self.defers.push(DeferEntry { statement });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Position;
    use crate::types::Type;
    use crate::value::Value;

    fn var(name: &str) -> Variable {
        Variable::new(name, Type::int(), Value::Integer(0), Position::new("t", 1, 1))
    }

    #[test]
    fn timeline_interleaves_variables_and_defers_in_order() {
        let mut scope = Scope::new();
        scope.declare(var("a"));
        scope.push_defer(Stmt::Break(Position::new("t", 1, 1)));
        scope.declare(var("b"));
        assert_eq!(
            scope.timeline,
            vec![ScopeEntry::Variable(0), ScopeEntry::Defer(0), ScopeEntry::Variable(1)]
        );
    }
}
