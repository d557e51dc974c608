//! The process-scoped runtime object (spec §9 "Global mutable state"):
//! the one thing an external harness constructs and drives. Wraps a
//! single [`Evaluator`] — which already owns the one [`Environment`]
//! and one [`Scheduler`] the spec calls for — and adds the load/run/
//! shutdown sequence a CLI entry point needs.
use log::{trace, warn};

use crate::ast::Ast;
use crate::diagnostics::CbError;
use crate::eval::Evaluator;
use crate::value::Value;

/// Owns the whole interpreter for one program run. Constructed once,
/// loaded with one [`Ast`], then driven by a single `run` call — there
/// is no notion of reloading or resetting mid-run (spec §9: the
/// runtime's state is process-scoped, not request-scoped).
pub struct Runtime {
    evaluator: Evaluator,
}

impl Runtime {
    pub fn new() -> Self {
        Self { evaluator: Evaluator::new() }
    }

    /// Register every top-level declaration in `ast` (spec §6 "Parser
    /// contract"). Call once, before `run`.
    pub fn load(&mut self, ast: &Ast) -> Result<(), CbError> {
        trace!("loading {} top-level item(s)", ast.items.len());
        self.evaluator.load(ast)
    }

    /// Run `entry_point`'s body to completion as the root task (spec
    /// §4.6 "If the root task finishes, the program ends"). Any
    /// heap allocation still live when the root task finishes is
    /// reported as a leak warning, never as an error (spec §4.7).
    pub fn run(&mut self, entry_point: &str, args: Vec<Value>) -> Result<Value, CbError> {
        let result = self.evaluator.run_function(entry_point, args)?;
        for leak in self.evaluator.env.heap.leaks() {
            warn!("{leak}");
        }
        Ok(result)
    }

    /// Everything `print`/`println`/`printf` wrote during the run
    /// (spec §6 print API), for callers that want the program's full
    /// output rather than watching stdout directly.
    pub fn output(&self) -> &str {
        &self.evaluator.output
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::diagnostics::Position;

    fn pos() -> Position {
        Position::new("t", 1, 1)
    }

    #[test]
    fn loads_and_runs_a_trivial_program() {
        let decl = FunctionDecl {
            name: "main".to_owned(),
            type_params: vec![],
            params: vec![],
            varargs: false,
            return_type: Type::int(),
            is_async: false,
            body: Block {
                statements: vec![Stmt::Return(
                    Some(Expr::IntLiteral { value: 7, position: pos() }),
                    pos(),
                )],
                position: pos(),
            },
            exported: true,
            position: pos(),
        };
        let ast = Ast::new(vec![Item::Function(decl)]);

        let mut runtime = Runtime::new();
        runtime.load(&ast).unwrap();
        let result = runtime.run("main", vec![]).unwrap();
        assert_eq!(result, Value::Integer(7));
    }
}
