//! Wires the Evaluator up as [`crate::lifetime::Hooks`] so
//! `lifetime::unwind_scope` can run `defer` statements and invoke
//! destructors without depending on the evaluator directly.
use crate::ast::Stmt;
use crate::diagnostics::CbError;
use crate::lifetime::Hooks;
use crate::scheduler::TaskHandle;
use crate::value::Value;

use super::control::Unwind;
use super::evaluator::Evaluator;

impl Hooks for Evaluator {
    fn run_defer_statement(&mut self, statement: &Stmt) -> Result<(), CbError> {
        let task = self.current_task.unwrap_or(TaskHandle(u64::MAX));
        match self.exec_stmt(statement, task) {
            Ok(_) => Ok(()),
            Err(Unwind::Error(e)) => Err(e),
            // A `?` inside a defer body has nowhere sensible to return
            // to; treat it as having run to completion.
            Err(Unwind::EarlyReturn(_)) => Ok(()),
        }
    }

    fn invoke_destructor(&mut self, type_name: &str, value: &Value) -> Result<(), CbError> {
        let dtor_name = format!("~{type_name}");
        let Some(methods) = self.env.impls.get(&(None, type_name.to_owned())) else {
            return Ok(());
        };
        let Some(method) = methods.iter().find(|m| m.name == dtor_name).cloned() else {
            return Ok(());
        };
        let task = self.current_task.unwrap_or(TaskHandle(u64::MAX));
        match self.call_function(&method.decl, vec![], Some(value.clone()), task) {
            Ok(_) => Ok(()),
            Err(Unwind::Error(e)) => Err(e),
            Err(Unwind::EarlyReturn(_)) => Ok(()),
        }
    }
}
