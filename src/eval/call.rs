//! Function and method invocation, generic instantiation, and the
//! scheduler wiring for `async`/`await`/`yield` (spec §4.4, §4.5, §4.6).
use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{FunctionDecl, Param};
use crate::diagnostics::{CbError, Position};
use crate::dispatch::{resolve_method, ResolvedMethod};
use crate::scheduler::TaskHandle;
use crate::types::Type;
use crate::value::{FutureValue, Value};

use super::control::{ControlFlow, EvalResult, Unwind};
use super::evaluator::{Evaluator, PendingCall, TaskFrame};

impl Evaluator {
    /// Invoke a function or impl method. `self_value`, when present,
    /// is bound to `self` for the call; the second element of the
    /// return value is `self`'s final state after the call, which the
    /// caller (see `eval_receiver` in `expr.rs`) writes back to the
    /// receiver's origin so mutation through `self` is visible there
    /// (spec §4.5).
    pub fn call_function(
        &mut self,
        decl: &FunctionDecl,
        args: Vec<Value>,
        self_value: Option<Value>,
        task: TaskHandle,
    ) -> EvalResult<(Value, Option<Value>)> {
        if args.len() > decl.params.len() && !decl.varargs {
            return Err(CbError::ArgumentCountMismatch {
                expected: decl.params.len(),
                found: args.len(),
                position: Some(decl.position.clone()),
            }
            .into());
        }

        let previous_task = self.current_task;
        self.current_task = Some(task);

        self.env.push_scope();
        let has_self = self_value.is_some();
        if let Some(receiver) = self_value {
            let mut self_var = crate::env::Variable::new(
                "self",
                Type::Unknown,
                receiver,
                decl.position.clone(),
            );
            self_var.has_destructor = false;
            // `declare` can't fail here: a fresh scope has no bindings yet.
            self.env.declare(self_var).expect("fresh scope has no `self` binding");
        }
        if let Err(e) = self.bind_params(&decl.params, args, &decl.position) {
            let scope = self.env.pop_scope().expect("scope pushed above");
            self.unwind_scope_now(&scope)?;
            self.current_task = previous_task;
            return Err(e);
        }

        let body_result = self.exec_block(&decl.body, task);
        let final_self = if has_self {
            self.env.find_variable("self").map(|v| v.value.clone())
        } else {
            None
        };
        let scope = self.env.pop_scope().expect("scope pushed above");
        self.unwind_scope_now(&scope)?;
        self.current_task = previous_task;

        let value = match body_result {
            Ok(ControlFlow::Return(v)) => v,
            Ok(_) => Value::Void,
            Err(Unwind::EarlyReturn(v)) => v,
            Err(Unwind::Error(e)) => return Err(Unwind::Error(e)),
        };
        Ok((value, final_self))
    }

    fn bind_params(
        &mut self,
        params: &[Param],
        mut args: Vec<Value>,
        position: &Position,
    ) -> EvalResult<()> {
        for (i, param) in params.iter().enumerate() {
            let value = if i < args.len() {
                std::mem::replace(&mut args[i], Value::Void)
            } else if let Some(default) = &param.default {
                let task = self.current_task.unwrap_or(TaskHandle(u64::MAX));
                self.eval_expr(default, task)?
            } else {
                return Err(CbError::ArgumentCountMismatch {
                    expected: params.len(),
                    found: args.len(),
                    position: Some(position.clone()),
                }
                .into());
            };
            self.env.declare(crate::env::Variable::new(
                param.name.clone(),
                param.type_annotation.clone(),
                value,
                position.clone(),
            ))?;
        }
        Ok(())
    }

    /// Unwind one popped scope's defers/destructors (spec §4.7). A
    /// thin wrapper so call sites don't need to know about
    /// `crate::lifetime` directly.
    pub(super) fn unwind_scope_now(&mut self, scope: &crate::env::Scope) -> EvalResult<()> {
        let scope = scope.clone();
        crate::lifetime::unwind_scope(&scope, self)?;
        Ok(())
    }

    /// `x.m(args)` dispatch (spec §4.5): resolve, then call like any
    /// other function with `self` bound to the receiver.
    pub fn call_method(
        &mut self,
        receiver: Value,
        type_name: &str,
        method: &str,
        args: Vec<Value>,
        task: TaskHandle,
    ) -> EvalResult<(Value, Option<Value>)> {
        let ResolvedMethod { decl, .. } = resolve_method(&self.env, type_name, method)?;
        if decl.is_async {
            return Ok((self.spawn_async(decl, args, Some(receiver)), None));
        }
        self.call_function(&decl, args, Some(receiver), task)
    }

    /// Launch an `async` call as a new task (spec §4.6): enqueued
    /// ready, its body deferred until the scheduler actually runs it.
    /// The caller immediately gets back an unresolved `Future<T>`.
    pub fn spawn_async(
        &mut self,
        decl: FunctionDecl,
        args: Vec<Value>,
        self_value: Option<Value>,
    ) -> Value {
        let handle = self.scheduler.spawn();
        self.frames.insert(
            handle,
            TaskFrame { return_type: decl.return_type.clone(), in_async_context: true },
        );
        self.pending.insert(handle, PendingCall { decl, args, self_value });
        Value::Future(FutureValue { task: handle, slot: Rc::new(RefCell::new(None)) })
    }

    /// Drive one queued task to completion. This scheduler models
    /// fairness at task granularity: once a task starts, it runs to
    /// completion before control returns to whichever `await`/`yield`
    /// triggered it. True statement-level interleaving between two
    /// *running* tasks would need a resumable continuation per task,
    /// which a recursive tree-walker does not have (see DESIGN.md).
    pub fn run_ready_task(&mut self, handle: TaskHandle) -> EvalResult<()> {
        let Some(pending) = self.pending.remove(&handle) else { return Ok(()) };
        let PendingCall { decl, args, self_value } = pending;
        match self.call_function(&decl, args, self_value, handle) {
            Ok((value, _)) => self.scheduler.resolve(handle, value),
            Err(Unwind::Error(e)) => {
                if self.scheduler.is_root(handle) {
                    return Err(Unwind::Error(e));
                }
                log::error!("background task {handle:?} failed: {e}");
                self.scheduler.fail(handle);
            }
            Err(Unwind::EarlyReturn(value)) => self.scheduler.resolve(handle, value),
        }
        Ok(())
    }

    /// `await e` (spec §4.4, §4.6): run the awaited task to completion
    /// if it hasn't started yet, then return its resolved value.
    pub fn await_future(&mut self, future: &FutureValue) -> EvalResult<Value> {
        if !self.scheduler.is_resolved(future.task) {
            self.run_ready_task(future.task)?;
        }
        let value = self.scheduler.result_of(future.task).unwrap_or(Value::Void);
        future.resolve(value.clone());
        Ok(value)
    }

    /// `yield` (spec §4.6): requeue the current task, then let the
    /// next ready task run to completion so other tasks make progress.
    pub fn do_yield(&mut self) -> EvalResult<()> {
        self.scheduler.yield_current();
        if let Some(next) = self.scheduler.run_next() {
            self.run_ready_task(next)?;
        }
        Ok(())
    }

    /// Automatic yield insertion (spec §4.6): checked at every
    /// statement boundary, loop iteration and function entry while the
    /// current task is inside an `async` call chain.
    pub(super) fn maybe_yield(&mut self, task: TaskHandle) -> EvalResult<()> {
        let in_async = self.frames.get(&task).map(|f| f.in_async_context).unwrap_or(false);
        if in_async && self.scheduler.has_ready_work() {
            self.do_yield()?;
        }
        Ok(())
    }

    /// `T(args)` as a variable initializer, or `new T(args)` (spec
    /// §4.7 constructors): call the inherent impl method named exactly
    /// like the type, if one exists, binding a default-initialized
    /// `self`; otherwise build a plain default instance and apply the
    /// field initializers positionally isn't supported without named
    /// args, so a type with no declared constructor just gets its
    /// member defaults.
    pub(super) fn construct(
        &mut self,
        type_name: &str,
        args: Vec<Value>,
        task: TaskHandle,
    ) -> EvalResult<Value> {
        let base = self.default_struct_value(type_name)?;
        let has_ctor = self
            .env
            .impls
            .get(&(None, type_name.to_owned()))
            .map(|methods| methods.iter().any(|m| m.name == type_name))
            .unwrap_or(false);
        if !has_ctor {
            return Ok(base);
        }
        let decl = self
            .env
            .impls
            .get(&(None, type_name.to_owned()))
            .and_then(|methods| methods.iter().find(|m| m.name == type_name))
            .map(|m| m.decl.clone())
            .expect("checked has_ctor above");
        let (_, final_self) = self.call_function(&decl, args, Some(base.clone()), task)?;
        Ok(final_self.unwrap_or(base))
    }

    pub(super) fn has_destructor(&self, type_name: &str) -> bool {
        let dtor = format!("~{type_name}");
        self.env
            .impls
            .get(&(None, type_name.to_owned()))
            .map(|methods| methods.iter().any(|m| m.name == dtor))
            .unwrap_or(false)
    }
}
