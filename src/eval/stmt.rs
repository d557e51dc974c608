//! Statement execution (spec §4.4, component C4): blocks, control
//! flow, declarations and assignment.
use crate::ast::{AssignOp, Block, CaseValue, ElseBranch, Stmt};
use crate::diagnostics::CbError;
use crate::env::Variable;
use crate::scheduler::TaskHandle;

use super::control::{ControlFlow, EvalResult};
use super::evaluator::Evaluator;

impl Evaluator {
    /// Run a block in its own scope, unwinding defers/destructors on
    /// every exit path — normal, `break`/`continue`/`return`, or an
    /// error (spec §4.7 "every scope exit, normal or abnormal").
    pub fn exec_block(&mut self, block: &Block, task: TaskHandle) -> EvalResult<ControlFlow> {
        self.env.push_scope();
        let result = self.exec_statements(&block.statements, task);
        let scope = self.env.pop_scope().expect("scope pushed above");
        self.unwind_scope_now(&scope)?;
        result
    }

    fn exec_statements(&mut self, statements: &[Stmt], task: TaskHandle) -> EvalResult<ControlFlow> {
        for statement in statements {
            self.maybe_yield(task)?;
            match self.exec_stmt(statement, task)? {
                ControlFlow::Normal => continue,
                other => return Ok(other),
            }
        }
        Ok(ControlFlow::Normal)
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt, task: TaskHandle) -> EvalResult<ControlFlow> {
        match stmt {
            Stmt::VarDecl(decl) => {
                self.exec_var_decl(decl, task)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::Assignment(assignment) => {
                self.exec_assignment(assignment, task)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::ExprStmt(expr) => {
                self.eval_expr(expr, task)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::If(if_stmt) => {
                let cond = self.eval_expr(&if_stmt.condition, task)?;
                let cond = cond.as_bool().ok_or_else(|| CbError::TypeMismatch {
                    expected: "bool".to_owned(),
                    found: cond.type_name().to_owned(),
                    position: Some(if_stmt.position.clone()),
                })?;
                if cond {
                    self.exec_block(&if_stmt.then_block, task)
                } else {
                    match &if_stmt.else_block {
                        Some(branch) => match branch.as_ref() {
                            ElseBranch::Block(block) => self.exec_block(block, task),
                            ElseBranch::If(inner) => {
                                self.exec_stmt(&Stmt::If(inner.clone()), task)
                            }
                        },
                        None => Ok(ControlFlow::Normal),
                    }
                }
            }
            Stmt::While(while_loop) => {
                loop {
                    self.maybe_yield(task)?;
                    let cond = self.eval_expr(&while_loop.condition, task)?;
                    let cond = cond.as_bool().ok_or_else(|| CbError::TypeMismatch {
                        expected: "bool".to_owned(),
                        found: cond.type_name().to_owned(),
                        position: Some(while_loop.position.clone()),
                    })?;
                    if !cond {
                        break;
                    }
                    match self.exec_block(&while_loop.body, task)? {
                        ControlFlow::Break => break,
                        ControlFlow::Continue | ControlFlow::Normal => continue,
                        ControlFlow::Return(v) => return Ok(ControlFlow::Return(v)),
                    }
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::For(for_loop) => {
                self.env.push_scope();
                let result = self.exec_for_loop(for_loop, task);
                let scope = self.env.pop_scope().expect("scope pushed above");
                self.unwind_scope_now(&scope)?;
                result
            }
            Stmt::Switch(switch) => self.exec_switch(switch, task),
            Stmt::Break(_) => Ok(ControlFlow::Break),
            Stmt::Continue(_) => Ok(ControlFlow::Continue),
            Stmt::Return(expr, _) => {
                let value = match expr {
                    Some(e) => self.eval_expr(e, task)?,
                    None => crate::value::Value::Void,
                };
                Ok(ControlFlow::Return(value))
            }
            Stmt::Defer(inner, _) => {
                self.env.push_defer((**inner).clone());
                Ok(ControlFlow::Normal)
            }
            Stmt::Yield(_) => {
                self.do_yield()?;
                Ok(ControlFlow::Normal)
            }
            Stmt::Block(block) => self.exec_block(block, task),
        }
    }

    fn exec_for_loop(
        &mut self,
        for_loop: &crate::ast::ForLoop,
        task: TaskHandle,
    ) -> EvalResult<ControlFlow> {
        if let Some(init) = &for_loop.init {
            self.exec_stmt(init, task)?;
        }
        loop {
            self.maybe_yield(task)?;
            if let Some(condition) = &for_loop.condition {
                let cond = self.eval_expr(condition, task)?;
                let cond = cond.as_bool().ok_or_else(|| CbError::TypeMismatch {
                    expected: "bool".to_owned(),
                    found: cond.type_name().to_owned(),
                    position: Some(for_loop.position.clone()),
                })?;
                if !cond {
                    break;
                }
            }
            match self.exec_block(&for_loop.body, task)? {
                ControlFlow::Break => break,
                ControlFlow::Return(v) => return Ok(ControlFlow::Return(v)),
                ControlFlow::Continue | ControlFlow::Normal => {}
            }
            if let Some(step) = &for_loop.step {
                self.exec_stmt(step, task)?;
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// `switch`/`case` dispatch (spec §4.4). Unlike `match`, cases
    /// compare literal/range *expressions* against the discriminant
    /// rather than destructuring enum variants, so this goes straight
    /// through [`Evaluator::eval_expr`] instead of `crate::pattern`.
    fn exec_switch(&mut self, switch: &crate::ast::SwitchStmt, task: TaskHandle) -> EvalResult<ControlFlow> {
        let discriminant = self.eval_expr(&switch.discriminant, task)?;
        for case in &switch.cases {
            let matches = match &case.values {
                None => true,
                Some(values) => {
                    let mut hit = false;
                    for value in values {
                        if self.case_value_matches(value, &discriminant, task)? {
                            hit = true;
                            break;
                        }
                    }
                    hit
                }
            };
            if matches {
                return self.exec_block(&case.body, task);
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn case_value_matches(
        &mut self,
        value: &CaseValue,
        discriminant: &crate::value::Value,
        task: TaskHandle,
    ) -> EvalResult<bool> {
        match value {
            CaseValue::Literal(expr) => {
                let candidate = self.eval_expr(expr, task)?;
                Ok(candidate == *discriminant)
            }
            CaseValue::Range(lo, hi) => {
                let lo = self.eval_expr(lo, task)?.as_int();
                let hi = self.eval_expr(hi, task)?.as_int();
                let v = discriminant.as_int();
                Ok(matches!((lo, hi, v), (Some(lo), Some(hi), Some(v)) if v >= lo && v <= hi))
            }
        }
    }

    fn exec_var_decl(&mut self, decl: &crate::ast::VarDecl, task: TaskHandle) -> EvalResult<()> {
        if decl.is_static {
            return self.exec_static_var_decl(decl, task);
        }
        let value = match &decl.initializer {
            Some(expr) => self.eval_expr(expr, task)?,
            None => self.default_value(&decl.type_annotation)?,
        };
        let value = self.commit_for_type(&decl.type_annotation, value, Some(&decl.position))?;
        let mut var = Variable::new(decl.name.clone(), decl.type_annotation.clone(), value, decl.position.clone());
        var.is_const = decl.is_const;
        var.has_destructor = self.has_destructor(&decl.type_annotation.to_string());
        self.env.declare(var)?;
        Ok(())
    }

    /// `static` locals persist across calls, keyed by an owner tag so
    /// the same backing scope re-attaches on every invocation (spec
    /// §4.3 "Static locals persist across calls"). The owner tag is
    /// the current task's function — approximated here by the
    /// variable's declaration position, which is unique per static
    /// declaration site and stable across calls to that same site.
    fn exec_static_var_decl(&mut self, decl: &crate::ast::VarDecl, task: TaskHandle) -> EvalResult<()> {
        let owner = format!("{}", decl.position);
        if self.env.static_scope(&owner).find(&decl.name).is_none() {
            let value = match &decl.initializer {
                Some(expr) => self.eval_expr(expr, task)?,
                None => self.default_value(&decl.type_annotation)?,
            };
            let value = self.commit_for_type(&decl.type_annotation, value, Some(&decl.position))?;
            let mut var = Variable::new(decl.name.clone(), decl.type_annotation.clone(), value, decl.position.clone());
            var.is_const = decl.is_const;
            var.is_static = true;
            self.env.static_scope(&owner).declare(var);
        }
        let value = self.env.static_scope(&owner).find(&decl.name).expect("just declared above").value.clone();
        let mut local = Variable::new(decl.name.clone(), decl.type_annotation.clone(), value, decl.position.clone());
        local.is_static = true;
        local.is_const = decl.is_const;
        self.env.declare(local)?;
        Ok(())
    }

    fn exec_assignment(&mut self, assignment: &crate::ast::Assignment, task: TaskHandle) -> EvalResult<()> {
        let new_value = self.eval_expr(&assignment.value, task)?;
        let value = match assignment.op {
            AssignOp::Assign => new_value,
            _ => {
                let current = self.read_lvalue(&assignment.target, task)?;
                self.apply_compound(assignment.op, &current, &new_value, &assignment.position)?
            }
        };
        self.assign_lvalue(&assignment.target, value, task)?;
        // A `static` local's mutation must also reach its persistent
        // backing scope, since `assign_lvalue` only writes the local
        // shadow copy re-declared on each call.
        if let crate::ast::LValue::Ident(name) = &assignment.target {
            if let Some(var) = self.env.find_variable(name) {
                if var.is_static {
                    let owner = format!("{}", var.position);
                    let value = var.value.clone();
                    if let Some(static_var) = self.env.static_scope(&owner).find_mut(name) {
                        static_var.value = value;
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_compound(
        &self,
        op: AssignOp,
        current: &crate::value::Value,
        rhs: &crate::value::Value,
        position: &crate::diagnostics::Position,
    ) -> EvalResult<crate::value::Value> {
        use crate::ast::BinaryOp;
        let binop = match op {
            AssignOp::AddAssign => BinaryOp::Add,
            AssignOp::SubAssign => BinaryOp::Sub,
            AssignOp::MulAssign => BinaryOp::Mul,
            AssignOp::DivAssign => BinaryOp::Div,
            AssignOp::ModAssign => BinaryOp::Mod,
            AssignOp::Assign => unreachable!("handled by caller"),
        };
        super::expr::eval_binary_values(binop, current, rhs, position)
    }
}
