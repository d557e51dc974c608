//! Expression evaluation (spec §4.4, component C4). Every `Expr`
//! variant produces a [`Value`] or unwinds via [`Unwind`].
use crate::ast::{BinaryOp, Expr, LValue, MatchBody, UnaryOp};
use crate::diagnostics::{CbError, Position};
use crate::dispatch::{conflicting_bound_methods, instantiate_function};
use crate::env::{GenericCacheEntry, Variable};
use crate::lifetime::Hooks;
use crate::scheduler::TaskHandle;
use crate::types::{Mutability, Type};
use crate::value::{EnumValue, FunctionValue, Pointer, PointerKind, Value};

use super::control::{EvalResult, Unwind};
use super::defaults::array_storage_from;
use super::evaluator::Evaluator;
use super::lvalue::expr_to_lvalue;

fn type_mismatch(expected: &str, found: &Value, position: &Position) -> Unwind {
    CbError::TypeMismatch {
        expected: expected.to_owned(),
        found: found.type_name().to_owned(),
        position: Some(position.clone()),
    }
    .into()
}

fn value_type_name(value: &Value) -> Option<String> {
    match value {
        Value::Struct(s) => Some(s.type_name.clone()),
        Value::Enum(e) => Some(e.enum_name.clone()),
        _ => None,
    }
}

pub(super) fn value_runtime_type(value: &Value) -> Type {
    match value {
        Value::Void => Type::Void,
        Value::Bool(_) => Type::Bool,
        Value::Char(_) => Type::Char,
        Value::Integer(_) => Type::int(),
        Value::Float(_) => Type::Float { width: crate::types::FloatWidth::Double },
        Value::Str(_) => Type::String,
        Value::Array { element_type, .. } => {
            Type::Array { element: Box::new(element_type.clone()), dimensions: vec![] }
        }
        Value::Struct(s) => Type::Named(s.type_name.clone()),
        Value::Enum(e) => Type::Named(e.enum_name.clone()),
        Value::Pointer(_) | Value::Function(_) | Value::Future(_) => Type::Unknown,
    }
}

fn member_root_and_path(lvalue: &LValue) -> EvalResult<(String, Vec<String>)> {
    match lvalue {
        LValue::Ident(name) => Ok((name.clone(), vec![])),
        LValue::Member { target, field } => {
            let (root, mut path) = member_root_and_path(target)?;
            path.push(field.clone());
            Ok((root, path))
        }
        _ => Err(CbError::TypeMismatch {
            expected: "addressable struct path".to_owned(),
            found: "nested expression".to_owned(),
            position: None,
        }
        .into()),
    }
}

pub(super) fn eval_binary_values(op: BinaryOp, l: &Value, r: &Value, position: &Position) -> EvalResult<Value> {
    use BinaryOp::*;
    if let (Value::Str(a), Value::Str(b)) = (l, r) {
        return match op {
            Add => Ok(Value::Str(format!("{a}{b}"))),
            Eq => Ok(Value::Bool(a == b)),
            Ne => Ok(Value::Bool(a != b)),
            Lt => Ok(Value::Bool(a < b)),
            Le => Ok(Value::Bool(a <= b)),
            Gt => Ok(Value::Bool(a > b)),
            Ge => Ok(Value::Bool(a >= b)),
            _ => Err(type_mismatch("numeric", r, position)),
        };
    }
    if let (Value::Bool(a), Value::Bool(b)) = (l, r) {
        return match op {
            Eq => Ok(Value::Bool(a == b)),
            Ne => Ok(Value::Bool(a != b)),
            BitAnd => Ok(Value::Bool(*a && *b)),
            BitOr => Ok(Value::Bool(*a || *b)),
            BitXor => Ok(Value::Bool(a != b)),
            _ => Err(type_mismatch("bool", r, position)),
        };
    }
    if matches!(l, Value::Float(_)) || matches!(r, Value::Float(_)) {
        let a = l.as_float().ok_or_else(|| type_mismatch("numeric", l, position))?;
        let b = r.as_float().ok_or_else(|| type_mismatch("numeric", r, position))?;
        return match op {
            Add => Ok(Value::Float(a + b)),
            Sub => Ok(Value::Float(a - b)),
            Mul => Ok(Value::Float(a * b)),
            Div => {
                if b == 0.0 {
                    return Err(CbError::DivisionByZero { position: Some(position.clone()) }.into());
                }
                Ok(Value::Float(a / b))
            }
            Mod => {
                if b == 0.0 {
                    return Err(CbError::DivisionByZero { position: Some(position.clone()) }.into());
                }
                Ok(Value::Float(a % b))
            }
            Eq => Ok(Value::Bool(a == b)),
            Ne => Ok(Value::Bool(a != b)),
            Lt => Ok(Value::Bool(a < b)),
            Le => Ok(Value::Bool(a <= b)),
            Gt => Ok(Value::Bool(a > b)),
            Ge => Ok(Value::Bool(a >= b)),
            _ => Err(type_mismatch("float", r, position)),
        };
    }
    let a = l.as_int().ok_or_else(|| type_mismatch("numeric", l, position))?;
    let b = r.as_int().ok_or_else(|| type_mismatch("numeric", r, position))?;
    match op {
        Add => Ok(Value::Integer(a.wrapping_add(b))),
        Sub => Ok(Value::Integer(a.wrapping_sub(b))),
        Mul => Ok(Value::Integer(a.wrapping_mul(b))),
        Div => {
            if b == 0 {
                return Err(CbError::DivisionByZero { position: Some(position.clone()) }.into());
            }
            Ok(Value::Integer(a / b))
        }
        Mod => {
            if b == 0 {
                return Err(CbError::DivisionByZero { position: Some(position.clone()) }.into());
            }
            Ok(Value::Integer(a % b))
        }
        Eq => Ok(Value::Bool(a == b)),
        Ne => Ok(Value::Bool(a != b)),
        Lt => Ok(Value::Bool(a < b)),
        Le => Ok(Value::Bool(a <= b)),
        Gt => Ok(Value::Bool(a > b)),
        Ge => Ok(Value::Bool(a >= b)),
        BitAnd => Ok(Value::Integer(a & b)),
        BitOr => Ok(Value::Integer(a | b)),
        BitXor => Ok(Value::Integer(a ^ b)),
        Shl => Ok(Value::Integer(a << b)),
        Shr => Ok(Value::Integer(a >> b)),
        And | Or => unreachable!("short-circuited in eval_binary"),
    }
}

impl Evaluator {
    pub fn eval_expr(&mut self, expr: &Expr, task: TaskHandle) -> EvalResult<Value> {
        match expr {
            Expr::IntLiteral { value, .. } => Ok(Value::Integer(*value)),
            Expr::FloatLiteral { value, .. } => Ok(Value::Float(*value)),
            Expr::BoolLiteral { value, .. } => Ok(Value::Bool(*value)),
            Expr::CharLiteral { value, .. } => Ok(Value::Char(*value)),
            Expr::StringLiteral { value, .. } => Ok(Value::Str(value.clone())),

            Expr::Interpolated { segments, .. } => {
                let mut out = String::new();
                for segment in segments {
                    match segment {
                        crate::ast::InterpSegment::Literal(s) => out.push_str(s),
                        crate::ast::InterpSegment::Expr { expr, format } => {
                            let value = self.eval_expr(expr, task)?;
                            out.push_str(&super::format::format_interp_value(&value, format.as_deref()));
                        }
                    }
                }
                Ok(Value::Str(out))
            }

            Expr::Ident { name, position } => match self.env.find_variable(name) {
                Some(var) => Ok(var.value.clone()),
                None => Err(CbError::UndefinedVariable {
                    name: name.clone(),
                    position: Some(position.clone()),
                }
                .into()),
            },
            Expr::QualifiedIdent { path, name, position } => {
                let qualified = format!("{}::{}", path.join("::"), name);
                match self.env.find_variable(&qualified) {
                    Some(var) => Ok(var.value.clone()),
                    None => Err(CbError::UndefinedVariable {
                        name: qualified,
                        position: Some(position.clone()),
                    }
                    .into()),
                }
            }

            Expr::Member { target, field, position } => {
                let container = self.eval_expr(target, task)?;
                match &container {
                    Value::Struct(s) => s.get(field).cloned().ok_or_else(|| {
                        CbError::TypeMismatch {
                            expected: format!("struct with member '{field}'"),
                            found: s.type_name.clone(),
                            position: Some(position.clone()),
                        }
                        .into()
                    }),
                    Value::Future(future) => match field.as_str() {
                        "is_ready" => Ok(Value::Bool(future.is_ready())),
                        "value" => Ok(future.value().unwrap_or(Value::Void)),
                        _ => Err(CbError::UndefinedMethod {
                            name: field.clone(),
                            type_name: "future".to_owned(),
                            position: Some(position.clone()),
                        }
                        .into()),
                    },
                    other => Err(type_mismatch("struct", other, position)),
                }
            }
            Expr::Index { target, index, position } => {
                let container = self.eval_expr(target, task)?;
                let idx = self
                    .eval_expr(index, task)?
                    .as_int()
                    .ok_or_else(|| type_mismatch("integer index", &container, position))?;
                match &container {
                    Value::Array { storage, .. } => {
                        if idx < 0 || idx as usize >= storage.len() {
                            return Err(CbError::ArrayIndexOutOfBounds {
                                index: idx,
                                length: storage.len(),
                                position: Some(position.clone()),
                            }
                            .into());
                        }
                        Ok(storage.get(idx as usize).expect("bounds checked above"))
                    }
                    Value::Str(s) => {
                        let chars: Vec<char> = s.chars().collect();
                        if idx < 0 || idx as usize >= chars.len() {
                            return Err(CbError::ArrayIndexOutOfBounds {
                                index: idx,
                                length: chars.len(),
                                position: Some(position.clone()),
                            }
                            .into());
                        }
                        Ok(Value::Char(chars[idx as usize]))
                    }
                    other => Err(type_mismatch("array or string", other, position)),
                }
            }

            Expr::Unary { op, operand, position } => self.eval_unary(*op, operand, task, position),
            Expr::Binary { op, lhs, rhs, position } => self.eval_binary(*op, lhs, rhs, task, position),
            Expr::Ternary { condition, then_branch, else_branch, .. } => {
                let cond = self.eval_expr(condition, task)?;
                let cond = cond
                    .as_bool()
                    .ok_or_else(|| type_mismatch("bool", &cond, condition.position()))?;
                if cond {
                    self.eval_expr(then_branch, task)
                } else {
                    self.eval_expr(else_branch, task)
                }
            }

            Expr::Call { callee, type_args, args, position } => {
                self.eval_call(callee, type_args, args, task, position)
            }
            Expr::MethodCall { .. } => {
                let (value, _) = self.eval_receiver(expr, task)?;
                Ok(value)
            }

            Expr::StructLiteral { type_name, fields, position, .. } => {
                let base = self.default_struct_value(type_name)?;
                let Value::Struct(mut s) = base else { unreachable!("default_struct_value returns a struct") };
                for field in fields {
                    let value = self.eval_expr(&field.value, task)?;
                    if !s.set(&field.name, value) {
                        return Err(CbError::TypeMismatch {
                            expected: format!("struct with member '{}'", field.name),
                            found: s.type_name.clone(),
                            position: Some(position.clone()),
                        }
                        .into());
                    }
                }
                Ok(Value::Struct(s))
            }
            Expr::ArrayLiteral { elements, .. } => {
                let values =
                    elements.iter().map(|e| self.eval_expr(e, task)).collect::<EvalResult<Vec<_>>>()?;
                let element_type = values.first().map(value_runtime_type).unwrap_or(Type::Unknown);
                Ok(Value::Array { element_type, storage: array_storage_from(&values) })
            }
            Expr::EnumLiteral { enum_name, variant, payload, position } => {
                let resolved_enum = match enum_name {
                    Some(name) => name.clone(),
                    None => self.resolve_enum_for_variant(variant).ok_or_else(|| {
                        CbError::UndefinedEnumMember {
                            enum_name: "<inferred>".to_owned(),
                            member: variant.clone(),
                            position: Some(position.clone()),
                        }
                    })?,
                };
                let payload_value = match payload {
                    Some(expr) => Some(Box::new(self.eval_expr(expr, task)?)),
                    None => None,
                };
                Ok(Value::Enum(EnumValue { enum_name: resolved_enum, variant: variant.clone(), payload: payload_value }))
            }

            Expr::Match { scrutinee, arms, position } => self.eval_match(scrutinee, arms, task, position),

            Expr::New { type_annotation, args, position } => {
                let arg_values =
                    args.iter().map(|a| self.eval_expr(a, task)).collect::<EvalResult<Vec<_>>>()?;
                let value = match type_annotation {
                    Type::Named(name) if self.struct_decls.contains_key(name) => {
                        self.construct(name, arg_values, task)?
                    }
                    other => self.default_value(other)?,
                };
                let element_type = self
                    .env
                    .type_registry
                    .resolve_to_concrete(type_annotation)
                    .unwrap_or_else(|_| type_annotation.clone());
                let handle = self.env.heap.allocate(element_type.clone(), vec![value]);
                Ok(Value::Pointer(Pointer {
                    kind: PointerKind::Heap { handle, element_type, count: 1 },
                    mutability: Mutability::Mut,
                }))
            }
            Expr::NewArray { element_type, count, position } => {
                let n = self
                    .eval_expr(count, task)?
                    .as_int()
                    .ok_or_else(|| CbError::TypeMismatch {
                        expected: "integer count".to_owned(),
                        found: "non-integer".to_owned(),
                        position: Some(position.clone()),
                    })?;
                if n < 0 {
                    return Err(CbError::ArrayIndexOutOfBounds {
                        index: n,
                        length: 0,
                        position: Some(position.clone()),
                    }
                    .into());
                }
                let mut values = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    values.push(self.default_value(element_type)?);
                }
                let handle = self.env.heap.allocate(element_type.clone(), values);
                Ok(Value::Pointer(Pointer {
                    kind: PointerKind::Heap { handle, element_type: element_type.clone(), count: n as usize },
                    mutability: Mutability::Mut,
                }))
            }
            Expr::Delete { pointer, position } => self.eval_delete(pointer, task, position),
            Expr::SizeOf { type_annotation, position } => {
                let resolved = self
                    .env
                    .type_registry
                    .resolve_to_concrete(type_annotation)
                    .map_err(Unwind::Error)?;
                let size = resolved.size_of().ok_or_else(|| CbError::TypeMismatch {
                    expected: "sized type".to_owned(),
                    found: resolved.to_string(),
                    position: Some(position.clone()),
                })?;
                Ok(Value::Integer(size as i64))
            }

            Expr::Try { expr: inner, .. } => {
                let value = self.eval_expr(inner, task)?;
                match &value {
                    Value::Enum(e) if e.variant == "Ok" || e.variant == "Some" => {
                        Ok(e.payload.as_ref().map(|p| (**p).clone()).unwrap_or(Value::Void))
                    }
                    Value::Enum(e) if e.variant == "Err" || e.variant == "None" => {
                        Err(Unwind::EarlyReturn(value))
                    }
                    other => Err(type_mismatch("Option or Result", other, inner.position())),
                }
            }
            Expr::Await { expr: inner, position } => {
                let value = self.eval_expr(inner, task)?;
                match value {
                    Value::Future(future) => self.await_future(&future),
                    other => Err(type_mismatch("future", &other, position)),
                }
            }

            Expr::Lambda { params, return_type, is_async, body, position } => {
                let name = format!("<lambda@{}>", position);
                let decl = crate::ast::FunctionDecl {
                    name: name.clone(),
                    type_params: vec![],
                    params: params.clone(),
                    varargs: false,
                    return_type: return_type.clone(),
                    is_async: *is_async,
                    body: (**body).clone(),
                    exported: false,
                    position: position.clone(),
                };
                self.env.register_function(name.clone(), decl);
                Ok(Value::Function(FunctionValue { qualified_name: name, bound_receiver: None }))
            }

            Expr::Block(block) => match self.exec_block(block, task)? {
                super::control::ControlFlow::Return(v) => Err(Unwind::EarlyReturn(v)),
                _ => Ok(Value::Void),
            },
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, task: TaskHandle, position: &Position) -> EvalResult<Value> {
        match op {
            UnaryOp::Ref => {
                let lvalue = expr_to_lvalue(operand).ok_or_else(|| CbError::TypeMismatch {
                    expected: "addressable lvalue".to_owned(),
                    found: "expression".to_owned(),
                    position: Some(position.clone()),
                })?;
                Ok(Value::Pointer(self.address_of(&lvalue, task)?))
            }
            _ => {
                let value = self.eval_expr(operand, task)?;
                match op {
                    UnaryOp::Neg => match value {
                        Value::Integer(i) => Ok(Value::Integer(-i)),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        other => Err(type_mismatch("numeric", &other, position)),
                    },
                    UnaryOp::Not => {
                        let b = value.as_bool().ok_or_else(|| type_mismatch("bool", &value, position))?;
                        Ok(Value::Bool(!b))
                    }
                    UnaryOp::BitNot => {
                        let i = value.as_int().ok_or_else(|| type_mismatch("integer", &value, position))?;
                        Ok(Value::Integer(!i))
                    }
                    UnaryOp::Deref => match value {
                        Value::Pointer(p) => self.deref_read(&p),
                        other => Err(type_mismatch("pointer", &other, position)),
                    },
                    UnaryOp::Ref => unreachable!("handled above"),
                }
            }
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        task: TaskHandle,
        position: &Position,
    ) -> EvalResult<Value> {
        match op {
            BinaryOp::And => {
                let l = self.eval_expr(lhs, task)?;
                let lb = l.as_bool().ok_or_else(|| type_mismatch("bool", &l, position))?;
                if !lb {
                    return Ok(Value::Bool(false));
                }
                let r = self.eval_expr(rhs, task)?;
                let rb = r.as_bool().ok_or_else(|| type_mismatch("bool", &r, position))?;
                Ok(Value::Bool(rb))
            }
            BinaryOp::Or => {
                let l = self.eval_expr(lhs, task)?;
                let lb = l.as_bool().ok_or_else(|| type_mismatch("bool", &l, position))?;
                if lb {
                    return Ok(Value::Bool(true));
                }
                let r = self.eval_expr(rhs, task)?;
                let rb = r.as_bool().ok_or_else(|| type_mismatch("bool", &r, position))?;
                Ok(Value::Bool(rb))
            }
            _ => {
                let l = self.eval_expr(lhs, task)?;
                let r = self.eval_expr(rhs, task)?;
                eval_binary_values(op, &l, &r, position)
            }
        }
    }

    fn resolve_enum_for_variant(&self, variant: &str) -> Option<String> {
        match variant {
            "Some" | "None" => Some("Option".to_owned()),
            "Ok" | "Err" => Some("Result".to_owned()),
            _ => self
                .enum_decls
                .iter()
                .find(|(_, decl)| decl.variants.iter().any(|(name, _, _)| name == variant))
                .map(|(name, _)| name.clone()),
        }
    }

    fn eval_match(
        &mut self,
        scrutinee: &Expr,
        arms: &[crate::ast::MatchArm],
        task: TaskHandle,
        position: &Position,
    ) -> EvalResult<Value> {
        let value = self.eval_expr(scrutinee, task)?;
        let pairs: Vec<(crate::ast::Pattern, MatchBody)> =
            arms.iter().map(|arm| (arm.pattern.clone(), arm.body.clone())).collect();
        let (body, bindings) = crate::pattern::select_arm(&pairs, &value).map_err(Unwind::Error)?;
        self.env.push_scope();
        for (name, bound_value) in bindings {
            // A fresh scope never has a duplicate binder name.
            self.env.declare(Variable::new(name, Type::Unknown, bound_value, position.clone()))?;
        }
        // `break`/`continue` inside a match-arm block do not propagate
        // past the match expression; only `return` does, via EarlyReturn.
        let body_result = match body {
            MatchBody::Expr(e) => self.eval_expr(e, task),
            MatchBody::Block(b) => match self.exec_block(b, task) {
                Ok(super::control::ControlFlow::Return(v)) => Err(Unwind::EarlyReturn(v)),
                Ok(_) => Ok(Value::Void),
                Err(e) => Err(e),
            },
        };
        let scope = self.env.pop_scope().expect("scope pushed above");
        self.unwind_scope_now(&scope)?;
        body_result
    }

    fn eval_delete(&mut self, pointer: &Expr, task: TaskHandle, position: &Position) -> EvalResult<Value> {
        let value = self.eval_expr(pointer, task)?;
        let Value::Pointer(p) = value else {
            return Err(type_mismatch("pointer", &value, position));
        };
        match p.kind {
            PointerKind::Null => Err(CbError::NullDereference { position: Some(position.clone()) }.into()),
            PointerKind::Heap { handle, element_type, .. } => {
                let type_name = element_type.to_string();
                if self.has_destructor(&type_name) {
                    let values = self.env.heap.get(handle).map_err(Unwind::Error)?.values.clone();
                    for v in &values {
                        self.invoke_destructor(&type_name, v).map_err(Unwind::Error)?;
                    }
                }
                self.env.heap.free(handle).map_err(Unwind::Error)?;
                Ok(Value::Void)
            }
            _ => Err(CbError::TypeMismatch {
                expected: "heap pointer".to_owned(),
                found: "non-heap pointer".to_owned(),
                position: Some(position.clone()),
            }
            .into()),
        }
    }

    fn address_of(&mut self, lvalue: &LValue, task: TaskHandle) -> EvalResult<Pointer> {
        match lvalue {
            LValue::Ident(name) => {
                let var = self
                    .env
                    .find_variable(name)
                    .ok_or_else(|| CbError::UndefinedVariable { name: name.clone(), position: None })?;
                let mutability = if var.is_const { Mutability::Const } else { Mutability::Mut };
                Ok(Pointer { kind: PointerKind::Variable { name: name.clone() }, mutability })
            }
            LValue::Index { target, index } => {
                let LValue::Ident(array_name) = target.as_ref() else {
                    return Err(CbError::TypeMismatch {
                        expected: "addressable array variable".to_owned(),
                        found: "nested expression".to_owned(),
                        position: None,
                    }
                    .into());
                };
                let idx = self.eval_expr(index, task)?.as_int().unwrap_or(0);
                let var = self
                    .env
                    .find_variable(array_name)
                    .ok_or_else(|| CbError::UndefinedVariable { name: array_name.clone(), position: None })?;
                let Value::Array { element_type, .. } = &var.value else {
                    return Err(CbError::TypeMismatch {
                        expected: "array".to_owned(),
                        found: var.value.type_name().to_owned(),
                        position: None,
                    }
                    .into());
                };
                let mutability = if var.is_const { Mutability::Const } else { Mutability::Mut };
                Ok(Pointer {
                    kind: PointerKind::ArrayElement { array_name: array_name.clone(), index: idx, element_type: element_type.clone() },
                    mutability,
                })
            }
            LValue::Member { .. } => {
                let (root, path) = member_root_and_path(lvalue)?;
                let var = self
                    .env
                    .find_variable(&root)
                    .ok_or_else(|| CbError::UndefinedVariable { name: root.clone(), position: None })?;
                let mutability = if var.is_const { Mutability::Const } else { Mutability::Mut };
                Ok(Pointer { kind: PointerKind::StructMember { struct_name: root, path }, mutability })
            }
            LValue::Deref(_) => Err(CbError::TypeMismatch {
                expected: "addressable lvalue".to_owned(),
                found: "dereferenced expression".to_owned(),
                position: None,
            }
            .into()),
        }
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        type_args: &[Type],
        args: &[Expr],
        task: TaskHandle,
        position: &Position,
    ) -> EvalResult<Value> {
        let arg_values = args.iter().map(|a| self.eval_expr(a, task)).collect::<EvalResult<Vec<_>>>()?;
        match callee {
            Expr::Ident { name, .. } => self.eval_named_call(name, type_args, arg_values, task, position),
            Expr::QualifiedIdent { path, name, .. } => {
                let qualified = format!("{}::{}", path.join("::"), name);
                self.call_named_function(&qualified, type_args, arg_values, task, position)
            }
            other => {
                let callee_value = self.eval_expr(other, task)?;
                match callee_value {
                    Value::Function(f) => self.call_function_value(f, arg_values, task, position),
                    _ => Err(CbError::TypeMismatch {
                        expected: "callable".to_owned(),
                        found: callee_value.type_name().to_owned(),
                        position: Some(position.clone()),
                    }
                    .into()),
                }
            }
        }
    }

    fn eval_named_call(
        &mut self,
        name: &str,
        type_args: &[Type],
        args: Vec<Value>,
        task: TaskHandle,
        position: &Position,
    ) -> EvalResult<Value> {
        match name {
            "print" => {
                self.builtin_print(&args, false);
                return Ok(Value::Void);
            }
            "println" => {
                self.builtin_print(&args, true);
                return Ok(Value::Void);
            }
            "printf" => {
                self.builtin_printf(&args);
                return Ok(Value::Void);
            }
            _ => {}
        }
        if self.struct_decls.contains_key(name) {
            return self.construct(name, args, task);
        }
        if let Some(var) = self.env.find_variable(name) {
            if let Value::Function(f) = var.value.clone() {
                return self.call_function_value(f, args, task, position);
            }
        }
        self.call_named_function(name, type_args, args, task, position)
    }

    fn builtin_print(&mut self, args: &[Value], newline: bool) {
        let rendered: Vec<String> = args.iter().map(Value::format_default).collect();
        self.output.push_str(&rendered.join(" "));
        if newline {
            self.output.push('\n');
        }
    }

    fn builtin_printf(&mut self, args: &[Value]) {
        let Some((fmt, rest)) = args.split_first() else { return };
        let rendered = super::format::format_printf(&fmt.format_default(), rest);
        self.output.push_str(&rendered);
    }

    fn call_named_function(
        &mut self,
        name: &str,
        type_args: &[Type],
        args: Vec<Value>,
        task: TaskHandle,
        position: &Position,
    ) -> EvalResult<Value> {
        let base = self
            .env
            .lookup_function(name)
            .cloned()
            .ok_or_else(|| CbError::UndefinedFunction { name: name.to_owned(), position: Some(position.clone()) })?;
        let decl = self.instantiate_if_generic(&base, type_args, position)?;
        if decl.is_async {
            return Ok(self.spawn_async(decl, args, None));
        }
        let (value, _) = self.call_function(&decl, args, None, task)?;
        Ok(value)
    }

    fn call_function_value(
        &mut self,
        f: FunctionValue,
        args: Vec<Value>,
        task: TaskHandle,
        position: &Position,
    ) -> EvalResult<Value> {
        let decl = self
            .env
            .functions
            .get(&f.qualified_name)
            .cloned()
            .ok_or_else(|| CbError::UndefinedFunction { name: f.qualified_name.clone(), position: Some(position.clone()) })?;
        let bound_receiver = f.bound_receiver.map(|b| *b);
        if decl.is_async {
            return Ok(self.spawn_async(decl, args, bound_receiver));
        }
        let (value, _) = self.call_function(&decl, args, bound_receiver, task)?;
        Ok(value)
    }

    fn instantiate_if_generic(
        &mut self,
        base: &crate::ast::FunctionDecl,
        type_args: &[Type],
        position: &Position,
    ) -> EvalResult<crate::ast::FunctionDecl> {
        if type_args.is_empty() || base.type_params.is_empty() {
            return Ok(base.clone());
        }
        self.check_bound_conflicts(&base.type_params, position)?;
        let key = (base.name.clone(), type_args.to_vec());
        if let Some(GenericCacheEntry::Function(cached)) = self.env.generic_cache.get(&key) {
            return Ok(cached.clone());
        }
        let instantiated = instantiate_function(base, type_args);
        self.env.generic_cache.insert(key, GenericCacheEntry::Function(instantiated.clone()));
        Ok(instantiated)
    }

    /// Reject instantiating a type parameter whose interface bounds
    /// share a method name (spec §4.5): there would be no way to tell
    /// which bound's method a call through that parameter means.
    fn check_bound_conflicts(
        &self,
        type_params: &[crate::ast::TypeParamDecl],
        position: &Position,
    ) -> EvalResult<()> {
        for param in type_params {
            if param.bounds.len() < 2 {
                continue;
            }
            let bounds: Vec<(String, Vec<String>)> = param
                .bounds
                .iter()
                .map(|interface| {
                    let methods = self
                        .interface_decls
                        .get(interface)
                        .map(|decl| decl.methods.iter().map(|m| m.name.clone()).collect())
                        .unwrap_or_default();
                    (interface.clone(), methods)
                })
                .collect();
            if let Some(name) = conflicting_bound_methods(&bounds) {
                return Err(CbError::MethodNameConflict { name, position: Some(position.clone()) }.into());
            }
        }
        Ok(())
    }

    /// Evaluate a method-call receiver chain, threading the "root"
    /// lvalue (the original variable/member/index the chain bottoms
    /// out at) so a mutated `self` from each call is written back to
    /// it immediately — not just at the end — which is what makes
    /// `c.inc().inc().inc()` mutate `c` through every intermediate
    /// call (spec §4.5).
    fn eval_receiver(&mut self, expr: &Expr, task: TaskHandle) -> EvalResult<(Value, Option<LValue>)> {
        match expr {
            Expr::MethodCall { receiver, method, args, position, .. } => {
                let (recv_value, root) = self.eval_receiver(receiver, task)?;
                let type_name = value_type_name(&recv_value).ok_or_else(|| CbError::UndefinedMethod {
                    name: method.clone(),
                    type_name: recv_value.type_name().to_owned(),
                    position: Some(position.clone()),
                })?;
                let arg_values =
                    args.iter().map(|a| self.eval_expr(a, task)).collect::<EvalResult<Vec<_>>>()?;
                let (ret, final_self) = self.call_method(recv_value, &type_name, method, arg_values, task)?;
                if let (Some(final_self), Some(root_lvalue)) = (final_self, &root) {
                    self.assign_lvalue(root_lvalue, final_self, task)?;
                }
                Ok((ret, root))
            }
            _ => match expr_to_lvalue(expr) {
                Some(lvalue) => {
                    let value = self.read_lvalue(&lvalue, task)?;
                    Ok((value, Some(lvalue)))
                }
                None => Ok((self.eval_expr(expr, task)?, None)),
            },
        }
    }
}
