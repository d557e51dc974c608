//! Reading and writing the assignable set from spec §4.4: variable,
//! array element, struct member, dereferenced pointer. Struct/array
//! writes go through whole-value read-modify-write rather than a
//! `&mut Value` chase, which keeps every case working uniformly off
//! [`crate::env::Environment::find_variable_mut`] without fighting the
//! borrow checker over nested paths.
use crate::ast::{Expr, LValue};
use crate::diagnostics::CbError;
use crate::scheduler::TaskHandle;
use crate::types::Mutability;
use crate::value::{Pointer, PointerKind, Value};

use super::control::EvalResult;
use super::evaluator::Evaluator;

/// Reinterpret an expression as an lvalue, when it denotes one. Used
/// so a method-call receiver can write a mutated `self` back to its
/// origin (spec §4.5: "self is bound... so mutation is visible to the
/// caller") and so compound assignment (`+=`) can read its own target.
pub fn expr_to_lvalue(expr: &Expr) -> Option<LValue> {
    match expr {
        Expr::Ident { name, .. } => Some(LValue::Ident(name.clone())),
        Expr::Member { target, field, .. } => {
            Some(LValue::Member { target: Box::new(expr_to_lvalue(target)?), field: field.clone() })
        }
        Expr::Index { target, index, .. } => Some(LValue::Index {
            target: Box::new(expr_to_lvalue(target)?),
            index: index.clone(),
        }),
        _ => None,
    }
}

impl Evaluator {
    pub(super) fn read_lvalue(&mut self, lvalue: &LValue, task: TaskHandle) -> EvalResult<Value> {
        match lvalue {
            LValue::Ident(name) => Ok(self
                .env
                .find_variable(name)
                .ok_or_else(|| CbError::UndefinedVariable { name: name.clone(), position: None })?
                .value
                .clone()),
            LValue::Member { target, field } => {
                let container = self.read_lvalue(target, task)?;
                match &container {
                    Value::Struct(s) => s.get(field).cloned().ok_or_else(|| {
                        CbError::TypeMismatch {
                            expected: format!("struct with member '{field}'"),
                            found: s.type_name.clone(),
                            position: None,
                        }
                        .into()
                    }),
                    other => Err(CbError::TypeMismatch {
                        expected: "struct".to_owned(),
                        found: other.type_name().to_owned(),
                        position: None,
                    }
                    .into()),
                }
            }
            LValue::Index { target, index } => {
                let container = self.read_lvalue(target, task)?;
                let idx = self.eval_expr(index, task)?.as_int().unwrap_or(0);
                match &container {
                    Value::Array { storage, .. } => {
                        if idx < 0 || idx as usize >= storage.len() {
                            return Err(CbError::ArrayIndexOutOfBounds {
                                index: idx,
                                length: storage.len(),
                                position: None,
                            }
                            .into());
                        }
                        Ok(storage.get(idx as usize).expect("bounds checked above"))
                    }
                    other => Err(CbError::TypeMismatch {
                        expected: "array".to_owned(),
                        found: other.type_name().to_owned(),
                        position: None,
                    }
                    .into()),
                }
            }
            LValue::Deref(expr) => {
                let value = self.eval_expr(expr, task)?;
                match value {
                    Value::Pointer(p) => self.deref_read(&p),
                    other => Err(CbError::TypeMismatch {
                        expected: "pointer".to_owned(),
                        found: other.type_name().to_owned(),
                        position: None,
                    }
                    .into()),
                }
            }
        }
    }

    pub(super) fn assign_lvalue(
        &mut self,
        lvalue: &LValue,
        value: Value,
        task: TaskHandle,
    ) -> EvalResult<()> {
        match lvalue {
            LValue::Ident(name) => {
                let declared_type = self
                    .env
                    .find_variable(name)
                    .ok_or_else(|| CbError::UndefinedVariable { name: name.clone(), position: None })?
                    .declared_type
                    .clone();
                let value = self.commit_for_type(&declared_type, value, None)?;
                let var = self
                    .env
                    .find_variable_mut(name)
                    .ok_or_else(|| CbError::UndefinedVariable { name: name.clone(), position: None })?;
                if var.is_const && var.is_assigned {
                    return Err(CbError::ConstReassignment { name: name.clone(), position: None }.into());
                }
                var.value = value;
                var.is_assigned = true;
                Ok(())
            }
            LValue::Member { target, field } => {
                let mut container = self.read_lvalue(target, task)?;
                match &mut container {
                    Value::Struct(s) => {
                        if !s.set(field, value) {
                            return Err(CbError::TypeMismatch {
                                expected: format!("struct with member '{field}'"),
                                found: s.type_name.clone(),
                                position: None,
                            }
                            .into());
                        }
                    }
                    other => {
                        return Err(CbError::TypeMismatch {
                            expected: "struct".to_owned(),
                            found: other.type_name().to_owned(),
                            position: None,
                        }
                        .into())
                    }
                }
                self.assign_lvalue(target, container, task)
            }
            LValue::Index { target, index } => {
                let mut container = self.read_lvalue(target, task)?;
                let idx = self.eval_expr(index, task)?.as_int().unwrap_or(0);
                match &mut container {
                    Value::Array { storage, .. } => {
                        if idx < 0 || idx as usize >= storage.len() {
                            return Err(CbError::ArrayIndexOutOfBounds {
                                index: idx,
                                length: storage.len(),
                                position: None,
                            }
                            .into());
                        }
                        if !storage.set(idx as usize, value) {
                            return Err(CbError::TypeMismatch {
                                expected: "matching element type".to_owned(),
                                found: "mismatched element".to_owned(),
                                position: None,
                            }
                            .into());
                        }
                    }
                    other => {
                        return Err(CbError::TypeMismatch {
                            expected: "array".to_owned(),
                            found: other.type_name().to_owned(),
                            position: None,
                        }
                        .into())
                    }
                }
                self.assign_lvalue(target, container, task)
            }
            LValue::Deref(expr) => {
                let pointer = self.eval_expr(expr, task)?;
                match pointer {
                    Value::Pointer(p) => self.deref_write(&p, value),
                    other => Err(CbError::TypeMismatch {
                        expected: "pointer".to_owned(),
                        found: other.type_name().to_owned(),
                        position: None,
                    }
                    .into()),
                }
            }
        }
    }

    /// Dereference a pointer for a read (spec §4.2). Bounds/liveness
    /// are checked before the backing-store access is dispatched
    /// (SPEC_FULL §C), and `Null` is reported distinctly from an
    /// internal inconsistency.
    pub(super) fn deref_read(&self, pointer: &Pointer) -> EvalResult<Value> {
        match &pointer.kind {
            PointerKind::Null => Err(CbError::NullDereference { position: None }.into()),
            PointerKind::Variable { name } => Ok(self
                .env
                .find_variable(name)
                .ok_or_else(|| CbError::UndefinedVariable { name: name.clone(), position: None })?
                .value
                .clone()),
            PointerKind::ArrayElement { array_name, index, .. } => {
                let var = self.env.find_variable(array_name).ok_or_else(|| {
                    CbError::UndefinedVariable { name: array_name.clone(), position: None }
                })?;
                match &var.value {
                    Value::Array { storage, .. } => {
                        if *index < 0 || *index as usize >= storage.len() {
                            return Err(CbError::ArrayIndexOutOfBounds {
                                index: *index,
                                length: storage.len(),
                                position: None,
                            }
                            .into());
                        }
                        Ok(storage.get(*index as usize).expect("bounds checked above"))
                    }
                    other => Err(CbError::TypeMismatch {
                        expected: "array".to_owned(),
                        found: other.type_name().to_owned(),
                        position: None,
                    }
                    .into()),
                }
            }
            PointerKind::StructMember { struct_name, path } => {
                let var = self.env.find_variable(struct_name).ok_or_else(|| {
                    CbError::UndefinedVariable { name: struct_name.clone(), position: None }
                })?;
                walk_struct_path(&var.value, path)
            }
            // `PointerKind::Heap` carries no running offset (only
            // `ArrayElement` does), so a heap pointer always derefs its
            // slot's first element, mirroring `Pointer::offset`'s Heap
            // arm, which likewise does not advance an index.
            PointerKind::Heap { handle, .. } => {
                let slot = self.env.heap.get(*handle)?;
                slot.values.first().cloned().ok_or_else(|| {
                    CbError::ArrayIndexOutOfBounds { index: 0, length: slot.values.len(), position: None }
                        .into()
                })
            }
        }
    }

    /// Dereference a pointer for a write (spec §4.2, §4.4).
    pub(super) fn deref_write(&mut self, pointer: &Pointer, value: Value) -> EvalResult<()> {
        if pointer.mutability == Mutability::Const {
            return Err(CbError::WriteThroughConstPointer { position: None }.into());
        }
        match &pointer.kind {
            PointerKind::Null => Err(CbError::NullDereference { position: None }.into()),
            PointerKind::Variable { name } => {
                let var = self
                    .env
                    .find_variable_mut(name)
                    .ok_or_else(|| CbError::UndefinedVariable { name: name.clone(), position: None })?;
                if var.is_const {
                    return Err(CbError::ConstReassignment { name: name.clone(), position: None }.into());
                }
                var.value = value;
                Ok(())
            }
            PointerKind::ArrayElement { array_name, index, .. } => {
                let index = *index;
                let array_name = array_name.clone();
                let var = self.env.find_variable_mut(&array_name).ok_or_else(|| {
                    CbError::UndefinedVariable { name: array_name.clone(), position: None }
                })?;
                if var.is_const {
                    return Err(CbError::ConstArrayWrite { position: None }.into());
                }
                match &mut var.value {
                    Value::Array { storage, .. } => {
                        if index < 0 || index as usize >= storage.len() {
                            return Err(CbError::ArrayIndexOutOfBounds {
                                index,
                                length: storage.len(),
                                position: None,
                            }
                            .into());
                        }
                        if !storage.set(index as usize, value) {
                            return Err(CbError::TypeMismatch {
                                expected: "matching element type".to_owned(),
                                found: "mismatched element".to_owned(),
                                position: None,
                            }
                            .into());
                        }
                        Ok(())
                    }
                    other => Err(CbError::TypeMismatch {
                        expected: "array".to_owned(),
                        found: other.type_name().to_owned(),
                        position: None,
                    }
                    .into()),
                }
            }
            PointerKind::StructMember { struct_name, path } => {
                let struct_name = struct_name.clone();
                let path = path.clone();
                let var = self.env.find_variable_mut(&struct_name).ok_or_else(|| {
                    CbError::UndefinedVariable { name: struct_name.clone(), position: None }
                })?;
                write_struct_path(&mut var.value, &path, value)
            }
            PointerKind::Heap { handle, .. } => {
                let slot = self.env.heap.get_mut(*handle)?;
                if slot.values.is_empty() {
                    return Err(
                        CbError::ArrayIndexOutOfBounds { index: 0, length: 0, position: None }.into()
                    );
                }
                slot.values[0] = value;
                Ok(())
            }
        }
    }
}

fn walk_struct_path(root: &Value, path: &[String]) -> EvalResult<Value> {
    let mut current = root.clone();
    for field in path {
        match &current {
            Value::Struct(s) => {
                current = s.get(field).cloned().ok_or_else(|| CbError::TypeMismatch {
                    expected: format!("struct with member '{field}'"),
                    found: s.type_name.clone(),
                    position: None,
                })?;
            }
            other => {
                return Err(CbError::TypeMismatch {
                    expected: "struct".to_owned(),
                    found: other.type_name().to_owned(),
                    position: None,
                }
                .into())
            }
        }
    }
    Ok(current)
}

fn write_struct_path(root: &mut Value, path: &[String], value: Value) -> EvalResult<()> {
    match path.split_first() {
        None => {
            *root = value;
            Ok(())
        }
        Some((field, rest)) => match root {
            Value::Struct(s) => {
                let current = s
                    .members
                    .iter_mut()
                    .find(|(n, _)| n == field)
                    .map(|(_, v)| v)
                    .ok_or_else(|| CbError::TypeMismatch {
                        expected: format!("struct with member '{field}'"),
                        found: s.type_name.clone(),
                        position: None,
                    })?;
                write_struct_path(current, rest, value)
            }
            other => Err(CbError::TypeMismatch {
                expected: "struct".to_owned(),
                found: other.type_name().to_owned(),
                position: None,
            }
            .into()),
        },
    }
}
