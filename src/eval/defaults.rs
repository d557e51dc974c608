//! Synthesizing default values for bare `T x;` declarations, struct
//! members with no initializer, and constructor-less `T(args)` (spec
//! §4.4 "default-initialize"/§4.7 constructors).
use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::EnumDecl;
use crate::diagnostics::CbError;
use crate::scheduler::TaskHandle;
use crate::types::{Type, TypeRegistry};
use crate::value::{ArrayStorage, EnumValue, FutureValue, StructValue, Value};

use super::control::EvalResult;
use super::evaluator::Evaluator;

pub(super) fn array_storage_from(values: &[Value]) -> ArrayStorage {
    if !values.is_empty() && values.iter().all(|v| matches!(v, Value::Integer(_))) {
        ArrayStorage::Int(values.iter().filter_map(Value::as_int).collect())
    } else if !values.is_empty() && values.iter().all(|v| matches!(v, Value::Float(_))) {
        ArrayStorage::Float(values.iter().filter_map(Value::as_float).collect())
    } else {
        ArrayStorage::Values(values.to_vec())
    }
}

impl Evaluator {
    pub(super) fn default_value(&mut self, ty: &Type) -> EvalResult<Value> {
        match ty {
            Type::Integer { .. } => Ok(Value::Integer(0)),
            Type::Float { .. } => Ok(Value::Float(0.0)),
            Type::Bool => Ok(Value::Bool(false)),
            Type::Char => Ok(Value::Char('\0')),
            Type::String => Ok(Value::Str(String::new())),
            Type::Void | Type::Unknown => Ok(Value::Void),
            Type::Array { element, dimensions } => {
                let count = TypeRegistry::array_extent_count(dimensions).unwrap_or(0);
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(self.default_value(element)?);
                }
                let storage = array_storage_from(&values);
                Ok(Value::Array { element_type: (**element).clone(), storage })
            }
            Type::Pointer { .. } | Type::Reference { .. } => {
                Ok(Value::Pointer(crate::value::Pointer::null()))
            }
            Type::Named(name) => {
                if self.struct_decls.contains_key(name) {
                    self.default_struct_value(name)
                } else if let Some(decl) = self.enum_decls.get(name).cloned() {
                    self.default_enum_value(&decl)
                } else {
                    let resolved = self.env.type_registry.resolve(name)?;
                    self.default_value(&resolved)
                }
            }
            Type::Struct { qualified_name, .. } => self.default_struct_value(qualified_name),
            Type::Enum { qualified_name, .. } => {
                let decl = self
                    .enum_decls
                    .get(qualified_name)
                    .cloned()
                    .ok_or_else(|| CbError::UnknownType { name: qualified_name.clone(), position: None })?;
                self.default_enum_value(&decl)
            }
            Type::Future { inner } => {
                let value = self.default_value(inner)?;
                let handle = self.scheduler.spawn();
                self.scheduler.resolve(handle, value);
                Ok(Value::Future(FutureValue { task: handle, slot: Rc::new(RefCell::new(None)) }))
            }
            Type::Union { .. } | Type::Interface { .. } | Type::Function(_) | Type::Generic { .. }
            | Type::TypeParam { .. } => Ok(Value::Void),
        }
    }

    pub(super) fn default_struct_value(&mut self, type_name: &str) -> EvalResult<Value> {
        let decl = self
            .struct_decls
            .get(type_name)
            .cloned()
            .ok_or_else(|| CbError::UnknownType { name: type_name.to_owned(), position: None })?;
        let task = self.current_task.unwrap_or(TaskHandle(u64::MAX));
        let mut members = Vec::with_capacity(decl.members.len());
        for member in &decl.members {
            let value = match &member.default {
                Some(expr) => self.eval_expr(expr, task)?,
                None => self.default_value(&member.type_annotation)?,
            };
            members.push((member.name.clone(), value));
        }
        Ok(Value::Struct(StructValue { type_name: type_name.to_owned(), members }))
    }

    fn default_enum_value(&mut self, decl: &EnumDecl) -> EvalResult<Value> {
        let (name, payload_ty, _) = decl
            .variants
            .first()
            .cloned()
            .ok_or_else(|| CbError::UnknownType { name: decl.name.clone(), position: None })?;
        let payload = match payload_ty {
            Some(ty) => Some(Box::new(self.default_value(&ty)?)),
            None => None,
        };
        Ok(Value::Enum(EnumValue { enum_name: decl.name.clone(), variant: name, payload }))
    }
}
