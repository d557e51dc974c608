//! Declared-type enforcement applied wherever a computed value is
//! committed into a typed slot: a `VarDecl` initializer (spec §4.4)
//! or a plain assignment (spec §4.4). Covers integer range
//! clamping/rejection, union membership, and implicit int-literal
//! widening (spec §4.1) in one place so both commit sites apply the
//! same rules.
use crate::diagnostics::{CbError, Position};
use crate::types::{check_range, stored_value, unify, AllowedAlternative, Coercion, Type};
use crate::value::Value;

use super::control::{EvalResult, Unwind};
use super::evaluator::Evaluator;
use super::expr::value_runtime_type;

impl Evaluator {
    /// Resolve `declared_type` to its concrete shape and enforce it
    /// against `value`, returning the value that should actually be
    /// stored (clamped, widened, or unchanged).
    pub(super) fn commit_for_type(
        &self,
        declared_type: &Type,
        value: Value,
        position: Option<&Position>,
    ) -> EvalResult<Value> {
        let resolved = self
            .env
            .type_registry
            .resolve_to_concrete(declared_type)
            .unwrap_or_else(|_| declared_type.clone());
        match &resolved {
            Type::Integer { width, signed } => match value {
                Value::Integer(n) => {
                    let outcome =
                        check_range(*width, *signed, n, &resolved.to_string(), position.cloned())?;
                    Ok(Value::Integer(stored_value(outcome)))
                }
                other => Ok(other),
            },
            Type::Float { .. } => match value {
                Value::Integer(n) => {
                    match unify(&resolved, &value_runtime_type(&Value::Integer(n))) {
                        Ok(Coercion::IntLiteralToFloat) => Ok(Value::Float(n as f64)),
                        _ => Ok(Value::Integer(n)),
                    }
                }
                other => Ok(other),
            },
            Type::Union { qualified_name, .. } => {
                if self.is_union_member(&resolved, &value) {
                    Ok(value)
                } else {
                    match &value {
                        Value::Integer(_) | Value::Str(_) | Value::Bool(_) | Value::Char(_) => {
                            Err(CbError::ValueNotAllowedForUnion {
                                union_name: qualified_name.clone(),
                                position: position.cloned(),
                            }
                            .into())
                        }
                        other => Err(CbError::TypeNotAllowedForUnion {
                            union_name: qualified_name.clone(),
                            type_name: other.type_name().to_owned(),
                            position: position.cloned(),
                        }
                        .into()),
                    }
                }
            }
            _ => Ok(value),
        }
    }

    /// `is_union_member(union_type, value)` (spec §4.1): does `value`
    /// satisfy one of `union_type`'s allowed alternatives. `false` for
    /// any non-`Type::Union`.
    pub(super) fn is_union_member(&self, union_type: &Type, value: &Value) -> bool {
        let Type::Union { allowed, .. } = union_type else {
            return false;
        };
        allowed.iter().any(|alt| self.alternative_matches(alt, value))
    }

    fn alternative_matches(&self, alt: &AllowedAlternative, value: &Value) -> bool {
        match alt {
            AllowedAlternative::IntLiteral(v) => matches!(value, Value::Integer(n) if n == v),
            AllowedAlternative::StringLiteral(s) => matches!(value, Value::Str(v) if v == s),
            AllowedAlternative::BoolLiteral(b) => matches!(value, Value::Bool(v) if v == b),
            AllowedAlternative::Type(ty) => self.value_matches_type(ty, value),
        }
    }

    fn value_matches_type(&self, ty: &Type, value: &Value) -> bool {
        let resolved = self.env.type_registry.resolve_to_concrete(ty).unwrap_or_else(|_| ty.clone());
        match (&resolved, value) {
            (Type::Integer { .. }, Value::Integer(_)) => true,
            (Type::Float { .. }, Value::Float(_) | Value::Integer(_)) => true,
            (Type::Bool, Value::Bool(_)) => true,
            (Type::Char, Value::Char(_)) => true,
            (Type::String, Value::Str(_)) => true,
            (Type::Struct { qualified_name, .. }, Value::Struct(s)) => qualified_name == &s.type_name,
            (Type::Enum { qualified_name, .. }, Value::Enum(e)) => qualified_name == &e.enum_name,
            (Type::Array { .. }, Value::Array { .. }) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AllowedAlternative, IntWidth};

    fn pos() -> Position {
        Position::new("t", 1, 1)
    }

    #[test]
    fn signed_overflow_is_rejected() {
        let eval = Evaluator::new();
        let ty = Type::Integer { width: IntWidth::Int, signed: true };
        let err = eval.commit_for_type(&ty, Value::Integer(i64::from(i32::MAX) + 1), Some(&pos()));
        assert!(matches!(err, Err(Unwind::Error(CbError::OutOfRange { .. }))));
    }

    #[test]
    fn unsigned_negative_clamps_to_zero() {
        let eval = Evaluator::new();
        let ty = Type::Integer { width: IntWidth::Tiny, signed: false };
        let stored = eval.commit_for_type(&ty, Value::Integer(-5), Some(&pos())).unwrap();
        assert_eq!(stored, Value::Integer(0));
    }

    #[test]
    fn int_literal_widens_into_declared_float() {
        let eval = Evaluator::new();
        let ty = Type::Float { width: crate::types::FloatWidth::Double };
        let stored = eval.commit_for_type(&ty, Value::Integer(5), Some(&pos())).unwrap();
        assert_eq!(stored, Value::Float(5.0));
    }

    #[test]
    fn union_rejects_a_value_outside_its_alternatives() {
        let mut eval = Evaluator::new();
        eval.env.type_registry.define(
            "Status",
            Type::Union {
                qualified_name: "Status".to_owned(),
                allowed: vec![
                    AllowedAlternative::IntLiteral(200),
                    AllowedAlternative::IntLiteral(404),
                ],
            },
        );
        let ty = Type::Named("Status".to_owned());
        let err = eval.commit_for_type(&ty, Value::Integer(500), Some(&pos()));
        assert!(matches!(err, Err(Unwind::Error(CbError::ValueNotAllowedForUnion { .. }))));
        let ok = eval.commit_for_type(&ty, Value::Integer(404), Some(&pos()));
        assert_eq!(ok.unwrap(), Value::Integer(404));
    }
}
