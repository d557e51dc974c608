//! The Pattern Matcher (spec §4.8, component C8).
//!
//! Arms are tried top-to-bottom; the first that matches wins (spec §8
//! "For any `match` arm order..."). A successful match yields the
//! bindings introduced in the arm's scope (empty for non-binding
//! patterns).
use crate::ast::{Expr, Pattern};
use crate::diagnostics::CbError;
use crate::value::{EnumValue, Value};

/// A literal pattern only ever carries a literal expression (spec
/// §4.8): pull its value out directly rather than invoking the full
/// evaluator, which keeps this module free of a dependency on
/// [`crate::eval`].
fn literal_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::IntLiteral { value, .. } => Some(Value::Integer(*value)),
        Expr::FloatLiteral { value, .. } => Some(Value::Float(*value)),
        Expr::BoolLiteral { value, .. } => Some(Value::Bool(*value)),
        Expr::CharLiteral { value, .. } => Some(Value::Char(*value)),
        Expr::StringLiteral { value, .. } => Some(Value::Str(value.clone())),
        Expr::Unary { op: crate::ast::UnaryOp::Neg, operand, .. } => match literal_value(operand)? {
            Value::Integer(i) => Some(Value::Integer(-i)),
            Value::Float(f) => Some(Value::Float(-f)),
            _ => None,
        },
        _ => None,
    }
}

/// `match` over a single pattern. Returns the bindings the arm's
/// scope should see on success.
pub fn match_pattern(pattern: &Pattern, value: &Value) -> Option<Vec<(String, Value)>> {
    match pattern {
        Pattern::Wildcard => Some(Vec::new()),
        Pattern::Variant(name) => match value {
            Value::Enum(EnumValue { variant, payload: None, .. }) if variant == name => {
                Some(Vec::new())
            }
            _ => None,
        },
        Pattern::VariantBind(name, binder) => match value {
            Value::Enum(EnumValue { variant, payload: Some(payload), .. }) if variant == name => {
                Some(vec![(binder.clone(), (**payload).clone())])
            }
            _ => None,
        },
        Pattern::Literal(expr) => {
            let lit = literal_value(expr)?;
            if values_equal(&lit, value) {
                Some(Vec::new())
            } else {
                None
            }
        }
        Pattern::Or(alts) => alts.iter().find_map(|alt| match_pattern(alt, value)),
        Pattern::Range(lo, hi) => match value.as_int() {
            Some(v) if v >= *lo && v <= *hi => Some(Vec::new()),
            _ => None,
        },
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        _ => false,
    }
}

/// Try every arm in order; `UnmatchedPattern` when none fire and the
/// match is not statically known to be exhaustive (spec §4.4, §8).
pub fn select_arm<'a, T>(
    arms: &'a [(Pattern, T)],
    value: &Value,
) -> Result<(&'a T, Vec<(String, Value)>), CbError> {
    for (pattern, body) in arms {
        if let Some(bindings) = match_pattern(pattern, value) {
            return Ok((body, bindings));
        }
    }
    Err(CbError::UnmatchedPattern { position: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Position;

    fn pos() -> Position {
        Position::new("t", 1, 1)
    }

    #[test]
    fn wildcard_always_matches() {
        assert!(match_pattern(&Pattern::Wildcard, &Value::Integer(5)).is_some());
    }

    #[test]
    fn variant_bind_extracts_payload() {
        let value = Value::Enum(EnumValue {
            enum_name: "Opt".to_owned(),
            variant: "Some".to_owned(),
            payload: Some(Box::new(Value::Integer(7))),
        });
        let bindings = match_pattern(&Pattern::VariantBind("Some".to_owned(), "x".to_owned()), &value)
            .unwrap();
        assert_eq!(bindings, vec![("x".to_owned(), Value::Integer(7))]);
    }

    #[test]
    fn none_variant_with_only_some_arm_is_unmatched() {
        let value = Value::Enum(EnumValue {
            enum_name: "Opt".to_owned(),
            variant: "None".to_owned(),
            payload: None,
        });
        let arms = vec![(Pattern::VariantBind("Some".to_owned(), "x".to_owned()), ())];
        let result = select_arm(&arms, &value);
        assert!(matches!(result, Err(CbError::UnmatchedPattern { .. })));
    }

    #[test]
    fn range_pattern_matches_inclusive_bounds() {
        assert!(match_pattern(&Pattern::Range(1, 10), &Value::Integer(10)).is_some());
        assert!(match_pattern(&Pattern::Range(1, 10), &Value::Integer(11)).is_none());
    }

    #[test]
    fn or_pattern_tries_each_alternative() {
        let pattern = Pattern::Or(vec![
            Pattern::Literal(Expr::IntLiteral { value: 1, position: pos() }),
            Pattern::Literal(Expr::IntLiteral { value: 2, position: pos() }),
        ]);
        assert!(match_pattern(&pattern, &Value::Integer(2)).is_some());
        assert!(match_pattern(&pattern, &Value::Integer(3)).is_none());
    }

    #[test]
    fn first_matching_arm_wins() {
        let arms = vec![
            (Pattern::Wildcard, "wildcard"),
            (Pattern::Literal(Expr::IntLiteral { value: 1, position: pos() }), "one"),
        ];
        let (result, _) = select_arm(&arms, &Value::Integer(1)).unwrap();
        assert_eq!(*result, "wildcard");
    }
}
