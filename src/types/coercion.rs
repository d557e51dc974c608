use crate::diagnostics::CbError;

use super::{FloatWidth, Type};

/// A permitted implicit conversion, per spec §4.1 `unify`: exact
/// match, integer-to-wider-integer of the same signedness, or
/// integer-literal-to-float. Nothing else implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Identity,
    WidenInt,
    IntLiteralToFloat,
}

/// `unify(expected, actual) -> Result<Coercion, TypeError>` (spec §4.1).
pub fn unify(expected: &Type, actual: &Type) -> Result<Coercion, CbError> {
    if expected.structurally_equals(actual) {
        return Ok(Coercion::Identity);
    }

    match (expected, actual) {
        (
            Type::Integer { width: ew, signed: es },
            Type::Integer { width: aw, signed: as_ },
        ) if es == as_ && aw.is_narrower_than(*ew) => Ok(Coercion::WidenInt),
        (Type::Float { .. }, Type::Integer { .. }) => Ok(Coercion::IntLiteralToFloat),
        (Type::Float { width: FloatWidth::Double }, Type::Float { width: FloatWidth::Single }) => {
            Ok(Coercion::WidenInt)
        }
        (Type::Reference { referent }, actual) if referent.structurally_equals(actual) => {
            Ok(Coercion::Identity)
        }
        _ => Err(CbError::TypeMismatch {
            expected: expected.to_string(),
            found: actual.to_string(),
            position: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntWidth;

    #[test]
    fn identical_types_unify() {
        assert_eq!(unify(&Type::int(), &Type::int()), Ok(Coercion::Identity));
    }

    #[test]
    fn narrower_signed_int_widens() {
        let short = Type::Integer { width: IntWidth::Short, signed: true };
        assert_eq!(unify(&Type::int(), &short), Ok(Coercion::WidenInt));
    }

    #[test]
    fn wider_int_does_not_narrow() {
        let short = Type::Integer { width: IntWidth::Short, signed: true };
        assert!(unify(&short, &Type::int()).is_err());
    }

    #[test]
    fn int_literal_widens_to_float() {
        let double = Type::Float { width: FloatWidth::Double };
        assert_eq!(unify(&double, &Type::int()), Ok(Coercion::IntLiteralToFloat));
    }

    #[test]
    fn string_and_int_never_unify() {
        assert!(unify(&Type::String, &Type::int()).is_err());
    }
}
