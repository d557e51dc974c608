//! The Type System (spec §4.1, component C1).
//!
//! `Type` is the tagged descriptor from spec §3. Resolution,
//! unification, range checking and inference live here; the registry
//! that stores typedefs/structs/enums/etc. by name is
//! [`crate::env::Environment`]'s `type_registry`, which calls back
//! into [`resolve`].
mod coercion;
mod registry;

pub use self::coercion::{unify, Coercion};
pub use self::registry::TypeRegistry;

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use crate::diagnostics::{CbError, Position};

/// Width of a sized integer, named the way spec.md names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum IntWidth {
    Tiny,  // 8
    Short, // 16
    Int,   // 32
    Long,  // 64
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::Tiny => 8,
            IntWidth::Short => 16,
            IntWidth::Int => 32,
            IntWidth::Long => 64,
        }
    }

    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    /// `(lo, hi)` for a signed integer of this width.
    pub fn signed_range(self) -> (i64, i64) {
        match self {
            IntWidth::Tiny => (i8::MIN as i64, i8::MAX as i64),
            IntWidth::Short => (i16::MIN as i64, i16::MAX as i64),
            IntWidth::Int => (i32::MIN as i64, i32::MAX as i64),
            IntWidth::Long => (i64::MIN, i64::MAX),
        }
    }

    /// Inclusive upper bound for an unsigned integer of this width.
    pub fn unsigned_max(self) -> u64 {
        match self {
            IntWidth::Tiny => u8::MAX as u64,
            IntWidth::Short => u16::MAX as u64,
            IntWidth::Int => u32::MAX as u64,
            IntWidth::Long => u64::MAX,
        }
    }

    /// Widening order used by [`unify`]: wider widths accept narrower
    /// literals of the same signedness.
    pub fn is_narrower_than(self, other: IntWidth) -> bool {
        self.bits() < other.bits()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum FloatWidth {
    Single, // 32, "float"
    Double, // 64, "double"
}

/// An array dimension: either a fixed extent known at declaration, or
/// one inferred from an initializer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Extent {
    Fixed(usize),
    Inferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Mutability {
    Const,
    Mut,
}

/// A named alternative a [`Type::Union`] accepts: a concrete literal
/// value, a base type, a typedef, a struct, or an array shape (spec §3).
#[derive(Debug, Clone, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AllowedAlternative {
    IntLiteral(i64),
    StringLiteral(String),
    BoolLiteral(bool),
    Type(Box<Type>),
}

impl Eq for AllowedAlternative {}

/// The tagged type descriptor from spec §3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Type {
    Integer { width: IntWidth, signed: bool },
    Float { width: FloatWidth },
    Bool,
    Char,
    String,
    Void,
    Unknown,
    Array { element: Box<Type>, dimensions: Vec<Extent> },
    Pointer { pointee: Box<Type>, mutability: Mutability },
    Reference { referent: Box<Type> },
    Struct { qualified_name: String, members: Vec<(String, Type, Option<String>)> },
    Enum { qualified_name: String, variants: Vec<(String, Option<Type>)> },
    Union { qualified_name: String, allowed: Vec<AllowedAlternative> },
    Interface { name: String, methods: Vec<FunctionSignature> },
    Function(FunctionSignature),
    Generic { base: String, type_args: Vec<Type> },
    TypeParam { name: String, bounds: Vec<String> },
    Future { inner: Box<Type> },
    /// A named reference to a typedef/struct/enum/union/interface that
    /// has not yet been resolved against the registry. Distinguished
    /// from `Unknown` (which means "no static type could be inferred")
    /// so `resolve` can tell "look this up" from "give up".
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FunctionSignature {
    pub params: Vec<(String, Type, Option<bool>)>,
    pub varargs: bool,
    pub return_type: Box<Type>,
    pub is_async: bool,
}

impl Type {
    pub fn int() -> Type {
        Type::Integer { width: IntWidth::Int, signed: true }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer { .. } | Type::Float { .. })
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer { .. })
    }

    /// Structural equality for non-nominal types, nominal (by
    /// qualified name) for struct/enum/union/interface, per spec §3
    /// "A type equality relation".
    pub fn structurally_equals(&self, other: &Type) -> bool {
        use Type::*;
        match (self, other) {
            (Struct { qualified_name: a, .. }, Struct { qualified_name: b, .. }) => a == b,
            (Enum { qualified_name: a, .. }, Enum { qualified_name: b, .. }) => a == b,
            (Union { qualified_name: a, .. }, Union { qualified_name: b, .. }) => a == b,
            (Interface { name: a, .. }, Interface { name: b, .. }) => a == b,
            (Integer { width: w1, signed: s1 }, Integer { width: w2, signed: s2 }) => {
                w1 == w2 && s1 == s2
            }
            (Float { width: a }, Float { width: b }) => a == b,
            (Bool, Bool) | (Char, Char) | (String, String) | (Void, Void) | (Unknown, Unknown) => {
                true
            }
            (Array { element: e1, dimensions: d1 }, Array { element: e2, dimensions: d2 }) => {
                e1.structurally_equals(e2) && d1 == d2
            }
            (Pointer { pointee: p1, .. }, Pointer { pointee: p2, .. }) => {
                p1.structurally_equals(p2)
            }
            (Reference { referent: r1 }, Reference { referent: r2 }) => {
                r1.structurally_equals(r2)
            }
            (Future { inner: a }, Future { inner: b }) => a.structurally_equals(b),
            (Generic { base: b1, type_args: a1 }, Generic { base: b2, type_args: a2 }) => {
                b1 == b2
                    && a1.len() == a2.len()
                    && a1.iter().zip(a2).all(|(x, y)| x.structurally_equals(y))
            }
            (Named(a), Named(b)) => a == b,
            _ => false,
        }
    }

    /// Size in bytes, computed recursively per spec §4.4/§8: the sum
    /// of member sizes for a struct with no padding directive, and
    /// `n * sizeof(element)` for a fixed-size array. `None` if the
    /// size is not statically known (an inferred-extent array, a
    /// generic parameter, etc).
    pub fn size_of(&self) -> Option<usize> {
        match self {
            Type::Integer { width, .. } => Some(width.bytes()),
            Type::Float { width: FloatWidth::Single } => Some(4),
            Type::Float { width: FloatWidth::Double } => Some(8),
            Type::Bool | Type::Char => Some(1),
            Type::Pointer { .. } | Type::Reference { .. } => Some(8),
            Type::Struct { members, .. } => {
                let mut total = 0;
                for (_, member_ty, _) in members {
                    total += member_ty.size_of()?;
                }
                Some(total)
            }
            Type::Array { element, dimensions } => {
                let mut count = 1usize;
                for dim in dimensions {
                    match dim {
                        Extent::Fixed(n) => count *= n,
                        Extent::Inferred => return None,
                    }
                }
                Some(count * element.size_of()?)
            }
            _ => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer { width, signed } => {
                let name = match width {
                    IntWidth::Tiny => "tiny",
                    IntWidth::Short => "short",
                    IntWidth::Int => "int",
                    IntWidth::Long => "long",
                };
                if *signed {
                    write!(f, "{name}")
                } else {
                    write!(f, "u{name}")
                }
            }
            Type::Float { width: FloatWidth::Single } => write!(f, "float"),
            Type::Float { width: FloatWidth::Double } => write!(f, "double"),
            Type::Bool => write!(f, "bool"),
            Type::Char => write!(f, "char"),
            Type::String => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Unknown => write!(f, "unknown"),
            Type::Array { element, dimensions } => {
                write!(f, "{element}")?;
                for dim in dimensions {
                    match dim {
                        Extent::Fixed(n) => write!(f, "[{n}]")?,
                        Extent::Inferred => write!(f, "[]")?,
                    }
                }
                Ok(())
            }
            Type::Pointer { pointee, mutability } => match mutability {
                Mutability::Const => write!(f, "const {pointee}*"),
                Mutability::Mut => write!(f, "{pointee}*"),
            },
            Type::Reference { referent } => write!(f, "&{referent}"),
            Type::Struct { qualified_name, .. } => write!(f, "{qualified_name}"),
            Type::Enum { qualified_name, .. } => write!(f, "{qualified_name}"),
            Type::Union { qualified_name, .. } => write!(f, "{qualified_name}"),
            Type::Interface { name, .. } => write!(f, "{name}"),
            Type::Function(sig) => {
                write!(f, "fn(")?;
                for (i, (_, ty, _)) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, ") -> {}", sig.return_type)
            }
            Type::Generic { base, type_args } => {
                write!(f, "{base}<")?;
                for (i, arg) in type_args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            Type::TypeParam { name, .. } => write!(f, "{name}"),
            Type::Future { inner } => write!(f, "Future<{inner}>"),
            Type::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Result of range-checking an integer literal/expression against a
/// sized integer type (spec §4.1 `check_range`, §8 quantified
/// invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RangeOutcome {
    /// Value fits as-is.
    Fits(i64),
    /// Unsigned clamp of a negative value to zero.
    ClampedToZero,
}

/// `check_range(type, value)` from spec §4.1.
pub fn check_range(
    width: IntWidth,
    signed: bool,
    value: i64,
    type_name: &str,
    position: Option<Position>,
) -> Result<RangeOutcome, CbError> {
    if signed {
        let (lo, hi) = width.signed_range();
        if value < lo || value > hi {
            return Err(CbError::OutOfRange { type_name: type_name.to_owned(), value, position });
        }
        Ok(RangeOutcome::Fits(value))
    } else if value < 0 {
        Ok(RangeOutcome::ClampedToZero)
    } else {
        let max = width.unsigned_max();
        if value as u64 > max {
            return Err(CbError::OutOfRange { type_name: type_name.to_owned(), value, position });
        }
        Ok(RangeOutcome::Fits(value))
    }
}

/// Apply the stored representation of [`check_range`]'s outcome: the
/// clamp-to-zero case stores `0`, matching spec §8 "`-5` assigned to
/// an unsigned 8-bit is stored as `0`".
pub fn stored_value(outcome: RangeOutcome) -> i64 {
    match outcome {
        RangeOutcome::Fits(v) => v,
        RangeOutcome::ClampedToZero => 0,
    }
}

pub type MemberList = Vec<(String, Type, Option<String>)>;
pub type TypedefMap = BTreeMap<String, Type>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_out_of_range_is_an_error() {
        let err = check_range(IntWidth::Int, true, i64::from(i32::MAX) + 1, "int", None);
        assert!(matches!(err, Err(CbError::OutOfRange { .. })));
    }

    #[test]
    fn unsigned_negative_clamps_to_zero() {
        let outcome = check_range(IntWidth::Tiny, false, -5, "utiny", None).unwrap();
        assert_eq!(outcome, RangeOutcome::ClampedToZero);
        assert_eq!(stored_value(outcome), 0);
    }

    #[test]
    fn unsigned_over_max_is_an_error() {
        let err = check_range(IntWidth::Tiny, false, 1000, "utiny", None);
        assert!(matches!(err, Err(CbError::OutOfRange { .. })));
    }

    #[test]
    fn struct_size_sums_members() {
        let ty = Type::Struct {
            qualified_name: "Point".to_owned(),
            members: vec![
                ("x".to_owned(), Type::int(), None),
                ("y".to_owned(), Type::int(), None),
            ],
        };
        assert_eq!(ty.size_of(), Some(8));
    }

    #[test]
    fn fixed_array_size_multiplies_extent() {
        let ty = Type::Array {
            element: Box::new(Type::int()),
            dimensions: vec![Extent::Fixed(10)],
        };
        assert_eq!(ty.size_of(), Some(40));
    }

    #[test]
    fn inferred_array_size_is_unknown() {
        let ty = Type::Array { element: Box::new(Type::int()), dimensions: vec![Extent::Inferred] };
        assert_eq!(ty.size_of(), None);
    }
}
