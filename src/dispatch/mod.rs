//! Dispatch & Generics (spec §4.5, component C5).
mod generics;
mod resolve;

pub use self::generics::{
    conflicting_bound_methods, instantiate_enum, instantiate_function, instantiate_struct,
    substitute_type,
};
pub use self::resolve::{resolve_method, ResolvedMethod};
