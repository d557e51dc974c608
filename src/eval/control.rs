use crate::diagnostics::CbError;
use crate::value::Value;

/// What a statement did, beyond its side effects: normal completion,
/// or one of the three ways a block unwinds early (spec §4.4 "control
/// flow unwinding").
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// The error type used throughout statement/expression evaluation.
/// `?` (spec §4.4 "the try operator") has to return early from the
/// *enclosing function*, not just the current Rust call — an ordinary
/// `Result<Value, CbError>` can't express that in the middle of
/// expression evaluation, so this adds a second, non-error variant
/// that the nearest [`super::call::Evaluator::call_function`] boundary
/// catches and turns into that function's return value. A real error
/// still flows through as `Unwind::Error` via `?`'s own `From` impl.
#[derive(Debug, Clone)]
pub enum Unwind {
    Error(CbError),
    EarlyReturn(Value),
}

impl From<CbError> for Unwind {
    fn from(err: CbError) -> Self {
        Unwind::Error(err)
    }
}

pub type EvalResult<T> = Result<T, Unwind>;
