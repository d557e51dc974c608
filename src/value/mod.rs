//! The Value Model (spec §4.2, component C2).
//!
//! Values are value-semantic: assignment copies, except for explicit
//! pointer/reference operations (spec §4.2). Strings are immutable
//! except for bounds-checked `s[i]` assignment on a string *variable*
//! (never on a literal).
mod pointer;

pub use self::pointer::{HeapHandle, Pointer, PointerKind};

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::rc::Rc;
use std::cell::RefCell;

use crate::scheduler::TaskHandle;
use crate::types::Type;

/// An array's homogeneous backing store, matched to its element type
/// (spec §3: "integer payload... floats and integers use separate
/// backing stores within arrays").
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayStorage {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Values(Vec<Value>),
}

impl ArrayStorage {
    pub fn len(&self) -> usize {
        match self {
            ArrayStorage::Int(v) => v.len(),
            ArrayStorage::Float(v) => v.len(),
            ArrayStorage::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            ArrayStorage::Int(v) => v.get(index).map(|i| Value::Integer(*i)),
            ArrayStorage::Float(v) => v.get(index).map(|f| Value::Float(*f)),
            ArrayStorage::Values(v) => v.get(index).cloned(),
        }
    }

    pub fn set(&mut self, index: usize, value: Value) -> bool {
        match (self, value) {
            (ArrayStorage::Int(v), Value::Integer(i)) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = i;
                    true
                } else {
                    false
                }
            }
            (ArrayStorage::Float(v), Value::Float(f)) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = f;
                    true
                } else {
                    false
                }
            }
            (ArrayStorage::Values(v), value) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = value;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }
}

/// A struct instance: an ordered map of member name -> `Value`, so
/// declaration order (and thus destructor order, spec §4.7) survives.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub type_name: String,
    pub members: Vec<(String, Value)>,
}

impl StructValue {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: &str, value: Value) -> bool {
        if let Some(entry) = self.members.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub enum_name: String,
    pub variant: String,
    pub payload: Option<Box<Value>>,
}

/// A function value: either a plain function reference, or a method
/// bound to a receiver (spec §3 "function payload... plus, for
/// methods, a bound receiver").
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    pub qualified_name: String,
    pub bound_receiver: Option<Box<Value>>,
}

/// A `Future<T>`: a task handle plus a resolved-value slot (spec §3,
/// §4.6). Shared (`Rc<RefCell<_>>`) because the same future may be
/// copied into multiple variables and they must observe the same
/// resolution (spec open question: "a Future is a handle").
#[derive(Debug, Clone)]
pub struct FutureValue {
    pub task: TaskHandle,
    pub slot: Rc<RefCell<Option<Value>>>,
}

impl PartialEq for FutureValue {
    fn eq(&self, other: &Self) -> bool {
        self.task == other.task
    }
}

impl FutureValue {
    pub fn is_ready(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub fn value(&self) -> Option<Value> {
        self.slot.borrow().clone()
    }

    pub fn resolve(&self, value: Value) {
        let mut slot = self.slot.borrow_mut();
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

/// The polymorphic runtime value (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    Bool(bool),
    Char(char),
    Integer(i64),
    Float(f64),
    Str(String),
    Array { element_type: Type, storage: ArrayStorage },
    Struct(StructValue),
    Enum(EnumValue),
    Pointer(Pointer),
    Function(FunctionValue),
    Future(FutureValue),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array { .. } => "array",
            Value::Struct(_) => "struct",
            Value::Enum(_) => "enum",
            Value::Pointer(_) => "pointer",
            Value::Function(_) => "function",
            Value::Future(_) => "future",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Char(c) => Some(*c as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Stringify using the standard formatter (spec §4.4 string
    /// interpolation, §6 `print`/`println`).
    pub fn format_default(&self) -> String {
        format!("{self}")
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array { storage, .. } => {
                write!(f, "[")?;
                for i in 0..storage.len() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(v) = storage.get(i) {
                        write!(f, "{v}")?;
                    }
                }
                write!(f, "]")
            }
            Value::Struct(s) => {
                write!(f, "{} {{ ", s.type_name)?;
                for (i, (name, value)) in s.members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, " }}")
            }
            Value::Enum(e) => match &e.payload {
                Some(payload) => write!(f, "{}({})", e.variant, payload),
                None => write!(f, "{}", e.variant),
            },
            Value::Pointer(p) => write!(f, "{p}"),
            Value::Function(func) => write!(f, "<fn {}>", func.qualified_name),
            Value::Future(future) => write!(f, "<future {:?}>", future.task),
        }
    }
}

pub type MemberMap = BTreeMap<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_storage_get_set_round_trips() {
        let mut storage = ArrayStorage::Int(vec![1, 2, 3]);
        assert!(storage.set(1, Value::Integer(42)));
        assert_eq!(storage.get(1), Some(Value::Integer(42)));
    }

    #[test]
    fn struct_value_get_set() {
        let mut s = StructValue {
            type_name: "Point".to_owned(),
            members: vec![("x".to_owned(), Value::Integer(1)), ("y".to_owned(), Value::Integer(2))],
        };
        assert!(s.set("y", Value::Integer(9)));
        assert_eq!(s.get("y"), Some(&Value::Integer(9)));
        assert!(!s.set("z", Value::Integer(0)));
    }

    #[test]
    fn enum_display_with_payload() {
        let v = Value::Enum(EnumValue {
            enum_name: "Opt".to_owned(),
            variant: "Some".to_owned(),
            payload: Some(Box::new(Value::Integer(7))),
        });
        assert_eq!(v.to_string(), "Some(7)");
    }
}
