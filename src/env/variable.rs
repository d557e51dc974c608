use crate::diagnostics::Position;
use crate::types::Type;
use crate::value::Value;

/// A symbol-table entry (spec §3 "Variable").
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub declared_type: Type,
    pub value: Value,
    pub is_const: bool,
    pub is_static: bool,
    pub is_assigned: bool,
    pub scope_depth: usize,
    pub position: Position,
    /// Set when this variable's declared type has a destructor
    /// (`impl T { ~T() { ... } }`) — consulted by the Lifetime Manager
    /// (spec §4.7) so scope exit only walks destructible bindings.
    pub has_destructor: bool,
}

impl Variable {
    pub fn new(
        name: impl Into<String>,
        declared_type: Type,
        value: Value,
        position: Position,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type,
            value,
            is_const: false,
            is_static: false,
            is_assigned: true,
            scope_depth: 0,
            position,
            has_destructor: false,
        }
    }
}
