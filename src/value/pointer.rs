use std::fmt::{self, Display};

use crate::types::Type;

/// A heap allocation handle (spec §3 Environment `heap`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeapHandle(pub u64);

/// A path of struct-member names from a struct root, used by
/// `StructMember` pointers (spec §4.2: "walks the recorded path from
/// the struct root on each access").
pub type MemberPath = Vec<String>;

/// The pointer payload (spec §3 "Pointer payload (provenance-carrying)").
///
/// Each case has distinct lifetime and validity rules (spec §9
/// "Pointer metadata deliberately separates..."), so dereference reads
/// a `var_ref`/`array_ref`/`struct_ref` by *name*, and the owning
/// [`crate::env::Environment`] resolves that name back to a live
/// binding on each access — this is what lets a `StructMember`
/// pointer's path "survive because struct internals are stable while
/// the owning scope is alive" (spec §4.2) without the pointer itself
/// borrowing anything.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerKind {
    Variable { name: String },
    ArrayElement { array_name: String, index: i64, element_type: Type },
    StructMember { struct_name: String, path: MemberPath },
    Heap { handle: HeapHandle, element_type: Type, count: usize },
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pointer {
    pub kind: PointerKind,
    pub mutability: crate::types::Mutability,
}

impl Pointer {
    pub fn null() -> Self {
        Self { kind: PointerKind::Null, mutability: crate::types::Mutability::Mut }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, PointerKind::Null)
    }

    /// Pointer arithmetic `p + n`: shifts an `ArrayElement` index by
    /// `n` element units (spec §4.2). Restricted to `Heap` and
    /// `ArrayElement` provenance per spec §3; anything else is a
    /// caller-side type error, not represented here.
    pub fn offset(&self, n: i64) -> Option<Pointer> {
        match &self.kind {
            PointerKind::ArrayElement { array_name, index, element_type } => Some(Pointer {
                kind: PointerKind::ArrayElement {
                    array_name: array_name.clone(),
                    index: index + n,
                    element_type: element_type.clone(),
                },
                mutability: self.mutability,
            }),
            PointerKind::Heap { handle, element_type, count } => Some(Pointer {
                kind: PointerKind::Heap {
                    handle: *handle,
                    element_type: element_type.clone(),
                    count: *count,
                },
                mutability: self.mutability,
            }),
            _ => None,
        }
    }
}

impl Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PointerKind::Variable { name } => write!(f, "&{name}"),
            PointerKind::ArrayElement { array_name, index, .. } => {
                write!(f, "&{array_name}[{index}]")
            }
            PointerKind::StructMember { struct_name, path } => {
                write!(f, "&{struct_name}.{}", path.join("."))
            }
            PointerKind::Heap { handle, .. } => write!(f, "<heap#{}>", handle.0),
            PointerKind::Null => write!(f, "null"),
        }
    }
}
