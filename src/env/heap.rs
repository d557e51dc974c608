use std::collections::HashMap;

use crate::diagnostics::{CbError, MemoryLeak};
use crate::types::Type;
use crate::value::{HeapHandle, Value};

#[derive(Debug, Clone)]
pub struct HeapSlot {
    pub element_type: Type,
    pub count: usize,
    pub values: Vec<Value>,
    pub freed: bool,
}

/// Tracks active `new`/`delete` allocations keyed by an opaque handle
/// (spec §3 Environment `heap`, §4.7 "Heap").
#[derive(Debug, Default)]
pub struct Heap {
    slots: HashMap<HeapHandle, HeapSlot>,
    next: u64,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, element_type: Type, values: Vec<Value>) -> HeapHandle {
        let handle = HeapHandle(self.next);
        self.next += 1;
        let count = values.len();
        self.slots.insert(handle, HeapSlot { element_type, count, values, freed: false });
        handle
    }

    pub fn get(&self, handle: HeapHandle) -> Result<&HeapSlot, CbError> {
        match self.slots.get(&handle) {
            Some(slot) if !slot.freed => Ok(slot),
            Some(_) => Err(CbError::UseAfterFree { position: None }),
            None => Err(CbError::UseAfterFree { position: None }),
        }
    }

    pub fn get_mut(&mut self, handle: HeapHandle) -> Result<&mut HeapSlot, CbError> {
        match self.slots.get_mut(&handle) {
            Some(slot) if !slot.freed => Ok(slot),
            Some(_) => Err(CbError::UseAfterFree { position: None }),
            None => Err(CbError::UseAfterFree { position: None }),
        }
    }

    /// `delete p`: mark the slot freed. Double-delete is detected via
    /// the freed flag (spec §3 invariant 7, §4.7).
    pub fn free(&mut self, handle: HeapHandle) -> Result<(), CbError> {
        match self.slots.get_mut(&handle) {
            Some(slot) if slot.freed => Err(CbError::DoubleDelete { position: None }),
            Some(slot) => {
                slot.freed = true;
                Ok(())
            }
            None => Err(CbError::DoubleDelete { position: None }),
        }
    }

    /// Diagnostics for every still-live allocation at program exit
    /// (spec §4.7: "Memory leaks... are reported as diagnostics, not
    /// as errors").
    pub fn leaks(&self) -> Vec<MemoryLeak> {
        self.slots
            .iter()
            .filter(|(_, slot)| !slot.freed)
            .map(|(handle, slot)| MemoryLeak {
                handle: handle.0,
                type_name: slot.element_type.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn double_delete_is_detected() {
        let mut heap = Heap::new();
        let handle = heap.allocate(Type::int(), vec![Value::Integer(0)]);
        heap.free(handle).unwrap();
        assert!(matches!(heap.free(handle), Err(CbError::DoubleDelete { .. })));
    }

    #[test]
    fn use_after_free_is_detected() {
        let mut heap = Heap::new();
        let handle = heap.allocate(Type::int(), vec![Value::Integer(0)]);
        heap.free(handle).unwrap();
        assert!(matches!(heap.get(handle), Err(CbError::UseAfterFree { .. })));
    }

    #[test]
    fn unfreed_allocation_is_a_leak() {
        let mut heap = Heap::new();
        heap.allocate(Type::int(), vec![Value::Integer(0)]);
        assert_eq!(heap.leaks().len(), 1);
    }
}
