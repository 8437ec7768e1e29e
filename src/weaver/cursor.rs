//! Index-addressed cursor over an instruction buffer.
//!
//! All weaver edits go through [`CodeCursor`]: find the next matching call
//! from a given index, insert before or after an index, replace at an index.
//! Addressing by index keeps the buffer a plain `Vec` with no aliasing between
//! scan state and edits; the engine owns every index it hands back in.

use crate::{
    assembly::Instruction,
    patch::CallSiteSelector,
};

/// Mutable cursor over a method's instruction buffer.
pub struct CodeCursor<'a> {
    instructions: &'a mut Vec<Instruction>,
}

impl<'a> CodeCursor<'a> {
    /// Wraps an instruction buffer for index-addressed editing.
    pub fn new(instructions: &'a mut Vec<Instruction>) -> Self {
        CodeCursor { instructions }
    }

    /// Number of instructions in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// `true` when the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Borrows the instruction at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Index of the first call at or after `from` whose callee matches
    /// `selector`, scanning left to right.
    #[must_use]
    pub fn find_next_call(&self, from: usize, selector: &CallSiteSelector) -> Option<usize> {
        self.instructions
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, instruction)| {
                instruction
                    .callee()
                    .is_some_and(|callee| selector.matches(callee))
            })
            .map(|(at, _)| at)
    }

    /// Splices `instruction` in directly before `index`.
    pub fn insert_before(&mut self, index: usize, instruction: Instruction) {
        self.instructions.insert(index, instruction);
    }

    /// Splices `instruction` in directly after `index`.
    pub fn insert_after(&mut self, index: usize, instruction: Instruction) {
        self.instructions.insert(index + 1, instruction);
    }

    /// Replaces the instruction at `index`, returning the replaced one.
    pub fn replace(&mut self, index: usize, instruction: Instruction) -> Instruction {
        std::mem::replace(&mut self.instructions[index], instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::opcodes;
    use crate::test::{create_void_method, create_callable};

    fn call_pair_buffer() -> Vec<Instruction> {
        let nothin = create_void_method(3, "Helper", "Nothin");
        let other = create_void_method(4, "Other", "Nothin");
        vec![
            opcodes::nop(),
            opcodes::call(&nothin),
            opcodes::call(&other),
            opcodes::call(&nothin),
            opcodes::ret(),
        ]
    }

    #[test]
    fn test_find_next_call_honors_owner() {
        let mut buffer = call_pair_buffer();
        let cursor = CodeCursor::new(&mut buffer);

        let selector = CallSiteSelector::parse("Helper.Nothin");
        assert_eq!(cursor.find_next_call(0, &selector), Some(1));
        assert_eq!(cursor.find_next_call(2, &selector), Some(3));
        assert_eq!(cursor.find_next_call(4, &selector), None);
    }

    #[test]
    fn test_find_next_call_name_only() {
        let mut buffer = call_pair_buffer();
        let cursor = CodeCursor::new(&mut buffer);

        let selector = CallSiteSelector::parse("Nothin");
        assert_eq!(cursor.find_next_call(2, &selector), Some(2));
    }

    #[test]
    fn test_insert_before_shifts_right() {
        let mut buffer = call_pair_buffer();
        let mut cursor = CodeCursor::new(&mut buffer);
        let patch = create_callable(90, "Observe");

        cursor.insert_before(1, opcodes::call(&patch.method));
        assert_eq!(cursor.len(), 6);
        assert_eq!(cursor.get(1).and_then(Instruction::callee).map(|m| m.name.clone()),
            Some("Observe".to_string()));
        assert_eq!(cursor.get(2).and_then(Instruction::callee).map(|m| m.name.clone()),
            Some("Nothin".to_string()));
    }

    #[test]
    fn test_insert_after_lands_past_index() {
        let mut buffer = call_pair_buffer();
        let mut cursor = CodeCursor::new(&mut buffer);
        let patch = create_callable(90, "Tail");

        cursor.insert_after(1, opcodes::call(&patch.method));
        assert_eq!(cursor.get(2).and_then(Instruction::callee).map(|m| m.name.clone()),
            Some("Tail".to_string()));
    }

    #[test]
    fn test_replace_swaps_in_place() {
        let mut buffer = call_pair_buffer();
        let mut cursor = CodeCursor::new(&mut buffer);
        let patch = create_callable(90, "Instead");

        let replaced = cursor.replace(1, opcodes::call(&patch.method));
        assert_eq!(cursor.len(), 5);
        assert_eq!(replaced.callee().map(|m| m.name.clone()), Some("Nothin".to_string()));
        assert_eq!(cursor.get(1).and_then(Instruction::callee).map(|m| m.name.clone()),
            Some("Instead".to_string()));
    }
}
