//! CIL instruction representation and analysis metadata.
//!
//! This module defines the type system for representing instructions inside a method
//! body the weaver can edit. It provides strongly-typed representations for operands,
//! stack effects and control flow behavior, which the call-site instrumentation engine
//! relies on when it scans for matching calls and validates that a planned splice
//! leaves the operand stack intact.
//!
//! # Architecture
//!
//! The module is organized around the central [`crate::assembly::Instruction`] struct,
//! which aggregates all information about one instruction. Instructions are built
//! through the constructor functions in [`crate::assembly::opcodes`], which fix the
//! opcode byte, mnemonic, size and stack behavior at construction; the weaver never
//! mutates an instruction in place, it only inserts and replaces whole instructions
//! inside a body's buffer.
//!
//! # Key Components
//!
//! - [`crate::assembly::Instruction`] - Complete instruction representation
//! - [`crate::assembly::Operand`] - Type-safe operand representation
//! - [`crate::assembly::Immediate`] - Immediate value types
//! - [`crate::assembly::FlowType`] - Control flow behavior classification
//! - [`crate::assembly::StackBehavior`] - Stack effect metadata
//!
//! # Usage Examples
//!
//! ```rust
//! use cilweave::assembly::opcodes;
//! use cilweave::metadata::{method::{Method, MethodSignature}, token::Token};
//!
//! let callee = Method::new(Token::method(7), "Helper", "Nothin", MethodSignature::nullary());
//! let call = opcodes::call(&callee);
//! assert!(call.is_call());
//! assert_eq!(call.stack_behavior.net_effect, 0);
//! ```

use std::fmt;

use crate::metadata::method::MethodRc;

/// Represents an immediate value embedded in an instruction.
///
/// Immediate values are constants encoded directly in the instruction stream.
/// The variants cover the encodings the constructor functions emit: short-form
/// loads, the 8-bit index forms and the full-width constant loads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    /// Signed 8-bit immediate value (`ldc.i4.s`)
    Int8(i8),
    /// Unsigned 8-bit immediate value (short-form variable indexes)
    UInt8(u8),
    /// Signed 32-bit immediate value (`ldc.i4`)
    Int32(i32),
    /// Signed 64-bit immediate value (`ldc.i8`)
    Int64(i64),
    /// 32-bit floating point immediate value (`ldc.r4`)
    Float32(f32),
    /// 64-bit floating point immediate value (`ldc.r8`)
    Float64(f64),
}

impl Immediate {
    /// Returns the encoded size of this immediate in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        match self {
            Immediate::Int8(_) | Immediate::UInt8(_) => 1,
            Immediate::Int32(_) | Immediate::Float32(_) => 4,
            Immediate::Int64(_) | Immediate::Float64(_) => 8,
        }
    }
}

/// Represents an instruction operand in a structured way.
///
/// Operands are resolved at construction: a call carries the full callee
/// handle rather than a bare token, so the weaver can match selectors against
/// owner and member names and check signatures without a separate lookup.
#[derive(Debug, Clone)]
pub enum Operand {
    /// No operand present
    None,
    /// Immediate value (constant embedded in instruction)
    Immediate(Immediate),
    /// Resolved callee of a call instruction
    Method(MethodRc),
    /// Local variable index
    Local(u16),
    /// Method argument index
    Argument(u16),
}

impl Operand {
    /// Returns a formatted string representation of the operand.
    ///
    /// Returns `None` for [`Operand::None`] and a short rendered form for all
    /// other operand types, suitable for tracing output.
    #[must_use]
    pub fn as_string(&self) -> Option<String> {
        match self {
            Operand::None => None,
            Operand::Immediate(imm) => Some(format!("{imm:?}")),
            Operand::Method(method) => Some(method.full_name()),
            Operand::Local(l) => Some(format!("V_{l}")),
            Operand::Argument(a) => Some(format!("A_{a}")),
        }
    }
}

/// How an instruction affects control flow.
///
/// The weaver's instruction subset is branch-free; the classification it needs
/// is whether execution falls through, transfers into another method, or
/// leaves the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Normal execution continues to next instruction
    Sequential,
    /// Call to another method
    Call,
    /// Returns from current method
    Return,
}

/// Stack effect of an instruction.
///
/// Describes how an instruction modifies the evaluation stack. The weaver uses
/// this to prove that insert-before and insert-after splices are neutral and
/// that a redirect replacement consumes and produces exactly what the replaced
/// call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackBehavior {
    /// Number of items popped from stack
    pub pops: u8,
    /// Number of items pushed to stack
    pub pushes: u8,
    /// Net effect on stack depth (pushes - pops)
    pub net_effect: i8,
}

impl StackBehavior {
    /// Builds a stack behavior from pop and push counts.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn of(pops: u8, pushes: u8) -> Self {
        StackBehavior {
            pops,
            pushes,
            net_effect: pushes as i8 - pops as i8,
        }
    }

    /// True when the instruction leaves stack depth unchanged through zero traffic.
    #[must_use]
    pub const fn is_neutral(&self) -> bool {
        self.pops == 0 && self.pushes == 0
    }
}

/// Categorization of instructions by their primary function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionCategory {
    /// Arithmetic operations (add, sub, mul)
    Arithmetic,
    /// Control flow operations (call, ret)
    ControlFlow,
    /// Load and store operations (ldarg, ldloc, stloc, ldc)
    LoadStore,
    /// Miscellaneous operations (nop, dup, pop)
    Misc,
}

/// One instruction inside an editable method body.
///
/// Aggregates location, identity, operand and analysis metadata. The `offset`
/// field is the instruction's IL offset within its body and is recomputed by
/// [`crate::assembly::MethodBody::relayout`] whenever the weaver splices the
/// buffer, so offsets stay consistent with the sizes of everything before them.
#[derive(Clone)]
pub struct Instruction {
    /// IL offset of this instruction within its method body
    pub offset: u64,
    /// Size of this instruction in bytes
    pub size: u64,
    /// Primary opcode byte
    pub opcode: u8,
    /// Prefix byte (0 if no prefix)
    pub prefix: u8,
    /// Human-readable instruction mnemonic (e.g., "add", "ldloc.s", "ret")
    pub mnemonic: &'static str,
    /// Functional categorization of this instruction
    pub category: InstructionCategory,
    /// How this instruction affects control flow
    pub flow_type: FlowType,
    /// The operand data for this instruction
    pub operand: Operand,
    /// How this instruction affects the evaluation stack
    pub stack_behavior: StackBehavior,
}

impl Instruction {
    /// Check if this instruction is a call.
    #[must_use]
    pub fn is_call(&self) -> bool {
        self.flow_type == FlowType::Call
    }

    /// Returns the resolved callee when this instruction is a call.
    #[must_use]
    pub fn callee(&self) -> Option<&MethodRc> {
        match &self.operand {
            Operand::Method(method) if self.is_call() => Some(method),
            _ => None,
        }
    }

    /// Check if this instruction ends the method (a `ret`).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.flow_type == FlowType::Return
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand.as_string() {
            Some(operand) => write!(f, "IL_{:04x}: {} {}", self.offset, self.mnemonic, operand),
            None => write!(f, "IL_{:04x}: {}", self.offset, self.mnemonic),
        }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instruction")
            .field("offset", &self.offset)
            .field("mnemonic", &self.mnemonic)
            .field("operand", &self.operand)
            .field("stack_behavior", &self.stack_behavior)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::opcodes;
    use crate::metadata::{
        method::{Method, MethodSignature},
        token::Token,
        typesystem::CilFlavor,
    };

    #[test]
    fn test_immediate_sizes() {
        assert_eq!(Immediate::Int8(-1).size(), 1);
        assert_eq!(Immediate::UInt8(4).size(), 1);
        assert_eq!(Immediate::Int32(1000).size(), 4);
        assert_eq!(Immediate::Float32(1.0).size(), 4);
        assert_eq!(Immediate::Int64(1).size(), 8);
        assert_eq!(Immediate::Float64(1.0).size(), 8);
    }

    #[test]
    fn test_stack_behavior_of() {
        let add = StackBehavior::of(2, 1);
        assert_eq!(add.net_effect, -1);
        assert!(!add.is_neutral());
        assert!(StackBehavior::of(0, 0).is_neutral());
    }

    #[test]
    fn test_call_accessors() {
        let callee = Method::new(
            Token::method(3),
            "Helper",
            "Double",
            MethodSignature::returning(vec![CilFlavor::I4], CilFlavor::I4),
        );
        let call = opcodes::call(&callee);
        assert!(call.is_call());
        assert!(!call.is_terminal());
        assert_eq!(call.callee().map(|m| m.token), Some(Token::method(3)));

        let ret = opcodes::ret();
        assert!(ret.is_terminal());
        assert!(ret.callee().is_none());
    }

    #[test]
    fn test_display_rendering() {
        let nop = opcodes::nop();
        assert_eq!(format!("{}", nop), "IL_0000: nop");

        let callee = Method::new(Token::method(3), "Helper", "Nothin", MethodSignature::nullary());
        let mut call = opcodes::call(&callee);
        call.offset = 0x2A;
        assert_eq!(format!("{}", call), "IL_002a: call Helper.Nothin");
    }
}
