//! Instruction and method body representation.
//!
//! This module contains the editable code layer: typed instructions with their
//! ECMA-335 encodings, constructor functions for the supported instruction set, and
//! the flat method body buffer the call-site weaver splices. Nothing here decodes
//! raw bytes; bodies are built in memory and edited by index.
//!
//! # Key Components
//!
//! - [`Instruction`] - One instruction with operand, size and stack metadata
//! - [`opcodes`] - Constructor functions fixing encodings at construction
//! - [`MethodBody`] - Header flags, locals and the instruction buffer
//!
//! # Examples
//!
//! ```rust
//! use cilweave::assembly::{opcodes, MethodBody};
//!
//! let mut body = MethodBody::new();
//! body.push(opcodes::ldarg(0));
//! body.push(opcodes::ldarg(1));
//! body.push(opcodes::add());
//! body.push(opcodes::ret());
//! body.relayout();
//! assert_eq!(body.code_size(), 4);
//! ```

/// Implementation of editable method bodies
pub mod body;
/// Implementation of the instruction representation
pub mod instruction;
/// Constructor functions for the supported instruction set
pub mod opcodes;

pub use body::{BodyFlags, MethodBody, DEFAULT_MAX_STACK};
pub use instruction::{
    FlowType, Immediate, Instruction, InstructionCategory, Operand, StackBehavior,
};
