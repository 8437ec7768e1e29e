//! Constructor functions for the supported instruction set.
//!
//! Each function builds one [`crate::assembly::Instruction`] with its ECMA-335
//! encoding fixed up front: opcode byte, shortest applicable form, encoded size and
//! stack behavior. Offsets are left at zero; placing an instruction into a
//! [`crate::assembly::MethodBody`] and calling
//! [`crate::assembly::MethodBody::relayout`] assigns them.
//!
//! The set covers what woven bodies need: argument, local and constant loads,
//! the three binary arithmetic operations, stack housekeeping, calls and return.
//! Variable-index forms pick between the compressed encodings (`ldarg.0` through
//! `ldarg.3`), the short 8-bit forms (`ldarg.s`) and the `0xFE`-prefixed wide forms
//! automatically.

use crate::assembly::{FlowType, Immediate, Instruction, InstructionCategory, Operand, StackBehavior};
use crate::metadata::method::MethodRc;

/// Wide-form instruction prefix byte.
const PREFIX_WIDE: u8 = 0xFE;

const LDARG_SHORT: [&str; 4] = ["ldarg.0", "ldarg.1", "ldarg.2", "ldarg.3"];
const LDLOC_SHORT: [&str; 4] = ["ldloc.0", "ldloc.1", "ldloc.2", "ldloc.3"];
const STLOC_SHORT: [&str; 4] = ["stloc.0", "stloc.1", "stloc.2", "stloc.3"];
const LDC_I4_SHORT: [&str; 9] = [
    "ldc.i4.0", "ldc.i4.1", "ldc.i4.2", "ldc.i4.3", "ldc.i4.4", "ldc.i4.5", "ldc.i4.6", "ldc.i4.7",
    "ldc.i4.8",
];

fn simple(
    opcode: u8,
    mnemonic: &'static str,
    category: InstructionCategory,
    stack: StackBehavior,
) -> Instruction {
    Instruction {
        offset: 0,
        size: 1,
        opcode,
        prefix: 0,
        mnemonic,
        category,
        flow_type: FlowType::Sequential,
        operand: Operand::None,
        stack_behavior: stack,
    }
}

/// `nop` (0x00): does nothing.
#[must_use]
pub fn nop() -> Instruction {
    simple(0x00, "nop", InstructionCategory::Misc, StackBehavior::of(0, 0))
}

/// Loads argument `index` onto the stack.
///
/// Encodes as `ldarg.0`..`ldarg.3` (0x02..0x05), `ldarg.s` (0x0E) for 8-bit
/// indexes, or the wide `ldarg` (0xFE 0x09) beyond that.
#[must_use]
pub fn ldarg(index: u16) -> Instruction {
    let stack = StackBehavior::of(0, 1);
    if index <= 3 {
        let mut ins = simple(
            0x02 + index as u8,
            LDARG_SHORT[index as usize],
            InstructionCategory::LoadStore,
            stack,
        );
        ins.operand = Operand::Argument(index);
        return ins;
    }
    if index <= u16::from(u8::MAX) {
        return Instruction {
            offset: 0,
            size: 2,
            opcode: 0x0E,
            prefix: 0,
            mnemonic: "ldarg.s",
            category: InstructionCategory::LoadStore,
            flow_type: FlowType::Sequential,
            operand: Operand::Argument(index),
            stack_behavior: stack,
        };
    }
    Instruction {
        offset: 0,
        size: 4,
        opcode: 0x09,
        prefix: PREFIX_WIDE,
        mnemonic: "ldarg",
        category: InstructionCategory::LoadStore,
        flow_type: FlowType::Sequential,
        operand: Operand::Argument(index),
        stack_behavior: stack,
    }
}

/// Loads local variable `index` onto the stack.
#[must_use]
pub fn ldloc(index: u16) -> Instruction {
    let stack = StackBehavior::of(0, 1);
    if index <= 3 {
        let mut ins = simple(
            0x06 + index as u8,
            LDLOC_SHORT[index as usize],
            InstructionCategory::LoadStore,
            stack,
        );
        ins.operand = Operand::Local(index);
        return ins;
    }
    if index <= u16::from(u8::MAX) {
        return Instruction {
            offset: 0,
            size: 2,
            opcode: 0x11,
            prefix: 0,
            mnemonic: "ldloc.s",
            category: InstructionCategory::LoadStore,
            flow_type: FlowType::Sequential,
            operand: Operand::Local(index),
            stack_behavior: stack,
        };
    }
    Instruction {
        offset: 0,
        size: 4,
        opcode: 0x0C,
        prefix: PREFIX_WIDE,
        mnemonic: "ldloc",
        category: InstructionCategory::LoadStore,
        flow_type: FlowType::Sequential,
        operand: Operand::Local(index),
        stack_behavior: stack,
    }
}

/// Pops the stack top into local variable `index`.
#[must_use]
pub fn stloc(index: u16) -> Instruction {
    let stack = StackBehavior::of(1, 0);
    if index <= 3 {
        let mut ins = simple(
            0x0A + index as u8,
            STLOC_SHORT[index as usize],
            InstructionCategory::LoadStore,
            stack,
        );
        ins.operand = Operand::Local(index);
        return ins;
    }
    if index <= u16::from(u8::MAX) {
        return Instruction {
            offset: 0,
            size: 2,
            opcode: 0x13,
            prefix: 0,
            mnemonic: "stloc.s",
            category: InstructionCategory::LoadStore,
            flow_type: FlowType::Sequential,
            operand: Operand::Local(index),
            stack_behavior: stack,
        };
    }
    Instruction {
        offset: 0,
        size: 4,
        opcode: 0x0E,
        prefix: PREFIX_WIDE,
        mnemonic: "stloc",
        category: InstructionCategory::LoadStore,
        flow_type: FlowType::Sequential,
        operand: Operand::Local(index),
        stack_behavior: stack,
    }
}

/// Loads a 32-bit integer constant.
///
/// Picks `ldc.i4.m1` / `ldc.i4.0`..`ldc.i4.8` (0x15..0x1E), `ldc.i4.s` (0x1F)
/// for values in `i8` range, or the full `ldc.i4` (0x20).
#[must_use]
pub fn ldc_i4(value: i32) -> Instruction {
    let stack = StackBehavior::of(0, 1);
    if value == -1 {
        let mut ins = simple(0x15, "ldc.i4.m1", InstructionCategory::LoadStore, stack);
        ins.operand = Operand::Immediate(Immediate::Int8(-1));
        return ins;
    }
    if (0..=8).contains(&value) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (byte, short) = (value as u8, value as i8);
        let mut ins = simple(
            0x16 + byte,
            LDC_I4_SHORT[byte as usize],
            InstructionCategory::LoadStore,
            stack,
        );
        ins.operand = Operand::Immediate(Immediate::Int8(short));
        return ins;
    }
    if let Ok(short) = i8::try_from(value) {
        return Instruction {
            offset: 0,
            size: 2,
            opcode: 0x1F,
            prefix: 0,
            mnemonic: "ldc.i4.s",
            category: InstructionCategory::LoadStore,
            flow_type: FlowType::Sequential,
            operand: Operand::Immediate(Immediate::Int8(short)),
            stack_behavior: stack,
        };
    }
    Instruction {
        offset: 0,
        size: 5,
        opcode: 0x20,
        prefix: 0,
        mnemonic: "ldc.i4",
        category: InstructionCategory::LoadStore,
        flow_type: FlowType::Sequential,
        operand: Operand::Immediate(Immediate::Int32(value)),
        stack_behavior: stack,
    }
}

/// Loads a 64-bit integer constant (`ldc.i8`, 0x21).
#[must_use]
pub fn ldc_i8(value: i64) -> Instruction {
    Instruction {
        offset: 0,
        size: 9,
        opcode: 0x21,
        prefix: 0,
        mnemonic: "ldc.i8",
        category: InstructionCategory::LoadStore,
        flow_type: FlowType::Sequential,
        operand: Operand::Immediate(Immediate::Int64(value)),
        stack_behavior: StackBehavior::of(0, 1),
    }
}

/// Loads a 32-bit float constant (`ldc.r4`, 0x22).
#[must_use]
pub fn ldc_r4(value: f32) -> Instruction {
    Instruction {
        offset: 0,
        size: 5,
        opcode: 0x22,
        prefix: 0,
        mnemonic: "ldc.r4",
        category: InstructionCategory::LoadStore,
        flow_type: FlowType::Sequential,
        operand: Operand::Immediate(Immediate::Float32(value)),
        stack_behavior: StackBehavior::of(0, 1),
    }
}

/// Loads a 64-bit float constant (`ldc.r8`, 0x23).
#[must_use]
pub fn ldc_r8(value: f64) -> Instruction {
    Instruction {
        offset: 0,
        size: 9,
        opcode: 0x23,
        prefix: 0,
        mnemonic: "ldc.r8",
        category: InstructionCategory::LoadStore,
        flow_type: FlowType::Sequential,
        operand: Operand::Immediate(Immediate::Float64(value)),
        stack_behavior: StackBehavior::of(0, 1),
    }
}

/// `dup` (0x25): duplicates the stack top.
#[must_use]
pub fn dup() -> Instruction {
    simple(0x25, "dup", InstructionCategory::Misc, StackBehavior::of(1, 2))
}

/// `pop` (0x26): discards the stack top.
#[must_use]
pub fn pop() -> Instruction {
    simple(0x26, "pop", InstructionCategory::Misc, StackBehavior::of(1, 0))
}

/// `call` (0x28) to a resolved method.
///
/// Stack behavior is derived from the callee's signature: one pop per
/// parameter, one push when the callee produces a result.
#[must_use]
pub fn call(callee: &MethodRc) -> Instruction {
    #[allow(clippy::cast_possible_truncation)]
    let pops = callee.signature.params.len() as u8;
    let pushes = u8::from(callee.signature.returns.is_some());
    Instruction {
        offset: 0,
        size: 5,
        opcode: 0x28,
        prefix: 0,
        mnemonic: "call",
        category: InstructionCategory::ControlFlow,
        flow_type: FlowType::Call,
        operand: Operand::Method(callee.clone()),
        stack_behavior: StackBehavior::of(pops, pushes),
    }
}

/// `ret` (0x2A): returns from the current method.
#[must_use]
pub fn ret() -> Instruction {
    let mut ins = simple(0x2A, "ret", InstructionCategory::ControlFlow, StackBehavior::of(0, 0));
    ins.flow_type = FlowType::Return;
    ins
}

/// `add` (0x58): pops two values, pushes their sum.
#[must_use]
pub fn add() -> Instruction {
    simple(0x58, "add", InstructionCategory::Arithmetic, StackBehavior::of(2, 1))
}

/// `sub` (0x59): pops two values, pushes their difference.
#[must_use]
pub fn sub() -> Instruction {
    simple(0x59, "sub", InstructionCategory::Arithmetic, StackBehavior::of(2, 1))
}

/// `mul` (0x5A): pops two values, pushes their product.
#[must_use]
pub fn mul() -> Instruction {
    simple(0x5A, "mul", InstructionCategory::Arithmetic, StackBehavior::of(2, 1))
}
