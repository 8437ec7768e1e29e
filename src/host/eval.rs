//! Linear evaluation of IL bodies.
//!
//! The supported instruction set has no branches, so evaluation is a single
//! left-to-right walk over the buffer with an operand stack and a local slot
//! array. Nested `call` instructions re-enter the host's invoke pipeline (so
//! callee hooks fire) with the call depth threaded through for the recursion
//! guard. Locals honor the body's locals-initialization flag: initialized
//! bodies read zeros, uninitialized ones fail on a read-before-store.

use crate::{
    assembly::{Immediate, Instruction, MethodBody, Operand},
    host::{runtime::HostRuntime, Value},
    Error, Result,
};

fn arg_index(instruction: &Instruction) -> Result<usize> {
    match &instruction.operand {
        Operand::Argument(index) => Ok(usize::from(*index)),
        _ => Err(Error::Error(format!(
            "malformed operand for {}",
            instruction.mnemonic
        ))),
    }
}

fn local_index(instruction: &Instruction) -> Result<u16> {
    match &instruction.operand {
        Operand::Local(index) => Ok(*index),
        _ => Err(Error::Error(format!(
            "malformed operand for {}",
            instruction.mnemonic
        ))),
    }
}

fn constant(instruction: &Instruction) -> Result<Value> {
    match &instruction.operand {
        Operand::Immediate(Immediate::Int8(v)) => Ok(Value::I32(i32::from(*v))),
        Operand::Immediate(Immediate::UInt8(v)) => Ok(Value::I32(i32::from(*v))),
        Operand::Immediate(Immediate::Int32(v)) => Ok(Value::I32(*v)),
        Operand::Immediate(Immediate::Int64(v)) => Ok(Value::I64(*v)),
        Operand::Immediate(Immediate::Float32(v)) => Ok(Value::F32(*v)),
        Operand::Immediate(Immediate::Float64(v)) => Ok(Value::F64(*v)),
        _ => Err(Error::Error(format!(
            "malformed operand for {}",
            instruction.mnemonic
        ))),
    }
}

fn arithmetic(mnemonic: &str, lhs: Value, rhs: Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::I32(a), Value::I32(b)) => Ok(Value::I32(match mnemonic {
            "add" => a.wrapping_add(b),
            "sub" => a.wrapping_sub(b),
            _ => a.wrapping_mul(b),
        })),
        (Value::I64(a), Value::I64(b)) => Ok(Value::I64(match mnemonic {
            "add" => a.wrapping_add(b),
            "sub" => a.wrapping_sub(b),
            _ => a.wrapping_mul(b),
        })),
        (Value::F32(a), Value::F32(b)) => Ok(Value::F32(match mnemonic {
            "add" => a + b,
            "sub" => a - b,
            _ => a * b,
        })),
        (Value::F64(a), Value::F64(b)) => Ok(Value::F64(match mnemonic {
            "add" => a + b,
            "sub" => a - b,
            _ => a * b,
        })),
        (a, b) => Err(Error::Error(format!(
            "invalid operands for {}: {} and {}",
            mnemonic,
            a.flavor(),
            b.flavor()
        ))),
    }
}

/// Runs `body` against `args`, returning the value `ret` leaves behind.
pub(crate) fn execute(
    host: &HostRuntime,
    body: &MethodBody,
    args: &[Value],
    depth: usize,
) -> Result<Option<Value>> {
    let mut stack: Vec<Value> = Vec::with_capacity(usize::from(body.max_stack));
    let mut locals: Vec<Option<Value>> = if body.init_locals() {
        body.locals.iter().map(|f| Some(Value::zero_of(*f))).collect()
    } else {
        vec![None; body.locals.len()]
    };

    for instruction in &body.instructions {
        match instruction.mnemonic {
            "nop" => {}
            m if m.starts_with("ldarg") => {
                let index = arg_index(instruction)?;
                let value = args.get(index).copied().ok_or_else(|| {
                    Error::Error(format!("argument index {index} out of range"))
                })?;
                stack.push(value);
            }
            m if m.starts_with("ldloc") => {
                let index = local_index(instruction)?;
                let slot = locals
                    .get(usize::from(index))
                    .ok_or_else(|| Error::Error(format!("local index {index} out of range")))?;
                match slot {
                    Some(value) => stack.push(*value),
                    None => return Err(Error::UninitializedLocal(index)),
                }
            }
            m if m.starts_with("stloc") => {
                let index = local_index(instruction)?;
                let value = stack.pop().ok_or(Error::StackUnderflow)?;
                let slot = locals
                    .get_mut(usize::from(index))
                    .ok_or_else(|| Error::Error(format!("local index {index} out of range")))?;
                *slot = Some(value);
            }
            m if m.starts_with("ldc") => {
                stack.push(constant(instruction)?);
            }
            "dup" => {
                let top = *stack.last().ok_or(Error::StackUnderflow)?;
                stack.push(top);
            }
            "pop" => {
                stack.pop().ok_or(Error::StackUnderflow)?;
            }
            "add" | "sub" | "mul" => {
                let rhs = stack.pop().ok_or(Error::StackUnderflow)?;
                let lhs = stack.pop().ok_or(Error::StackUnderflow)?;
                stack.push(arithmetic(instruction.mnemonic, lhs, rhs)?);
            }
            "call" => {
                let Operand::Method(callee) = &instruction.operand else {
                    return Err(Error::Error("call without a resolved callee".to_string()));
                };
                let arity = callee.signature.params.len();
                if stack.len() < arity {
                    return Err(Error::StackUnderflow);
                }
                let call_args = stack.split_off(stack.len() - arity);
                let result = host.invoke_at_depth(callee.token, &call_args, depth + 1)?;
                if let Some(flavor) = callee.signature.returns {
                    stack.push(result.unwrap_or_else(|| Value::zero_of(flavor)));
                }
            }
            "ret" => {
                return Ok(stack.pop());
            }
            other => {
                return Err(Error::Error(format!("unsupported instruction {other}")));
            }
        }
    }

    Ok(stack.pop())
}
