//! Editable method bodies.
//!
//! A [`crate::assembly::MethodBody`] is the unit the weaver rewrites: header flags,
//! local variable flavors, a maximum stack depth and a flat instruction buffer.
//! Instructions are addressed purely by index; after any splice the buffer's IL
//! offsets are recomputed with [`crate::assembly::MethodBody::relayout`] so every
//! instruction's `offset` reflects the encoded sizes of everything before it.

use bitflags::bitflags;

use crate::assembly::Instruction;
use crate::metadata::typesystem::CilFlavor;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Flags that a method body can have
    pub struct BodyFlags: u16 {
        /// Tiny method header format
        const TINY_FORMAT = 0x2;
        /// Fat method header format
        const FAT_FORMAT = 0x3;
        /// Flag of the fat method header, showing that there are more data sections appended to the header
        const MORE_SECTS = 0x8;
        /// Flag to indicate that this method should call the default constructor on all local variables
        const INIT_LOCALS = 0x10;
    }
}

/// Default maximum evaluation stack depth for freshly built bodies.
pub const DEFAULT_MAX_STACK: u16 = 8;

/// One method's editable code: header flags, locals and the instruction buffer.
///
/// Bodies constructed here default to the fat header format with
/// locals-initialization enabled, which is what compiled managed code carries.
/// The weaver edits the `instructions` buffer by index and relayouts offsets
/// afterwards; `max_stack` is never touched by splicing because insert-before
/// and insert-after splices are stack-neutral and replacements preserve the
/// replaced call's stack shape.
#[derive(Debug, Clone)]
pub struct MethodBody {
    /// Header flags
    pub flags: BodyFlags,
    /// Maximum evaluation stack depth
    pub max_stack: u16,
    /// Flavor of each local variable slot
    pub locals: Vec<CilFlavor>,
    /// The instruction buffer, in execution order
    pub instructions: Vec<Instruction>,
}

impl MethodBody {
    /// Creates an empty body with default flags and stack depth.
    #[must_use]
    pub fn new() -> Self {
        MethodBody {
            flags: BodyFlags::FAT_FORMAT | BodyFlags::INIT_LOCALS,
            max_stack: DEFAULT_MAX_STACK,
            locals: Vec::new(),
            instructions: Vec::new(),
        }
    }

    /// Sets the local variable slots.
    #[must_use]
    pub fn with_locals(mut self, locals: Vec<CilFlavor>) -> Self {
        self.locals = locals;
        self
    }

    /// Replaces the header flags.
    #[must_use]
    pub fn with_flags(mut self, flags: BodyFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the maximum evaluation stack depth.
    #[must_use]
    pub fn with_max_stack(mut self, max_stack: u16) -> Self {
        self.max_stack = max_stack;
        self
    }

    /// Appends an instruction to the buffer.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// True when locals are zero-initialized before the body runs.
    #[must_use]
    pub fn init_locals(&self) -> bool {
        self.flags.contains(BodyFlags::INIT_LOCALS)
    }

    /// Total encoded size of the instruction buffer in bytes.
    #[must_use]
    pub fn code_size(&self) -> u64 {
        self.instructions.iter().map(|i| i.size).sum()
    }

    /// Recomputes every instruction's IL offset from the sizes before it.
    ///
    /// Must run after any splice so rendered offsets stay consistent with the
    /// buffer. Idempotent on an unchanged buffer.
    pub fn relayout(&mut self) {
        let mut offset = 0u64;
        for instruction in &mut self.instructions {
            instruction.offset = offset;
            offset += instruction.size;
        }
    }
}

impl Default for MethodBody {
    fn default() -> Self {
        Self::new()
    }
}
