//! # cilweave Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the cilweave library. Import this module to get quick access to the essential
//! types for declaring and applying method patches.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cilweave operations
pub use crate::Error;

/// The result type used throughout cilweave
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Pass orchestrator: groups, resolves conflicts, installs, weaves, reports
pub use crate::session::{PassResult, PatchSession, PatchStatus, TargetOutcome};

/// Conflict handling between patches that share a target
pub use crate::conflict::ConflictPolicy;

// ================================================================================================
// Patch Declarations
// ================================================================================================

/// Descriptor building blocks for declaring patches
pub use crate::patch::{
    CallSiteSelector, InjectionKind, PatchCallable, PatchDescriptor, PatchImpl, EVERY_OCCURRENCE,
};

// ================================================================================================
// Host Boundary
// ================================================================================================

/// The host trait the engine drives, and the in-memory reference runtime
pub use crate::host::{HostRuntime, PatchHost, RECURSION_LIMIT};

/// Hook and value types crossing the host boundary
pub use crate::host::{NativeFn, PostfixFn, PrefixFn, TransformFn, Value};

// ================================================================================================
// Method Metadata
// ================================================================================================

/// Metadata token type identifying methods
pub use crate::metadata::token::Token;

/// Method handles and signatures
pub use crate::metadata::method::{Method, MethodRc, MethodSignature};

/// Primitive type tags for parameters and results
pub use crate::metadata::typesystem::CilFlavor;

// ================================================================================================
// Instruction Model
// ================================================================================================

/// Method bodies and the instruction type the weaver edits
pub use crate::assembly::{Instruction, MethodBody, Operand};

/// Instruction constructors mirroring the CIL encodings
pub use crate::assembly::opcodes;

// ================================================================================================
// Weaving
// ================================================================================================

/// Index-addressed cursor over an instruction buffer
pub use crate::weaver::CodeCursor;
