//! Host runtime boundary.
//!
//! The engine never intercepts calls itself; it drives a host runtime through the
//! [`PatchHost`] trait. The trait exposes the four primitives the applier and the
//! weaver need: install a prefix hook, install a postfix hook, rewrite a method
//! body once, and register a native method so woven code can call into patch
//! closures. [`HostRuntime`] is the in-memory reference implementation used by the
//! tests and usable as a standalone execution substrate.
//!
//! # Architecture
//!
//! Hook conventions follow the ones patched runtimes use in practice:
//!
//! - A prefix receives the call arguments and the by-ref result slot; returning
//!   `false` suppresses the original body (and any value left in the slot becomes
//!   the call's result). Every installed prefix runs, in installation order.
//! - A postfix receives the arguments and the slot after the body ran (or was
//!   suppressed) and may rewrite the slot.
//! - A body transform runs at installation time against a scratch copy; the host
//!   swaps it in only when the transform succeeds and refuses a second rewrite of
//!   the same method.
//!
//! # Key Components
//!
//! - [`Value`] - Runtime values crossing the host boundary
//! - [`PatchHost`] - The consumed interception primitive
//! - [`PrefixFn`], [`PostfixFn`], [`TransformFn`], [`NativeFn`] - Hook closure aliases
//! - [`HostRuntime`] - Reference implementation with a concurrent method table
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync`; installation only needs `&self` so a
//! pass can run against a shared host.

use std::sync::Arc;

use crate::{assembly::MethodBody, metadata::method::MethodRc, metadata::typesystem::CilFlavor, Result};

/// Implementation of linear body evaluation
mod eval;
/// Implementation of the reference host runtime
mod runtime;

pub use runtime::{HostRuntime, RECURSION_LIMIT};

/// A runtime value crossing the host boundary.
///
/// Covers the flavors the supported instruction set can produce. Booleans are
/// carried as their own variant rather than widened to `int32`, preserving the
/// prefix convention's `false` test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Boolean value
    Bool(bool),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 32-bit floating point
    F32(f32),
    /// 64-bit floating point
    F64(f64),
}

impl Value {
    /// The flavor this value belongs to.
    #[must_use]
    pub fn flavor(&self) -> CilFlavor {
        match self {
            Value::Bool(_) => CilFlavor::Boolean,
            Value::I32(_) => CilFlavor::I4,
            Value::I64(_) => CilFlavor::I8,
            Value::F32(_) => CilFlavor::R4,
            Value::F64(_) => CilFlavor::R8,
        }
    }

    /// Reads the value as a boolean, when it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Reads the value as a 32-bit integer, when it is one.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Zero of the given flavor, the content of a fresh initialized local.
    #[must_use]
    pub fn zero_of(flavor: CilFlavor) -> Value {
        match flavor {
            CilFlavor::Boolean => Value::Bool(false),
            CilFlavor::I8 => Value::I64(0),
            CilFlavor::R4 => Value::F32(0.0),
            CilFlavor::R8 => Value::F64(0.0),
            _ => Value::I32(0),
        }
    }
}

/// Type alias for prefix hook functions.
///
/// Receives the call arguments and the mutable result slot. Returning `false`
/// suppresses the original body; the slot's content then stands as the call's
/// result.
///
/// # Thread Safety
///
/// Prefix functions must be `Send + Sync` so patched methods can execute from
/// any thread.
pub type PrefixFn = Arc<dyn Fn(&[Value], &mut Option<Value>) -> Result<bool> + Send + Sync>;

/// Type alias for postfix hook functions.
///
/// Receives the call arguments and the result slot after the body ran or was
/// suppressed; may rewrite the slot.
///
/// # Thread Safety
///
/// Postfix functions must be `Send + Sync` so patched methods can execute from
/// any thread.
pub type PostfixFn = Arc<dyn Fn(&[Value], &mut Option<Value>) -> Result<()> + Send + Sync>;

/// Type alias for one-shot body transforms.
///
/// The host hands the transform a scratch copy of the target's body; the
/// rewritten copy replaces the original only when the transform returns `Ok`.
pub type TransformFn<'a> = Box<dyn FnOnce(&mut MethodBody) -> Result<()> + Send + 'a>;

/// Type alias for native method implementations.
///
/// Backs a method table entry with a closure instead of an IL body, which is
/// how patch callables become reachable from woven `call` instructions.
///
/// # Thread Safety
///
/// Native functions must be `Send + Sync` so they can be invoked from any thread.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Option<Value>> + Send + Sync>;

/// The call-interception primitive the engine drives.
///
/// One successful [`PatchHost::transform_body`] is permitted per target for the
/// host's lifetime; hook installation is unbounded and append-only.
pub trait PatchHost: Send + Sync {
    /// Installs a prefix hook on `target`.
    ///
    /// # Errors
    /// Returns [`crate::Error::HostInstallationFailed`] when the target cannot
    /// accept hooks (for example, it is unknown to the host).
    fn install_prefix(&self, target: &MethodRc, prefix: PrefixFn) -> Result<()>;

    /// Installs a postfix hook on `target`.
    ///
    /// # Errors
    /// Returns [`crate::Error::HostInstallationFailed`] when the target cannot
    /// accept hooks.
    fn install_postfix(&self, target: &MethodRc, postfix: PostfixFn) -> Result<()>;

    /// Rewrites `target`'s body through `transform`, at most once per target.
    ///
    /// # Errors
    /// Returns [`crate::Error::HostInstallationFailed`] when the target has no
    /// rewritable body or was already rewritten, and propagates the transform's
    /// own error when it fails (leaving the original body in place).
    fn transform_body(&self, target: &MethodRc, transform: TransformFn<'_>) -> Result<()>;

    /// Registers `method` as a native entry backed by `native`.
    ///
    /// Idempotent for re-registration of the same method; redefining a
    /// different entry under an existing token is an error.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateMethod`] on a conflicting redefinition.
    fn register_native(&self, method: &MethodRc, native: NativeFn) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_flavors() {
        assert_eq!(Value::Bool(true).flavor(), CilFlavor::Boolean);
        assert_eq!(Value::I32(1).flavor(), CilFlavor::I4);
        assert_eq!(Value::I64(1).flavor(), CilFlavor::I8);
        assert_eq!(Value::F32(1.0).flavor(), CilFlavor::R4);
        assert_eq!(Value::F64(1.0).flavor(), CilFlavor::R8);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Bool(false).as_bool(), Some(false));
        assert_eq!(Value::I32(5).as_bool(), None);
        assert_eq!(Value::I32(5).as_i32(), Some(5));
        assert_eq!(Value::F64(5.0).as_i32(), None);
    }

    #[test]
    fn test_zero_of() {
        assert_eq!(Value::zero_of(CilFlavor::Boolean), Value::Bool(false));
        assert_eq!(Value::zero_of(CilFlavor::I4), Value::I32(0));
        assert_eq!(Value::zero_of(CilFlavor::I8), Value::I64(0));
        assert_eq!(Value::zero_of(CilFlavor::R4), Value::F32(0.0));
        assert_eq!(Value::zero_of(CilFlavor::R8), Value::F64(0.0));
    }
}
