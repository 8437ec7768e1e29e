//! Patch callables.
//!
//! A callable is the code a patch runs: a method handle carrying its declared
//! identity and signature, plus the closure implementing it. The handle is what
//! the engine reasons about (shim typing, redirect matching, stack-neutrality,
//! conflict listings); the closure is what ultimately executes, either directly
//! as an installed hook or behind a native method entry when the weaver splices
//! a call to it.

use std::fmt;
use std::sync::Arc;

use crate::{host::Value, metadata::method::MethodRc, Result};

/// Type alias for patch implementations.
///
/// The slice holds the arguments forwarded per the callable's declared
/// parameter list. The `&mut Option<Value>` is the by-ref result slot of the
/// target invocation; HEAD callables may write it and RETURN callables may
/// rewrite it. The returned value is the callable's own declared result
/// (`None` for void callables).
///
/// # Thread Safety
///
/// Patch implementations must be `Send + Sync` so installed hooks can run from
/// any thread.
pub type PatchImpl = Arc<dyn Fn(&[Value], &mut Option<Value>) -> Result<Option<Value>> + Send + Sync>;

/// The code a patch runs, with its declared identity.
///
/// Cloning is cheap; the handle and the implementation are both shared.
#[derive(Clone)]
pub struct PatchCallable {
    /// Identity and declared signature of the patch code
    pub method: MethodRc,
    imp: PatchImpl,
}

impl PatchCallable {
    /// Creates a callable from a method handle and its implementation.
    #[must_use]
    pub fn new<F>(method: MethodRc, imp: F) -> Self
    where
        F: Fn(&[Value], &mut Option<Value>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        PatchCallable {
            method,
            imp: Arc::new(imp),
        }
    }

    /// Runs the callable.
    ///
    /// # Errors
    /// Propagates whatever the implementation returns.
    pub fn invoke(&self, args: &[Value], slot: &mut Option<Value>) -> Result<Option<Value>> {
        (self.imp)(args, slot)
    }

    /// Returns a shared handle to the raw implementation.
    #[must_use]
    pub fn implementation(&self) -> PatchImpl {
        self.imp.clone()
    }
}

impl fmt::Debug for PatchCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchCallable")
            .field("method", &self.method.display_signature())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        method::{Method, MethodSignature},
        token::Token,
        typesystem::CilFlavor,
    };

    #[test]
    fn test_invoke_forwards_args_and_slot() {
        let handle = Method::new(
            Token::method(100),
            "Patches",
            "Fixed",
            MethodSignature::returning(vec![CilFlavor::I4], CilFlavor::I4),
        );
        let callable = PatchCallable::new(handle, |args, slot| {
            *slot = Some(Value::I32(7));
            match args {
                [Value::I32(x)] => Ok(Some(Value::I32(x * 2))),
                _ => Ok(None),
            }
        });

        let mut slot = None;
        let produced = callable.invoke(&[Value::I32(21)], &mut slot).unwrap();
        assert_eq!(produced, Some(Value::I32(42)));
        assert_eq!(slot, Some(Value::I32(7)));
    }

    #[test]
    fn test_clone_shares_implementation() {
        let handle = Method::new(Token::method(101), "Patches", "Nop", MethodSignature::nullary());
        let callable = PatchCallable::new(handle, |_, _| Ok(None));
        let cloned = callable.clone();
        assert_eq!(cloned.method.token, callable.method.token);
        assert!(Arc::ptr_eq(&callable.implementation(), &cloned.implementation()));
    }

    #[test]
    fn test_debug_renders_signature() {
        let handle = Method::new(Token::method(102), "Patches", "Nop", MethodSignature::nullary());
        let callable = PatchCallable::new(handle, |_, _| Ok(None));
        let rendered = format!("{:?}", callable);
        assert!(rendered.contains("Patches.Nop()"));
    }
}
