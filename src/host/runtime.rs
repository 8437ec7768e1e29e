//! Reference host runtime.
//!
//! [`HostRuntime`] implements [`crate::host::PatchHost`] over an in-memory method
//! table. Methods are defined with an IL body or a native closure, invoked by token,
//! and patched through the trait's primitives. The table is a concurrent map and the
//! hook lists are append-only, so installation works through `&self` and patched
//! methods execute without taking any lock on the hook path.
//!
//! # Architecture
//!
//! Each table entry owns the method handle, its code (an IL body behind a `RwLock`
//! or a native closure) and two append-only hook lists. Invocation runs every
//! prefix in installation order, then the body unless some prefix suppressed it,
//! then every postfix. Body transforms happen under the body's write lock against a
//! scratch clone; the clone replaces the body only when the transform succeeds, and
//! a per-entry flag enforces the one-rewrite-per-method contract.
//!
//! # Thread Safety
//!
//! All operations take `&self`. Defining methods, installing hooks and invoking
//! may proceed concurrently from any number of threads.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, RwLock,
};

use dashmap::DashMap;

use crate::{
    assembly::MethodBody,
    host::{eval, NativeFn, PatchHost, PostfixFn, PrefixFn, TransformFn, Value},
    metadata::{method::MethodRc, token::Token},
    Error, Result,
};

/// Maximum nested-call depth for body evaluation.
pub const RECURSION_LIMIT: usize = 64;

enum MethodCode {
    Il(RwLock<MethodBody>),
    Native(NativeFn),
}

struct MethodEntry {
    method: MethodRc,
    code: MethodCode,
    prefixes: boxcar::Vec<PrefixFn>,
    postfixes: boxcar::Vec<PostfixFn>,
    transformed: AtomicBool,
}

/// In-memory host runtime with a concurrent method table.
///
/// # Examples
///
/// ```rust
/// use cilweave::assembly::{opcodes, MethodBody};
/// use cilweave::host::{HostRuntime, Value};
/// use cilweave::metadata::{method::{Method, MethodSignature}, token::Token, typesystem::CilFlavor};
///
/// let host = HostRuntime::new();
/// let add = Method::new(
///     Token::method(1),
///     "Calculator",
///     "Add",
///     MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::I4], CilFlavor::I4),
/// );
///
/// let mut body = MethodBody::new();
/// body.push(opcodes::ldarg(0));
/// body.push(opcodes::ldarg(1));
/// body.push(opcodes::add());
/// body.push(opcodes::ret());
/// body.relayout();
///
/// host.define_method(add.clone(), body)?;
/// let result = host.invoke(add.token, &[Value::I32(2), Value::I32(3)])?;
/// assert_eq!(result, Some(Value::I32(5)));
/// # Ok::<(), cilweave::Error>(())
/// ```
pub struct HostRuntime {
    methods: DashMap<Token, Arc<MethodEntry>>,
}

impl HostRuntime {
    /// Creates an empty runtime.
    #[must_use]
    pub fn new() -> Self {
        HostRuntime {
            methods: DashMap::new(),
        }
    }

    /// Defines a method backed by an IL body.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateMethod`] when the token is already defined.
    pub fn define_method(&self, method: MethodRc, mut body: MethodBody) -> Result<()> {
        body.relayout();
        self.define_entry(
            method.clone(),
            MethodEntry {
                method,
                code: MethodCode::Il(RwLock::new(body)),
                prefixes: boxcar::Vec::new(),
                postfixes: boxcar::Vec::new(),
                transformed: AtomicBool::new(false),
            },
        )
    }

    /// Defines a method backed by a native closure.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateMethod`] when the token is already defined.
    pub fn define_native(&self, method: MethodRc, native: NativeFn) -> Result<()> {
        self.define_entry(
            method.clone(),
            MethodEntry {
                method,
                code: MethodCode::Native(native),
                prefixes: boxcar::Vec::new(),
                postfixes: boxcar::Vec::new(),
                transformed: AtomicBool::new(false),
            },
        )
    }

    fn define_entry(&self, method: MethodRc, entry: MethodEntry) -> Result<()> {
        match self.methods.entry(method.token) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(Error::DuplicateMethod(method.token)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::new(entry));
                Ok(())
            }
        }
    }

    /// Looks up a defined method handle by token.
    #[must_use]
    pub fn method(&self, token: Token) -> Option<MethodRc> {
        self.methods.get(&token).map(|entry| entry.method.clone())
    }

    /// Returns a snapshot of a method's current IL body, `None` for native entries.
    pub fn body_snapshot(&self, token: Token) -> Result<Option<MethodBody>> {
        let Some(entry) = self.methods.get(&token) else {
            return Err(Error::MethodNotFound(token));
        };
        match &entry.code {
            MethodCode::Il(body) => {
                let guard = body.read().map_err(|_| Error::LockError)?;
                Ok(Some(guard.clone()))
            }
            MethodCode::Native(_) => Ok(None),
        }
    }

    /// Invokes a method through the full hook pipeline.
    ///
    /// Every installed prefix runs in installation order; each may write the
    /// result slot, and any returning `false` suppresses the body, so the last
    /// slot writer decides the observed value. Postfixes run afterwards in
    /// installation order.
    ///
    /// # Errors
    /// Returns [`Error::MethodNotFound`] for undefined tokens,
    /// [`Error::ArgumentMismatch`] on wrong arity, and propagates hook, body
    /// evaluation and recursion failures.
    pub fn invoke(&self, token: Token, args: &[Value]) -> Result<Option<Value>> {
        self.invoke_at_depth(token, args, 0)
    }

    pub(crate) fn invoke_at_depth(
        &self,
        token: Token,
        args: &[Value],
        depth: usize,
    ) -> Result<Option<Value>> {
        if depth >= RECURSION_LIMIT {
            return Err(Error::RecursionLimit(RECURSION_LIMIT));
        }

        let entry = self
            .methods
            .get(&token)
            .map(|e| e.value().clone())
            .ok_or(Error::MethodNotFound(token))?;

        let expected = entry.method.signature.params.len();
        if args.len() != expected {
            return Err(Error::ArgumentMismatch {
                expected,
                found: args.len(),
            });
        }

        let mut slot: Option<Value> = None;
        let mut suppressed = false;
        for (_, prefix) in entry.prefixes.iter() {
            if !prefix(args, &mut slot)? {
                suppressed = true;
            }
        }

        if !suppressed {
            match &entry.code {
                MethodCode::Native(native) => {
                    slot = native(args)?;
                }
                MethodCode::Il(body) => {
                    let snapshot = {
                        let guard = body.read().map_err(|_| Error::LockError)?;
                        guard.clone()
                    };
                    slot = eval::execute(self, &snapshot, args, depth)?;
                }
            }
        }

        for (_, postfix) in entry.postfixes.iter() {
            postfix(args, &mut slot)?;
        }

        if entry.method.signature.returns.is_none() {
            return Ok(None);
        }
        Ok(slot)
    }

    fn entry_for(&self, target: &MethodRc, action: &str) -> Result<Arc<MethodEntry>> {
        self.methods
            .get(&target.token)
            .map(|e| e.value().clone())
            .ok_or_else(|| Error::HostInstallationFailed {
                target: target.full_name(),
                reason: format!("cannot {action}: method is unknown to the host"),
            })
    }
}

impl Default for HostRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchHost for HostRuntime {
    fn install_prefix(&self, target: &MethodRc, prefix: PrefixFn) -> Result<()> {
        let entry = self.entry_for(target, "install prefix")?;
        entry.prefixes.push(prefix);
        Ok(())
    }

    fn install_postfix(&self, target: &MethodRc, postfix: PostfixFn) -> Result<()> {
        let entry = self.entry_for(target, "install postfix")?;
        entry.postfixes.push(postfix);
        Ok(())
    }

    fn transform_body(&self, target: &MethodRc, transform: TransformFn<'_>) -> Result<()> {
        let entry = self.entry_for(target, "transform body")?;
        let MethodCode::Il(body) = &entry.code else {
            return Err(Error::HostInstallationFailed {
                target: target.full_name(),
                reason: "cannot transform body: method is native".to_string(),
            });
        };

        // The write lock serializes transforms; the flag persists the
        // one-rewrite-per-method contract across them.
        let mut guard = body.write().map_err(|_| Error::LockError)?;
        if entry.transformed.load(Ordering::Acquire) {
            return Err(Error::HostInstallationFailed {
                target: target.full_name(),
                reason: "method body was already rewritten".to_string(),
            });
        }

        let mut scratch = guard.clone();
        transform(&mut scratch)?;
        scratch.relayout();
        *guard = scratch;
        entry.transformed.store(true, Ordering::Release);
        Ok(())
    }

    fn register_native(&self, method: &MethodRc, native: NativeFn) -> Result<()> {
        match self.methods.entry(method.token) {
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::new(MethodEntry {
                    method: method.clone(),
                    code: MethodCode::Native(native),
                    prefixes: boxcar::Vec::new(),
                    postfixes: boxcar::Vec::new(),
                    transformed: AtomicBool::new(false),
                }));
                Ok(())
            }
            dashmap::mapref::entry::Entry::Occupied(existing) => match &existing.get().code {
                MethodCode::Native(_) => Ok(()),
                MethodCode::Il(_) => Err(Error::DuplicateMethod(method.token)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::opcodes;
    use crate::metadata::{
        method::{Method, MethodSignature},
        typesystem::CilFlavor,
    };

    fn add_method() -> MethodRc {
        Method::new(
            Token::method(1),
            "Calculator",
            "Add",
            MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::I4], CilFlavor::I4),
        )
    }

    fn add_body() -> MethodBody {
        let mut body = MethodBody::new();
        body.push(opcodes::ldarg(0));
        body.push(opcodes::ldarg(1));
        body.push(opcodes::add());
        body.push(opcodes::ret());
        body
    }

    #[test]
    fn test_define_and_invoke_il() {
        let host = HostRuntime::new();
        let add = add_method();
        host.define_method(add.clone(), add_body()).unwrap();

        let result = host.invoke(add.token, &[Value::I32(2), Value::I32(3)]).unwrap();
        assert_eq!(result, Some(Value::I32(5)));
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let host = HostRuntime::new();
        let add = add_method();
        host.define_method(add.clone(), add_body()).unwrap();
        assert!(matches!(
            host.define_method(add, add_body()),
            Err(Error::DuplicateMethod(_))
        ));
    }

    #[test]
    fn test_invoke_unknown_token() {
        let host = HostRuntime::new();
        assert!(matches!(
            host.invoke(Token::method(99), &[]),
            Err(Error::MethodNotFound(_))
        ));
    }

    #[test]
    fn test_arity_checked() {
        let host = HostRuntime::new();
        let add = add_method();
        host.define_method(add.clone(), add_body()).unwrap();
        assert!(matches!(
            host.invoke(add.token, &[Value::I32(1)]),
            Err(Error::ArgumentMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_prefix_suppresses_body_and_slot_wins() {
        let host = HostRuntime::new();
        let add = add_method();
        host.define_method(add.clone(), add_body()).unwrap();

        host.install_prefix(
            &add,
            Arc::new(|_args, slot: &mut Option<Value>| {
                *slot = Some(Value::I32(68));
                Ok(false)
            }),
        )
        .unwrap();

        let result = host.invoke(add.token, &[Value::I32(2), Value::I32(3)]).unwrap();
        assert_eq!(result, Some(Value::I32(68)));
    }

    #[test]
    fn test_all_prefixes_run_last_writer_wins() {
        let host = HostRuntime::new();
        let add = add_method();
        host.define_method(add.clone(), add_body()).unwrap();

        host.install_prefix(
            &add,
            Arc::new(|_args, slot: &mut Option<Value>| {
                *slot = Some(Value::I32(1));
                Ok(false)
            }),
        )
        .unwrap();
        host.install_prefix(
            &add,
            Arc::new(|_args, slot: &mut Option<Value>| {
                *slot = Some(Value::I32(2));
                Ok(false)
            }),
        )
        .unwrap();

        let result = host.invoke(add.token, &[Value::I32(4), Value::I32(4)]).unwrap();
        assert_eq!(result, Some(Value::I32(2)));
    }

    #[test]
    fn test_postfix_rewrites_result() {
        let host = HostRuntime::new();
        let add = add_method();
        host.define_method(add.clone(), add_body()).unwrap();

        host.install_postfix(
            &add,
            Arc::new(|_args, slot: &mut Option<Value>| {
                if let Some(Value::I32(v)) = slot {
                    *slot = Some(Value::I32(*v + 1));
                }
                Ok(())
            }),
        )
        .unwrap();

        let result = host.invoke(add.token, &[Value::I32(2), Value::I32(3)]).unwrap();
        assert_eq!(result, Some(Value::I32(6)));
    }

    #[test]
    fn test_transform_applied_once() {
        let host = HostRuntime::new();
        let add = add_method();
        host.define_method(add.clone(), add_body()).unwrap();

        host.transform_body(
            &add,
            Box::new(|body: &mut MethodBody| {
                body.instructions.insert(2, opcodes::nop());
                Ok(())
            }),
        )
        .unwrap();

        let second = host.transform_body(&add, Box::new(|_body: &mut MethodBody| Ok(())));
        assert!(matches!(second, Err(Error::HostInstallationFailed { .. })));

        // Body still evaluates correctly with the spliced nop
        let result = host.invoke(add.token, &[Value::I32(2), Value::I32(3)]).unwrap();
        assert_eq!(result, Some(Value::I32(5)));
    }

    #[test]
    fn test_failed_transform_leaves_body_untouched() {
        let host = HostRuntime::new();
        let add = add_method();
        host.define_method(add.clone(), add_body()).unwrap();

        let failed = host.transform_body(
            &add,
            Box::new(|body: &mut MethodBody| {
                body.instructions.clear();
                Err(Error::Error("deliberate".to_string()))
            }),
        );
        assert!(failed.is_err());

        let body = host.body_snapshot(add.token).unwrap().unwrap();
        assert_eq!(body.instructions.len(), 4);

        // And the method can still be rewritten later
        host.transform_body(&add, Box::new(|_body: &mut MethodBody| Ok(())))
            .unwrap();
    }

    #[test]
    fn test_register_native_idempotent() {
        let host = HostRuntime::new();
        let patch = Method::new(Token::method(50), "Patches", "Fixed", MethodSignature::nullary());
        let native: NativeFn = Arc::new(|_args| Ok(None));

        host.register_native(&patch, native.clone()).unwrap();
        host.register_native(&patch, native).unwrap();

        let add = add_method();
        host.define_method(add.clone(), add_body()).unwrap();
        let clash: NativeFn = Arc::new(|_args| Ok(None));
        assert!(matches!(
            host.register_native(&add, clash),
            Err(Error::DuplicateMethod(_))
        ));
    }

    #[test]
    fn test_void_method_returns_none() {
        let host = HostRuntime::new();
        let nothin = Method::new(Token::method(7), "Helper", "Nothin", MethodSignature::nullary());
        let mut body = MethodBody::new();
        body.push(opcodes::ret());
        host.define_method(nothin.clone(), body).unwrap();

        host.install_prefix(
            &nothin,
            Arc::new(|_args, slot: &mut Option<Value>| {
                *slot = Some(Value::I32(9));
                Ok(true)
            }),
        )
        .unwrap();

        assert_eq!(host.invoke(nothin.token, &[]).unwrap(), None);
    }
}
