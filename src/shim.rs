//! Result-shim synthesis for overwriting HEAD patches.
//!
//! A HEAD patch whose declared result is a typed value (not boolean, not
//! absent) cannot use the boolean prefix convention directly: its return value
//! IS the method result, not a continue/suppress flag. [`synthesize`] bridges
//! the gap with a closure that forwards the target's leading arguments to the
//! patch, stores the patch's returned value in the host's result slot, and
//! answers `false` so the original body never runs.
//!
//! Synthesis validates before it builds: the patch's result flavor must equal
//! the target's, and the patch's parameter list must be a positional prefix of
//! the target's so a forwarding plan exists.

use std::sync::Arc;

use crate::{
    host::{PrefixFn, Value},
    metadata::method::{MethodRc, MethodSignature},
    patch::PatchCallable,
    Error, Result,
};

/// Number of leading target arguments forwarded to `patch`, or the reason no
/// forwarding plan exists.
pub(crate) fn forwarding_arity(
    target: &MethodSignature,
    patch: &MethodSignature,
) -> std::result::Result<usize, String> {
    if patch.params.len() > target.params.len() {
        return Err(format!(
            "patch declares {} parameters but the target supplies {}",
            patch.params.len(),
            target.params.len()
        ));
    }

    for (at, (wanted, supplied)) in patch.params.iter().zip(target.params.iter()).enumerate() {
        if wanted != supplied {
            return Err(format!(
                "parameter {at} is {wanted} but the target supplies {supplied}"
            ));
        }
    }

    Ok(patch.params.len())
}

/// Builds the overwriting prefix for `callable` against `target`.
///
/// # Errors
/// Returns [`Error::TypeMismatch`] when the declared result flavor differs
/// from the target's, and [`Error::ShimConstructionFailed`] when no argument
/// forwarding plan exists. Both leave the pass free to continue with the
/// descriptor skipped.
pub fn synthesize(target: &MethodRc, callable: &PatchCallable) -> Result<PrefixFn> {
    if callable.method.signature.returns != target.signature.returns {
        return Err(Error::TypeMismatch {
            expected: target.signature.render_returns(),
            found: callable.method.signature.render_returns(),
        });
    }

    let arity = forwarding_arity(&target.signature, &callable.method.signature).map_err(
        |reason| Error::ShimConstructionFailed {
            patch: callable.method.full_name(),
            reason,
        },
    )?;

    let implementation = callable.implementation();
    Ok(Arc::new(
        move |args: &[Value], slot: &mut Option<Value>| -> Result<bool> {
            let Some(forwarded) = args.get(..arity) else {
                return Err(Error::ArgumentMismatch {
                    expected: arity,
                    found: args.len(),
                });
            };
            if let Some(value) = implementation(forwarded, slot)? {
                *slot = Some(value);
            }
            Ok(false)
        },
    ))
}
