//! Whole-method patch application.
//!
//! HEAD and RETURN descriptors become host hooks. A HEAD patch wraps into a
//! prefix honoring the boolean convention: a returned `false` suppresses the
//! original body, anything else (including a typed or absent result) lets it
//! run. The overwriting HEAD variant with a typed result goes through
//! [`crate::shim::synthesize`] instead, which writes the result slot and
//! always suppresses. A RETURN patch wraps into a postfix that observes the
//! target's arguments and may rewrite the result slot; it cannot make the
//! body not have run.
//!
//! Application is per descriptor. Validation and host failures surface as
//! errors to the caller, which records them without aborting the rest of the
//! pass.

use std::sync::Arc;

use log::debug;

use crate::{
    host::{PatchHost, PostfixFn, PrefixFn, Value},
    metadata::{method::MethodRc, typesystem::CilFlavor},
    patch::{InjectionKind, PatchDescriptor},
    shim, Error, Result,
};

fn forwarding_arity(target: &MethodRc, descriptor: &PatchDescriptor) -> Result<usize> {
    shim::forwarding_arity(&target.signature, &descriptor.callable.method.signature).map_err(
        |reason| Error::HostInstallationFailed {
            target: target.full_name(),
            reason,
        },
    )
}

fn install_prefix(
    host: &dyn PatchHost,
    target: &MethodRc,
    descriptor: &PatchDescriptor,
) -> Result<()> {
    let arity = forwarding_arity(target, descriptor)?;
    let implementation = descriptor.callable.implementation();
    let prefix: PrefixFn = Arc::new(
        move |args: &[Value], slot: &mut Option<Value>| -> Result<bool> {
            let Some(forwarded) = args.get(..arity) else {
                return Err(Error::ArgumentMismatch {
                    expected: arity,
                    found: args.len(),
                });
            };
            let value = implementation(forwarded, slot)?;
            Ok(!matches!(value, Some(Value::Bool(false))))
        },
    );

    host.install_prefix(target, prefix)?;
    debug!(
        "Applied HEAD (prefix) on {} using {}",
        target.full_name(),
        descriptor.callable.method.full_name()
    );
    Ok(())
}

fn install_result_shim(
    host: &dyn PatchHost,
    target: &MethodRc,
    descriptor: &PatchDescriptor,
) -> Result<()> {
    let prefix = shim::synthesize(target, &descriptor.callable)?;
    host.install_prefix(target, prefix)?;
    debug!(
        "Applied HEAD (result shim) on {} using {}",
        target.full_name(),
        descriptor.callable.method.full_name()
    );
    Ok(())
}

fn install_postfix(
    host: &dyn PatchHost,
    target: &MethodRc,
    descriptor: &PatchDescriptor,
) -> Result<()> {
    let arity = forwarding_arity(target, descriptor)?;
    let implementation = descriptor.callable.implementation();
    let postfix: PostfixFn = Arc::new(
        move |args: &[Value], slot: &mut Option<Value>| -> Result<()> {
            let Some(forwarded) = args.get(..arity) else {
                return Err(Error::ArgumentMismatch {
                    expected: arity,
                    found: args.len(),
                });
            };
            if let Some(value) = implementation(forwarded, slot)? {
                *slot = Some(value);
            }
            Ok(())
        },
    );

    host.install_postfix(target, postfix)?;
    debug!(
        "Applied RETURN (postfix) on {} using {}",
        target.full_name(),
        descriptor.callable.method.full_name()
    );
    Ok(())
}

/// Installs one HEAD or RETURN descriptor on its target.
///
/// # Errors
/// Returns [`Error::TypeMismatch`] or [`Error::ShimConstructionFailed`] when
/// shim synthesis rejects an overwriting descriptor,
/// [`Error::HostInstallationFailed`] when argument forwarding is impossible or
/// the host refuses the hook, and [`Error::UnsupportedInjectionKind`] when a
/// call-site descriptor reaches this applier.
pub fn apply_descriptor(
    host: &dyn PatchHost,
    target: &MethodRc,
    descriptor: &PatchDescriptor,
) -> Result<()> {
    match descriptor.kind {
        InjectionKind::Head => {
            let returns = descriptor.callable.method.signature.returns;
            let typed_overwrite =
                descriptor.overwriting && !matches!(returns, None | Some(CilFlavor::Boolean));
            if typed_overwrite {
                install_result_shim(host, target, descriptor)
            } else {
                install_prefix(host, target, descriptor)
            }
        }
        InjectionKind::Return => install_postfix(host, target, descriptor),
        other => Err(Error::UnsupportedInjectionKind(other)),
    }
}
