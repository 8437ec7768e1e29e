//! Occurrence-scanning weave engine.
//!
//! [`weave`] runs every call-site descriptor of one target group over the
//! target's instruction buffer, in discovery order. Each descriptor scans the
//! buffer left to right for calls matching its selector, counting matches two
//! ways: `absolute` counts every match, `relative` counts only matches at or
//! past the descriptor's start index. A match fires when it is eligible
//! (`start_index == 0` or `absolute >= start_index`) and the occurrence rule
//! holds (`occurrence == 0` fires every eligible match, otherwise only the
//! `occurrence`-th). A single-occurrence descriptor stops scanning once it has
//! fired.
//!
//! Firing splices a `call` to the patch callable:
//!
//! - INVOKE inserts it directly before the matched call,
//! - AFTER inserts it directly after the matched call,
//! - REDIRECT replaces the matched call in place.
//!
//! The scan resumes past the whole edit window, so a spliced call can never
//! match its own descriptor, and each later descriptor sees the stream as the
//! earlier ones left it. Splices keep the operand stack shape intact: INVOKE
//! and AFTER callables must take nothing and return nothing, and a REDIRECT
//! callable must have exactly the replaced callee's signature, so the body's
//! `max_stack` is still valid afterwards. A violation fails the whole
//! transform and the host discards the scratch body.
//!
//! # Examples
//!
//! ```rust
//! use cilweave::assembly::{opcodes, MethodBody};
//! use cilweave::metadata::{method::{Method, MethodSignature}, token::Token};
//! use cilweave::patch::{InjectionKind, PatchCallable, PatchDescriptor};
//! use cilweave::weaver;
//!
//! let caller = Method::new(Token::method(1), "Caller", "CallHelper", MethodSignature::nullary());
//! let helper = Method::new(Token::method(2), "Helper", "Nothin", MethodSignature::nullary());
//! let patch = Method::new(Token::method(90), "Patches", "Observe", MethodSignature::nullary());
//!
//! let mut body = MethodBody::new();
//! body.push(opcodes::call(&helper));
//! body.push(opcodes::ret());
//!
//! let descriptor = PatchDescriptor::new(
//!     InjectionKind::Invoke,
//!     PatchCallable::new(patch, |_args, _slot| Ok(None)),
//! )
//! .with_target(caller.clone())
//! .with_selector("Helper.Nothin");
//!
//! weaver::weave(&caller, &[descriptor], &mut body)?;
//! assert_eq!(body.instructions.len(), 3);
//! # Ok::<(), cilweave::Error>(())
//! ```

use log::debug;

use crate::{
    assembly::{opcodes, MethodBody},
    metadata::method::{Method, MethodRc},
    patch::{InjectionKind, PatchDescriptor},
    weaver::cursor::CodeCursor,
    Error, Result,
};

fn render_shape(method: &Method) -> String {
    format!(
        "({}) -> {}",
        method.signature.render_params(),
        method.signature.render_returns()
    )
}

fn check_stack_neutral(descriptor: &PatchDescriptor) -> Result<()> {
    if descriptor.callable.method.signature.is_stack_neutral() {
        return Ok(());
    }
    Err(Error::StackUnsafe(format!(
        "{} is {} and cannot be spliced around a call",
        descriptor.callable.method.full_name(),
        render_shape(&descriptor.callable.method)
    )))
}

fn check_redirect_shape(descriptor: &PatchDescriptor, callee: &MethodRc) -> Result<()> {
    if descriptor.callable.method.signature == callee.signature {
        return Ok(());
    }
    Err(Error::StackUnsafe(format!(
        "{} is {} and cannot replace {} which is {}",
        descriptor.callable.method.full_name(),
        render_shape(&descriptor.callable.method),
        callee.full_name(),
        render_shape(callee)
    )))
}

fn weave_descriptor(
    target: &MethodRc,
    descriptor: &PatchDescriptor,
    body: &mut MethodBody,
) -> Result<()> {
    let Some(selector) = descriptor.selector.as_ref() else {
        return Err(Error::MissingSelector(
            descriptor.callable.method.full_name(),
        ));
    };

    let mut absolute: u32 = 0;
    let mut relative: u32 = 0;
    let mut index: usize = 0;

    loop {
        let found = CodeCursor::new(&mut body.instructions).find_next_call(index, selector);
        let Some(at) = found else {
            break;
        };

        absolute += 1;
        let eligible = descriptor.start_index == 0 || absolute >= descriptor.start_index;
        if eligible {
            relative += 1;
        }
        let fires =
            eligible && (descriptor.occurrence == 0 || relative == descriptor.occurrence);
        if !fires {
            index = at + 1;
            continue;
        }

        let (spliced_at, resume) = match descriptor.kind {
            InjectionKind::Invoke => {
                check_stack_neutral(descriptor)?;
                let mut cursor = CodeCursor::new(&mut body.instructions);
                cursor.insert_before(at, opcodes::call(&descriptor.callable.method));
                (at, at + 2)
            }
            InjectionKind::After => {
                check_stack_neutral(descriptor)?;
                let mut cursor = CodeCursor::new(&mut body.instructions);
                cursor.insert_after(at, opcodes::call(&descriptor.callable.method));
                (at + 1, at + 2)
            }
            InjectionKind::Redirect => {
                let mut cursor = CodeCursor::new(&mut body.instructions);
                let callee = cursor
                    .get(at)
                    .and_then(|i| i.callee())
                    .cloned()
                    .ok_or_else(|| Error::Error("matched instruction lost its callee".to_string()))?;
                check_redirect_shape(descriptor, &callee)?;
                cursor.replace(at, opcodes::call(&descriptor.callable.method));
                (at, at + 1)
            }
            other => return Err(Error::UnsupportedInjectionKind(other)),
        };

        body.relayout();
        if let Some(spliced) = body.instructions.get(spliced_at) {
            debug!(
                "Weaved {} {} at IL_{:04x} in {}",
                descriptor.kind,
                descriptor.callable.method.full_name(),
                spliced.offset,
                target.full_name()
            );
        }

        if descriptor.occurrence != 0 {
            break;
        }
        index = resume;
    }

    Ok(())
}

/// Weaves every descriptor of one target group into `body`, in order.
///
/// A descriptor whose selector matches nothing is silently inert. Intended to
/// run inside [`crate::host::PatchHost::transform_body`], so an error leaves
/// the installed body untouched.
///
/// # Errors
/// Returns [`Error::StackUnsafe`] when a callable's shape would corrupt the
/// operand stack at the splice point, and [`Error::MissingSelector`] or
/// [`Error::UnsupportedInjectionKind`] for descriptors that should have been
/// rejected at registration.
pub fn weave(
    target: &MethodRc,
    descriptors: &[PatchDescriptor],
    body: &mut MethodBody,
) -> Result<()> {
    for descriptor in descriptors {
        weave_descriptor(target, descriptor, body)?;
    }
    body.relayout();
    Ok(())
}
