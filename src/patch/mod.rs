//! Patch declaration surface.
//!
//! This module contains the data types collaborators build to declare patches:
//! the injection kind, the call-site selector, the callable carrying the patch
//! code, and the descriptor tying them to a target method. Descriptors are
//! inert values; handing them to a [`crate::PatchSession`] is what applies them.
//!
//! # Key Components
//!
//! - [`InjectionKind`] - Where a patch attaches (HEAD, RETURN, INVOKE, REDIRECT, AFTER)
//! - [`CallSiteSelector`] - Which call inside the target to instrument
//! - [`PatchCallable`] - The patch code with its declared signature
//! - [`PatchDescriptor`] - One declared patch, built with `with_*` methods
//!
//! # Examples
//!
//! ```rust
//! use cilweave::metadata::{method::{Method, MethodSignature}, token::Token, typesystem::CilFlavor};
//! use cilweave::patch::{InjectionKind, PatchCallable, PatchDescriptor};
//!
//! let target = Method::new(
//!     Token::method(1),
//!     "Calculator",
//!     "Add",
//!     MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::I4], CilFlavor::I4),
//! );
//! let patch = Method::new(Token::method(50), "Patches", "CountCalls", MethodSignature::nullary());
//! let descriptor = PatchDescriptor::new(
//!     InjectionKind::Head,
//!     PatchCallable::new(patch, |_args, _slot| Ok(None)),
//! )
//! .with_target(target);
//! assert_eq!(descriptor.describe(), "HEAD on Calculator.Add using Patches.CountCalls");
//! ```

/// Implementation of patch callables
pub mod callable;
/// Implementation of patch descriptors
pub mod descriptor;
/// Implementation of injection kinds
pub mod kind;
/// Implementation of call-site selectors
pub mod selector;

pub use callable::{PatchCallable, PatchImpl};
pub use descriptor::{PatchDescriptor, EVERY_OCCURRENCE};
pub use kind::InjectionKind;
pub use selector::CallSiteSelector;
