// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![allow(dead_code)]

//! # cilweave
//!
//! [![Crates.io](https://img.shields.io/crates/v/cilweave.svg)](https://crates.io/crates/cilweave)
//! [![Documentation](https://docs.rs/cilweave/badge.svg)](https://docs.rs/cilweave)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/cilweave/blob/main/LICENSE-APACHE)
//!
//! A declarative method-patching engine for CIL-style runtimes. Built in pure Rust,
//! `cilweave` lets third-party code alter the behavior of already-compiled methods
//! without touching their source: run code before a method (HEAD), after it returns
//! (RETURN), or around and instead of specific call expressions nested inside its
//! body (INVOKE, AFTER, REDIRECT), including suppressing the original body entirely.
//!
//! ## Features
//!
//! - **🔩 Whole-method hooks** - Prefix/postfix attachment with the boolean suppress convention
//! - **🧵 Call-site weaving** - Insert, append or replace individual `call` instructions by selector
//! - **🎯 Occurrence targeting** - Fire at every match, the k-th match, or only past a start index
//! - **⚖️ Conflict policies** - Warn, abort, or skip when several patches compete for one target
//! - **🛡️ Stack safety** - Splices are validated so the operand stack shape never changes
//! - **🧩 Host-agnostic** - The engine drives any [`host::PatchHost`]; a reference runtime ships in the box
//!
//! ## Quick Start
//!
//! Add `cilweave` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! cilweave = "0.2"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust
//! use cilweave::prelude::*;
//!
//! let host = HostRuntime::new();
//! let session = PatchSession::new();
//! let report = session.apply(&host, Vec::new())?;
//! assert!(report.is_empty());
//! # Ok::<(), cilweave::Error>(())
//! ```
//!
//! ### Basic Usage
//!
//! ```rust
//! use cilweave::assembly::{opcodes, MethodBody};
//! use cilweave::host::{HostRuntime, Value};
//! use cilweave::metadata::{method::{Method, MethodSignature}, token::Token, typesystem::CilFlavor};
//! use cilweave::patch::{InjectionKind, PatchCallable, PatchDescriptor};
//! use cilweave::PatchSession;
//!
//! // A host with one method: Calculator.Add(a, b) => a + b
//! let host = HostRuntime::new();
//! let add = Method::new(
//!     Token::method(1),
//!     "Calculator",
//!     "Add",
//!     MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::I4], CilFlavor::I4),
//! );
//! let mut body = MethodBody::new();
//! body.push(opcodes::ldarg(0));
//! body.push(opcodes::ldarg(1));
//! body.push(opcodes::add());
//! body.push(opcodes::ret());
//! host.define_method(add.clone(), body)?;
//!
//! // An overwriting HEAD patch that pins the result to 68
//! let fixed = PatchCallable::new(
//!     Method::new(
//!         Token::method(90),
//!         "Patches",
//!         "Fixed",
//!         MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::I4], CilFlavor::I4),
//!     ),
//!     |_args, _slot| Ok(Some(Value::I32(68))),
//! );
//!
//! let session = PatchSession::new();
//! session.apply(
//!     &host,
//!     vec![PatchDescriptor::new(InjectionKind::Head, fixed)
//!         .with_target(add.clone())
//!         .with_overwriting(true)],
//! )?;
//!
//! assert_eq!(
//!     host.invoke(add.token, &[Value::I32(2), Value::I32(3)])?,
//!     Some(Value::I32(68)),
//! );
//! # Ok::<(), cilweave::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `cilweave` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`patch`] - Patch descriptors: kinds, selectors, callables, builders
//! - [`session`] - The pass orchestrator, [`PatchSession`] and [`session::PassResult`]
//! - [`registry`] / [`conflict`] - Pass-scoped grouping, validation and conflict policies
//! - [`applier`] / [`shim`] - Whole-method hook installation and result-shim synthesis
//! - [`weaver`] - Call-site instruction weaving with occurrence counting
//! - [`host`] - The [`host::PatchHost`] boundary and the in-memory [`host::HostRuntime`]
//! - [`metadata`] / [`assembly`] - Method handles, tokens, type flavors and the instruction model
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ### A Pass, End to End
//!
//! Descriptors go in; the registry groups them per target and drops malformed ones;
//! the conflict resolver applies the session policy; HEAD/RETURN groups become host
//! hooks (typed overwrites through a synthesized result shim); INVOKE/REDIRECT/AFTER
//! groups are woven into the target's instruction buffer through one body transform
//! per target; the pass reports per-target outcomes. Patched methods afterwards run
//! with no added synchronization in the hot path.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with comprehensive error information:
//!
//! ```rust
//! use cilweave::{Error, host::HostRuntime, metadata::token::Token};
//!
//! let host = HostRuntime::new();
//! match host.invoke(Token::method(42), &[]) {
//!     Ok(result) => println!("Returned {result:?}"),
//!     Err(Error::MethodNotFound(token)) => println!("No method at {token}"),
//!     Err(e) => println!("Other error: {e}"),
//! }
//! ```
//!
//! ## Thread Safety
//!
//! Pass state is confined to each [`PatchSession::apply`] activation; sessions share
//! no hidden globals. The reference [`host::HostRuntime`] uses concurrent tables and
//! append-only hook lists, so defining methods, installing patches and invoking may
//! all proceed from multiple threads.

pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the cilweave library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use cilweave::prelude::*;
///
/// let session = PatchSession::with_policy(ConflictPolicy::SkipConflicts);
/// assert_eq!(session.policy(), ConflictPolicy::SkipConflicts);
/// ```
pub mod prelude;

/// Instruction model for the supported CIL subset
///
/// This module provides the in-memory representation the weaver edits and the
/// host evaluates:
///
/// - [`assembly::Instruction`] - One decoded instruction with operand, flow type and stack behavior
/// - [`assembly::MethodBody`] - Locals, flags, max-stack and the instruction buffer
/// - [`assembly::opcodes`] - Constructor functions mirroring the CIL encodings
///   (`nop`, `ldarg.*`, `ldloc.*`/`stloc.*`, `ldc.*`, `add`/`sub`/`mul`, `dup`/`pop`, `call`, `ret`)
///
/// Instructions carry their encoded size and IL offset; [`assembly::MethodBody::relayout`]
/// recomputes offsets after the buffer changes.
pub mod assembly;

/// Method identity and the primitive type system
///
/// Everything a patch needs to know about a method without holding its code:
///
/// - [`metadata::token::Token`] - Metadata-token-shaped identity (table byte plus row)
/// - [`metadata::method::Method`] - Owner name, member name and signature behind an `Arc`
/// - [`metadata::typesystem::CilFlavor`] - Primitive type tags for parameters and results
pub mod metadata;

/// The host runtime boundary
///
/// The engine never touches running methods directly; it drives a
/// [`host::PatchHost`], the four-operation trait standing between patch
/// application and the runtime that owns the methods (install a prefix,
/// install a postfix, transform a body once, register a native method).
/// [`host::HostRuntime`] is the in-memory reference implementation, complete
/// with a hook pipeline and linear IL body evaluation, so patched behavior is
/// observable end to end without an external runtime.
pub mod host;

/// Patch declarations
///
/// The data third parties hand to a pass:
///
/// - [`patch::PatchDescriptor`] - Target, injection kind, selector, counters and the callable
/// - [`patch::InjectionKind`] - `HEAD`, `RETURN`, `INVOKE`, `REDIRECT`, `AFTER` (and the reserved `INSERT`)
/// - [`patch::CallSiteSelector`] - `Type.Member`, `Type::Member` or bare-member call matching
/// - [`patch::PatchCallable`] - A method handle plus the closure that implements the patch
pub mod patch;

/// Pass-scoped descriptor grouping and boundary validation
pub mod registry;

/// Conflict detection and the [`conflict::ConflictPolicy`] choices
pub mod conflict;

/// Result-shim synthesis for overwriting HEAD patches with typed results
pub mod shim;

/// Whole-method hook installation (HEAD prefixes, RETURN postfixes)
pub mod applier;

/// Call-site instruction weaving
///
/// Scans a target's instruction buffer for calls matching a selector and
/// splices patch calls before, after or in place of them, honoring each
/// descriptor's occurrence and start-index counters. See [`weaver::weave`]
/// and [`weaver::CodeCursor`].
pub mod weaver;

/// Pass orchestration: [`PatchSession`], [`session::PassResult`] and per-target statuses
pub mod session;

/// `cilweave` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
///
/// # Examples
///
/// ```rust
/// use cilweave::{host::HostRuntime, metadata::token::Token, Result};
///
/// fn lookup(host: &HostRuntime, token: Token) -> Result<()> {
///     host.body_snapshot(token).map(|_| ())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `cilweave` Error type
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for descriptor validation, conflict resolution, shim synthesis,
/// weaving and host evaluation.
///
/// # Examples
///
/// ```rust
/// use cilweave::{Error, host::HostRuntime, metadata::token::Token};
///
/// let host = HostRuntime::new();
/// match host.invoke(Token::method(1), &[]) {
///     Err(Error::MethodNotFound(token)) => println!("nothing at {token}"),
///     other => println!("{other:?}"),
/// }
/// ```
pub use error::Error;

/// Main entry point for applying patches.
///
/// See [`session::PatchSession`] for pass orchestration and reporting.
///
/// # Example
///
/// ```rust
/// use cilweave::{host::HostRuntime, PatchSession};
///
/// let session = PatchSession::new();
/// let report = session.apply(&HostRuntime::new(), Vec::new())?;
/// assert!(report.all_applied());
/// # Ok::<(), cilweave::Error>(())
/// ```
pub use session::PatchSession;

/// Conflict policy selection, re-exported for configuration at the crate root.
pub use conflict::ConflictPolicy;
