//! Method metadata representation.
//!
//! This module contains the metadata layer the patching engine is built on: token
//! identity, primitive type flavors and immutable method handles. Everything here is
//! plain data; the behavioral machinery (descriptors, registry, weaver, host) lives
//! in the sibling modules and consumes these types.
//!
//! # Key Components
//!
//! - [`token`] - Metadata table row references, the method identity
//! - [`typesystem`] - Primitive type flavors used in signatures
//! - [`method`] - Immutable method handles with flat signatures
//!
//! # Examples
//!
//! ```rust
//! use cilweave::metadata::{method::{Method, MethodSignature}, token::Token, typesystem::CilFlavor};
//!
//! let sig = MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::I4], CilFlavor::I4);
//! let add = Method::new(Token::method(1), "Calculator", "Add", sig);
//! println!("target: {}", add.display_signature());
//! ```

/// Implementation of method handles and signatures
pub mod method;
/// Commonly used metadata token type
pub mod token;
/// Primitive type flavors for signatures
pub mod typesystem;
