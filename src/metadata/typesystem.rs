//! Primitive type tags for method signatures.
//!
//! This module provides [`crate::metadata::typesystem::CilFlavor`], the compact type
//! representation the patching engine reasons about. Signatures attached to method
//! handles carry flavors for every parameter and for the result; the engine compares
//! them when it validates result shims, redirect replacements and stack-neutral
//! splices. Absent results (`void` methods) are modeled as `Option<CilFlavor>::None`
//! rather than a dedicated variant, so parameter lists can never contain a void entry.
//!
//! # Key Components
//!
//! - [`crate::metadata::typesystem::CilFlavor`] - Primitive type tag with CIL display names
//!
//! # Usage Examples
//!
//! ```rust
//! use cilweave::metadata::typesystem::CilFlavor;
//!
//! let flavor = CilFlavor::I4;
//! assert!(flavor.is_integer());
//! assert_eq!(flavor.to_string(), "int32");
//! ```

use std::fmt;

/// Primitive type tag used in method signatures.
///
/// The variants mirror the CIL element types the engine needs to compare:
/// integers and floats for the arithmetic instruction set, plus the reference
/// flavors that signatures may declare. Comparing flavors is how the engine
/// decides whether a result shim is well-typed and whether a redirect
/// replacement matches the call it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CilFlavor {
    /// System.Boolean
    Boolean,
    /// System.Char
    Char,
    /// System.Int32
    I4,
    /// System.Int64
    I8,
    /// System.Single
    R4,
    /// System.Double
    R8,
    /// System.String
    String,
    /// System.Object
    Object,
}

impl CilFlavor {
    /// Check if this is an integer type
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self, CilFlavor::I4 | CilFlavor::I8)
    }

    /// Check if this is a floating-point type
    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(self, CilFlavor::R4 | CilFlavor::R8)
    }

    /// Check if this is a reference type
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, CilFlavor::String | CilFlavor::Object)
    }
}

impl fmt::Display for CilFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CilFlavor::Boolean => "bool",
            CilFlavor::Char => "char",
            CilFlavor::I4 => "int32",
            CilFlavor::I8 => "int64",
            CilFlavor::R4 => "float32",
            CilFlavor::R8 => "float64",
            CilFlavor::String => "string",
            CilFlavor::Object => "object",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavor_categories() {
        assert!(CilFlavor::I4.is_integer());
        assert!(CilFlavor::I8.is_integer());
        assert!(!CilFlavor::R4.is_integer());

        assert!(CilFlavor::R4.is_float());
        assert!(CilFlavor::R8.is_float());
        assert!(!CilFlavor::Boolean.is_float());

        assert!(CilFlavor::String.is_reference());
        assert!(CilFlavor::Object.is_reference());
        assert!(!CilFlavor::Char.is_reference());
    }

    #[test]
    fn test_flavor_display() {
        assert_eq!(CilFlavor::Boolean.to_string(), "bool");
        assert_eq!(CilFlavor::I4.to_string(), "int32");
        assert_eq!(CilFlavor::I8.to_string(), "int64");
        assert_eq!(CilFlavor::R4.to_string(), "float32");
        assert_eq!(CilFlavor::R8.to_string(), "float64");
        assert_eq!(CilFlavor::Object.to_string(), "object");
    }

    #[test]
    fn test_flavor_equality() {
        assert_eq!(CilFlavor::I4, CilFlavor::I4);
        assert_ne!(CilFlavor::I4, CilFlavor::I8);
    }
}
