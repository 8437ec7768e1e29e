//! Method handles and signatures.
//!
//! This module defines the method representation everything else in the crate hangs
//! off of: patch descriptors name their target as a [`crate::metadata::method::MethodRc`],
//! the registry groups descriptors by the handle's token, the host runtime keys its
//! method table with it, and the weaver compares handle signatures when it validates
//! splices.
//!
//! # Architecture
//!
//! A [`crate::metadata::method::Method`] is an immutable value: token identity, owner
//! type name, member name and a flat [`crate::metadata::method::MethodSignature`] of
//! primitive flavors. Handles are shared as `Arc` (the
//! [`crate::metadata::method::MethodRc`] alias) so descriptors, host table entries and
//! woven instruction operands can all point at the same method without copying.
//! Equality and hashing go through the token alone; two handles with equal tokens are
//! the same method no matter how their names compare.
//!
//! # Key Components
//!
//! - [`crate::metadata::method::Method`] - Immutable method handle
//! - [`crate::metadata::method::MethodSignature`] - Parameter and result flavors
//! - [`crate::metadata::method::MethodRc`] - Shared reference-counted handle
//!
//! # Usage Examples
//!
//! ```rust
//! use cilweave::metadata::{method::{Method, MethodSignature}, token::Token, typesystem::CilFlavor};
//!
//! let sig = MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::I4], CilFlavor::I4);
//! let add = Method::new(Token::method(1), "Calculator", "Add", sig);
//! assert_eq!(add.full_name(), "Calculator.Add");
//! assert_eq!(add.display_signature(), "Calculator.Add(int32, int32)");
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::metadata::{token::Token, typesystem::CilFlavor};

/// A reference-counted method handle
pub type MethodRc = Arc<Method>;

/// Parameter and result flavors of a method.
///
/// The signature is deliberately flat: a list of parameter flavors and an
/// optional result flavor, where `None` means the method returns nothing.
/// This is all the type information the engine needs for shim construction,
/// redirect matching and stack-neutrality checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Flavor of each parameter, in declaration order
    pub params: Vec<CilFlavor>,
    /// Result flavor, `None` for void methods
    pub returns: Option<CilFlavor>,
}

impl MethodSignature {
    /// Creates a signature with the given parameters and no result.
    #[must_use]
    pub fn void(params: Vec<CilFlavor>) -> Self {
        MethodSignature {
            params,
            returns: None,
        }
    }

    /// Creates a signature with the given parameters and result flavor.
    #[must_use]
    pub fn returning(params: Vec<CilFlavor>, returns: CilFlavor) -> Self {
        MethodSignature {
            params,
            returns: Some(returns),
        }
    }

    /// Signature of a method with no parameters and no result.
    #[must_use]
    pub fn nullary() -> Self {
        MethodSignature {
            params: Vec::new(),
            returns: None,
        }
    }

    /// True if the method neither consumes parameters nor produces a result.
    ///
    /// Callables spliced before or after an existing call must satisfy this,
    /// otherwise the splice would disturb the operand stack.
    #[must_use]
    pub fn is_stack_neutral(&self) -> bool {
        self.params.is_empty() && self.returns.is_none()
    }

    /// Renders the parameter list as `int32, int32`.
    #[must_use]
    pub fn render_params(&self) -> String {
        self.params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Renders the result flavor, `void` when absent.
    #[must_use]
    pub fn render_returns(&self) -> String {
        match &self.returns {
            Some(flavor) => flavor.to_string(),
            None => "void".to_string(),
        }
    }
}

/// An immutable method handle.
///
/// Identity is the [`Token`]; owner and name exist for selector matching and
/// log rendering. Handles are produced by whatever resolves patch declarations
/// upstream and by the host runtime when methods are defined, then shared as
/// [`MethodRc`] throughout a pass.
#[derive(Debug, Clone)]
pub struct Method {
    /// Metadata token, the method's identity
    pub token: Token,
    /// Name of the declaring type
    pub owner: String,
    /// Member name
    pub name: String,
    /// Parameter and result flavors
    pub signature: MethodSignature,
}

impl Method {
    /// Creates a new shared method handle.
    #[must_use]
    pub fn new(
        token: Token,
        owner: impl Into<String>,
        name: impl Into<String>,
        signature: MethodSignature,
    ) -> MethodRc {
        Arc::new(Method {
            token,
            owner: owner.into(),
            name: name.into(),
            signature,
        })
    }

    /// Returns `Owner.Name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    /// Returns `Owner.Name(param, param)`, the shape conflict listings use.
    #[must_use]
    pub fn display_signature(&self) -> String {
        format!("{}({})", self.full_name(), self.signature.render_params())
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for Method {}

impl Hash for Method {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token.hash(state);
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_constructors() {
        let void_sig = MethodSignature::void(vec![CilFlavor::I4]);
        assert_eq!(void_sig.params.len(), 1);
        assert!(void_sig.returns.is_none());

        let typed = MethodSignature::returning(vec![], CilFlavor::I8);
        assert_eq!(typed.returns, Some(CilFlavor::I8));

        assert!(MethodSignature::nullary().is_stack_neutral());
        assert!(!void_sig.is_stack_neutral());
        assert!(!typed.is_stack_neutral());
    }

    #[test]
    fn test_signature_rendering() {
        let sig = MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::R8], CilFlavor::I4);
        assert_eq!(sig.render_params(), "int32, float64");
        assert_eq!(sig.render_returns(), "int32");
        assert_eq!(MethodSignature::nullary().render_returns(), "void");
        assert_eq!(MethodSignature::nullary().render_params(), "");
    }

    #[test]
    fn test_method_identity_is_token() {
        let sig = MethodSignature::nullary();
        let a = Method::new(Token::method(1), "Helper", "Nothin", sig.clone());
        let b = Method::new(Token::method(1), "Renamed", "Other", sig.clone());
        let c = Method::new(Token::method(2), "Helper", "Nothin", sig);

        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn test_method_display() {
        let sig = MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::I4], CilFlavor::I4);
        let add = Method::new(Token::method(1), "Calculator", "Add", sig);
        assert_eq!(add.full_name(), "Calculator.Add");
        assert_eq!(add.display_signature(), "Calculator.Add(int32, int32)");
        assert_eq!(format!("{}", add), "Calculator.Add");
    }
}
