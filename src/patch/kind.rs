//! Injection kinds.
//!
//! The kind decides which machinery applies a descriptor: whole-method kinds go
//! through prefix/postfix installation, call-site kinds go through the weaver.
//! The reserved [`InjectionKind::Insert`] is rejected when descriptors are
//! registered, never silently ignored.

use strum::{Display, EnumIter};

/// Where a patch attaches to its target.
///
/// Displays using the uppercase wire names (`HEAD`, `RETURN`, `INVOKE`,
/// `REDIRECT`, `AFTER`, `INSERT`) that declaration surfaces and logs use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum InjectionKind {
    /// Run before the target's body; may suppress it
    Head,
    /// Run after the target's body; may rewrite the result
    Return,
    /// Insert a call before a matched call site inside the target
    Invoke,
    /// Replace a matched call site inside the target
    Redirect,
    /// Insert a call after a matched call site inside the target
    After,
    /// Reserved for raw instruction insertion; declared but not implemented
    Insert,
}

impl InjectionKind {
    /// True for kinds applied through prefix/postfix installation.
    #[must_use]
    pub fn is_whole_method(&self) -> bool {
        matches!(self, InjectionKind::Head | InjectionKind::Return)
    }

    /// True for kinds applied through call-site weaving.
    #[must_use]
    pub fn is_call_site(&self) -> bool {
        matches!(
            self,
            InjectionKind::Invoke | InjectionKind::Redirect | InjectionKind::After
        )
    }

    /// True for kinds the engine can apply at all.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, InjectionKind::Insert)
    }
}
