//! Patch descriptors.
//!
//! A descriptor is the unit of intent handed to a pass: which method to patch,
//! how to attach, and the callable to attach. Descriptors are plain data; all
//! validation happens when a pass registers them, so a malformed descriptor
//! costs a warning and a skipped entry rather than an aborted pass.

use std::fmt;

use crate::metadata::method::MethodRc;
use crate::patch::{CallSiteSelector, InjectionKind, PatchCallable};

/// Fires a call-site patch at every eligible match.
pub const EVERY_OCCURRENCE: u32 = 0;

/// One declared patch: target, attachment and the code to attach.
///
/// Built with the `with_*` methods from a kind and a callable. The call-site
/// fields (`selector`, `occurrence`, `start_index`) are meaningful only for
/// [`InjectionKind::Invoke`], [`InjectionKind::Redirect`] and
/// [`InjectionKind::After`]; `overwriting` is meaningful only for
/// [`InjectionKind::Head`]. Both counters are 1-based with `0` as the
/// "unrestricted" value: `occurrence == 0` fires at every eligible match and
/// `start_index == 0` starts eligibility at the first match.
#[derive(Debug, Clone)]
pub struct PatchDescriptor {
    /// The method to patch, `None` when upstream resolution failed
    pub target: Option<MethodRc>,
    /// How the patch attaches
    pub kind: InjectionKind,
    /// Which call inside the target to instrument (call-site kinds only)
    pub selector: Option<CallSiteSelector>,
    /// Whether a HEAD patch replaces the original body
    pub overwriting: bool,
    /// 1-based eligible match to fire at, `0` for all
    pub occurrence: u32,
    /// 1-based absolute match eligibility starts at, `0` for the first
    pub start_index: u32,
    /// The code to attach
    pub callable: PatchCallable,
}

impl PatchDescriptor {
    /// Creates a descriptor with no target, no selector and unrestricted counters.
    #[must_use]
    pub fn new(kind: InjectionKind, callable: PatchCallable) -> Self {
        PatchDescriptor {
            target: None,
            kind,
            selector: None,
            overwriting: false,
            occurrence: EVERY_OCCURRENCE,
            start_index: 0,
            callable,
        }
    }

    /// Sets the resolved target method.
    #[must_use]
    pub fn with_target(mut self, target: MethodRc) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the call-site selector.
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<CallSiteSelector>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Marks a HEAD patch as replacing the original body.
    #[must_use]
    pub fn with_overwriting(mut self, overwriting: bool) -> Self {
        self.overwriting = overwriting;
        self
    }

    /// Restricts firing to the given 1-based eligible match.
    #[must_use]
    pub fn with_occurrence(mut self, occurrence: u32) -> Self {
        self.occurrence = occurrence;
        self
    }

    /// Ignores matches before the given 1-based absolute position.
    #[must_use]
    pub fn with_start_index(mut self, start_index: u32) -> Self {
        self.start_index = start_index;
        self
    }

    /// Renders the descriptor for logs: `HEAD on Calculator.Add using Patches.Fixed`.
    #[must_use]
    pub fn describe(&self) -> String {
        let target = self
            .target
            .as_ref()
            .map_or_else(|| "<unresolved>".to_string(), |t| t.full_name());
        format!(
            "{} on {} using {}",
            self.kind,
            target,
            self.callable.method.full_name()
        )
    }
}

impl fmt::Display for PatchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
