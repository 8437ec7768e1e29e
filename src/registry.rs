//! Pass-scoped descriptor registry.
//!
//! [`PatchRegistry::group`] takes the descriptors declared for one pass and
//! sorts them into two categories keyed by target method: whole-method patches
//! (HEAD and RETURN, installed as hooks) and call-site patches (INVOKE,
//! REDIRECT and AFTER, woven into the target's instruction buffer). Grouping
//! is also the validation boundary: descriptors with no resolved target, call
//! site descriptors with no selector, and descriptors using the reserved
//! INSERT kind never reach the appliers. Dropped descriptors are kept on a
//! rejection list so the orchestrator can report them.
//!
//! Nothing here deduplicates. Two descriptors naming the same target simply
//! land in the same group and surface later as a conflict.

use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    metadata::{method::MethodRc, token::Token},
    patch::PatchDescriptor,
    Error,
};

/// One target method and every descriptor queued against it, in discovery order.
#[derive(Debug)]
pub struct PatchGroup {
    /// The resolved target method.
    pub method: MethodRc,
    /// Descriptors aimed at the target, ordered as declared.
    pub descriptors: Vec<PatchDescriptor>,
}

/// Target-keyed groups for one patch category, iterated in first-seen order.
#[derive(Debug, Default)]
pub struct PatchGroups {
    index: HashMap<Token, usize>,
    groups: Vec<PatchGroup>,
}

impl PatchGroups {
    fn push(&mut self, method: MethodRc, descriptor: PatchDescriptor) {
        match self.index.get(&method.token) {
            Some(&at) => self.groups[at].descriptors.push(descriptor),
            None => {
                self.index.insert(method.token, self.groups.len());
                self.groups.push(PatchGroup {
                    method,
                    descriptors: vec![descriptor],
                });
            }
        }
    }

    /// Number of distinct targets in this category.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// `true` when no target has any queued descriptor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Looks up the group for a target token.
    #[must_use]
    pub fn get(&self, token: Token) -> Option<&PatchGroup> {
        self.index.get(&token).map(|&at| &self.groups[at])
    }

    /// Iterates groups in the order their targets were first seen.
    pub fn iter(&self) -> impl Iterator<Item = &PatchGroup> {
        self.groups.iter()
    }

    /// Removes every group whose target token is in `drop`, returning the
    /// removed groups in their original order.
    pub(crate) fn remove_targets(&mut self, drop: &[Token]) -> Vec<PatchGroup> {
        if drop.is_empty() {
            return Vec::new();
        }

        let mut removed = Vec::new();
        let mut kept = Vec::new();
        for group in self.groups.drain(..) {
            if drop.contains(&group.method.token) {
                removed.push(group);
            } else {
                kept.push(group);
            }
        }

        self.index.clear();
        for (at, group) in kept.iter().enumerate() {
            self.index.insert(group.method.token, at);
        }
        self.groups = kept;
        removed
    }
}

/// Grouped and validated descriptors for a single pass.
///
/// Built fresh inside every pass; nothing survives from one pass to the next.
///
/// # Examples
///
/// ```rust
/// use cilweave::patch::{InjectionKind, PatchCallable, PatchDescriptor};
/// use cilweave::metadata::{method::{Method, MethodSignature}, token::Token};
/// use cilweave::registry::PatchRegistry;
///
/// let target = Method::new(Token::method(1), "Calculator", "Add", MethodSignature::nullary());
/// let patch = Method::new(Token::method(80), "Patches", "Before", MethodSignature::nullary());
/// let callable = PatchCallable::new(patch, |_args, _slot| Ok(None));
///
/// let descriptor = PatchDescriptor::new(InjectionKind::Head, callable).with_target(target);
/// let registry = PatchRegistry::group(vec![descriptor]);
///
/// assert_eq!(registry.whole_method().len(), 1);
/// assert!(registry.call_site().is_empty());
/// assert!(registry.rejected().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct PatchRegistry {
    whole_method: PatchGroups,
    call_site: PatchGroups,
    rejected: Vec<(PatchDescriptor, Error)>,
}

impl PatchRegistry {
    /// Groups `descriptors` by target and category, dropping invalid ones.
    #[must_use]
    pub fn group(descriptors: Vec<PatchDescriptor>) -> Self {
        let mut registry = PatchRegistry::default();

        for descriptor in descriptors {
            if !descriptor.kind.is_supported() {
                registry.reject(descriptor, |d| Error::UnsupportedInjectionKind(d.kind));
                continue;
            }

            let Some(target) = descriptor.target.clone() else {
                registry.reject(descriptor, |d| {
                    Error::MissingTarget(d.callable.method.full_name())
                });
                continue;
            };

            if descriptor.kind.is_call_site() && descriptor.selector.is_none() {
                registry.reject(descriptor, |d| {
                    Error::MissingSelector(d.callable.method.full_name())
                });
                continue;
            }

            debug!("Queueing {} on {}", descriptor.kind, target.full_name());
            if descriptor.kind.is_whole_method() {
                registry.whole_method.push(target, descriptor);
            } else {
                registry.call_site.push(target, descriptor);
            }
        }

        registry
    }

    fn reject(&mut self, descriptor: PatchDescriptor, error: impl Fn(&PatchDescriptor) -> Error) {
        let error = error(&descriptor);
        warn!("Dropping {}: {}", descriptor.describe(), error);
        self.rejected.push((descriptor, error));
    }

    /// HEAD and RETURN groups.
    #[must_use]
    pub fn whole_method(&self) -> &PatchGroups {
        &self.whole_method
    }

    /// INVOKE, REDIRECT and AFTER groups.
    #[must_use]
    pub fn call_site(&self) -> &PatchGroups {
        &self.call_site
    }

    /// Descriptors dropped at the boundary, with the reason each was dropped.
    #[must_use]
    pub fn rejected(&self) -> &[(PatchDescriptor, Error)] {
        &self.rejected
    }

    pub(crate) fn whole_method_mut(&mut self) -> &mut PatchGroups {
        &mut self.whole_method
    }

    pub(crate) fn call_site_mut(&mut self) -> &mut PatchGroups {
        &mut self.call_site
    }
}
