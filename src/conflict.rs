//! Conflict detection between patches that share a target.
//!
//! Two descriptors of the same category aimed at the same method compete, and
//! what happens next is a policy decision owned by the session. Detection runs
//! after grouping and before any installation, so the [`ConflictPolicy::Error`]
//! policy can abort a pass while the host is still untouched.

use log::{error, warn};

use crate::{
    metadata::method::MethodRc,
    registry::{PatchGroups, PatchRegistry},
    Error, Result,
};

/// What a pass does when several patches compete for one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Log the competitors and apply all of them in discovery order. With
    /// several overwriting patches the last installed writer decides the
    /// observed result.
    #[default]
    Warn,
    /// Abort the pass with [`Error::ConflictDetected`] before anything is
    /// installed.
    Error,
    /// Drop every conflicting group; their targets report as skipped.
    SkipConflicts,
}

fn log_competitors(group: &crate::registry::PatchGroup) {
    warn!(
        "Multiple patches queued for {}",
        group.method.full_name()
    );
    for descriptor in &group.descriptors {
        warn!("  - {}", descriptor.callable.method.display_signature());
    }
}

fn resolve_category(groups: &mut PatchGroups, policy: ConflictPolicy) -> Result<Vec<MethodRc>> {
    let mut conflicted = Vec::new();
    for group in groups.iter() {
        if group.descriptors.len() > 1 {
            log_competitors(group);
            conflicted.push((group.method.clone(), group.descriptors.len()));
        }
    }

    match policy {
        ConflictPolicy::Warn => Ok(Vec::new()),
        ConflictPolicy::Error => match conflicted.first() {
            Some((method, count)) => {
                error!(
                    "Conflict policy is Error, aborting pass for {}",
                    method.full_name()
                );
                Err(Error::ConflictDetected {
                    target: method.full_name(),
                    count: *count,
                })
            }
            None => Ok(Vec::new()),
        },
        ConflictPolicy::SkipConflicts => {
            let tokens: Vec<_> = conflicted.iter().map(|(m, _)| m.token).collect();
            groups.remove_targets(&tokens);
            Ok(conflicted.into_iter().map(|(m, _)| m).collect())
        }
    }
}

/// Applies `policy` to every group in `registry`.
///
/// Returns the targets whose groups were dropped under
/// [`ConflictPolicy::SkipConflicts`], so the pass can record them as skipped.
///
/// # Errors
/// Returns [`Error::ConflictDetected`] for the first conflicted target when
/// the policy is [`ConflictPolicy::Error`].
pub fn resolve(registry: &mut PatchRegistry, policy: ConflictPolicy) -> Result<Vec<MethodRc>> {
    let mut skipped = resolve_category(registry.whole_method_mut(), policy)?;
    skipped.extend(resolve_category(registry.call_site_mut(), policy)?);
    Ok(skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{InjectionKind, PatchDescriptor};
    use crate::test::{create_callable, create_int_binop_method, create_void_method};

    fn conflicted_registry() -> (PatchRegistry, MethodRc) {
        let add = create_int_binop_method(1, "Calculator", "Add");
        let registry = PatchRegistry::group(vec![
            PatchDescriptor::new(InjectionKind::Head, create_callable(80, "One"))
                .with_target(add.clone()),
            PatchDescriptor::new(InjectionKind::Head, create_callable(81, "Two"))
                .with_target(add.clone()),
        ]);
        (registry, add)
    }

    #[test]
    fn test_single_descriptor_never_conflicts() {
        let add = create_int_binop_method(1, "Calculator", "Add");
        let mut registry = PatchRegistry::group(vec![PatchDescriptor::new(
            InjectionKind::Head,
            create_callable(80, "One"),
        )
        .with_target(add.clone())]);

        for policy in [
            ConflictPolicy::Warn,
            ConflictPolicy::Error,
            ConflictPolicy::SkipConflicts,
        ] {
            let skipped = resolve(&mut registry, policy).unwrap();
            assert!(skipped.is_empty());
            assert!(registry.whole_method().get(add.token).is_some());
        }
    }

    #[test]
    fn test_warn_keeps_every_competitor() {
        let (mut registry, add) = conflicted_registry();
        let skipped = resolve(&mut registry, ConflictPolicy::Warn).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(
            registry.whole_method().get(add.token).unwrap().descriptors.len(),
            2
        );
    }

    #[test]
    fn test_error_policy_aborts() {
        let (mut registry, _add) = conflicted_registry();
        let result = resolve(&mut registry, ConflictPolicy::Error);
        assert!(matches!(
            result,
            Err(Error::ConflictDetected { count: 2, .. })
        ));
    }

    #[test]
    fn test_skip_conflicts_drops_the_whole_group() {
        let (mut registry, add) = conflicted_registry();
        let skipped = resolve(&mut registry, ConflictPolicy::SkipConflicts).unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].token, add.token);
        assert!(registry.whole_method().get(add.token).is_none());
    }

    #[test]
    fn test_categories_resolved_independently() {
        let add = create_int_binop_method(1, "Calculator", "Add");
        let caller = create_void_method(2, "Caller", "CallHelper");

        let mut registry = PatchRegistry::group(vec![
            PatchDescriptor::new(InjectionKind::Head, create_callable(80, "One"))
                .with_target(add.clone()),
            PatchDescriptor::new(InjectionKind::Invoke, create_callable(81, "Two"))
                .with_target(caller.clone())
                .with_selector("Helper.Nothin"),
            PatchDescriptor::new(InjectionKind::Invoke, create_callable(82, "Three"))
                .with_target(caller.clone())
                .with_selector("Helper.Nothin"),
        ]);

        let skipped = resolve(&mut registry, ConflictPolicy::SkipConflicts).unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].token, caller.token);
        assert!(registry.whole_method().get(add.token).is_some());
        assert!(registry.call_site().get(caller.token).is_none());
    }
}
