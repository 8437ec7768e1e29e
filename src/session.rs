//! Pass orchestration.
//!
//! A [`PatchSession`] owns one configuration knob, the [`ConflictPolicy`], and
//! drives complete passes: group and validate the declared descriptors,
//! resolve conflicts, install whole-method hooks, weave call-site groups, and
//! report what happened to every target. All pass state lives inside
//! [`PatchSession::apply`]; two sessions never share engine state, and a
//! session may run any number of passes against the same or different hosts.
//!
//! Per-descriptor and per-target problems are contained: they are logged,
//! recorded in the [`PassResult`], and the rest of the pass continues. The
//! only error that escapes [`PatchSession::apply`] itself is
//! [`Error::ConflictDetected`] under [`ConflictPolicy::Error`], which aborts
//! before anything was installed.
//!
//! # Examples
//!
//! ```rust
//! use cilweave::assembly::{opcodes, MethodBody};
//! use cilweave::host::{HostRuntime, Value};
//! use cilweave::metadata::{method::{Method, MethodSignature}, token::Token, typesystem::CilFlavor};
//! use cilweave::patch::{InjectionKind, PatchCallable, PatchDescriptor};
//! use cilweave::session::{PatchSession, PatchStatus};
//!
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
//! let report = session.apply(
//!     &host,
//!     vec![PatchDescriptor::new(InjectionKind::Head, fixed)
//!         .with_target(add.clone())
//!         .with_overwriting(true)],
//! )?;
//!
//! assert_eq!(report.status(add.token), Some(&PatchStatus::Applied));
//! assert_eq!(
//!     host.invoke(add.token, &[Value::I32(2), Value::I32(3)])?,
//!     Some(Value::I32(68)),
//! );
//! # Ok::<(), cilweave::Error>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, error, warn};

use crate::{
    applier,
    conflict::{self, ConflictPolicy},
    host::{NativeFn, PatchHost, TransformFn, Value},
    metadata::{method::MethodRc, token::Token},
    patch::{PatchCallable, PatchDescriptor},
    registry::PatchRegistry,
    weaver, Error, Result,
};

/// What one pass did to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchStatus {
    /// Every surviving descriptor for the target was installed.
    Applied,
    /// Nothing was installed, with the reason (conflict pruning, descriptor
    /// validation).
    Skipped(String),
    /// Installation or weaving failed; the reason carries the first error.
    Failed(String),
}

impl PatchStatus {
    fn rank(&self) -> u8 {
        match self {
            PatchStatus::Skipped(_) => 0,
            PatchStatus::Applied => 1,
            PatchStatus::Failed(_) => 2,
        }
    }
}

impl fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchStatus::Applied => write!(f, "applied"),
            PatchStatus::Skipped(reason) => write!(f, "skipped ({reason})"),
            PatchStatus::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Per-target record in a [`PassResult`].
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    /// The target method.
    pub method: MethodRc,
    /// What the pass did to it.
    pub status: PatchStatus,
}

/// Report of one pass, one entry per touched target.
///
/// When a target collects several statuses (several descriptors, or hooks and
/// weaving together), the worse one wins: a failure dominates, an application
/// beats a skip, and the first skip reason is kept.
#[derive(Debug, Default)]
pub struct PassResult {
    targets: HashMap<Token, TargetOutcome>,
}

impl PassResult {
    fn record(&mut self, method: &MethodRc, status: PatchStatus) {
        match self.targets.entry(method.token) {
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                if status.rank() > entry.get().status.rank() {
                    entry.get_mut().status = status;
                }
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(TargetOutcome {
                    method: method.clone(),
                    status,
                });
            }
        }
    }

    /// Status for one target token, `None` when the pass never touched it.
    #[must_use]
    pub fn status(&self, token: Token) -> Option<&PatchStatus> {
        self.targets.get(&token).map(|outcome| &outcome.status)
    }

    /// Iterates every per-target outcome, in no particular order.
    pub fn outcomes(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.targets.values()
    }

    /// Number of targets the pass touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// `true` when the pass touched no target.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// `true` when every touched target reports [`PatchStatus::Applied`].
    #[must_use]
    pub fn all_applied(&self) -> bool {
        self.targets
            .values()
            .all(|outcome| outcome.status == PatchStatus::Applied)
    }

    fn count(&self, rank: u8) -> usize {
        self.targets
            .values()
            .filter(|outcome| outcome.status.rank() == rank)
            .count()
    }
}

fn as_native(callable: &PatchCallable) -> NativeFn {
    let implementation = callable.implementation();
    Arc::new(move |args: &[Value]| {
        let mut slot = None;
        let value = implementation(args, &mut slot)?;
        Ok(value.or(slot))
    })
}

fn skips_descriptor(error: &Error) -> bool {
    matches!(
        error,
        Error::TypeMismatch { .. } | Error::ShimConstructionFailed { .. }
    )
}

/// Applies declared patches to a host, one complete pass at a time.
pub struct PatchSession {
    policy: ConflictPolicy,
}

impl PatchSession {
    /// Creates a session with the default [`ConflictPolicy::Warn`].
    #[must_use]
    pub fn new() -> Self {
        PatchSession {
            policy: ConflictPolicy::default(),
        }
    }

    /// Creates a session with an explicit conflict policy.
    #[must_use]
    pub fn with_policy(policy: ConflictPolicy) -> Self {
        PatchSession { policy }
    }

    /// The session's current conflict policy.
    #[must_use]
    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Changes the conflict policy for subsequent passes.
    pub fn set_policy(&mut self, policy: ConflictPolicy) {
        self.policy = policy;
    }

    /// Runs one pass: groups `descriptors`, resolves conflicts, installs
    /// whole-method hooks and weaves call-site groups on `host`.
    ///
    /// Descriptors are consumed; a pass leaves nothing behind in the session.
    ///
    /// # Errors
    /// Returns [`Error::ConflictDetected`] under [`ConflictPolicy::Error`]
    /// when any two descriptors compete for a target, before anything was
    /// installed. Every other problem is recorded per target in the returned
    /// [`PassResult`].
    pub fn apply(
        &self,
        host: &dyn PatchHost,
        descriptors: Vec<PatchDescriptor>,
    ) -> Result<PassResult> {
        let mut registry = PatchRegistry::group(descriptors);
        let mut result = PassResult::default();

        for (descriptor, error) in registry.rejected() {
            if let Some(target) = descriptor.target.as_ref() {
                result.record(target, PatchStatus::Skipped(error.to_string()));
            }
        }

        for method in conflict::resolve(&mut registry, self.policy)? {
            result.record(&method, PatchStatus::Skipped("conflicting patches".to_string()));
        }

        self.apply_whole_method(host, &registry, &mut result);
        self.apply_call_sites(host, &registry, &mut result);

        debug!(
            "Pass finished: {} applied, {} skipped, {} failed",
            result.count(1),
            result.count(0),
            result.count(2)
        );
        Ok(result)
    }

    fn apply_whole_method(
        &self,
        host: &dyn PatchHost,
        registry: &PatchRegistry,
        result: &mut PassResult,
    ) {
        for group in registry.whole_method().iter() {
            for descriptor in &group.descriptors {
                match applier::apply_descriptor(host, &group.method, descriptor) {
                    Ok(()) => result.record(&group.method, PatchStatus::Applied),
                    Err(error) if skips_descriptor(&error) => {
                        warn!("Skipping {}: {error}", descriptor.describe());
                        result.record(&group.method, PatchStatus::Skipped(error.to_string()));
                    }
                    Err(error) => {
                        error!("Failed to apply {}: {error}", descriptor.describe());
                        result.record(&group.method, PatchStatus::Failed(error.to_string()));
                    }
                }
            }
        }
    }

    fn apply_call_sites(
        &self,
        host: &dyn PatchHost,
        registry: &PatchRegistry,
        result: &mut PassResult,
    ) {
        'groups: for group in registry.call_site().iter() {
            for descriptor in &group.descriptors {
                if let Err(error) =
                    host.register_native(&descriptor.callable.method, as_native(&descriptor.callable))
                {
                    error!(
                        "Failed to register {} for weaving: {error}",
                        descriptor.callable.method.full_name()
                    );
                    result.record(&group.method, PatchStatus::Failed(error.to_string()));
                    continue 'groups;
                }
            }

            let transform: TransformFn<'_> =
                Box::new(|body| weaver::weave(&group.method, &group.descriptors, body));
            match host.transform_body(&group.method, transform) {
                Ok(()) => result.record(&group.method, PatchStatus::Applied),
                Err(error) => {
                    error!("Failed to weave {}: {error}", group.method.full_name());
                    result.record(&group.method, PatchStatus::Failed(error.to_string()));
                }
            }
        }
    }
}

impl Default for PatchSession {
    fn default() -> Self {
        Self::new()
    }
}
