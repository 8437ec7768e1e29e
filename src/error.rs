use thiserror::Error;

use crate::{metadata::token::Token, patch::InjectionKind};

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while registering patch
/// descriptors, resolving conflicts, synthesizing result shims, installing whole-method hooks,
/// and weaving call sites. Each variant provides specific context about the failure mode to
/// enable appropriate error handling.
///
/// # Error Categories
///
/// ## Descriptor Validation Errors
/// - [`Error::MissingTarget`] - Descriptor arrived without a resolved target method
/// - [`Error::MissingSelector`] - Call-site descriptor arrived without a selector
/// - [`Error::UnsupportedInjectionKind`] - Reserved or unknown injection kind
///
/// ## Application Errors
/// - [`Error::ConflictDetected`] - Multiple patches compete for one target under the `Error` policy
/// - [`Error::TypeMismatch`] - Patch result type disagrees with the target's
/// - [`Error::ShimConstructionFailed`] - No argument-forwarding plan exists for a result shim
/// - [`Error::HostInstallationFailed`] - The host runtime rejected an installation
/// - [`Error::StackUnsafe`] - A splice would corrupt the operand stack
///
/// ## Host Runtime Errors
/// - [`Error::DuplicateMethod`] - Method table already holds this token
/// - [`Error::MethodNotFound`] - Invoked token has no method table entry
/// - [`Error::ArgumentMismatch`] - Invocation arity disagrees with the signature
/// - [`Error::StackUnderflow`] - Evaluation popped an empty operand stack
/// - [`Error::UninitializedLocal`] - Local read before any store without init semantics
/// - [`Error::RecursionLimit`] - Maximum nested-call depth exceeded
/// - [`Error::LockError`] - Thread synchronization failure
///
/// # Examples
///
/// ```rust
/// use cilweave::{Error, Result};
///
/// fn report(outcome: Result<()>) {
///     match outcome {
///         Ok(()) => println!("pass completed"),
///         Err(Error::ConflictDetected { target, count }) => {
///             eprintln!("{} patches compete for {}", count, target);
///         }
///         Err(Error::TypeMismatch { expected, found }) => {
///             eprintln!("result type mismatch: expected {}, found {}", expected, found);
///         }
///         Err(e) => {
///             eprintln!("other error: {}", e);
///         }
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Descriptor validation Errors
    /// A patch descriptor arrived without a resolved target method.
    ///
    /// Upstream declaration scanning could not resolve the method the patch
    /// names. The registry drops such descriptors with a warning; they never
    /// participate in grouping or application.
    ///
    /// The associated value names the patch callable that lacked a target.
    #[error("Patch '{0}' has no resolved target method")]
    MissingTarget(String),

    /// A call-site patch descriptor arrived without a call-site selector.
    ///
    /// INVOKE, REDIRECT and AFTER descriptors are meaningless without the
    /// `Type.Member` (or bare `Member`) selector naming the call to instrument.
    /// The registry drops such descriptors with a warning.
    #[error("Call-site patch '{0}' has no selector")]
    MissingSelector(String),

    /// The descriptor uses a reserved or unknown injection kind.
    ///
    /// `INSERT` is declared but intentionally unimplemented; it is rejected when
    /// descriptors are registered. The same error doubles as the internal signal
    /// for a kind reaching a dispatch arm it should have been filtered from.
    #[error("Injection kind {0} is not supported")]
    UnsupportedInjectionKind(InjectionKind),

    // Application Errors
    /// Multiple patches compete for the same target method.
    ///
    /// Raised only under [`crate::ConflictPolicy::Error`], in which case the
    /// pass aborts before any patch of the pass has been installed. Under the
    /// other policies conflicts are logged or skipped instead.
    ///
    /// # Fields
    ///
    /// * `target` - Rendered name of the contested target method
    /// * `count` - How many descriptors competed for it
    #[error("{count} patches compete for '{target}'")]
    ConflictDetected {
        /// Rendered name of the contested target method
        target: String,
        /// How many descriptors competed for it
        count: usize,
    },

    /// The patch's declared result type disagrees with the target's.
    ///
    /// An overwriting HEAD patch that produces a typed value must produce the
    /// exact result type of the method it replaces. The offending descriptor is
    /// skipped; the pass continues with the remaining descriptors.
    ///
    /// # Fields
    ///
    /// * `expected` - The target method's result type
    /// * `found` - The patch callable's declared result type
    #[error("Result type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The target method's result type
        expected: String,
        /// The patch callable's declared result type
        found: String,
    },

    /// No argument-forwarding plan could be constructed for a result shim.
    ///
    /// The shim forwards the target's leading arguments to the patch callable.
    /// Construction fails when the callable declares more parameters than the
    /// target supplies, or a parameter type disagrees positionally. The
    /// descriptor is skipped; the pass continues.
    #[error("Cannot construct result shim for '{patch}': {reason}")]
    ShimConstructionFailed {
        /// Rendered name of the patch callable
        patch: String,
        /// Why no forwarding plan exists
        reason: String,
    },

    /// The host runtime rejected a hook installation or body transform.
    ///
    /// Failures are isolated per target: the error is recorded in the pass
    /// report for that target and the pass continues with other targets.
    #[error("Host rejected installation on '{target}': {reason}")]
    HostInstallationFailed {
        /// Rendered name of the target method
        target: String,
        /// The host's reason for rejecting
        reason: String,
    },

    /// A planned splice would corrupt the operand stack.
    ///
    /// INVOKE and AFTER splices must be stack-neutral (the spliced callable
    /// takes no parameters and returns nothing), and a REDIRECT replacement
    /// must consume and produce exactly what the replaced call did. The whole
    /// transform for the affected target is abandoned.
    #[error("Splice is not stack-safe: {0}")]
    StackUnsafe(String),

    // Host runtime Errors
    /// The method table already holds an entry for this token.
    ///
    /// The associated [`Token`] identifies the colliding method.
    #[error("Method table already holds {0}")]
    DuplicateMethod(Token),

    /// No method table entry exists for the invoked token.
    ///
    /// The associated [`Token`] identifies the method that was not found.
    #[error("No method registered for {0}")]
    MethodNotFound(Token),

    /// An invocation supplied the wrong number of arguments.
    ///
    /// # Fields
    ///
    /// * `expected` - Parameter count the signature declares
    /// * `found` - Argument count the caller supplied
    #[error("Argument count mismatch: expected {expected}, found {found}")]
    ArgumentMismatch {
        /// Parameter count the signature declares
        expected: usize,
        /// Argument count the caller supplied
        found: usize,
    },

    /// Evaluation popped a value off an empty operand stack.
    ///
    /// Indicates a malformed method body; well-formed bodies produced by the
    /// weaver preserve stack balance by construction.
    #[error("Operand stack underflow during evaluation")]
    StackUnderflow,

    /// A local variable was read before any value was stored into it.
    ///
    /// Bodies that set the locals-initialization flag read zero-initialized
    /// locals instead of failing. The associated value is the local's index.
    #[error("Local variable {0} read before initialization")]
    UninitializedLocal(u16),

    /// Recursion limit reached.
    ///
    /// To prevent stack overflow when woven bodies call into other methods
    /// (and patched methods call each other), a maximum nested-call depth is
    /// enforced. This error indicates that limit was exceeded.
    ///
    /// The associated value shows the recursion limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// Failed to lock target.
    ///
    /// This error occurs when thread synchronization fails, typically
    /// when trying to acquire a mutex or rwlock that is in an invalid state.
    #[error("Failed to lock target")]
    LockError,

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories or for
    /// wrapping external failures with additional context.
    #[error("{0}")]
    Error(String),
}
