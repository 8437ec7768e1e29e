//! Call-site instrumentation engine.
//!
//! Whole-method patches wrap a target from the outside; the weaver edits the
//! inside. Given the call-site descriptors queued against one target, it
//! rewrites the target's instruction buffer so that specific `call`
//! instructions gain a companion call before them (INVOKE), after them
//! (AFTER), or are replaced outright (REDIRECT). Which calls are affected is
//! driven by each descriptor's selector and its occurrence and start-index
//! counters.
//!
//! # Key Components
//!
//! - [`CodeCursor`] - index-addressed find/insert/replace over the buffer
//! - [`weave`] - the occurrence-scanning engine, one run per target group
//!
//! The weaver never talks to the host. The session wraps [`weave`] in a
//! transform closure and hands it to [`crate::host::PatchHost::transform_body`],
//! which owns atomicity (scratch copy, single-rewrite rule) and decides when
//! the new buffer becomes live.

mod cursor;
mod engine;

pub use cursor::CodeCursor;
pub use engine::weave;
