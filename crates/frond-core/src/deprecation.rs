//! Deprecation reporting collaborator.
//!
//! The rewriter reports use of obsolete directives through this seam. The
//! notification is fire-and-forget: it must never alter rewrite output, and
//! it is the only observable side effect of the rewrite path.

/// Receives deprecation notices from the rewriter, one per occurrence.
pub trait DeprecationLogger {
    /// Records that the deprecated feature `feature_id` was used.
    fn notify(&self, feature_id: &str, message: &str);
}

/// Default logger that emits a `tracing` warning per occurrence.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDeprecationLogger;

impl DeprecationLogger for TracingDeprecationLogger {
    fn notify(&self, feature_id: &str, message: &str) {
        tracing::warn!(feature_id, "{message}");
    }
}

/// Logger that discards all notices. Useful for callers that have already
/// migrated and in tests that do not assert on deprecations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDeprecationLogger;

impl DeprecationLogger for NullDeprecationLogger {
    fn notify(&self, _feature_id: &str, _message: &str) {}
}
