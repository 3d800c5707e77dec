//! Error types for attribute rewriting.

use thiserror::Error;

/// Errors that abort an attribute rewrite, and with it the whole render.
///
/// Both variants are deterministic input-shape problems: a malformed
/// JSON-bodied directive is never silently dropped (doing so could
/// desynchronize client and server state), and a script-executing URI
/// scheme inside a JSON-bodied directive is rejected before parsing to
/// close an injection vector.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// A JSON-bodied directive value (or a previously committed wire value
    /// being merged into) failed to parse as a JSON object.
    #[error("the \"{attribute}\" attribute must contain a JSON object: {detail}")]
    MalformedJsonDirective {
        /// The attribute whose value failed to parse.
        attribute: String,
        /// Parser detail for the diagnostic.
        detail: String,
    },

    /// A JSON-bodied directive value carries a disallowed URI scheme.
    #[error(
        "the \"{attribute}\" attribute may not contain a \"javascript:\" prefix; \
         use a JSON encoded value instead"
    )]
    UnsafeUriScheme {
        /// The attribute carrying the rejected value.
        attribute: String,
    },
}
