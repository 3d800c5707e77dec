//! Signed invocation-state tokens.
//!
//! This module is the security boundary of the engine. Component invocation
//! state (target name, input variables, site context) round-trips through
//! the browser as opaque, tamper-evident tokens:
//!
//! - [`TokenSigner`] is the signing seam; [`HmacTokenSigner`] is the default
//!   HMAC-SHA256 implementation.
//! - [`VariableCodec`] validates invocation variables against the shape
//!   rules (scalars and, policy permitting, arrays of scalars) and encodes
//!   them through the signer.
//!
//! Decoding an invalid or forged token fails closed: the raw value is never
//! trusted, and error values never carry decoded content.

mod codec;
mod signer;
mod value;

/// Reserved state keys under which signed tokens round-trip through the
/// browser. Exact strings matter: the render endpoint looks these up in
/// replayed request parameters.
pub mod keys {
    /// Key of the signed site/context discriminator.
    pub const SITE_ID: &str = "frond:siteId";

    /// Key of the signed component name (component-backed targets).
    pub const COMPONENT: &str = "frond:component";

    /// Key of the signed template path (template-backed targets).
    pub const TEMPLATE: &str = "frond:template";

    /// Query parameter carrying a signed action name.
    pub const ACTION: &str = "frond:action";

    /// Prefix of per-variable keys: `frond:variables[<name>]`.
    pub const VARIABLE_PREFIX: &str = "frond:variables";
}

pub use codec::{CodecError, VariableCodec};
pub use signer::{HmacTokenSigner, TokenError, TokenSigner};
pub use value::{Variable, VariableKind, VariableMap};
