//! Replaying invocation state from signed tokens.
//!
//! On a refresh request the browser sends back the `frond:*` parameters the
//! builder emitted. Every one of them is a signed token; a single forged or
//! corrupt token rejects the whole request. Decoded content is never placed
//! in error values.

use thiserror::Error;

use super::TargetKind;
use crate::token::{TokenError, TokenSigner, keys};

/// Errors raised while reconstructing invocation state.
#[derive(Debug, Error)]
pub enum StateError {
    /// No component or template target token was present.
    #[error("replayed state carries no target token")]
    MissingTarget,

    /// A token failed verification.
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// The replayed render target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationTarget {
    /// Component or template.
    pub kind: TargetKind,
    /// The verified target name.
    pub name: String,
}

/// The full set of data needed to replay a component render.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationState {
    /// The verified render target.
    pub target: InvocationTarget,
    /// The verified site/context discriminator, when present.
    pub site_id: Option<String>,
    /// Verified variables in submission order, in canonical string form.
    pub variables: Vec<(String, String)>,
}

impl InvocationState {
    /// Reconstructs invocation state from replayed `(key, token)` pairs.
    ///
    /// Keys outside the `frond:*` namespace are ignored; they belong to
    /// the host request, not to this engine.
    ///
    /// # Errors
    ///
    /// Fails closed with [`StateError::Token`] on the first forged or
    /// corrupt token, and with [`StateError::MissingTarget`] when no
    /// target token is present.
    pub fn from_values<'v>(
        values: impl IntoIterator<Item = (&'v str, &'v str)>,
        signer: &dyn TokenSigner,
    ) -> Result<Self, StateError> {
        let mut target = None;
        let mut site_id = None;
        let mut variables = Vec::new();

        for (key, token) in values {
            if key == keys::SITE_ID {
                site_id = Some(signer.unsign(token)?);
            } else if key == keys::COMPONENT {
                target = Some(InvocationTarget {
                    kind: TargetKind::Component,
                    name: signer.unsign(token)?,
                });
            } else if key == keys::TEMPLATE {
                target = Some(InvocationTarget {
                    kind: TargetKind::Template,
                    name: signer.unsign(token)?,
                });
            } else if let Some(name) = variable_name(key) {
                variables.push((name.to_string(), signer.unsign(token)?));
            }
        }

        Ok(Self {
            target: target.ok_or(StateError::MissingTarget)?,
            site_id,
            variables,
        })
    }
}

/// Verifies a signed action token from the render endpoint's query string.
///
/// # Errors
///
/// Fails closed on forged or corrupt tokens.
pub fn decode_action(token: &str, signer: &dyn TokenSigner) -> Result<String, TokenError> {
    signer.unsign(token)
}

/// Extracts `<name>` from a `frond:variables[<name>]` key.
fn variable_name(key: &str) -> Option<&str> {
    key.strip_prefix(keys::VARIABLE_PREFIX)?
        .strip_prefix('[')?
        .strip_suffix(']')
}
