//! Variable validation and token encoding.

use thiserror::Error;

use super::signer::{TokenError, TokenSigner};
use super::value::{Variable, VariableKind};
use crate::config::ArrayPolicy;

/// Errors raised while encoding or decoding invocation variables.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The variable's value is of a kind that may never cross the browser
    /// boundary. The name identifies the offending variable so the caller
    /// can render a precise diagnostic in place of the component.
    #[error("the variable \"{name}\" is of a kind ({kind}) that cannot be encoded")]
    InvalidVariable {
        /// Name of the offending variable.
        name: String,
        /// The rejected category.
        kind: VariableKind,
    },

    /// Token verification failed on decode.
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Validates and encodes invocation variables into signed tokens.
///
/// Stateless beyond its borrowed collaborators; every call is a pure
/// transformation of its inputs plus one signing operation.
pub struct VariableCodec<'a> {
    signer: &'a dyn TokenSigner,
    array_policy: ArrayPolicy,
}

impl<'a> VariableCodec<'a> {
    /// Creates a codec over a signer with the given array policy.
    #[must_use]
    pub fn new(signer: &'a dyn TokenSigner, array_policy: ArrayPolicy) -> Self {
        Self {
            signer,
            array_policy,
        }
    }

    /// Validates a variable against the shape rules without encoding it.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidVariable`] naming the offending
    /// variable and its rejected kind. For arrays under the lenient policy
    /// every leaf is validated; a single invalid leaf fails the whole
    /// variable.
    pub fn validate(&self, name: &str, value: &Variable) -> Result<(), CodecError> {
        let invalid = |kind| CodecError::InvalidVariable {
            name: name.to_string(),
            kind,
        };

        match value {
            Variable::Element(_) => Err(invalid(VariableKind::Element)),
            Variable::Model(_) => Err(invalid(VariableKind::Model)),
            Variable::Object(_) => Err(invalid(VariableKind::Object)),
            Variable::Array(items) => match self.array_policy {
                ArrayPolicy::Strict => Err(invalid(VariableKind::Array)),
                ArrayPolicy::Lenient => {
                    for item in items {
                        self.validate(name, item)?;
                    }
                    Ok(())
                }
            },
            Variable::Null
            | Variable::Bool(_)
            | Variable::Int(_)
            | Variable::Float(_)
            | Variable::String(_) => Ok(()),
        }
    }

    /// Validates and encodes a variable into a signed token.
    ///
    /// The value is first canonicalized to a string (booleans and numbers
    /// stringified, arrays JSON-serialized, null empty) so that decode
    /// followed by re-encode is stable.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidVariable`] when validation fails; no
    /// signing happens in that case.
    pub fn encode(&self, name: &str, value: &Variable) -> Result<String, CodecError> {
        self.validate(name, value)?;
        Ok(self.signer.sign(&canonical_string(value)))
    }

    /// Verifies a token and returns the canonical string it encodes.
    ///
    /// # Errors
    ///
    /// Fails closed on any malformed or forged token; the raw token value
    /// is never returned.
    pub fn decode(&self, token: &str) -> Result<String, CodecError> {
        Ok(self.signer.unsign(token)?)
    }
}

/// Canonical string form of an encodable value. Callers must have
/// validated the value first; unencodable kinds canonicalize to the empty
/// string rather than panic.
fn canonical_string(value: &Variable) -> String {
    match value {
        Variable::Null => String::new(),
        Variable::Bool(b) => b.to_string(),
        Variable::Int(n) => n.to_string(),
        Variable::Float(n) => n.to_string(),
        Variable::String(s) => s.clone(),
        Variable::Array(_) | Variable::Object(_) => value
            .to_json()
            .and_then(|json| serde_json::to_string(&json).ok())
            .unwrap_or_default(),
        Variable::Element(_) | Variable::Model(_) => String::new(),
    }
}
