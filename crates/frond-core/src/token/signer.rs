//! HMAC-SHA256 token signing and verification.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur when verifying a token.
///
/// Neither variant carries the token or its decoded content; forged input
/// must never leak into logs or error messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not structurally valid (wrong shape, bad encoding).
    #[error("malformed token")]
    Malformed,

    /// The token's authentication tag does not verify.
    #[error("token verification failed")]
    Forged,
}

/// The signing seam consumed by the codec and the invocation builder.
///
/// `sign` must produce a token from which `unsign` can recover the exact
/// payload, and `unsign` must reject any token not produced by `sign` with
/// the same secret.
pub trait TokenSigner {
    /// Signs `data`, returning an opaque token embedding the payload.
    fn sign(&self, data: &str) -> String;

    /// Verifies a token and returns the embedded payload.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Malformed`] for structurally invalid tokens
    /// and [`TokenError::Forged`] when the authentication tag does not
    /// verify. Both must be treated as request-rejecting failures.
    fn unsign(&self, token: &str) -> Result<String, TokenError>;
}

/// Default [`TokenSigner`] backed by HMAC-SHA256.
///
/// Token layout: `base64url(payload) "." base64url(tag)` where the tag is
/// `HMAC-SHA256(key, payload)`. Tag comparison is constant-time.
pub struct HmacTokenSigner {
    key: Vec<u8>,
}

impl HmacTokenSigner {
    /// Creates a signer from a secret key. Any key length is accepted;
    /// HMAC handles padding and hashing internally.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    fn tag(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

impl TokenSigner for HmacTokenSigner {
    fn sign(&self, data: &str) -> String {
        let payload = URL_SAFE_NO_PAD.encode(data.as_bytes());
        let tag = URL_SAFE_NO_PAD.encode(self.tag(data.as_bytes()));
        format!("{payload}.{tag}")
    }

    fn unsign(&self, token: &str) -> Result<String, TokenError> {
        let (payload_b64, tag_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed)?;
        let claimed_tag = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| TokenError::Malformed)?;

        let expected_tag = self.tag(&payload);
        if !bool::from(expected_tag.ct_eq(&claimed_tag)) {
            return Err(TokenError::Forged);
        }

        String::from_utf8(payload).map_err(|_| TokenError::Malformed)
    }
}
