//! Request signing with detached ES512 JWS.
//!
//! Mutating API calls carry a `Tl-Signature` header: a JWS over a canonical
//! rendering of the request, with the payload detached. The canonical form is
//!
//! ```text
//! {METHOD} {path}\n
//! {Header-Name}: {value}\n      (one line per signed header, in order)
//! {body}
//! ```
//!
//! where the method is upper-cased and trailing slashes are stripped from the
//! path. The JWS protected header names the key (`kid`), the protocol version
//! (`tl_version`) and the signed header names in order (`tl_headers`), so a
//! verifier can rebuild the exact same string.
//!
//! ECDSA signatures are randomized: signing the same request twice yields two
//! different, equally valid signatures.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use paywire::signing::{RequestSigner, RequestVerifier, SigningKey};
//!
//! # fn main() -> paywire::Result<()> {
//! let key = Arc::new(SigningKey::generate("my-kid")?);
//! let signer = RequestSigner::new(Arc::clone(&key));
//! let headers = [("Idempotency-Key", "idemp-1")];
//! let body = br#"{"amount_in_minor":100}"#;
//!
//! let signature = signer.sign_request("post", "/v3/payments/", &headers, body)?;
//!
//! let verifier = RequestVerifier::from_signing_key(&key)?;
//! verifier.verify(&signature, "POST", "/v3/payments", &headers, body)?;
//! # Ok(())
//! # }
//! ```

mod key;
mod signer;
mod verifier;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

pub use self::{key::SigningKey, signer::RequestSigner, verifier::RequestVerifier};
use crate::error::{PaywireError, Result};

/// HTTP header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "Tl-Signature";

/// JWS algorithm used for request signatures.
pub const ALGORITHM: &str = "ES512";

/// Signing protocol version advertised in `tl_version`.
pub const PROTOCOL_VERSION: &str = "2";

/// Protected header of a request signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// Signature algorithm, always `ES512`.
    pub alg: String,
    /// Signing key id.
    pub kid: String,
    /// Signing protocol version.
    pub tl_version: String,
    /// Comma-separated names of the signed headers, in signing order.
    #[serde(default)]
    pub tl_headers: String,
    /// URL of the JWKS holding the public key (webhook signatures).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jku: Option<String>,
}

impl JwsHeader {
    /// Signed header names in order.
    pub fn signed_headers(&self) -> impl Iterator<Item = &str> {
        self.tl_headers.split(',').map(str::trim).filter(|name| !name.is_empty())
    }
}

/// Signs a request with `key`.
///
/// Convenience wrapper over [`RequestSigner::sign_request`]; the body may be
/// absent for requests without one.
///
/// # Errors
///
/// See [`RequestSigner::sign_request`].
pub fn sign(
    key: &SigningKey,
    method: &str,
    path: &str,
    body: Option<&[u8]>,
    signed_headers: &[(&str, &str)],
) -> Result<String> {
    signer::sign_with(key, None, method, path, signed_headers, body.unwrap_or_default())
}

/// Decodes the protected header of a detached JWS without verifying it.
///
/// Used to route verification, for example to pick the JWKS named by `jku`.
///
/// # Errors
///
/// Returns [`PaywireError::VerificationFailed`] if `signature` is not a
/// detached JWS, and [`PaywireError::CryptoError`] if its header cannot be decoded.
pub fn extract_jws_header(signature: &str) -> Result<JwsHeader> {
    let (header_b64, _) = split_detached(signature)?;
    decode_header(header_b64)
}

/// Renders the canonical signing payload.
///
/// # Examples
///
/// ```
/// let payload = paywire::signing::signing_payload(
///     "post",
///     "/payouts/",
///     &[("Idempotency-Key", "abc")],
///     b"{}",
/// );
/// assert_eq!(payload, b"POST /payouts\nIdempotency-Key: abc\n{}");
/// ```
#[must_use]
pub fn signing_payload(method: &str, path: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let path = normalize_path(path);
    let headers_len: usize = headers.iter().map(|(name, value)| name.len() + value.len() + 3).sum();
    let mut payload = Vec::with_capacity(method.len() + path.len() + headers_len + body.len() + 2);

    payload.extend_from_slice(method.to_ascii_uppercase().as_bytes());
    payload.push(b' ');
    payload.extend_from_slice(path.as_bytes());
    payload.push(b'\n');
    for (name, value) in headers {
        payload.extend_from_slice(name.as_bytes());
        payload.extend_from_slice(b": ");
        payload.extend_from_slice(value.as_bytes());
        payload.push(b'\n');
    }
    payload.extend_from_slice(body);
    payload
}

/// Strips trailing slashes; the root path stays `/`.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn split_detached(signature: &str) -> Result<(&str, &str)> {
    let mut parts = signature.trim().split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(""), Some(sig), None) if !header.is_empty() && !sig.is_empty() => Ok((header, sig)),
        _ => Err(PaywireError::VerificationFailed(
            "signature is not a detached JWS (expected `header..signature`)".into(),
        )),
    }
}

fn decode_header(header_b64: &str) -> Result<JwsHeader> {
    let bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|e| PaywireError::CryptoError(format!("invalid JWS header encoding: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| PaywireError::CryptoError(format!("invalid JWS header: {e}")))
}
