//! Detached JWS generation for API requests.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use josekit::jws::JwsSigner;
use tracing::instrument;

use super::{ALGORITHM, JwsHeader, PROTOCOL_VERSION, SigningKey, signing_payload};
use crate::error::{PaywireError, Result};

/// Signs API requests with one [`SigningKey`].
#[derive(Debug, Clone)]
pub struct RequestSigner {
    key: Arc<SigningKey>,
    jku: Option<Arc<str>>,
}

impl RequestSigner {
    /// Creates a signer for `key`.
    #[must_use]
    pub fn new(key: Arc<SigningKey>) -> Self {
        Self { key, jku: None }
    }

    /// Advertises the JWKS URL holding the public key in every signature.
    #[must_use]
    pub fn with_jku(mut self, jku: impl Into<String>) -> Self {
        self.jku = Some(Arc::from(jku.into()));
        self
    }

    /// Key id of the underlying key.
    #[must_use]
    pub fn key_id(&self) -> &str {
        self.key.key_id()
    }

    /// Signs a request, returning the `Tl-Signature` header value.
    ///
    /// `headers` are covered by the signature in the order given and their
    /// names are recorded in the JWS header for the verifier.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::InvalidRequest`] if a header name is empty,
    /// repeated or contains a character that would make the signing payload
    /// ambiguous, and [`PaywireError::SignatureError`] if the key is unusable.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::sync::Arc;
    /// use paywire::signing::{RequestSigner, SigningKey};
    ///
    /// # fn main() -> paywire::Result<()> {
    /// let signer = RequestSigner::new(Arc::new(SigningKey::generate("kid")?));
    /// let signature = signer.sign_request("POST", "/v3/payouts", &[("Idempotency-Key", "k-1")], b"{}")?;
    /// assert!(signature.contains(".."));
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, headers, body), fields(key_id = %self.key.key_id(), body_len = body.len()))]
    pub fn sign_request(&self, method: &str, path: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<String> {
        sign_with(&self.key, self.jku.as_deref(), method, path, headers, body)
    }
}

pub(super) fn sign_with(
    key: &SigningKey,
    jku: Option<&str>,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> Result<String> {
    validate_headers(headers)?;

    let header = JwsHeader {
        alg: ALGORITHM.to_owned(),
        kid: key.key_id().to_owned(),
        tl_version: PROTOCOL_VERSION.to_owned(),
        tl_headers: headers.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(","),
        jku: jku.map(str::to_owned),
    };
    let header_json =
        serde_json::to_vec(&header).map_err(|e| PaywireError::SignatureError(format!("JWS header encoding: {e}")))?;
    let header_b64 = URL_SAFE_NO_PAD.encode(header_json);

    let payload = signing_payload(method, path, headers, body);
    let signing_input = format!("{header_b64}.{}", URL_SAFE_NO_PAD.encode(&payload));

    let signature = key
        .signer()?
        .sign(signing_input.as_bytes())
        .map_err(|e| PaywireError::SignatureError(format!("ES512 signing failed: {e}")))?;

    Ok(format!("{header_b64}..{}", URL_SAFE_NO_PAD.encode(signature)))
}

fn validate_headers(headers: &[(&str, &str)]) -> Result<()> {
    for (index, (name, value)) in headers.iter().enumerate() {
        let valid_name =
            !name.is_empty() && name.bytes().all(|b| b.is_ascii_graphic() && b != b',' && b != b':');
        if !valid_name {
            return Err(PaywireError::InvalidRequest(format!("invalid signed header name `{name}`")));
        }
        if value.contains(['\r', '\n']) {
            return Err(PaywireError::InvalidRequest(format!("signed header `{name}` contains a line break")));
        }
        if headers[..index].iter().any(|(seen, _)| seen.eq_ignore_ascii_case(name)) {
            return Err(PaywireError::InvalidRequest(format!("signed header `{name}` is repeated")));
        }
    }
    Ok(())
}
