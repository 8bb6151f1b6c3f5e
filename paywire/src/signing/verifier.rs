//! Detached JWS verification for requests and webhooks.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use josekit::{
    jwk::JwkSet,
    jws::{ES512, JwsVerifier, alg::ecdsa::EcdsaJwsVerifier},
};
use tracing::{debug, instrument, warn};

use super::{ALGORITHM, JwsHeader, PROTOCOL_VERSION, SigningKey, decode_header, signing_payload, split_detached};
use crate::error::{PaywireError, Result};

/// Verifies `Tl-Signature` values against a known public key.
///
/// Verification rebuilds the signing payload from the request using the
/// header names recorded in the signature, so headers the signer did not
/// cover are ignored and headers it did cover must be present.
#[derive(Debug, Clone)]
pub struct RequestVerifier {
    verifier: EcdsaJwsVerifier,
    expected_kid: Option<String>,
    required_headers: Vec<String>,
}

impl RequestVerifier {
    /// Creates a verifier from a PEM-encoded P-521 public key.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::CryptoError`] if the PEM is not a P-521 public key.
    pub fn from_public_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        let verifier = ES512
            .verifier_from_pem(pem)
            .map_err(|e| PaywireError::CryptoError(format!("invalid ES512 public key: {e}")))?;
        Ok(Self { verifier, expected_kid: None, required_headers: Vec::new() })
    }

    /// Creates a verifier from the key with id `kid` in a JWKS document.
    ///
    /// The verifier then also rejects signatures whose `kid` differs.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::CryptoError`] if the JWKS cannot be parsed or
    /// the key is not a P-521 key, and [`PaywireError::VerificationFailed`]
    /// if no key has id `kid`.
    pub fn from_jwks(jwks: impl AsRef<[u8]>, kid: &str) -> Result<Self> {
        let set = JwkSet::from_bytes(jwks).map_err(|e| PaywireError::CryptoError(format!("invalid JWKS: {e}")))?;
        let jwk = set
            .get(kid)
            .into_iter()
            .next()
            .ok_or_else(|| PaywireError::VerificationFailed(format!("no key with kid `{kid}` in JWKS")))?;
        let verifier = ES512
            .verifier_from_jwk(jwk)
            .map_err(|e| PaywireError::CryptoError(format!("invalid ES512 JWK `{kid}`: {e}")))?;
        Ok(Self { verifier, expected_kid: Some(kid.to_owned()), required_headers: Vec::new() })
    }

    /// Creates a verifier for the public half of `key`.
    ///
    /// # Errors
    ///
    /// See [`SigningKey::public_key_pem`].
    pub fn from_signing_key(key: &SigningKey) -> Result<Self> {
        let mut verifier = Self::from_public_pem(key.public_key_pem()?)?;
        verifier.expected_kid = Some(key.key_id().to_owned());
        Ok(verifier)
    }

    /// Rejects signatures that do not cover header `name`.
    #[must_use]
    pub fn require_header(mut self, name: impl Into<String>) -> Self {
        self.required_headers.push(name.into());
        self
    }

    /// Verifies `signature` against a request, returning its protected header.
    ///
    /// Header lookup is case-insensitive. The path is normalized the same way
    /// as on signing.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::VerificationFailed`] if the signature is
    /// malformed, uses another algorithm, version or key, omits a required
    /// header, names a header missing from the request, or does not match the
    /// request; [`PaywireError::CryptoError`] if it cannot be decoded.
    #[instrument(skip(self, signature, headers, body), fields(body_len = body.len()))]
    pub fn verify(
        &self,
        signature: &str,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<JwsHeader> {
        let (header_b64, signature_b64) = split_detached(signature)?;
        let header = decode_header(header_b64)?;
        self.check_header(&header)?;

        let mut signed = Vec::new();
        for name in header.signed_headers() {
            let value = headers
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
                .map(|(_, value)| *value)
                .ok_or_else(|| fail(format!("signed header `{name}` is missing from the request")))?;
            signed.push((name, value));
        }

        let payload = signing_payload(method, path, &signed, body);
        let signing_input = format!("{header_b64}.{}", URL_SAFE_NO_PAD.encode(&payload));
        let raw_signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| PaywireError::CryptoError(format!("invalid signature encoding: {e}")))?;

        self.verifier
            .verify(signing_input.as_bytes(), &raw_signature)
            .map_err(|e| fail(format!("signature does not match request: {e}")))?;

        debug!(kid = %header.kid, "request signature verified");
        Ok(header)
    }

    fn check_header(&self, header: &JwsHeader) -> Result<()> {
        if header.alg != ALGORITHM {
            return Err(fail(format!("unsupported algorithm `{}`", header.alg)));
        }
        if header.tl_version != PROTOCOL_VERSION {
            return Err(fail(format!("unsupported signature version `{}`", header.tl_version)));
        }
        if let Some(expected) = &self.expected_kid
            && &header.kid != expected
        {
            return Err(fail(format!("unexpected key id `{}`", header.kid)));
        }
        for required in &self.required_headers {
            if !header.signed_headers().any(|name| name.eq_ignore_ascii_case(required)) {
                return Err(fail(format!("signature does not cover required header `{required}`")));
            }
        }
        Ok(())
    }
}

fn fail(reason: String) -> PaywireError {
    warn!(%reason, "signature verification failed");
    PaywireError::VerificationFailed(reason)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::signing::RequestSigner;

    fn key() -> Arc<SigningKey> {
        Arc::new(SigningKey::generate("kid-1").unwrap())
    }

    #[test]
    fn test_verify_round_trip_with_case_insensitive_headers() {
        let key = key();
        let signature = RequestSigner::new(Arc::clone(&key))
            .sign_request("POST", "/payments", &[("Idempotency-Key", "abc")], b"{\"a\":1}")
            .unwrap();

        let verifier = RequestVerifier::from_signing_key(&key).unwrap();
        let header = verifier
            .verify(&signature, "post", "/payments/", &[("idempotency-key", "abc"), ("Unsigned", "x")], b"{\"a\":1}")
            .unwrap();
        assert_eq!(header.kid, "kid-1");
    }

    #[test]
    fn test_missing_signed_header_fails() {
        let key = key();
        let headers = [("Idempotency-Key", "abc")];
        let signature = RequestSigner::new(Arc::clone(&key)).sign_request("POST", "/p", &headers, b"").unwrap();
        let verifier = RequestVerifier::from_signing_key(&key).unwrap();
        let err = verifier.verify(&signature, "POST", "/p", &[], b"").unwrap_err();
        assert!(err.to_string().contains("missing from the request"));
    }

    #[test]
    fn test_required_header_must_be_signed() {
        let key = key();
        let signature = RequestSigner::new(Arc::clone(&key)).sign_request("POST", "/p", &[], b"").unwrap();
        let verifier = RequestVerifier::from_signing_key(&key).unwrap().require_header("Idempotency-Key");
        let err = verifier.verify(&signature, "POST", "/p", &[("Idempotency-Key", "abc")], b"").unwrap_err();
        assert!(matches!(err, PaywireError::VerificationFailed(_)));
    }

    #[test]
    fn test_other_key_fails() {
        let signer_key = key();
        let other_key = Arc::new(SigningKey::generate("kid-1").unwrap());
        let signature = RequestSigner::new(signer_key).sign_request("GET", "/p", &[], b"").unwrap();
        let verifier = RequestVerifier::from_signing_key(&other_key).unwrap();
        assert!(matches!(verifier.verify(&signature, "GET", "/p", &[], b""), Err(PaywireError::VerificationFailed(_))));
    }

    #[test]
    fn test_kid_mismatch_fails() {
        let key = key();
        let signature = RequestSigner::new(Arc::clone(&key)).sign_request("GET", "/p", &[], b"").unwrap();
        let mut verifier = RequestVerifier::from_signing_key(&key).unwrap();
        verifier.expected_kid = Some("kid-2".to_owned());
        let err = verifier.verify(&signature, "GET", "/p", &[], b"").unwrap_err();
        assert!(err.to_string().contains("unexpected key id"));
    }

    #[test]
    fn test_from_jwks_selects_key_by_kid() {
        let pair = ES512.generate_key_pair().unwrap();
        let pem = String::from_utf8(pair.to_pem_private_key()).unwrap();
        let key = Arc::new(SigningKey::try_new("kid-1", pem).unwrap());
        let mut jwk = pair.to_jwk_public_key();
        jwk.set_key_id("kid-1");
        let jwks = format!(r#"{{"keys":[{jwk}]}}"#);

        let signature = RequestSigner::new(Arc::clone(&key)).sign_request("GET", "/p", &[], b"").unwrap();
        let verifier = RequestVerifier::from_jwks(jwks.as_bytes(), "kid-1").unwrap();
        verifier.verify(&signature, "GET", "/p", &[], b"").unwrap();

        assert!(matches!(
            RequestVerifier::from_jwks(jwks.as_bytes(), "kid-9"),
            Err(PaywireError::VerificationFailed(_))
        ));
    }
}
