//! ES512 signing keys.

use std::{fmt, sync::OnceLock};

use josekit::jws::{ES512, alg::ecdsa::EcdsaJwsSigner};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{PaywireError, Result};

/// An ECDSA P-521 private key plus the key id registered with the API.
///
/// The PEM is kept in memory that is wiped on drop and never printed by
/// `Debug`. The parsed signer is derived on first use and cached; a key that
/// fails to parse fails the same way on every use.
///
/// # Examples
///
/// ```
/// use paywire::signing::SigningKey;
///
/// let key = SigningKey::generate("kid-123")?;
/// assert_eq!(key.key_id(), "kid-123");
/// assert!(key.public_key_pem()?.starts_with("-----BEGIN PUBLIC KEY-----"));
/// # Ok::<(), paywire::PaywireError>(())
/// ```
pub struct SigningKey {
    key_id: String,
    private_key_pem: Zeroizing<String>,
    signer: OnceLock<std::result::Result<EcdsaJwsSigner, String>>,
}

impl SigningKey {
    /// Creates a key from a PEM-encoded P-521 private key (SEC1 or PKCS#8).
    ///
    /// The PEM is parsed lazily; use [`SigningKey::try_new`] to validate it up front.
    #[must_use]
    pub fn new(key_id: impl Into<String>, private_key_pem: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            private_key_pem: Zeroizing::new(private_key_pem.into()),
            signer: OnceLock::new(),
        }
    }

    /// Creates a key and parses it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::ConfigError`] if the key id is empty and
    /// [`PaywireError::SignatureError`] if the PEM is not a P-521 private key.
    pub fn try_new(key_id: impl Into<String>, private_key_pem: impl Into<String>) -> Result<Self> {
        let key = Self::new(key_id, private_key_pem);
        if key.key_id.trim().is_empty() {
            return Err(PaywireError::ConfigError("signing key id must not be empty".into()));
        }
        key.signer()?;
        Ok(key)
    }

    /// Generates a fresh P-521 key pair.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::CryptoError`] if key generation fails.
    pub fn generate(key_id: impl Into<String>) -> Result<Self> {
        let key_pair = ES512
            .generate_key_pair()
            .map_err(|e| PaywireError::CryptoError(format!("P-521 key generation failed: {e}")))?;
        let pem = String::from_utf8(key_pair.to_pem_private_key())
            .map_err(|e| PaywireError::CryptoError(format!("generated PEM is not UTF-8: {e}")))?;
        Self::try_new(key_id, pem)
    }

    /// Key id sent as `kid` in every signature.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// PEM-encoded public key matching this private key.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::SignatureError`] if the private key cannot be parsed.
    pub fn public_key_pem(&self) -> Result<String> {
        let key_pair = ES512
            .key_pair_from_pem(self.private_key_pem.as_bytes())
            .map_err(|e| PaywireError::SignatureError(format!("invalid ES512 private key: {e}")))?;
        String::from_utf8(key_pair.to_pem_public_key())
            .map_err(|e| PaywireError::CryptoError(format!("public key PEM is not UTF-8: {e}")))
    }

    pub(crate) fn signer(&self) -> Result<&EcdsaJwsSigner> {
        self.signer
            .get_or_init(|| {
                debug!(key_id = %self.key_id, "parsing ES512 signing key");
                ES512
                    .signer_from_pem(self.private_key_pem.as_bytes())
                    .map_err(|e| format!("invalid ES512 private key: {e}"))
            })
            .as_ref()
            .map_err(|message| PaywireError::SignatureError(message.clone()))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("private_key_pem", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
