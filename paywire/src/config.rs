//! Client configuration.
//!
//! Configuration is read from TOML:
//!
//! ```toml
//! environment = "sandbox"            # or "live"
//! # api_url = "https://api.internal.example.com"   # optional override
//! user_agent = "my-shop/1.0"
//!
//! [signing]
//! key_id = "a5f1c7c3-6a0e-4fd4-8b8c-0d3c2c9e6e0f"
//! private_key_env = "PAYWIRE_SIGNING_KEY"         # or private_key_path = "keys/ec512.pem"
//! ```
//!
//! The private key itself never appears in the file: it is read from an
//! environment variable or a PEM file when [`ClientConfig::signing_key`] is
//! called.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{
    error::{PaywireError, Result},
    signing::SigningKey,
};

/// Sandbox API base URL.
pub const SANDBOX_API_URL: &str = "https://api.sandbox.paywire.io";

/// Live API base URL.
pub const LIVE_API_URL: &str = "https://api.paywire.io";

/// JWKS advertised by sandbox webhook signatures.
pub const SANDBOX_WEBHOOK_JKU: &str = "https://webhooks.sandbox.paywire.io/.well-known/jwks";

/// JWKS advertised by live webhook signatures.
pub const LIVE_WEBHOOK_JKU: &str = "https://webhooks.paywire.io/.well-known/jwks";

/// Target API environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Test environment with simulated providers.
    #[default]
    Sandbox,
    /// Production.
    Live,
}

impl Environment {
    /// Default API base URL of this environment.
    #[must_use]
    pub const fn api_url(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_API_URL,
            Self::Live => LIVE_API_URL,
        }
    }

    /// JWKS URL that webhook signatures from this environment point at.
    #[must_use]
    pub const fn webhook_jku(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_WEBHOOK_JKU,
            Self::Live => LIVE_WEBHOOK_JKU,
        }
    }
}

/// Root client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Target environment.
    #[serde(default)]
    pub environment: Environment,

    /// Overrides the environment's API base URL.
    #[serde(default)]
    pub api_url: Option<String>,

    /// `User-Agent` sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request signing key location; required for mutating calls.
    #[serde(default)]
    pub signing: Option<SigningConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { environment: Environment::default(), api_url: None, user_agent: default_user_agent(), signing: None }
    }
}

/// Where the signing key comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningConfig {
    /// Key id registered with the API.
    pub key_id: String,

    /// Environment variable holding the PEM private key.
    #[serde(default)]
    pub private_key_env: Option<String>,

    /// Path to a PEM private key file.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::ConfigError`] if the TOML is malformed or invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use paywire::config::{ClientConfig, Environment};
    ///
    /// let config = ClientConfig::from_toml_str(r#"environment = "live""#).unwrap();
    /// assert_eq!(config.environment, Environment::Live);
    /// assert_eq!(config.base_url().unwrap().as_str(), "https://api.paywire.io/");
    /// ```
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml).map_err(|e| PaywireError::ConfigError(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::ConfigError`] if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let toml = fs::read_to_string(path)
            .map_err(|e| PaywireError::ConfigError(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&toml)
    }

    /// Validates the configuration.
    ///
    /// Checks that:
    /// - the API URL override, if any, is HTTPS and not a loopback address
    /// - the user agent is non-empty and a single line
    /// - the signing table names a key id and exactly one key source
    /// - the key environment variable name is `[A-Z0-9_]`, not starting with a digit
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::ConfigError`] on the first failed check.
    pub fn validate(&self) -> Result<()> {
        if let Some(api_url) = &self.api_url {
            validate_api_url(api_url)?;
        }
        if self.user_agent.trim().is_empty() || self.user_agent.contains(['\r', '\n']) {
            return Err(PaywireError::ConfigError("user_agent must be a non-empty single line".to_owned()));
        }
        if let Some(signing) = &self.signing {
            signing.validate()?;
        }
        Ok(())
    }

    /// API base URL: the override if set, else the environment default.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::ConfigError`] if the override is not a valid URL.
    pub fn base_url(&self) -> Result<Url> {
        let raw = self.api_url.as_deref().unwrap_or(self.environment.api_url());
        Url::parse(raw).map_err(|e| PaywireError::ConfigError(format!("invalid api_url '{raw}': {e}")))
    }

    /// Loads the configured signing key, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::ConfigError`] if the key source cannot be read
    /// and [`PaywireError::SignatureError`] if it is not a P-521 private key.
    pub fn signing_key(&self) -> Result<Option<SigningKey>> {
        self.signing.as_ref().map(SigningConfig::load).transpose()
    }
}

impl SigningConfig {
    /// Validates the key id and key source.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::ConfigError`] if the section is inconsistent.
    pub fn validate(&self) -> Result<()> {
        if self.key_id.trim().is_empty() {
            return Err(PaywireError::ConfigError("signing.key_id cannot be empty".to_owned()));
        }
        match (&self.private_key_env, &self.private_key_path) {
            (Some(env_var), None) => validate_env_var_name(env_var),
            (None, Some(path)) if path.as_os_str().is_empty() => {
                Err(PaywireError::ConfigError("signing.private_key_path cannot be empty".to_owned()))
            }
            (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => Err(PaywireError::ConfigError(
                "set only one of signing.private_key_env and signing.private_key_path".to_owned(),
            )),
            (None, None) => Err(PaywireError::ConfigError(
                "signing requires private_key_env or private_key_path".to_owned(),
            )),
        }
    }

    /// Reads the PEM and builds a [`SigningKey`].
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::signing_key`].
    pub fn load(&self) -> Result<SigningKey> {
        self.validate()?;
        let pem = if let Some(env_var) = &self.private_key_env {
            debug!(env_var = %env_var, "loading signing key from environment");
            std::env::var(env_var)
                .map_err(|e| PaywireError::ConfigError(format!("cannot read signing key from ${env_var}: {e}")))?
        } else if let Some(path) = &self.private_key_path {
            debug!(path = %path.display(), "loading signing key from file");
            fs::read_to_string(path).map_err(|e| {
                PaywireError::ConfigError(format!("cannot read signing key {}: {e}", path.display()))
            })?
        } else {
            return Err(PaywireError::ConfigError("signing requires private_key_env or private_key_path".to_owned()));
        };
        SigningKey::try_new(self.key_id.clone(), pem)
    }
}

fn default_user_agent() -> String {
    concat!("paywire-rust/", env!("CARGO_PKG_VERSION")).to_owned()
}

fn validate_api_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| PaywireError::ConfigError(format!("invalid api_url '{raw}': {e}")))?;

    if url.scheme() != "https" {
        return Err(PaywireError::ConfigError(format!("api_url must use HTTPS, got: {}", url.scheme())));
    }

    if let Some(host) = url.host_str() {
        let host = host.to_lowercase();
        if host == "localhost" || host.starts_with("127.") || host == "[::1]" || host == "::1" {
            return Err(PaywireError::ConfigError(format!("api_url must not be localhost or loopback: {host}")));
        }
    }

    Ok(())
}

fn validate_env_var_name(name: &str) -> Result<()> {
    let Some(first) = name.chars().next() else {
        return Err(PaywireError::ConfigError("environment variable name cannot be empty".to_owned()));
    };
    if first.is_ascii_digit() {
        return Err(PaywireError::ConfigError(format!(
            "environment variable name must not start with a digit: {name}"
        )));
    }
    if !name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_') {
        return Err(PaywireError::ConfigError(format!(
            "environment variable name must be uppercase alphanumeric with underscores: {name}"
        )));
    }
    Ok(())
}
