//! Error types for the paywire SDK.
//!
//! This module defines every error the SDK can return. All errors implement the
//! standard [`std::error::Error`] trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Data errors** ([`CodecError`]): a message on the wire did not match the
//!   shape the SDK expected. These are recoverable and must be handled by the
//!   caller (for example by logging the raw payload and rejecting it).
//! - **Definition errors** ([`DefinitionError`]): a union or polymorphic base
//!   type was declared incorrectly. These are programmer errors; they are
//!   reported the first time the type is used and then cached, so every later
//!   use fails the same way.
//! - **Signing errors** ([`PaywireError::SignatureError`],
//!   [`PaywireError::CryptoError`], [`PaywireError::VerificationFailed`]).
//! - **Client errors** ([`PaywireError::ConfigError`],
//!   [`PaywireError::TransportError`], [`PaywireError::ApiError`]).
//!
//! # Examples
//!
//! ```
//! use paywire::error::{CodecError, PaywireError};
//!
//! let err = PaywireError::from(CodecError::NotSupported("writing a polymorphic base".into()));
//! assert!(err.to_string().contains("not supported"));
//! ```

use thiserror::Error;

use crate::model::ProblemDetails;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, PaywireError>;

/// Construction-time errors raised by a malformed union or polymorphic base definition.
///
/// The type is `Clone` so that a failed definition can be cached and handed
/// back verbatim on every subsequent use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// The type declares no variants (or no known subtypes).
    #[error("invalid definition of `{type_name}`: {reason}")]
    InvalidUnionDefinition {
        /// Union or base type name.
        type_name: &'static str,
        /// What is wrong with the definition.
        reason: String,
    },

    /// Two variants resolve to the same discriminator label.
    #[error("`{type_name}` declares discriminator \"{discriminator}\" more than once")]
    DuplicateDiscriminator {
        /// Union or base type name.
        type_name: &'static str,
        /// The colliding label.
        discriminator: String,
    },

    /// A variant has no construction path into the union.
    #[error("`{type_name}` has no constructor for variant `{variant}`")]
    MissingVariantConstructor {
        /// Union type name.
        type_name: &'static str,
        /// Variant type name.
        variant: &'static str,
    },

    /// A variant payload writes the field that carries the union's label.
    #[error("`{type_name}` variant `{variant}` writes the discriminator field \"{field}\" itself")]
    DiscriminatorFieldCollision {
        /// Union type name.
        type_name: &'static str,
        /// Variant type name.
        variant: &'static str,
        /// The rule's primary field.
        field: &'static str,
    },
}

/// Errors produced by the serialization engine.
///
/// Every per-message failure surfaces as one of these variants. None of them
/// is ever swallowed: an unrecognised discriminator fails closed instead of
/// falling back to a default variant.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input was not a JSON object where one is required.
    #[error("malformed input for `{type_name}`: expected a JSON object, found {found}")]
    MalformedInput {
        /// Type being read or written.
        type_name: &'static str,
        /// JSON kind that was found instead.
        found: &'static str,
    },

    /// None of the discriminator fields exists on the object.
    #[error("missing discriminator for `{type_name}`: none of {fields:?} is present")]
    MissingDiscriminatorField {
        /// Type being read.
        type_name: &'static str,
        /// Fields that were probed, in order.
        fields: &'static [&'static str],
    },

    /// A discriminator value is present but maps to no known variant.
    #[error("unknown discriminator \"{value}\" for `{type_name}` in {raw}")]
    UnknownDiscriminator {
        /// Type being read.
        type_name: &'static str,
        /// The unmatched discriminator value.
        value: String,
        /// The raw JSON object, for diagnostics.
        raw: String,
    },

    /// The payload could not be read as the variant's concrete type.
    #[error("payload for \"{discriminator}\" does not match `{variant}`: {message}")]
    VariantTypeMismatch {
        /// Resolved discriminator label.
        discriminator: String,
        /// Concrete variant type name.
        variant: &'static str,
        /// Underlying deserialization message.
        message: String,
    },

    /// The variant's lift into the base type failed.
    #[error("failed to construct \"{discriminator}\" as `{type_name}`: {message}")]
    FactoryInvocationError {
        /// Base type name.
        type_name: &'static str,
        /// Resolved discriminator label.
        discriminator: String,
        /// Message reported by the lift.
        message: String,
    },

    /// The operation is deliberately unsupported.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// A union or base type definition is invalid.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// The input is not valid JSON, or a plain (non-union) value failed to (de)serialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur in the paywire SDK.
///
/// # Error Recovery
///
/// - **Codec errors** ([`Codec`](Self::Codec)): inspect the payload; do not retry
/// - **Signing errors** ([`SignatureError`](Self::SignatureError),
///   [`CryptoError`](Self::CryptoError)): check the signing key configuration
/// - **Verification failures** ([`VerificationFailed`](Self::VerificationFailed)):
///   reject the message
/// - **API errors** ([`ApiError`](Self::ApiError)): inspect the problem details
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum PaywireError {
    /// Serialization engine failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Request signature generation failed.
    ///
    /// Common causes include an unparsable private key or a key on the wrong
    /// curve (ES512 requires P-521).
    #[error("request signing failed: {0}")]
    SignatureError(String),

    /// Low-level cryptographic operation failed (key parsing, base64 decoding).
    #[error("cryptographic operation failed: {0}")]
    CryptoError(String),

    /// A signature did not verify against the supplied request.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    ConfigError(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The transport failed to deliver the request.
    #[error("transport error: {0}")]
    TransportError(String),

    /// The API answered with a non-success status.
    #[error("API returned status {status}{}", problem_suffix(.problem))]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Parsed problem details, when the body carried them.
        problem: Option<Box<ProblemDetails>>,
    },
}

fn problem_suffix(problem: &Option<Box<ProblemDetails>>) -> String {
    problem.as_ref().map(|p| format!(": {}", p.title)).unwrap_or_default()
}
