//! Paywire: typed payments API SDK core
//!
//! The payments API represents most of its resources as JSON objects whose
//! shape depends on a string discriminator: a payment's `status` decides
//! whether it carries `failure_reason` or `settled_at`, a beneficiary's `type`
//! decides whether it holds a merchant account id or an IBAN. This crate maps
//! those objects onto closed Rust enums in both directions, and signs the
//! requests that create them.
//!
//! # What is in the box?
//!
//! - **Tagged unions** ([`union`], [`tagged_union!`]): closed enums with an
//!   explicit discriminator table and an ordered fallback field list
//! - **Polymorphic bases** ([`polymorphic`]): open hierarchies decoded through
//!   a label registry, used for [`webhooks`]
//! - **Wire naming** ([`naming`], [`wire`]): struct fields are written in the
//!   API's `lower_snake_case`
//! - **Request signing** ([`signing`]): detached ES512 JWS over a canonical
//!   rendering of method, path, selected headers and body
//! - **Client** ([`client`]): typed endpoints over a transport you provide
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │  ApiClient<T>        │──────│  RequestSigner       │
//! │  (typed endpoints)   │      │  (ES512, detached)   │
//! └─────────┬────────────┘      └──────────────────────┘
//!           │ wire::canonical_body / serde_json
//! ┌─────────▼────────────┐      ┌──────────────────────┐
//! │  union codec         │      │  polymorphic codec   │
//! │  (closed enums)      │      │  (webhook events)    │
//! └─────────┬────────────┘      └─────────┬────────────┘
//!           └────────────┬────────────────┘
//!              ┌─────────▼────────┐
//!              │  TypeCache       │  per-type layouts, built once
//!              └──────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## 1. Decode a polymorphic response
//!
//! ```rust
//! use paywire::{model::GetPaymentResponse, wire};
//!
//! # fn main() -> paywire::Result<()> {
//! let payment: GetPaymentResponse = wire::decode(
//!     r#"{"id":"pay-1","status":"authorized","amount_in_minor":1000,"currency":"GBP"}"#,
//! )?;
//!
//! match payment {
//!     GetPaymentResponse::Authorized(authorized) => assert_eq!(authorized.amount_in_minor, 1000),
//!     other => panic!("unexpected status: {other:?}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## 2. Sign a request
//!
//! ```rust
//! use paywire::signing::{self, SigningKey};
//!
//! # fn main() -> paywire::Result<()> {
//! let key = SigningKey::generate("my-key-id")?;
//! let body = br#"{"amount_in_minor":100,"currency":"GBP"}"#;
//!
//! let signature = signing::sign(&key, "POST", "/v3/payouts", Some(body), &[("Idempotency-Key", "k-1")])?;
//! // Send as the `Tl-Signature` header.
//! assert_eq!(signing::extract_jws_header(&signature)?.kid, "my-key-id");
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`union`]: tagged-union trait, resolver and codec
//! - [`polymorphic`]: label registries for abstract base types
//! - [`wire`]: encode/decode entry points
//! - [`naming`]: identifier to wire-name conversion
//! - [`signing`]: request signing and verification
//! - [`model`]: request and response types
//! - [`webhooks`]: webhook events and verification
//! - [`client`]: API client and transport trait
//! - [`config`]: TOML client configuration
//! - [`error`]: error types with recovery guidance
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, PaywireError>`](error::Result).
//! Codec failures keep their precise cause:
//!
//! ```rust
//! use paywire::{CodecError, model::GetMandateResponse, wire};
//!
//! match wire::decode_union::<GetMandateResponse>(r#"{"id":"m-1","status":"paused"}"#) {
//!     Err(CodecError::UnknownDiscriminator { value, .. }) => assert_eq!(value, "paused"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod naming;
pub mod polymorphic;
pub mod signing;
pub mod union;
pub mod webhooks;
pub mod wire;

pub use error::{CodecError, DefinitionError, PaywireError, Result};

/// Re-exports used by code generated by [`tagged_union!`].
#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use serde_json;
}
