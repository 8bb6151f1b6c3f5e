//! Webhook events and their signatures.
//!
//! Webhooks are the domain's polymorphic hierarchy: every notification is a
//! [`Box<dyn WebhookEvent>`](WebhookEvent) decoded through the
//! [polymorphic codec](crate::polymorphic) by its `"type"` label. Only
//! `event_version` 1 of each event is understood; other versions fail with
//! [`CodecError::FactoryInvocationError`](crate::error::CodecError::FactoryInvocationError).
//!
//! Webhook requests carry a `Tl-Signature` whose header names the signing
//! key (`kid`) and the JWKS to fetch it from (`jku`). [`WebhookVerifier`]
//! checks the `jku` against an allow-list before the caller fetches
//! anything, then verifies the signature with the fetched JWKS.
//!
//! # Examples
//!
//! ```
//! use paywire::webhooks::{self, PaymentSettledEvent};
//!
//! let body = br#"{
//!     "type": "payment_settled",
//!     "event_id": "ev-1",
//!     "event_version": 1,
//!     "payment_id": "pay-1",
//!     "settled_at": "2024-03-01T12:00:00Z"
//! }"#;
//!
//! let event = webhooks::parse(body)?;
//! assert_eq!(event.event_type(), "payment_settled");
//! let settled = event.downcast_ref::<PaymentSettledEvent>().unwrap();
//! assert_eq!(settled.payment_id, "pay-1");
//! # Ok::<(), paywire::PaywireError>(())
//! ```

use std::{any::Any, collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    config::Environment,
    error::{CodecError, PaywireError, Result},
    model::FailureStage,
    polymorphic::{self, PolymorphicBase, RegistryBuilder},
    signing::{JwsHeader, RequestVerifier, extract_jws_header},
};

/// The only event schema version this SDK understands.
pub const SUPPORTED_EVENT_VERSION: u32 = 1;

/// A webhook notification.
pub trait WebhookEvent: Any + fmt::Debug + Send + Sync {
    /// Wire label, for example `"payment_executed"`.
    fn event_type(&self) -> &'static str;

    /// Unique event id; use it to deduplicate redeliveries.
    fn event_id(&self) -> &str;

    /// Event schema version.
    fn event_version(&self) -> u32;
}

impl dyn WebhookEvent {
    /// Returns the concrete event if it is an `E`.
    #[must_use]
    pub fn downcast_ref<E: WebhookEvent>(&self) -> Option<&E> {
        let any: &dyn Any = self;
        any.downcast_ref()
    }

    /// Returns `true` if the concrete event is an `E`.
    #[must_use]
    pub fn is<E: WebhookEvent>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }
}

macro_rules! webhook_event {
    ($($event:ident => $label:literal),+ $(,)?) => {
        $(
            impl $event {
                /// Wire label of this event.
                pub const TYPE: &'static str = $label;
            }

            impl WebhookEvent for $event {
                fn event_type(&self) -> &'static str {
                    Self::TYPE
                }

                fn event_id(&self) -> &str {
                    &self.event_id
                }

                fn event_version(&self) -> u32 {
                    self.event_version
                }
            }
        )+
    };
}

/// A payment was executed by the payer's bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentExecutedEvent {
    /// Event id.
    pub event_id: String,
    /// Schema version.
    pub event_version: u32,
    /// Payment id.
    pub payment_id: String,
    /// Execution time.
    pub executed_at: DateTime<Utc>,
    /// Metadata supplied when the payment was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// A payment reached a merchant account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSettledEvent {
    /// Event id.
    pub event_id: String,
    /// Schema version.
    pub event_version: u32,
    /// Payment id.
    pub payment_id: String,
    /// Settlement time.
    pub settled_at: DateTime<Utc>,
    /// Payer, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// A payment failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailedEvent {
    /// Event id.
    pub event_id: String,
    /// Schema version.
    pub event_version: u32,
    /// Payment id.
    pub payment_id: String,
    /// Failure time.
    pub failed_at: DateTime<Utc>,
    /// Stage that failed.
    pub failure_stage: FailureStage,
    /// Machine-readable reason.
    pub failure_reason: String,
}

/// A payout left the merchant account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutExecutedEvent {
    /// Event id.
    pub event_id: String,
    /// Schema version.
    pub event_version: u32,
    /// Payout id.
    pub payout_id: String,
    /// Execution time.
    pub executed_at: DateTime<Utc>,
}

/// A payout failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutFailedEvent {
    /// Event id.
    pub event_id: String,
    /// Schema version.
    pub event_version: u32,
    /// Payout id.
    pub payout_id: String,
    /// Failure time.
    pub failed_at: DateTime<Utc>,
    /// Machine-readable reason.
    pub failure_reason: String,
}

/// A mandate was revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandateRevokedEvent {
    /// Event id.
    pub event_id: String,
    /// Schema version.
    pub event_version: u32,
    /// Mandate id.
    pub mandate_id: String,
    /// Revocation time.
    pub revoked_at: DateTime<Utc>,
    /// Who revoked it.
    pub revocation_source: String,
}

webhook_event! {
    PaymentExecutedEvent => "payment_executed",
    PaymentSettledEvent => "payment_settled",
    PaymentFailedEvent => "payment_failed",
    PayoutExecutedEvent => "payout_executed",
    PayoutFailedEvent => "payout_failed",
    MandateRevokedEvent => "mandate_revoked",
}

impl PolymorphicBase for Box<dyn WebhookEvent> {
    const NAME: &'static str = "WebhookEvent";

    fn register_subtypes(registry: &mut RegistryBuilder<Self>) {
        registry.fallible_subtype(PaymentExecutedEvent::TYPE, lift_supported::<PaymentExecutedEvent>);
        registry.fallible_subtype(PaymentSettledEvent::TYPE, lift_supported::<PaymentSettledEvent>);
        registry.fallible_subtype(PaymentFailedEvent::TYPE, lift_supported::<PaymentFailedEvent>);
        registry.fallible_subtype(PayoutExecutedEvent::TYPE, lift_supported::<PayoutExecutedEvent>);
        registry.fallible_subtype(PayoutFailedEvent::TYPE, lift_supported::<PayoutFailedEvent>);
        registry.fallible_subtype(MandateRevokedEvent::TYPE, lift_supported::<MandateRevokedEvent>);
    }
}

fn lift_supported<E: WebhookEvent>(event: E) -> std::result::Result<Box<dyn WebhookEvent>, String> {
    match event.event_version() {
        SUPPORTED_EVENT_VERSION => Ok(Box::new(event)),
        other => Err(format!("unsupported event version {other}")),
    }
}

/// Decodes a webhook body.
///
/// The body is not authenticated; use [`WebhookVerifier::verify`] for
/// requests received from the network.
///
/// # Errors
///
/// Returns [`PaywireError::Codec`] if the body is not a known, supported event.
pub fn parse(body: &[u8]) -> Result<Box<dyn WebhookEvent>> {
    let value = serde_json::from_slice(body).map_err(CodecError::from)?;
    Ok(polymorphic::decode(value)?)
}

/// Authenticates webhook requests.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    allowed_jku: Vec<String>,
}

impl WebhookVerifier {
    /// Trusts the JWKS of `environment` only.
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self { allowed_jku: vec![environment.webhook_jku().to_owned()] }
    }

    /// Also trusts JWKS served from `jku`.
    #[must_use]
    pub fn allow_jku(mut self, jku: impl Into<String>) -> Self {
        self.allowed_jku.push(jku.into());
        self
    }

    /// Returns the JWKS URL to fetch the verification key from.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::VerificationFailed`] if the signature names no
    /// `jku` or one that is not allowed.
    pub fn jku(&self, signature: &str) -> Result<String> {
        let header = extract_jws_header(signature)?;
        self.check_jku(&header)?;
        header.jku.ok_or_else(|| PaywireError::VerificationFailed("webhook signature has no jku".into()))
    }

    /// Verifies a webhook request against the JWKS fetched from [`jku`](Self::jku)
    /// and decodes its body.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::VerificationFailed`] if the `jku` is not
    /// allowed, the key is missing from `jwks` or the signature does not
    /// match, and [`PaywireError::Codec`] if the verified body is not a
    /// supported event.
    #[instrument(skip_all, fields(path = %path, body_len = body.len()))]
    pub fn verify(
        &self,
        jwks: &[u8],
        signature: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Box<dyn WebhookEvent>> {
        let header = extract_jws_header(signature)?;
        self.check_jku(&header)?;

        RequestVerifier::from_jwks(jwks, &header.kid)?.verify(signature, "POST", path, headers, body)?;
        let event = parse(body)?;
        debug!(event_type = event.event_type(), event_id = event.event_id(), "webhook verified");
        Ok(event)
    }

    fn check_jku(&self, header: &JwsHeader) -> Result<()> {
        match &header.jku {
            Some(jku) if self.allowed_jku.iter().any(|allowed| allowed == jku) => Ok(()),
            Some(jku) => Err(PaywireError::VerificationFailed(format!("untrusted jku `{jku}`"))),
            None => Err(PaywireError::VerificationFailed("webhook signature has no jku".into())),
        }
    }
}
