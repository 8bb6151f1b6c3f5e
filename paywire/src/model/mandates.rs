//! Mandates API: recurring payment authorizations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Currency, FailureStage};
use crate::tagged_union;

/// Mandate waiting for the user to authorize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandateAuthorizationRequired {
    /// Mandate id.
    pub id: String,
    /// Currency of payments under the mandate.
    pub currency: Currency,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Mandate authorized by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandateAuthorized {
    /// Mandate id.
    pub id: String,
    /// Currency of payments under the mandate.
    pub currency: Currency,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Authorization time.
    pub authorized_at: DateTime<Utc>,
}

/// Mandate whose authorization failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandateFailed {
    /// Mandate id.
    pub id: String,
    /// Currency of payments under the mandate.
    pub currency: Currency,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Failure time.
    pub failed_at: DateTime<Utc>,
    /// Stage that failed.
    pub failure_stage: FailureStage,
    /// Machine-readable reason.
    pub failure_reason: String,
}

/// Mandate revoked by the user or the merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandateRevoked {
    /// Mandate id.
    pub id: String,
    /// Currency of payments under the mandate.
    pub currency: Currency,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Revocation time.
    pub revoked_at: DateTime<Utc>,
    /// Who revoked it.
    pub revocation_source: String,
}

tagged_union! {
    /// Response of `GET /v3/mandates/{id}`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum GetMandateResponse by ["status"] {
        /// Waiting for the user.
        AuthorizationRequired(MandateAuthorizationRequired) = "authorization_required",
        /// Authorized.
        Authorized(MandateAuthorized) = "authorized",
        /// Failed.
        Failed(MandateFailed) = "failed",
        /// Revoked.
        Revoked(MandateRevoked) = "revoked",
    }
}

impl GetMandateResponse {
    /// Returns `true` if payments can be taken under the mandate.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}
