//! Payments API: pay-ins from a user's bank account.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Currency, ExternalAccount, FailureStage, User, UserRef};
use crate::tagged_union;

/// Body of `POST /v3/payments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    /// Amount in the minor unit of `currency`.
    pub amount_in_minor: u64,
    /// Payment currency.
    pub currency: Currency,
    /// How the payment is made.
    pub payment_method: PaymentMethod,
    /// The payer.
    pub user: User,
    /// Merchant key-value pairs echoed back in webhooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// A one-off bank transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransfer {
    /// How the user's provider is chosen.
    pub provider_selection: ProviderSelection,
    /// Where the funds go.
    pub beneficiary: Beneficiary,
}

/// A payment against an existing mandate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandatePayment {
    /// Authorized mandate to pay under.
    pub mandate_id: String,
    /// Statement reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

tagged_union! {
    /// Payment method of a payment.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum PaymentMethod by ["type"] {
        /// Single bank transfer.
        BankTransfer(BankTransfer) = "bank_transfer",
        /// Payment under a mandate.
        Mandate(MandatePayment) = "mandate",
    }
}

/// Provider release channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseChannel {
    /// Generally available providers only.
    GeneralAvailability,
    /// Include public beta providers.
    PublicBeta,
    /// Include private beta providers.
    PrivateBeta,
}

/// Restricts the providers offered to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFilter {
    /// ISO 3166-1 alpha-2 country codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    /// Least mature release channel to include.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_channel: Option<ReleaseChannel>,
    /// Explicit provider ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_ids: Option<Vec<String>>,
}

/// The user picks their provider in the hosted flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSelectedProvider {
    /// Filter applied to the provider list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ProviderFilter>,
}

/// The merchant has already chosen the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreselectedProvider {
    /// Provider id.
    pub provider_id: String,
    /// Account the user pays from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remitter: Option<ExternalAccount>,
}

tagged_union! {
    /// How the user's bank is chosen.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ProviderSelection by ["type"] {
        /// Chosen by the user.
        UserSelected(UserSelectedProvider) = "user_selected",
        /// Chosen by the merchant.
        Preselected(PreselectedProvider) = "preselected",
    }
}

/// One of the merchant's own accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantAccountBeneficiary {
    /// Merchant account id.
    pub merchant_account_id: String,
    /// Statement reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

tagged_union! {
    /// Recipient of a payment.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Beneficiary by ["type"] {
        /// Paid into a merchant account.
        MerchantAccount(MerchantAccountBeneficiary) = "merchant_account",
        /// Paid into an external account.
        ExternalAccount(ExternalAccount) = "external_account",
    }
}

/// Created payment that needs the user to authorize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAuthorizationRequired {
    /// Payment id.
    pub id: String,
    /// The payer.
    pub user: UserRef,
    /// Token for front-end components.
    pub resource_token: String,
}

/// Created payment that was authorized immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAuthorized {
    /// Payment id.
    pub id: String,
    /// The payer.
    pub user: UserRef,
    /// Token for front-end components.
    pub resource_token: String,
}

/// Created payment that failed on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedFailed {
    /// Payment id.
    pub id: String,
    /// The payer.
    pub user: UserRef,
    /// Token for front-end components.
    pub resource_token: String,
    /// Stage that failed.
    pub failure_stage: FailureStage,
    /// Machine-readable reason.
    pub failure_reason: String,
}

tagged_union! {
    /// Response of `POST /v3/payments`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum CreatePaymentResponse by ["status"] {
        /// The user still has to authorize.
        AuthorizationRequired(CreatedAuthorizationRequired) = "authorization_required",
        /// Authorized without user interaction.
        Authorized(CreatedAuthorized) = "authorized",
        /// Failed on creation.
        Failed(CreatedFailed) = "failed",
    }
}

impl CreatePaymentResponse {
    /// Payment id, whatever the status.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::AuthorizationRequired(payment) => &payment.id,
            Self::Authorized(payment) => &payment.id,
            Self::Failed(payment) => &payment.id,
        }
    }
}

/// Payment waiting for the user to start authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAuthorizationRequired {
    /// Payment id.
    pub id: String,
    /// Amount in minor units.
    pub amount_in_minor: u64,
    /// Currency.
    pub currency: Currency,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payment the user is authorizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAuthorizing {
    /// Payment id.
    pub id: String,
    /// Amount in minor units.
    pub amount_in_minor: u64,
    /// Currency.
    pub currency: Currency,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payment authorized by the user, pending execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAuthorized {
    /// Payment id.
    pub id: String,
    /// Amount in minor units.
    pub amount_in_minor: u64,
    /// Currency.
    pub currency: Currency,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payment executed by the user's bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentExecuted {
    /// Payment id.
    pub id: String,
    /// Amount in minor units.
    pub amount_in_minor: u64,
    /// Currency.
    pub currency: Currency,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Execution time.
    pub executed_at: DateTime<Utc>,
}

/// Payment received in a merchant account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSettled {
    /// Payment id.
    pub id: String,
    /// Amount in minor units.
    pub amount_in_minor: u64,
    /// Currency.
    pub currency: Currency,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Execution time.
    pub executed_at: DateTime<Utc>,
    /// Settlement time.
    pub settled_at: DateTime<Utc>,
    /// Account the funds came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_source: Option<ExternalAccount>,
}

/// Payment that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailed {
    /// Payment id.
    pub id: String,
    /// Amount in minor units.
    pub amount_in_minor: u64,
    /// Currency.
    pub currency: Currency,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Failure time.
    pub failed_at: DateTime<Utc>,
    /// Stage that failed.
    pub failure_stage: FailureStage,
    /// Machine-readable reason.
    pub failure_reason: String,
}

tagged_union! {
    /// Response of `GET /v3/payments/{id}`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum GetPaymentResponse by ["status"] {
        /// Waiting for the user.
        AuthorizationRequired(PaymentAuthorizationRequired) = "authorization_required",
        /// Being authorized.
        Authorizing(PaymentAuthorizing) = "authorizing",
        /// Authorized.
        Authorized(PaymentAuthorized) = "authorized",
        /// Executed.
        Executed(PaymentExecuted) = "executed",
        /// Settled.
        Settled(PaymentSettled) = "settled",
        /// Failed.
        Failed(PaymentFailed) = "failed",
    }
}
