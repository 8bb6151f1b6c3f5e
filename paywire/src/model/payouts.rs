//! Payouts API: transfers out of a merchant account.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Currency, ExternalAccount};
use crate::tagged_union;

/// Body of `POST /v3/payouts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePayoutRequest {
    /// Merchant account the funds leave from.
    pub merchant_account_id: String,
    /// Amount in the minor unit of `currency`.
    pub amount_in_minor: u64,
    /// Payout currency; must match the merchant account.
    pub currency: Currency,
    /// Recipient.
    pub beneficiary: PayoutBeneficiary,
    /// Merchant key-value pairs echoed back in webhooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Refund to an account a user previously paid from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSourceBeneficiary {
    /// Payment source id from a settled payment.
    pub payment_source_id: String,
    /// Owner of the payment source.
    pub user_id: String,
    /// Statement reference.
    pub reference: String,
}

/// Transfer to the merchant's registered business account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessAccountBeneficiary {
    /// Statement reference.
    pub reference: String,
}

tagged_union! {
    /// Recipient of a payout.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum PayoutBeneficiary by ["type"] {
        /// Arbitrary external account.
        ExternalAccount(ExternalAccount) = "external_account",
        /// Account a previous payment came from.
        PaymentSource(PaymentSourceBeneficiary) = "payment_source",
        /// The merchant's business account.
        BusinessAccount(BusinessAccountBeneficiary) = "business_account",
    }
}

/// Response of `POST /v3/payouts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePayoutResponse {
    /// Payout id.
    pub id: String,
}

/// Payout accepted but not yet authorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPending {
    /// Payout id.
    pub id: String,
    /// Source merchant account.
    pub merchant_account_id: String,
    /// Amount in minor units.
    pub amount_in_minor: u64,
    /// Currency.
    pub currency: Currency,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Payout authorized for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutAuthorized {
    /// Payout id.
    pub id: String,
    /// Source merchant account.
    pub merchant_account_id: String,
    /// Amount in minor units.
    pub amount_in_minor: u64,
    /// Currency.
    pub currency: Currency,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Authorization time.
    pub authorized_at: DateTime<Utc>,
}

/// Payout sent to the recipient's bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutExecuted {
    /// Payout id.
    pub id: String,
    /// Source merchant account.
    pub merchant_account_id: String,
    /// Amount in minor units.
    pub amount_in_minor: u64,
    /// Currency.
    pub currency: Currency,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Execution time.
    pub executed_at: DateTime<Utc>,
}

/// Payout that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutFailed {
    /// Payout id.
    pub id: String,
    /// Source merchant account.
    pub merchant_account_id: String,
    /// Amount in minor units.
    pub amount_in_minor: u64,
    /// Currency.
    pub currency: Currency,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Failure time.
    pub failed_at: DateTime<Utc>,
    /// Machine-readable reason.
    pub failure_reason: String,
}

tagged_union! {
    /// Response of `GET /v3/payouts/{id}`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum GetPayoutResponse by ["status"] {
        /// Pending.
        Pending(PayoutPending) = "pending",
        /// Authorized.
        Authorized(PayoutAuthorized) = "authorized",
        /// Executed.
        Executed(PayoutExecuted) = "executed",
        /// Failed.
        Failed(PayoutFailed) = "failed",
    }
}
