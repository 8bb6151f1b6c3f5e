//! Types shared across the payments, payouts and mandates APIs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tagged_union;

/// ISO 4217 currency supported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Pound sterling.
    Gbp,
    /// Euro.
    Eur,
    /// Polish złoty.
    Pln,
}

/// UK sort code and account number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortCodeAccountNumber {
    /// Six-digit sort code.
    pub sort_code: String,
    /// Eight-digit account number.
    pub account_number: String,
}

/// International bank account number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iban {
    /// The IBAN, without spaces.
    pub iban: String,
}

/// Basic bank account number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bban {
    /// The BBAN.
    pub bban: String,
}

/// Polish domestic account number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nrb {
    /// The NRB.
    pub nrb: String,
}

tagged_union! {
    /// Identifies a bank account in one of the supported schemes.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum AccountIdentifier by ["type"] {
        /// UK domestic account.
        SortCodeAccountNumber(SortCodeAccountNumber) = "sort_code_account_number",
        /// IBAN.
        Iban(Iban) = "iban",
        /// BBAN.
        Bban(Bban) = "bban",
        /// Polish domestic account.
        Nrb(Nrb) = "nrb",
    }
}

/// An account outside the merchant's own accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAccount {
    /// Name of the account holder.
    pub account_holder_name: String,
    /// Account to pay into.
    pub account_identifier: AccountIdentifier,
    /// Reference shown on the recipient's statement.
    pub reference: String,
}

/// Payer details sent with a payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Existing user id, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Full name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number in E.164 format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Reference to a user created by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// User id.
    pub id: String,
}

/// Stage at which an authorization flow failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Waiting for the user to start authorization.
    AuthorizationRequired,
    /// The user was authorizing with their provider.
    Authorizing,
    /// Authorized but not yet executed.
    Authorized,
}

/// RFC 7807 problem details returned with error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI identifying the problem type.
    #[serde(rename = "type")]
    pub problem_type: String,
    /// Short human-readable summary.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Correlation id to quote to support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Validation errors keyed by request field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

/// A page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Returned items.
    pub items: Vec<T>,
}
