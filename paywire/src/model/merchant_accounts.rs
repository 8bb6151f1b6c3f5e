//! Merchant accounts API.

use serde::{Deserialize, Serialize};

use super::common::{AccountIdentifier, Currency};

/// A merchant account held with the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantAccount {
    /// Merchant account id.
    pub id: String,
    /// Account currency.
    pub currency: Currency,
    /// Every identifier the account can be paid into.
    pub account_identifiers: Vec<AccountIdentifier>,
    /// Balance available for payouts, in minor units.
    pub available_balance_in_minor: i64,
    /// Ledger balance, in minor units.
    pub current_balance_in_minor: i64,
    /// Registered account holder.
    pub account_holder_name: String,
}

impl MerchantAccount {
    /// First identifier of the given wire type (for example `"iban"`).
    #[must_use]
    pub fn identifier(&self, label: &str) -> Option<&AccountIdentifier> {
        use crate::union::TaggedUnion;

        self.account_identifiers.iter().find(|identifier| identifier.discriminator() == label)
    }
}
