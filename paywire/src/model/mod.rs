//! Request and response types for the payments API.
//!
//! Polymorphic resources are declared with
//! [`tagged_union!`](crate::tagged_union). Resource representations are
//! discriminated by `"status"`, request building blocks by `"type"`.

mod common;
mod mandates;
mod merchant_accounts;
mod payments;
mod payouts;

pub use self::{
    common::{
        AccountIdentifier, Bban, Currency, ExternalAccount, FailureStage, Iban, ListResponse, Nrb, ProblemDetails,
        SortCodeAccountNumber, User, UserRef,
    },
    mandates::{GetMandateResponse, MandateAuthorizationRequired, MandateAuthorized, MandateFailed, MandateRevoked},
    merchant_accounts::MerchantAccount,
    payments::{
        BankTransfer, Beneficiary, CreatePaymentRequest, CreatePaymentResponse, CreatedAuthorizationRequired,
        CreatedAuthorized, CreatedFailed, GetPaymentResponse, MandatePayment, MerchantAccountBeneficiary,
        PaymentAuthorizationRequired, PaymentAuthorized, PaymentAuthorizing, PaymentExecuted, PaymentFailed,
        PaymentMethod, PaymentSettled, PreselectedProvider, ProviderFilter, ProviderSelection, ReleaseChannel,
        UserSelectedProvider,
    },
    payouts::{
        BusinessAccountBeneficiary, CreatePayoutRequest, CreatePayoutResponse, GetPayoutResponse,
        PaymentSourceBeneficiary, PayoutAuthorized, PayoutBeneficiary, PayoutExecuted, PayoutFailed, PayoutPending,
    },
};
