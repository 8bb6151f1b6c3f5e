//! Integration tests for request signing.
//!
//! A signature must bind every component of the request it was produced for.

use std::sync::{Arc, LazyLock};

use paywire::{
    PaywireError,
    model::{CreatePayoutRequest, Currency, ExternalAccount, Iban, PayoutBeneficiary},
    signing::{self, ALGORITHM, PROTOCOL_VERSION, RequestSigner, RequestVerifier, SigningKey},
    wire,
};

static KEY: LazyLock<Arc<SigningKey>> =
    LazyLock::new(|| Arc::new(SigningKey::generate("integration-kid").expect("key generation failed")));

const PATH: &str = "/v3/payouts";
const IDEMPOTENCY: (&str, &str) = ("Idempotency-Key", "5a3f-idem");

fn payout_body() -> Vec<u8> {
    let request = CreatePayoutRequest {
        merchant_account_id: "ma-gbp".to_owned(),
        amount_in_minor: 2500,
        currency: Currency::Gbp,
        beneficiary: PayoutBeneficiary::from(ExternalAccount {
            account_holder_name: "Ada Lovelace".to_owned(),
            account_identifier: Iban { iban: "GB33BUKB20201555555555".to_owned() }.into(),
            reference: "invoice 42".to_owned(),
        }),
        metadata: None,
    };
    wire::canonical_body(&request).expect("encode")
}

fn signed() -> (String, Vec<u8>) {
    let body = payout_body();
    let signature = RequestSigner::new(Arc::clone(&KEY))
        .sign_request("POST", PATH, &[IDEMPOTENCY], &body)
        .expect("sign");
    (signature, body)
}

fn verifier() -> RequestVerifier {
    RequestVerifier::from_signing_key(&KEY).expect("verifier")
}

fn assert_rejected(result: paywire::Result<signing::JwsHeader>) {
    match result {
        Err(PaywireError::VerificationFailed(_)) => {}
        other => panic!("expected VerificationFailed, got {other:?}"),
    }
}

#[test]
fn test_signature_verifies_for_same_request() {
    let (signature, body) = signed();
    let header = verifier().verify(&signature, "POST", PATH, &[IDEMPOTENCY], &body).expect("valid signature");

    assert_eq!(header.alg, ALGORITHM);
    assert_eq!(header.kid, "integration-kid");
    assert_eq!(header.tl_version, PROTOCOL_VERSION);
    assert_eq!(header.tl_headers, "Idempotency-Key");
}

#[test]
fn test_signature_is_detached() {
    let (signature, _) = signed();
    let parts: Vec<_> = signature.split('.').collect();
    assert_eq!(parts.len(), 3);
    assert!(parts[1].is_empty(), "payload must not be embedded");
}

#[test]
fn test_signature_binds_method() {
    let (signature, body) = signed();
    assert_rejected(verifier().verify(&signature, "PUT", PATH, &[IDEMPOTENCY], &body));
}

#[test]
fn test_signature_binds_path() {
    let (signature, body) = signed();
    assert_rejected(verifier().verify(&signature, "POST", "/v3/payments", &[IDEMPOTENCY], &body));
}

#[test]
fn test_trailing_slash_is_not_significant() {
    let (signature, body) = signed();
    assert!(verifier().verify(&signature, "post", "/v3/payouts/", &[IDEMPOTENCY], &body).is_ok());
}

#[test]
fn test_signature_binds_header_value() {
    let (signature, body) = signed();
    assert_rejected(verifier().verify(&signature, "POST", PATH, &[("Idempotency-Key", "other")], &body));
}

#[test]
fn test_signature_binds_body() {
    let (signature, body) = signed();
    let mut tampered = body.clone();
    let digit = tampered.iter().position(|&byte| byte == b'5').expect("amount digit");
    tampered[digit] = b'9';
    assert_rejected(verifier().verify(&signature, "POST", PATH, &[IDEMPOTENCY], &tampered));
}

#[test]
fn test_unsigned_extra_headers_are_ignored() {
    let (signature, body) = signed();
    let headers = [IDEMPOTENCY, ("User-Agent", "paywire-rust/0.1.0")];
    assert!(verifier().verify(&signature, "POST", PATH, &headers, &body).is_ok());
}

#[test]
fn test_required_header_must_be_signed() {
    let body = payout_body();
    let signature = signing::sign(&KEY, "POST", PATH, Some(body.as_slice()), &[]).expect("sign");
    let result = verifier().require_header("Idempotency-Key").verify(&signature, "POST", PATH, &[IDEMPOTENCY], &body);
    assert_rejected(result);
}

#[test]
fn test_other_key_is_rejected() {
    let (signature, body) = signed();
    let other = SigningKey::generate("integration-kid").expect("key");
    let verifier = RequestVerifier::from_signing_key(&other).expect("verifier");
    assert_rejected(verifier.verify(&signature, "POST", PATH, &[IDEMPOTENCY], &body));
}

#[test]
fn test_public_pem_verifier() {
    let (signature, body) = signed();
    let verifier = RequestVerifier::from_public_pem(KEY.public_key_pem().expect("pem")).expect("verifier");
    assert!(verifier.verify(&signature, "POST", PATH, &[IDEMPOTENCY], &body).is_ok());
}
