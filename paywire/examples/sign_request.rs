//! Request signing example.
//!
//! Signs a payout request the way the client does before sending it, then
//! verifies the signature with the public key.
//!
//! # Running this example
//!
//! With a registered key:
//! ```bash
//! openssl ecparam -genkey -name secp521r1 -noout | openssl pkcs8 -topk8 -nocrypt > key.pem
//! export PAYWIRE_SIGNING_KEY_PATH=key.pem PAYWIRE_KEY_ID=<your key id>
//! cargo run --example sign_request
//! ```
//!
//! Without the variables, a throwaway key is generated.

#![allow(
    clippy::print_stdout,
    clippy::uninlined_format_args,
    reason = "examples are allowed to use println and simple formatting"
)]

use std::{env, fs, sync::Arc};

use paywire::{
    model::{BusinessAccountBeneficiary, CreatePayoutRequest, Currency, PayoutBeneficiary},
    signing::{self, RequestSigner, RequestVerifier, SIGNATURE_HEADER, SigningKey},
    wire,
};
use uuid::Uuid;

fn load_signing_key() -> Result<SigningKey, Box<dyn std::error::Error>> {
    match (env::var("PAYWIRE_SIGNING_KEY_PATH"), env::var("PAYWIRE_KEY_ID")) {
        (Ok(path), Ok(key_id)) => Ok(SigningKey::try_new(key_id, fs::read_to_string(path)?)?),
        _ => {
            println!("   PAYWIRE_SIGNING_KEY_PATH / PAYWIRE_KEY_ID not set, generating a throwaway key");
            Ok(SigningKey::generate("example-kid")?)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Paywire: Request Signing Example\n");

    println!("1. Loading P-521 signing key...");
    let key = Arc::new(load_signing_key()?);
    println!("   key id: {}\n", key.key_id());

    println!("2. Encoding the request body...");
    let request = CreatePayoutRequest {
        merchant_account_id: "200f8f4e-9b1f-4c2a-8a8f-5e6c7d8e9f01".to_owned(),
        amount_in_minor: 1_000,
        currency: Currency::Gbp,
        beneficiary: PayoutBeneficiary::from(BusinessAccountBeneficiary { reference: "Treasury sweep".to_owned() }),
        metadata: None,
    };
    let body = wire::canonical_body(&request)?;
    println!("   {}\n", String::from_utf8_lossy(&body));

    println!("3. Signing POST /v3/payouts...");
    let idempotency_key = Uuid::new_v4().to_string();
    let headers = [("Idempotency-Key", idempotency_key.as_str())];
    let signature = RequestSigner::new(Arc::clone(&key)).sign_request("POST", "/v3/payouts", &headers, &body)?;
    println!("   {SIGNATURE_HEADER}: {signature}\n");

    let header = signing::extract_jws_header(&signature)?;
    println!(
        "   alg={} kid={} tl_version={} tl_headers={}\n",
        header.alg, header.kid, header.tl_version, header.tl_headers
    );

    println!("4. Verifying with the public key...");
    let verifier = RequestVerifier::from_public_pem(key.public_key_pem()?)?;
    verifier.verify(&signature, "POST", "/v3/payouts", &headers, &body)?;
    println!("   signature valid");

    let tampered = verifier.verify(&signature, "POST", "/v3/payouts", &headers, b"{}");
    println!("   tampered body rejected: {}", tampered.is_err());

    Ok(())
}
