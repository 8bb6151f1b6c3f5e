//! Decoding polymorphic API responses.
//!
//! Shows how status-discriminated payloads map onto enum variants, how
//! unknown statuses are reported, and how webhook bodies are parsed.
//!
//! # Running this example
//!
//! ```bash
//! cargo run --example decode_payment
//! ```

#![allow(
    clippy::print_stdout,
    clippy::uninlined_format_args,
    reason = "examples are allowed to use println and simple formatting"
)]

use paywire::{
    CodecError,
    model::GetPaymentResponse,
    union::TaggedUnion,
    webhooks::{self, PaymentSettledEvent},
    wire,
};

const RESPONSES: &[&str] = &[
    r#"{"id":"pay-1","status":"authorization_required","amount_in_minor":1000,"currency":"GBP"}"#,
    r#"{"id":"pay-1","status":"executed","amount_in_minor":1000,"currency":"GBP",
        "executed_at":"2026-05-01T09:30:00Z"}"#,
    r#"{"id":"pay-1","status":"failed","amount_in_minor":1000,"currency":"GBP",
        "failed_at":"2026-05-01T09:31:00Z","failure_stage":"authorizing","failure_reason":"canceled"}"#,
    r#"{"id":"pay-1","status":"refunded","amount_in_minor":1000,"currency":"GBP"}"#,
];

const WEBHOOK: &str = r#"{
    "type": "payment_settled",
    "event_id": "evt-42",
    "event_version": 1,
    "payment_id": "pay-1",
    "settled_at": "2026-05-01T10:00:00Z"
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Paywire: Response Decoding Example\n");

    println!("1. Payment responses");
    for json in RESPONSES {
        match wire::decode_union::<GetPaymentResponse>(json) {
            Ok(GetPaymentResponse::Failed(failed)) => {
                println!("   failed at {:?}: {}", failed.failure_stage, failed.failure_reason);
            }
            Ok(payment) => println!("   {} ({})", payment.discriminator(), GetPaymentResponse::NAME),
            Err(CodecError::UnknownDiscriminator { value, .. }) => {
                println!("   unknown status {value:?}, upgrade the SDK to read it");
            }
            Err(err) => return Err(err.into()),
        }
    }

    println!("\n2. Re-encoding keeps the status label");
    let payment: GetPaymentResponse = wire::decode(RESPONSES[1])?;
    println!("   {}", wire::encode(&payment)?);

    println!("\n3. Webhook body");
    let event = webhooks::parse(WEBHOOK.as_bytes())?;
    println!("   {} {}", event.event_type(), event.event_id());
    if let Some(settled) = event.downcast_ref::<PaymentSettledEvent>() {
        println!("   payment {} settled at {}", settled.payment_id, settled.settled_at);
    }

    Ok(())
}
