//! End-to-end client flow over an in-memory transport.
//!
//! Creates a payment, then polls it, against canned API responses. Swap
//! `CannedTransport` for an implementation over your HTTP client of choice.
//!
//! # Running this example
//!
//! ```bash
//! cargo run --example client_flow
//! ```

#![allow(
    clippy::print_stdout,
    clippy::uninlined_format_args,
    reason = "examples are allowed to use println and simple formatting"
)]

use std::sync::{Arc, Mutex};

use paywire::{
    PaywireError, Result,
    client::{ApiClient, HttpRequest, Transport, TransportResponse},
    config::ClientConfig,
    model::{
        BankTransfer, Beneficiary, CreatePaymentRequest, Currency, GetPaymentResponse, MerchantAccountBeneficiary,
        PaymentMethod, ProviderSelection, User, UserSelectedProvider,
    },
    signing::{RequestSigner, SIGNATURE_HEADER, SigningKey},
};

/// Answers `POST /v3/payments` and `GET /v3/payments/{id}` from fixed bodies.
#[derive(Debug, Default)]
struct CannedTransport {
    log: Mutex<Vec<String>>,
}

impl Transport for CannedTransport {
    async fn send(&self, request: HttpRequest) -> Result<TransportResponse> {
        let signed = request.header(SIGNATURE_HEADER).is_some();
        self.log
            .lock()
            .map_err(|_| PaywireError::TransportError("log poisoned".to_owned()))?
            .push(format!("{} {} signed={signed}", request.method, request.url.path()));

        let body = match request.url.path() {
            "/v3/payments" => {
                r#"{"id":"pay-7","status":"authorization_required","user":{"id":"u-1"},"resource_token":"rt"}"#
            }
            "/v3/payments/pay-7" => {
                r#"{"id":"pay-7","status":"authorized","amount_in_minor":1999,"currency":"GBP"}"#
            }
            _ => {
                let problem = r#"{"type":"https://docs.paywire.io/errors/not-found","title":"Not Found","status":404}"#;
                return Ok(TransportResponse { status: 404, headers: Vec::new(), body: problem.as_bytes().to_vec() });
            }
        };
        Ok(TransportResponse { status: 200, headers: Vec::new(), body: body.as_bytes().to_vec() })
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("Paywire: Client Flow Example\n");

    let config = ClientConfig::from_toml_str(
        r#"
        environment = "sandbox"
        user_agent = "client-flow-example/1.0"
        "#,
    )?;
    let signer = RequestSigner::new(Arc::new(SigningKey::generate("example-kid")?));
    let client = ApiClient::new(CannedTransport::default(), &config)?.with_signer(signer).with_access_token("token");
    println!("1. Client ready: {client:?}\n");

    println!("2. Creating a payment...");
    let request = CreatePaymentRequest {
        amount_in_minor: 1999,
        currency: Currency::Gbp,
        payment_method: PaymentMethod::from(BankTransfer {
            provider_selection: ProviderSelection::from(UserSelectedProvider::default()),
            beneficiary: Beneficiary::from(MerchantAccountBeneficiary {
                merchant_account_id: "ma-gbp".to_owned(),
                reference: Some("order 1001".to_owned()),
            }),
        }),
        user: User {
            name: Some("Grace Hopper".to_owned()),
            email: Some("grace@example.com".to_owned()),
            ..User::default()
        },
        metadata: None,
    };
    let created = client.create_payment(&request).await?;
    println!("   created {}\n", created.id());

    println!("3. Polling the payment...");
    match client.get_payment(created.id()).await? {
        GetPaymentResponse::Authorized(payment) => {
            println!("   authorized: {} minor units of {:?}", payment.amount_in_minor, payment.currency);
        }
        other => println!("   still waiting: {other:?}"),
    }

    println!("\n4. Unknown resources surface the API problem details...");
    if let Err(err) = client.get_mandate("missing").await {
        println!("   {err}");
    }

    println!("\nRequests sent:");
    let log = client.transport().log.lock().map_err(|_| "log poisoned")?;
    for line in log.iter() {
        println!("   {line}");
    }

    Ok(())
}
