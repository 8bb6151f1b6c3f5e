//! Typed API client.
//!
//! [`ApiClient`] turns typed requests into signed HTTP calls and decodes the
//! responses through the [wire codec](crate::wire). It does not perform I/O
//! itself: requests are handed to a user-supplied [`Transport`].
//!
//! Every mutating call (`POST`) carries:
//! - an `Idempotency-Key` header with a fresh UUID v4
//! - a `Tl-Signature` header covering method, path, idempotency key and the
//!   exact body bytes sent
//!
//! Non-2xx responses become [`PaywireError::ApiError`] with the problem
//! details parsed from the body when present.

mod transport;

use std::{fmt, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;
use zeroize::Zeroizing;

pub use self::transport::{HttpRequest, Method, Transport, TransportResponse};
use crate::{
    config::ClientConfig,
    error::{PaywireError, Result},
    model::{
        CreatePaymentRequest, CreatePaymentResponse, CreatePayoutRequest, CreatePayoutResponse, GetMandateResponse,
        GetPaymentResponse, GetPayoutResponse, ListResponse, MerchantAccount, ProblemDetails,
    },
    signing::{RequestSigner, SIGNATURE_HEADER},
    wire,
};

/// Header carrying the idempotency key of a mutating call.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Client for the payments API.
pub struct ApiClient<T> {
    transport: T,
    base_url: Url,
    user_agent: String,
    access_token: Option<Zeroizing<String>>,
    signer: Option<RequestSigner>,
}

impl<T: Transport> ApiClient<T> {
    /// Creates a client from a validated configuration.
    ///
    /// The configured signing key, if any, is loaded once here.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::ConfigError`] if the configuration is invalid
    /// or the signing key cannot be loaded.
    pub fn new(transport: T, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let signer = config.signing_key()?.map(|key| RequestSigner::new(Arc::new(key)));
        Ok(Self {
            transport,
            base_url: config.base_url()?,
            user_agent: config.user_agent.clone(),
            access_token: None,
            signer,
        })
    }

    /// Uses `signer` for mutating calls.
    #[must_use]
    pub fn with_signer(mut self, signer: RequestSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Sends `token` as a bearer token with every call.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(Zeroizing::new(token.into()));
        self
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Creates a payment.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::ConfigError`] without a signing key, and
    /// transport, API or codec errors otherwise.
    pub async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<CreatePaymentResponse> {
        self.post(&["v3", "payments"], request).await
    }

    /// Fetches a payment by id.
    ///
    /// # Errors
    ///
    /// Returns [`PaywireError::InvalidRequest`] for an empty id, and
    /// transport, API or codec errors otherwise.
    pub async fn get_payment(&self, id: &str) -> Result<GetPaymentResponse> {
        self.get(&["v3", "payments", non_empty(id)?]).await
    }

    /// Creates a payout from a merchant account.
    ///
    /// # Errors
    ///
    /// See [`create_payment`](Self::create_payment).
    pub async fn create_payout(&self, request: &CreatePayoutRequest) -> Result<CreatePayoutResponse> {
        self.post(&["v3", "payouts"], request).await
    }

    /// Fetches a payout by id.
    ///
    /// # Errors
    ///
    /// See [`get_payment`](Self::get_payment).
    pub async fn get_payout(&self, id: &str) -> Result<GetPayoutResponse> {
        self.get(&["v3", "payouts", non_empty(id)?]).await
    }

    /// Fetches a mandate by id.
    ///
    /// # Errors
    ///
    /// See [`get_payment`](Self::get_payment).
    pub async fn get_mandate(&self, id: &str) -> Result<GetMandateResponse> {
        self.get(&["v3", "mandates", non_empty(id)?]).await
    }

    /// Lists the merchant's accounts.
    ///
    /// # Errors
    ///
    /// Returns transport, API or codec errors.
    pub async fn list_merchant_accounts(&self) -> Result<ListResponse<MerchantAccount>> {
        self.get(&["v3", "merchant-accounts"]).await
    }

    async fn get<R: DeserializeOwned>(&self, segments: &[&str]) -> Result<R> {
        let url = self.endpoint(segments)?;
        let request = HttpRequest { method: Method::Get, url, headers: Vec::new(), body: None };
        self.execute(request).await
    }

    async fn post<B, R>(&self, segments: &[&str], body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| PaywireError::ConfigError("a signing key is required for mutating calls".to_owned()))?;
        let url = self.endpoint(segments)?;
        let body = wire::canonical_body(body)?;
        let idempotency_key = Uuid::new_v4().to_string();

        let signature = signer.sign_request(
            Method::Post.as_str(),
            url.path(),
            &[(IDEMPOTENCY_KEY_HEADER, idempotency_key.as_str())],
            &body,
        )?;

        let request = HttpRequest {
            method: Method::Post,
            url,
            headers: vec![
                (IDEMPOTENCY_KEY_HEADER.to_owned(), idempotency_key),
                (SIGNATURE_HEADER.to_owned(), signature),
                ("Content-Type".to_owned(), "application/json".to_owned()),
            ],
            body: Some(body),
        };
        self.execute(request).await
    }

    #[instrument(skip(self, request), fields(method = %request.method, path = %request.url.path()))]
    async fn execute<R: DeserializeOwned>(&self, mut request: HttpRequest) -> Result<R> {
        request.headers.push(("User-Agent".to_owned(), self.user_agent.clone()));
        request.headers.push(("Accept".to_owned(), "application/json".to_owned()));
        if let Some(token) = &self.access_token {
            request.headers.push(("Authorization".to_owned(), format!("Bearer {}", token.as_str())));
        }

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            let problem = serde_json::from_slice::<ProblemDetails>(&response.body).ok().map(Box::new);
            warn!(
                status = response.status,
                trace_id = problem.as_ref().and_then(|p| p.trace_id.as_deref()),
                "API call failed"
            );
            return Err(PaywireError::ApiError { status: response.status, problem });
        }

        debug!(status = response.status, body_len = response.body.len(), "API call succeeded");
        Ok(wire::decode_slice(&response.body)?)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PaywireError::ConfigError(format!("api_url '{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl<T> fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("signer", &self.signer.as_ref().map(RequestSigner::key_id))
            .finish_non_exhaustive()
    }
}

fn non_empty(id: &str) -> Result<&str> {
    if id.trim().is_empty() {
        return Err(PaywireError::InvalidRequest("resource id cannot be empty".to_owned()));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use super::*;
    use crate::{
        error::CodecError,
        model::{
            BankTransfer, Beneficiary, Currency, MerchantAccountBeneficiary, PaymentMethod, ProviderSelection, User,
            UserSelectedProvider,
        },
        signing::{RequestVerifier, SigningKey},
    };

    #[derive(Clone, Default)]
    struct MockTransport {
        responses: Arc<Mutex<VecDeque<Result<TransportResponse>>>>,
        requests: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl MockTransport {
        fn respond(&self, status: u16, body: &str) {
            self.responses.lock().unwrap().push_back(Ok(TransportResponse {
                status,
                headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
                body: body.as_bytes().to_vec(),
            }));
        }

        fn fail(&self, message: &str) {
            self.responses.lock().unwrap().push_back(Err(PaywireError::TransportError(message.to_owned())));
        }

        fn last_request(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for MockTransport {
        fn send(&self, request: HttpRequest) -> impl Future<Output = Result<TransportResponse>> + Send {
            self.requests.lock().unwrap().push(request);
            let response = self.responses.lock().unwrap().pop_front();
            async move { response.unwrap_or_else(|| Err(PaywireError::TransportError("no response queued".into()))) }
        }
    }

    fn client(transport: MockTransport) -> (ApiClient<MockTransport>, Arc<SigningKey>) {
        let key = Arc::new(SigningKey::generate("client-kid").unwrap());
        let client = ApiClient::new(transport, &ClientConfig::default())
            .unwrap()
            .with_signer(RequestSigner::new(Arc::clone(&key)))
            .with_access_token("token-123");
        (client, key)
    }

    fn payment_request() -> CreatePaymentRequest {
        CreatePaymentRequest {
            amount_in_minor: 1000,
            currency: Currency::Gbp,
            payment_method: PaymentMethod::from(BankTransfer {
                provider_selection: ProviderSelection::from(UserSelectedProvider::default()),
                beneficiary: Beneficiary::from(MerchantAccountBeneficiary {
                    merchant_account_id: "ma-1".to_owned(),
                    reference: Some("order-1".to_owned()),
                }),
            }),
            user: User { email: Some("jane@example.com".to_owned()), ..User::default() },
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_create_payment_is_signed_and_idempotent() {
        let transport = MockTransport::default();
        transport.respond(
            201,
            r#"{"id":"pay-1","status":"authorization_required","user":{"id":"u-1"},"resource_token":"rt"}"#,
        );
        let (client, key) = client(transport.clone());

        let response = client.create_payment(&payment_request()).await.unwrap();
        assert!(matches!(response, CreatePaymentResponse::AuthorizationRequired(_)));

        let request = transport.last_request();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url.as_str(), "https://api.sandbox.paywire.io/v3/payments");
        assert_eq!(request.header("authorization"), Some("Bearer token-123"));
        let idempotency_key = request.header(IDEMPOTENCY_KEY_HEADER).unwrap();
        assert!(Uuid::parse_str(idempotency_key).is_ok());

        let body = request.body.clone().unwrap();
        assert_eq!(body, wire::canonical_body(&payment_request()).unwrap());

        let signature = request.header(SIGNATURE_HEADER).unwrap();
        RequestVerifier::from_signing_key(&key)
            .unwrap()
            .require_header(IDEMPOTENCY_KEY_HEADER)
            .verify(signature, "POST", request.url.path(), &[(IDEMPOTENCY_KEY_HEADER, idempotency_key)], &body)
            .unwrap();
    }

    #[tokio::test]
    async fn test_each_mutating_call_gets_a_new_idempotency_key() {
        let transport = MockTransport::default();
        transport.respond(200, r#"{"id":"po-1"}"#);
        transport.respond(200, r#"{"id":"po-2"}"#);
        let (client, _) = client(transport.clone());
        let request = crate::model::CreatePayoutRequest {
            merchant_account_id: "ma-1".to_owned(),
            amount_in_minor: 1,
            currency: Currency::Gbp,
            beneficiary: crate::model::PayoutBeneficiary::from(crate::model::BusinessAccountBeneficiary {
                reference: "sweep".to_owned(),
            }),
            metadata: None,
        };

        assert_eq!(client.create_payout(&request).await.unwrap().id, "po-1");
        let first = transport.last_request().header(IDEMPOTENCY_KEY_HEADER).map(str::to_owned);
        assert_eq!(client.create_payout(&request).await.unwrap().id, "po-2");
        let second = transport.last_request().header(IDEMPOTENCY_KEY_HEADER).map(str::to_owned);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_get_payment_decodes_status_union() {
        let transport = MockTransport::default();
        transport.respond(200, r#"{"id":"pay-1","status":"authorized","amount_in_minor":1000,"currency":"GBP"}"#);
        let (client, _) = client(transport.clone());

        let payment = client.get_payment("pay-1").await.unwrap();
        assert!(matches!(payment, GetPaymentResponse::Authorized(ref p) if p.amount_in_minor == 1000));

        let request = transport.last_request();
        assert_eq!(request.method, Method::Get);
        assert!(request.body.is_none());
        assert!(request.header(SIGNATURE_HEADER).is_none());
        assert!(request.header("user-agent").unwrap().starts_with("paywire-rust/"));
    }

    #[tokio::test]
    async fn test_resource_ids_are_escaped() {
        let transport = MockTransport::default();
        transport.respond(
            200,
            r#"{"id":"m/1","status":"authorization_required","currency":"GBP","created_at":"2024-01-01T00:00:00Z"}"#,
        );
        let (client, _) = client(transport.clone());

        client.get_mandate("m/1").await.unwrap();
        assert_eq!(transport.last_request().url.path(), "/v3/mandates/m%2F1");
    }

    #[tokio::test]
    async fn test_empty_id_is_rejected_before_sending() {
        let transport = MockTransport::default();
        let (client, _) = client(transport.clone());
        assert!(matches!(client.get_payout(" ").await, Err(PaywireError::InvalidRequest(_))));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_status_maps_problem_details() {
        let transport = MockTransport::default();
        transport.respond(
            400,
            r#"{"type":"https://docs.paywire.io/errors#invalid_parameters","title":"Invalid Parameters","status":400,"trace_id":"t-9"}"#,
        );
        let (client, _) = client(transport);

        let err = client.create_payment(&payment_request()).await.unwrap_err();
        match err {
            PaywireError::ApiError { status, problem } => {
                assert_eq!(status, 400);
                let problem = problem.unwrap();
                assert_eq!(problem.title, "Invalid Parameters");
                assert_eq!(problem.trace_id.as_deref(), Some("t-9"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_without_problem_body() {
        let transport = MockTransport::default();
        transport.respond(502, "<html>bad gateway</html>");
        let (client, _) = client(transport);

        let err = client.list_merchant_accounts().await.unwrap_err();
        assert!(matches!(err, PaywireError::ApiError { status: 502, problem: None }));
        assert_eq!(err.to_string(), "API returned status 502");
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let transport = MockTransport::default();
        transport.fail("connection reset");
        let (client, _) = client(transport);
        assert!(matches!(client.get_payment("pay-1").await, Err(PaywireError::TransportError(_))));
    }

    #[tokio::test]
    async fn test_unknown_status_is_codec_error() {
        let transport = MockTransport::default();
        transport.respond(200, r#"{"id":"pay-1","status":"teleported"}"#);
        let (client, _) = client(transport);
        match client.get_payment("pay-1").await {
            Err(PaywireError::Codec(CodecError::UnknownDiscriminator { type_name, value, .. })) => {
                assert_eq!(type_name, "GetPaymentResponse");
                assert_eq!(value, "teleported");
            }
            other => panic!("expected UnknownDiscriminator, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_payload_mismatch_is_typed() {
        let transport = MockTransport::default();
        transport.respond(200, r#"{"id":"pay-1","status":"failed","amount_in_minor":1}"#);
        let (client, _) = client(transport);
        let err = client.get_payment("pay-1").await.unwrap_err();
        assert!(
            matches!(
                err,
                PaywireError::Codec(CodecError::VariantTypeMismatch { ref discriminator, .. })
                    if discriminator == "failed"
            ),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_mutating_call_requires_signer() {
        let transport = MockTransport::default();
        let client = ApiClient::new(transport, &ClientConfig::default()).unwrap();
        let err = client.create_payment(&payment_request()).await.unwrap_err();
        assert!(matches!(err, PaywireError::ConfigError(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let (client, _) = client(MockTransport::default());
        let debug = format!("{client:?}");
        assert!(!debug.contains("token-123"));
        assert!(debug.contains("client-kid"));
    }
}
