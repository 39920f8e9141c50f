use crate::app::config::{Config, SecretKey};
use crate::models::payment::{ChargeParams, ChargeResult, RefundParams, RefundResult};
use crate::services::gateway::{GatewayError, GatewayErrorDetails, PaymentGateway};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

const CHARGES_PATH: &str = "v1/charges";
const REFUNDS_PATH: &str = "v1/refunds";

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: GatewayErrorDetails,
}

/// Stripe REST client: form-encoded requests, bearer secret, JSON responses.
pub struct StripeClient {
    client: Client,
    base_url: Url,
    secret: SecretKey,
    timeout: Duration,
}

impl StripeClient {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.gateway_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {e}")))?;

        // Url::join replaces the last segment unless the base ends with a slash.
        let mut base_url = config.gateway_base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            secret: config.stripe_secret_key.clone(),
            timeout: config.gateway_timeout,
        })
    }

    async fn post_form<P, T>(&self, path: &str, params: &P) -> Result<T, GatewayError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| GatewayError::Transport(format!("invalid endpoint {path}: {e}")))?;

        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.secret.expose())
            .form(params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|e| GatewayError::Decode {
                status: status.as_u16(),
                reason: e.to_string(),
            });
        }

        match serde_json::from_slice::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(GatewayError::Api {
                status: status.as_u16(),
                details: envelope.error,
            }),
            Err(e) => Err(GatewayError::Decode {
                status: status.as_u16(),
                reason: format!("unreadable error body: {e}"),
            }),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_charge(&self, params: ChargeParams) -> Result<ChargeResult, GatewayError> {
        self.post_form(CHARGES_PATH, &params).await
    }

    async fn create_refund(&self, params: RefundParams) -> Result<RefundResult, GatewayError> {
        self.post_form(REFUNDS_PATH, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::LogFormat;
    use crate::services::gateway::GatewayErrorKind;
    use axum::{
        extract::Form,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    struct MockGateway {
        base_url: Url,
        handle: tokio::task::JoinHandle<()>,
    }

    impl MockGateway {
        async fn spawn(app: Router) -> Self {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let handle = tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            Self {
                base_url: Url::parse(&format!("http://{addr}")).unwrap(),
                handle,
            }
        }
    }

    impl Drop for MockGateway {
        fn drop(&mut self) {
            self.handle.abort();
        }
    }

    fn client_for(base_url: Url, timeout: Duration) -> StripeClient {
        let config = Config {
            server_port: 0,
            gateway_base_url: base_url,
            gateway_timeout: timeout,
            log_format: LogFormat::Plain,
            stripe_secret_key: SecretKey::new("sk_test_mock"),
        };
        StripeClient::new(&config).unwrap()
    }

    fn charge_params() -> ChargeParams {
        ChargeParams {
            amount: 2000,
            currency: "usd".into(),
            source: "tok_visa".into(),
        }
    }

    async fn echo_charge(
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if auth != "Bearer sk_test_mock" {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"type": "invalid_request_error", "message": "bad key"}})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "id": "ch_mock_1",
                "object": "charge",
                "amount": form["amount"].parse::<i64>().unwrap(),
                "currency": form["currency"],
                "status": "succeeded",
                "receipt_url": format!("https://receipts.example/{}", form["source"]),
                "livemode": false
            })),
        )
    }

    #[tokio::test]
    async fn test_charge_sends_form_and_parses_result() {
        let gateway = MockGateway::spawn(Router::new().route("/v1/charges", post(echo_charge))).await;
        let client = client_for(gateway.base_url.clone(), Duration::from_secs(5));

        let charge = client.create_charge(charge_params()).await.unwrap();

        assert_eq!(charge.id, "ch_mock_1");
        assert_eq!(charge.amount, 2000);
        assert_eq!(charge.currency, "usd");
        assert_eq!(charge.status, "succeeded");
        assert_eq!(charge.receipt_url.as_deref(), Some("https://receipts.example/tok_visa"));
    }

    #[tokio::test]
    async fn test_refund_sends_charge_field() {
        let app = Router::new().route(
            "/v1/refunds",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                Json(json!({
                    "id": format!("re_for_{}", form["charge"]),
                    "object": "refund",
                    "amount": 2000,
                    "status": "succeeded"
                }))
            }),
        );
        let gateway = MockGateway::spawn(app).await;
        let client = client_for(gateway.base_url.clone(), Duration::from_secs(5));

        let refund = client
            .create_refund(RefundParams { charge: "ch_123".into() })
            .await
            .unwrap();

        assert_eq!(refund.id, "re_for_ch_123");
        assert_eq!(refund.amount, 2000);
        assert_eq!(refund.status, "succeeded");
    }

    #[tokio::test]
    async fn test_base_url_with_path_prefix() {
        let app = Router::new().route("/stripe/v1/charges", post(echo_charge));
        let gateway = MockGateway::spawn(app).await;
        let base = gateway.base_url.join("stripe").unwrap();
        let client = client_for(base, Duration::from_secs(5));

        let charge = client.create_charge(charge_params()).await.unwrap();
        assert_eq!(charge.id, "ch_mock_1");
    }

    #[tokio::test]
    async fn test_error_body_is_classified() {
        let app = Router::new().route(
            "/v1/charges",
            post(|| async {
                (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(json!({
                        "error": {
                            "type": "card_error",
                            "code": "card_declined",
                            "decline_code": "generic_decline",
                            "message": "Your card was declined."
                        }
                    })),
                )
            }),
        );
        let gateway = MockGateway::spawn(app).await;
        let client = client_for(gateway.base_url.clone(), Duration::from_secs(5));

        let err = client.create_charge(charge_params()).await.unwrap_err();

        assert_eq!(err.kind(), GatewayErrorKind::CardDeclined);
        match err {
            GatewayError::Api { status, details } => {
                assert_eq!(status, 402);
                assert_eq!(details.decline_code.as_deref(), Some("generic_decline"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreadable_error_body_is_internal() {
        let app = Router::new().route(
            "/v1/charges",
            post(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>") }),
        );
        let gateway = MockGateway::spawn(app).await;
        let client = client_for(gateway.base_url.clone(), Duration::from_secs(5));

        let err = client.create_charge(charge_params()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode { status: 502, .. }));
        assert_eq!(err.kind(), GatewayErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        let app = Router::new().route(
            "/v1/charges",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let gateway = MockGateway::spawn(app).await;
        let client = client_for(gateway.base_url.clone(), Duration::from_millis(100));

        let err = client.create_charge(charge_params()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(
            Url::parse(&format!("http://{addr}")).unwrap(),
            Duration::from_secs(2),
        );
        let err = client.create_charge(charge_params()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
