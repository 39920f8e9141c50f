use crate::models::payment::{
    ChargeParams, ChargeRequest, ChargeResponse, InvalidField, RefundParams, RefundRequest,
    RefundResponse,
};
use crate::services::gateway::{GatewayError, GatewayErrorKind, PaymentGateway};
use crate::utils::money::format_amount;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

const CHARGE_FAILED: &str = "Payment processing error";
const REFUND_FAILED: &str = "Refund failed";

/// Everything a request can end in besides success. Display text is safe to return to callers.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid request payload")]
    MalformedRequest(#[source] serde_json::Error),
    #[error(transparent)]
    InvalidField(#[from] InvalidField),
    #[error("Card was declined")]
    CardDeclined,
    #[error("Card has expired")]
    ExpiredCard,
    #[error("Incorrect CVC")]
    IncorrectVerificationCode,
    #[error("Invalid request parameters")]
    InvalidRequestParameters,
    #[error("{0}")]
    GatewayInternal(&'static str),
    #[error("Failed to encode response")]
    Encoding,
}

impl ServiceError {
    /// Maps a gateway failure onto the caller-facing taxonomy. `internal` is the
    /// operation-specific message used for unclassified failures.
    fn from_gateway(err: &GatewayError, internal: &'static str) -> Self {
        match err.kind() {
            GatewayErrorKind::CardDeclined => ServiceError::CardDeclined,
            GatewayErrorKind::ExpiredCard => ServiceError::ExpiredCard,
            GatewayErrorKind::IncorrectVerificationCode => ServiceError::IncorrectVerificationCode,
            GatewayErrorKind::InvalidRequestParameters => ServiceError::InvalidRequestParameters,
            GatewayErrorKind::Internal => ServiceError::GatewayInternal(internal),
        }
    }
}

/// Stateless charge/refund pipeline: decode, validate, one gateway call, translate.
pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    call_timeout: Duration,
}

impl PaymentService {
    pub fn new(gateway: Arc<dyn PaymentGateway>, call_timeout: Duration) -> Self {
        Self {
            gateway,
            call_timeout,
        }
    }

    pub async fn create_charge(&self, body: &[u8]) -> Result<ChargeResponse, ServiceError> {
        let request: ChargeRequest = decode(body)?;
        request.validate().map_err(|e| {
            warn!(invalid_field = e.field, "Validation error: {}", e);
            e
        })?;

        info!(
            "Processing payment: {}",
            format_amount(request.amount, &request.currency)
        );

        let params = ChargeParams::from(request);
        match self.invoke(self.gateway.create_charge(params)).await {
            Ok(charge) => {
                info!(
                    charge_id = %charge.id,
                    status = %charge.status,
                    receipt_url = charge.receipt_url.as_deref().unwrap_or("-"),
                    "Charge succeeded: {}",
                    format_amount(charge.amount, &charge.currency)
                );
                Ok(ChargeResponse::from(charge))
            }
            Err(e) => Err(self.reject("Charge", &e, CHARGE_FAILED)),
        }
    }

    pub async fn create_refund(&self, body: &[u8]) -> Result<RefundResponse, ServiceError> {
        let request: RefundRequest = decode(body)?;
        request.validate().map_err(|e| {
            warn!(invalid_field = e.field, "Validation error: {}", e);
            e
        })?;

        info!(charge_id = %request.charge_id, "Processing refund");

        let params = RefundParams::from(request);
        match self.invoke(self.gateway.create_refund(params)).await {
            Ok(refund) => {
                info!(
                    refund_id = %refund.id,
                    amount = refund.amount,
                    status = %refund.status,
                    "Refund succeeded"
                );
                Ok(RefundResponse::from(refund))
            }
            Err(e) => Err(self.reject("Refund", &e, REFUND_FAILED)),
        }
    }

    async fn invoke<T, F>(&self, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.call_timeout)),
        }
    }

    // The raw gateway error only ever reaches the log.
    fn reject(&self, operation: &str, err: &GatewayError, internal: &'static str) -> ServiceError {
        let mapped = ServiceError::from_gateway(err, internal);
        match mapped {
            ServiceError::GatewayInternal(_) => {
                error!("{} failed: {}", operation, err);
            }
            _ => {
                warn!("{} failed: {} - {}", operation, mapped, err);
            }
        }
        mapped
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!("Invalid request payload: {}", e);
        ServiceError::MalformedRequest(e)
    })
}
