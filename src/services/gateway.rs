use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::payment::{ChargeParams, ChargeResult, RefundParams, RefundResult};

/// The external payment processor. One call per operation, no retries.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_charge(&self, params: ChargeParams) -> Result<ChargeResult, GatewayError>;

    async fn create_refund(&self, params: RefundParams) -> Result<RefundResult, GatewayError>;
}

/// Error object returned by the gateway alongside a non-2xx status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GatewayErrorDetails {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub decline_code: Option<String>,
    pub param: Option<String>,
}

impl GatewayErrorDetails {
    fn summary(&self) -> String {
        format!(
            "type={} code={} decline_code={} param={} message={}",
            self.error_type.as_deref().unwrap_or("-"),
            self.code.as_deref().unwrap_or("-"),
            self.decline_code.as_deref().unwrap_or("-"),
            self.param.as_deref().unwrap_or("-"),
            self.message.as_deref().unwrap_or("-"),
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("gateway returned HTTP {status}: {}", .details.summary())]
    Api {
        status: u16,
        details: GatewayErrorDetails,
    },
    #[error("gateway transport error: {0}")]
    Transport(String),
    #[error("gateway call timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected gateway response (HTTP {status}): {reason}")]
    Decode { status: u16, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    CardDeclined,
    ExpiredCard,
    IncorrectVerificationCode,
    InvalidRequestParameters,
    Internal,
}

impl GatewayError {
    /// Card-specific codes win over the error type; only API errors can be anything but `Internal`.
    pub fn kind(&self) -> GatewayErrorKind {
        let GatewayError::Api { details, .. } = self else {
            return GatewayErrorKind::Internal;
        };

        match details.code.as_deref() {
            Some("card_declined") => GatewayErrorKind::CardDeclined,
            Some("expired_card") => GatewayErrorKind::ExpiredCard,
            Some("incorrect_cvc") => GatewayErrorKind::IncorrectVerificationCode,
            _ if details.error_type.as_deref() == Some("invalid_request_error") => {
                GatewayErrorKind::InvalidRequestParameters
            }
            _ => GatewayErrorKind::Internal,
        }
    }
}
