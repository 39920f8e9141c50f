use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::ServiceError;

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::MalformedRequest(_)
            | ServiceError::InvalidField(_)
            | ServiceError::InvalidRequestParameters => StatusCode::BAD_REQUEST,
            ServiceError::CardDeclined
            | ServiceError::ExpiredCard
            | ServiceError::IncorrectVerificationCode => StatusCode::PAYMENT_REQUIRED,
            ServiceError::GatewayInternal(_) | ServiceError::Encoding => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::MalformedRequest(_) => "malformed_request",
            ServiceError::InvalidField(_) => "invalid_field",
            ServiceError::CardDeclined => "card_declined",
            ServiceError::ExpiredCard => "expired_card",
            ServiceError::IncorrectVerificationCode => "incorrect_cvc",
            ServiceError::InvalidRequestParameters => "invalid_request_parameters",
            ServiceError::GatewayInternal(_) => "gateway_error",
            ServiceError::Encoding => "encoding_error",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(json!({
                "error": self.error_code(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::RefundRequest;

    #[test]
    fn test_status_mapping() {
        let malformed = serde_json::from_str::<RefundRequest>("nope").unwrap_err();
        assert_eq!(
            ServiceError::MalformedRequest(malformed).status_code(),
            StatusCode::BAD_REQUEST
        );
        let invalid = RefundRequest::default().validate().unwrap_err();
        assert_eq!(
            ServiceError::InvalidField(invalid).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidRequestParameters.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::CardDeclined.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(ServiceError::ExpiredCard.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            ServiceError::IncorrectVerificationCode.status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ServiceError::GatewayInternal("Refund failed").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::Encoding.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_malformed_message_hides_parser_detail() {
        let err = serde_json::from_str::<RefundRequest>("{\"charge_id\": tru").unwrap_err();
        let err = ServiceError::MalformedRequest(err);
        assert_eq!(err.to_string(), "Invalid request payload");
        assert_eq!(err.error_code(), "malformed_request");
    }
}
