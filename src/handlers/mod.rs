pub mod charges;
pub mod error;
pub mod health;
pub mod refunds;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::services::ServiceError;

/// Serializes before anything is written so an encoding failure can still become a 500.
pub(crate) fn json_response<T: Serialize>(value: &T) -> Result<Response, ServiceError> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response()),
        Err(e) => {
            error!("Error encoding response: {}", e);
            Err(ServiceError::Encoding)
        }
    }
}
