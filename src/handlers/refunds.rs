use axum::{body::Bytes, extract::State, response::Response};
use std::sync::Arc;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::handlers::json_response;
use crate::services::{PaymentService, ServiceError};

pub async fn create_refund(
    State(service): State<Arc<PaymentService>>,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let span = info_span!("refund", request_id = %Uuid::new_v4());

    async move {
        let refund = service.create_refund(&body).await?;
        json_response(&refund)
    }
    .instrument(span)
    .await
}
