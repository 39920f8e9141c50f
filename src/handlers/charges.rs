use axum::{body::Bytes, extract::State, response::Response};
use std::sync::Arc;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::handlers::json_response;
use crate::services::{PaymentService, ServiceError};

pub async fn create_charge(
    State(service): State<Arc<PaymentService>>,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let span = info_span!("charge", request_id = %Uuid::new_v4());

    async move {
        let charge = service.create_charge(&body).await?;
        json_response(&charge)
    }
    .instrument(span)
    .await
}
