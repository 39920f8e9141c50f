use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers::{charges, health, refunds};
use crate::services::PaymentService;

pub fn build_router(payment_service: Arc<PaymentService>) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/charge", post(charges::create_charge))
        .route("/refund", post(refunds::create_refund))
        .with_state(payment_service)
}
