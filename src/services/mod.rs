pub mod gateway;
pub mod payment_service;
pub mod stripe_client;

pub use payment_service::{PaymentService, ServiceError};
pub use stripe_client::StripeClient;
