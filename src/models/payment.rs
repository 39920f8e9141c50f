use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of `POST /charge`. Missing fields decode to zero values and fail validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeRequest {
    /// Amount in minor units (cents for USD)
    pub amount: i64,
    pub currency: String,
    /// Tokenized payment source, e.g. `tok_visa`
    pub source: String,
}

/// Body of `POST /refund`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundRequest {
    pub charge_id: String,
}

/// First validation rule a request broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvalidField {
    pub field: &'static str,
    pub message: &'static str,
}

impl InvalidField {
    const fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl ChargeRequest {
    /// Checks amount, currency, source in that order.
    pub fn validate(&self) -> Result<(), InvalidField> {
        if self.amount <= 0 {
            return Err(InvalidField::new(
                "amount",
                "invalid amount: must be greater than 0",
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(InvalidField::new(
                "currency",
                "invalid currency: must not be empty",
            ));
        }
        if self.source.trim().is_empty() {
            return Err(InvalidField::new(
                "source",
                "invalid source: must not be empty",
            ));
        }
        Ok(())
    }
}

impl RefundRequest {
    pub fn validate(&self) -> Result<(), InvalidField> {
        if self.charge_id.trim().is_empty() {
            return Err(InvalidField::new("charge_id", "Missing charge_id"));
        }
        Ok(())
    }
}

// Form payloads sent to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeParams {
    pub amount: i64,
    pub currency: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundParams {
    pub charge: String,
}

impl From<ChargeRequest> for ChargeParams {
    fn from(req: ChargeRequest) -> Self {
        Self {
            amount: req.amount,
            currency: req.currency,
            source: req.source,
        }
    }
}

impl From<RefundRequest> for RefundParams {
    fn from(req: RefundRequest) -> Self {
        Self {
            charge: req.charge_id,
        }
    }
}

/// Charge as reported by the gateway. Unlisted gateway fields are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChargeResult {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub receipt_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefundResult {
    pub id: String,
    pub amount: i64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeResponse {
    pub charge_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub receipt_url: Option<String>,
}

impl From<ChargeResult> for ChargeResponse {
    fn from(charge: ChargeResult) -> Self {
        Self {
            charge_id: charge.id,
            amount: charge.amount,
            currency: charge.currency,
            status: charge.status,
            receipt_url: charge.receipt_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundResponse {
    pub refund_id: String,
    pub amount: i64,
    pub status: String,
}

impl From<RefundResult> for RefundResponse {
    fn from(refund: RefundResult) -> Self {
        Self {
            refund_id: refund.id,
            amount: refund.amount,
            status: refund.status,
        }
    }
}
