use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::deposit::PaymentMethod;
use crate::shared::DomainError;

/// Result of asking the payment collaborator to collect a deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub payment_url: String,
    pub qr_code: String,
}

/// Handle returned by the payment collaborator for a submitted refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalRefund {
    pub refund_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Success,
    Failed,
}

/// Inbound payment-status event. The gateway delivers this after the user
/// completes (or abandons) the payment flow; it is an already-decided
/// external fact by the time the ledger sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub order_id: String,
    pub transaction_id: String,
    pub status: PaymentOutcome,
    pub payment_time: DateTime<Utc>,
}

/// Payment collaborator interface. Signature generation and vendor
/// protocol framing live behind this boundary, outside the core.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        order_id: &str,
        amount: Decimal,
        method: PaymentMethod,
        description: &str,
    ) -> Result<PaymentIntent, DomainError>;

    async fn request_refund(
        &self,
        order_id: &str,
        transaction_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> Result<ExternalRefund, DomainError>;
}
