use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate view over all of a user's deposit records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositStatsDto {
    /// Sum of all funded deposits.
    pub total_deposit: Decimal,
    pub record_count: u32,
    /// Sum of completed refunds.
    pub total_refunded: Decimal,
    /// Spendable balance across active records.
    pub available_deposit: Decimal,
    /// Consumed by usage but neither refunded nor spendable: penalties and
    /// transfers already taken out of the deposits.
    pub frozen_deposit: Decimal,
    pub last_deposit_at: Option<DateTime<Utc>>,
}
