use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::{ContractId, DomainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Cny,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Cny => "cny",
            Currency::Usd => "usd",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "cny" => Ok(Currency::Cny),
            "usd" => Ok(Currency::Usd),
            other => Err(DomainError::Validation(format!(
                "Unknown currency: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Wechat,
    Alipay,
    BankCard,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Wechat => "wechat",
            PaymentMethod::Alipay => "alipay",
            PaymentMethod::BankCard => "bank_card",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "wechat" => Ok(PaymentMethod::Wechat),
            "alipay" => Ok(PaymentMethod::Alipay),
            "bank_card" => Ok(PaymentMethod::BankCard),
            other => Err(DomainError::Validation(format!(
                "Unknown payment method: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "success" => Ok(PaymentStatus::Success),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(DomainError::Validation(format!(
                "Unknown payment status: {other}"
            ))),
        }
    }
}

/// Lifecycle summary of a deposit record, distinct from the payment state
/// machine: a record stays `Active` while it has spendable balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    Active,
    Used,
    Refunded,
    Expired,
}

impl DepositStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositStatus::Active => "active",
            DepositStatus::Used => "used",
            DepositStatus::Refunded => "refunded",
            DepositStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "active" => Ok(DepositStatus::Active),
            "used" => Ok(DepositStatus::Used),
            "refunded" => Ok(DepositStatus::Refunded),
            "expired" => Ok(DepositStatus::Expired),
            other => Err(DomainError::Validation(format!(
                "Unknown deposit status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageReason {
    Penalty,
    Refund,
    Transfer,
}

impl UsageReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageReason::Penalty => "penalty",
            UsageReason::Refund => "refund",
            UsageReason::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "penalty" => Ok(UsageReason::Penalty),
            "refund" => Ok(UsageReason::Refund),
            "transfer" => Ok(UsageReason::Transfer),
            other => Err(DomainError::Validation(format!(
                "Unknown usage reason: {other}"
            ))),
        }
    }
}

/// One partial consumption of a deposit. Entries form an append-only audit
/// trail: they are never mutated or removed once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEntry {
    contract_id: Option<ContractId>,
    used_amount: Decimal,
    used_time: DateTime<Utc>,
    reason: UsageReason,
    description: String,
}

impl UsageEntry {
    pub fn new(
        contract_id: Option<ContractId>,
        used_amount: Decimal,
        used_time: DateTime<Utc>,
        reason: UsageReason,
        description: impl Into<String>,
    ) -> Self {
        Self {
            contract_id,
            used_amount,
            used_time,
            reason,
            description: description.into(),
        }
    }

    pub fn contract_id(&self) -> Option<&ContractId> {
        self.contract_id.as_ref()
    }

    pub fn used_amount(&self) -> Decimal {
        self.used_amount
    }

    pub fn used_time(&self) -> DateTime<Utc> {
        self.used_time
    }

    pub fn reason(&self) -> UsageReason {
        self.reason
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Processing => "processing",
            RefundStatus::Completed => "completed",
            RefundStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(RefundStatus::Pending),
            "processing" => Ok(RefundStatus::Processing),
            "completed" => Ok(RefundStatus::Completed),
            "failed" => Ok(RefundStatus::Failed),
            other => Err(DomainError::Validation(format!(
                "Unknown refund status: {other}"
            ))),
        }
    }

    /// A refund that has been requested but not yet resolved by the
    /// payment collaborator's callback.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RefundStatus::Pending | RefundStatus::Processing)
    }
}

/// Outcome reported by the payment collaborator's refund callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundOutcome {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundInfo {
    refund_id: String,
    refund_amount: Decimal,
    refund_reason: String,
    refund_status: RefundStatus,
    refund_time: DateTime<Utc>,
}

impl RefundInfo {
    pub fn new(
        refund_id: impl Into<String>,
        refund_amount: Decimal,
        refund_reason: impl Into<String>,
        refund_time: DateTime<Utc>,
    ) -> Self {
        Self {
            refund_id: refund_id.into(),
            refund_amount,
            refund_reason: refund_reason.into(),
            refund_status: RefundStatus::Pending,
            refund_time,
        }
    }

    pub fn restore(
        refund_id: String,
        refund_amount: Decimal,
        refund_reason: String,
        refund_status: RefundStatus,
        refund_time: DateTime<Utc>,
    ) -> Self {
        Self {
            refund_id,
            refund_amount,
            refund_reason,
            refund_status,
            refund_time,
        }
    }

    pub fn refund_id(&self) -> &str {
        &self.refund_id
    }

    pub fn refund_amount(&self) -> Decimal {
        self.refund_amount
    }

    pub fn refund_reason(&self) -> &str {
        &self.refund_reason
    }

    pub fn refund_status(&self) -> RefundStatus {
        self.refund_status
    }

    pub fn refund_time(&self) -> DateTime<Utc> {
        self.refund_time
    }

    pub(crate) fn resolve(&mut self, status: RefundStatus, at: DateTime<Utc>) {
        self.refund_status = status;
        self.refund_time = at;
    }
}
