use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::contract::ContractStatus;
use crate::shared::{DomainError, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ViolationRecorded,
    RefundRequested,
    ContractSettled,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ViolationRecorded => "violation_recorded",
            NotificationKind::RefundRequested => "refund_requested",
            NotificationKind::ContractSettled => "contract_settled",
        }
    }
}

/// Notification message to be delivered to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub content: String,
}

impl NotificationMessage {
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn violation(user_id: UserId, applied: Decimal, remaining: Decimal) -> Self {
        Self::new(
            user_id,
            NotificationKind::ViolationRecorded,
            "Missed check-in penalty",
            format!("A penalty of {applied} was deducted from your deposit; {remaining} remains."),
        )
    }

    pub fn refund_requested(user_id: UserId, amount: Decimal) -> Self {
        Self::new(
            user_id,
            NotificationKind::RefundRequested,
            "Refund requested",
            format!("A refund of {amount} has been submitted and is being processed."),
        )
    }

    pub fn contract_settled(
        user_id: UserId,
        final_status: ContractStatus,
        refund_requested: Decimal,
    ) -> Self {
        Self::new(
            user_id,
            NotificationKind::ContractSettled,
            "Contract settled",
            format!(
                "Your contract ended as {}; a refund of {refund_requested} was requested.",
                final_status.as_str()
            ),
        )
    }
}

/// Notification collaborator, fire-and-forget: a delivery failure must
/// never roll back the ledger mutation that triggered it.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, message: &NotificationMessage) -> Result<(), DomainError>;
}
