use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Pending,
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Pending => "pending",
            ContractStatus::Active => "active",
            ContractStatus::Completed => "completed",
            ContractStatus::Failed => "failed",
            ContractStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(ContractStatus::Pending),
            "active" => Ok(ContractStatus::Active),
            "completed" => Ok(ContractStatus::Completed),
            "failed" => Ok(ContractStatus::Failed),
            "cancelled" => Ok(ContractStatus::Cancelled),
            other => Err(DomainError::Validation(format!(
                "Unknown contract status: {other}"
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ContractStatus::Completed | ContractStatus::Failed | ContractStatus::Cancelled
        )
    }
}

/// Result of evaluating one calendar day of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOutcome {
    /// Rest day or out-of-period date; counts toward nothing.
    Neutral,
    /// All required check-ins approved; the day is banked.
    Completed,
    /// The day fully elapsed with required check-ins missing.
    Violated,
    /// The day is still in progress; judgement deferred.
    Pending,
}
