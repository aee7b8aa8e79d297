use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInType {
    Breakfast,
    Lunch,
    Dinner,
    Gym,
    Protein,
}

impl CheckInType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInType::Breakfast => "breakfast",
            CheckInType::Lunch => "lunch",
            CheckInType::Dinner => "dinner",
            CheckInType::Gym => "gym",
            CheckInType::Protein => "protein",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "breakfast" => Ok(CheckInType::Breakfast),
            "lunch" => Ok(CheckInType::Lunch),
            "dinner" => Ok(CheckInType::Dinner),
            "gym" => Ok(CheckInType::Gym),
            "protein" => Ok(CheckInType::Protein),
            other => Err(DomainError::Validation(format!(
                "Unknown check-in type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    Pending,
    Approved,
    Rejected,
}

impl CheckInStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInStatus::Pending => "pending",
            CheckInStatus::Approved => "approved",
            CheckInStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(CheckInStatus::Pending),
            "approved" => Ok(CheckInStatus::Approved),
            "rejected" => Ok(CheckInStatus::Rejected),
            other => Err(DomainError::Validation(format!(
                "Unknown check-in status: {other}"
            ))),
        }
    }
}
