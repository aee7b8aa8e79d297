use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{CheckInStatus, CheckInType};
use crate::shared::{CheckInId, ContractId, DomainError, UserId};

/// One submitted check-in. Belongs to exactly one calendar day, pinned at
/// creation from the user's UTC offset so later evaluation never re-derives
/// the day boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    id: CheckInId,
    user_id: UserId,
    contract_id: ContractId,
    check_in_type: CheckInType,
    timestamp: DateTime<Utc>,
    local_date: NaiveDate,
    status: CheckInStatus,
}

impl CheckIn {
    pub fn new(
        user_id: UserId,
        contract_id: ContractId,
        check_in_type: CheckInType,
        timestamp: DateTime<Utc>,
        local_offset: FixedOffset,
    ) -> Self {
        let local_date = timestamp.with_timezone(&local_offset).date_naive();
        Self {
            id: CheckInId::new(),
            user_id,
            contract_id,
            check_in_type,
            timestamp,
            local_date,
            status: CheckInStatus::Pending,
        }
    }

    /// Reconstruct from persistence
    pub fn restore(
        id: CheckInId,
        user_id: UserId,
        contract_id: ContractId,
        check_in_type: CheckInType,
        timestamp: DateTime<Utc>,
        local_date: NaiveDate,
        status: CheckInStatus,
    ) -> Self {
        Self {
            id,
            user_id,
            contract_id,
            check_in_type,
            timestamp,
            local_date,
            status,
        }
    }

    pub fn id(&self) -> &CheckInId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn contract_id(&self) -> &ContractId {
        &self.contract_id
    }

    pub fn check_in_type(&self) -> CheckInType {
        self.check_in_type
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn local_date(&self) -> NaiveDate {
        self.local_date
    }

    pub fn status(&self) -> CheckInStatus {
        self.status
    }

    pub fn is_approved(&self) -> bool {
        self.status == CheckInStatus::Approved
    }

    pub fn approve(&mut self) -> Result<(), DomainError> {
        if self.status != CheckInStatus::Pending {
            return Err(DomainError::AlreadyFinalized(format!(
                "Check-in {} already {}",
                self.id,
                self.status.as_str()
            )));
        }
        self.status = CheckInStatus::Approved;
        Ok(())
    }

    pub fn reject(&mut self) -> Result<(), DomainError> {
        if self.status != CheckInStatus::Pending {
            return Err(DomainError::AlreadyFinalized(format!(
                "Check-in {} already {}",
                self.id,
                self.status.as_str()
            )));
        }
        self.status = CheckInStatus::Rejected;
        Ok(())
    }
}
