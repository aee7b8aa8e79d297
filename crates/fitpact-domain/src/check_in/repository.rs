use async_trait::async_trait;
use chrono::NaiveDate;

use super::CheckIn;
use crate::shared::{CheckInId, ContractId, DomainError};

#[async_trait]
pub trait CheckInRepository: Send + Sync {
    async fn save(&self, check_in: &CheckIn) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &CheckInId) -> Result<Option<CheckIn>, DomainError>;

    /// All check-ins of a contract whose local calendar day is `date`.
    async fn find_by_contract_on_date(
        &self,
        contract_id: &ContractId,
        date: NaiveDate,
    ) -> Result<Vec<CheckIn>, DomainError>;
}
