use async_trait::async_trait;

use super::Contract;
use crate::shared::{ContractId, DomainError, UserId};

#[async_trait]
pub trait ContractRepository: Send + Sync {
    /// Save (upsert) a contract together with its counted/penalized date
    /// marks. Marks are append-only.
    async fn save(&self, contract: &Contract) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &ContractId) -> Result<Option<Contract>, DomainError>;

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<Contract>, DomainError>;
}
