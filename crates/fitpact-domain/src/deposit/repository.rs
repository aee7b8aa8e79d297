use async_trait::async_trait;

use super::DepositRecord;
use crate::shared::{DepositId, DomainError, UserId};

#[async_trait]
pub trait DepositRepository: Send + Sync {
    /// Save (upsert) a deposit record together with its usage history.
    /// Usage entries are append-only; implementations must never rewrite
    /// entries that already exist.
    async fn save(&self, record: &DepositRecord) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &DepositId) -> Result<Option<DepositRecord>, DomainError>;

    /// All of a user's deposit records, newest first.
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<DepositRecord>, DomainError>;
}
