use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::persistence::SqliteRepositoryBase;
use fitpact_domain::check_in::{CheckIn, CheckInRepository, CheckInStatus, CheckInType};
use fitpact_domain::shared::{CheckInId, ContractId, DomainError, UserId};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(FromRow)]
struct CheckInRow {
    id: String,
    user_id: String,
    contract_id: String,
    check_in_type: String,
    timestamp: DateTime<Utc>,
    local_date: String,
    status: String,
}

impl CheckInRow {
    fn try_into_check_in(self) -> Result<CheckIn, DomainError> {
        let local_date = NaiveDate::parse_from_str(&self.local_date, DATE_FORMAT)
            .map_err(|e| {
                DomainError::Validation(format!("Invalid local_date: {} ({e})", self.local_date))
            })?;

        Ok(CheckIn::restore(
            CheckInId::from_string(&self.id),
            UserId::from_string(&self.user_id),
            ContractId::from_string(&self.contract_id),
            CheckInType::parse(&self.check_in_type)?,
            self.timestamp,
            local_date,
            CheckInStatus::parse(&self.status)?,
        ))
    }
}

pub struct SqliteCheckInRepository {
    base: SqliteRepositoryBase,
}

impl SqliteCheckInRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }
}

#[async_trait]
impl CheckInRepository for SqliteCheckInRepository {
    async fn save(&self, check_in: &CheckIn) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO check_ins (
                id, user_id, contract_id, check_in_type, timestamp, local_date, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                status = ?7
        "#;

        self.base
            .execute(
                sqlx::query(query)
                    .bind(check_in.id().as_str())
                    .bind(check_in.user_id().as_str())
                    .bind(check_in.contract_id().as_str())
                    .bind(check_in.check_in_type().as_str())
                    .bind(check_in.timestamp())
                    .bind(check_in.local_date().format(DATE_FORMAT).to_string())
                    .bind(check_in.status().as_str()),
                "Save check-in",
            )
            .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &CheckInId) -> Result<Option<CheckIn>, DomainError> {
        let query = r#"
            SELECT id, user_id, contract_id, check_in_type, timestamp, local_date, status
            FROM check_ins
            WHERE id = ?1
        "#;

        let row: Option<CheckInRow> = self
            .base
            .fetch_optional(sqlx::query_as(query).bind(id.as_str()), "Find check-in by ID")
            .await?;

        row.map(|r| r.try_into_check_in()).transpose()
    }

    async fn find_by_contract_on_date(
        &self,
        contract_id: &ContractId,
        date: NaiveDate,
    ) -> Result<Vec<CheckIn>, DomainError> {
        let query = r#"
            SELECT id, user_id, contract_id, check_in_type, timestamp, local_date, status
            FROM check_ins
            WHERE contract_id = ?1 AND local_date = ?2
            ORDER BY timestamp ASC
        "#;

        let rows: Vec<CheckInRow> = self
            .base
            .fetch_all(
                sqlx::query_as(query)
                    .bind(contract_id.as_str())
                    .bind(date.format(DATE_FORMAT).to_string()),
                "Find check-ins by contract and date",
            )
            .await?;

        rows.into_iter().map(|r| r.try_into_check_in()).collect()
    }
}
