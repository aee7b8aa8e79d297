use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};

use super::deposit_repo::parse_decimal;
use crate::persistence::SqliteRepositoryBase;
use fitpact_domain::contract::{Contract, ContractRepository, ContractStatus};
use fitpact_domain::shared::{ContractId, DepositId, DomainError, UserId};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| DomainError::Validation(format!("Invalid {field}: {value} ({e})")))
}

#[derive(FromRow)]
struct ContractRow {
    id: String,
    user_id: String,
    deposit_id: Option<String>,
    amount: String,
    start_date: String,
    end_date: String,
    status: String,
    completed_days: i64,
    violation_days: i64,
    violation_penalty: String,
    remainder_amount: String,
    accumulated_penalty: String,
    created_at: DateTime<Utc>,
}

impl ContractRow {
    fn try_into_contract(
        self,
        counted_dates: BTreeSet<NaiveDate>,
        penalized_dates: BTreeSet<NaiveDate>,
    ) -> Result<Contract, DomainError> {
        Ok(Contract::restore(
            ContractId::from_string(&self.id),
            UserId::from_string(&self.user_id),
            self.deposit_id.as_deref().map(DepositId::from_string),
            parse_decimal(&self.amount, "amount")?,
            parse_date(&self.start_date, "start_date")?,
            parse_date(&self.end_date, "end_date")?,
            ContractStatus::parse(&self.status)?,
            self.completed_days as u32,
            self.violation_days as u32,
            parse_decimal(&self.violation_penalty, "violation_penalty")?,
            parse_decimal(&self.remainder_amount, "remainder_amount")?,
            parse_decimal(&self.accumulated_penalty, "accumulated_penalty")?,
            counted_dates,
            penalized_dates,
            self.created_at,
        ))
    }
}

#[derive(FromRow)]
struct DayMarkRow {
    mark_date: String,
    kind: String,
}

pub struct SqliteContractRepository {
    base: SqliteRepositoryBase,
}

impl SqliteContractRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }

    async fn load_day_marks(
        &self,
        contract_id: &str,
    ) -> Result<(BTreeSet<NaiveDate>, BTreeSet<NaiveDate>), DomainError> {
        let query = r#"
            SELECT mark_date, kind
            FROM contract_day_marks
            WHERE contract_id = ?1
        "#;

        let rows: Vec<DayMarkRow> = self
            .base
            .fetch_all(
                sqlx::query_as(query).bind(contract_id),
                "Load contract day marks",
            )
            .await?;

        let mut counted = BTreeSet::new();
        let mut penalized = BTreeSet::new();
        for row in rows {
            let date = parse_date(&row.mark_date, "mark_date")?;
            match row.kind.as_str() {
                "completed" => {
                    counted.insert(date);
                }
                "penalized" => {
                    penalized.insert(date);
                }
                other => {
                    return Err(DomainError::Validation(format!(
                        "Unknown day mark kind: {other}"
                    )))
                }
            }
        }
        Ok((counted, penalized))
    }

    async fn load_with_marks(&self, row: ContractRow) -> Result<Contract, DomainError> {
        let (counted, penalized) = self.load_day_marks(&row.id).await?;
        row.try_into_contract(counted, penalized)
    }
}

#[async_trait]
impl ContractRepository for SqliteContractRepository {
    async fn save(&self, contract: &Contract) -> Result<(), DomainError> {
        let mut tx = self
            .base
            .pool()
            .begin()
            .await
            .map_err(|e| DomainError::Repository(format!("Begin transaction: {e}")))?;

        let contract_query = r#"
            INSERT INTO contracts (
                id, user_id, deposit_id, amount, start_date, end_date, status,
                completed_days, violation_days, violation_penalty,
                remainder_amount, accumulated_penalty, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(id) DO UPDATE SET
                status = ?7,
                completed_days = ?8,
                violation_days = ?9,
                accumulated_penalty = ?12
        "#;

        sqlx::query(contract_query)
            .bind(contract.id().as_str())
            .bind(contract.user_id().as_str())
            .bind(contract.deposit_id().map(|id| id.as_str().to_string()))
            .bind(contract.amount().to_string())
            .bind(contract.start_date().format(DATE_FORMAT).to_string())
            .bind(contract.end_date().format(DATE_FORMAT).to_string())
            .bind(contract.status().as_str())
            .bind(contract.completed_days() as i64)
            .bind(contract.violation_days() as i64)
            .bind(contract.violation_penalty().to_string())
            .bind(contract.remainder_amount().to_string())
            .bind(contract.accumulated_penalty().to_string())
            .bind(contract.created_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::Repository(format!("Save contract: {e}")))?;

        let mark_query = r#"
            INSERT OR IGNORE INTO contract_day_marks (contract_id, mark_date, kind)
            VALUES (?1, ?2, ?3)
        "#;

        for (dates, kind) in [
            (contract.counted_dates(), "completed"),
            (contract.penalized_dates(), "penalized"),
        ] {
            for date in dates {
                sqlx::query(mark_query)
                    .bind(contract.id().as_str())
                    .bind(date.format(DATE_FORMAT).to_string())
                    .bind(kind)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| DomainError::Repository(format!("Save day mark: {e}")))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::Repository(format!("Commit contract save: {e}")))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &ContractId) -> Result<Option<Contract>, DomainError> {
        let query = r#"
            SELECT id, user_id, deposit_id, amount, start_date, end_date, status,
                   completed_days, violation_days, violation_penalty,
                   remainder_amount, accumulated_penalty, created_at
            FROM contracts
            WHERE id = ?1
        "#;

        let row: Option<ContractRow> = self
            .base
            .fetch_optional(sqlx::query_as(query).bind(id.as_str()), "Find contract by ID")
            .await?;

        match row {
            Some(row) => Ok(Some(self.load_with_marks(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<Contract>, DomainError> {
        let query = r#"
            SELECT id, user_id, deposit_id, amount, start_date, end_date, status,
                   completed_days, violation_days, violation_penalty,
                   remainder_amount, accumulated_penalty, created_at
            FROM contracts
            WHERE user_id = ?1
            ORDER BY created_at DESC
        "#;

        let rows: Vec<ContractRow> = self
            .base
            .fetch_all(
                sqlx::query_as(query).bind(user_id.as_str()),
                "Find contracts by user ID",
            )
            .await?;

        let mut contracts = Vec::with_capacity(rows.len());
        for row in rows {
            contracts.push(self.load_with_marks(row).await?);
        }
        Ok(contracts)
    }
}
