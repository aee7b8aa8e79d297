use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqlitePool};

use crate::persistence::SqliteRepositoryBase;
use fitpact_domain::deposit::{
    Currency, DepositRecord, DepositRepository, DepositStatus, PaymentMethod, PaymentStatus,
    RefundInfo, RefundStatus, UsageEntry, UsageReason,
};
use fitpact_domain::shared::{ContractId, DepositId, DomainError, UserId};

pub(super) fn parse_decimal(value: &str, field: &str) -> Result<Decimal, DomainError> {
    Decimal::from_str(value)
        .map_err(|e| DomainError::Validation(format!("Invalid {field}: {value} ({e})")))
}

#[derive(FromRow)]
struct DepositRow {
    id: String,
    user_id: String,
    contract_id: Option<String>,
    amount: String,
    currency: String,
    payment_method: String,
    payment_status: String,
    transaction_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    refund_id: Option<String>,
    refund_amount: Option<String>,
    refund_reason: Option<String>,
    refund_status: Option<String>,
    refund_time: Option<DateTime<Utc>>,
    status: String,
    expiry_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl DepositRow {
    fn try_into_record(self, usage_history: Vec<UsageEntry>) -> Result<DepositRecord, DomainError> {
        let refund_info = match self.refund_id {
            Some(refund_id) => {
                let (amount, reason, status, time) = match (
                    self.refund_amount,
                    self.refund_reason,
                    self.refund_status,
                    self.refund_time,
                ) {
                    (Some(amount), Some(reason), Some(status), Some(time)) => {
                        (amount, reason, status, time)
                    }
                    _ => {
                        return Err(DomainError::Validation(format!(
                            "Deposit {}: refund columns incomplete",
                            self.id
                        )))
                    }
                };
                Some(RefundInfo::restore(
                    refund_id,
                    parse_decimal(&amount, "refund_amount")?,
                    reason,
                    RefundStatus::parse(&status)?,
                    time,
                ))
            }
            None => None,
        };

        Ok(DepositRecord::restore(
            DepositId::from_string(&self.id),
            UserId::from_string(&self.user_id),
            self.contract_id.as_deref().map(ContractId::from_string),
            parse_decimal(&self.amount, "amount")?,
            Currency::parse(&self.currency)?,
            PaymentMethod::parse(&self.payment_method)?,
            PaymentStatus::parse(&self.payment_status)?,
            self.transaction_id,
            self.paid_at,
            usage_history,
            refund_info,
            DepositStatus::parse(&self.status)?,
            self.expiry_date,
            self.created_at,
        ))
    }
}

#[derive(FromRow)]
struct UsageEntryRow {
    contract_id: Option<String>,
    used_amount: String,
    used_time: DateTime<Utc>,
    reason: String,
    description: String,
}

impl UsageEntryRow {
    fn try_into_entry(self) -> Result<UsageEntry, DomainError> {
        Ok(UsageEntry::new(
            self.contract_id.as_deref().map(ContractId::from_string),
            parse_decimal(&self.used_amount, "used_amount")?,
            self.used_time,
            UsageReason::parse(&self.reason)?,
            self.description,
        ))
    }
}

pub struct SqliteDepositRepository {
    base: SqliteRepositoryBase,
}

impl SqliteDepositRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }

    async fn load_usage_history(&self, deposit_id: &str) -> Result<Vec<UsageEntry>, DomainError> {
        let query = r#"
            SELECT contract_id, used_amount, used_time, reason, description
            FROM deposit_usage_entries
            WHERE deposit_id = ?1
            ORDER BY seq ASC
        "#;

        let rows: Vec<UsageEntryRow> = self
            .base
            .fetch_all(
                sqlx::query_as(query).bind(deposit_id),
                "Load deposit usage history",
            )
            .await?;

        rows.into_iter().map(|r| r.try_into_entry()).collect()
    }
}

#[async_trait]
impl DepositRepository for SqliteDepositRepository {
    async fn save(&self, record: &DepositRecord) -> Result<(), DomainError> {
        let mut tx = self
            .base
            .pool()
            .begin()
            .await
            .map_err(|e| DomainError::Repository(format!("Begin transaction: {e}")))?;

        let record_query = r#"
            INSERT INTO deposit_records (
                id, user_id, contract_id, amount, currency, payment_method,
                payment_status, transaction_id, paid_at,
                refund_id, refund_amount, refund_reason, refund_status, refund_time,
                status, expiry_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ON CONFLICT(id) DO UPDATE SET
                payment_status = ?7,
                transaction_id = ?8,
                paid_at = ?9,
                refund_id = ?10,
                refund_amount = ?11,
                refund_reason = ?12,
                refund_status = ?13,
                refund_time = ?14,
                status = ?15,
                expiry_date = ?16
        "#;

        let refund = record.refund_info();
        sqlx::query(record_query)
            .bind(record.id().as_str())
            .bind(record.user_id().as_str())
            .bind(record.contract_id().map(|id| id.as_str().to_string()))
            .bind(record.amount().to_string())
            .bind(record.currency().as_str())
            .bind(record.payment_method().as_str())
            .bind(record.payment_status().as_str())
            .bind(record.transaction_id())
            .bind(record.paid_at())
            .bind(refund.map(|r| r.refund_id().to_string()))
            .bind(refund.map(|r| r.refund_amount().to_string()))
            .bind(refund.map(|r| r.refund_reason().to_string()))
            .bind(refund.map(|r| r.refund_status().as_str()))
            .bind(refund.map(|r| r.refund_time()))
            .bind(record.status().as_str())
            .bind(record.expiry_date())
            .bind(record.created_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::Repository(format!("Save deposit record: {e}")))?;

        // Usage entries are append-only: rows already present are left
        // untouched, new tail entries are inserted by sequence position.
        let entry_query = r#"
            INSERT OR IGNORE INTO deposit_usage_entries (
                deposit_id, seq, contract_id, used_amount, used_time, reason, description
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#;

        for (seq, entry) in record.usage_history().iter().enumerate() {
            sqlx::query(entry_query)
                .bind(record.id().as_str())
                .bind(seq as i64)
                .bind(entry.contract_id().map(|id| id.as_str().to_string()))
                .bind(entry.used_amount().to_string())
                .bind(entry.used_time())
                .bind(entry.reason().as_str())
                .bind(entry.description())
                .execute(&mut *tx)
                .await
                .map_err(|e| DomainError::Repository(format!("Save usage entry: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::Repository(format!("Commit deposit save: {e}")))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &DepositId) -> Result<Option<DepositRecord>, DomainError> {
        let query = r#"
            SELECT id, user_id, contract_id, amount, currency, payment_method,
                   payment_status, transaction_id, paid_at,
                   refund_id, refund_amount, refund_reason, refund_status, refund_time,
                   status, expiry_date, created_at
            FROM deposit_records
            WHERE id = ?1
        "#;

        let row: Option<DepositRow> = self
            .base
            .fetch_optional(sqlx::query_as(query).bind(id.as_str()), "Find deposit by ID")
            .await?;

        match row {
            Some(row) => {
                let usage = self.load_usage_history(&row.id).await?;
                Ok(Some(row.try_into_record(usage)?))
            }
            None => Ok(None),
        }
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<DepositRecord>, DomainError> {
        let query = r#"
            SELECT id, user_id, contract_id, amount, currency, payment_method,
                   payment_status, transaction_id, paid_at,
                   refund_id, refund_amount, refund_reason, refund_status, refund_time,
                   status, expiry_date, created_at
            FROM deposit_records
            WHERE user_id = ?1
            ORDER BY created_at DESC
        "#;

        let rows: Vec<DepositRow> = self
            .base
            .fetch_all(
                sqlx::query_as(query).bind(user_id.as_str()),
                "Find deposits by user ID",
            )
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let usage = self.load_usage_history(&row.id).await?;
            records.push(row.try_into_record(usage)?);
        }
        Ok(records)
    }
}
