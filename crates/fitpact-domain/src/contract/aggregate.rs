use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain_service::PenaltyPolicy;
use super::value_objects::ContractStatus;
use crate::shared::{ContractId, DepositId, DomainError, UserId};

/// A commitment contract: a date range of required daily check-ins backed
/// by a deposit, with a flat penalty forfeited per missed day.
///
/// The contract owns the penalty decisions; the deposit ledger owns the
/// money. `violation_penalty` and `remainder_amount` are fixed at creation
/// so the sum of all chargeable penalties plus the remainder always equals
/// the original amount exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    id: ContractId,
    user_id: UserId,
    deposit_id: Option<DepositId>,
    amount: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: ContractStatus,
    completed_days: u32,
    violation_days: u32,
    violation_penalty: Decimal,
    remainder_amount: Decimal,
    accumulated_penalty: Decimal,
    counted_dates: BTreeSet<NaiveDate>,
    penalized_dates: BTreeSet<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl Contract {
    pub fn new(
        user_id: UserId,
        amount: Decimal,
        start_date: NaiveDate,
        end_date: NaiveDate,
        deposit_id: Option<DepositId>,
    ) -> Result<Self, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "Contract amount must be positive, got {amount}"
            )));
        }
        if end_date < start_date {
            return Err(DomainError::Validation(format!(
                "Contract end date {end_date} precedes start date {start_date}"
            )));
        }

        let split = PenaltyPolicy::split(amount);
        Ok(Self {
            id: ContractId::new(),
            user_id,
            deposit_id,
            amount,
            start_date,
            end_date,
            status: ContractStatus::Pending,
            completed_days: 0,
            violation_days: 0,
            violation_penalty: split.violation_penalty,
            remainder_amount: split.remainder,
            accumulated_penalty: Decimal::ZERO,
            counted_dates: BTreeSet::new(),
            penalized_dates: BTreeSet::new(),
            created_at: Utc::now(),
        })
    }

    /// Reconstruct from persistence
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ContractId,
        user_id: UserId,
        deposit_id: Option<DepositId>,
        amount: Decimal,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: ContractStatus,
        completed_days: u32,
        violation_days: u32,
        violation_penalty: Decimal,
        remainder_amount: Decimal,
        accumulated_penalty: Decimal,
        counted_dates: BTreeSet<NaiveDate>,
        penalized_dates: BTreeSet<NaiveDate>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            deposit_id,
            amount,
            start_date,
            end_date,
            status,
            completed_days,
            violation_days,
            violation_penalty,
            remainder_amount,
            accumulated_penalty,
            counted_dates,
            penalized_dates,
            created_at,
        }
    }

    pub fn id(&self) -> &ContractId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn deposit_id(&self) -> Option<&DepositId> {
        self.deposit_id.as_ref()
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn status(&self) -> ContractStatus {
        self.status
    }

    pub fn completed_days(&self) -> u32 {
        self.completed_days
    }

    pub fn violation_days(&self) -> u32 {
        self.violation_days
    }

    pub fn violation_penalty(&self) -> Decimal {
        self.violation_penalty
    }

    pub fn remainder_amount(&self) -> Decimal {
        self.remainder_amount
    }

    pub fn accumulated_penalty(&self) -> Decimal {
        self.accumulated_penalty
    }

    pub fn counted_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.counted_dates
    }

    pub fn penalized_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.penalized_dates
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_active(&self) -> bool {
        self.status == ContractStatus::Active
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Contract length in days, both endpoints inclusive.
    pub fn total_days(&self) -> u32 {
        (self.end_date - self.start_date).num_days() as u32 + 1
    }

    pub fn days_accounted(&self) -> u32 {
        self.completed_days + self.violation_days
    }

    /// What is left of the deposit after penalties, clamped at zero.
    pub fn remaining_amount(&self) -> Decimal {
        let remaining = self.amount - self.accumulated_penalty;
        if remaining < Decimal::ZERO {
            Decimal::ZERO
        } else {
            remaining
        }
    }

    /// How much the per-day penalty path may still take. The remainder is
    /// excluded: it is never forfeitable through daily penalties.
    pub fn forfeitable_remaining(&self) -> Decimal {
        let forfeitable = self.amount - self.remainder_amount - self.accumulated_penalty;
        if forfeitable < Decimal::ZERO {
            Decimal::ZERO
        } else {
            forfeitable
        }
    }

    pub fn within_period(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn is_day_counted(&self, date: NaiveDate) -> bool {
        self.counted_dates.contains(&date)
    }

    pub fn is_day_penalized(&self, date: NaiveDate) -> bool {
        self.penalized_dates.contains(&date)
    }

    pub fn activate(&mut self) -> Result<(), DomainError> {
        match self.status {
            ContractStatus::Pending => {
                self.status = ContractStatus::Active;
                Ok(())
            }
            ContractStatus::Active => Ok(()),
            _ => Err(DomainError::AlreadyFinalized(format!(
                "Contract {} is {}",
                self.id,
                self.status.as_str()
            ))),
        }
    }

    /// Bank a completed day. Returns false when the date was already
    /// counted, so replayed evaluations never double-count.
    pub fn mark_day_completed(&mut self, date: NaiveDate) -> Result<bool, DomainError> {
        if self.counted_dates.contains(&date) {
            return Ok(false);
        }
        if self.days_accounted() >= self.total_days() {
            return Err(DomainError::Validation(format!(
                "Contract {}: all {} days already accounted",
                self.id,
                self.total_days()
            )));
        }
        self.counted_dates.insert(date);
        self.completed_days += 1;
        Ok(true)
    }

    /// Record a violated day and the penalty actually charged for it.
    /// Returns false when the date was already penalized.
    pub fn record_violation(&mut self, date: NaiveDate, applied: Decimal) -> Result<bool, DomainError> {
        if self.penalized_dates.contains(&date) {
            return Ok(false);
        }
        if applied < Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "Applied penalty cannot be negative, got {applied}"
            )));
        }
        if applied > self.forfeitable_remaining() {
            return Err(DomainError::Validation(format!(
                "Contract {}: penalty {applied} would consume the protected remainder",
                self.id
            )));
        }
        if self.days_accounted() >= self.total_days() {
            return Err(DomainError::Validation(format!(
                "Contract {}: all {} days already accounted",
                self.id,
                self.total_days()
            )));
        }
        self.penalized_dates.insert(date);
        self.violation_days += 1;
        self.accumulated_penalty += applied;
        Ok(true)
    }

    /// Move to a terminal status. Returns false when the contract was
    /// already terminal (settlement replays are no-ops).
    pub fn finalize(&mut self, final_status: ContractStatus) -> Result<bool, DomainError> {
        if !final_status.is_terminal() {
            return Err(DomainError::Validation(format!(
                "{} is not a terminal contract status",
                final_status.as_str()
            )));
        }
        if self.is_terminal() {
            return Ok(false);
        }
        self.status = final_status;
        Ok(true)
    }
}
