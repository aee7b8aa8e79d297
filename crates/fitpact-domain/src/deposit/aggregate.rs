use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{
    Currency, DepositStatus, PaymentMethod, PaymentStatus, RefundInfo, RefundOutcome,
    RefundStatus, UsageEntry, UsageReason,
};
use crate::payment::PaymentOutcome;
use crate::shared::{ContractId, DepositId, DomainError, UserId};

/// A user's paid-in deposit and every debit recorded against it.
///
/// The record is the sole owner of its usage history: balances are always
/// recomputed from the entries, never stored, so the history and the
/// derived amounts cannot drift apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRecord {
    id: DepositId,
    user_id: UserId,
    contract_id: Option<ContractId>,
    amount: Decimal,
    currency: Currency,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    transaction_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    usage_history: Vec<UsageEntry>,
    refund_info: Option<RefundInfo>,
    status: DepositStatus,
    expiry_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl DepositRecord {
    /// An unconfirmed payment is abandoned after this many minutes.
    pub const PENDING_EXPIRY_MINUTES: i64 = 30;

    pub fn new(
        user_id: UserId,
        amount: Decimal,
        currency: Currency,
        payment_method: PaymentMethod,
        contract_id: Option<ContractId>,
    ) -> Result<Self, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "Deposit amount must be positive, got {amount}"
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: DepositId::new(),
            user_id,
            contract_id,
            amount,
            currency,
            payment_method,
            payment_status: PaymentStatus::Pending,
            transaction_id: None,
            paid_at: None,
            usage_history: Vec::new(),
            refund_info: None,
            status: DepositStatus::Active,
            expiry_date: Some(now + Duration::minutes(Self::PENDING_EXPIRY_MINUTES)),
            created_at: now,
        })
    }

    /// Reconstruct from persistence
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: DepositId,
        user_id: UserId,
        contract_id: Option<ContractId>,
        amount: Decimal,
        currency: Currency,
        payment_method: PaymentMethod,
        payment_status: PaymentStatus,
        transaction_id: Option<String>,
        paid_at: Option<DateTime<Utc>>,
        usage_history: Vec<UsageEntry>,
        refund_info: Option<RefundInfo>,
        status: DepositStatus,
        expiry_date: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            contract_id,
            amount,
            currency,
            payment_method,
            payment_status,
            transaction_id,
            paid_at,
            usage_history,
            refund_info,
            status,
            expiry_date,
            created_at,
        }
    }

    pub fn id(&self) -> &DepositId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn contract_id(&self) -> Option<&ContractId> {
        self.contract_id.as_ref()
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn usage_history(&self) -> &[UsageEntry] {
        &self.usage_history
    }

    pub fn refund_info(&self) -> Option<&RefundInfo> {
        self.refund_info.as_ref()
    }

    pub fn status(&self) -> DepositStatus {
        self.status
    }

    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Total consumed so far, recomputed from the usage history.
    pub fn used_amount(&self) -> Decimal {
        self.usage_history.iter().map(|e| e.used_amount()).sum()
    }

    /// Sum of completed refunds recorded against this deposit.
    pub fn refunded_amount(&self) -> Decimal {
        self.usage_history
            .iter()
            .filter(|e| e.reason() == UsageReason::Refund)
            .map(|e| e.used_amount())
            .sum()
    }

    /// Spendable balance. An unfunded or expired record has none: money
    /// that never arrived cannot be consumed.
    pub fn available_amount(&self) -> Decimal {
        if !self.is_funded() {
            return Decimal::ZERO;
        }
        let available = self.amount - self.used_amount();
        if available < Decimal::ZERO {
            Decimal::ZERO
        } else {
            available
        }
    }

    pub fn is_funded(&self) -> bool {
        matches!(
            self.payment_status,
            PaymentStatus::Success | PaymentStatus::Refunded
        ) && self.status != DepositStatus::Expired
    }

    /// Apply the payment collaborator's confirmation callback.
    ///
    /// Only a pending record can be confirmed; a duplicate callback for an
    /// already-decided payment must not double-apply.
    pub fn confirm_payment(
        &mut self,
        transaction_id: impl Into<String>,
        paid_at: DateTime<Utc>,
        outcome: PaymentOutcome,
    ) -> Result<(), DomainError> {
        if self.payment_status != PaymentStatus::Pending {
            return Err(DomainError::AlreadyFinalized(format!(
                "Deposit {} payment already {}",
                self.id,
                self.payment_status.as_str()
            )));
        }

        match outcome {
            PaymentOutcome::Success => {
                self.payment_status = PaymentStatus::Success;
                self.transaction_id = Some(transaction_id.into());
                self.paid_at = Some(paid_at);
                self.expiry_date = None;
            }
            PaymentOutcome::Failed => {
                // The money never arrived; the record is dead.
                self.payment_status = PaymentStatus::Failed;
                self.status = DepositStatus::Expired;
                self.expiry_date = None;
            }
        }

        Ok(())
    }

    /// Lazily expire a pending record whose confirmation window has passed.
    /// Returns true when a transition happened and the record needs saving.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.payment_status != PaymentStatus::Pending {
            return false;
        }
        match self.expiry_date {
            Some(expiry) if now > expiry => {
                self.payment_status = PaymentStatus::Failed;
                self.status = DepositStatus::Expired;
                self.expiry_date = None;
                true
            }
            _ => false,
        }
    }

    /// Append a usage entry consuming part of the balance.
    pub fn record_usage(
        &mut self,
        amount: Decimal,
        contract_id: Option<ContractId>,
        reason: UsageReason,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "Usage amount must be positive, got {amount}"
            )));
        }

        let available = self.available_amount();
        if amount > available {
            return Err(DomainError::InsufficientBalance(format!(
                "Deposit {}: requested {amount}, available {available}",
                self.id
            )));
        }

        self.usage_history
            .push(UsageEntry::new(contract_id, amount, now, reason, description));

        if self.available_amount() == Decimal::ZERO {
            self.status = DepositStatus::Used;
        }

        Ok(())
    }

    /// Debit at most `amount`, capped at the available balance. Returns the
    /// amount actually applied (zero when nothing is left to take).
    pub fn record_usage_up_to(
        &mut self,
        amount: Decimal,
        contract_id: Option<ContractId>,
        reason: UsageReason,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Decimal, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "Usage amount must be positive, got {amount}"
            )));
        }

        let applied = amount.min(self.available_amount());
        if applied > Decimal::ZERO {
            self.record_usage(applied, contract_id, reason, description, now)?;
        }
        Ok(applied)
    }

    /// Record a refund request. Only reserves the amount and generates the
    /// refund id; the money movement happens at the payment collaborator
    /// and is resolved later through `complete_refund`.
    pub fn request_refund(
        &mut self,
        refund_amount: Decimal,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.status != DepositStatus::Active {
            return Err(DomainError::NotRefundable(format!(
                "Deposit {} is {}",
                self.id,
                self.status.as_str()
            )));
        }
        if self.payment_status != PaymentStatus::Success {
            return Err(DomainError::NotRefundable(format!(
                "Deposit {} payment is {}",
                self.id,
                self.payment_status.as_str()
            )));
        }
        if let Some(info) = &self.refund_info {
            if info.refund_status().is_in_flight() {
                return Err(DomainError::NotRefundable(format!(
                    "Deposit {} already has refund {} in flight",
                    self.id,
                    info.refund_id()
                )));
            }
        }
        if refund_amount <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "Refund amount must be positive, got {refund_amount}"
            )));
        }
        let available = self.available_amount();
        if refund_amount > available {
            return Err(DomainError::ExceedsAvailable(format!(
                "Deposit {}: refund {refund_amount} exceeds available {available}",
                self.id
            )));
        }

        self.refund_info = Some(RefundInfo::new(
            Uuid::new_v4().to_string(),
            refund_amount,
            reason,
            now,
        ));
        Ok(())
    }

    /// Resolve an in-flight refund from the payment collaborator's
    /// callback. Completion consumes the refunded amount as a usage entry
    /// so the audit trail stays the single source of balance truth.
    pub fn complete_refund(
        &mut self,
        outcome: RefundOutcome,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let (refund_amount, in_flight) = match &self.refund_info {
            Some(info) => (info.refund_amount(), info.refund_status().is_in_flight()),
            None => {
                return Err(DomainError::AlreadyFinalized(format!(
                    "Deposit {} has no refund in flight",
                    self.id
                )))
            }
        };
        if !in_flight {
            return Err(DomainError::AlreadyFinalized(format!(
                "Deposit {} refund already resolved",
                self.id
            )));
        }

        match outcome {
            RefundOutcome::Completed => {
                let contract_id = self.contract_id.clone();
                self.record_usage(
                    refund_amount,
                    contract_id,
                    UsageReason::Refund,
                    "Deposit refund",
                    now,
                )?;
                self.payment_status = PaymentStatus::Refunded;
                if self.available_amount() == Decimal::ZERO {
                    self.status = DepositStatus::Refunded;
                }
                if let Some(info) = self.refund_info.as_mut() {
                    info.resolve(RefundStatus::Completed, now);
                }
            }
            RefundOutcome::Failed => {
                if let Some(info) = self.refund_info.as_mut() {
                    info.resolve(RefundStatus::Failed, now);
                }
            }
        }

        Ok(())
    }
}
