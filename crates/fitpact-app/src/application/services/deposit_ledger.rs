use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::warn;

use fitpact_domain::deposit::{
    Currency, DepositRecord, DepositRepository, PaymentMethod, RefundOutcome, UsageReason,
};
use fitpact_domain::notification::{NotificationMessage, NotificationSender};
use fitpact_domain::payment::{PaymentCallback, PaymentGateway, PaymentIntent};
use fitpact_domain::shared::{ContractId, DepositId, DomainError, UserId};

use crate::application::dtos::DepositStatsDto;
use crate::application::services::KeyedLocks;

/// Owns the lifecycle of deposit records: creation, payment confirmation,
/// usage entries, the refund workflow, and derived balances.
///
/// Every balance-affecting operation runs under the record's keyed lock,
/// acquired before reading the current balance and released only after the
/// mutation is persisted. Collaborator calls (payment intent, external
/// refund submission, notification) happen outside the lock.
pub struct DepositLedgerService {
    deposit_repo: Arc<dyn DepositRepository>,
    payment_gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationSender>,
    locks: KeyedLocks,
}

impl DepositLedgerService {
    pub fn new(
        deposit_repo: Arc<dyn DepositRepository>,
        payment_gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            deposit_repo,
            payment_gateway,
            notifier,
            locks: KeyedLocks::new(),
        }
    }

    /// Create a pending deposit and ask the payment collaborator for a
    /// payment intent the caller can present to the user.
    pub async fn create(
        &self,
        user_id: UserId,
        amount: Decimal,
        currency: Currency,
        payment_method: PaymentMethod,
        contract_id: Option<ContractId>,
    ) -> Result<(DepositRecord, PaymentIntent), DomainError> {
        let record = DepositRecord::new(user_id, amount, currency, payment_method, contract_id)?;
        self.deposit_repo.save(&record).await?;

        let intent = self
            .payment_gateway
            .create_payment_intent(
                record.id().as_str(),
                amount,
                payment_method,
                "FitPact contract deposit",
            )
            .await?;

        Ok((record, intent))
    }

    /// Apply an inbound payment-status callback. The callback's order id is
    /// the deposit id handed out at creation. Duplicate callbacks are
    /// rejected with `AlreadyFinalized` and never double-apply.
    pub async fn confirm_payment(
        &self,
        callback: &PaymentCallback,
    ) -> Result<DepositRecord, DomainError> {
        let deposit_id = DepositId::from_string(&callback.order_id);
        let handle = self.locks.handle(deposit_id.as_str());
        let _guard = handle.lock().await;

        let mut record = self.load_fresh(&deposit_id).await?;
        record.confirm_payment(
            callback.transaction_id.clone(),
            callback.payment_time,
            callback.status,
        )?;
        self.deposit_repo.save(&record).await?;
        Ok(record)
    }

    /// Consume part of a deposit's balance. Rejected with
    /// `InsufficientBalance` when the amount exceeds what is available.
    pub async fn record_usage(
        &self,
        deposit_id: &DepositId,
        amount: Decimal,
        contract_id: Option<ContractId>,
        reason: UsageReason,
        description: &str,
    ) -> Result<DepositRecord, DomainError> {
        let handle = self.locks.handle(deposit_id.as_str());
        let _guard = handle.lock().await;

        let mut record = self.load_fresh(deposit_id).await?;
        record.record_usage(amount, contract_id, reason, description, Utc::now())?;
        self.deposit_repo.save(&record).await?;
        Ok(record)
    }

    /// Capped debit for the penalty path: takes at most `amount`, bounded
    /// by the available balance, and reports what was actually applied.
    /// The check and the debit happen under one lock acquisition so a
    /// concurrent usage cannot slip between them.
    pub async fn record_usage_up_to(
        &self,
        deposit_id: &DepositId,
        amount: Decimal,
        contract_id: Option<ContractId>,
        reason: UsageReason,
        description: &str,
    ) -> Result<Decimal, DomainError> {
        let handle = self.locks.handle(deposit_id.as_str());
        let _guard = handle.lock().await;

        let mut record = self.load_fresh(deposit_id).await?;
        let applied =
            record.record_usage_up_to(amount, contract_id, reason, description, Utc::now())?;
        if applied > Decimal::ZERO {
            self.deposit_repo.save(&record).await?;
        }
        if applied < amount {
            warn!(
                deposit_id = %deposit_id,
                requested = %amount,
                applied = %applied,
                "partial debit: deposit balance lower than requested amount"
            );
        }
        Ok(applied)
    }

    /// Record a refund request against a deposit. The ledger entry is the
    /// source of truth; submission to the payment collaborator and the
    /// user notification follow outside the lock, best-effort.
    pub async fn request_refund(
        &self,
        deposit_id: &DepositId,
        refund_amount: Decimal,
        reason: &str,
    ) -> Result<DepositRecord, DomainError> {
        let record = {
            let handle = self.locks.handle(deposit_id.as_str());
            let _guard = handle.lock().await;

            let mut record = self.load_fresh(deposit_id).await?;
            record.request_refund(refund_amount, reason, Utc::now())?;
            self.deposit_repo.save(&record).await?;
            record
        };

        self.submit_external_refund(&record, refund_amount, reason).await;
        Ok(record)
    }

    /// Request a refund of everything still available on a deposit, used
    /// by contract settlement. Returns the amount requested; zero when the
    /// deposit has nothing left to refund.
    pub async fn refund_available(
        &self,
        deposit_id: &DepositId,
        reason: &str,
    ) -> Result<Decimal, DomainError> {
        let (record, refund_amount) = {
            let handle = self.locks.handle(deposit_id.as_str());
            let _guard = handle.lock().await;

            let mut record = self.load_fresh(deposit_id).await?;
            let available = record.available_amount();
            if available == Decimal::ZERO {
                return Ok(Decimal::ZERO);
            }
            record.request_refund(available, reason, Utc::now())?;
            self.deposit_repo.save(&record).await?;
            (record, available)
        };

        self.submit_external_refund(&record, refund_amount, reason).await;
        Ok(refund_amount)
    }

    /// Resolve an in-flight refund from the payment collaborator's
    /// callback.
    pub async fn confirm_refund(
        &self,
        deposit_id: &DepositId,
        outcome: RefundOutcome,
    ) -> Result<DepositRecord, DomainError> {
        let handle = self.locks.handle(deposit_id.as_str());
        let _guard = handle.lock().await;

        let mut record = self.load_fresh(deposit_id).await?;
        record.complete_refund(outcome, Utc::now())?;
        self.deposit_repo.save(&record).await?;
        Ok(record)
    }

    /// Aggregate deposit statistics across all of a user's records.
    pub async fn get_stats(&self, user_id: &UserId) -> Result<DepositStatsDto, DomainError> {
        let now = Utc::now();
        let mut records = self.deposit_repo.find_by_user_id(user_id).await?;

        let mut total_deposit = Decimal::ZERO;
        let mut total_refunded = Decimal::ZERO;
        let mut available_deposit = Decimal::ZERO;
        let mut last_deposit_at = None;

        for record in records.iter_mut() {
            // View-level lazy expiry; the single-record load paths persist
            // the transition when they next touch the record.
            record.expire_if_due(now);

            if record.is_funded() {
                total_deposit += record.amount();
                available_deposit += record.available_amount();
                if record.paid_at() > last_deposit_at {
                    last_deposit_at = record.paid_at();
                }
            }
            total_refunded += record.refunded_amount();
        }

        let frozen = total_deposit - available_deposit - total_refunded;
        Ok(DepositStatsDto {
            total_deposit,
            record_count: records.len() as u32,
            total_refunded,
            available_deposit,
            frozen_deposit: if frozen < Decimal::ZERO { Decimal::ZERO } else { frozen },
            last_deposit_at,
        })
    }

    /// Load a record, applying lazy expiry and persisting the transition.
    /// Must be called with the record's lock held.
    async fn load_fresh(&self, deposit_id: &DepositId) -> Result<DepositRecord, DomainError> {
        let mut record = self
            .deposit_repo
            .find_by_id(deposit_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Deposit {deposit_id} not found")))?;
        if record.expire_if_due(Utc::now()) {
            self.deposit_repo.save(&record).await?;
        }
        Ok(record)
    }

    async fn submit_external_refund(&self, record: &DepositRecord, amount: Decimal, reason: &str) {
        if let Some(transaction_id) = record.transaction_id() {
            if let Err(e) = self
                .payment_gateway
                .request_refund(record.id().as_str(), transaction_id, amount, reason)
                .await
            {
                warn!(
                    deposit_id = %record.id(),
                    error = %e,
                    "external refund submission failed; ledger entry kept"
                );
            }
        }

        let message = NotificationMessage::refund_requested(record.user_id().clone(), amount);
        if let Err(e) = self.notifier.send(&message).await {
            warn!(user_id = %record.user_id(), error = %e, "refund notification failed");
        }
    }
}
