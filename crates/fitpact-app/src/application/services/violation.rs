use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use fitpact_domain::contract::{Contract, ContractRepository};
use fitpact_domain::deposit::UsageReason;
use fitpact_domain::notification::{NotificationMessage, NotificationSender};
use fitpact_domain::shared::{ContractId, DomainError};

use crate::application::dtos::ViolationOutcome;
use crate::application::services::{DepositLedgerService, KeyedLocks};

/// Charges the flat per-day penalty for a violated contract day and keeps
/// the contract's penalty accounting in step with the deposit ledger.
pub struct ViolationService {
    contract_repo: Arc<dyn ContractRepository>,
    ledger: Arc<DepositLedgerService>,
    notifier: Arc<dyn NotificationSender>,
    contract_locks: Arc<KeyedLocks>,
}

impl ViolationService {
    pub fn new(
        contract_repo: Arc<dyn ContractRepository>,
        ledger: Arc<DepositLedgerService>,
        notifier: Arc<dyn NotificationSender>,
        contract_locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            contract_repo,
            ledger,
            notifier,
            contract_locks,
        }
    }

    /// Charge one missed day. A date that was already penalized is a
    /// benign replay and changes nothing.
    pub async fn apply_violation(
        &self,
        contract_id: &ContractId,
        date: NaiveDate,
    ) -> Result<ViolationOutcome, DomainError> {
        let (contract, applied) = {
            let handle = self.contract_locks.handle(contract_id.as_str());
            let _guard = handle.lock().await;

            let mut contract = self.load(contract_id).await?;
            match self.charge_penalty(&mut contract, date).await? {
                Some(applied) => {
                    self.contract_repo.save(&contract).await?;
                    (contract, applied)
                }
                None => {
                    return Ok(ViolationOutcome {
                        penalty_applied: Decimal::ZERO,
                        remaining_amount: contract.remaining_amount(),
                        already_recorded: true,
                    })
                }
            }
        };

        self.notify_violation(&contract, applied).await;

        Ok(ViolationOutcome {
            penalty_applied: applied,
            remaining_amount: contract.remaining_amount(),
            already_recorded: false,
        })
    }

    /// Penalty core shared with the progress tracker, which already holds
    /// the contract's lock and saves the contract itself. Returns `None`
    /// for an already-penalized date, otherwise the amount charged.
    ///
    /// The deposit debit takes the ledger's own per-record lock; contract
    /// and deposit locks are distinct namespaces and never nest the other
    /// way around, so the ordering is deadlock-free.
    pub(crate) async fn charge_penalty(
        &self,
        contract: &mut Contract,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DomainError> {
        if contract.is_day_penalized(date) {
            return Ok(None);
        }
        if !contract.is_active() {
            return Err(DomainError::ContractNotActive(format!(
                "Contract {} is {}",
                contract.id(),
                contract.status().as_str()
            )));
        }
        if contract.days_accounted() >= contract.total_days() {
            return Err(DomainError::Validation(format!(
                "Contract {}: all {} days already accounted",
                contract.id(),
                contract.total_days()
            )));
        }

        // The remainder is protected from the per-day path; a nearly
        // exhausted deposit caps the charge instead of dropping the
        // violation record.
        let penalty = contract
            .violation_penalty()
            .min(contract.forfeitable_remaining());

        let applied = if penalty > Decimal::ZERO {
            match contract.deposit_id() {
                Some(deposit_id) => {
                    let applied = self
                        .ledger
                        .record_usage_up_to(
                            deposit_id,
                            penalty,
                            Some(contract.id().clone()),
                            UsageReason::Penalty,
                            &format!("Missed check-ins on {date}"),
                        )
                        .await?;
                    if applied < penalty {
                        warn!(
                            contract_id = %contract.id(),
                            %date,
                            expected = %penalty,
                            applied = %applied,
                            "penalty partially applied: deposit nearly exhausted"
                        );
                    }
                    applied
                }
                None => penalty,
            }
        } else {
            Decimal::ZERO
        };

        contract.record_violation(date, applied)?;
        Ok(Some(applied))
    }

    pub(crate) async fn notify_violation(&self, contract: &Contract, applied: Decimal) {
        let message = NotificationMessage::violation(
            contract.user_id().clone(),
            applied,
            contract.remaining_amount(),
        );
        if let Err(e) = self.notifier.send(&message).await {
            warn!(contract_id = %contract.id(), error = %e, "violation notification failed");
        }
    }

    async fn load(&self, contract_id: &ContractId) -> Result<Contract, DomainError> {
        self.contract_repo
            .find_by_id(contract_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Contract {contract_id} not found")))
    }
}
