use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::warn;

use fitpact_domain::contract::{ContractRepository, ContractStatus};
use fitpact_domain::notification::{NotificationMessage, NotificationSender};
use fitpact_domain::shared::{ContractId, DomainError};

use crate::application::dtos::SettlementOutcome;
use crate::application::services::{DepositLedgerService, KeyedLocks};

/// Terminal reconciliation of a contract: finalizes the status and, for a
/// completed contract, turns the untouched remainder plus whatever is left
/// of the deposit into a refund request.
pub struct SettlementService {
    contract_repo: Arc<dyn ContractRepository>,
    ledger: Arc<DepositLedgerService>,
    notifier: Arc<dyn NotificationSender>,
    contract_locks: Arc<KeyedLocks>,
}

impl SettlementService {
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

    /// Settle a contract into a terminal status. Settling an
    /// already-terminal contract is a no-op, not an error.
    ///
    /// Failed and cancelled contracts get no automatic refund here; any
    /// refund of what remains is left to explicit user action.
    pub async fn settle(
        &self,
        contract_id: &ContractId,
        final_status: ContractStatus,
    ) -> Result<SettlementOutcome, DomainError> {
        let (contract, changed) = {
            let handle = self.contract_locks.handle(contract_id.as_str());
            let _guard = handle.lock().await;

            let mut contract = self
                .contract_repo
                .find_by_id(contract_id)
                .await?
                .ok_or_else(|| {
                    DomainError::NotFound(format!("Contract {contract_id} not found"))
                })?;

            let changed = contract.finalize(final_status)?;
            if changed {
                self.contract_repo.save(&contract).await?;
            }
            (contract, changed)
        };

        if !changed {
            return Ok(SettlementOutcome {
                final_status: contract.status(),
                refund_requested: Decimal::ZERO,
                already_settled: true,
            });
        }

        let mut refund_requested = Decimal::ZERO;
        if final_status == ContractStatus::Completed {
            if let Some(deposit_id) = contract.deposit_id() {
                match self
                    .ledger
                    .refund_available(deposit_id, "Contract completed")
                    .await
                {
                    Ok(amount) => refund_requested = amount,
                    // The contract is already finalized; the refund stays
                    // available for an explicit user-initiated request.
                    Err(e) => warn!(
                        contract_id = %contract_id,
                        error = %e,
                        "settlement refund request failed"
                    ),
                }
            }
        }

        let message = NotificationMessage::contract_settled(
            contract.user_id().clone(),
            contract.status(),
            refund_requested,
        );
        if let Err(e) = self.notifier.send(&message).await {
            warn!(contract_id = %contract_id, error = %e, "settlement notification failed");
        }

        Ok(SettlementOutcome {
            final_status: contract.status(),
            refund_requested,
            already_settled: false,
        })
    }
}
