use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use fitpact_domain::check_in::{CheckInRepository, CheckInType, WorkoutPlanProvider};
use fitpact_domain::contract::{ContractRepository, DayOutcome};
use fitpact_domain::shared::{ContractId, DomainError};

use crate::application::dtos::DayEvaluation;
use crate::application::services::{KeyedLocks, ViolationService};

/// Decides, once per calendar day and exactly once, whether a contract day
/// counts as completed, and routes fully-elapsed incomplete days to the
/// penalty path.
pub struct ContractProgressService {
    contract_repo: Arc<dyn ContractRepository>,
    check_in_repo: Arc<dyn CheckInRepository>,
    plan_provider: Arc<dyn WorkoutPlanProvider>,
    violations: Arc<ViolationService>,
    contract_locks: Arc<KeyedLocks>,
}

impl ContractProgressService {
    pub fn new(
        contract_repo: Arc<dyn ContractRepository>,
        check_in_repo: Arc<dyn CheckInRepository>,
        plan_provider: Arc<dyn WorkoutPlanProvider>,
        violations: Arc<ViolationService>,
        contract_locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            contract_repo,
            check_in_repo,
            plan_provider,
            violations,
            contract_locks,
        }
    }

    /// Evaluate one calendar day of a contract.
    ///
    /// `today` is the current date at the user's day boundary; a day is
    /// never judged violated until it has fully elapsed. Re-running the
    /// evaluation for an already-decided date is a no-op replay, so
    /// restarts and at-least-once upstream delivery are safe.
    pub async fn evaluate_day(
        &self,
        contract_id: &ContractId,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<DayEvaluation, DomainError> {
        let handle = self.contract_locks.handle(contract_id.as_str());
        let guard = handle.lock().await;

        let mut contract = self
            .contract_repo
            .find_by_id(contract_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Contract {contract_id} not found")))?;

        // Replay paths first: a counted date keeps its prior outcome.
        if contract.is_day_counted(date) {
            return Ok(DayEvaluation::no_change(DayOutcome::Completed));
        }
        if contract.is_day_penalized(date) {
            return Ok(DayEvaluation::no_change(DayOutcome::Violated));
        }

        if !contract.is_active() {
            return Err(DomainError::ContractNotActive(format!(
                "Contract {} is {}",
                contract_id,
                contract.status().as_str()
            )));
        }
        if !contract.within_period(date) {
            return Ok(DayEvaluation::no_change(DayOutcome::Neutral));
        }

        let required = self.plan_provider.day_plan(contract_id, date).await?.required_types();
        if required.is_empty() {
            // Rest day: contributes to neither counter.
            return Ok(DayEvaluation::no_change(DayOutcome::Neutral));
        }

        let check_ins = self
            .check_in_repo
            .find_by_contract_on_date(contract_id, date)
            .await?;
        let approved: BTreeSet<CheckInType> = check_ins
            .iter()
            .filter(|c| c.is_approved())
            .map(|c| c.check_in_type())
            .collect();

        if required.is_subset(&approved) {
            contract.mark_day_completed(date)?;
            self.contract_repo.save(&contract).await?;
            return Ok(DayEvaluation::changed(DayOutcome::Completed, Decimal::ZERO));
        }

        if date >= today {
            // The day is still in progress; judgement is deferred to the
            // end of the day or the next evaluation trigger.
            return Ok(DayEvaluation::no_change(DayOutcome::Pending));
        }

        let applied = self
            .violations
            .charge_penalty(&mut contract, date)
            .await?
            .unwrap_or(Decimal::ZERO);
        self.contract_repo.save(&contract).await?;

        drop(guard);
        self.violations.notify_violation(&contract, applied).await;

        Ok(DayEvaluation::changed(DayOutcome::Violated, applied))
    }
}
