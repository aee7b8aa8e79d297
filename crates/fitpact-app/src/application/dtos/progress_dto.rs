use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fitpact_domain::contract::{ContractStatus, DayOutcome};

/// Result of evaluating one contract day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayEvaluation {
    pub outcome: DayOutcome,
    /// Penalty charged by this evaluation; zero unless a new violation was
    /// recorded.
    pub penalty_applied: Decimal,
    /// False when the evaluation was a replay or deferred and nothing was
    /// persisted.
    pub state_changed: bool,
}

impl DayEvaluation {
    pub(crate) fn no_change(outcome: DayOutcome) -> Self {
        Self {
            outcome,
            penalty_applied: Decimal::ZERO,
            state_changed: false,
        }
    }

    pub(crate) fn changed(outcome: DayOutcome, penalty_applied: Decimal) -> Self {
        Self {
            outcome,
            penalty_applied,
            state_changed: true,
        }
    }
}

/// Result of charging one violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationOutcome {
    pub penalty_applied: Decimal,
    pub remaining_amount: Decimal,
    /// True when the date had already been penalized and this call was a
    /// benign replay.
    pub already_recorded: bool,
}

/// Result of settling a contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub final_status: ContractStatus,
    /// Refund requested against the linked deposit, zero when none was.
    pub refund_requested: Decimal,
    /// True when the contract was already terminal and nothing changed.
    pub already_settled: bool,
}
