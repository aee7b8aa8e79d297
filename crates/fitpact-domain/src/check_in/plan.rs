use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::value_objects::CheckInType;
use crate::shared::{ContractId, DomainError};

/// Classification of one contract day in the user's workout plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPlan {
    Workout,
    ActiveRecovery,
    Rest,
}

impl DayPlan {
    /// The check-in types a day of this classification demands. A rest day
    /// demands nothing and is neutral in the day accounting.
    pub fn required_types(&self) -> BTreeSet<CheckInType> {
        match self {
            DayPlan::Workout => [CheckInType::Gym, CheckInType::Protein].into_iter().collect(),
            DayPlan::ActiveRecovery => [CheckInType::Protein].into_iter().collect(),
            DayPlan::Rest => BTreeSet::new(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPlan::Workout => "workout",
            DayPlan::ActiveRecovery => "active_recovery",
            DayPlan::Rest => "rest",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "workout" => Ok(DayPlan::Workout),
            "active_recovery" => Ok(DayPlan::ActiveRecovery),
            "rest" => Ok(DayPlan::Rest),
            other => Err(DomainError::Validation(format!("Unknown day plan: {other}"))),
        }
    }
}

/// Workout-plan collaborator: tells the progress tracker what a given
/// contract day requires.
#[async_trait]
pub trait WorkoutPlanProvider: Send + Sync {
    async fn day_plan(
        &self,
        contract_id: &ContractId,
        date: NaiveDate,
    ) -> Result<DayPlan, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_types_per_plan() {
        let workout = DayPlan::Workout.required_types();
        assert_eq!(workout.len(), 2);
        assert!(workout.contains(&CheckInType::Gym));
        assert!(workout.contains(&CheckInType::Protein));

        let recovery = DayPlan::ActiveRecovery.required_types();
        assert_eq!(recovery.len(), 1);
        assert!(recovery.contains(&CheckInType::Protein));

        assert!(DayPlan::Rest.required_types().is_empty());
    }
}
