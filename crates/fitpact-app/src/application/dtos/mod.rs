mod deposit_stats_dto;
mod progress_dto;

pub use deposit_stats_dto::DepositStatsDto;
pub use progress_dto::{DayEvaluation, SettlementOutcome, ViolationOutcome};
