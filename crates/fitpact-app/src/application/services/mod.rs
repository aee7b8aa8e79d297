mod deposit_ledger;
mod locks;
mod progress_tracker;
mod settlement;
mod violation;

#[cfg(test)]
mod tests;

pub use deposit_ledger::DepositLedgerService;
pub use locks::KeyedLocks;
pub use progress_tracker::ContractProgressService;
pub use settlement::SettlementService;
pub use violation::ViolationService;
