mod check_in_repo;
mod contract_repo;
mod deposit_repo;

pub use check_in_repo::SqliteCheckInRepository;
pub use contract_repo::SqliteContractRepository;
pub use deposit_repo::SqliteDepositRepository;
