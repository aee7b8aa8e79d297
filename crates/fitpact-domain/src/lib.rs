// Domain layer - Pure business logic
// No dependencies on infrastructure or application layers

pub mod check_in;
pub mod contract;
pub mod deposit;
pub mod notification;
pub mod payment;
pub mod shared;

// Re-exports for convenience
pub use shared::{CheckInId, ContractId, DepositId, DomainError, UserId};
