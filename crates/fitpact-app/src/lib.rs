// Application layer - orchestrates domain aggregates, repositories and
// collaborators. Invoked by the HTTP controllers, which live outside this
// workspace.

pub mod application;

pub use application::services::{
    ContractProgressService, DepositLedgerService, SettlementService, ViolationService,
};
