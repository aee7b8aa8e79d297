mod aggregate;
mod domain_service;
mod repository;
mod value_objects;


pub use aggregate::Contract;
pub use domain_service::{PenaltyPolicy, PenaltySplit};
pub use repository::ContractRepository;
pub use value_objects::{ContractStatus, DayOutcome};
