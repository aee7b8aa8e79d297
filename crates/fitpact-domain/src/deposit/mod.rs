mod aggregate;
mod repository;
mod value_objects;


pub use aggregate::DepositRecord;
pub use repository::DepositRepository;
pub use value_objects::{
    Currency, DepositStatus, PaymentMethod, PaymentStatus, RefundInfo, RefundOutcome,
    RefundStatus, UsageEntry, UsageReason,
};
