use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn from_string(s: &str) -> Self {
                Self(s.to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

define_id!(UserId);
define_id!(DepositId);
define_id!(ContractId);
define_id!(CheckInId);

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (1xxx)
    InvalidAmount = 1001,
    ValidationError = 1002,

    // Conflict (2xxx)
    InsufficientBalance = 2001,
    ExceedsAvailable = 2002,
    AlreadyFinalized = 2003,
    NotRefundable = 2004,
    ContractNotActive = 2005,

    // Resource not found (3xxx)
    NotFound = 3001,

    // Data & persistence (4xxx)
    RepositoryError = 4001,

    // Infrastructure (5xxx)
    InfrastructureError = 5001,
}

impl ErrorCode {
    /// Get error code as integer
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Conflict-class errors: the operation was well-formed but the record's
    /// current state rejects it. Controllers map these to 409, validation
    /// errors to 400.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ErrorCode::InsufficientBalance
                | ErrorCode::ExceedsAvailable
                | ErrorCode::AlreadyFinalized
                | ErrorCode::NotRefundable
                | ErrorCode::ContractNotActive
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Already finalized: {0}")]
    AlreadyFinalized(String),

    #[error("Not refundable: {0}")]
    NotRefundable(String),

    #[error("Exceeds available amount: {0}")]
    ExceedsAvailable(String),

    #[error("Contract not active: {0}")]
    ContractNotActive(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Get error code
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            DomainError::InsufficientBalance(_) => ErrorCode::InsufficientBalance,
            DomainError::AlreadyFinalized(_) => ErrorCode::AlreadyFinalized,
            DomainError::NotRefundable(_) => ErrorCode::NotRefundable,
            DomainError::ExceedsAvailable(_) => ErrorCode::ExceedsAvailable,
            DomainError::ContractNotActive(_) => ErrorCode::ContractNotActive,
            DomainError::NotFound(_) => ErrorCode::NotFound,
            DomainError::Validation(_) => ErrorCode::ValidationError,
            DomainError::Repository(_) => ErrorCode::RepositoryError,
            DomainError::Infrastructure(_) => ErrorCode::InfrastructureError,
        }
    }

    /// Get error message
    pub fn message(&self) -> &str {
        match self {
            DomainError::InvalidAmount(msg)
            | DomainError::InsufficientBalance(msg)
            | DomainError::AlreadyFinalized(msg)
            | DomainError::NotRefundable(msg)
            | DomainError::ExceedsAvailable(msg)
            | DomainError::ContractNotActive(msg)
            | DomainError::NotFound(msg)
            | DomainError::Validation(msg)
            | DomainError::Repository(msg)
            | DomainError::Infrastructure(msg) => msg,
        }
    }

    /// Format error with code
    pub fn format_with_code(&self) -> String {
        format!("[{}] {}", self.code().code(), self)
    }
}
