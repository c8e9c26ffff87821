use locktide_types::{Amount, TypesError};
use thiserror::Error;

use crate::lock::LockId;

/// Errors that can occur in locking and emission operations.
///
/// Every variant is raised before any state mutation, so a failed call
/// leaves both ledgers exactly as they were.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid duration: cliff {cliff} / slope {slope} outside [{min_cliff}, {max_cliff}] / [{min_slope}, {max_slope}]")]
    InvalidDuration {
        cliff: u64,
        slope: u64,
        min_cliff: u64,
        max_cliff: u64,
        min_slope: u64,
        max_slope: u64,
    },

    #[error("Relock too short: {new_weeks} weeks < {remaining_weeks} weeks still guaranteed")]
    DurationTooShort { new_weeks: u64, remaining_weeks: u64 },

    #[error("Relock decreases locked amount: {requested} < {locked}")]
    AmountDecrease { locked: Amount, requested: Amount },

    #[error("Token transfer failed: {0}")]
    TransferFailed(String),

    #[error("Mint rejected: {0}")]
    MintRejected(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Lock not found: {0}")]
    LockNotFound(LockId),

    #[error("Invalid delegate: {0}")]
    InvalidDelegate(String),

    #[error("Locking is stopped")]
    Stopped,

    #[error("Emission cap exceeded: {value} > {cap}")]
    EmissionCapExceeded { value: Amount, cap: Amount },

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<TypesError> for LedgerError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::AmountOverflow | TypesError::DivisionByZero => LedgerError::ArithmeticOverflow,
            other => LedgerError::InvalidAmount(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::DurationTooShort { new_weeks: 4, remaining_weeks: 9 };
        assert!(err.to_string().contains("4 weeks"));
        assert!(err.to_string().contains("9 weeks"));

        let err = LedgerError::LockNotFound(LockId(3));
        assert_eq!(err.to_string(), "Lock not found: #3");
    }

    #[test]
    fn test_types_error_conversion() {
        assert_eq!(
            LedgerError::from(TypesError::AmountOverflow),
            LedgerError::ArithmeticOverflow
        );
        assert!(matches!(
            LedgerError::from(TypesError::InvalidAmount("x".into())),
            LedgerError::InvalidAmount(_)
        ));
    }
}
