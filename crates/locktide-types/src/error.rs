use thiserror::Error;

/// Errors that can occur in type operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid address length: expected 20, got {0}")]
    InvalidAddressLength(usize),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid token amount: {0}")]
    InvalidAmount(String),

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Division by zero")]
    DivisionByZero,
}

impl From<hex::FromHexError> for TypesError {
    fn from(e: hex::FromHexError) -> Self {
        TypesError::InvalidHex(e.to_string())
    }
}

impl From<std::num::ParseIntError> for TypesError {
    fn from(e: std::num::ParseIntError) -> Self {
        TypesError::InvalidAmount(e.to_string())
    }
}
