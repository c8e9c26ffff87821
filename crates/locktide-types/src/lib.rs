//! Locktide Types - Core type definitions shared by the Locktide ledgers.
//!
//! This crate provides:
//! - Account addresses (20-byte, hex encoded)
//! - Token amounts and the two fixed-point scales (`TOKEN`, `ONE`)
//! - Week clock helpers for week-quantized lock schedules

pub mod address;
pub mod amount;
pub mod time;
pub mod error;

#[cfg(feature = "serde")]
mod serialization;

pub use address::Address;
pub use amount::{Amount, ONE, TOKEN};
pub use time::{Timestamp, Week, DAY, MONTH, WEEK, YEAR};
pub use error::TypesError;

#[cfg(feature = "serde")]
pub use serialization::amount_string;
