//! Locktide Core - Vote-escrow locking and emission release accounting.
//!
//! This crate provides:
//! - Fixed-point curve math for lock weights, decay and emission
//! - The lock ledger: lock, relock, delegate, withdraw, voting power views
//! - The emission ledger: mint up to the release curve, never past the cap
//! - The token ledger interface both ledgers use for custody and minting

pub mod config;
pub mod curve;
pub mod emission;
pub mod error;
pub mod lock;
pub mod locking;
pub mod token;

pub use config::{CurveConfig, EmissionCheckpoint, EmissionParams, LockingParams, WeightMultipliers};
pub use emission::EmissionLedger;
pub use error::LedgerError;
pub use lock::{Lock, LockId, LockState};
pub use locking::LockLedger;
pub use token::{MemoryToken, TokenError, TokenLedger};
