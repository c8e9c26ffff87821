//! Token ledger interface consumed by the locking and emission ledgers.
//!
//! Custody of locked principal and minting of emitted supply both live in
//! an external token ledger. The ledgers only talk to it through
//! [`TokenLedger`]; [`MemoryToken`] is an in-memory implementation used for
//! simulation and tests.

use std::collections::HashMap;

use locktide_types::{Address, Amount};
use thiserror::Error;

/// Errors reported by a token ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance: {account} has {available}, needs {required}")]
    InsufficientBalance {
        account: Address,
        available: Amount,
        required: Amount,
    },

    #[error("Token is paused")]
    Paused,

    #[error("{0} is not the authorized minter")]
    UnauthorizedMinter(Address),

    #[error("Supply overflow")]
    SupplyOverflow,
}

/// Token ledger entry points used by the core.
///
/// Each call either applies fully or fails without side effects.
pub trait TokenLedger {
    /// Move `amount` from `from` into the custody account.
    fn transfer_in(&mut self, from: &Address, amount: Amount) -> Result<(), TokenError>;

    /// Move `amount` from the custody account to `to`.
    fn transfer_out(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError>;

    /// Create `amount` new tokens for `to`. Only `minter` may succeed.
    fn mint(&mut self, minter: &Address, to: &Address, amount: Amount) -> Result<(), TokenError>;
}

/// In-memory token ledger with one custody account and one minter.
#[derive(Debug, Clone)]
pub struct MemoryToken {
    balances: HashMap<Address, Amount>,
    custody: Address,
    minter: Address,
    total_supply: Amount,
    emitted: Amount,
    paused: bool,
}

impl MemoryToken {
    /// Create an empty ledger holding custody at `custody` and minting only for `minter`.
    pub fn new(custody: Address, minter: Address) -> Self {
        Self {
            balances: HashMap::new(),
            custody,
            minter,
            total_supply: 0,
            emitted: 0,
            paused: false,
        }
    }

    /// Seed a balance outside the emission schedule (genesis allocation).
    pub fn credit(&mut self, account: Address, amount: Amount) {
        *self.balances.entry(account).or_default() += amount;
        self.total_supply += amount;
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Balance held in custody for all locks.
    pub fn custody_balance(&self) -> Amount {
        self.balance_of(&self.custody)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Total minted through [`TokenLedger::mint`].
    pub fn emitted_amount(&self) -> Amount {
        self.emitted
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), TokenError> {
        if self.paused {
            return Err(TokenError::Paused);
        }
        let available = self.balance_of(&from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: from,
                available,
                required: amount,
            });
        }
        self.balances.insert(from, available - amount);
        *self.balances.entry(to).or_default() += amount;
        Ok(())
    }
}

impl TokenLedger for MemoryToken {
    fn transfer_in(&mut self, from: &Address, amount: Amount) -> Result<(), TokenError> {
        self.move_balance(*from, self.custody, amount)
    }

    fn transfer_out(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError> {
        self.move_balance(self.custody, *to, amount)
    }

    fn mint(&mut self, minter: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        if *minter != self.minter {
            return Err(TokenError::UnauthorizedMinter(*minter));
        }
        if self.paused {
            return Err(TokenError::Paused);
        }
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        self.total_supply = total_supply;
        self.emitted += amount;
        *self.balances.entry(*to).or_default() += amount;
        Ok(())
    }
}
