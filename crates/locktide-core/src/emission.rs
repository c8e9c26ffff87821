//! Emission release ledger.
//!
//! Tracks how much of the capped supply has been minted and releases the
//! difference between the emission curve at `now` and that running total.
//! Anyone may trigger a release; minted tokens always go to the configured
//! emission target.

use locktide_types::{Address, Amount, Timestamp};

use crate::config::EmissionParams;
use crate::curve;
use crate::error::LedgerError;
use crate::token::TokenLedger;

/// Singleton emission state.
#[derive(Debug, Clone)]
pub struct EmissionLedger {
    params: EmissionParams,
    /// Account allowed to change the emission target
    admin: Address,
    /// Identity presented to the token ledger when minting
    minter: Address,
    /// Beneficiary of every mint
    target: Address,
    total_emitted: Amount,
}

impl EmissionLedger {
    /// Create a ledger with nothing emitted yet.
    pub fn new(
        params: EmissionParams,
        admin: Address,
        minter: Address,
        target: Address,
    ) -> Result<Self, LedgerError> {
        params.validate()?;
        check_target(&target)?;
        Ok(Self {
            params,
            admin,
            minter,
            target,
            total_emitted: 0,
        })
    }

    pub fn emission_start(&self) -> Timestamp {
        self.params.emission_start
    }

    pub fn total_cap(&self) -> Amount {
        self.params.total_cap
    }

    pub fn total_emitted(&self) -> Amount {
        self.total_emitted
    }

    pub fn target(&self) -> Address {
        self.target
    }

    /// Cumulative emission the curve allows at `now`.
    pub fn cumulative_at(&self, now: Timestamp) -> Result<Amount, LedgerError> {
        let elapsed = now.saturating_sub(self.params.emission_start);
        curve::cumulative_emission(&self.params, elapsed)
    }

    /// Amount `emit_tokens(now)` would mint.
    pub fn calculate_emission(&self, now: Timestamp) -> Result<Amount, LedgerError> {
        Ok(self.cumulative_at(now)?.saturating_sub(self.total_emitted))
    }

    /// Mint everything released since the last call to the emission target.
    ///
    /// Returns the minted amount. With nothing new to release this is a
    /// no-op returning zero and the token ledger is not called.
    pub fn emit_tokens<T: TokenLedger + ?Sized>(
        &mut self,
        token: &mut T,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        let amount = self.calculate_emission(now)?;
        if amount == 0 {
            tracing::debug!("Nothing to emit at {}", now);
            return Ok(0);
        }

        let total_emitted = self
            .total_emitted
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        if total_emitted > self.params.total_cap {
            return Err(LedgerError::EmissionCapExceeded {
                value: total_emitted,
                cap: self.params.total_cap,
            });
        }

        token.mint(&self.minter, &self.target, amount).map_err(|e| {
            tracing::warn!("Token ledger rejected emission of {}: {}", amount, e);
            LedgerError::MintRejected(e.to_string())
        })?;
        self.total_emitted = total_emitted;

        tracing::info!(
            "Emitted {} to {} (total {} of {})",
            amount, self.target, total_emitted, self.params.total_cap
        );
        Ok(amount)
    }

    /// Redirect future emissions.
    pub fn set_emission_target(&mut self, caller: Address, target: Address) -> Result<(), LedgerError> {
        if caller != self.admin {
            return Err(LedgerError::Unauthorized(format!(
                "{} is not the emission admin",
                caller
            )));
        }
        check_target(&target)?;
        self.target = target;
        tracing::info!("Emission target set to {}", target);
        Ok(())
    }
}

fn check_target(target: &Address) -> Result<(), LedgerError> {
    if target.is_zero() {
        return Err(LedgerError::InvalidConfig(
            "emission target is the zero address".to_string(),
        ));
    }
    Ok(())
}
