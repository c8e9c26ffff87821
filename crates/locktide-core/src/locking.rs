//! Vote-escrow locking engine.
//!
//! Owns every [`Lock`] and the account -> delegated-locks index. Voting
//! power is never stored: it is recomputed from lock records and `now` on
//! every query, so decay needs no background process.
//!
//! Each mutating call validates first, performs its single token ledger
//! call second and only then mutates state, so a rejected call leaves the
//! ledger untouched.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use locktide_types::time::week_of;
use locktide_types::{Address, Amount, Timestamp, Week};

use crate::config::LockingParams;
use crate::curve;
use crate::error::LedgerError;
use crate::lock::{Lock, LockId};
use crate::token::{TokenError, TokenLedger};

/// The lock table plus delegation and ownership indexes.
#[derive(Debug, Clone)]
pub struct LockLedger {
    params: LockingParams,
    /// Account allowed to change minimum periods and stop/start the ledger
    admin: Address,
    locks: BTreeMap<LockId, Lock>,
    /// delegate -> locks whose voting power it holds
    delegated: HashMap<Address, BTreeSet<LockId>>,
    /// owner -> locks it can relock and withdraw from
    owned: HashMap<Address, BTreeSet<LockId>>,
    counter: u64,
    stopped: bool,
}

impl LockLedger {
    /// Create an empty ledger.
    pub fn new(params: LockingParams, admin: Address) -> Result<Self, LedgerError> {
        params.validate()?;
        Ok(Self {
            params,
            admin,
            locks: BTreeMap::new(),
            delegated: HashMap::new(),
            owned: HashMap::new(),
            counter: 0,
            stopped: false,
        })
    }

    pub fn params(&self) -> &LockingParams {
        &self.params
    }

    /// Last assigned lock id, 0 before the first lock.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Week index of `now` on this ledger's clock.
    pub fn week(&self, now: Timestamp) -> Week {
        week_of(now, self.params.week_seconds)
    }

    pub fn get_lock(&self, id: LockId) -> Option<&Lock> {
        self.locks.get(&id)
    }

    /// Locks whose voting power is credited to `account`.
    pub fn locks_delegated_to(&self, account: &Address) -> Vec<LockId> {
        self.delegated
            .get(account)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Locks owned by `owner`.
    pub fn locks_owned_by(&self, owner: &Address) -> Vec<LockId> {
        self.owned
            .get(owner)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Lock `amount` of `owner`'s tokens under a `cliff` + `slope` schedule,
    /// crediting the voting power to `delegate`.
    ///
    /// # Errors
    /// - `Stopped` if the ledger is stopped
    /// - `InvalidAmount` for a zero amount
    /// - `InvalidDelegate` for the zero address as delegate
    /// - `InvalidDuration` for periods outside the configured bounds
    /// - `TransferFailed` if the token ledger refuses the deposit
    #[allow(clippy::too_many_arguments)]
    pub fn lock<T: TokenLedger + ?Sized>(
        &mut self,
        token: &mut T,
        owner: Address,
        delegate: Address,
        amount: Amount,
        slope: u64,
        cliff: u64,
        now: Timestamp,
    ) -> Result<LockId, LedgerError> {
        self.ensure_running()?;
        check_amount(amount)?;
        check_delegate(&delegate)?;
        let weight = curve::voting_weight(&self.params, amount, cliff, slope)?;

        token
            .transfer_in(&owner, amount)
            .map_err(|e| custody_failure("lock deposit", e))?;

        self.counter += 1;
        let id = LockId(self.counter);
        let lock = Lock {
            id,
            owner,
            delegate,
            amount,
            cliff,
            slope,
            start_week: self.week(now),
            withdrawn: 0,
            released_before_relock: 0,
            weight,
        };
        self.locks.insert(id, lock);
        self.owned.entry(owner).or_default().insert(id);
        self.delegated.entry(delegate).or_default().insert(id);

        tracing::info!(
            "Lock {} created by {}: amount {}, cliff {}w, slope {}w, weight {}, delegate {}",
            id, owner, amount, cliff, slope, weight, delegate
        );
        Ok(id)
    }

    /// Replace the schedule and amount of an existing lock.
    ///
    /// The new schedule restarts at `now`. It must not end before the old
    /// one would have, and `new_amount` must cover everything still locked
    /// under the old schedule. Top-ups are pulled from the owner; if the
    /// new amount is below what custody holds for this lock, the surplus
    /// (already vested principal) is paid out to the owner.
    ///
    /// # Errors
    /// - `LockNotFound`, `Unauthorized` (caller is not the owner), `Stopped`
    /// - `InvalidAmount`, `InvalidDelegate`, `InvalidDuration`
    /// - `DurationTooShort` if the new schedule ends sooner than the old one
    /// - `AmountDecrease` if `new_amount` is below the still-locked amount
    /// - `TransferFailed` if the token ledger refuses the rebalance
    #[allow(clippy::too_many_arguments)]
    pub fn relock<T: TokenLedger + ?Sized>(
        &mut self,
        token: &mut T,
        caller: Address,
        id: LockId,
        delegate: Address,
        new_amount: Amount,
        new_slope: u64,
        new_cliff: u64,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        let ws = self.params.week_seconds;
        let lock = self.owned_lock(&caller, id)?;
        self.ensure_running()?;
        check_amount(new_amount)?;
        check_delegate(&delegate)?;
        self.params.check_durations(new_cliff, new_slope)?;

        let remaining_weeks = lock.remaining_weeks(now, ws);
        let new_weeks = new_cliff.saturating_add(new_slope);
        if new_weeks < remaining_weeks {
            return Err(LedgerError::DurationTooShort { new_weeks, remaining_weeks });
        }

        let locked = lock.locked(now, ws)?;
        if new_amount < locked {
            return Err(LedgerError::AmountDecrease { locked, requested: new_amount });
        }

        let weight = curve::voting_weight(&self.params, new_amount, new_cliff, new_slope)?;
        let owner = lock.owner;
        let old_delegate = lock.delegate;
        let held = lock.held();

        let paid_out = if new_amount > held {
            token
                .transfer_in(&owner, new_amount - held)
                .map_err(|e| custody_failure("relock top-up", e))?;
            0
        } else {
            let surplus = held - new_amount;
            if surplus > 0 {
                token
                    .transfer_out(&owner, surplus)
                    .map_err(|e| custody_failure("relock surplus", e))?;
            }
            surplus
        };

        let start_week = self.week(now);
        let lock = self.locks.get_mut(&id).ok_or(LedgerError::LockNotFound(id))?;
        lock.released_before_relock += lock.withdrawn + paid_out;
        lock.withdrawn = 0;
        lock.amount = new_amount;
        lock.cliff = new_cliff;
        lock.slope = new_slope;
        lock.start_week = start_week;
        lock.weight = weight;
        lock.delegate = delegate;

        if old_delegate != delegate {
            self.move_delegation(id, &old_delegate, delegate);
        }

        tracing::info!(
            "Lock {} relocked by {}: amount {}, cliff {}w, slope {}w, weight {}, paid out {}",
            id, owner, new_amount, new_cliff, new_slope, weight, paid_out
        );
        Ok(())
    }

    /// Move a lock's voting power to `new_delegate`. Principal and vesting
    /// are unaffected. Re-delegating to the current delegate is a no-op.
    pub fn delegate_to(
        &mut self,
        caller: Address,
        id: LockId,
        new_delegate: Address,
    ) -> Result<(), LedgerError> {
        let lock = self.owned_lock(&caller, id)?;
        self.ensure_running()?;
        check_delegate(&new_delegate)?;

        let old_delegate = lock.delegate;
        if old_delegate == new_delegate {
            tracing::debug!("Lock {} already delegated to {}", id, new_delegate);
            return Ok(());
        }

        if let Some(lock) = self.locks.get_mut(&id) {
            lock.delegate = new_delegate;
        }
        self.move_delegation(id, &old_delegate, new_delegate);

        tracing::info!("Lock {} delegated from {} to {}", id, old_delegate, new_delegate);
        Ok(())
    }

    /// Pay the vested, not yet withdrawn principal of `id` to its owner.
    ///
    /// Anyone may trigger this; funds always go to the lock owner. Returns
    /// the amount transferred, zero if nothing is claimable. While the
    /// ledger is stopped the whole remaining principal is claimable.
    pub fn withdraw<T: TokenLedger + ?Sized>(
        &mut self,
        token: &mut T,
        id: LockId,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        let lock = self.locks.get(&id).ok_or(LedgerError::LockNotFound(id))?;
        let claim = self.claimable(lock, now)?;
        if claim == 0 {
            tracing::debug!("Lock {} has nothing to withdraw", id);
            return Ok(0);
        }

        let owner = lock.owner;
        token
            .transfer_out(&owner, claim)
            .map_err(|e| custody_failure("withdrawal", e))?;

        if let Some(lock) = self.locks.get_mut(&id) {
            lock.withdrawn += claim;
        }

        tracing::info!("Withdrew {} from lock {} to {}", claim, id, owner);
        Ok(claim)
    }

    /// Withdraw from every lock owned by `owner` in one transfer.
    pub fn withdraw_all<T: TokenLedger + ?Sized>(
        &mut self,
        token: &mut T,
        owner: Address,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        let mut claims = Vec::new();
        let mut total: Amount = 0;
        for id in self.locks_owned_by(&owner) {
            let lock = self.locks.get(&id).ok_or(LedgerError::LockNotFound(id))?;
            let claim = self.claimable(lock, now)?;
            if claim > 0 {
                total = total.checked_add(claim).ok_or(LedgerError::ArithmeticOverflow)?;
                claims.push((id, claim));
            }
        }

        if total == 0 {
            tracing::debug!("Nothing to withdraw for {}", owner);
            return Ok(0);
        }

        token
            .transfer_out(&owner, total)
            .map_err(|e| custody_failure("withdrawal", e))?;

        for (id, claim) in claims {
            if let Some(lock) = self.locks.get_mut(&id) {
                lock.withdrawn += claim;
            }
        }

        tracing::info!("Withdrew {} from all locks of {}", total, owner);
        Ok(total)
    }

    /// Amount `withdraw(id, now)` would transfer.
    pub fn available_for_withdraw(&self, id: LockId, now: Timestamp) -> Result<Amount, LedgerError> {
        let lock = self.locks.get(&id).ok_or(LedgerError::LockNotFound(id))?;
        self.claimable(lock, now)
    }

    /// Sum of the decayed voting power of all locks delegated to `account`.
    pub fn voting_power_of(&self, account: &Address, now: Timestamp) -> Result<Amount, LedgerError> {
        match self.delegated.get(account) {
            Some(ids) => self.sum_power(ids.iter(), now),
            None => Ok(0),
        }
    }

    /// Voting power across all locks.
    pub fn total_voting_power(&self, now: Timestamp) -> Result<Amount, LedgerError> {
        self.sum_power(self.locks.keys(), now)
    }

    /// Principal of `owner` still bound by lock schedules at `now`.
    pub fn locked_balance_of(&self, owner: &Address, now: Timestamp) -> Result<Amount, LedgerError> {
        let ws = self.params.week_seconds;
        let Some(ids) = self.owned.get(owner) else {
            return Ok(0);
        };
        ids.iter().try_fold(0 as Amount, |acc, id| {
            let lock = self.locks.get(id).ok_or(LedgerError::LockNotFound(*id))?;
            let locked = if self.stopped { 0 } else { lock.locked(now, ws)? };
            acc.checked_add(locked).ok_or(LedgerError::ArithmeticOverflow)
        })
    }

    /// Change the minimum cliff period for future locks and relocks.
    pub fn set_min_cliff_period(&mut self, caller: Address, weeks: u64) -> Result<(), LedgerError> {
        self.ensure_admin(&caller)?;
        let mut params = self.params.clone();
        params.min_cliff_period = weeks;
        params.validate()?;
        self.params = params;
        tracing::info!("Minimum cliff period set to {} weeks", weeks);
        Ok(())
    }

    /// Change the minimum slope period for future locks and relocks.
    pub fn set_min_slope_period(&mut self, caller: Address, weeks: u64) -> Result<(), LedgerError> {
        self.ensure_admin(&caller)?;
        let mut params = self.params.clone();
        params.min_slope_period = weeks;
        params.validate()?;
        self.params = params;
        tracing::info!("Minimum slope period set to {} weeks", weeks);
        Ok(())
    }

    /// Stop the ledger: no new locks, relocks or delegations, voting power
    /// reads as zero and every lock's remaining principal becomes withdrawable.
    pub fn stop(&mut self, caller: Address) -> Result<(), LedgerError> {
        self.ensure_admin(&caller)?;
        self.stopped = true;
        tracing::warn!("Locking stopped by {}", caller);
        Ok(())
    }

    /// Resume normal operation after [`LockLedger::stop`].
    pub fn start(&mut self, caller: Address) -> Result<(), LedgerError> {
        self.ensure_admin(&caller)?;
        self.stopped = false;
        tracing::info!("Locking restarted by {}", caller);
        Ok(())
    }

    fn claimable(&self, lock: &Lock, now: Timestamp) -> Result<Amount, LedgerError> {
        if self.stopped {
            Ok(lock.held())
        } else {
            lock.claimable(now, self.params.week_seconds)
        }
    }

    fn sum_power<'a>(
        &self,
        mut ids: impl Iterator<Item = &'a LockId>,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        if self.stopped {
            return Ok(0);
        }
        let ws = self.params.week_seconds;
        ids.try_fold(0 as Amount, |acc, id| {
            let lock = self.locks.get(id).ok_or(LedgerError::LockNotFound(*id))?;
            let power = lock.voting_power(now, ws)?;
            acc.checked_add(power).ok_or(LedgerError::ArithmeticOverflow)
        })
    }

    fn owned_lock(&self, caller: &Address, id: LockId) -> Result<&Lock, LedgerError> {
        let lock = self.locks.get(&id).ok_or(LedgerError::LockNotFound(id))?;
        if lock.owner != *caller {
            return Err(LedgerError::Unauthorized(format!(
                "{} does not own lock {}",
                caller, id
            )));
        }
        Ok(lock)
    }

    fn move_delegation(&mut self, id: LockId, from: &Address, to: Address) {
        if let Some(ids) = self.delegated.get_mut(from) {
            ids.remove(&id);
            if ids.is_empty() {
                self.delegated.remove(from);
            }
        }
        self.delegated.entry(to).or_default().insert(id);
    }

    fn ensure_running(&self) -> Result<(), LedgerError> {
        if self.stopped {
            Err(LedgerError::Stopped)
        } else {
            Ok(())
        }
    }

    fn ensure_admin(&self, caller: &Address) -> Result<(), LedgerError> {
        if *caller != self.admin {
            return Err(LedgerError::Unauthorized(format!(
                "{} is not the locking admin",
                caller
            )));
        }
        Ok(())
    }
}

fn check_amount(amount: Amount) -> Result<(), LedgerError> {
    if amount == 0 {
        return Err(LedgerError::InvalidAmount("cannot lock zero tokens".to_string()));
    }
    Ok(())
}

fn check_delegate(delegate: &Address) -> Result<(), LedgerError> {
    if delegate.is_zero() {
        return Err(LedgerError::InvalidDelegate("delegate is the zero address".to_string()));
    }
    Ok(())
}

fn custody_failure(operation: &str, e: TokenError) -> LedgerError {
    tracing::warn!("Token ledger rejected {}: {}", operation, e);
    LedgerError::TransferFailed(e.to_string())
}
