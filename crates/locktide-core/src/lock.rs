//! Lock records.

use std::fmt;

use locktide_types::time::weeks_since;
use locktide_types::{amount_string, Address, Amount, Timestamp, Week};
use serde::{Deserialize, Serialize};

use crate::curve;
use crate::error::LedgerError;

/// Lock identifier. Assigned from 1 upwards and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockId(pub u64);

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a lock is in its schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Still inside the cliff: full power, nothing vested
    Cliff,
    /// On the slope: power decays, principal releases linearly
    Vesting,
    /// Schedule finished: zero power, all principal claimable
    FullyVested,
}

/// Principal committed under a cliff + slope schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub id: LockId,
    /// Account that deposited the principal and receives withdrawals
    pub owner: Address,
    /// Account credited with the lock's voting power
    pub delegate: Address,
    /// Principal under the current schedule
    #[serde(with = "amount_string")]
    pub amount: Amount,
    /// Cliff length in weeks
    pub cliff: u64,
    /// Slope length in weeks
    pub slope: u64,
    /// Week the current schedule started
    pub start_week: Week,
    /// Withdrawn under the current schedule
    #[serde(with = "amount_string")]
    pub withdrawn: Amount,
    /// Released to the owner under schedules replaced by a relock
    #[serde(with = "amount_string")]
    pub released_before_relock: Amount,
    /// Voting power at the start of the current schedule
    #[serde(with = "amount_string")]
    pub weight: Amount,
}

impl Lock {
    /// Whole weeks since the current schedule started.
    pub fn elapsed_weeks(&self, now: Timestamp, week_seconds: u64) -> u64 {
        weeks_since(self.start_week, now, week_seconds)
    }

    pub fn state(&self, now: Timestamp, week_seconds: u64) -> LockState {
        let elapsed = self.elapsed_weeks(now, week_seconds);
        if elapsed <= self.cliff {
            LockState::Cliff
        } else if elapsed < self.cliff.saturating_add(self.slope) {
            LockState::Vesting
        } else {
            LockState::FullyVested
        }
    }

    /// Weeks left until the schedule is fully vested.
    pub fn remaining_weeks(&self, now: Timestamp, week_seconds: u64) -> u64 {
        curve::remaining_weeks(self.elapsed_weeks(now, week_seconds), self.cliff, self.slope)
    }

    /// Decayed voting power at `now`. A lock with nothing left in custody has none.
    pub fn voting_power(&self, now: Timestamp, week_seconds: u64) -> Result<Amount, LedgerError> {
        if self.held() == 0 {
            return Ok(0);
        }
        let elapsed = self.elapsed_weeks(now, week_seconds);
        curve::current_voting_power(self.weight, elapsed, self.cliff, self.slope)
    }

    /// Principal released by the current schedule at `now`, withdrawn or not.
    pub fn vested(&self, now: Timestamp, week_seconds: u64) -> Result<Amount, LedgerError> {
        let elapsed = self.elapsed_weeks(now, week_seconds);
        curve::vested_principal(self.amount, elapsed, self.cliff, self.slope)
    }

    /// Principal still bound by the schedule at `now`.
    pub fn locked(&self, now: Timestamp, week_seconds: u64) -> Result<Amount, LedgerError> {
        let unvested = self.amount - self.vested(now, week_seconds)?;
        Ok(unvested.min(self.held()))
    }

    /// Vested but not yet withdrawn.
    pub fn claimable(&self, now: Timestamp, week_seconds: u64) -> Result<Amount, LedgerError> {
        Ok(self.vested(now, week_seconds)?.saturating_sub(self.withdrawn))
    }

    /// Principal of this lock still sitting in custody.
    pub fn held(&self) -> Amount {
        self.amount - self.withdrawn
    }

    /// Everything ever released to the owner from this lock.
    pub fn lifetime_withdrawn(&self) -> Amount {
        self.released_before_relock + self.withdrawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locktide_types::{TOKEN, WEEK};

    fn sample() -> Lock {
        Lock {
            id: LockId(1),
            owner: Address::repeat_byte(1),
            delegate: Address::repeat_byte(1),
            amount: 1000 * TOKEN,
            cliff: 7,
            slope: 10,
            start_week: 100,
            withdrawn: 0,
            released_before_relock: 0,
            weight: 289_320_380_000_000_000_000,
        }
    }

    #[test]
    fn test_state_transitions() {
        let lock = sample();
        assert_eq!(lock.state(100 * WEEK, WEEK), LockState::Cliff);
        assert_eq!(lock.state(107 * WEEK, WEEK), LockState::Cliff);
        assert_eq!(lock.state(108 * WEEK, WEEK), LockState::Vesting);
        assert_eq!(lock.state(117 * WEEK, WEEK), LockState::FullyVested);
    }

    #[test]
    fn test_power_and_vesting_midway() {
        let lock = sample();
        let now = 112 * WEEK;
        assert_eq!(lock.voting_power(now, WEEK).unwrap(), lock.weight / 2);
        assert_eq!(lock.vested(now, WEEK).unwrap(), 500 * TOKEN);
        assert_eq!(lock.locked(now, WEEK).unwrap(), 500 * TOKEN);
        assert_eq!(lock.remaining_weeks(now, WEEK), 5);
    }

    #[test]
    fn test_claimable_accounts_for_withdrawn() {
        let mut lock = sample();
        lock.withdrawn = 300 * TOKEN;
        assert_eq!(lock.claimable(112 * WEEK, WEEK).unwrap(), 200 * TOKEN);
        assert_eq!(lock.held(), 700 * TOKEN);

        lock.released_before_relock = 50 * TOKEN;
        assert_eq!(lock.lifetime_withdrawn(), 350 * TOKEN);
    }

    #[test]
    fn test_emptied_lock_has_no_power() {
        let mut lock = sample();
        lock.withdrawn = lock.amount;
        assert_eq!(lock.voting_power(100 * WEEK, WEEK).unwrap(), 0);
        assert_eq!(lock.locked(100 * WEEK, WEEK).unwrap(), 0);
    }

    #[test]
    fn test_now_before_start_counts_as_start() {
        let lock = sample();
        assert_eq!(lock.elapsed_weeks(0, WEEK), 0);
        assert_eq!(lock.voting_power(0, WEEK).unwrap(), lock.weight);
    }

    #[test]
    fn test_lock_id_display() {
        assert_eq!(LockId(42).to_string(), "#42");
    }
}
