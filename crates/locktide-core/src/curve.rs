//! Fixed-point curve math.
//!
//! Stateless integer formulas behind both ledgers:
//!
//! - initial weight fraction from a cliff/slope duration profile
//! - linear decay of voting power and release of principal over the slope
//! - cumulative emission as a function of time since the emission start
//!
//! Fractions are scaled by [`ONE`], token amounts by `TOKEN`. Every
//! division rounds toward zero and every product is overflow-checked.

use locktide_types::amount::mul_div;
use locktide_types::{Amount, ONE};

use crate::config::{EmissionCheckpoint, EmissionParams, LockingParams};
use crate::error::LedgerError;

/// Position of `value` inside `[min, max]` as a `(numerator, denominator)`
/// pair. A degenerate range counts as fully saturated.
fn position(value: u64, min: u64, max: u64) -> (u128, u128) {
    let range = max.saturating_sub(min);
    if range == 0 {
        (1, 1)
    } else {
        (u128::from(value.saturating_sub(min)), u128::from(range))
    }
}

/// `multiplier * position`, floor-divided on its own.
fn scaled_term(multiplier: u64, (pos, range): (u128, u128)) -> Result<u128, LedgerError> {
    Ok(mul_div(u128::from(multiplier), pos, range)?)
}

/// Initial voting weight fraction for a `(cliff, slope)` profile, in `[0, ONE]`.
///
/// ```text
/// fraction = min(ONE, Mk + Mc*(cliff-minCliff)/Dc + Ms*(slope-minSlope)/Ds)
/// ```
///
/// `Dc`/`Ds` are the widths of the cliff and slope ranges and each term is
/// floor-divided separately. The default multipliers sum to `1.4 * ONE`, so
/// long profiles saturate at `ONE` before reaching the maxima.
pub fn initial_weight_fraction(
    params: &LockingParams,
    cliff: u64,
    slope: u64,
) -> Result<u128, LedgerError> {
    params.check_durations(cliff, slope)?;

    let weight = &params.weight;
    let cliff_term = scaled_term(
        weight.cliff,
        position(cliff, params.min_cliff_period, params.max_cliff_period),
    )?;
    let slope_term = scaled_term(
        weight.slope,
        position(slope, params.min_slope_period, params.max_slope_period),
    )?;

    let fraction = u128::from(weight.constant)
        .checked_add(cliff_term)
        .and_then(|v| v.checked_add(slope_term))
        .ok_or(LedgerError::ArithmeticOverflow)?;
    Ok(fraction.min(ONE))
}

/// Voting power granted at lock time, before any decay.
pub fn voting_weight(
    params: &LockingParams,
    principal: Amount,
    cliff: u64,
    slope: u64,
) -> Result<Amount, LedgerError> {
    let fraction = initial_weight_fraction(params, cliff, slope)?;
    Ok(mul_div(principal, fraction, ONE)?)
}

/// Share of the schedule still ahead after `elapsed_weeks`, in `[0, ONE]`.
///
/// `ONE` through the cliff, linear down to zero across the slope.
pub fn remaining_fraction(elapsed_weeks: u64, cliff: u64, slope: u64) -> u128 {
    if elapsed_weeks <= cliff {
        return ONE;
    }
    let end = cliff.saturating_add(slope);
    if elapsed_weeks >= end || slope == 0 {
        return 0;
    }
    // end - elapsed < slope here, so the quotient stays below ONE
    ONE * u128::from(end - elapsed_weeks) / u128::from(slope)
}

/// Weeks until the schedule is fully vested, measured from `elapsed_weeks`.
pub fn remaining_weeks(elapsed_weeks: u64, cliff: u64, slope: u64) -> u64 {
    cliff.saturating_add(slope).saturating_sub(elapsed_weeks)
}

/// Decayed voting power of a lock with initial `weight`.
pub fn current_voting_power(
    weight: Amount,
    elapsed_weeks: u64,
    cliff: u64,
    slope: u64,
) -> Result<Amount, LedgerError> {
    let remaining = remaining_fraction(elapsed_weeks, cliff, slope);
    Ok(mul_div(weight, remaining, ONE)?)
}

/// Principal released by the schedule so far. Non-decreasing in time.
pub fn vested_principal(
    principal: Amount,
    elapsed_weeks: u64,
    cliff: u64,
    slope: u64,
) -> Result<Amount, LedgerError> {
    let released = ONE - remaining_fraction(elapsed_weeks, cliff, slope);
    Ok(mul_div(principal, released, ONE)?)
}

/// Cumulative emission after `elapsed` seconds.
///
/// Piecewise-linear through the checkpoint table, starting at zero and
/// holding at the final checkpoint afterwards. Exact at every checkpoint.
pub fn cumulative_emission(params: &EmissionParams, elapsed: u64) -> Result<Amount, LedgerError> {
    let checkpoints = &params.checkpoints;
    let next_index = checkpoints.partition_point(|c| c.elapsed < elapsed);

    let value = match checkpoints.get(next_index) {
        None => checkpoints.last().map_or(0, |c| c.cumulative),
        Some(next) if next.elapsed == elapsed => next.cumulative,
        Some(next) => {
            let prev = next_index
                .checked_sub(1)
                .and_then(|i| checkpoints.get(i))
                .copied()
                .unwrap_or(EmissionCheckpoint::new(0, 0));
            interpolate(&prev, next, elapsed)?
        }
    };

    if value > params.total_cap {
        return Err(LedgerError::EmissionCapExceeded {
            value,
            cap: params.total_cap,
        });
    }
    Ok(value)
}

fn interpolate(
    prev: &EmissionCheckpoint,
    next: &EmissionCheckpoint,
    elapsed: u64,
) -> Result<Amount, LedgerError> {
    let span = next.elapsed.saturating_sub(prev.elapsed);
    let into = elapsed.saturating_sub(prev.elapsed);
    let rise = next
        .cumulative
        .checked_sub(prev.cumulative)
        .ok_or_else(|| LedgerError::InvalidConfig("emission checkpoints decrease".to_string()))?;
    let step = mul_div(rise, u128::from(into), u128::from(span))?;
    prev.cumulative.checked_add(step).ok_or(LedgerError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_checkpoints;
    use locktide_types::{DAY, MONTH, TOKEN, YEAR};
    use proptest::prelude::*;

    fn params() -> LockingParams {
        LockingParams::default()
    }

    #[test]
    fn test_weight_fraction_pinned_values() {
        let p = params();
        assert_eq!(initial_weight_fraction(&p, 7, 10).unwrap(), 28_932_038);
        assert_eq!(initial_weight_fraction(&p, 13, 11).unwrap(), 33_980_582);
        assert_eq!(initial_weight_fraction(&p, 0, 1).unwrap(), 20_000_000);
        assert_eq!(initial_weight_fraction(&p, 103, 1).unwrap(), ONE);
        assert_eq!(initial_weight_fraction(&p, 0, 104).unwrap(), 60_000_000);
        assert_eq!(initial_weight_fraction(&p, 103, 104).unwrap(), ONE);
    }

    #[test]
    fn test_voting_weight_pinned_value() {
        let weight = voting_weight(&params(), 1000 * TOKEN, 7, 10).unwrap();
        assert_eq!(weight, 289_320_380_000_000_000_000);
        let weight = voting_weight(&params(), 500 * TOKEN, 13, 11).unwrap();
        assert_eq!(weight, 169_902_910_000_000_000_000);
    }

    #[test]
    fn test_weight_rejects_out_of_bounds() {
        let p = params();
        assert!(matches!(
            initial_weight_fraction(&p, 104, 10),
            Err(LedgerError::InvalidDuration { .. })
        ));
        assert!(initial_weight_fraction(&p, 10, 0).is_err());
        assert!(initial_weight_fraction(&p, 10, 105).is_err());
    }

    #[test]
    fn test_weight_with_degenerate_ranges() {
        let mut p = params();
        p.min_cliff_period = 103;
        p.min_slope_period = 104;
        assert_eq!(initial_weight_fraction(&p, 103, 104).unwrap(), ONE);
    }

    #[test]
    fn test_remaining_fraction_shape() {
        assert_eq!(remaining_fraction(0, 7, 10), ONE);
        assert_eq!(remaining_fraction(7, 7, 10), ONE);
        assert_eq!(remaining_fraction(8, 7, 10), 90_000_000);
        assert_eq!(remaining_fraction(12, 7, 10), 50_000_000);
        assert_eq!(remaining_fraction(17, 7, 10), 0);
        assert_eq!(remaining_fraction(100, 7, 10), 0);
    }

    #[test]
    fn test_vested_principal_halfway() {
        assert_eq!(vested_principal(1000 * TOKEN, 12, 7, 10).unwrap(), 500 * TOKEN);
        assert_eq!(vested_principal(1000 * TOKEN, 7, 7, 10).unwrap(), 0);
        assert_eq!(vested_principal(1000 * TOKEN, 18, 7, 10).unwrap(), 1000 * TOKEN);
    }

    #[test]
    fn test_remaining_weeks() {
        assert_eq!(remaining_weeks(0, 7, 10), 17);
        assert_eq!(remaining_weeks(12, 7, 10), 5);
        assert_eq!(remaining_weeks(30, 7, 10), 0);
    }

    #[test]
    fn test_emission_checkpoints_are_exact() {
        let p = EmissionParams::default();
        assert_eq!(cumulative_emission(&p, 0).unwrap(), 0);
        for checkpoint in default_checkpoints() {
            assert_eq!(
                cumulative_emission(&p, checkpoint.elapsed).unwrap(),
                checkpoint.cumulative
            );
        }
        assert_eq!(cumulative_emission(&p, 40 * YEAR).unwrap(), 650_000_000 * TOKEN);
        assert_eq!(cumulative_emission(&p, 100 * YEAR).unwrap(), 650_000_000 * TOKEN);
    }

    #[test]
    fn test_emission_interpolates_between_checkpoints() {
        let p = EmissionParams::default();
        let half_month = cumulative_emission(&p, 15 * DAY).unwrap();
        assert_eq!(half_month, 3_692_586_569_806_444_700_000_000 / 2);

        let a = cumulative_emission(&p, MONTH).unwrap();
        let b = cumulative_emission(&p, MONTH + 1).unwrap();
        let c = cumulative_emission(&p, 6 * MONTH).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_emission_cap_exceeded_on_defective_table() {
        let mut p = EmissionParams::default();
        p.total_cap = 1;
        assert!(matches!(
            cumulative_emission(&p, YEAR),
            Err(LedgerError::EmissionCapExceeded { cap: 1, .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_weight_monotonic_in_cliff(cliff in 0u64..103, slope in 1u64..=104) {
            let p = params();
            let lower = initial_weight_fraction(&p, cliff, slope).unwrap();
            let higher = initial_weight_fraction(&p, cliff + 1, slope).unwrap();
            prop_assert!(lower <= higher);
            prop_assert!(higher <= ONE);
        }

        #[test]
        fn prop_weight_monotonic_in_slope(cliff in 0u64..=103, slope in 1u64..104) {
            let p = params();
            let lower = initial_weight_fraction(&p, cliff, slope).unwrap();
            let higher = initial_weight_fraction(&p, cliff, slope + 1).unwrap();
            prop_assert!(lower <= higher);
        }

        #[test]
        fn prop_weight_saturates_at_one(cliff in 0u64..=103, slope in 1u64..=104) {
            let fraction = initial_weight_fraction(&params(), cliff, slope).unwrap();
            prop_assert!(fraction >= 20_000_000);
            prop_assert!(fraction <= ONE);
            prop_assert_eq!(initial_weight_fraction(&params(), 103, slope).unwrap(), ONE);
        }

        #[test]
        fn prop_decay_non_increasing(
            elapsed in 0u64..300,
            cliff in 0u64..=103,
            slope in 1u64..=104,
            weight in 0u128..(1u128 << 96),
        ) {
            let now = current_voting_power(weight, elapsed, cliff, slope).unwrap();
            let later = current_voting_power(weight, elapsed + 1, cliff, slope).unwrap();
            prop_assert!(later <= now);
            prop_assert!(now <= weight);
        }

        #[test]
        fn prop_vested_non_decreasing_and_bounded(
            elapsed in 0u64..300,
            cliff in 0u64..=103,
            slope in 1u64..=104,
            principal in 1u128..(1u128 << 96),
        ) {
            let now = vested_principal(principal, elapsed, cliff, slope).unwrap();
            let later = vested_principal(principal, elapsed + 1, cliff, slope).unwrap();
            prop_assert!(now <= later);
            prop_assert!(later <= principal);
        }

        #[test]
        fn prop_emission_monotonic(t in 0u64..(45 * YEAR), dt in 0u64..(2 * YEAR)) {
            let p = EmissionParams::default();
            let a = cumulative_emission(&p, t).unwrap();
            let b = cumulative_emission(&p, t + dt).unwrap();
            prop_assert!(a <= b);
            prop_assert!(b <= p.total_cap);
        }
    }
}
