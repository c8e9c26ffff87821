//! Curve configuration.
//!
//! One immutable [`CurveConfig`] is handed to both ledgers at construction.
//! It carries the lock duration bounds, the weight formula multipliers and
//! the emission checkpoint table, and can be loaded from a TOML file.

use locktide_types::{amount_string, Amount, Timestamp, MONTH, TOKEN, WEEK, YEAR};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::LedgerError;

/// Complete curve configuration shared by the lock and emission ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    /// Vote-escrow parameters
    pub locking: LockingParams,
    /// Emission release parameters
    pub emission: EmissionParams,
}

impl CurveConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, LedgerError> {
        let config: CurveConfig = toml::from_str(contents)
            .map_err(|e| LedgerError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file.
    pub fn from_file(path: &Path) -> Result<Self, LedgerError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Save configuration to file.
    pub fn to_file(&self, path: &Path) -> Result<(), LedgerError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| LedgerError::InvalidConfig(format!("Failed to encode config: {}", e)))?;
        std::fs::write(path, contents).map_err(|e| {
            LedgerError::InvalidConfig(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), LedgerError> {
        self.locking.validate()?;
        self.emission.validate()
    }
}

/// Multipliers of the three weight terms, scaled by `ONE`.
///
/// The cliff and slope terms are earned linearly across their ranges. The
/// summed fraction is capped at `ONE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightMultipliers {
    /// Constant share granted to every lock
    pub constant: u64,
    /// Share earned linearly across the cliff range
    pub cliff: u64,
    /// Share earned linearly across the slope range
    pub slope: u64,
}

impl Default for WeightMultipliers {
    fn default() -> Self {
        Self {
            constant: 20_000_000,
            cliff: 80_000_000,
            slope: 40_000_000,
        }
    }
}

impl WeightMultipliers {
    /// Sum of all three multipliers.
    pub fn total(&self) -> u128 {
        u128::from(self.constant) + u128::from(self.cliff) + u128::from(self.slope)
    }
}

/// Vote-escrow lock parameters. Periods are in weeks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockingParams {
    pub min_cliff_period: u64,
    pub max_cliff_period: u64,
    pub min_slope_period: u64,
    pub max_slope_period: u64,
    /// Length of one schedule week in seconds
    pub week_seconds: u64,
    pub weight: WeightMultipliers,
}

impl Default for LockingParams {
    fn default() -> Self {
        Self {
            min_cliff_period: 0,
            max_cliff_period: 103,
            min_slope_period: 1,
            max_slope_period: 104,
            week_seconds: WEEK,
            weight: WeightMultipliers::default(),
        }
    }
}

impl LockingParams {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.min_cliff_period > self.max_cliff_period {
            return Err(LedgerError::InvalidConfig(format!(
                "min cliff period {} exceeds max {}",
                self.min_cliff_period, self.max_cliff_period
            )));
        }
        if self.min_slope_period == 0 {
            return Err(LedgerError::InvalidConfig(
                "min slope period must be at least 1 week".to_string(),
            ));
        }
        if self.min_slope_period > self.max_slope_period {
            return Err(LedgerError::InvalidConfig(format!(
                "min slope period {} exceeds max {}",
                self.min_slope_period, self.max_slope_period
            )));
        }
        if self.week_seconds == 0 {
            return Err(LedgerError::InvalidConfig("week length cannot be 0".to_string()));
        }
        if self.weight.total() == 0 {
            return Err(LedgerError::InvalidConfig(
                "weight multipliers cannot all be 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Check `cliff` and `slope` against the configured bounds.
    pub fn check_durations(&self, cliff: u64, slope: u64) -> Result<(), LedgerError> {
        let cliff_ok = (self.min_cliff_period..=self.max_cliff_period).contains(&cliff);
        let slope_ok = (self.min_slope_period..=self.max_slope_period).contains(&slope);
        if cliff_ok && slope_ok {
            Ok(())
        } else {
            Err(LedgerError::InvalidDuration {
                cliff,
                slope,
                min_cliff: self.min_cliff_period,
                max_cliff: self.max_cliff_period,
                min_slope: self.min_slope_period,
                max_slope: self.max_slope_period,
            })
        }
    }
}

/// Cumulative emission pinned at a point in time after the emission start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionCheckpoint {
    /// Seconds since the emission start
    pub elapsed: u64,
    /// Cumulative amount emitted by then
    #[serde(with = "amount_string")]
    pub cumulative: Amount,
}

impl EmissionCheckpoint {
    pub const fn new(elapsed: u64, cumulative: Amount) -> Self {
        Self { elapsed, cumulative }
    }
}

/// Emission release parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionParams {
    /// Unix timestamp the curve is anchored to
    pub emission_start: Timestamp,
    /// Hard cap on everything ever emitted
    #[serde(with = "amount_string")]
    pub total_cap: Amount,
    /// Strictly increasing checkpoints, the last one at `total_cap`
    pub checkpoints: Vec<EmissionCheckpoint>,
}

impl Default for EmissionParams {
    fn default() -> Self {
        Self {
            emission_start: 0,
            total_cap: 650_000_000 * TOKEN,
            checkpoints: default_checkpoints(),
        }
    }
}

impl EmissionParams {
    pub fn validate(&self) -> Result<(), LedgerError> {
        let last = self
            .checkpoints
            .last()
            .ok_or_else(|| LedgerError::InvalidConfig("emission checkpoint table is empty".to_string()))?;

        let mut prev = EmissionCheckpoint::new(0, 0);
        for checkpoint in &self.checkpoints {
            if checkpoint.elapsed <= prev.elapsed {
                return Err(LedgerError::InvalidConfig(format!(
                    "checkpoint at {}s is not after {}s",
                    checkpoint.elapsed, prev.elapsed
                )));
            }
            if checkpoint.cumulative < prev.cumulative {
                return Err(LedgerError::InvalidConfig(format!(
                    "checkpoint at {}s decreases cumulative emission",
                    checkpoint.elapsed
                )));
            }
            prev = *checkpoint;
        }

        if last.cumulative != self.total_cap {
            return Err(LedgerError::InvalidConfig(format!(
                "final checkpoint {} does not reach the cap {}",
                last.cumulative, self.total_cap
            )));
        }
        Ok(())
    }
}

/// Published release milestones: 1 and 6 months, 1, 10, 15, 25, 30 and 40 years.
pub fn default_checkpoints() -> Vec<EmissionCheckpoint> {
    vec![
        EmissionCheckpoint::new(MONTH, 3_692_586_569_806_444_700_000_000),
        EmissionCheckpoint::new(6 * MONTH, 21_843_234_320_275_928_950_000_000),
        EmissionCheckpoint::new(YEAR, 43_528_555_608_969_174_900_000_000),
        EmissionCheckpoint::new(10 * YEAR, 325_091_005_879_265_576_600_000_000),
        EmissionCheckpoint::new(15 * YEAR, 421_181_077_924_230_273_650_000_000),
        EmissionCheckpoint::new(25 * YEAR, 554_584_121_910_167_354_200_000_000),
        EmissionCheckpoint::new(30 * YEAR, 624_618_096_957_158_932_550_000_000),
        EmissionCheckpoint::new(40 * YEAR, 650_000_000 * TOKEN),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CurveConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.locking.max_cliff_period, 103);
        assert_eq!(config.locking.max_slope_period, 104);
        assert_eq!(config.emission.checkpoints.len(), 8);
    }

    #[test]
    fn test_check_durations() {
        let params = LockingParams::default();
        assert!(params.check_durations(0, 1).is_ok());
        assert!(params.check_durations(103, 104).is_ok());
        assert!(matches!(
            params.check_durations(104, 10),
            Err(LedgerError::InvalidDuration { cliff: 104, .. })
        ));
        assert!(params.check_durations(7, 0).is_err());
        assert!(params.check_durations(7, 105).is_err());
    }

    #[test]
    fn test_invalid_locking_params() {
        let mut params = LockingParams::default();
        params.min_slope_period = 0;
        assert!(params.validate().is_err());

        let mut params = LockingParams::default();
        params.min_cliff_period = 200;
        assert!(params.validate().is_err());

        let mut params = LockingParams::default();
        params.week_seconds = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_invalid_checkpoints() {
        let mut params = EmissionParams::default();
        params.checkpoints.swap(0, 1);
        assert!(params.validate().is_err());

        let mut params = EmissionParams::default();
        params.total_cap += 1;
        assert!(params.validate().is_err());

        let mut params = EmissionParams::default();
        params.checkpoints.clear();
        assert!(params.validate().is_err());

        let mut params = EmissionParams::default();
        params.checkpoints[0].elapsed = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.toml");

        let mut config = CurveConfig::default();
        config.emission.emission_start = 1_700_000_000;
        config.locking.min_cliff_period = 6;
        config.to_file(&path).unwrap();

        let loaded = CurveConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = CurveConfig::from_toml_str(
            r#"
            [locking]
            min_slope_period = 12

            [emission]
            emission_start = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.locking.min_slope_period, 12);
        assert_eq!(config.locking.max_slope_period, 104);
        assert_eq!(config.emission.emission_start, 1000);
        assert_eq!(config.emission.total_cap, 650_000_000 * TOKEN);
    }

    #[test]
    fn test_toml_rejects_invalid() {
        let err = CurveConfig::from_toml_str("[locking]\nmin_slope_period = 0\n").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidConfig(_)));
    }
}
