//! Serde implementations for locktide-types.

use crate::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Serialize an [`Amount`] as a decimal string of base units.
///
/// TOML and JSON integers cannot carry 10^26-sized amounts; use with
/// `#[serde(with = "locktide_types::amount_string")]`.
pub mod amount_string {
    use crate::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.trim()
            .replace('_', "")
            .parse::<Amount>()
            .map_err(serde::de::Error::custom)
    }
}
