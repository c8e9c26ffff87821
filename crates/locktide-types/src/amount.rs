//! Token amounts and fixed-point scales.
//!
//! Two scales are in use and never mixed without an explicit conversion:
//! token amounts carry 18 decimals (`TOKEN`), weight and decay fractions
//! carry 8 decimals (`ONE`).

use crate::error::TypesError;

/// Token amount in base units (10^-18 token).
///
/// `u128` covers the full emission cap (6.5 * 10^26) multiplied by either
/// scale factor without overflow; every product is still checked.
pub type Amount = u128;

/// One whole token in base units (10^18).
pub const TOKEN: Amount = 1_000_000_000_000_000_000;

/// Unit fraction for weight and decay math (10^8).
pub const ONE: u128 = 100_000_000;

/// Number of decimals carried by `TOKEN`.
pub const TOKEN_DECIMALS: usize = 18;

/// Compute `a * b / denominator`, rounding toward zero.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, TypesError> {
    if denominator == 0 {
        return Err(TypesError::DivisionByZero);
    }
    a.checked_mul(b)
        .map(|product| product / denominator)
        .ok_or(TypesError::AmountOverflow)
}

/// Parse a decimal token string such as `"1000"` or `"12.5"` into base units.
pub fn parse_token_amount(s: &str) -> Result<Amount, TypesError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(TypesError::InvalidAmount("empty string".to_string()));
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if frac.len() > TOKEN_DECIMALS {
        return Err(TypesError::InvalidAmount(format!(
            "{s}: more than {TOKEN_DECIMALS} decimals"
        )));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(TypesError::InvalidAmount(s.to_string()));
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse()? };
    let frac: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = TOKEN_DECIMALS);
        padded.parse()?
    };

    whole
        .checked_mul(TOKEN)
        .and_then(|w| w.checked_add(frac))
        .ok_or(TypesError::AmountOverflow)
}

/// Format base units as a decimal token string, trimming trailing zeros.
pub fn format_token_amount(amount: Amount) -> String {
    let whole = amount / TOKEN;
    let frac = amount % TOKEN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0>width$}", width = TOKEN_DECIMALS);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
