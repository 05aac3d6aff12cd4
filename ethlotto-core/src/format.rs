//! Conversions between on-chain integer amounts and the strings shown to the user.

use crate::error::{LottoError, Result};
use alloy_primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};

pub const ETHER_DECIMALS: u32 = 18;
/// Chainlink ETH/USD answers carry 8 decimals.
pub const PRICE_FEED_DECIMALS: u32 = 8;
/// `10^77` is the largest power of ten a `U256` holds.
pub const MAX_DECIMALS: u32 = 77;

const WEI_PER_ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

fn pow10(decimals: u32) -> Result<U256> {
    U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| {
            LottoError::invalid_amount(format!(
                "{} decimals exceed the {} a 256-bit amount supports",
                decimals, MAX_DECIMALS
            ))
        })
}

/// Whole-unit and fractional parts of `value / 10^decimals`.
fn split_units(value: U256, decimals: u32) -> Result<(U256, U256)> {
    let scale = pow10(decimals)?;
    Ok((value / scale, value % scale))
}

fn render(whole: U256, frac: U256, decimals: u32) -> String {
    if decimals == 0 {
        return format!("{}.0", whole);
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    let trimmed = frac.trim_end_matches('0');
    let frac = if trimmed.is_empty() { "0" } else { trimmed };
    format!("{}.{}", whole, frac)
}

/// Renders an integer amount the way ethers' `formatUnits` does: trailing zeros trimmed,
/// at least one fractional digit (`"1.5"`, `"2.0"`, `"0.0"`).
pub fn format_units(value: U256, decimals: u32) -> Result<String> {
    let (whole, frac) = split_units(value, decimals)?;
    Ok(render(whole, frac, decimals))
}

pub fn format_ether(wei: U256) -> String {
    render(wei / WEI_PER_ETHER, wei % WEI_PER_ETHER, ETHER_DECIMALS)
}

/// Parses a decimal string such as `"0.25"` into an integer amount with `decimals` places.
pub fn parse_units(input: &str, decimals: u32) -> Result<U256> {
    let input = input.trim();
    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(LottoError::invalid_amount(format!("'{}' is not a number", input)));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(LottoError::invalid_amount(format!("'{}' is not a number", input)));
    }
    if decimals > MAX_DECIMALS {
        return Err(LottoError::invalid_amount(format!(
            "{} decimals exceed the {} a 256-bit amount supports",
            decimals, MAX_DECIMALS
        )));
    }
    if frac.len() > decimals as usize {
        return Err(LottoError::invalid_amount(format!(
            "'{}' has more than {} decimal places",
            input, decimals
        )));
    }

    let digits = format!("{}{:0<width$}", whole, frac, width = decimals as usize);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10)
        .map_err(|e| LottoError::invalid_amount(format!("'{}': {}", input, e)))
}

pub fn parse_ether(input: &str) -> Result<U256> {
    parse_units(input, ETHER_DECIMALS)
}

/// Inserts thousands separators into the integer part of a decimal string.
pub fn commify(value: &str) -> String {
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (value, None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

/// Exact decimal value of `value / 10^decimals`.
pub fn to_display_units(value: U256, decimals: u32) -> Result<Decimal> {
    if decimals > 28 {
        return Err(LottoError::invalid_amount(format!(
            "{} decimals exceed display precision",
            decimals
        )));
    }

    let (whole, frac) = split_units(value, decimals)?;
    let whole = u64::try_from(whole)
        .map_err(|_| LottoError::invalid_amount(format!("{} is too large to display", value)))?;
    // frac < 10^28 here, so it fits an i128
    let frac = i128::try_from(frac)
        .map_err(|_| LottoError::invalid_amount(format!("{} is too large to display", value)))?;

    Ok(Decimal::from(whole) + Decimal::from_i128_with_scale(frac, decimals))
}

/// Value of `wei` in the oracle's quote currency, rounded to cents.
pub fn usd_value(wei: U256, rate_numerator: u128) -> Result<Decimal> {
    let ether = to_display_units(wei, ETHER_DECIMALS)?;
    let rate = Decimal::try_from_i128_with_scale(rate_numerator as i128, PRICE_FEED_DECIMALS)
        .map_err(|e| LottoError::invalid_amount(format!("price rate {}: {}", rate_numerator, e)))?;
    let usd = ether
        .checked_mul(rate)
        .ok_or_else(|| LottoError::invalid_amount("usd value overflow"))?;
    Ok(usd.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

pub fn format_usd(wei: U256, rate_numerator: u128) -> Result<String> {
    Ok(format!("${:.2}", usd_value(wei, rate_numerator)?))
}

/// `"Ξ "` followed by the ether amount rounded to `places` decimals.
pub fn format_ether_rounded(wei: U256, places: u32) -> Result<String> {
    let ether = to_display_units(wei, ETHER_DECIMALS)?
        .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    Ok(format!("Ξ {:.*}", places as usize, ether))
}

/// Renders a duration as `"H hours, M minutes, S seconds"`, dropping zero units.
pub fn seconds_to_hms(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(unit(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(unit(minutes, "minute"));
    }
    if seconds > 0 {
        parts.push(unit(seconds, "second"));
    }
    parts.join(", ")
}

fn unit(value: u64, name: &str) -> String {
    if value == 1 {
        format!("{} {}", value, name)
    } else {
        format!("{} {}s", value, name)
    }
}

/// Ticket purchase preview: the entered wei amount in ether and in USD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub ether: String,
    pub usd: String,
}

pub fn convert(wei: U256, rate_numerator: u128) -> Result<Conversion> {
    Ok(Conversion {
        ether: format!("Ξ {}", format_ether(wei)),
        usd: format!("$ {:.2}", usd_value(wei, rate_numerator)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(s: &str) -> U256 {
        U256::from_str_radix(s, 10).unwrap()
    }

    #[test]
    fn test_seconds_to_hms() {
        assert_eq!(seconds_to_hms(0), "");
        assert_eq!(seconds_to_hms(3661), "1 hour, 1 minute, 1 second");
        assert_eq!(seconds_to_hms(7322), "2 hours, 2 minutes, 2 seconds");
        assert_eq!(seconds_to_hms(3600), "1 hour");
        assert_eq!(seconds_to_hms(61), "1 minute, 1 second");
        assert_eq!(seconds_to_hms(7200 + 5), "2 hours, 5 seconds");
    }

    #[test]
    fn test_format_ether() {
        assert_eq!(format_ether(wei("1500000000000000000")), "1.5");
        assert_eq!(format_ether(U256::ZERO), "0.0");
        assert_eq!(format_ether(wei("2000000000000000000")), "2.0");
        assert_eq!(format_ether(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_ether("1.5").unwrap(), wei("1500000000000000000"));
        assert_eq!(parse_ether(".5").unwrap(), wei("500000000000000000"));
        assert_eq!(parse_units("12", 6).unwrap(), wei("12000000"));
        assert_eq!(parse_ether("0").unwrap(), U256::ZERO);
        assert!(parse_ether("1.2.3").is_err());
        assert!(parse_ether("abc").is_err());
        assert!(parse_units("0.0000001", 6).is_err());
        assert!(parse_ether("").is_err());
    }

    #[test]
    fn test_commify() {
        assert_eq!(commify("1234567.5"), "1,234,567.5");
        assert_eq!(commify("123"), "123");
        assert_eq!(commify("1000"), "1,000");
    }

    #[test]
    fn test_usd_conversion() {
        let pot = wei("1500000000000000000");
        assert_eq!(format_usd(pot, 150_000_000_000).unwrap(), "$2250.00");
        assert_eq!(format_usd(U256::ZERO, 150_000_000_000).unwrap(), "$0.00");
    }

    #[test]
    fn test_format_ether_rounded() {
        assert_eq!(
            format_ether_rounded(wei("123456789000000000"), 4).unwrap(),
            "Ξ 0.1235"
        );
        assert_eq!(format_ether_rounded(U256::ZERO, 4).unwrap(), "Ξ 0.0000");
    }

    #[test]
    fn test_convert_preview() {
        let preview = convert(wei("1000000000000000000"), 123_456_000_000).unwrap();
        assert_eq!(preview.ether, "Ξ 1.0");
        assert_eq!(preview.usd, "$ 1234.56");
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(wei("12500000"), 6).unwrap(), "12.5");
        assert_eq!(format_units(wei("7"), 0).unwrap(), "7.0");
        assert_eq!(
            format_units(U256::from(1u64), MAX_DECIMALS).unwrap(),
            format!("0.{}1", "0".repeat(76))
        );
    }

    #[test]
    fn test_out_of_range_decimals_are_errors() {
        assert!(matches!(
            format_units(U256::from(1u64), 78),
            Err(LottoError::InvalidAmount(_))
        ));
        assert!(format_units(U256::MAX, 255).is_err());
        assert!(to_display_units(U256::from(1u64), 80).is_err());
        assert!(parse_units("1", 90).is_err());
    }

    #[test]
    fn test_display_units_rejects_huge_values() {
        assert!(to_display_units(U256::MAX, ETHER_DECIMALS).is_err());
    }
}
