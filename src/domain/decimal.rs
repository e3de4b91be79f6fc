//! Scaled-integer fixed-point decimals.
//!
//! A `ScaledDecimal<D>` stores `value * 10^D` in an `i128`. The number of decimals is a
//! const generic parameter, so values of different precision cannot be combined without
//! an explicit [`ScaledDecimal::rescale`]. No operation goes through floating point.

use primitive_types::U256;
use rust_decimal::Decimal as RustDecimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Primary precision used by market, account and accumulator values.
pub type Fixed6 = ScaledDecimal<6>;

/// Secondary precision published by some upstream oracles.
pub type Fixed18 = ScaledDecimal<18>;

/// Signed fixed-point number with `D` fractional decimal digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScaledDecimal<const D: u32>(i128);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalParseError {
    #[error("empty decimal string")]
    Empty,
    #[error("invalid decimal string: {0}")]
    Invalid(String),
    #[error("decimal out of range: {0}")]
    OutOfRange(String),
}

impl<const D: u32> ScaledDecimal<D> {
    /// `10^D`, the raw value of one whole unit.
    pub const BASE: i128 = 10i128.pow(D);
    pub const ZERO: Self = ScaledDecimal(0);
    pub const ONE: Self = ScaledDecimal(Self::BASE);

    /// Wrap an already-scaled raw integer.
    pub const fn from_raw(raw: i128) -> Self {
        ScaledDecimal(raw)
    }

    /// Scale a whole number.
    pub fn from_int(units: i64) -> Self {
        ScaledDecimal((units as i128).saturating_mul(Self::BASE))
    }

    pub const fn raw(&self) -> i128 {
        self.0
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn one() -> Self {
        Self::ONE
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn abs(&self) -> Self {
        ScaledDecimal(self.0.saturating_abs())
    }

    pub fn min(self, other: Self) -> Self {
        std::cmp::min(self, other)
    }

    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }

    /// `self * rhs / BASE`, truncated toward zero.
    pub fn mul(self, rhs: Self) -> Self {
        ScaledDecimal(mul_div(self.0, rhs.0, Self::BASE))
    }

    /// `self * BASE / rhs`, truncated toward zero. Division by zero yields zero.
    pub fn div(self, rhs: Self) -> Self {
        if rhs.0 == 0 {
            return Self::ZERO;
        }
        ScaledDecimal(mul_div(self.0, Self::BASE, rhs.0))
    }

    /// Convert to another precision. Widening is exact; narrowing truncates toward zero.
    pub fn rescale<const TO: u32>(self) -> ScaledDecimal<TO> {
        ScaledDecimal(rescale(self.0, D, TO))
    }

    /// Parse a decimal string, dropping fractional digits beyond `D` (never rounding).
    pub fn from_decimal_string(s: &str) -> Result<Self, DecimalParseError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DecimalParseError::Empty);
        }

        let (negative, unsigned) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DecimalParseError::Invalid(s.to_string()));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(DecimalParseError::Invalid(s.to_string()));
        }

        let mut raw: i128 = 0;
        for b in int_part.bytes() {
            raw = raw
                .checked_mul(10)
                .and_then(|v| v.checked_add((b - b'0') as i128))
                .ok_or_else(|| DecimalParseError::OutOfRange(s.to_string()))?;
        }
        raw = raw
            .checked_mul(Self::BASE)
            .ok_or_else(|| DecimalParseError::OutOfRange(s.to_string()))?;

        // Excess fractional digits are discarded.
        let mut place = Self::BASE;
        for b in frac_part.bytes().take(D as usize) {
            place /= 10;
            raw = raw
                .checked_add((b - b'0') as i128 * place)
                .ok_or_else(|| DecimalParseError::OutOfRange(s.to_string()))?;
        }

        Ok(ScaledDecimal(if negative { -raw } else { raw }))
    }

    /// Canonical decimal string: no trailing fractional zeros, no exponent, no `-0`.
    pub fn to_decimal_string(&self) -> String {
        let negative = self.0 < 0;
        let magnitude = self.0.unsigned_abs();
        let base = Self::BASE as u128;
        let int_part = magnitude / base;
        let frac_part = magnitude % base;

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&int_part.to_string());
        if frac_part != 0 {
            let digits = format!("{:0width$}", frac_part, width = D as usize);
            out.push('.');
            out.push_str(digits.trim_end_matches('0'));
        }
        out
    }

    /// Convert to `rust_decimal::Decimal`. Fails when the value exceeds its 96-bit mantissa.
    pub fn to_decimal(&self) -> Option<RustDecimal> {
        RustDecimal::try_from_i128_with_scale(self.0, D).ok()
    }

    /// Convert from `rust_decimal::Decimal`, truncating digits beyond `D`.
    pub fn from_decimal(value: RustDecimal) -> Self {
        let scale = value.scale();
        ScaledDecimal(rescale(value.mantissa(), scale, D))
    }
}

/// Exact integer rescale between decimal precisions.
///
/// Widening multiplies by `10^(to - from)` (saturating at the `i128` bounds); narrowing
/// divides, truncating toward zero.
pub fn rescale(value: i128, from: u32, to: u32) -> i128 {
    match from.cmp(&to) {
        Ordering::Equal => value,
        Ordering::Less => {
            let factor = 10i128.checked_pow(to - from);
            match factor {
                Some(f) => value.saturating_mul(f),
                None if value == 0 => 0,
                None if value > 0 => i128::MAX,
                None => i128::MIN,
            }
        }
        Ordering::Greater => match 10i128.checked_pow(from - to) {
            Some(f) => value / f,
            None => 0,
        },
    }
}

/// `a * b / d` truncated toward zero. Products past `i128` are carried in 256 bits;
/// quotients past `i128` saturate.
fn mul_div(a: i128, b: i128, d: i128) -> i128 {
    if d == 0 {
        return 0;
    }
    if let Some(product) = a.checked_mul(b) {
        return product / d;
    }
    // Magnitudes only, so the division truncates toward zero.
    let negative = (a < 0) ^ (b < 0) ^ (d < 0);
    let quotient = U256::from(a.unsigned_abs()) * U256::from(b.unsigned_abs())
        / U256::from(d.unsigned_abs());
    if quotient > U256::from(i128::MAX as u128) {
        return if negative { i128::MIN } else { i128::MAX };
    }
    let magnitude = quotient.low_u128() as i128;
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

impl<const D: u32> fmt::Display for ScaledDecimal<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

impl<const D: u32> FromStr for ScaledDecimal<D> {
    type Err = DecimalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_string(s)
    }
}

impl<const D: u32> std::ops::Add for ScaledDecimal<D> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        ScaledDecimal(self.0.saturating_add(rhs.0))
    }
}

impl<const D: u32> std::ops::Sub for ScaledDecimal<D> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        ScaledDecimal(self.0.saturating_sub(rhs.0))
    }
}

impl<const D: u32> std::ops::Mul for ScaledDecimal<D> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        ScaledDecimal::mul(self, rhs)
    }
}

impl<const D: u32> std::ops::Div for ScaledDecimal<D> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        ScaledDecimal::div(self, rhs)
    }
}

impl<const D: u32> std::ops::Neg for ScaledDecimal<D> {
    type Output = Self;

    fn neg(self) -> Self {
        ScaledDecimal(self.0.saturating_neg())
    }
}

impl<const D: u32> std::ops::AddAssign for ScaledDecimal<D> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<const D: u32> std::ops::SubAssign for ScaledDecimal<D> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<const D: u32> std::iter::Sum for ScaledDecimal<D> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, v| acc + v)
    }
}

// Indexers publish big integers as strings; raw scaled values are accepted either way.
impl<const D: u32> Serialize for ScaledDecimal<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de, const D: u32> Deserialize<'de> for ScaledDecimal<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        struct RawVisitor<const D: u32>;

        impl<'de, const D: u32> Visitor<'de> for RawVisitor<D> {
            type Value = ScaledDecimal<D>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a scaled integer as a string or number")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ScaledDecimal(v as i128))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ScaledDecimal(v as i128))
            }

            fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
                Ok(ScaledDecimal(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.trim()
                    .parse::<i128>()
                    .map(ScaledDecimal)
                    .map_err(|_| E::custom(format!("invalid scaled integer: {}", v)))
            }
        }

        deserializer.deserialize_any(RawVisitor::<D>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f6(s: &str) -> Fixed6 {
        Fixed6::from_decimal_string(s).unwrap()
    }

    #[test]
    fn test_parse_truncates_excess_fraction() {
        assert_eq!(f6("1.2345678").raw(), 1_234_567);
        assert_eq!(f6("-1.9999999").raw(), -1_999_999);
        assert_eq!(f6("0.0000009").raw(), 0);
    }

    #[test]
    fn test_parse_accepts_partial_forms() {
        assert_eq!(f6(".5").raw(), 500_000);
        assert_eq!(f6("5.").raw(), 5_000_000);
        assert_eq!(f6("+3").raw(), 3_000_000);
        assert_eq!(f6("007.10").raw(), 7_100_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Fixed6::from_decimal_string(""), Err(DecimalParseError::Empty));
        assert!(Fixed6::from_decimal_string(".").is_err());
        assert!(Fixed6::from_decimal_string("1e5").is_err());
        assert!(Fixed6::from_decimal_string("1.2.3").is_err());
        assert!(Fixed6::from_decimal_string("--1").is_err());
    }

    #[test]
    fn test_parse_fraction_past_i128_is_out_of_range() {
        let input = "170141183460469231731687303715884.999999";
        assert_eq!(
            Fixed6::from_decimal_string(input),
            Err(DecimalParseError::OutOfRange(input.to_string()))
        );
        // The same integer part with a small fraction still fits.
        assert!(Fixed6::from_decimal_string("170141183460469231731687303715884.1").is_ok());
    }

    #[test]
    fn test_decimal_string_roundtrip_normalizes() {
        let cases = [
            ("123.456", "123.456"),
            ("1.500", "1.5"),
            ("007", "7"),
            ("-0.000001", "-0.000001"),
            ("-0", "0"),
            ("0.000000", "0"),
            ("999999999.999999", "999999999.999999"),
            ("-42.10", "-42.1"),
        ];
        for (input, normalized) in cases {
            assert_eq!(f6(input).to_decimal_string(), normalized, "input {}", input);
        }
    }

    #[test]
    fn test_mul_truncates_toward_zero() {
        assert_eq!(f6("1.5").mul(f6("1.5")), f6("2.25"));
        assert_eq!(Fixed6::from_raw(3).mul(f6("0.5")).raw(), 1);
        assert_eq!(Fixed6::from_raw(-3).mul(f6("0.5")).raw(), -1);
    }

    #[test]
    fn test_div_by_zero_is_zero() {
        assert_eq!(f6("10").div(Fixed6::ZERO), Fixed6::ZERO);
        assert_eq!(f6("10").div(f6("4")), f6("2.5"));
        assert_eq!(f6("-1").div(f6("3")).raw(), -333_333);
    }

    #[test]
    fn test_mul_survives_i128_overflow_of_product() {
        let big = Fixed18::from_decimal_string("1000000000000.5").unwrap();
        let two = Fixed18::from_int(2);
        assert_eq!(big.mul(two), Fixed18::from_int(2_000_000_000_001));
        assert_eq!(big.mul(big), Fixed18::from_raw(i128::MAX));
        assert_eq!(big.mul(-big), Fixed18::from_raw(i128::MIN));
    }

    #[test]
    fn test_mul_div_exact_when_remainder_product_overflows() {
        let unit = 10i128.pow(30);
        let a = 2 * unit - 1;
        let b = unit + 11;
        // (2e30 - 1)(1e30 + 11) / 1e30 = 2e30 + 21 - 11e-30
        assert_eq!(mul_div(a, b, unit), 2 * unit + 20);
        assert_eq!(mul_div(-a, b, unit), -(2 * unit + 20));
        assert_eq!(mul_div(a, -b, -unit), 2 * unit + 20);
    }

    #[test]
    fn test_rescale_idempotent_through_wider_base() {
        for raw in [0i128, 1, -1, 1_234_567, -987_654_321, i64::MAX as i128] {
            let x = Fixed6::from_raw(raw);
            let widened: Fixed18 = x.rescale();
            assert_eq!(widened.raw(), raw * 1_000_000_000_000);
            assert_eq!(widened.rescale::<6>(), x);
        }
    }

    #[test]
    fn test_rescale_narrowing_truncates() {
        assert_eq!(rescale(1_999_999_999_999_999_999, 18, 6), 1_999_999);
        assert_eq!(rescale(-1_999_999_999_999_999_999, 18, 6), -1_999_999);
    }

    #[test]
    fn test_rust_decimal_interop() {
        let d = RustDecimal::from_str("2345.123456789").unwrap();
        assert_eq!(Fixed6::from_decimal(d), f6("2345.123456"));
        assert_eq!(
            f6("2345.1234").to_decimal(),
            Some(RustDecimal::from_str("2345.123400").unwrap())
        );
    }

    #[test]
    fn test_serde_accepts_string_and_number() {
        let a: Fixed6 = serde_json::from_str("\"1500000\"").unwrap();
        let b: Fixed6 = serde_json::from_str("1500000").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"1500000\"");
    }

    #[test]
    fn test_min_max_compare() {
        let a = f6("1");
        let b = f6("2");
        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!((-b).abs(), b);
    }
}
