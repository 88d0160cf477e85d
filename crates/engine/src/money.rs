use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Money amount represented as **integer minor units** (cents).
///
/// Use this type for **all** monetary values in the engine (catalog prices,
/// line totals, order totals) to avoid floating-point drift.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().minor(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Unit price times quantity (returns `None` on overflow).
    #[must_use]
    pub fn checked_mul_quantity(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |msg: &str| EngineError::InvalidPrice(msg.to_string());

        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if rest.is_empty() {
            return Err(invalid("empty amount"));
        }

        let rest = rest.replace(',', ".");
        let (units_str, frac_str) = match rest.split_once('.') {
            Some((units, frac)) => (units, frac),
            None => (rest.as_str(), ""),
        };
        if units_str.is_empty()
            || !units_str.chars().all(|c| c.is_ascii_digit())
            || !frac_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("invalid amount"));
        }

        let units: i64 = units_str.parse().map_err(|_| invalid("amount too large"))?;
        let frac: i64 = match frac_str.len() {
            0 => 0,
            1 => frac_str.parse::<i64>().map_err(|_| invalid("invalid amount"))? * 10,
            2 => frac_str.parse::<i64>().map_err(|_| invalid("invalid amount"))?,
            _ => return Err(invalid("too many decimals")),
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -total } else { total }))
    }
}

/// Tax rate expressed in **basis points** (`1800` = 18.00 %).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaxRate(i32);

impl TaxRate {
    pub const ZERO: TaxRate = TaxRate(0);
    /// 100 %.
    pub const MAX_BP: i32 = 10_000;

    pub fn from_basis_points(bp: i32) -> Result<Self, EngineError> {
        if !(0..=Self::MAX_BP).contains(&bp) {
            return Err(EngineError::InvalidInput(format!(
                "tax rate must be between 0 and {} basis points, got {bp}",
                Self::MAX_BP
            )));
        }
        Ok(Self(bp))
    }

    #[must_use]
    pub const fn basis_points(self) -> i32 {
        self.0
    }

    /// Tax owed on `amount`, rounded half-up to the nearest minor unit.
    #[must_use]
    pub fn tax_on(self, amount: Money) -> Money {
        let product = i128::from(amount.minor()) * i128::from(self.0);
        let denom = i128::from(Self::MAX_BP);
        let rounded = if product >= 0 {
            (product + denom / 2) / denom
        } else {
            (product - denom / 2) / denom
        };
        // |rate| <= 100 %, so the result never exceeds |amount|.
        Money(rounded as i64)
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(1).to_string(), "0.01");
        assert_eq!(Money::new(1050).to_string(), "10.50");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("-0.01".parse::<Money>().unwrap().minor(), -1);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().minor(), 230);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("12.345".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn tax_rounds_half_up() {
        let rate = TaxRate::from_basis_points(1800).unwrap();
        // 18 % of 0.25 = 0.045 -> 0.05
        assert_eq!(rate.tax_on(Money::new(25)), Money::new(5));
        // 18 % of 0.22 = 0.0396 -> 0.04
        assert_eq!(rate.tax_on(Money::new(22)), Money::new(4));
        assert_eq!(TaxRate::ZERO.tax_on(Money::new(999)), Money::ZERO);
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        assert_eq!(
            Money::new(250).checked_add(Money::new(50)),
            Some(Money::new(300))
        );
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
        assert_eq!(
            Money::new(199).checked_mul_quantity(3),
            Some(Money::new(597))
        );
        assert_eq!(Money::new(i64::MAX / 2).checked_mul_quantity(3), None);
    }

    #[test]
    fn tax_rate_bounds() {
        assert!(TaxRate::from_basis_points(-1).is_err());
        assert!(TaxRate::from_basis_points(10_001).is_err());
        assert_eq!(TaxRate::from_basis_points(725).unwrap().to_string(), "7.25%");
    }
}
