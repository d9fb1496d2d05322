use std::{fmt, ops::Neg, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// An amount of money in integer cents.
///
/// Wallet balances, totals and transaction amounts all use this type and are
/// stored as bare JSON integers, so repeated reconciliation is exact.
///
/// ```rust
/// use engine::Money;
///
/// let lunch = Money::new(12_50);
/// assert_eq!(lunch.to_string(), "12.50");
/// assert_eq!((-lunch).to_string(), "-12.50");
/// assert_eq!("12,5".parse::<Money>().unwrap(), lunch);
/// assert!("12.505".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `None` when the sum does not fit.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

/// Decimal input such as `12`, `-3.5` or `7,25`; at most two fractional digits.
impl FromStr for Money {
    type Err = LedgerError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::Validation(format!("invalid amount: {input:?}"));

        let text = input.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (whole, fraction) = digits
            .split_once(['.', ','])
            .unwrap_or((digits, ""));

        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || fraction.len() > 2 || !is_digits(whole) || !is_digits(fraction) {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };
        let cents = whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Money::new(5).to_string(), "0.05");
        assert_eq!(Money::new(-1999).to_string(), "-19.99");
        assert_eq!(Money::ZERO.to_string(), "0.00");
        assert_eq!(Money::new(i64::MIN).to_string(), "-92233720368547758.08");
    }

    #[test]
    fn parses_decimal_input() {
        assert_eq!("10".parse::<Money>().unwrap(), Money::new(1000));
        assert_eq!(" 2,3 ".parse::<Money>().unwrap(), Money::new(230));
        assert_eq!("+0.07".parse::<Money>().unwrap(), Money::new(7));
        assert_eq!("-4.50".parse::<Money>().unwrap(), Money::new(-450));
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["", "abc", ".5", "1.234", "1.2.3", "1 000", "--1", "99999999999999999999"] {
            assert!(input.parse::<Money>().is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn checked_add_detects_overflow() {
        assert_eq!(Money::new(40).checked_add(Money::new(-50)), Some(Money::new(-10)));
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
    }

    #[test]
    fn stored_as_plain_integer() {
        assert_eq!(serde_json::to_string(&Money::new(4200)).unwrap(), "4200");
        let back: Money = serde_json::from_str("-300").unwrap();
        assert_eq!(back, Money::new(-300));
    }
}
