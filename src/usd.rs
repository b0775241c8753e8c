use serde_with::DeserializeFromStr;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{AddAssign, Mul},
    str::FromStr,
};

use crate::error::Error;

/// Represents an amount of money in USD currency.
///
/// The amount is stored internally as an integer number of cents, so sums and
/// products are exact. The [`Display`] implementation formats it as dollars to
/// 2 decimal places.
#[derive(Clone, Copy, Default, DeserializeFromStr, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Usd(i64);

impl Usd {
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns the amount in dollars, for writing into spreadsheet cells.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Converts a dollar amount read back from a spreadsheet cell, rounding to
    /// the nearest cent.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_dollars(dollars: f64) -> Self {
        Self((dollars * 100.0).round() as i64)
    }

    /// Divides the amount evenly by `count`, rounding half away from zero.
    ///
    /// Returns `None` when `count` is zero.
    #[must_use]
    pub fn average(self, count: u64) -> Option<Self> {
        let count = i64::try_from(count).ok().filter(|&n| n > 0)?;
        let (quotient, remainder) = (self.0 / count, self.0 % count);
        if remainder.unsigned_abs() * 2 < count.unsigned_abs() {
            Some(Self(quotient))
        } else {
            Some(Self(quotient + self.0.signum()))
        }
    }

    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    #[must_use]
    pub fn checked_mul(self, rhs: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(rhs)).map(Self)
    }
}

impl Debug for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", cents / 100, cents % 100)
    }
}

impl FromStr for Usd {
    type Err = Error;

    /// Parses amounts such as `12`, `12.5`, `1,234.56` or `$9.99`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bad = || Error::SchemaMismatch(format!("bad money amount: {s:?}"));
        let cleaned = s.trim().trim_start_matches('$').replace(',', "");
        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || frac.len() > 2 || !all_digits(whole) || !all_digits(frac) {
            return Err(bad());
        }
        let whole: i64 = whole.parse().map_err(|_| bad())?;
        let frac: i64 = format!("{frac:0<2}").parse().map_err(|_| bad())?;
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(bad)?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl AddAssign for Usd {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<u32> for Usd {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * i64::from(rhs))
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, x| {
            acc += x;
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_fn_accepts_common_money_formats() {
        assert_eq!(Usd::from_str("3,409.15").unwrap(), Usd::from_cents(340_915));
        assert_eq!(Usd::from_str("$9.99").unwrap(), Usd::from_cents(999));
        assert_eq!(Usd::from_str("12.5").unwrap(), Usd::from_cents(1250));
        assert_eq!(Usd::from_str("7").unwrap(), Usd::from_cents(700));
        assert_eq!(Usd::from_str("-1.05").unwrap(), Usd::from_cents(-105));
    }

    #[test]
    fn from_str_fn_rejects_garbage() {
        assert!(Usd::from_str("").is_err());
        assert!(Usd::from_str("12.345").is_err());
        assert!(Usd::from_str("twelve").is_err());
        assert!(Usd::from_str(".50").is_err());
        assert!(Usd::from_str("--5").is_err());
        assert!(Usd::from_str("+5").is_err());
        assert!(Usd::from_str("$-+5").is_err());
    }

    #[test]
    fn from_str_fn_rejects_amounts_too_large_for_cents() {
        assert!(matches!(
            Usd::from_str("922337203685477580.00"),
            Err(Error::SchemaMismatch(_))
        ));
        assert!(Usd::from_str("99999999999999999999").is_err());
        assert_eq!(
            Usd::from_str("92233720368547758.07").unwrap(),
            Usd::from_cents(i64::MAX)
        );
    }

    #[test]
    fn display_formats_dollars_and_cents() {
        assert_eq!(Usd::from_cents(123_456).to_string(), "$1234.56");
        assert_eq!(Usd::from_cents(5).to_string(), "$0.05");
        assert_eq!(Usd::from_cents(-250).to_string(), "-$2.50");
    }

    #[test]
    fn average_fn_rounds_to_nearest_cent() {
        assert_eq!(Usd::from_cents(1000).average(3), Some(Usd::from_cents(333)));
        assert_eq!(Usd::from_cents(1001).average(2), Some(Usd::from_cents(501)));
        assert_eq!(Usd::from_cents(1000).average(0), None);
        assert_eq!(Usd::from_cents(-1001).average(2), Some(Usd::from_cents(-501)));
        assert_eq!(
            Usd::from_cents(i64::MAX).average(1),
            Some(Usd::from_cents(i64::MAX))
        );
    }

    #[test]
    fn dollars_round_trip_through_f64() {
        for cents in [1, 99, 12_345, 1_999_999] {
            let usd = Usd::from_cents(cents);
            assert_eq!(Usd::from_dollars(usd.dollars()), usd);
        }
    }

    #[test]
    fn mul_and_sum_are_exact() {
        let price = Usd::from_cents(1999);
        assert_eq!(price * 3, Usd::from_cents(5997));
        let total: Usd = [price, price * 2].into_iter().sum();
        assert_eq!(total, Usd::from_cents(5997));
        assert_eq!(Usd::from_cents(i64::MAX).checked_mul(2), None);
        assert_eq!(Usd::from_cents(i64::MAX).checked_add(Usd::from_cents(1)), None);
    }
}
