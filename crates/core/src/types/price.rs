//! Money in Brazilian reais using decimal arithmetic.

use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat shipping cost added to every non-empty cart (R$ 15,00).
pub const DEFAULT_SHIPPING: Money = Money(Decimal::from_parts(1500, 0, 0, false, 2));

/// An amount of money in BRL.
///
/// Deserializes from a JSON number or a numeric string, so `89.9` and
/// `"89.90"` are the same price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero reais.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create from an integer number of centavos.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display, e.g. `R$ 1.234,56`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.0.round_dp(2);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let plain = format!("{:.2}", rounded.abs());
        let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let len = int_part.len();
        let mut grouped = String::with_capacity(len + len / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!("{sign}R$ {grouped},{frac_part}")
    }

    /// Format as a plain form value, e.g. `1234.56`.
    #[must_use]
    pub fn to_form_value(&self) -> String {
        format!("{:.2}", self.0.round_dp(2))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

impl std::str::FromStr for Money {
    type Err = rust_decimal::Error;

    /// Parses `89.90` as well as the Brazilian `89,90`, `1.234,56` and
    /// `1.234`.
    ///
    /// With a comma present, it is the decimal separator and dots may only
    /// group thousands. Without one, a dot followed by exactly three digits
    /// groups thousands, any other dot is the decimal separator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s.trim().trim_start_matches("R$").trim();
        let normalized = match amount.split_once(',') {
            Some((integer, fraction)) => {
                if integer.contains('.') && !is_thousands_grouped(integer) {
                    return Err(rust_decimal::Error::ErrorString(format!(
                        "misplaced thousands separator in {amount}"
                    )));
                }
                format!("{}.{fraction}", integer.replace('.', ""))
            }
            None if is_thousands_grouped(amount) => amount.replace('.', ""),
            None => amount.to_string(),
        };
        normalized.parse::<Decimal>().map(Self)
    }
}

/// `1.234` or `-12.345.678`: dot-separated groups of three digits after a
/// leading group of one to three.
fn is_thousands_grouped(integer: &str) -> bool {
    fn digits(group: &str) -> bool {
        !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit())
    }

    let unsigned = integer.strip_prefix('-').unwrap_or(integer);
    let mut groups = unsigned.split('.');
    let lead_ok = groups
        .next()
        .is_some_and(|lead| digits(lead) && lead.len() <= 3 && !lead.starts_with('0'));
    let rest: Vec<&str> = groups.collect();
    lead_ok && !rest.is_empty() && rest.iter().all(|g| g.len() == 3 && digits(g))
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_brl() {
        assert_eq!(Money::from_cents(14500).display(), "R$ 145,00");
        assert_eq!(Money::from_cents(123_456).display(), "R$ 1.234,56");
        assert_eq!(Money::from_cents(123_456_789).display(), "R$ 1.234.567,89");
        assert_eq!(Money::from_cents(99).display(), "R$ 0,99");
        assert_eq!(Money::from_cents(-1050).display(), "-R$ 10,50");
    }

    #[test]
    fn test_default_shipping() {
        assert_eq!(DEFAULT_SHIPPING, Money::from_cents(1500));
        assert_eq!(DEFAULT_SHIPPING.display(), "R$ 15,00");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let a: Money = serde_json::from_str("89.9").unwrap();
        let b: Money = serde_json::from_str("\"89.90\"").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_brazilian_input() {
        assert_eq!("89,90".parse::<Money>().unwrap(), Money::from_cents(8990));
        assert_eq!("R$ 12.5".parse::<Money>().unwrap(), Money::from_cents(1250));
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn test_parse_thousands_separators() {
        assert_eq!("1.234,56".parse::<Money>().unwrap(), Money::from_cents(123_456));
        assert_eq!("R$ 1.234,56".parse::<Money>().unwrap(), Money::from_cents(123_456));
        assert_eq!("1.234".parse::<Money>().unwrap(), Money::from_cents(123_400));
        assert_eq!("1.234.567,8".parse::<Money>().unwrap(), Money::from_cents(123_456_780));
        assert_eq!("249.90".parse::<Money>().unwrap(), Money::from_cents(24990));
        assert_eq!("249,90".parse::<Money>().unwrap(), Money::from_cents(24990));
        assert_eq!("0.125".parse::<Money>().unwrap().amount(), Decimal::new(125, 3));
    }

    #[test]
    fn test_parse_rejects_misplaced_separators() {
        assert!("1.23,45".parse::<Money>().is_err());
        assert!("1.234.56".parse::<Money>().is_err());
        assert!("1,234,56".parse::<Money>().is_err());
    }

    #[test]
    fn test_arithmetic() {
        let total: Money = [Money::from_cents(5000) * 2, Money::from_cents(3000)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(13000));
    }
}
