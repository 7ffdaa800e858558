//! Cross-currency totals for the expense ledger.

use serde::Serialize;

use crate::entity::{Currency, Expense};
use crate::error::{Result, TripbookError};

pub const DEFAULT_RATE: f64 = 0.22;

/// JPY -> TWD multiplier. Finite and non-negative; lives for one session only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExchangeRate(f64);

impl Default for ExchangeRate {
    fn default() -> Self {
        Self(DEFAULT_RATE)
    }
}

impl ExchangeRate {
    pub fn new(rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(TripbookError::InvalidRate(format!(
                "expected a finite number >= 0, got {}",
                rate
            )));
        }
        Ok(Self(rate))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Divisor for TWD -> JPY. A zero rate divides by 1 instead.
    fn divisor(&self) -> f64 {
        if self.0 == 0.0 {
            1.0
        } else {
            self.0
        }
    }
}

impl std::fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ExchangeRate {
    type Err = TripbookError;

    fn from_str(s: &str) -> Result<Self> {
        let rate: f64 = s
            .trim()
            .parse()
            .map_err(|_| TripbookError::InvalidRate(format!("'{}' is not a number", s)))?;
        Self::new(rate)
    }
}

/// Both-currency totals, rounded to whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub jpy: i64,
    pub twd: i64,
}

/// Sum `expenses` in both currencies. Each amount is converted at full
/// precision; only the two sums are rounded.
pub fn compute_total<'a, I>(expenses: I, rate: ExchangeRate) -> Totals
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut total_jpy = 0.0_f64;
    let mut total_twd = 0.0_f64;

    for expense in expenses {
        match expense.currency {
            Currency::Jpy => {
                total_jpy += expense.amount;
                total_twd += expense.amount * rate.value();
            }
            Currency::Twd => {
                total_twd += expense.amount;
                total_jpy += expense.amount / rate.divisor();
            }
        }
    }

    Totals {
        jpy: total_jpy.round() as i64,
        twd: total_twd.round() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(amount: f64, currency: Currency) -> Expense {
        Expense {
            id: 0,
            item: "item".to_string(),
            amount,
            currency,
        }
    }

    #[test]
    fn test_jpy_converts_to_twd() {
        let totals = compute_total(&[expense(1000.0, Currency::Jpy)], ExchangeRate::default());
        assert_eq!(totals, Totals { jpy: 1000, twd: 220 });
    }

    #[test]
    fn test_twd_converts_to_jpy() {
        let totals = compute_total(&[expense(220.0, Currency::Twd)], ExchangeRate::default());
        assert_eq!(totals, Totals { jpy: 1000, twd: 220 });
    }

    #[test]
    fn test_mixed_currencies() {
        let expenses = [expense(1200.0, Currency::Jpy), expense(50.0, Currency::Twd)];
        let totals = compute_total(&expenses, ExchangeRate::default());
        assert_eq!(totals, Totals { jpy: 1427, twd: 314 });
    }

    #[test]
    fn test_rounding_happens_on_sums_only() {
        // 3 x 0.4 TWD = 1.2 -> 1, whereas rounding each item would give 0
        let expenses = [
            expense(0.4, Currency::Twd),
            expense(0.4, Currency::Twd),
            expense(0.4, Currency::Twd),
        ];
        let totals = compute_total(&expenses, ExchangeRate::new(1.0).unwrap());
        assert_eq!(totals, Totals { jpy: 1, twd: 1 });
    }

    #[test]
    fn test_zero_rate_guards_division() {
        let rate = ExchangeRate::new(0.0).unwrap();
        let totals = compute_total(
            &[expense(50.0, Currency::Twd), expense(1000.0, Currency::Jpy)],
            rate,
        );
        assert_eq!(totals, Totals { jpy: 1050, twd: 50 });
    }

    #[test]
    fn test_empty_is_zero() {
        let none: [Expense; 0] = [];
        let totals = compute_total(&none, ExchangeRate::default());
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_rate_validation() {
        assert!(ExchangeRate::new(-0.1).is_err());
        assert!(ExchangeRate::new(f64::NAN).is_err());
        assert!(ExchangeRate::new(f64::INFINITY).is_err());
        assert_eq!("0.25".parse::<ExchangeRate>().unwrap().value(), 0.25);
        assert!(matches!(
            "abc".parse::<ExchangeRate>(),
            Err(TripbookError::InvalidRate(_))
        ));
    }
}
