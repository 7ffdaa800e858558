// src/entity/expense.rs
use serde::{Deserialize, Serialize};

use super::{Record, RecordId};
use crate::error::{Result, TripbookError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Jpy,
    Twd,
}

impl Currency {
    /// Display symbol. Presentation only.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Jpy => "¥",
            Currency::Twd => "NT$",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::Jpy => write!(f, "JPY"),
            Currency::Twd => write!(f, "TWD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpy" | "yen" => Ok(Currency::Jpy),
            "twd" | "ntd" => Ok(Currency::Twd),
            _ => Err(format!("Invalid currency: {} (expected JPY or TWD)", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: RecordId,
    pub item: String,
    pub amount: f64,
    pub currency: Currency,
}

impl Record for Expense {
    const KIND: &'static str = "expense";

    fn id(&self) -> RecordId {
        self.id
    }

    fn is_valid(&self) -> bool {
        !self.item.trim().is_empty() && self.amount.is_finite() && self.amount >= 0.0
    }
}

/// Validated user input for a new expense, before an id is minted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    item: String,
    amount: f64,
    currency: Currency,
}

impl ExpenseDraft {
    /// Validate raw form input. Rejects rather than coercing: an empty item or
    /// an amount that is not a finite, non-negative number is an error.
    pub fn parse(item: &str, amount_text: &str, currency: Currency) -> Result<Self> {
        let item = item.trim();
        if item.is_empty() {
            return Err(TripbookError::InvalidExpenseInput(
                "item must not be empty".to_string(),
            ));
        }

        let amount_text = amount_text.trim();
        if amount_text.is_empty() {
            return Err(TripbookError::InvalidExpenseInput(
                "amount must not be empty".to_string(),
            ));
        }

        let amount: f64 = amount_text.parse().map_err(|_| {
            TripbookError::InvalidExpenseInput(format!("'{}' is not a number", amount_text))
        })?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(TripbookError::InvalidExpenseInput(format!(
                "amount must be a finite number >= 0, got '{}'",
                amount_text
            )));
        }

        Ok(Self {
            item: item.to_string(),
            amount,
            currency,
        })
    }

    pub fn into_expense(self, id: RecordId) -> Expense {
        Expense {
            id,
            item: self.item,
            amount: self.amount,
            currency: self.currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_round_trips_uppercase() {
        assert_eq!(serde_json::to_string(&Currency::Jpy).unwrap(), "\"JPY\"");
        let twd: Currency = serde_json::from_str("\"TWD\"").unwrap();
        assert_eq!(twd, Currency::Twd);
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("jpy".parse::<Currency>().unwrap(), Currency::Jpy);
        assert_eq!("TWD".parse::<Currency>().unwrap(), Currency::Twd);
        assert!("usd".parse::<Currency>().is_err());
    }

    #[test]
    fn test_draft_accepts_decimal_amount() {
        let expense = ExpenseDraft::parse(" ramen ", "1200.5", Currency::Jpy)
            .unwrap()
            .into_expense(42);
        assert_eq!(expense.id, 42);
        assert_eq!(expense.item, "ramen");
        assert_eq!(expense.amount, 1200.5);
        assert_eq!(expense.currency, Currency::Jpy);
    }

    #[test]
    fn test_draft_rejects_empty_item() {
        let err = ExpenseDraft::parse("   ", "100", Currency::Jpy).unwrap_err();
        assert!(matches!(err, TripbookError::InvalidExpenseInput(_)));
    }

    #[test]
    fn test_draft_rejects_unparseable_amount() {
        for bad in ["", "abc", "12abc", "NaN", "inf", "-5"] {
            let result = ExpenseDraft::parse("snack", bad, Currency::Twd);
            assert!(
                matches!(result, Err(TripbookError::InvalidExpenseInput(_))),
                "amount {:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_zero_amount_is_allowed() {
        assert!(ExpenseDraft::parse("free sample", "0", Currency::Jpy).is_ok());
    }

    #[test]
    fn test_is_valid_catches_bad_persisted_records() {
        let mut expense = ExpenseDraft::parse("tea", "100", Currency::Jpy)
            .unwrap()
            .into_expense(1);
        assert!(expense.is_valid());
        expense.amount = -1.0;
        assert!(!expense.is_valid());
        expense.amount = 1.0;
        expense.item = String::new();
        assert!(!expense.is_valid());
    }
}
