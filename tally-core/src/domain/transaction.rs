//! Transaction domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Signed balance effect of `amount` for this direction
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Income => amount,
            TransactionType::Expense => -amount,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

/// A single income or expense against one account
///
/// `account_name` and `balance_after` are snapshots taken when the
/// transaction was last written; the ledger refreshes them on every write
/// that touches the amount, type or owning account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Unsigned magnitude
    pub amount: Decimal,
    pub description: String,
    pub account_id: Uuid,
    pub account_name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Business date of the transaction
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub balance_after: Decimal,
}

impl Transaction {
    /// Signed effect of this transaction on its account
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    /// Normalize a category: trimmed, empty becomes None, income never has one
    pub fn normalize_category(kind: TransactionType, category: Option<String>) -> Option<String> {
        if kind == TransactionType::Income {
            return None;
        }
        category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }
}

/// Partial update of a transaction; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    #[serde(rename = "type", default)]
    pub kind: Option<TransactionType>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// `Some(None)` clears the category
    #[serde(default)]
    pub category: Option<Option<String>>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Query options for listing transactions
///
/// Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(rename = "type", default)]
    pub kind: Option<TransactionType>,
    #[serde(default)]
    pub date_start: Option<NaiveDate>,
    #[serde(default)]
    pub date_end: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.account_id.is_some_and(|id| id != tx.account_id) {
            return false;
        }
        if self.kind.is_some_and(|kind| kind != tx.kind) {
            return false;
        }
        // ISO dates order the same way as their text, so these bounds agree
        // with a plain string comparison of YYYY-MM-DD values
        if self.date_start.is_some_and(|start| tx.date < start) {
            return false;
        }
        if self.date_end.is_some_and(|end| tx.date > end) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: TransactionType, date: &str) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            kind,
            amount: Decimal::new(30, 0),
            description: "Groceries".to_string(),
            account_id: Uuid::new_v4(),
            account_name: "Checking".to_string(),
            category: None,
            date: date.parse().unwrap(),
            created_at: Utc::now(),
            balance_after: Decimal::new(70, 0),
        }
    }

    #[test]
    fn test_signed_amount() {
        let income = sample(TransactionType::Income, "2024-01-01");
        let expense = sample(TransactionType::Expense, "2024-01-01");
        assert_eq!(income.signed_amount(), Decimal::new(30, 0));
        assert_eq!(expense.signed_amount(), Decimal::new(-30, 0));
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("Income".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!(" expense".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_category_normalization() {
        assert_eq!(
            Transaction::normalize_category(TransactionType::Expense, Some(" food ".to_string())),
            Some("food".to_string())
        );
        assert_eq!(
            Transaction::normalize_category(TransactionType::Expense, Some("  ".to_string())),
            None
        );
        assert_eq!(
            Transaction::normalize_category(TransactionType::Income, Some("salary".to_string())),
            None
        );
    }

    #[test]
    fn test_filter_date_bounds_are_inclusive() {
        let tx = sample(TransactionType::Expense, "2024-03-15");
        let filter = TransactionFilter {
            date_start: Some("2024-03-15".parse().unwrap()),
            date_end: Some("2024-03-15".parse().unwrap()),
            ..Default::default()
        };
        assert!(filter.matches(&tx));

        let filter = TransactionFilter {
            date_start: Some("2024-03-16".parse().unwrap()),
            ..Default::default()
        };
        assert!(!filter.matches(&tx));
    }

    #[test]
    fn test_filter_by_type_and_account() {
        let tx = sample(TransactionType::Income, "2024-03-15");
        let by_type = TransactionFilter {
            kind: Some(TransactionType::Expense),
            ..Default::default()
        };
        assert!(!by_type.matches(&tx));

        let by_account = TransactionFilter {
            account_id: Some(tx.account_id),
            ..Default::default()
        };
        assert!(by_account.matches(&tx));
    }

    #[test]
    fn test_serialized_field_names() {
        let tx = sample(TransactionType::Expense, "2024-03-15");
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["date"], "2024-03-15");
        assert!(json.get("accountId").is_some());
        assert!(json.get("balanceAfter").is_some());
    }
}
