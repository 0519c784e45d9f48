//! Account domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, balance-holding account
///
/// `balance` is the running total: the initial balance plus every signed
/// transaction amount applied so far. It is only ever changed by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    /// Remote identity this account is mirrored under (absent in local mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl Account {
    /// Create a new account with a fresh id and creation timestamp
    pub fn new(name: impl Into<String>, initial_balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            balance: initial_balance,
            created_at: Utc::now(),
            owner_id: None,
        }
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("account name cannot be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_validation() {
        let mut account = Account::new("Checking", Decimal::ZERO);
        assert!(account.validate().is_ok());

        account.name = "   ".to_string();
        assert!(account.validate().is_err());
    }

    #[test]
    fn test_serialized_field_names() {
        let account = Account::new("Savings", Decimal::new(10050, 2));
        let json = serde_json::to_value(&account).unwrap();

        assert!(json.get("createdAt").is_some());
        assert!(json.get("ownerId").is_none());
        assert_eq!(json["balance"], "100.50");
    }
}
