//! Import normalization
//!
//! Turns an arbitrary JSON payload into a ledger state or a rejection
//! reason. Accepted payloads carry top-level `accounts` and `transactions`
//! arrays; records use the camelCase export names, with the snake_case
//! column names accepted as aliases. Amounts may be numbers or strings.
//! Ids that are not UUIDs are mapped deterministically onto UUIDs so that
//! references between records survive.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::domain::amount::coerce_json_decimal;
use crate::domain::result::{Error, Result};
use crate::domain::{Account, Transaction, TransactionType};
use crate::ports::LedgerState;

/// Result of an import attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ImportOutcome {
    Imported { accounts: usize, transactions: usize },
    Rejected { reason: String },
}

impl ImportOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, ImportOutcome::Imported { .. })
    }
}

type Record = Map<String, JsonValue>;

/// Normalize an import payload into a ledger state
///
/// Fails with `Error::Import` when the payload lacks either collection or a
/// record cannot be read.
pub fn normalize_payload(payload: &JsonValue) -> Result<LedgerState> {
    let root = payload
        .as_object()
        .ok_or_else(|| Error::import("payload is not a JSON object"))?;

    let raw_accounts = collection(root, "accounts")?;
    let raw_transactions = collection(root, "transactions")?;

    let accounts = raw_accounts
        .iter()
        .enumerate()
        .map(|(i, v)| normalize_account(record(v, "account", i)?))
        .collect::<Result<Vec<_>>>()?;

    let transactions = raw_transactions
        .iter()
        .enumerate()
        .map(|(i, v)| normalize_transaction(record(v, "transaction", i)?, i, &accounts))
        .collect::<Result<Vec<_>>>()?;

    Ok(LedgerState {
        accounts,
        transactions,
    })
}

fn collection<'a>(root: &'a Record, key: &str) -> Result<&'a Vec<JsonValue>> {
    match root.get(key) {
        Some(JsonValue::Array(items)) => Ok(items),
        Some(_) => Err(Error::import(format!("'{}' is not an array", key))),
        None => Err(Error::import(format!("missing '{}'", key))),
    }
}

fn record<'a>(value: &'a JsonValue, kind: &str, index: usize) -> Result<&'a Record> {
    value
        .as_object()
        .ok_or_else(|| Error::import(format!("{} #{} is not an object", kind, index + 1)))
}

/// First present, non-null field among `names`
fn field<'a>(rec: &'a Record, names: &[&str]) -> Option<&'a JsonValue> {
    names
        .iter()
        .filter_map(|name| rec.get(*name))
        .find(|v| !v.is_null())
}

fn text(rec: &Record, names: &[&str]) -> Option<String> {
    match field(rec, names)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse an id, mapping legacy non-UUID ids onto stable UUIDs
pub fn coerce_id(raw: &str) -> Option<Uuid> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        Uuid::parse_str(trimmed)
            .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, trimmed.as_bytes())),
    )
}

/// Parse a business date; full timestamps are cut to their date part
pub fn coerce_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn coerce_timestamp(value: &JsonValue) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        JsonValue::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn normalize_account(rec: &Record) -> Result<Account> {
    let id = text(rec, &["id"])
        .and_then(|raw| coerce_id(&raw))
        .ok_or_else(|| Error::import("account without an id"))?;

    let name = text(rec, &["name"])
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::import(format!("account {} has no name", id)))?;

    let created_at = field(rec, &["createdAt", "created_at"])
        .and_then(coerce_timestamp)
        .unwrap_or_else(Utc::now);

    Ok(Account {
        id,
        name,
        balance: coerce_json_decimal(field(rec, &["balance"])),
        created_at,
        owner_id: text(rec, &["ownerId", "owner_id", "userId", "user_id"]),
    })
}

fn normalize_transaction(rec: &Record, index: usize, accounts: &[Account]) -> Result<Transaction> {
    let label = format!("transaction #{}", index + 1);

    let kind = text(rec, &["type", "kind"])
        .ok_or_else(|| Error::import(format!("{} has no type", label)))?
        .parse::<TransactionType>()
        .map_err(|e| Error::import(format!("{}: {}", label, e)))?;

    let account_id = text(rec, &["accountId", "account_id"])
        .and_then(|raw| coerce_id(&raw))
        .ok_or_else(|| Error::import(format!("{} has no account", label)))?;

    let created_at = field(rec, &["createdAt", "created_at"]).and_then(coerce_timestamp);

    let date = match text(rec, &["date"]) {
        Some(raw) => coerce_date(&raw)
            .ok_or_else(|| Error::import(format!("{} has an unreadable date '{}'", label, raw)))?,
        None => created_at
            .map(|ts| ts.date_naive())
            .ok_or_else(|| Error::import(format!("{} has no date", label)))?,
    };

    let account_name = text(rec, &["accountName", "account_name"]).unwrap_or_else(|| {
        accounts
            .iter()
            .find(|a| a.id == account_id)
            .map(|a| a.name.clone())
            .unwrap_or_default()
    });

    let id = text(rec, &["id"])
        .and_then(|raw| coerce_id(&raw))
        .unwrap_or_else(Uuid::new_v4);

    Ok(Transaction {
        id,
        kind,
        amount: coerce_json_decimal(field(rec, &["amount"])).abs(),
        description: text(rec, &["description"]).unwrap_or_default(),
        account_id,
        account_name,
        category: Transaction::normalize_category(kind, text(rec, &["category"])),
        date,
        created_at: created_at.unwrap_or_else(Utc::now),
        balance_after: coerce_json_decimal(field(rec, &["balanceAfter", "balance_after"])),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn test_rejects_missing_collections() {
        assert!(normalize_payload(&json!({"accounts": []})).is_err());
        assert!(normalize_payload(&json!({"transactions": []})).is_err());
        assert!(normalize_payload(&json!([1, 2])).is_err());
        assert!(normalize_payload(&json!({"accounts": {}, "transactions": []})).is_err());
    }

    #[test]
    fn test_empty_collections_are_valid() {
        let state = normalize_payload(&json!({"accounts": [], "transactions": []})).unwrap();
        assert_eq!(state, LedgerState::default());
    }

    #[test]
    fn test_numeric_strings_and_legacy_ids() {
        let state = normalize_payload(&json!({
            "accounts": [
                {"id": "1700000000000", "name": "Cash", "balance": "12.50", "createdAt": "2024-01-01T00:00:00Z"}
            ],
            "transactions": [
                {"id": 1700000000001i64, "type": "expense", "amount": 2.5, "description": "Coffee",
                 "accountId": "1700000000000", "date": "2024-01-02", "category": "food",
                 "createdAt": "2024-01-02T08:00:00Z", "balanceAfter": 10}
            ]
        }))
        .unwrap();

        let account = &state.accounts[0];
        assert_eq!(account.balance, Decimal::new(1250, 2));
        assert_eq!(account.id, coerce_id("1700000000000").unwrap());

        let tx = &state.transactions[0];
        assert_eq!(tx.account_id, account.id);
        assert_eq!(tx.account_name, "Cash");
        assert_eq!(tx.amount, Decimal::new(25, 1));
        assert_eq!(tx.balance_after, Decimal::new(10, 0));
        assert_eq!(tx.category.as_deref(), Some("food"));
    }

    #[test]
    fn test_snake_case_aliases() {
        let account_id = Uuid::new_v4();
        let state = normalize_payload(&json!({
            "accounts": [
                {"id": account_id.to_string(), "name": "Bank", "balance": 0,
                 "created_at": "2024-01-01T00:00:00Z", "user_id": "u1"}
            ],
            "transactions": [
                {"type": "income", "amount": "100", "account_id": account_id.to_string(),
                 "account_name": "Bank", "created_at": "2024-02-03T12:00:00Z",
                 "balance_after": "100", "category": "salary"}
            ]
        }))
        .unwrap();

        assert_eq!(state.accounts[0].owner_id.as_deref(), Some("u1"));
        let tx = &state.transactions[0];
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
        assert_eq!(tx.balance_after, Decimal::new(100, 0));
        assert_eq!(tx.category, None);
    }

    #[test]
    fn test_rejects_bad_transactions() {
        let bad_type = json!({"accounts": [], "transactions": [
            {"type": "transfer", "amount": 1, "accountId": "a", "date": "2024-01-01"}
        ]});
        assert!(matches!(normalize_payload(&bad_type), Err(Error::Import(_))));

        let bad_date = json!({"accounts": [], "transactions": [
            {"type": "income", "amount": 1, "accountId": "a", "date": "yesterday"}
        ]});
        assert!(normalize_payload(&bad_date).is_err());

        let no_account = json!({"accounts": [], "transactions": [
            {"type": "income", "amount": 1, "date": "2024-01-01"}
        ]});
        assert!(normalize_payload(&no_account).is_err());
    }

    #[test]
    fn test_unknown_account_reference_is_kept() {
        let state = normalize_payload(&json!({"accounts": [], "transactions": [
            {"type": "expense", "amount": 4, "accountId": "1700000000000",
             "accountName": "Closed card", "date": "2024-01-01"}
        ]}))
        .unwrap();

        let tx = &state.transactions[0];
        assert_eq!(tx.account_id, coerce_id("1700000000000").unwrap());
        assert_eq!(tx.account_name, "Closed card");
        assert!(state.accounts.is_empty());
    }

    #[test]
    fn test_date_accepts_timestamps() {
        assert_eq!(
            coerce_date("2024-03-15T10:20:30.000Z"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(coerce_date("15/03/2024"), None);
    }
}
