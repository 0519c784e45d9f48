//! Export snapshot model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Account, Transaction};

/// Version tag written into every export file
pub const EXPORT_VERSION: &str = "1.0";

/// Immutable snapshot of the whole ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl ExportData {
    pub fn new(accounts: Vec<Account>, transactions: Vec<Transaction>) -> Self {
        Self {
            accounts,
            transactions,
            export_date: Utc::now(),
            version: EXPORT_VERSION.to_string(),
        }
    }
}

/// Default file name for an export taken on `date`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("tally-backup-{}.json", date.format("%Y-%m-%d"))
}
