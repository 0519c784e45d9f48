//! PostgREST remote mirror
//!
//! Talks to a PostgREST endpoint (as exposed by Supabase) holding two tables,
//! `accounts` and `transactions`, each row carrying a `user_id` owner column.
//! Rows use snake_case column names; this module is the only place that
//! naming exists.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, Identity, Transaction, TransactionType};
use crate::ports::RemoteMirror;

const ACCOUNTS_TABLE: &str = "accounts";
const TRANSACTIONS_TABLE: &str = "transactions";

/// Row of the remote `accounts` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRow {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl AccountRow {
    pub fn from_account(account: &Account, owner: &Identity) -> Self {
        Self {
            id: account.id,
            user_id: owner.user_id.clone(),
            name: account.name.clone(),
            balance: account.balance,
            created_at: account.created_at,
        }
    }

    pub fn into_account(self) -> Account {
        Account {
            id: self.id,
            name: self.name,
            balance: self.balance,
            created_at: self.created_at,
            owner_id: Some(self.user_id),
        }
    }
}

/// Row of the remote `transactions` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    pub account_id: Uuid,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub balance_after: Option<Decimal>,
}

impl TransactionRow {
    pub fn from_transaction(tx: &Transaction, owner: &Identity) -> Self {
        Self {
            id: tx.id,
            user_id: owner.user_id.clone(),
            kind: tx.kind,
            amount: tx.amount,
            description: Some(tx.description.clone()),
            account_id: tx.account_id,
            account_name: Some(tx.account_name.clone()),
            category: tx.category.clone(),
            date: tx.date,
            created_at: tx.created_at,
            balance_after: Some(tx.balance_after),
        }
    }

    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: self.id,
            kind: self.kind,
            amount: self.amount,
            description: self.description.unwrap_or_default(),
            account_id: self.account_id,
            account_name: self.account_name.unwrap_or_default(),
            category: self.category,
            date: self.date,
            created_at: self.created_at,
            balance_after: self.balance_after.unwrap_or_default(),
        }
    }
}

/// HTTP client for a PostgREST backend
#[derive(Debug)]
pub struct PostgrestMirror {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl PostgrestMirror {
    /// Create a mirror for the project at `base_url` (e.g. `https://xyz.supabase.co`)
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut parsed = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid remote URL: {}", e)))?;

        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(Error::Config("Remote URL must use HTTP or HTTPS".to_string()));
        }
        if api_key.trim().is_empty() {
            return Err(Error::Config("Remote API key cannot be empty".to_string()));
        }

        // Url::join drops the last path segment unless the path ends in '/'
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        // Mirror calls carry no timeout
        let mut builder = Client::builder().timeout(None::<Duration>);
        // A local backend is never reached through an environment proxy
        if matches!(parsed.host_str(), Some("localhost" | "127.0.0.1" | "[::1]")) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| Error::remote(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: parsed,
            api_key: api_key.trim().to_string(),
        })
    }

    /// URL of `table` filtered to `owner`, plus any extra `column=eq.value` filters
    fn table_url(&self, table: &str, owner: &Identity, filters: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("rest/v1/{}", table))
            .map_err(|e| Error::remote(format!("Invalid table URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("user_id", &format!("eq.{}", owner.user_id));
            for (column, value) in filters {
                query.append_pair(column, &format!("eq.{}", value));
            }
        }

        Ok(url)
    }

    fn request(&self, method: Method, url: Url, owner: &Identity) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&owner.access_token)
    }

    fn send(&self, builder: RequestBuilder, table: &str) -> Result<Response> {
        let response = builder
            .send()
            .map_err(|e| Error::remote(format!("{}: {}", table, map_request_error(&e))))?;
        check_response_status(response, table)
    }

    fn fetch_rows<T: DeserializeOwned>(&self, table: &str, owner: &Identity) -> Result<Vec<T>> {
        let mut url = self.table_url(table, owner, &[])?;
        url.query_pairs_mut().append_pair("select", "*");

        let response = self.send(self.request(Method::GET, url, owner), table)?;
        response
            .json::<Vec<T>>()
            .map_err(|e| Error::remote(format!("Failed to parse {} rows: {}", table, e)))
    }

    fn upsert_rows<T: Serialize>(&self, table: &str, owner: &Identity, rows: &[T]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut url = self
            .base_url
            .join(&format!("rest/v1/{}", table))
            .map_err(|e| Error::remote(format!("Invalid table URL: {}", e)))?;
        url.query_pairs_mut().append_pair("on_conflict", "id");

        let builder = self
            .request(Method::POST, url, owner)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        self.send(builder, table)?;
        Ok(())
    }

    fn delete_row(&self, table: &str, owner: &Identity, id: Uuid) -> Result<()> {
        let url = self.table_url(table, owner, &[("id", id.to_string())])?;
        self.send(self.request(Method::DELETE, url, owner), table)?;
        Ok(())
    }
}

fn map_request_error(error: &reqwest::Error) -> String {
    if error.is_connect() {
        format!("could not connect to remote: {}", error)
    } else {
        error.to_string()
    }
}

fn check_response_status(response: Response, table: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    match status.as_u16() {
        401 | 403 => Err(Error::remote(format!(
            "{}: not authorized (HTTP {}), sign in again",
            table, status
        ))),
        code => Err(Error::remote(format!("{}: HTTP {} {}", table, code, body.trim()))),
    }
}

impl RemoteMirror for PostgrestMirror {
    fn name(&self) -> &str {
        "postgrest"
    }

    fn fetch_accounts(&self, owner: &Identity) -> Result<Vec<Account>> {
        let rows: Vec<AccountRow> = self.fetch_rows(ACCOUNTS_TABLE, owner)?;
        Ok(rows.into_iter().map(AccountRow::into_account).collect())
    }

    fn fetch_transactions(&self, owner: &Identity) -> Result<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = self.fetch_rows(TRANSACTIONS_TABLE, owner)?;
        Ok(rows.into_iter().map(TransactionRow::into_transaction).collect())
    }

    fn upsert_accounts(&self, owner: &Identity, accounts: &[Account]) -> Result<()> {
        let rows: Vec<AccountRow> = accounts
            .iter()
            .map(|a| AccountRow::from_account(a, owner))
            .collect();
        self.upsert_rows(ACCOUNTS_TABLE, owner, &rows)
    }

    fn upsert_transactions(&self, owner: &Identity, transactions: &[Transaction]) -> Result<()> {
        let rows: Vec<TransactionRow> = transactions
            .iter()
            .map(|t| TransactionRow::from_transaction(t, owner))
            .collect();
        self.upsert_rows(TRANSACTIONS_TABLE, owner, &rows)
    }

    fn delete_account(&self, owner: &Identity, id: Uuid) -> Result<()> {
        self.delete_row(ACCOUNTS_TABLE, owner, id)
    }

    fn delete_transaction(&self, owner: &Identity, id: Uuid) -> Result<()> {
        self.delete_row(TRANSACTIONS_TABLE, owner, id)
    }
}
