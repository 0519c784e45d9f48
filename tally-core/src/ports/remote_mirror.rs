//! Remote mirror port - per-identity copy of the ledger

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Account, Identity, Transaction};

/// Remote backend holding an `accounts` and a `transactions` table,
/// every row scoped by its owner's identity
///
/// Adapters translate between the canonical domain types and whatever row
/// naming the backend uses. All failures are `Error::RemoteSync`.
pub trait RemoteMirror: Send + Sync {
    /// Backend name for logs (e.g., "postgrest", "memory")
    fn name(&self) -> &str;

    /// Fetch every account owned by `owner`
    fn fetch_accounts(&self, owner: &Identity) -> Result<Vec<Account>>;

    /// Fetch every transaction owned by `owner`
    fn fetch_transactions(&self, owner: &Identity) -> Result<Vec<Transaction>>;

    /// Insert or update accounts, keyed by id
    fn upsert_accounts(&self, owner: &Identity, accounts: &[Account]) -> Result<()>;

    /// Insert or update transactions, keyed by id
    fn upsert_transactions(&self, owner: &Identity, transactions: &[Transaction]) -> Result<()>;

    /// Delete one account row
    fn delete_account(&self, owner: &Identity, id: Uuid) -> Result<()>;

    /// Delete one transaction row
    fn delete_transaction(&self, owner: &Identity, id: Uuid) -> Result<()>;
}
