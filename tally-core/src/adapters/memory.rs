//! In-memory remote mirror
//!
//! Keeps per-owner tables in process memory. Used by tests and for running
//! the mirrored storage path without a backend. Failure injection makes
//! every call return `Error::RemoteSync` until switched off.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, Identity, Transaction};
use crate::ports::RemoteMirror;

#[derive(Debug, Default, Clone)]
struct OwnerTables {
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
}

#[derive(Debug, Default)]
pub struct InMemoryMirror {
    tables: Mutex<HashMap<String, OwnerTables>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of calls received, including failed ones
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Replace an owner's rows directly
    pub fn seed(&self, owner_id: &str, accounts: Vec<Account>, transactions: Vec<Transaction>) {
        let mut tables = self.lock();
        tables.insert(
            owner_id.to_string(),
            OwnerTables {
                accounts,
                transactions,
            },
        );
    }

    pub fn accounts_for(&self, owner_id: &str) -> Vec<Account> {
        self.lock()
            .get(owner_id)
            .map(|t| t.accounts.clone())
            .unwrap_or_default()
    }

    pub fn transactions_for(&self, owner_id: &str) -> Vec<Transaction> {
        self.lock()
            .get(owner_id)
            .map(|t| t.transactions.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, OwnerTables>> {
        // A poisoned lock only means a test panicked mid-call; the data is
        // still usable
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self, table: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::remote(format!("{}: mirror unavailable", table)));
        }
        Ok(())
    }
}

impl RemoteMirror for InMemoryMirror {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_accounts(&self, owner: &Identity) -> Result<Vec<Account>> {
        self.begin("accounts")?;
        Ok(self.accounts_for(&owner.user_id))
    }

    fn fetch_transactions(&self, owner: &Identity) -> Result<Vec<Transaction>> {
        self.begin("transactions")?;
        Ok(self.transactions_for(&owner.user_id))
    }

    fn upsert_accounts(&self, owner: &Identity, accounts: &[Account]) -> Result<()> {
        self.begin("accounts")?;
        let mut tables = self.lock();
        let rows = &mut tables.entry(owner.user_id.clone()).or_default().accounts;
        for account in accounts {
            let mut row = account.clone();
            row.owner_id = Some(owner.user_id.clone());
            match rows.iter_mut().find(|a| a.id == row.id) {
                Some(existing) => *existing = row,
                None => rows.push(row),
            }
        }
        Ok(())
    }

    fn upsert_transactions(&self, owner: &Identity, transactions: &[Transaction]) -> Result<()> {
        self.begin("transactions")?;
        let mut tables = self.lock();
        let rows = &mut tables.entry(owner.user_id.clone()).or_default().transactions;
        for tx in transactions {
            match rows.iter_mut().find(|t| t.id == tx.id) {
                Some(existing) => *existing = tx.clone(),
                None => rows.push(tx.clone()),
            }
        }
        Ok(())
    }

    fn delete_account(&self, owner: &Identity, id: Uuid) -> Result<()> {
        self.begin("accounts")?;
        if let Some(t) = self.lock().get_mut(&owner.user_id) {
            t.accounts.retain(|a| a.id != id);
        }
        Ok(())
    }

    fn delete_transaction(&self, owner: &Identity, id: Uuid) -> Result<()> {
        self.begin("transactions")?;
        if let Some(t) = self.lock().get_mut(&owner.user_id) {
            t.transactions.retain(|tx| tx.id != id);
        }
        Ok(())
    }
}
