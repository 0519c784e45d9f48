//! Row-level description of a ledger mutation
//!
//! The local store always rewrites both collections in full; the change set
//! tells a mirror which rows to upsert or delete.

use uuid::Uuid;

use super::{Account, Transaction};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub upsert_accounts: Vec<Account>,
    pub upsert_transactions: Vec<Transaction>,
    pub delete_accounts: Vec<Uuid>,
    pub delete_transactions: Vec<Uuid>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_account(mut self, account: Account) -> Self {
        self.upsert_accounts.retain(|a| a.id != account.id);
        self.upsert_accounts.push(account);
        self
    }

    pub fn upsert_transaction(mut self, tx: Transaction) -> Self {
        self.upsert_transactions.retain(|t| t.id != tx.id);
        self.upsert_transactions.push(tx);
        self
    }

    pub fn delete_account(mut self, id: Uuid) -> Self {
        self.delete_accounts.push(id);
        self
    }

    pub fn delete_transaction(mut self, id: Uuid) -> Self {
        self.delete_transactions.push(id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.upsert_accounts.is_empty()
            && self.upsert_transactions.is_empty()
            && self.delete_accounts.is_empty()
            && self.delete_transactions.is_empty()
    }
}
