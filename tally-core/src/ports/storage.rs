//! Ledger storage port
//!
//! The engine persists through exactly one of these. Which implementation
//! is active (local-only or local + mirrored) depends on whether a remote
//! identity is present; the engine never branches on it.

use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{Account, ChangeSet, Identity, Transaction};

/// Both collections, as loaded or as about to be persisted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerState {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
}

/// Outcome of pushing the full local state to a mirror
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub accounts_pushed: usize,
    pub transactions_pushed: usize,
    pub failures: Vec<String>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub trait LedgerStorage {
    /// Load both collections
    fn load(&self) -> Result<LedgerState>;

    /// Persist the full state after a mutation described by `changes`
    ///
    /// Only local failures are returned; mirror failures are logged.
    fn persist(&self, state: &LedgerState, changes: &ChangeSet) -> Result<()>;

    /// Wipe local persistence
    fn clear(&self) -> Result<()>;

    /// Identity the storage mirrors under, if any
    fn identity(&self) -> Option<&Identity> {
        None
    }

    /// Upload the full state to the mirror, if any
    fn push_all(&self, _state: &LedgerState) -> SyncReport {
        SyncReport::default()
    }
}
