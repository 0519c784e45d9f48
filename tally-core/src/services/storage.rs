//! Ledger storage implementations
//!
//! `LocalStorage` rewrites both slots on every mutation. `MirroredStorage`
//! does the same and then replays the change set against a remote mirror
//! under the current identity; mirror failures are logged and dropped.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::domain::result::{Error, Result};
use crate::domain::{ChangeSet, Identity};
use crate::ports::{
    LedgerState, LedgerStorage, RemoteMirror, SlotStore, SyncReport, ACCOUNTS_SLOT,
    TRANSACTIONS_SLOT,
};
use crate::services::logging::{record, LogEvent, LoggingService};

/// Local-only storage over a slot store
#[derive(Clone)]
pub struct LocalStorage {
    slots: Arc<dyn SlotStore>,
}

impl LocalStorage {
    pub fn new(slots: Arc<dyn SlotStore>) -> Self {
        Self { slots }
    }

    fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.slots.read_slot(key)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                Error::database(format!("slot '{}' holds unreadable data: {}", key, e))
            }),
            None => Ok(Vec::new()),
        }
    }

    fn write_state(&self, state: &LedgerState) -> Result<()> {
        let accounts = serde_json::to_string(&state.accounts)?;
        let transactions = serde_json::to_string(&state.transactions)?;
        self.slots
            .write_slots(&[(ACCOUNTS_SLOT, accounts), (TRANSACTIONS_SLOT, transactions)])
    }
}

impl LedgerStorage for LocalStorage {
    fn load(&self) -> Result<LedgerState> {
        Ok(LedgerState {
            accounts: self.read_collection(ACCOUNTS_SLOT)?,
            transactions: self.read_collection(TRANSACTIONS_SLOT)?,
        })
    }

    fn persist(&self, state: &LedgerState, _changes: &ChangeSet) -> Result<()> {
        self.write_state(state)
    }

    fn clear(&self) -> Result<()> {
        self.slots.clear()
    }
}

/// Local storage plus a best-effort remote mirror
pub struct MirroredStorage {
    local: LocalStorage,
    mirror: Arc<dyn RemoteMirror>,
    identity: Identity,
    logger: Option<Arc<LoggingService>>,
}

impl MirroredStorage {
    pub fn new(
        local: LocalStorage,
        mirror: Arc<dyn RemoteMirror>,
        identity: Identity,
        logger: Option<Arc<LoggingService>>,
    ) -> Self {
        Self {
            local,
            mirror,
            identity,
            logger,
        }
    }

    fn report_failure(&self, event: &str, operation: &str, table: &str, error: &Error) {
        record(
            self.logger.as_deref(),
            LogEvent::new(event)
                .with_operation(operation)
                .with_table(table)
                .with_error(error.to_string())
                .with_error_details(format!("mirror={}", self.mirror.name())),
        );
    }

    fn fetch_remote(&self) -> Result<LedgerState> {
        let accounts = self.mirror.fetch_accounts(&self.identity).map_err(|e| {
            self.report_failure("remote_load_failed", "fetch", "accounts", &e);
            e
        })?;
        let transactions = self.mirror.fetch_transactions(&self.identity).map_err(|e| {
            self.report_failure("remote_load_failed", "fetch", "transactions", &e);
            e
        })?;
        Ok(LedgerState {
            accounts,
            transactions,
        })
    }

    /// Replay a change set against the mirror
    ///
    /// Each call stands alone: a failed account upsert does not stop the
    /// transaction upsert, and nothing is retried.
    fn mirror_changes(&self, changes: &ChangeSet) {
        for id in &changes.delete_transactions {
            if let Err(e) = self.mirror.delete_transaction(&self.identity, *id) {
                self.report_failure("remote_sync_failed", "delete", "transactions", &e);
            }
        }
        for id in &changes.delete_accounts {
            if let Err(e) = self.mirror.delete_account(&self.identity, *id) {
                self.report_failure("remote_sync_failed", "delete", "accounts", &e);
            }
        }
        if !changes.upsert_accounts.is_empty() {
            if let Err(e) = self
                .mirror
                .upsert_accounts(&self.identity, &changes.upsert_accounts)
            {
                self.report_failure("remote_sync_failed", "upsert", "accounts", &e);
            }
        }
        if !changes.upsert_transactions.is_empty() {
            if let Err(e) = self
                .mirror
                .upsert_transactions(&self.identity, &changes.upsert_transactions)
            {
                self.report_failure("remote_sync_failed", "upsert", "transactions", &e);
            }
        }
    }
}

impl LedgerStorage for MirroredStorage {
    /// Remote is authoritative at load time; when it cannot be reached the
    /// local copy is used instead
    fn load(&self) -> Result<LedgerState> {
        match self.fetch_remote() {
            Ok(state) => {
                self.local.write_state(&state)?;
                Ok(state)
            }
            Err(_) => self.local.load(),
        }
    }

    fn persist(&self, state: &LedgerState, changes: &ChangeSet) -> Result<()> {
        self.local.write_state(state)?;
        self.mirror_changes(changes);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.local.clear()
    }

    fn identity(&self) -> Option<&Identity> {
        Some(&self.identity)
    }

    fn push_all(&self, state: &LedgerState) -> SyncReport {
        let mut report = SyncReport::default();

        match self.mirror.upsert_accounts(&self.identity, &state.accounts) {
            Ok(()) => report.accounts_pushed = state.accounts.len(),
            Err(e) => {
                self.report_failure("remote_sync_failed", "push", "accounts", &e);
                report.failures.push(e.to_string());
            }
        }
        match self
            .mirror
            .upsert_transactions(&self.identity, &state.transactions)
        {
            Ok(()) => report.transactions_pushed = state.transactions.len(),
            Err(e) => {
                self.report_failure("remote_sync_failed", "push", "transactions", &e);
                report.failures.push(e.to_string());
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::duckdb::DuckDbSlotStore;
    use crate::adapters::memory::InMemoryMirror;
    use crate::domain::Account;
    use rust_decimal::Decimal;

    fn slots() -> Arc<dyn SlotStore> {
        Arc::new(DuckDbSlotStore::open_in_memory().unwrap())
    }

    #[test]
    fn test_absent_slots_load_empty() {
        let storage = LocalStorage::new(slots());
        assert_eq!(storage.load().unwrap(), LedgerState::default());
    }

    #[test]
    fn test_local_round_trip() {
        let storage = LocalStorage::new(slots());
        let state = LedgerState {
            accounts: vec![Account::new("Checking", Decimal::new(100, 0))],
            transactions: Vec::new(),
        };
        storage.persist(&state, &ChangeSet::new()).unwrap();
        assert_eq!(storage.load().unwrap(), state);
    }

    #[test]
    fn test_corrupt_slot_is_a_database_error() {
        let store = slots();
        store
            .write_slots(&[(ACCOUNTS_SLOT, "not json".to_string())])
            .unwrap();
        let err = LocalStorage::new(store).load().unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_mirrored_load_prefers_remote_and_caches_locally() {
        let store = slots();
        let mirror = Arc::new(InMemoryMirror::new());
        let remote_account = Account::new("Remote", Decimal::new(5, 0));
        mirror.seed("u1", vec![remote_account.clone()], Vec::new());

        let storage = MirroredStorage::new(
            LocalStorage::new(store.clone()),
            mirror,
            Identity::new("u1", "t"),
            None,
        );
        let state = storage.load().unwrap();
        assert_eq!(state.accounts, vec![remote_account.clone()]);

        let cached = LocalStorage::new(store).load().unwrap();
        assert_eq!(cached.accounts, vec![remote_account]);
    }

    #[test]
    fn test_mirrored_load_falls_back_to_local() {
        let store = slots();
        let local = LocalStorage::new(store);
        let local_state = LedgerState {
            accounts: vec![Account::new("Local", Decimal::ZERO)],
            transactions: Vec::new(),
        };
        local.persist(&local_state, &ChangeSet::new()).unwrap();

        let mirror = Arc::new(InMemoryMirror::new());
        mirror.set_failing(true);
        let storage = MirroredStorage::new(local, mirror, Identity::new("u1", "t"), None);

        assert_eq!(storage.load().unwrap(), local_state);
    }

    #[test]
    fn test_persist_succeeds_when_mirror_fails() {
        let store = slots();
        let mirror = Arc::new(InMemoryMirror::new());
        mirror.set_failing(true);
        let storage = MirroredStorage::new(
            LocalStorage::new(store.clone()),
            mirror.clone(),
            Identity::new("u1", "t"),
            None,
        );

        let account = Account::new("Checking", Decimal::ZERO);
        let state = LedgerState {
            accounts: vec![account.clone()],
            transactions: Vec::new(),
        };
        storage
            .persist(&state, &ChangeSet::new().upsert_account(account))
            .unwrap();

        assert_eq!(LocalStorage::new(store).load().unwrap(), state);
        assert_eq!(mirror.call_count(), 1);
    }

    #[test]
    fn test_push_all_reports_failures() {
        let mirror = Arc::new(InMemoryMirror::new());
        let storage = MirroredStorage::new(
            LocalStorage::new(slots()),
            mirror.clone(),
            Identity::new("u1", "t"),
            None,
        );
        let state = LedgerState {
            accounts: vec![Account::new("A", Decimal::ZERO), Account::new("B", Decimal::ZERO)],
            transactions: Vec::new(),
        };

        let report = storage.push_all(&state);
        assert!(report.is_clean());
        assert_eq!(report.accounts_pushed, 2);
        assert_eq!(mirror.accounts_for("u1").len(), 2);

        mirror.set_failing(true);
        let report = storage.push_all(&state);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.accounts_pushed, 0);
    }
}
