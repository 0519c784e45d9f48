//! Ledger engine
//!
//! Owns the in-memory accounts and transactions and is the only place that
//! changes them. Every mutation is built on a copy of the state, persisted
//! through the active storage, and only then swapped in; a failed local
//! write leaves the ledger exactly as it was. Observers are notified after
//! each successful mutation.
//!
//! Balance invariant: each account's balance equals its initial balance
//! plus the signed amounts of its transactions. Updates and deletes undo
//! the old effect before applying the new one.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, ChangeSet, ExportData, Identity, Transaction, TransactionFilter, TransactionType,
    TransactionUpdate,
};
use crate::ports::{LedgerState, LedgerStorage, RemoteMirror, SlotStore, SyncReport};
use crate::services::logging::{record, LogEvent, LoggingService};
use crate::services::notify::ChangeNotifier;
use crate::services::storage::{LocalStorage, MirroredStorage};
use crate::services::transfer::{normalize_payload, ImportOutcome};

pub struct Ledger {
    state: LedgerState,
    slots: Arc<dyn SlotStore>,
    storage: Box<dyn LedgerStorage>,
    notifier: ChangeNotifier,
    revision: u64,
    logger: Option<Arc<LoggingService>>,
}

impl Ledger {
    /// Open a local-only ledger over `slots`
    pub fn open(slots: Arc<dyn SlotStore>, logger: Option<Arc<LoggingService>>) -> Result<Self> {
        let storage = Box::new(LocalStorage::new(slots.clone()));
        Self::with_storage(slots, storage, logger)
    }

    /// Open a ledger mirrored under `identity`
    ///
    /// The remote copy is loaded first; when it is unreachable the local
    /// copy is used.
    pub fn open_mirrored(
        slots: Arc<dyn SlotStore>,
        identity: Identity,
        mirror: Arc<dyn RemoteMirror>,
        logger: Option<Arc<LoggingService>>,
    ) -> Result<Self> {
        let storage = Box::new(MirroredStorage::new(
            LocalStorage::new(slots.clone()),
            mirror,
            identity,
            logger.clone(),
        ));
        Self::with_storage(slots, storage, logger)
    }

    fn with_storage(
        slots: Arc<dyn SlotStore>,
        storage: Box<dyn LedgerStorage>,
        logger: Option<Arc<LoggingService>>,
    ) -> Result<Self> {
        let state = storage.load()?;
        let ledger = Self {
            state,
            slots,
            storage,
            notifier: ChangeNotifier::new(),
            revision: 0,
            logger,
        };
        ledger.log(LogEvent::new("ledger_loaded").with_operation(ledger.mode()));
        Ok(ledger)
    }

    fn log(&self, event: LogEvent) {
        record(self.logger.as_deref(), event);
    }

    fn mode(&self) -> &'static str {
        if self.storage.identity().is_some() {
            "mirrored"
        } else {
            "local"
        }
    }

    /// Persist `next`, then make it current and notify observers
    fn commit(&mut self, next: LedgerState, changes: ChangeSet) -> Result<()> {
        self.storage.persist(&next, &changes)?;
        self.state = next;
        self.revision += 1;
        self.notifier.notify(self.revision);
        Ok(())
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Call `callback` after every successful mutation
    pub fn subscribe(&mut self, callback: impl Fn() + 'static) {
        self.notifier.subscribe(callback);
    }

    /// Receive the new revision number after every successful mutation
    pub fn subscribe_channel(&mut self) -> Receiver<u64> {
        self.notifier.subscribe_channel()
    }

    /// Number of successful mutations since the ledger was opened
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Create an account holding `initial_balance`
    pub fn create_account(&mut self, name: &str, initial_balance: Decimal) -> Result<Account> {
        let mut account = Account::new(name.trim(), initial_balance);
        account.validate().map_err(Error::validation)?;
        account.owner_id = self.storage.identity().map(|i| i.user_id.clone());

        let mut next = self.state.clone();
        next.accounts.push(account.clone());
        self.commit(next, ChangeSet::new().upsert_account(account.clone()))?;
        Ok(account)
    }

    /// All accounts, in creation order
    pub fn accounts(&self) -> &[Account] {
        &self.state.accounts
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.state.accounts.iter().find(|a| a.id == id)
    }

    /// Delete an account
    ///
    /// Its transactions are kept as they are and keep showing the account
    /// name they were recorded with. Returns false when no such account
    /// exists.
    pub fn delete_account(&mut self, id: Uuid) -> Result<bool> {
        if self.account(id).is_none() {
            return Ok(false);
        }

        let mut next = self.state.clone();
        next.accounts.retain(|a| a.id != id);
        self.commit(next, ChangeSet::new().delete_account(id))?;
        Ok(true)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Record a transaction and apply it to its account
    ///
    /// `date` defaults to today in local time. The category is dropped for
    /// income. Returns `None` when the account does not exist.
    pub fn add_transaction(
        &mut self,
        kind: TransactionType,
        amount: Decimal,
        description: &str,
        account_id: Uuid,
        date: Option<NaiveDate>,
        category: Option<String>,
    ) -> Result<Option<Transaction>> {
        validate_amount(amount)?;
        let Some(account) = self.account(account_id) else {
            return Ok(None);
        };
        let account_name = account.name.clone();

        let mut next = self.state.clone();
        let Some(updated) = adjust_balance(&mut next, account_id, kind.signed(amount))? else {
            return Ok(None);
        };

        let tx = Transaction {
            id: Uuid::new_v4(),
            kind,
            amount,
            description: description.trim().to_string(),
            account_id,
            account_name,
            category: Transaction::normalize_category(kind, category),
            date: date.unwrap_or_else(today),
            created_at: Utc::now(),
            balance_after: updated.balance,
        };
        next.transactions.insert(0, tx.clone());

        let changes = ChangeSet::new()
            .upsert_account(updated)
            .upsert_transaction(tx.clone());
        self.commit(next, changes)?;
        Ok(Some(tx))
    }

    /// Transactions matching `filter`, newest date first
    ///
    /// Ties on date are broken by creation time, newest first.
    pub fn transactions(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        let mut matching: Vec<Transaction> = self
            .state
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        matching
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.state.transactions.iter().find(|t| t.id == id)
    }

    /// Apply a partial update to a transaction
    ///
    /// The old effect is reversed on the old account and the new effect
    /// applied to the (possibly different) new account; the account name
    /// and balance-after snapshots are refreshed from the new account.
    /// Returns false when the transaction or the target account does not
    /// exist, in which case nothing changes.
    pub fn update_transaction(&mut self, id: Uuid, update: TransactionUpdate) -> Result<bool> {
        let Some(index) = self.state.transactions.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        let old = self.state.transactions[index].clone();

        let kind = update.kind.unwrap_or(old.kind);
        let amount = update.amount.unwrap_or(old.amount);
        validate_amount(amount)?;
        let account_id = update.account_id.unwrap_or(old.account_id);
        if self.account(account_id).is_none() {
            return Ok(false);
        }

        let mut next = self.state.clone();
        let mut changes = ChangeSet::new();

        // The old account may have been deleted since; then there is
        // nothing to reverse
        if let Some(reversed) = adjust_balance(&mut next, old.account_id, -old.signed_amount())? {
            changes = changes.upsert_account(reversed);
        }
        let Some(applied) = adjust_balance(&mut next, account_id, kind.signed(amount))? else {
            return Ok(false);
        };

        let category = match update.category {
            Some(category) => category,
            None => old.category.clone(),
        };
        let updated = Transaction {
            id: old.id,
            kind,
            amount,
            description: update
                .description
                .map(|d| d.trim().to_string())
                .unwrap_or(old.description),
            account_id,
            account_name: applied.name.clone(),
            category: Transaction::normalize_category(kind, category),
            date: update.date.unwrap_or(old.date),
            created_at: old.created_at,
            balance_after: applied.balance,
        };
        next.transactions[index] = updated.clone();

        let changes = changes.upsert_account(applied).upsert_transaction(updated);
        self.commit(next, changes)?;
        Ok(true)
    }

    /// Delete a transaction and reverse its effect on its account
    pub fn delete_transaction(&mut self, id: Uuid) -> Result<bool> {
        let Some(index) = self.state.transactions.iter().position(|t| t.id == id) else {
            return Ok(false);
        };

        let mut next = self.state.clone();
        let removed = next.transactions.remove(index);
        let mut changes = ChangeSet::new().delete_transaction(removed.id);
        if let Some(reversed) =
            adjust_balance(&mut next, removed.account_id, -removed.signed_amount())?
        {
            changes = changes.upsert_account(reversed);
        }

        self.commit(next, changes)?;
        Ok(true)
    }

    // ========================================================================
    // Queries and bulk data
    // ========================================================================

    /// Sum of all account balances
    ///
    /// Fails when the sum does not fit in a decimal.
    pub fn total_balance(&self) -> Result<Decimal> {
        self.state
            .accounts
            .iter()
            .try_fold(Decimal::ZERO, |total, a| total.checked_add(a.balance))
            .ok_or_else(|| Error::validation("total balance out of range"))
    }

    pub fn export_data(&self) -> ExportData {
        ExportData::new(
            self.state.accounts.clone(),
            self.state.transactions.clone(),
        )
    }

    /// Replace the whole ledger with an import payload
    ///
    /// A payload that cannot be read is rejected and the ledger is left
    /// untouched. Imported balances are taken as given.
    pub fn import_data(&mut self, payload: &JsonValue) -> Result<ImportOutcome> {
        let imported = match normalize_payload(payload) {
            Ok(state) => state,
            Err(Error::Import(reason)) => {
                self.log(
                    LogEvent::new("import_rejected")
                        .with_operation("import")
                        .with_error(reason.clone()),
                );
                return Ok(ImportOutcome::Rejected { reason });
            }
            Err(e) => return Err(e),
        };

        let mut changes = ChangeSet::new();
        for account in &self.state.accounts {
            if !imported.accounts.iter().any(|a| a.id == account.id) {
                changes = changes.delete_account(account.id);
            }
        }
        for tx in &self.state.transactions {
            if !imported.transactions.iter().any(|t| t.id == tx.id) {
                changes = changes.delete_transaction(tx.id);
            }
        }
        changes.upsert_accounts = imported.accounts.clone();
        changes.upsert_transactions = imported.transactions.clone();

        let outcome = ImportOutcome::Imported {
            accounts: imported.accounts.len(),
            transactions: imported.transactions.len(),
        };
        self.commit(imported, changes)?;
        self.log(LogEvent::new("data_imported").with_operation("import"));
        Ok(outcome)
    }

    /// Remove every account and transaction
    pub fn clear_all(&mut self) -> Result<()> {
        let mut changes = ChangeSet::new();
        for tx in &self.state.transactions {
            changes = changes.delete_transaction(tx.id);
        }
        for account in &self.state.accounts {
            changes = changes.delete_account(account.id);
        }

        self.storage.clear()?;
        self.commit(LedgerState::default(), changes)?;
        self.log(LogEvent::new("data_cleared").with_operation("clear"));
        Ok(())
    }

    // ========================================================================
    // Remote identity
    // ========================================================================

    pub fn identity(&self) -> Option<&Identity> {
        self.storage.identity()
    }

    /// Switch to mirrored storage under `identity` and reload
    ///
    /// Observers are notified since the reload may replace the state.
    pub fn attach_identity(
        &mut self,
        identity: Identity,
        mirror: Arc<dyn RemoteMirror>,
    ) -> Result<()> {
        let mirror_name = mirror.name().to_string();
        let storage = Box::new(MirroredStorage::new(
            LocalStorage::new(self.slots.clone()),
            mirror,
            identity,
            self.logger.clone(),
        ));

        let state = storage.load()?;
        self.storage = storage;
        self.state = state;
        self.revision += 1;
        self.notifier.notify(self.revision);

        self.log(LogEvent::new("identity_attached").with_error_details(format!("mirror={}", mirror_name)));
        Ok(())
    }

    /// Drop back to local-only storage, keeping the current state
    pub fn detach_identity(&mut self) {
        if self.storage.identity().is_none() {
            return;
        }
        self.storage = Box::new(LocalStorage::new(self.slots.clone()));
        self.log(LogEvent::new("identity_detached"));
    }

    /// Re-read the state from storage (remote first when mirrored)
    pub fn reload(&mut self) -> Result<()> {
        self.state = self.storage.load()?;
        self.revision += 1;
        self.notifier.notify(self.revision);
        Ok(())
    }

    /// Upload every local row to the mirror
    ///
    /// Without an identity this is a no-op with an empty report.
    pub fn push_to_remote(&self) -> SyncReport {
        self.storage.push_all(&self.state)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::validation("amount cannot be negative"));
    }
    Ok(())
}

/// Shift an account's balance by `delta`, returning the updated account
///
/// `Ok(None)` when the account does not exist.
fn adjust_balance(
    state: &mut LedgerState,
    account_id: Uuid,
    delta: Decimal,
) -> Result<Option<Account>> {
    let Some(account) = state.accounts.iter_mut().find(|a| a.id == account_id) else {
        return Ok(None);
    };
    account.balance = account
        .balance
        .checked_add(delta)
        .ok_or_else(|| Error::validation("balance out of range"))?;
    Ok(Some(account.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::duckdb::DuckDbSlotStore;
    use crate::adapters::memory::InMemoryMirror;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn local_ledger() -> Ledger {
        let slots: Arc<dyn SlotStore> = Arc::new(DuckDbSlotStore::open_in_memory().unwrap());
        Ledger::open(slots, None).unwrap()
    }

    fn expense(ledger: &mut Ledger, account: Uuid, amount: i64) -> Transaction {
        ledger
            .add_transaction(TransactionType::Expense, dec(amount), "x", account, None, None)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_full_balance_lifecycle() {
        let mut ledger = local_ledger();
        let account = ledger.create_account("Checking", dec(100)).unwrap();

        let groceries = ledger
            .add_transaction(
                TransactionType::Expense,
                dec(30),
                "Groceries",
                account.id,
                Some(date("2024-05-01")),
                Some("food".to_string()),
            )
            .unwrap()
            .unwrap();
        assert_eq!(groceries.balance_after, dec(70));
        assert_eq!(ledger.account(account.id).unwrap().balance, dec(70));

        let salary = ledger
            .add_transaction(
                TransactionType::Income,
                dec(50),
                "Salary",
                account.id,
                Some(date("2024-05-02")),
                None,
            )
            .unwrap()
            .unwrap();
        assert_eq!(salary.balance_after, dec(120));

        let update = TransactionUpdate {
            amount: Some(dec(10)),
            ..Default::default()
        };
        assert!(ledger.update_transaction(groceries.id, update).unwrap());
        assert_eq!(ledger.account(account.id).unwrap().balance, dec(140));
        assert_eq!(ledger.transaction(groceries.id).unwrap().balance_after, dec(140));

        assert!(ledger.delete_transaction(salary.id).unwrap());
        assert_eq!(ledger.account(account.id).unwrap().balance, dec(90));
        assert_eq!(ledger.total_balance().unwrap(), dec(90));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut ledger = local_ledger();
        let err = ledger.create_account("   ", dec(0)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(ledger.accounts().is_empty());
    }

    #[test]
    fn test_add_to_missing_account_changes_nothing() {
        let mut ledger = local_ledger();
        let result = ledger
            .add_transaction(TransactionType::Income, dec(5), "x", Uuid::new_v4(), None, None)
            .unwrap();
        assert!(result.is_none());
        assert_eq!(ledger.revision(), 0);
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let mut ledger = local_ledger();
        let account = ledger.create_account("Cash", dec(0)).unwrap();
        let err = ledger
            .add_transaction(TransactionType::Expense, dec(-1), "x", account.id, None, None)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_balance_overflow_is_rejected() {
        let mut ledger = local_ledger();
        let account = ledger.create_account("Huge", Decimal::MAX).unwrap();

        let err = ledger
            .add_transaction(TransactionType::Income, dec(1), "x", account.id, None, None)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(ledger.account(account.id).unwrap().balance, Decimal::MAX);
        assert!(ledger.transactions(&TransactionFilter::default()).is_empty());
        assert_eq!(ledger.revision(), 1);

        // Reversing the expense lands on MAX, re-applying it as income overflows
        let tx = expense(&mut ledger, account.id, 5);
        let update = TransactionUpdate {
            kind: Some(TransactionType::Income),
            ..Default::default()
        };
        let err = ledger.update_transaction(tx.id, update).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(ledger.account(account.id).unwrap().balance, Decimal::MAX - dec(5));
        assert_eq!(ledger.transaction(tx.id).unwrap().kind, TransactionType::Expense);
    }

    #[test]
    fn test_total_balance_overflow_is_an_error() {
        let mut ledger = local_ledger();
        ledger.create_account("A", Decimal::MAX).unwrap();
        assert_eq!(ledger.total_balance().unwrap(), Decimal::MAX);

        ledger.create_account("B", Decimal::MAX).unwrap();
        assert!(matches!(ledger.total_balance(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_update_matches_delete_and_re_add() {
        let mut edited = local_ledger();
        let a = edited.create_account("A", dec(100)).unwrap();
        let tx = expense(&mut edited, a.id, 30);
        let update = TransactionUpdate {
            kind: Some(TransactionType::Income),
            amount: Some(dec(45)),
            ..Default::default()
        };
        assert!(edited.update_transaction(tx.id, update).unwrap());

        let mut replaced = local_ledger();
        let b = replaced.create_account("A", dec(100)).unwrap();
        let tx = expense(&mut replaced, b.id, 30);
        assert!(replaced.delete_transaction(tx.id).unwrap());
        replaced
            .add_transaction(TransactionType::Income, dec(45), "x", b.id, None, None)
            .unwrap()
            .unwrap();

        let edited_balance = edited.account(a.id).unwrap().balance;
        assert_eq!(edited_balance, replaced.account(b.id).unwrap().balance);
        assert_eq!(edited_balance, dec(145));
    }

    #[test]
    fn test_delete_then_re_add_restores_balance() {
        let mut ledger = local_ledger();
        let account = ledger.create_account("A", dec(100)).unwrap();
        ledger
            .add_transaction(TransactionType::Income, dec(20), "Refund", account.id, None, None)
            .unwrap();
        let tx = ledger
            .add_transaction(
                TransactionType::Expense,
                dec(7),
                "Coffee",
                account.id,
                Some(date("2024-03-01")),
                Some("food".to_string()),
            )
            .unwrap()
            .unwrap();
        let before = ledger.account(account.id).unwrap().balance;
        assert_eq!(before, dec(113));

        assert!(ledger.delete_transaction(tx.id).unwrap());
        assert_eq!(ledger.account(account.id).unwrap().balance, dec(120));

        ledger
            .add_transaction(
                tx.kind,
                tx.amount,
                &tx.description,
                tx.account_id,
                Some(tx.date),
                tx.category.clone(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(ledger.account(account.id).unwrap().balance, before);
    }

    #[test]
    fn test_date_defaults_to_today_and_income_drops_category() {
        let mut ledger = local_ledger();
        let account = ledger.create_account("Cash", dec(0)).unwrap();
        let tx = ledger
            .add_transaction(
                TransactionType::Income,
                dec(5),
                "Gift",
                account.id,
                None,
                Some("misc".to_string()),
            )
            .unwrap()
            .unwrap();
        assert_eq!(tx.date, today());
        assert_eq!(tx.category, None);
    }

    #[test]
    fn test_update_moves_between_accounts() {
        let mut ledger = local_ledger();
        let a = ledger.create_account("A", dec(100)).unwrap();
        let b = ledger.create_account("B", dec(0)).unwrap();
        let tx = expense(&mut ledger, a.id, 40);

        let update = TransactionUpdate {
            account_id: Some(b.id),
            kind: Some(TransactionType::Income),
            ..Default::default()
        };
        assert!(ledger.update_transaction(tx.id, update).unwrap());

        assert_eq!(ledger.account(a.id).unwrap().balance, dec(100));
        assert_eq!(ledger.account(b.id).unwrap().balance, dec(40));
        let moved = ledger.transaction(tx.id).unwrap();
        assert_eq!(moved.account_name, "B");
        assert_eq!(moved.balance_after, dec(40));
        assert_eq!(moved.created_at, tx.created_at);
    }

    #[test]
    fn test_update_to_missing_account_is_refused() {
        let mut ledger = local_ledger();
        let a = ledger.create_account("A", dec(100)).unwrap();
        let tx = expense(&mut ledger, a.id, 40);

        let update = TransactionUpdate {
            account_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(!ledger.update_transaction(tx.id, update).unwrap());
        assert_eq!(ledger.account(a.id).unwrap().balance, dec(60));
        assert!(!ledger
            .update_transaction(Uuid::new_v4(), TransactionUpdate::default())
            .unwrap());
    }

    #[test]
    fn test_delete_account_keeps_orphans() {
        let mut ledger = local_ledger();
        let a = ledger.create_account("A", dec(100)).unwrap();
        let b = ledger.create_account("B", dec(10)).unwrap();
        let tx = expense(&mut ledger, a.id, 40);

        assert!(ledger.delete_account(a.id).unwrap());
        assert!(!ledger.delete_account(a.id).unwrap());
        assert_eq!(ledger.transaction(tx.id).unwrap().account_name, "A");
        assert_eq!(ledger.total_balance().unwrap(), dec(10));

        // Reversing on a vanished account is a no-op
        assert!(ledger.delete_transaction(tx.id).unwrap());
        assert_eq!(ledger.account(b.id).unwrap().balance, dec(10));
    }

    #[test]
    fn test_listing_order_and_filters() {
        let mut ledger = local_ledger();
        let a = ledger.create_account("A", dec(0)).unwrap();
        let b = ledger.create_account("B", dec(0)).unwrap();
        for (account, day) in [(a.id, "2024-01-02"), (b.id, "2024-01-03"), (a.id, "2024-01-01")] {
            ledger
                .add_transaction(TransactionType::Income, dec(1), "x", account, Some(date(day)), None)
                .unwrap();
        }

        let all = ledger.transactions(&TransactionFilter::default());
        let dates: Vec<String> = all.iter().map(|t| t.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-03", "2024-01-02", "2024-01-01"]);

        let only_a = ledger.transactions(&TransactionFilter {
            account_id: Some(a.id),
            date_end: Some(date("2024-01-01")),
            ..Default::default()
        });
        assert_eq!(only_a.len(), 1);
    }

    #[test]
    fn test_observers_fire_per_mutation() {
        let mut ledger = local_ledger();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        ledger.subscribe(move || counter.set(counter.get() + 1));
        let revisions = ledger.subscribe_channel();

        let account = ledger.create_account("A", dec(0)).unwrap();
        expense(&mut ledger, account.id, 1);
        ledger.delete_account(Uuid::new_v4()).unwrap();

        assert_eq!(hits.get(), 2);
        assert_eq!(revisions.try_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_state_survives_reopen() {
        let slots: Arc<dyn SlotStore> = Arc::new(DuckDbSlotStore::open_in_memory().unwrap());
        let account_id = {
            let mut ledger = Ledger::open(slots.clone(), None).unwrap();
            let account = ledger.create_account("A", dec(10)).unwrap();
            expense(&mut ledger, account.id, 3);
            account.id
        };

        let ledger = Ledger::open(slots, None).unwrap();
        assert_eq!(ledger.account(account_id).unwrap().balance, dec(7));
        assert_eq!(ledger.transactions(&TransactionFilter::default()).len(), 1);
    }

    #[test]
    fn test_import_replaces_or_rejects() {
        let mut ledger = local_ledger();
        ledger.create_account("Old", dec(1)).unwrap();

        let rejected = ledger.import_data(&json!({"accounts": []})).unwrap();
        assert!(!rejected.is_imported());
        assert_eq!(ledger.accounts().len(), 1);

        let exported = {
            let mut other = local_ledger();
            let account = other.create_account("New", dec(50)).unwrap();
            expense(&mut other, account.id, 5);
            serde_json::to_value(other.export_data()).unwrap()
        };
        let outcome = ledger.import_data(&exported).unwrap();
        assert_eq!(
            outcome,
            ImportOutcome::Imported {
                accounts: 1,
                transactions: 1
            }
        );
        assert_eq!(ledger.accounts()[0].name, "New");
        assert_eq!(ledger.total_balance().unwrap(), dec(45));
    }

    #[test]
    fn test_clear_all() {
        let mut ledger = local_ledger();
        let account = ledger.create_account("A", dec(1)).unwrap();
        expense(&mut ledger, account.id, 1);

        ledger.clear_all().unwrap();
        assert!(ledger.accounts().is_empty());
        assert!(ledger.transactions(&TransactionFilter::default()).is_empty());
        assert_eq!(ledger.total_balance().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_identity_lifecycle() {
        let mut ledger = local_ledger();
        let mirror = Arc::new(InMemoryMirror::new());
        let remote = Account::new("Remote", dec(5));
        mirror.seed("u1", vec![remote.clone()], Vec::new());

        ledger
            .attach_identity(Identity::new("u1", "t"), mirror.clone())
            .unwrap();
        assert_eq!(ledger.identity().map(|i| i.user_id.as_str()), Some("u1"));
        assert_eq!(ledger.accounts(), &[remote]);

        let created = ledger.create_account("Mirrored", dec(0)).unwrap();
        assert_eq!(created.owner_id.as_deref(), Some("u1"));
        assert_eq!(mirror.accounts_for("u1").len(), 2);

        ledger.detach_identity();
        assert!(ledger.identity().is_none());
        assert_eq!(ledger.accounts().len(), 2);
        assert!(ledger.push_to_remote().is_clean());
    }

    #[test]
    fn test_reload_pulls_remote_changes() {
        let mut ledger = local_ledger();
        let mirror = Arc::new(InMemoryMirror::new());
        ledger
            .attach_identity(Identity::new("u1", "t"), mirror.clone())
            .unwrap();
        assert!(ledger.accounts().is_empty());

        let revisions = ledger.subscribe_channel();
        let elsewhere = Account::new("Added elsewhere", dec(12));
        mirror.seed("u1", vec![elsewhere.clone()], Vec::new());

        ledger.reload().unwrap();
        assert_eq!(ledger.accounts(), &[elsewhere]);
        assert_eq!(revisions.try_iter().count(), 1);
    }

    #[test]
    fn test_mirror_failure_keeps_local_write() {
        let mut ledger = local_ledger();
        let mirror = Arc::new(InMemoryMirror::new());
        ledger
            .attach_identity(Identity::new("u1", "t"), mirror.clone())
            .unwrap();

        mirror.set_failing(true);
        let account = ledger.create_account("A", dec(3)).unwrap();
        assert!(ledger.account(account.id).is_some());

        mirror.set_failing(false);
        let report = ledger.push_to_remote();
        assert_eq!(report.accounts_pushed, 1);
        assert_eq!(mirror.accounts_for("u1").len(), 1);
    }
}
