//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The ledger engine
//! depends only on these traits, not on concrete implementations.

mod remote_mirror;
mod slot_store;
mod storage;

pub use remote_mirror::RemoteMirror;
pub use slot_store::{SlotStore, ACCOUNTS_SLOT, TRANSACTIONS_SLOT};
pub use storage::{LedgerState, LedgerStorage, SyncReport};
