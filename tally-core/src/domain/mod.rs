//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
pub mod amount;
mod change;
pub mod export;
pub mod result;
mod transaction;
mod user;

pub use account::Account;
pub use change::ChangeSet;
pub use export::ExportData;
pub use transaction::{Transaction, TransactionFilter, TransactionType, TransactionUpdate};
pub use user::Identity;
