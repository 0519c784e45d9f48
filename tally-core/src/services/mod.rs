//! Service layer - business logic orchestration
//!
//! The ledger engine drives everything; storage, notification and import
//! normalization are its collaborators. Logging and migrations serve both
//! the ledger database and the log database.

pub mod ledger;
pub mod logging;
pub mod migration;
pub mod notify;
pub mod storage;
pub mod transfer;

pub use ledger::Ledger;
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use notify::ChangeNotifier;
pub use storage::{LocalStorage, MirroredStorage};
pub use transfer::ImportOutcome;
