//! Tally Core - ledger engine for personal finance tracking
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, Transaction, etc.)
//! - **ports**: Trait definitions for external dependencies (SlotStore, RemoteMirror)
//! - **services**: The ledger engine and its collaborators
//! - **adapters**: Concrete implementations (DuckDB, PostgREST, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};

use adapters::duckdb::DuckDbSlotStore;
use adapters::postgrest::PostgrestMirror;
use config::Config;
use ports::RemoteMirror;
use services::{EntryPoint, Ledger, LoggingService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    Account, ChangeSet, ExportData, Identity, Transaction, TransactionFilter, TransactionType,
    TransactionUpdate,
};
pub use ports::SyncReport;
pub use services::ImportOutcome;

/// File name of the ledger database inside the data directory
pub const LEDGER_DB_FILE: &str = "tally.duckdb";

/// Main context for Tally operations
///
/// Opens the ledger database and logger in a data directory and picks
/// local-only or mirrored storage from the saved configuration.
pub struct TallyContext {
    pub config: Config,
    pub ledger: Ledger,
    pub logger: Option<Arc<LoggingService>>,
    data_dir: PathBuf,
}

impl TallyContext {
    /// Create a new Tally context
    ///
    /// A logger that cannot be opened is skipped; the ledger still works.
    pub fn new(data_dir: &Path, entry_point: EntryPoint) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let config = Config::load(data_dir)?;

        let logger = match LoggingService::new(data_dir, entry_point, env!("CARGO_PKG_VERSION")) {
            Ok(service) => Some(Arc::new(service)),
            Err(e) => {
                eprintln!("[tally] logging disabled: {}", e);
                None
            }
        };

        let slots = Arc::new(DuckDbSlotStore::open(&data_dir.join(LEDGER_DB_FILE))?);

        let ledger = match (config.session.clone(), Self::mirror_for(&config)?) {
            (Some(identity), Some(mirror)) => {
                Ledger::open_mirrored(slots, identity, mirror, logger.clone())?
            }
            _ => Ledger::open(slots, logger.clone())?,
        };

        Ok(Self {
            config,
            ledger,
            logger,
            data_dir: data_dir.to_path_buf(),
        })
    }

    fn mirror_for(config: &Config) -> Result<Option<Arc<dyn RemoteMirror>>> {
        let Some(remote) = config.remote_endpoint() else {
            return Ok(None);
        };
        let mirror: Arc<dyn RemoteMirror> =
            Arc::new(PostgrestMirror::new(&remote.url, &remote.api_key)?);
        Ok(Some(mirror))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Sign in: mirror the ledger under `identity` and remember the session
    pub fn login(&mut self, identity: Identity) -> Result<()> {
        let Some(mirror) = Self::mirror_for(&self.config)? else {
            bail!("No remote configured. Set TALLY_REMOTE_URL and TALLY_REMOTE_KEY first.");
        };
        self.ledger.attach_identity(identity.clone(), mirror)?;
        self.config.set_session(identity);
        self.config.save(&self.data_dir)?;
        Ok(())
    }

    /// Sign out: keep the local data and stop mirroring
    pub fn logout(&mut self) -> Result<()> {
        self.ledger.detach_identity();
        self.config.clear_session();
        self.config.save(&self.data_dir)?;
        Ok(())
    }
}
