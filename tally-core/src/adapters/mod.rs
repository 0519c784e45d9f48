//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the SlotStore port (the local store)
//! - PostgREST HTTP client for the RemoteMirror port
//! - In-memory mirror for tests and offline runs

pub mod duckdb;
pub mod memory;
pub mod postgrest;
