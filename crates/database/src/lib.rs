//! # Stakebook Database Crate
//!
//! This crate is the application-specific interface to the local SQLite file
//! that holds the betting ledger.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the workspace sees domain
//!   types from `core-types`, never rows.
//! - **Transaction-friendly:** Statement-level functions in [`queries`] take a
//!   bare connection, so callers can run several of them inside one
//!   transaction and commit or drop it as a unit.
//! - **No migrations:** The schema is created with `CREATE TABLE IF NOT EXISTS`
//!   on startup and is never versioned.
//!
//! ## Public API
//!
//! - `connect` / `connect_in_memory`: open the SQLite pool.
//! - `init_schema`: create missing tables and seed the settings row.
//! - `DbRepository`: reads, account edits, settings, reset and backups.
//! - `queries`: statement-level access used by the ledger.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod backup;
pub mod connection;
pub mod error;
pub mod queries;
pub mod repository;
mod rows;

// Re-export the key components to create a clean, public-facing API.
pub use backup::{backup_database, list_backups};
pub use connection::{connect, connect_in_memory, init_schema};
pub use error::DbError;
pub use repository::DbRepository;
pub use sqlx::SqliteConnection;
