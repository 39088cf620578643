//! Core types for shelfmark: the canonical book record and the catalog
//! configuration shared by the store and the activity ledger.

mod book;
mod config;

/// Re-export record types.
pub use book::{Book, BookPatch};
/// Re-export catalog configuration.
pub use config::{CatalogConfig, ConfigError, HeaderLabels};
