//! Spreadsheet-backed record store for shelfmark.
//!
//! The catalog lives in a multi-sheet workbook, one sheet per category.
//! Sheets arrive with inconsistent column layouts, so every read runs a
//! small inference pass (named columns first, positions second) and
//! normalizes each row into the canonical [`Book`] shape. Parsed results
//! are cached on the file's modification time, and saves rewrite only the
//! sheets whose row set actually changed, taking a timestamped backup
//! first.
//!
//! [`Book`]: shelfmark_types::Book

mod backup;
mod error;
mod library;
mod normalize;
mod reader;
mod schema;
mod store;
mod writer;

/// Re-export store error types.
pub use error::{Result, StoreError};
/// Re-export the top-level catalog context.
pub use library::{CatalogStats, Library, NewBook};
/// Re-export the row normalizer.
pub use normalize::RowNormalizer;
/// Re-export the column map.
pub use schema::ColumnMap;
/// Re-export the cached store.
pub use store::{BookStore, Snapshot};
/// Re-export the save report.
pub use writer::SaveReport;
