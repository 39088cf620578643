use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Data file not found: {path}")]
    FileMissing { path: PathBuf },

    #[error("Workbook parse error: {0}")]
    Parse(String),

    #[error("Workbook write error: {0}")]
    Workbook(String),

    #[error("Unknown book id: {0}")]
    UnknownBook(u64),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] shelfmark_ledger::LedgerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
