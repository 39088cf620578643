//! Activity ledger for shelfmark.
//!
//! Every catalog mutation (add, edit, delete, category move) is appended as
//! a structured entry with field-level before/after diffs. The ledger only
//! keeps the current calendar day: entries from prior days are dropped on
//! every load and on every append, not archived.

mod entry;
mod error;
mod ledger;

/// Re-export entry types.
pub use entry::{ActionKind, ActivityEntry, ActivityStats, FieldChange};
/// Re-export ledger error types.
pub use error::{LedgerError, Result};
/// Re-export the ledger.
pub use ledger::ActivityLedger;
