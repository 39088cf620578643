use crate::entry::{ActionKind, ActivityEntry, ActivityStats};
use crate::error::Result;
use chrono::{Local, NaiveDate};
use shelfmark_types::Book;
use std::path::{Path, PathBuf};

/// Append-only activity ledger, persisted wholesale to a JSON side file and
/// pruned to the current calendar day on load and on every append.
///
/// Newest entries first. Not internally synchronized; a concurrent host
/// must hold its own lock for the full read-modify-write span.
#[derive(Debug)]
pub struct ActivityLedger {
    path: PathBuf,
    entries: Vec<ActivityEntry>,
}

impl ActivityLedger {
    /// Open the ledger at `path`, loading any existing side file.
    ///
    /// A missing file yields an empty ledger; an unreadable one is treated
    /// as empty with a warning, so a corrupted ledger never blocks
    /// mutations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut entries = Vec::new();

        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Vec<ActivityEntry>>(&raw) {
                Ok(loaded) => entries = loaded,
                Err(e) => {
                    tracing::warn!("discarding unreadable activity ledger: {e}");
                }
            }
        }

        let mut ledger = ActivityLedger { path, entries };
        ledger.prune_to(Local::now().date_naive());
        Ok(ledger)
    }

    /// Record a mutation and persist the ledger synchronously.
    ///
    /// `before` supplies the pre-mutation snapshot: `Edit` entries get a
    /// field-level diff against it, `Move` entries record its category as
    /// the prior one.
    pub fn record(
        &mut self,
        action: ActionKind,
        after: &Book,
        before: Option<&Book>,
    ) -> Result<&ActivityEntry> {
        let now = Local::now();
        let today = now.date_naive();
        self.prune_to(today);

        let changes = match (action, before) {
            (ActionKind::Edit, Some(prior)) => ActivityEntry::diff(prior, after),
            _ => Vec::new(),
        };
        let from_category = match (action, before) {
            (ActionKind::Move, Some(prior)) => Some(prior.category.clone()),
            _ => None,
        };

        let entry = ActivityEntry {
            id: self.entries.len() as u64 + 1,
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            day: today,
            action,
            book_id: after.id,
            title: after.title.clone(),
            author: after.author.clone(),
            category: after.category.clone(),
            from_category,
            changes,
        };

        self.entries.insert(0, entry);
        self.persist()?;
        Ok(&self.entries[0])
    }

    /// Today's entries (newest first) with per-action counts.
    #[must_use]
    pub fn today(&self) -> (Vec<&ActivityEntry>, ActivityStats) {
        let today = Local::now().date_naive();
        let entries: Vec<&ActivityEntry> =
            self.entries.iter().filter(|e| e.day == today).collect();
        let stats = ActivityStats::tally(entries.iter().copied());
        (entries, stats)
    }

    /// Wipe the ledger and persist the empty state.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune_to(&mut self, day: NaiveDate) {
        self.entries.retain(|e| e.day == day);
    }

    /// Write the whole ledger to the side file via a temporary sibling, so
    /// an interrupted write never leaves a torn file.
    fn persist(&self) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let raw = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
