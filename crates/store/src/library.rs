use crate::error::{Result, StoreError};
use crate::store::BookStore;
use crate::writer::SaveReport;
use indexmap::IndexMap;
use serde::Serialize;
use shelfmark_ledger::{ActionKind, ActivityEntry, ActivityLedger, ActivityStats};
use shelfmark_types::{Book, BookPatch, CatalogConfig};
use std::path::Path;

/// Input for a new catalog entry. Omitted fields take their defaults: the
/// sentinel author and the configured default category.
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub note: Option<String>,
}

/// Catalog statistics, shaped like the stats endpoint's payload.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_books: usize,
    pub total_authors: usize,
    /// Per-category counts in fixed category order.
    pub category_stats: IndexMap<String, usize>,
    /// Author name to titles, sentinel author excluded.
    pub authors: IndexMap<String, Vec<String>>,
}

/// Top-level catalog context: the cached store plus the activity ledger,
/// owned explicitly so callers (and tests) construct isolated instances
/// instead of sharing process globals.
///
/// Every mutation runs the full read-modify-write-log span; the design
/// assumes one mutation at a time.
#[derive(Debug)]
pub struct Library {
    store: BookStore,
    ledger: ActivityLedger,
}

impl Library {
    /// Open the catalog at `data_path` with its ledger side file.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(
        data_path: P,
        ledger_path: Q,
        config: CatalogConfig,
    ) -> Result<Self> {
        let ledger = ActivityLedger::open(ledger_path)?;
        Ok(Library {
            store: BookStore::new(data_path, config),
            ledger,
        })
    }

    #[must_use]
    pub fn store(&self) -> &BookStore {
        &self.store
    }

    #[must_use]
    pub fn ledger(&self) -> &ActivityLedger {
        &self.ledger
    }

    /// All records. A missing data file degrades to an empty catalog.
    pub fn books(&mut self, force_reload: bool) -> Result<Vec<Book>> {
        match self.store.records(force_reload) {
            Ok(snapshot) => Ok(snapshot.books),
            Err(StoreError::FileMissing { path }) => {
                tracing::warn!("data file {} missing, catalog is empty", path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Add a record at the head of the catalog and persist.
    pub fn add(&mut self, new: NewBook) -> Result<Book> {
        let config = self.store.config();
        let category = match new.category {
            Some(c) => {
                self.ensure_category(&c)?;
                c
            }
            None => config.default_category.clone(),
        };
        let author = new
            .author
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| self.store.config().sentinel_author.clone());

        let mut books = self.books(false)?;
        let id = books.iter().map(|b| b.id + 1).max().unwrap_or(0);
        let book = Book {
            id,
            title: new.title.trim().to_string(),
            author: author.trim().to_string(),
            category,
            date: new.date.unwrap_or_default(),
            note: new.note.unwrap_or_default(),
        };

        books.insert(0, book.clone());
        self.store.save(&books)?;
        self.log(ActionKind::Add, &book, None);
        Ok(book)
    }

    /// Apply a partial update to a record and persist. A patch that only
    /// changes the category is recorded as a move; any other change is an
    /// edit with field-level diffs.
    pub fn update(&mut self, id: u64, patch: &BookPatch) -> Result<Book> {
        if let Some(category) = &patch.category {
            self.ensure_category(category)?;
        }

        let mut books = self.books(false)?;
        let index = books
            .iter()
            .position(|b| b.id == id)
            .ok_or(StoreError::UnknownBook(id))?;

        // Copy-on-mutate: the prior snapshot feeds the diff.
        let before = books[index].clone();
        let after = patch.apply(&before);
        if after == before {
            return Ok(after);
        }

        let action = if patch.is_category_only(&before) {
            ActionKind::Move
        } else {
            ActionKind::Edit
        };

        books[index] = after.clone();
        self.store.save(&books)?;
        self.log(action, &after, Some(&before));
        Ok(after)
    }

    /// Move a record to another category.
    pub fn move_to(&mut self, id: u64, category: &str) -> Result<Book> {
        self.update(
            id,
            &BookPatch {
                category: Some(category.to_string()),
                ..BookPatch::default()
            },
        )
    }

    /// Delete a record and persist.
    pub fn remove(&mut self, id: u64) -> Result<Book> {
        let mut books = self.books(false)?;
        let index = books
            .iter()
            .position(|b| b.id == id)
            .ok_or(StoreError::UnknownBook(id))?;

        let removed = books.remove(index);
        self.store.save(&books)?;
        self.log(ActionKind::Delete, &removed, None);
        Ok(removed)
    }

    /// Persist an externally assembled record set, bypassing the per-book
    /// helpers. Returns the save report for callers that care which sheets
    /// were rewritten.
    pub fn save(&mut self, books: &[Book]) -> Result<SaveReport> {
        self.store.save(books)
    }

    /// Catalog statistics over the current record set.
    pub fn stats(&mut self) -> Result<CatalogStats> {
        let books = self.books(false)?;
        let config = self.store.config();
        let sentinel = config.sentinel_author.clone();

        let mut category_stats: IndexMap<String, usize> = config
            .categories
            .iter()
            .map(|c| (c.clone(), 0))
            .collect();
        let mut authors: IndexMap<String, Vec<String>> = IndexMap::new();

        for book in &books {
            if let Some(count) = category_stats.get_mut(&book.category) {
                *count += 1;
            }
            if !book.author.is_empty() && book.author != sentinel {
                authors
                    .entry(book.author.clone())
                    .or_default()
                    .push(book.title.clone());
            }
        }

        Ok(CatalogStats {
            total_books: books.len(),
            total_authors: authors.len(),
            category_stats,
            authors,
        })
    }

    /// Today's activity, newest first, with per-action counts.
    #[must_use]
    pub fn activities(&self) -> (Vec<&ActivityEntry>, ActivityStats) {
        self.ledger.today()
    }

    /// Administrative cache reset: the next read reparses the file.
    pub fn reload(&mut self) {
        self.store.invalidate();
    }

    fn ensure_category(&self, category: &str) -> Result<()> {
        if self.store.config().is_category(category) {
            Ok(())
        } else {
            Err(StoreError::UnknownCategory(category.to_string()))
        }
    }

    /// Ledger failures must not undo a mutation that already persisted, so
    /// they are logged and swallowed here.
    fn log(&mut self, action: ActionKind, after: &Book, before: Option<&Book>) {
        if let Err(e) = self.ledger.record(action, after, before) {
            tracing::warn!("failed to record {action} activity: {e}");
        }
    }
}
