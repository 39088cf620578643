use crate::error::{Result, StoreError};
use crate::normalize::RowNormalizer;
use crate::reader::read_books;
use crate::writer::{save_books, SaveReport};
use shelfmark_types::{Book, CatalogConfig};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The parsed record set plus the file state it belongs to.
#[derive(Debug, Clone)]
struct CacheEntry {
    mtime: SystemTime,
    books: Vec<Book>,
}

/// Result of a read: the records and whether they came from the cache.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub books: Vec<Book>,
    pub from_cache: bool,
}

/// The spreadsheet-backed record store.
///
/// Reads are cached on the data file's modification time; saves are
/// diff-aware and refresh the cache optimistically so the next read does
/// not reparse. Not internally synchronized: a concurrent host must hold
/// one lock across each read-modify-write span.
#[derive(Debug)]
pub struct BookStore {
    path: PathBuf,
    config: CatalogConfig,
    normalizer: RowNormalizer,
    cache: Option<CacheEntry>,
}

impl BookStore {
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P, config: CatalogConfig) -> Self {
        BookStore {
            path: path.as_ref().to_path_buf(),
            normalizer: RowNormalizer::new(config.clone()),
            config,
            cache: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Current records, reparsing only when the file changed on disk or
    /// `force_reload` is set.
    ///
    /// A missing data file is an error the caller may degrade to an empty
    /// catalog; it never creates a cache entry. A parse failure degrades to
    /// the last good cache entry when one exists, else to an empty list —
    /// reads never hard-fail while stale data is available.
    pub fn records(&mut self, force_reload: bool) -> Result<Snapshot> {
        if !self.path.exists() {
            return Err(StoreError::FileMissing {
                path: self.path.clone(),
            });
        }
        let mtime = std::fs::metadata(&self.path)?.modified()?;

        if !force_reload {
            if let Some(entry) = &self.cache {
                if entry.mtime == mtime {
                    return Ok(Snapshot {
                        books: entry.books.clone(),
                        from_cache: true,
                    });
                }
            }
        }

        match read_books(&self.path, &self.config, &self.normalizer) {
            Ok(books) => {
                self.cache = Some(CacheEntry {
                    mtime,
                    books: books.clone(),
                });
                Ok(Snapshot {
                    books,
                    from_cache: false,
                })
            }
            Err(e) => {
                if let Some(entry) = &self.cache {
                    tracing::warn!("workbook parse failed, serving cached records: {e}");
                    Ok(Snapshot {
                        books: entry.books.clone(),
                        from_cache: true,
                    })
                } else {
                    tracing::warn!("workbook parse failed with no cache to fall back on: {e}");
                    Ok(Snapshot {
                        books: Vec::new(),
                        from_cache: false,
                    })
                }
            }
        }
    }

    /// Persist the record set, rewriting only changed sheets (see
    /// [`SaveReport`]), and refresh the cache on success. On failure the
    /// prior file and cache are left untouched.
    pub fn save(&mut self, books: &[Book]) -> Result<SaveReport> {
        let cached = self.cache.as_ref().map(|entry| entry.books.as_slice());
        let report = save_books(&self.path, &self.config, cached, books)?;

        let mtime = std::fs::metadata(&self.path)?.modified()?;
        self.cache = Some(CacheEntry {
            mtime,
            books: books.to_vec(),
        });
        Ok(report)
    }

    /// Administrative cache reset: the next read reparses the whole file.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Whether a cache entry currently exists.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }
}
