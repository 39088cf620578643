use crate::backup::backup_data_file;
use crate::error::{Result, StoreError};
use crate::reader::read_raw_sheets;
use indexmap::IndexMap;
use rust_xlsxwriter::{Workbook, Worksheet};
use shelfmark_types::{Book, CatalogConfig};
use std::path::{Path, PathBuf};

/// What a save actually did. The `rewritten` list is the per-sheet write
/// counter the idempotence and partial-rewrite guarantees are checked
/// against.
#[derive(Debug, Clone)]
pub struct SaveReport {
    /// Categories whose sheet was regenerated from the record set.
    pub rewritten: Vec<String>,
    /// Sheets carried over from the existing file untouched.
    pub carried: usize,
    /// True when nothing changed and the file was not touched at all.
    pub skipped: bool,
    /// Backup taken before the write, if a data file existed.
    pub backup: Option<PathBuf>,
}

/// Project the record set into per-category sheet rows, in fixed category
/// order. Records with an unrecognized category fold into the default one.
pub(crate) fn partition_rows(
    books: &[Book],
    config: &CatalogConfig,
) -> IndexMap<String, Vec<[String; 4]>> {
    let mut parts: IndexMap<String, Vec<[String; 4]>> = config
        .categories
        .iter()
        .map(|c| (c.clone(), Vec::new()))
        .collect();

    for book in books {
        let category = if parts.contains_key(&book.category) {
            book.category.as_str()
        } else {
            config.default_category.as_str()
        };
        if let Some(rows) = parts.get_mut(category) {
            rows.push([
                book.author.clone(),
                book.title.clone(),
                book.date.clone(),
                book.note.clone(),
            ]);
        }
    }
    parts
}

fn xlsx_err(e: rust_xlsxwriter::XlsxError) -> StoreError {
    StoreError::Workbook(e.to_string())
}

/// Write one category sheet: a header row, then one row per record in
/// {author, title, due-date, note} column order. Empty partitions still get
/// the header so the category's structure is never dropped from the file.
fn write_category_sheet(
    worksheet: &mut Worksheet,
    name: &str,
    rows: &[[String; 4]],
    config: &CatalogConfig,
) -> Result<()> {
    worksheet.set_name(name).map_err(xlsx_err)?;

    let header = [
        config.labels.author.as_str(),
        config.labels.title.as_str(),
        config.labels.date.as_str(),
        config.labels.note.as_str(),
    ];
    for (col, label) in header.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *label)
            .map_err(xlsx_err)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet
                .write_string(row_idx as u32 + 1, col_idx as u16, cell)
                .map_err(xlsx_err)?;
        }
    }
    Ok(())
}

/// Copy a sheet's raw cells into the new workbook.
///
/// Cells are carried as their display strings, so numeric and datetime
/// cell types in carried-over sheets collapse to text. The values the
/// normalizer reads back are unchanged; only the cell typing is lost.
fn write_raw_sheet(worksheet: &mut Worksheet, name: &str, cells: &[Vec<String>]) -> Result<()> {
    worksheet.set_name(name).map_err(xlsx_err)?;
    for (row_idx, row) in cells.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet
                .write_string(row_idx as u32, col_idx as u16, cell)
                .map_err(xlsx_err)?;
        }
    }
    Ok(())
}

/// Persist the record set, rewriting only the sheets whose row set changed
/// against the cached pre-mutation partitioning.
///
/// A timestamped backup is taken first. The new workbook is written to a
/// temporary sibling and renamed over the target, so an interrupted save
/// leaves the prior file intact.
pub(crate) fn save_books(
    path: &Path,
    config: &CatalogConfig,
    cached: Option<&[Book]>,
    books: &[Book],
) -> Result<SaveReport> {
    let backup = backup_data_file(path, config.backup_retention)?;

    let new_parts = partition_rows(books, config);
    let old_parts = cached.map(|c| partition_rows(c, config));
    let raw = if path.exists() {
        Some(read_raw_sheets(path)?)
    } else {
        None
    };

    // A category is dirty when its row set differs from the cached one, or
    // unconditionally on a first run / fresh file. A dirty category whose
    // sheet is missing from the file gets it appended below.
    let changed: Vec<String> = config
        .categories
        .iter()
        .filter(|category| match (&old_parts, &raw) {
            (Some(old), Some(_)) => {
                old.get(category.as_str()) != new_parts.get(category.as_str())
            }
            _ => true,
        })
        .cloned()
        .collect();

    if changed.is_empty() {
        tracing::debug!("record set unchanged, skipping workbook rewrite");
        return Ok(SaveReport {
            rewritten: Vec::new(),
            carried: raw.as_ref().map_or(0, IndexMap::len),
            skipped: true,
            backup,
        });
    }

    let mut workbook = Workbook::new();
    let mut rewritten = Vec::new();
    let mut carried = 0;

    if let Some(raw) = &raw {
        // Keep the existing file's sheet order; unchanged and unrecognized
        // sheets are copied through cell-for-cell.
        for (name, cells) in raw {
            if config.is_category(name) && changed.contains(name) {
                let rows = new_parts.get(name.as_str()).map_or(&[][..], Vec::as_slice);
                write_category_sheet(workbook.add_worksheet(), name, rows, config)?;
                rewritten.push(name.clone());
            } else {
                write_raw_sheet(workbook.add_worksheet(), name, cells)?;
                carried += 1;
            }
        }
        for category in &changed {
            if !raw.contains_key(category.as_str()) {
                let rows = new_parts
                    .get(category.as_str())
                    .map_or(&[][..], Vec::as_slice);
                write_category_sheet(workbook.add_worksheet(), category, rows, config)?;
                rewritten.push(category.clone());
            }
        }
    } else {
        // Fresh file: every category gets a sheet, even empty ones.
        for (category, rows) in &new_parts {
            write_category_sheet(workbook.add_worksheet(), category, rows, config)?;
            rewritten.push(category.clone());
        }
    }

    let tmp = path.with_extension("xlsx.tmp");
    workbook.save(&tmp).map_err(xlsx_err)?;
    std::fs::rename(&tmp, path)?;

    Ok(SaveReport {
        rewritten,
        carried,
        skipped: false,
        backup,
    })
}
