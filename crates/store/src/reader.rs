use crate::error::{Result, StoreError};
use crate::normalize::RowNormalizer;
use crate::schema::ColumnMap;
use calamine::{open_workbook, Data, Reader, Xlsx};
use indexmap::IndexMap;
use shelfmark_types::{Book, CatalogConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Convert a calamine cell to the string the normalizer works on.
fn cell_to_string(data: &Data) -> String {
    match data {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Bool(b) => b.to_string(),
        Data::Int(i) => i.to_string(),
        // Whole floats are page counts or years; keep them integral.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

fn open(path: &Path) -> Result<Xlsx<BufReader<File>>> {
    open_workbook(path).map_err(|e: calamine::XlsxError| StoreError::Parse(e.to_string()))
}

/// Whether a sheet's first row is a header line rather than data.
fn is_header_row(row: &[String], config: &CatalogConfig) -> bool {
    row.iter().any(|cell| {
        let cell = cell.trim();
        cell == config.labels.title || cell == config.labels.author
    })
}

/// Parse every recognized category sheet of the workbook into records, in
/// sheet order, with ids assigned sequentially across the whole file.
///
/// Sheets whose name is not in the category set are skipped silently, as
/// are sheets whose columns cannot be mapped.
pub(crate) fn read_books(
    path: &Path,
    config: &CatalogConfig,
    normalizer: &RowNormalizer,
) -> Result<Vec<Book>> {
    let mut workbook = open(path)?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut books = Vec::new();

    for sheet_name in sheet_names {
        if !config.is_category(&sheet_name) {
            continue;
        }

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        let col_count = range.get_size().1;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        let header = rows.first().filter(|r| is_header_row(r, config));
        let Some(map) = ColumnMap::infer(header.map(Vec::as_slice), col_count, config) else {
            tracing::debug!("skipping unmappable sheet {sheet_name}");
            continue;
        };

        let data_rows = if header.is_some() { &rows[1..] } else { &rows[..] };
        books.extend(
            data_rows
                .iter()
                .filter_map(|row| normalizer.normalize(row, &map, &sheet_name)),
        );
    }

    for (idx, book) in books.iter_mut().enumerate() {
        book.id = idx as u64;
    }
    Ok(books)
}

/// Read every sheet of the workbook as raw cell strings, in file order.
///
/// The writer uses this to carry unchanged and unrecognized sheets over
/// into the rewritten file untouched.
pub(crate) fn read_raw_sheets(path: &Path) -> Result<IndexMap<String, Vec<Vec<String>>>> {
    let mut workbook = open(path)?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = IndexMap::new();

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        sheets.insert(sheet_name, rows);
    }

    Ok(sheets)
}
