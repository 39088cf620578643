use crate::schema::ColumnMap;
use regex::Regex;
use shelfmark_types::{Book, CatalogConfig};

/// Date shapes the catalog recognizes. Anything else found in the date
/// column is not a date and gets reclassified as a note.
const DATE_SHAPES: [&str; 5] = [
    r"^\d{4}-\d{1,2}-\d{1,2}$",
    r"^\d{4}/\d{1,2}/\d{1,2}$",
    r"^\d{1,2}/\d{1,2}/\d{4}$",
    r"^\d{1,2}/\d{1,2}$",
    r"^\d{1,2}-\d{1,2}$",
];

/// Converts raw sheet rows into canonical records.
///
/// Owns the compiled date patterns so they are built once per store, not
/// per row.
#[derive(Debug)]
pub struct RowNormalizer {
    config: CatalogConfig,
    date_shapes: Vec<Regex>,
}

impl RowNormalizer {
    #[must_use]
    pub fn new(config: CatalogConfig) -> Self {
        let date_shapes = DATE_SHAPES
            .iter()
            .map(|p| Regex::new(p).expect("valid regex"))
            .collect();
        RowNormalizer {
            config,
            date_shapes,
        }
    }

    /// Whether a string matches one of the recognized date shapes.
    #[must_use]
    pub fn looks_like_date(&self, value: &str) -> bool {
        self.date_shapes.iter().any(|re| re.is_match(value))
    }

    /// Normalize one raw row into a record, or nothing when the row has no
    /// usable title (blank rows, and header lines misread as data).
    ///
    /// The returned record has `id` 0; the reader assigns ids sequentially
    /// across the whole file.
    #[must_use]
    pub fn normalize(&self, cells: &[String], map: &ColumnMap, category: &str) -> Option<Book> {
        fn cell(cells: &[String], idx: Option<usize>) -> &str {
            idx.and_then(|i| cells.get(i)).map_or("", String::as_str)
        }

        let title = cell(cells, map.title).trim();
        if title.is_empty() || title == self.config.labels.title {
            return None;
        }

        let author = cell(cells, map.author).trim();
        let author = if author.is_empty() || author == self.config.labels.author {
            self.config.sentinel_author.as_str()
        } else {
            author
        };

        // Dates arrive as "YYYY-MM-DD HH:MM:SS" when the cell held a
        // datetime; keep only the date part.
        let mut date = cell(cells, map.date);
        date = date.split(' ').next().unwrap_or("");
        if self.config.date_headers().contains(&date) {
            date = "";
        }

        let mut note = cell(cells, map.note);
        if self.config.note_headers().contains(&note) {
            note = "";
        }

        // Date plausibility repair: a non-date value in the date column is
        // usually a borrower name or a stray remark.
        let mut date = date.to_string();
        let mut note = note.to_string();
        if !date.is_empty() && !self.looks_like_date(&date) {
            if note.is_empty() {
                note = date.clone();
            }
            date.clear();
        }

        Some(Book {
            id: 0,
            title: title.to_string(),
            author: author.to_string(),
            category: category.to_string(),
            date,
            note,
        })
    }
}
