use shelfmark_types::CatalogConfig;

/// Positional fallbacks for sheets without a usable header row. This is the
/// column order the workbook has always used.
const AUTHOR_POS: usize = 0;
const TITLE_POS: usize = 1;
const DATE_POS: usize = 2;
const NOTE_POS: usize = 3;

/// Per-sheet mapping from logical field to physical column index.
///
/// Ephemeral: recomputed for each sheet on every parse. `None` for a field
/// means the sheet simply has no such column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub title: Option<usize>,
    pub author: Option<usize>,
    pub date: Option<usize>,
    pub note: Option<usize>,
}

impl ColumnMap {
    /// Infer the column layout of one sheet.
    ///
    /// Each field is matched by header name first (exact label, or one of
    /// the configured aliases for date/note), then by fixed position. A
    /// fallback position beyond the sheet's width maps to `None`. Returns
    /// `None` when no title mapping can be established, which means the
    /// sheet is skipped entirely.
    #[must_use]
    pub fn infer(
        header: Option<&[String]>,
        col_count: usize,
        config: &CatalogConfig,
    ) -> Option<ColumnMap> {
        let named = |candidates: &[&str]| -> Option<usize> {
            let header = header?;
            header
                .iter()
                .position(|cell| candidates.iter().any(|c| cell.trim() == *c))
        };
        let positional = |pos: usize| (pos < col_count).then_some(pos);

        let title = named(&[config.labels.title.as_str()]).or_else(|| match col_count {
            0 => None,
            // One-column sheets are title-only lists.
            1 => Some(0),
            _ => positional(TITLE_POS),
        })?;
        let author = named(&[config.labels.author.as_str()])
            .or_else(|| (col_count > 1).then(|| positional(AUTHOR_POS)).flatten());
        let date = named(&config.date_headers()).or_else(|| positional(DATE_POS));
        let note = named(&config.note_headers()).or_else(|| positional(NOTE_POS));

        Some(ColumnMap {
            title: Some(title),
            author,
            date,
            note,
        })
    }
}
