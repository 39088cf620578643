use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a catalog configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Header labels used by the source workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderLabels {
    pub title: String,
    pub author: String,
    pub date: String,
    pub note: String,
}

impl Default for HeaderLabels {
    fn default() -> Self {
        HeaderLabels {
            title: "書名".to_string(),
            author: "作者".to_string(),
            date: "到期日".to_string(),
            note: "備註".to_string(),
        }
    }
}

/// Catalog configuration: the fixed category set, header labels, and the
/// column-disambiguation keywords the source workbook accumulated over time.
///
/// The defaults reproduce the original workbook layout; everything is
/// overridable from a JSON file so locale-specific keywords stay out of the
/// parsing logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Ordered category list; one sheet per category.
    pub categories: Vec<String>,
    /// Category that absorbs records with an unrecognized category on save,
    /// and the add-time default.
    pub default_category: String,
    /// Expected header labels for the four logical columns.
    pub labels: HeaderLabels,
    /// Alternate header names that also identify the date column.
    pub date_header_aliases: Vec<String>,
    /// Alternate header names that also identify the note column. Some
    /// sheets label the borrower column "ISBN".
    pub note_header_aliases: Vec<String>,
    /// Author substituted when none is determinable.
    pub sentinel_author: String,
    /// Number of timestamped backups kept before pruning oldest-first.
    pub backup_retention: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            categories: [
                "新書-待借",
                "待借",
                "不能借",
                "食譜",
                "頁數太多",
                "已看-3447本",
                "已看-1",
                "未到館",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            default_category: "新書-待借".to_string(),
            labels: HeaderLabels::default(),
            date_header_aliases: vec!["日期".to_string()],
            note_header_aliases: vec!["ISBN".to_string(), "借閱人_備註".to_string()],
            sentinel_author: "未分類作者".to_string(),
            backup_retention: 10,
        }
    }
}

impl CatalogConfig {
    /// Load a configuration from a JSON file. Missing keys fall back to the
    /// defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Whether a sheet name is a recognized category.
    #[must_use]
    pub fn is_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }

    /// All header names that identify the date column.
    #[must_use]
    pub fn date_headers(&self) -> Vec<&str> {
        std::iter::once(self.labels.date.as_str())
            .chain(self.date_header_aliases.iter().map(String::as_str))
            .collect()
    }

    /// All header names that identify the note column.
    #[must_use]
    pub fn note_headers(&self) -> Vec<&str> {
        std::iter::once(self.labels.note.as_str())
            .chain(self.note_header_aliases.iter().map(String::as_str))
            .collect()
    }
}
