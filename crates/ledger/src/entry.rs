use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shelfmark_types::Book;
use std::fmt;

/// Kind of catalog mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Add,
    Edit,
    Delete,
    /// A pure category change (the record moved to another sheet).
    Move,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::Add => "add",
            ActionKind::Edit => "edit",
            ActionKind::Delete => "delete",
            ActionKind::Move => "move",
        };
        write!(f, "{label}")
    }
}

/// One field-level difference between the before and after snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: String,
    pub new: String,
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Sequence id scoped to the entry's calendar day.
    pub id: u64,
    /// Full timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// Day stamp used for pruning.
    pub day: NaiveDate,
    pub action: ActionKind,
    pub book_id: u64,
    pub title: String,
    pub author: String,
    pub category: String,
    /// Prior category, present only for `Move` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_category: Option<String>,
    /// Changed fields, present only for `Edit` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
}

impl ActivityEntry {
    /// Compute the field-level diff between two record snapshots across
    /// {title, author, date, note, category}, keeping only fields that
    /// differ.
    #[must_use]
    pub fn diff(before: &Book, after: &Book) -> Vec<FieldChange> {
        before
            .fields()
            .iter()
            .zip(after.fields().iter())
            .filter(|((_, old), (_, new))| old != new)
            .map(|((field, old), (_, new))| FieldChange {
                field: (*field).to_string(),
                old: (*old).to_string(),
                new: (*new).to_string(),
            })
            .collect()
    }
}

/// Per-action counts over today's entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityStats {
    pub adds: usize,
    pub edits: usize,
    pub deletes: usize,
    pub moves: usize,
}

impl ActivityStats {
    /// Tally the entries by action kind.
    #[must_use]
    pub fn tally<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a ActivityEntry>,
    {
        let mut stats = ActivityStats::default();
        for entry in entries {
            match entry.action {
                ActionKind::Add => stats.adds += 1,
                ActionKind::Edit => stats.edits += 1,
                ActionKind::Delete => stats.deletes += 1,
                ActionKind::Move => stats.moves += 1,
            }
        }
        stats
    }

    /// Total entry count.
    #[must_use]
    pub fn total(&self) -> usize {
        self.adds + self.edits + self.deletes + self.moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, author: &str) -> Book {
        Book {
            id: 1,
            title: title.to_string(),
            author: author.to_string(),
            category: "待借".to_string(),
            date: String::new(),
            note: String::new(),
        }
    }

    #[test]
    fn test_diff_single_field() {
        let before = book("A", "x");
        let after = book("B", "x");

        let changes = ActivityEntry::diff(&before, &after);
        assert_eq!(
            changes,
            vec![FieldChange {
                field: "title".to_string(),
                old: "A".to_string(),
                new: "B".to_string(),
            }]
        );
    }

    #[test]
    fn test_diff_identical_records_is_empty() {
        let a = book("A", "x");
        assert!(ActivityEntry::diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn test_diff_covers_all_five_fields() {
        let before = book("A", "x");
        let mut after = book("B", "y");
        after.category = "已看-1".to_string();
        after.date = "2026-08-24".to_string();
        after.note = "n".to_string();

        let changes = ActivityEntry::diff(&before, &after);
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "author", "date", "note", "category"]);
    }
}
