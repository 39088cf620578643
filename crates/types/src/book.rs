use serde::{Deserialize, Serialize};

/// A canonical book record.
///
/// Ids are assigned sequentially at parse time and are unique within the
/// active record set; they are not stored in the spreadsheet itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub category: String,
    /// Due date in a recognized date shape, or empty.
    #[serde(default)]
    pub date: String,
    /// Free text; may absorb misplaced date-like or borrower-like values.
    #[serde(default)]
    pub note: String,
}

impl Book {
    /// The diffable fields as (name, value) pairs, in a fixed order.
    ///
    /// Used by the activity ledger to compute field-level edit diffs.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("title", self.title.as_str()),
            ("author", self.author.as_str()),
            ("date", self.date.as_str()),
            ("note", self.note.as_str()),
            ("category", self.category.as_str()),
        ]
    }
}

/// A partial update to a book record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub note: Option<String>,
}

impl BookPatch {
    /// Apply the patch to a record, returning the updated copy.
    ///
    /// The original is left alone so callers keep the pre-mutation
    /// snapshot for diffing.
    #[must_use]
    pub fn apply(&self, book: &Book) -> Book {
        let mut updated = book.clone();
        if let Some(title) = &self.title {
            updated.title = title.clone();
        }
        if let Some(author) = &self.author {
            updated.author = author.clone();
        }
        if let Some(category) = &self.category {
            updated.category = category.clone();
        }
        if let Some(date) = &self.date {
            updated.date = date.clone();
        }
        if let Some(note) = &self.note {
            updated.note = note.clone();
        }
        updated
    }

    /// True when the patch changes nothing but the category.
    #[must_use]
    pub fn is_category_only(&self, book: &Book) -> bool {
        let updated = self.apply(book);
        updated.category != book.category
            && updated.title == book.title
            && updated.author == book.author
            && updated.date == book.date
            && updated.note == book.note
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Book {
        Book {
            id: 3,
            title: "老人與海".to_string(),
            author: "海明威".to_string(),
            category: "待借".to_string(),
            date: "2026-08-01".to_string(),
            note: String::new(),
        }
    }

    #[test]
    fn test_patch_apply_partial() {
        let book = sample();
        let patch = BookPatch {
            title: Some("白鯨記".to_string()),
            ..BookPatch::default()
        };

        let updated = patch.apply(&book);
        assert_eq!(updated.title, "白鯨記");
        assert_eq!(updated.author, book.author);
        assert_eq!(book.title, "老人與海"); // original untouched
    }

    #[test]
    fn test_patch_category_only() {
        let book = sample();
        let patch = BookPatch {
            category: Some("已看-1".to_string()),
            ..BookPatch::default()
        };
        assert!(patch.is_category_only(&book));

        let patch = BookPatch {
            category: Some("已看-1".to_string()),
            note: Some("borrowed".to_string()),
            ..BookPatch::default()
        };
        assert!(!patch.is_category_only(&book));
    }

    #[test]
    fn test_fields_order() {
        let book = sample();
        let names: Vec<&str> = book.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["title", "author", "date", "note", "category"]);
    }
}
