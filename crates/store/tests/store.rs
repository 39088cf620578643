use calamine::Reader as _;
use rust_xlsxwriter::Workbook;
use shelfmark_store::{BookStore, StoreError};
use shelfmark_types::CatalogConfig;
use std::path::Path;
use tempfile::tempdir;

// ===== Fixtures =====

fn write_sheet(workbook: &mut Workbook, name: &str, rows: &[&[&str]]) {
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(name).unwrap();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                worksheet.write_string(r as u32, c as u16, *cell).unwrap();
            }
        }
    }
}

fn write_workbook(path: &Path, sheets: &[(&str, &[&[&str]])]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        write_sheet(&mut workbook, name, rows);
    }
    workbook.save(path).unwrap();
}

fn store_at(path: &Path) -> BookStore {
    BookStore::new(path, CatalogConfig::default())
}

// ===== Reading and normalization =====

#[test]
fn test_read_assigns_ids_in_sheet_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    write_workbook(
        &path,
        &[
            (
                "待借",
                &[
                    &["作者", "書名", "到期日", "備註"][..],
                    &["海明威", "老人與海", "", ""][..],
                ][..],
            ),
            (
                "已看-1",
                &[&["某人", "某書", "", ""][..]][..],
            ),
        ],
    );

    let mut store = store_at(&path);
    let snapshot = store.records(false).unwrap();

    assert_eq!(snapshot.books.len(), 2);
    assert_eq!(snapshot.books[0].id, 0);
    assert_eq!(snapshot.books[0].title, "老人與海");
    assert_eq!(snapshot.books[0].category, "待借");
    assert_eq!(snapshot.books[1].id, 1);
    assert_eq!(snapshot.books[1].category, "已看-1");
}

#[test]
fn test_headerless_sheet_parses_same_as_headered() {
    let dir = tempdir().unwrap();
    let headered = dir.path().join("headered.xlsx");
    let headerless = dir.path().join("headerless.xlsx");

    let data: [&[&str]; 2] = [
        &["海明威", "老人與海", "2026-8-1", "姐姐"],
        &["梅爾維爾", "白鯨記", "", ""],
    ];
    write_workbook(
        &headered,
        &[(
            "待借",
            &[
                &["作者", "書名", "到期日", "備註"][..],
                data[0],
                data[1],
            ][..],
        )],
    );
    write_workbook(&headerless, &[("待借", &data[..])]);

    let left = store_at(&headered).records(false).unwrap().books;
    let right = store_at(&headerless).records(false).unwrap().books;
    assert_eq!(left, right);
}

#[test]
fn test_stray_header_line_never_becomes_a_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    write_workbook(
        &path,
        &[(
            "待借",
            &[
                &["作者", "書名", "到期日", "備註"][..],
                &["海明威", "老人與海", "", ""][..],
                // A second header line misread as data.
                &["作者", "書名", "到期日", "備註"][..],
            ][..],
        )],
    );

    let books = store_at(&path).records(false).unwrap().books;
    assert_eq!(books.len(), 1);
    assert!(books.iter().all(|b| b.title != "書名"));
}

#[test]
fn test_unrecognized_sheets_are_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    write_workbook(
        &path,
        &[
            ("Sheet1", &[&["junk", "more junk"][..]][..]),
            ("待借", &[&["海明威", "老人與海"][..]][..]),
        ],
    );

    let books = store_at(&path).records(false).unwrap().books;
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].category, "待借");
}

#[test]
fn test_non_date_value_reclassified_as_note() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    write_workbook(
        &path,
        &[("待借", &[&["海明威", "老人與海", "妹妹", ""][..]][..])],
    );

    let books = store_at(&path).records(false).unwrap().books;
    assert_eq!(books[0].date, "");
    assert_eq!(books[0].note, "妹妹");
}

// ===== Cache layer =====

#[test]
fn test_second_read_comes_from_cache() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    write_workbook(&path, &[("待借", &[&["海明威", "老人與海"][..]][..])]);

    let mut store = store_at(&path);
    assert!(!store.records(false).unwrap().from_cache);
    assert!(store.records(false).unwrap().from_cache);

    // Forced reload bypasses the cache.
    assert!(!store.records(true).unwrap().from_cache);
}

#[test]
fn test_file_change_invalidates_cache() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    write_workbook(&path, &[("待借", &[&["海明威", "老人與海"][..]][..])]);

    let mut store = store_at(&path);
    assert_eq!(store.records(false).unwrap().books.len(), 1);

    // Rewrite the file behind the store's back.
    write_workbook(
        &path,
        &[(
            "待借",
            &[
                &["海明威", "老人與海"][..],
                &["梅爾維爾", "白鯨記"][..],
            ][..],
        )],
    );

    let snapshot = store.records(false).unwrap();
    assert!(!snapshot.from_cache);
    assert_eq!(snapshot.books.len(), 2);
}

#[test]
fn test_missing_file_is_an_error_and_creates_no_cache() {
    let dir = tempdir().unwrap();
    let mut store = store_at(&dir.path().join("absent.xlsx"));

    assert!(matches!(
        store.records(false),
        Err(StoreError::FileMissing { .. })
    ));
    assert!(!store.is_cached());
}

#[test]
fn test_parse_failure_serves_stale_cache() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    write_workbook(&path, &[("待借", &[&["海明威", "老人與海"][..]][..])]);

    let mut store = store_at(&path);
    let good = store.records(false).unwrap().books;

    // Corrupt the workbook in place.
    std::fs::write(&path, b"definitely not a zip archive").unwrap();

    let snapshot = store.records(false).unwrap();
    assert!(snapshot.from_cache);
    assert_eq!(snapshot.books, good);
}

#[test]
fn test_parse_failure_without_cache_degrades_to_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    std::fs::write(&path, b"definitely not a zip archive").unwrap();

    let mut store = store_at(&path);
    let snapshot = store.records(false).unwrap();
    assert!(snapshot.books.is_empty());
    assert!(!store.is_cached());
}

// ===== Diff-aware writes =====

#[test]
fn test_second_save_of_unchanged_set_is_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    write_workbook(&path, &[("待借", &[&["海明威", "老人與海"][..]][..])]);

    let mut store = store_at(&path);
    let books = store.records(false).unwrap().books;

    let report = store.save(&books).unwrap();
    assert!(report.skipped);
    assert!(report.rewritten.is_empty());

    let mtime_before = std::fs::metadata(&path).unwrap().modified().unwrap();
    let report = store.save(&books).unwrap();
    assert!(report.skipped);
    let mtime_after = std::fs::metadata(&path).unwrap().modified().unwrap();
    assert_eq!(mtime_before, mtime_after);
}

#[test]
fn test_save_rewrites_only_the_mutated_category() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    write_workbook(
        &path,
        &[
            ("待借", &[&["海明威", "老人與海", "", ""][..]][..]),
            ("已看-1", &[&["某人", "某書", "", ""][..]][..]),
        ],
    );

    let mut store = store_at(&path);
    let mut books = store.records(false).unwrap().books;
    let index = books.iter().position(|b| b.category == "待借").unwrap();
    books[index].note = "已預約".to_string();

    let report = store.save(&books).unwrap();
    assert!(!report.skipped);
    assert_eq!(report.rewritten, vec!["待借".to_string()]);
    assert_eq!(report.carried, 1);

    // The store can read its own output and sees the mutation.
    let reread = store.records(true).unwrap().books;
    assert_eq!(reread[index].note, "已預約");
}

#[test]
fn test_fresh_save_writes_every_category_sheet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new.xlsx");
    let config = CatalogConfig::default();

    let mut store = BookStore::new(&path, config.clone());
    let books = vec![shelfmark_types::Book {
        id: 0,
        title: "老人與海".to_string(),
        author: "海明威".to_string(),
        category: "待借".to_string(),
        date: String::new(),
        note: String::new(),
    }];

    let report = store.save(&books).unwrap();
    assert!(!report.skipped);
    assert_eq!(report.rewritten.len(), config.categories.len());

    // Every category sheet exists in the file, even the empty ones.
    let workbook: calamine::Xlsx<_> = calamine::open_workbook(&path).unwrap();
    let names = workbook.sheet_names().to_vec();
    for category in &config.categories {
        assert!(names.contains(category), "missing sheet {category}");
    }
}

#[test]
fn test_unrecognized_sheet_survives_saves() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    write_workbook(
        &path,
        &[
            ("雜記", &[&["keep", "me"][..]][..]),
            ("待借", &[&["海明威", "老人與海"][..]][..]),
        ],
    );

    let mut store = store_at(&path);
    let mut books = store.records(false).unwrap().books;
    books[0].note = "changed".to_string();
    store.save(&books).unwrap();

    let mut workbook: calamine::Xlsx<_> = calamine::open_workbook(&path).unwrap();
    let names = workbook.sheet_names().to_vec();
    assert!(names.contains(&"雜記".to_string()));

    // The carried sheet's cell values are intact (as text).
    let range = workbook.worksheet_range("雜記").unwrap();
    let cells: Vec<String> = range.rows().flatten().map(ToString::to_string).collect();
    assert_eq!(cells, vec!["keep".to_string(), "me".to_string()]);
}

#[test]
fn test_unknown_category_folds_into_default_on_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");

    let mut store = store_at(&path);
    let books = vec![shelfmark_types::Book {
        id: 0,
        title: "流浪者".to_string(),
        author: "某人".to_string(),
        category: "不存在的分類".to_string(),
        date: String::new(),
        note: String::new(),
    }];
    store.save(&books).unwrap();

    let reread = store.records(true).unwrap().books;
    assert_eq!(reread.len(), 1);
    assert_eq!(reread[0].category, "新書-待借");
}

#[test]
fn test_backups_taken_and_pruned_to_retention() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.xlsx");
    write_workbook(&path, &[("待借", &[&["海明威", "老人與海"][..]][..])]);

    let config = CatalogConfig {
        backup_retention: 2,
        ..CatalogConfig::default()
    };
    let mut store = BookStore::new(&path, config);

    let mut books = store.records(false).unwrap().books;
    for i in 0..4 {
        books[0].note = format!("edit {i}");
        let report = store.save(&books).unwrap();
        assert!(report.backup.is_some());
    }

    // Four saves made four distinct backups; pruning kept the newest two.
    let backups: Vec<_> = std::fs::read_dir(dir.path().join("backups"))
        .unwrap()
        .collect();
    assert_eq!(backups.len(), 2, "retention not enforced");
}
