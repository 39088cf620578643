//! # shelfmark-cli
//!
//! Thin command-line driver for the shelfmark catalog. All the real work
//! happens in `shelfmark-store`; this binary only parses arguments and
//! prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shelfmark_store::{Library, NewBook};
use shelfmark_types::{Book, BookPatch, CatalogConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// shelfmark - a spreadsheet-backed book catalog
#[derive(Parser)]
#[command(name = "shelfmark")]
#[command(author, version, about = "Manage a spreadsheet-backed book catalog", long_about = None)]
struct Cli {
    /// Catalog workbook path
    #[arg(long, default_value = "圖書館借書清單.xlsx")]
    file: PathBuf,

    /// Activity ledger path
    #[arg(long, default_value = "activity.json")]
    ledger: PathBuf,

    /// Optional catalog config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List records, optionally filtered by category
    List {
        /// Only this category
        #[arg(long)]
        category: Option<String>,
        /// Bypass the cache and reparse the workbook
        #[arg(long)]
        force: bool,
        /// Emit JSON instead of plain lines
        #[arg(long)]
        json: bool,
    },
    /// Add a record
    Add {
        title: String,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Edit a record's fields
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Move a record to another category
    Move { id: u64, category: String },
    /// Delete a record
    Remove { id: u64 },
    /// Catalog statistics
    Stats,
    /// Today's activity
    Activities,
}

fn print_book(book: &Book) {
    let mut line = format!("#{:<4} [{}] {} / {}", book.id, book.category, book.title, book.author);
    if !book.date.is_empty() {
        line.push_str(&format!(" (到期 {})", book.date));
    }
    if !book.note.is_empty() {
        line.push_str(&format!(" [{}]", book.note));
    }
    println!("{line}");
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let config = match &cli.config {
        Some(path) => CatalogConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CatalogConfig::default(),
    };

    let mut library = Library::open(&cli.file, &cli.ledger, config)
        .with_context(|| format!("opening catalog {}", cli.file.display()))?;

    match cli.command {
        Command::List {
            category,
            force,
            json,
        } => {
            let books = library.books(force)?;
            let books: Vec<Book> = books
                .into_iter()
                .filter(|b| category.as_deref().map_or(true, |c| b.category == c))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&books)?);
            } else {
                for book in &books {
                    print_book(book);
                }
                println!("{} 本", books.len());
            }
        }
        Command::Add {
            title,
            author,
            category,
            date,
            note,
        } => {
            let book = library.add(NewBook {
                title,
                author,
                category,
                date,
                note,
            })?;
            print_book(&book);
        }
        Command::Edit {
            id,
            title,
            author,
            category,
            date,
            note,
        } => {
            let book = library.update(
                id,
                &BookPatch {
                    title,
                    author,
                    category,
                    date,
                    note,
                },
            )?;
            print_book(&book);
        }
        Command::Move { id, category } => {
            let book = library.move_to(id, &category)?;
            print_book(&book);
        }
        Command::Remove { id } => {
            let book = library.remove(id)?;
            println!("removed #{} {}", book.id, book.title);
        }
        Command::Stats => {
            let stats = library.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Activities => {
            let (entries, stats) = library.activities();
            for entry in &entries {
                let mut line = format!(
                    "{} {} #{} {}",
                    entry.timestamp, entry.action, entry.book_id, entry.title
                );
                if let Some(from) = &entry.from_category {
                    line.push_str(&format!(" ({from} → {})", entry.category));
                }
                for change in &entry.changes {
                    line.push_str(&format!(" {}: {:?} → {:?}", change.field, change.old, change.new));
                }
                println!("{line}");
            }
            println!(
                "today: {} added, {} edited, {} deleted, {} moved",
                stats.adds, stats.edits, stats.deletes, stats.moves
            );
        }
    }

    Ok(())
}
