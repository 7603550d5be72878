//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `writeit_core` wiring against
//!   a real on-disk store.
//! - Keep output deterministic for quick local sanity checks.

use std::error::Error;
use std::path::{Path, PathBuf};
use writeit_core::db::open_db;
use writeit_core::{SqliteSnapshotRepository, StoryStore};

const DB_FILE_NAME: &str = "writeit.sqlite3";

fn main() {
    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("writeit-data"));

    if let Err(err) = run(&data_dir) {
        eprintln!("writeit: {err}");
        std::process::exit(1);
    }
}

fn run(data_dir: &Path) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(data_dir)?;
    let conn = open_db(data_dir.join(DB_FILE_NAME))?;
    let repo = SqliteSnapshotRepository::try_new(&conn)?;
    let store = StoryStore::open(repo)?;

    println!("writeit_core version={}", writeit_core::core_version());
    println!("data_dir={}", data_dir.display());
    println!("stories={}", store.list_stories().len());
    Ok(())
}
