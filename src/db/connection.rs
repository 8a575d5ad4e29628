use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::hooks::Action;
use rusqlite::Connection;
use tracing::{debug, info};

/// Schema version stored in `PRAGMA user_version`.
const CURRENT_SCHEMA_VERSION: u32 = 1;

/// A freshly opened catalog database.
pub struct Store {
    pub conn: Connection,
    /// True when this open created the schema, i.e. the catalog is brand new
    /// and still needs its starter songs.
    pub created: bool,
}

/// Open (or create) the catalog at `path` and bring its schema up to date.
pub fn open_catalog(path: &Path) -> Result<Store> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
    }

    info!("Opening song catalog at {}", path.display());
    let conn = Connection::open(path).context("failed to open SQLite database")?;
    prepare(conn)
}

/// Open a throwaway catalog that lives only as long as the connection.
pub fn open_in_memory() -> Result<Store> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    prepare(conn)
}

fn prepare(mut conn: Connection) -> Result<Store> {
    let existing_version: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("failed to read schema version")?;

    let created = if existing_version < CURRENT_SCHEMA_VERSION {
        upgrade_schema(&mut conn, existing_version)?
    } else {
        false
    };

    Ok(Store { conn, created })
}

/// Returns true when the `songs` table did not exist before the upgrade.
fn upgrade_schema(conn: &mut Connection, existing_version: u32) -> Result<bool> {
    debug!(
        "Upgrading catalog schema from version {} to {}",
        existing_version, CURRENT_SCHEMA_VERSION
    );

    let tx = conn
        .transaction()
        .context("failed to start schema transaction")?;

    let table_exists: bool = tx
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'songs')",
            [],
            |row| row.get(0),
        )
        .context("failed to inspect existing tables")?;

    if !table_exists {
        tx.execute(
            "CREATE TABLE IF NOT EXISTS songs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                song_title TEXT NOT NULL,
                artist_name TEXT,
                album_name TEXT,
                lyricist_name TEXT,
                composer_name TEXT,
                era TEXT,
                genre TEXT,
                release_year INTEGER,
                lyrics TEXT,
                is_favorite INTEGER NOT NULL DEFAULT 0,
                audio_url TEXT,
                video_url TEXT,
                notes TEXT
            )",
            [],
        )
        .context("failed to create songs table")?;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to record schema version")?;
    tx.commit().context("failed to commit schema upgrade")?;
    Ok(!table_exists)
}

/// Monotonic counter bumped whenever a row of `songs` changes. Live queries
/// compare against it to decide whether they are stale.
#[derive(Clone, Default)]
pub struct ChangeTracker {
    revision: Arc<AtomicU64>,
}

impl ChangeTracker {
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn bump(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}

/// Register an SQLite update hook that feeds the returned tracker. Only one
/// hook can be installed per connection, so call this once.
pub fn watch_changes(conn: &Connection) -> ChangeTracker {
    let tracker = ChangeTracker::default();
    let hook_tracker = tracker.clone();
    conn.update_hook(Some(
        move |action: Action, _db: &str, table: &str, _rowid: i64| {
            let is_row_change = matches!(
                action,
                Action::SQLITE_INSERT | Action::SQLITE_UPDATE | Action::SQLITE_DELETE
            );
            if table == "songs" && is_row_change {
                hook_tracker.bump();
            }
        },
    ));
    tracker
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_reports_creation() {
        let store = open_in_memory().unwrap();
        assert!(store.created);

        let version: u32 = store
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn reopening_a_file_store_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.sqlite");

        let first = open_catalog(&path).unwrap();
        assert!(first.created);
        drop(first);

        let second = open_catalog(&path).unwrap();
        assert!(!second.created);
    }

    #[test]
    fn unversioned_existing_table_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.sqlite");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE songs (id INTEGER PRIMARY KEY AUTOINCREMENT, song_title TEXT NOT NULL);
                 INSERT INTO songs (song_title) VALUES ('পুরানো সেই দিনের কথা');",
            )
            .unwrap();
        }

        let store = open_catalog(&path).unwrap();
        assert!(!store.created);

        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        let version: u32 = store
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn hook_counts_writes_to_songs() {
        let store = open_in_memory().unwrap();
        let tracker = watch_changes(&store.conn);
        assert_eq!(tracker.revision(), 0);

        store
            .conn
            .execute("INSERT INTO songs (song_title) VALUES ('আমার সোনার বাংলা')", [])
            .unwrap();
        store
            .conn
            .execute("UPDATE songs SET is_favorite = 1 WHERE id = 1", [])
            .unwrap();

        assert_eq!(tracker.revision(), 2);
    }
}
