//! Single access point to the song catalog. The view-model only ever talks to
//! this type, never to the raw connection.

use anyhow::Result;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::{self, ChangeTracker, Store};
use crate::models::{CatalogStats, Category, NewSong, Song};

pub struct SongRepository {
    conn: Connection,
    changes: ChangeTracker,
}

impl SongRepository {
    pub fn new(conn: Connection) -> Self {
        let changes = db::watch_changes(&conn);
        Self { conn, changes }
    }

    /// Wrap an opened store, seeding it first when it was just created and
    /// `seed_on_create` allows it.
    pub fn from_store(store: Store, seed_on_create: bool) -> Result<Self> {
        let Store { mut conn, created } = store;
        if created && seed_on_create {
            db::seed_initial_songs(&mut conn)?;
        }
        Ok(Self::new(conn))
    }

    /// Current change revision. Moves forward on every write to `songs`.
    pub fn revision(&self) -> u64 {
        self.changes.revision()
    }

    pub fn all_songs(&self) -> Result<Vec<Song>> {
        db::fetch_all_songs(&self.conn)
    }

    pub fn favorite_songs(&self) -> Result<Vec<Song>> {
        db::fetch_favorite_songs(&self.conn)
    }

    pub fn song_by_id(&self, id: i64) -> Result<Option<Song>> {
        db::fetch_song_by_id(&self.conn, id)
    }

    /// A blank query matches the whole catalog.
    pub fn search_songs(&self, query: &str) -> Result<Vec<Song>> {
        if query.trim().is_empty() {
            return self.all_songs();
        }
        debug!("Searching catalog for {:?}", query);
        db::search_songs(&self.conn, query)
    }

    pub fn songs_by_category(&self, category: Category, name: &str) -> Result<Vec<Song>> {
        db::fetch_songs_by_category(&self.conn, category, name)
    }

    pub fn category_values(&self, category: Category) -> Result<Vec<String>> {
        db::fetch_distinct(&self.conn, category)
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        Ok(CatalogStats {
            songs: db::count_songs(&self.conn)?,
            artists: db::count_distinct(&self.conn, Category::Artist)?,
            lyricists: db::count_distinct(&self.conn, Category::Lyricist)?,
            composers: db::count_distinct(&self.conn, Category::Composer)?,
            eras: db::count_distinct(&self.conn, Category::Era)?,
            genres: db::count_distinct(&self.conn, Category::Genre)?,
        })
    }

    pub fn insert_song(&self, song: NewSong) -> Result<Song> {
        let song = db::insert_song(&self.conn, song)?;
        info!("Added song {} ({})", song.id, song.title);
        Ok(song)
    }

    pub fn insert_songs(&mut self, songs: Vec<NewSong>) -> Result<usize> {
        db::insert_songs(&mut self.conn, songs)
    }

    pub fn update_song(&self, song: &Song) -> Result<()> {
        db::update_song(&self.conn, song)
    }

    /// Persist the opposite favorite flag and return the updated song.
    pub fn toggle_favorite(&self, song: &Song) -> Result<Song> {
        let toggled = song.with_favorite_toggled();
        db::set_favorite(&self.conn, toggled.id, toggled.is_favorite)?;
        debug!(
            "Song {} favorite flag is now {}",
            toggled.id, toggled.is_favorite
        );
        Ok(toggled)
    }

    pub fn delete_song(&self, song: &Song) -> Result<()> {
        db::delete_song(&self.conn, song.id)?;
        info!("Deleted song {} ({})", song.id, song.title);
        Ok(())
    }

    /// Drop the `songs` table so every later read fails. Dropping a table does
    /// not fire the update hook, so the revision is moved by hand.
    #[cfg(test)]
    pub(crate) fn drop_songs_table(&self) -> Result<()> {
        self.conn.execute_batch("DROP TABLE songs")?;
        self.changes.bump();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn seeded() -> SongRepository {
        SongRepository::from_store(open_in_memory().unwrap(), true).unwrap()
    }

    #[test]
    fn seeding_respects_flag() {
        assert_eq!(seeded().stats().unwrap().songs, 12);

        let empty = SongRepository::from_store(open_in_memory().unwrap(), false).unwrap();
        assert_eq!(empty.stats().unwrap(), CatalogStats::default());
    }

    #[test]
    fn blank_search_returns_everything() {
        let repo = seeded();
        assert_eq!(repo.search_songs("   ").unwrap().len(), 12);
        assert_eq!(repo.search_songs("নজরুল").unwrap().len(), 2);
    }

    #[test]
    fn stats_count_distinct_people() {
        let stats = seeded().stats().unwrap();
        assert_eq!(stats.artists, 10);
        assert_eq!(stats.lyricists, 1);
        assert_eq!(stats.composers, 1);
        assert_eq!(stats.genres, 6);
    }

    #[test]
    fn writes_advance_the_revision() {
        let repo = seeded();
        let before = repo.revision();

        let song = repo.insert_song(NewSong::titled("নতুন গান")).unwrap();
        let after_insert = repo.revision();
        assert!(after_insert > before);

        let toggled = repo.toggle_favorite(&song).unwrap();
        assert!(toggled.is_favorite);
        assert!(repo.revision() > after_insert);
        assert_eq!(repo.favorite_songs().unwrap(), vec![toggled.clone()]);

        let reads_revision = repo.revision();
        repo.all_songs().unwrap();
        assert_eq!(repo.revision(), reads_revision);

        repo.delete_song(&toggled).unwrap();
        assert!(repo.revision() > reads_revision);
        assert_eq!(repo.song_by_id(toggled.id).unwrap(), None);
    }

    #[test]
    fn category_browsing_matches_listing() {
        let repo = seeded();
        let artists = repo.category_values(Category::Artist).unwrap();
        assert!(artists.contains(&"রবীন্দ্রনাথ ঠাকুর".to_string()));

        let tagore = repo
            .songs_by_category(Category::Artist, "রবীন্দ্রনাথ ঠাকুর")
            .unwrap();
        assert_eq!(tagore.len(), 2);
    }
}
