use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, Row};

use crate::models::{Category, NewSong, Song};

/// Column list shared by every song query so `song_from_row` can read by
/// position.
const SONG_COLUMNS: &str = "id, song_title, artist_name, album_name, lyricist_name, \
     composer_name, era, genre, release_year, lyrics, is_favorite, audio_url, video_url, notes";

fn song_from_row(row: &Row<'_>) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        album: row.get(3)?,
        lyricist: row.get(4)?,
        composer: row.get(5)?,
        era: row.get(6)?,
        genre: row.get(7)?,
        release_year: row.get(8)?,
        lyrics: row.get(9)?,
        is_favorite: row.get(10)?,
        audio_url: row.get(11)?,
        video_url: row.get(12)?,
        notes: row.get(13)?,
    })
}

fn query_songs<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    what: &str,
) -> Result<Vec<Song>> {
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("failed to prepare {what} query"))?;

    let songs = stmt
        .query_map(params, song_from_row)
        .with_context(|| format!("failed to iterate {what}"))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to collect {what}"))?;

    Ok(songs)
}

/// Every song, ordered by title.
pub fn fetch_all_songs(conn: &Connection) -> Result<Vec<Song>> {
    let sql = format!("SELECT {SONG_COLUMNS} FROM songs ORDER BY song_title ASC");
    query_songs(conn, &sql, [], "all songs")
}

pub fn fetch_song_by_id(conn: &Connection, id: i64) -> Result<Option<Song>> {
    let sql = format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?1");
    let mut songs = query_songs(conn, &sql, [id], "song by id")?;
    Ok(songs.pop())
}

/// Favorites only, ordered by title.
pub fn fetch_favorite_songs(conn: &Connection) -> Result<Vec<Song>> {
    let sql =
        format!("SELECT {SONG_COLUMNS} FROM songs WHERE is_favorite = 1 ORDER BY song_title ASC");
    query_songs(conn, &sql, [], "favorite songs")
}

/// Escape LIKE wildcards so user input only ever matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Case-insensitive substring search over title, artist, album, lyricist,
/// composer, genre and era.
pub fn search_songs(conn: &Connection, query: &str) -> Result<Vec<Song>> {
    let searchable = [
        "song_title",
        "artist_name",
        "album_name",
        "lyricist_name",
        "composer_name",
        "genre",
        "era",
    ];
    let predicate = searchable
        .iter()
        .map(|column| format!("LOWER({column}) LIKE '%' || LOWER(?1) || '%' ESCAPE '\\'"))
        .collect::<Vec<_>>()
        .join(" OR ");
    let sql = format!("SELECT {SONG_COLUMNS} FROM songs WHERE {predicate} ORDER BY song_title ASC");
    query_songs(conn, &sql, [escape_like(query)], "search results")
}

/// Songs whose category column equals `name`, ignoring ASCII case and
/// surrounding whitespace.
pub fn fetch_songs_by_category(
    conn: &Connection,
    category: Category,
    name: &str,
) -> Result<Vec<Song>> {
    let sql = format!(
        "SELECT {SONG_COLUMNS} FROM songs WHERE LOWER(TRIM({column})) = LOWER(TRIM(?1)) ORDER BY song_title ASC",
        column = category.column()
    );
    query_songs(conn, &sql, [name], "songs by category")
}

pub fn count_songs(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))
        .context("failed to count songs")
}

/// Number of distinct, non-empty values in a category column.
pub fn count_distinct(conn: &Connection, category: Category) -> Result<i64> {
    let column = category.column();
    let sql = format!(
        "SELECT COUNT(DISTINCT {column}) FROM songs WHERE {column} IS NOT NULL AND {column} != ''"
    );
    conn.query_row(&sql, [], |row| row.get(0))
        .with_context(|| format!("failed to count distinct {category} values"))
}

/// Sorted distinct, non-empty values of a category column.
pub fn fetch_distinct(conn: &Connection, category: Category) -> Result<Vec<String>> {
    let column = category.column();
    let sql = format!(
        "SELECT DISTINCT {column} FROM songs
         WHERE {column} IS NOT NULL AND {column} != ''
         ORDER BY {column} ASC"
    );
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("failed to prepare {category} list query"))?;

    let mut rows = stmt
        .query([])
        .with_context(|| format!("failed to execute {category} list query"))?;

    let mut values = Vec::new();
    while let Some(row) = rows.next().context("failed to fetch category row")? {
        let value: String = row.get(0).context("failed to read category value")?;
        values.push(value);
    }

    Ok(values)
}

/// Insert a song, replacing nothing since ids are always generated. Returns the
/// hydrated row so callers can skip a re-query.
pub fn insert_song(conn: &Connection, song: NewSong) -> Result<Song> {
    conn.execute(
        "INSERT OR REPLACE INTO songs (
            song_title, artist_name, album_name, lyricist_name, composer_name, era, genre,
            release_year, lyrics, is_favorite, audio_url, video_url, notes
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            song.title,
            song.artist,
            song.album,
            song.lyricist,
            song.composer,
            song.era,
            song.genre,
            song.release_year,
            song.lyrics,
            song.is_favorite,
            song.audio_url,
            song.video_url,
            song.notes,
        ],
    )
    .context("failed to insert song")?;

    let id = conn.last_insert_rowid();
    Ok(song.into_song(id))
}

/// Insert many songs atomically.
pub fn insert_songs(conn: &mut Connection, songs: Vec<NewSong>) -> Result<usize> {
    let tx = conn.transaction().context("failed to start insert batch")?;
    let count = songs.len();
    for song in songs {
        insert_song(&tx, song)?;
    }
    tx.commit().context("failed to commit insert batch")?;
    Ok(count)
}

/// Overwrite every editable column of an existing song.
pub fn update_song(conn: &Connection, song: &Song) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE songs SET
                song_title = ?1, artist_name = ?2, album_name = ?3, lyricist_name = ?4,
                composer_name = ?5, era = ?6, genre = ?7, release_year = ?8, lyrics = ?9,
                is_favorite = ?10, audio_url = ?11, video_url = ?12, notes = ?13
             WHERE id = ?14",
            params![
                song.title,
                song.artist,
                song.album,
                song.lyricist,
                song.composer,
                song.era,
                song.genre,
                song.release_year,
                song.lyrics,
                song.is_favorite,
                song.audio_url,
                song.video_url,
                song.notes,
                song.id,
            ],
        )
        .context("failed to update song")?;

    if updated == 0 {
        Err(anyhow!("Song not found"))
    } else {
        Ok(())
    }
}

pub fn set_favorite(conn: &Connection, id: i64, favorite: bool) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE songs SET is_favorite = ?1 WHERE id = ?2",
            params![favorite, id],
        )
        .context("failed to update favorite flag")?;

    if updated == 0 {
        Err(anyhow!("Song not found"))
    } else {
        Ok(())
    }
}

pub fn delete_song(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM songs WHERE id = ?1", params![id])
        .context("failed to delete song")?;

    if deleted == 0 {
        Err(anyhow!("Song not found"))
    } else {
        Ok(())
    }
}
