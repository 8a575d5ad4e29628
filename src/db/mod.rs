//! Persistence module split across logical submodules.

mod connection;
mod seed;
mod songs;

pub use connection::{open_catalog, open_in_memory, watch_changes, ChangeTracker, Store};
pub use seed::{seed_initial_songs, starter_songs};
pub use songs::{
    count_distinct, count_songs, delete_song, fetch_all_songs, fetch_distinct,
    fetch_favorite_songs, fetch_song_by_id, fetch_songs_by_category, insert_song, insert_songs,
    search_songs, set_favorite, update_song,
};
