//! Presentation state for the catalog screens.
//!
//! `SongViewModel` owns the repository and a set of [`LiveQuery`] values.
//! The UI calls [`SongViewModel::sync`] once per tick; writes go through the
//! mutation methods and show up on the following sync via the change
//! revision, never by patching state by hand.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, error};

use crate::live::LiveQuery;
use crate::models::{CatalogStats, Category, NewSong, Song};
use crate::repository::SongRepository;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Everything the home and song list screens render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongUiState {
    pub all_songs: Vec<Song>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub total_songs: i64,
    pub total_artists: i64,
    pub total_lyricists: i64,
    pub total_composers: i64,
    pub total_eras: i64,
    pub total_genres: i64,
}

impl Default for SongUiState {
    fn default() -> Self {
        Self {
            all_songs: Vec::new(),
            is_loading: true,
            error_message: None,
            total_songs: 0,
            total_artists: 0,
            total_lyricists: 0,
            total_composers: 0,
            total_eras: 0,
            total_genres: 0,
        }
    }
}

/// Debounced search input plus the query that was last sent to the store.
struct SearchState {
    query: String,
    edited_at: Option<Instant>,
    applied: Option<String>,
    results: LiveQuery<Vec<Song>>,
}

pub struct SongViewModel {
    repo: SongRepository,
    songs: LiveQuery<Vec<Song>>,
    stats: LiveQuery<CatalogStats>,
    favorites: LiveQuery<Vec<Song>>,
    category_values: HashMap<Category, LiveQuery<Vec<String>>>,
    search: SearchState,
    search_debounce: Duration,
    selected_category: Option<(Category, String)>,
    category_songs: LiveQuery<Vec<Song>>,
    selected_song_id: Option<i64>,
    selected_song: LiveQuery<Option<Song>>,
    ui_state: SongUiState,
}

impl SongViewModel {
    pub fn new(repo: SongRepository, search_debounce: Duration) -> Self {
        let category_values = Category::ALL
            .into_iter()
            .map(|category| (category, LiveQuery::default()))
            .collect();

        Self {
            repo,
            songs: LiveQuery::default(),
            stats: LiveQuery::default(),
            favorites: LiveQuery::default(),
            category_values,
            search: SearchState {
                query: String::new(),
                edited_at: None,
                applied: None,
                results: LiveQuery::default(),
            },
            search_debounce,
            selected_category: None,
            category_songs: LiveQuery::default(),
            selected_song_id: None,
            selected_song: LiveQuery::default(),
            ui_state: SongUiState::default(),
        }
    }

    /// Bring every stale query up to date and apply the search input once it
    /// has been quiet for the debounce window.
    pub fn sync(&mut self, now: Instant) {
        let songs_ran = self.songs.refresh(&self.repo, |repo| repo.all_songs());
        let stats_ran = self.stats.refresh(&self.repo, |repo| repo.stats());
        if songs_ran || stats_ran {
            self.rebuild_ui_state();
        }

        self.favorites
            .refresh(&self.repo, |repo| repo.favorite_songs());

        for (category, values) in self.category_values.iter_mut() {
            let category = *category;
            values.refresh(&self.repo, |repo| repo.category_values(category));
        }

        self.sync_search(now);

        if let Some((category, name)) = &self.selected_category {
            self.category_songs
                .refresh(&self.repo, |repo| repo.songs_by_category(*category, name));
        }

        if let Some(id) = self.selected_song_id {
            self.selected_song
                .refresh(&self.repo, |repo| repo.song_by_id(id));
        }
    }

    fn rebuild_ui_state(&mut self) {
        let error_message = self
            .songs
            .error()
            .or_else(|| self.stats.error())
            .map(str::to_string);
        if let Some(message) = &error_message {
            error!("Error loading song catalog: {message}");
        }

        let stats = *self.stats.get();
        self.ui_state = SongUiState {
            all_songs: self.songs.get().clone(),
            is_loading: false,
            error_message,
            total_songs: stats.songs,
            total_artists: stats.artists,
            total_lyricists: stats.lyricists,
            total_composers: stats.composers,
            total_eras: stats.eras,
            total_genres: stats.genres,
        };
    }

    fn sync_search(&mut self, now: Instant) {
        if let Some(edited_at) = self.search.edited_at {
            if now.saturating_duration_since(edited_at) >= self.search_debounce {
                self.search.edited_at = None;
                if self.search.applied.as_deref() != Some(self.search.query.as_str()) {
                    debug!("Applying search query {:?}", self.search.query);
                    self.search.applied = Some(self.search.query.clone());
                    self.search.results.invalidate();
                }
            }
        }

        let Some(query) = self.search.applied.as_deref() else {
            return;
        };
        self.search.results.refresh(&self.repo, |repo| {
            if query.trim().is_empty() {
                return Ok(Vec::new());
            }
            Ok(repo.search_songs(query).unwrap_or_else(|err| {
                error!("Search for {query:?} failed: {err:#}");
                Vec::new()
            }))
        });
    }

    pub fn ui_state(&self) -> &SongUiState {
        &self.ui_state
    }

    pub fn favorite_songs(&self) -> &[Song] {
        self.favorites.get()
    }

    pub fn category_values(&self, category: Category) -> &[String] {
        self.category_values
            .get(&category)
            .map(|values| values.get().as_slice())
            .unwrap_or_default()
    }

    pub fn current_search_query(&self) -> &str {
        &self.search.query
    }

    /// Results for the last applied query. Empty while the query is blank.
    pub fn search_results(&self) -> &[Song] {
        if self.search.applied.is_none() {
            return &[];
        }
        self.search.results.get()
    }

    /// True while typed input is still waiting out the debounce.
    pub fn is_search_pending(&self) -> bool {
        self.search.edited_at.is_some()
    }

    pub fn selected_category(&self) -> Option<(Category, &str)> {
        self.selected_category
            .as_ref()
            .map(|(category, name)| (*category, name.as_str()))
    }

    /// Songs for the selected category, empty until one is selected.
    pub fn songs_by_selected_category(&self) -> &[Song] {
        if self.selected_category.is_none() {
            return &[];
        }
        self.category_songs.get()
    }

    /// True until the selected category's songs have been loaded once.
    pub fn is_category_loading(&self) -> bool {
        self.selected_category.is_some() && self.category_songs.is_pending()
    }

    /// The song picked for the detail screen, kept current across writes.
    pub fn selected_song(&self) -> Option<&Song> {
        self.selected_song.get().as_ref()
    }

    pub fn is_song_loading(&self) -> bool {
        self.selected_song_id.is_some() && self.selected_song.is_pending()
    }

    pub fn add_song(&mut self, song: NewSong) -> Result<Song> {
        self.repo.insert_song(song)
    }

    pub fn toggle_favorite_status(&mut self, song: &Song) -> Result<Song> {
        self.repo.toggle_favorite(song)
    }

    pub fn delete_song(&mut self, song: &Song) -> Result<()> {
        self.repo.delete_song(song)
    }

    pub fn get_song_by_id(&self, id: i64) -> Result<Option<Song>> {
        self.repo.song_by_id(id)
    }

    /// Record new search input. The store is queried on a later `sync` once
    /// the input has settled.
    pub fn search_songs(&mut self, query: impl Into<String>, now: Instant) {
        self.search.query = query.into();
        self.search.edited_at = Some(now);
    }

    /// Follow one song for the detail screen.
    pub fn load_song(&mut self, id: i64) {
        if self.selected_song_id != Some(id) {
            self.selected_song_id = Some(id);
            self.selected_song = LiveQuery::default();
        }
    }

    #[cfg(test)]
    pub(crate) fn repository(&self) -> &SongRepository {
        &self.repo
    }

    pub fn load_songs_for_category(&mut self, category: Category, name: impl Into<String>) {
        let name = name.into();
        let unchanged = self
            .selected_category
            .as_ref()
            .is_some_and(|(current, current_name)| *current == category && *current_name == name);
        if unchanged {
            return;
        }
        self.selected_category = Some((category, name));
        self.category_songs = LiveQuery::default();
    }
}
