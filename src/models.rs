//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. These stay light-weight data holders so other layers can focus on
//! presentation and persistence logic.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Placeholder shown wherever an artist is missing.
pub const UNKNOWN_ARTIST: &str = "অজানা";

#[derive(Debug, Clone, PartialEq, Eq)]
/// One row of the `songs` table.
pub struct Song {
    /// Primary key from the SQLite store.
    pub id: i64,
    /// Title displayed in lists and search results.
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub lyricist: Option<String>,
    pub composer: Option<String>,
    /// Period the song belongs to (চর্যাপদ, মধ্যযুগ, আধুনিক ...).
    pub era: Option<String>,
    /// Style of the song (রবীন্দ্রসঙ্গীত, নজরুলগীতি, লোকগীতি ...).
    pub genre: Option<String>,
    pub release_year: Option<i32>,
    pub lyrics: Option<String>,
    pub is_favorite: bool,
    /// Optional media references. Kept as raw text so non-web references
    /// survive as well.
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    /// Free-form background about the song.
    pub notes: Option<String>,
}

impl Song {
    /// Artist name for display, falling back to [`UNKNOWN_ARTIST`].
    pub fn display_artist(&self) -> &str {
        non_blank(self.artist.as_deref()).unwrap_or(UNKNOWN_ARTIST)
    }

    /// Value of the field a category groups by, if the song has one.
    pub fn category_value(&self, category: Category) -> Option<&str> {
        let value = match category {
            Category::Artist => self.artist.as_deref(),
            Category::Lyricist => self.lyricist.as_deref(),
            Category::Composer => self.composer.as_deref(),
            Category::Era => self.era.as_deref(),
            Category::Genre => self.genre.as_deref(),
        };
        non_blank(value)
    }

    pub fn with_favorite_toggled(&self) -> Song {
        Song {
            is_favorite: !self.is_favorite,
            ..self.clone()
        }
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.display_artist())
    }
}

/// A song that has not been persisted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSong {
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub lyricist: Option<String>,
    pub composer: Option<String>,
    pub era: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
    pub lyrics: Option<String>,
    pub is_favorite: bool,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub notes: Option<String>,
}

impl NewSong {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Attach the primary key assigned by the store.
    pub fn into_song(self, id: i64) -> Song {
        Song {
            id,
            title: self.title,
            artist: self.artist,
            album: self.album,
            lyricist: self.lyricist,
            composer: self.composer,
            era: self.era,
            genre: self.genre,
            release_year: self.release_year,
            lyrics: self.lyrics,
            is_favorite: self.is_favorite,
            audio_url: self.audio_url,
            video_url: self.video_url,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown category type '{0}'")]
pub struct CategoryError(pub String);

/// The song attributes the catalog can be browsed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Artist,
    Lyricist,
    Composer,
    Era,
    Genre,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Artist,
        Category::Lyricist,
        Category::Composer,
        Category::Era,
        Category::Genre,
    ];

    /// Key used inside route strings.
    pub fn key(self) -> &'static str {
        match self {
            Category::Artist => "artist",
            Category::Lyricist => "lyricist",
            Category::Composer => "composer",
            Category::Era => "era",
            Category::Genre => "genre",
        }
    }

    /// Backing column in the `songs` table. Only ever interpolated from this
    /// fixed set, never from user input.
    pub fn column(self) -> &'static str {
        match self {
            Category::Artist => "artist_name",
            Category::Lyricist => "lyricist_name",
            Category::Composer => "composer_name",
            Category::Era => "era",
            Category::Genre => "genre",
        }
    }

    /// Short label used on home tiles and in the detail view.
    pub fn label(self) -> &'static str {
        match self {
            Category::Artist => "শিল্পী",
            Category::Lyricist => "গীতিকার",
            Category::Composer => "সুরকার",
            Category::Era => "যুগ",
            Category::Genre => "ধরণ",
        }
    }

    /// Title of the value list screen.
    pub fn list_title(self) -> &'static str {
        match self {
            Category::Artist => "শিল্পীর তালিকা",
            Category::Lyricist => "গীতিকারের তালিকা",
            Category::Composer => "সুরকারের তালিকা",
            Category::Era => "যুগের তালিকা",
            Category::Genre => "ধরনের তালিকা",
        }
    }

    pub fn from_key(key: &str) -> Result<Self, CategoryError> {
        Category::ALL
            .into_iter()
            .find(|category| category.key() == key)
            .ok_or_else(|| CategoryError(key.to_string()))
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_key(s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Headline numbers shown on the home screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub songs: i64,
    pub artists: i64,
    pub lyricists: i64,
    pub composers: i64,
    pub eras: i64,
    pub genres: i64,
}

/// Treat empty and whitespace-only strings the same as a missing value.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_artist_falls_back_to_unknown() {
        let mut song = NewSong::titled("পুরানো সেই দিনের কথা").into_song(1);
        assert_eq!(song.display_artist(), UNKNOWN_ARTIST);

        song.artist = Some("   ".into());
        assert_eq!(song.display_artist(), UNKNOWN_ARTIST);

        song.artist = Some("রবীন্দ্রনাথ ঠাকুর".into());
        assert_eq!(song.display_artist(), "রবীন্দ্রনাথ ঠাকুর");
    }

    #[test]
    fn toggling_favorite_leaves_other_fields_alone() {
        let mut song = NewSong::titled("চল্‌ চল্‌ চল্‌").into_song(7);
        song.genre = Some("নজরুলগীতি".into());

        let toggled = song.with_favorite_toggled();
        assert!(toggled.is_favorite);
        assert_eq!(toggled.id, 7);
        assert_eq!(toggled.genre, song.genre);
        assert!(!toggled.with_favorite_toggled().is_favorite);
    }

    #[test]
    fn category_keys_parse_back() {
        for category in Category::ALL {
            assert_eq!(category.key().parse::<Category>(), Ok(category));
        }
        assert_eq!(
            Category::from_key("album"),
            Err(CategoryError("album".to_string()))
        );
    }

    #[test]
    fn category_value_reads_matching_field() {
        let mut song = NewSong::titled("কফি হাউসের সেই আড্ডাটা").into_song(2);
        song.lyricist = Some("গৌরীপ্রসন্ন মজুমদার".into());
        song.era = Some("".into());

        assert_eq!(
            song.category_value(Category::Lyricist),
            Some("গৌরীপ্রসন্ন মজুমদার")
        );
        assert_eq!(song.category_value(Category::Era), None);
        assert_eq!(song.category_value(Category::Composer), None);
    }
}
