//! Screen addresses and the back stack that moves between them.
//!
//! Every screen has a string form (`song_detail/3`,
//! `songs_by_category/artist/<name>` ...) so a start screen can be given on the
//! command line and so titles can be derived from one place. Free-text
//! arguments are form-URL-encoded.

use std::fmt;

use thiserror::Error;
use url::form_urlencoded;

use crate::models::{Category, CategoryError};

const HOME: &str = "home";
const SONG_LIST: &str = "song_list";
const SONG_DETAIL: &str = "song_detail";
const SEARCH: &str = "search";
const SEARCH_ARG_QUERY: &str = "query";
const SEARCH_ARG_TYPE: &str = "type";
const FAVORITES: &str = "favorites";
const SONGS_BY_CATEGORY: &str = "songs_by_category";
const LIST_SUFFIX: &str = "_list";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("unknown route '{0}'")]
    Unknown(String),
    #[error("song id '{0}' is not a number")]
    InvalidSongId(String),
    #[error("route '{route}' is missing its {argument}")]
    MissingArgument {
        route: String,
        argument: &'static str,
    },
    #[error(transparent)]
    Category(#[from] CategoryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    SongList,
    SongDetail {
        song_id: i64,
    },
    /// `kind` is a hint from the home tiles about what the user came to look
    /// for; results are not filtered by it.
    Search {
        query: String,
        kind: String,
    },
    Favorites,
    CategoryList(Category),
    SongsByCategory {
        category: Category,
        name: String,
    },
}

fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Decode one form-encoded component. A lone component parses as a key with
/// an empty value, since `&` and `=` inside it are always escaped.
fn decode_component(value: &str) -> String {
    form_urlencoded::parse(value.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

impl Route {
    pub fn search(query: impl Into<String>, kind: impl Into<String>) -> Self {
        Route::Search {
            query: query.into(),
            kind: kind.into(),
        }
    }

    pub fn songs_by_category(category: Category, name: impl Into<String>) -> Self {
        Route::SongsByCategory {
            category,
            name: name.into(),
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Home => HOME.to_string(),
            Route::SongList => SONG_LIST.to_string(),
            Route::SongDetail { song_id } => format!("{SONG_DETAIL}/{song_id}"),
            Route::Search { query, kind } => format!(
                "{SEARCH}?{SEARCH_ARG_QUERY}={}&{SEARCH_ARG_TYPE}={}",
                encode_component(query),
                encode_component(kind)
            ),
            Route::Favorites => FAVORITES.to_string(),
            Route::CategoryList(category) => format!("{}{LIST_SUFFIX}", category.key()),
            Route::SongsByCategory { category, name } => format!(
                "{SONGS_BY_CATEGORY}/{}/{}",
                category.key(),
                encode_component(name)
            ),
        }
    }

    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let path = path.trim();
        let (base, query_string) = match path.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (path, None),
        };

        if base == SEARCH {
            let mut query = String::new();
            let mut kind = String::new();
            for (key, value) in form_urlencoded::parse(query_string.unwrap_or("").as_bytes()) {
                match key.as_ref() {
                    SEARCH_ARG_QUERY => query = value.into_owned(),
                    SEARCH_ARG_TYPE => kind = value.into_owned(),
                    _ => {}
                }
            }
            return Ok(Route::Search { query, kind });
        }

        if query_string.is_some() {
            return Err(RouteError::Unknown(path.to_string()));
        }

        let mut segments = base.splitn(3, '/');
        let head = segments.next().unwrap_or_default();
        match head {
            HOME => Ok(Route::Home),
            SONG_LIST => Ok(Route::SongList),
            FAVORITES => Ok(Route::Favorites),
            SONG_DETAIL => {
                let raw = segments.next().ok_or_else(|| RouteError::MissingArgument {
                    route: path.to_string(),
                    argument: "song id",
                })?;
                let song_id = raw
                    .parse::<i64>()
                    .map_err(|_| RouteError::InvalidSongId(raw.to_string()))?;
                Ok(Route::SongDetail { song_id })
            }
            SONGS_BY_CATEGORY => {
                let missing = |argument| RouteError::MissingArgument {
                    route: path.to_string(),
                    argument,
                };
                let key = segments.next().ok_or_else(|| missing("category type"))?;
                let category = Category::from_key(key)?;
                let name = segments.next().ok_or_else(|| missing("category name"))?;
                Ok(Route::SongsByCategory {
                    category,
                    name: decode_component(name),
                })
            }
            other => match other.strip_suffix(LIST_SUFFIX) {
                Some(key) if segments.next().is_none() => {
                    Ok(Route::CategoryList(Category::from_key(key)?))
                }
                _ => Err(RouteError::Unknown(path.to_string())),
            },
        }
    }

    /// Title shown in the top bar while this route is current.
    pub fn title(&self) -> String {
        match self {
            Route::Home => "বাংলা গানের সংগ্রহ".to_string(),
            Route::SongList => "সব গান".to_string(),
            Route::Favorites => "পছন্দের গান".to_string(),
            Route::Search { .. } => "গান খুঁজুন".to_string(),
            Route::CategoryList(category) => category.list_title().to_string(),
            Route::SongsByCategory { name, .. } => {
                if name.trim().is_empty() {
                    "গান".to_string()
                } else {
                    name.clone()
                }
            }
            Route::SongDetail { .. } => "গানের বিবরণ".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

/// Back stack of visited routes. The bottom entry is always `Home`.
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            stack: vec![Route::Home],
        }
    }
}

impl Navigator {
    /// Start on `route`, with `Home` underneath so back still works.
    pub fn starting_at(route: Route) -> Self {
        let mut navigator = Self::default();
        navigator.navigate(route);
        navigator
    }

    pub fn current(&self) -> &Route {
        self.stack.last().unwrap_or(&Route::Home)
    }

    /// Routes on the back stack, bottom first.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.stack.iter()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Push `route` unless it is already on top.
    pub fn navigate(&mut self, route: Route) {
        if self.current() == &route {
            return;
        }
        self.stack.push(route);
    }

    /// Switch between the top-level screens (home, all songs, favorites).
    /// Everything above `Home` is dropped first, so these screens always sit
    /// directly on top of it.
    pub fn navigate_top_level(&mut self, route: Route) {
        self.stack.truncate(1);
        if route != Route::Home {
            self.stack.push(route);
        }
    }

    /// Pop the current route. Returns false when already at the bottom.
    pub fn navigate_up(&mut self) -> bool {
        if self.can_navigate_up() {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    pub fn can_navigate_up(&self) -> bool {
        self.stack.len() > 1 && self.current() != &Route::Home
    }

    /// Swap the most recent search entry, and anything above it, for a search
    /// with a new query.
    pub fn replace_search(&mut self, query: impl Into<String>) {
        if let Some(index) = self
            .stack
            .iter()
            .rposition(|route| matches!(route, Route::Search { .. }))
        {
            if index > 0 {
                self.stack.truncate(index);
            }
        }
        self.navigate(Route::search(query, ""));
    }

    pub fn title(&self) -> String {
        self.current().title()
    }

    /// The search shortcut is hidden on screens where it would be noise.
    pub fn shows_search_shortcut(&self) -> bool {
        !matches!(
            self.current(),
            Route::SongDetail { .. } | Route::Search { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_route_strings() {
        assert_eq!(Route::Home.to_path(), "home");
        assert_eq!(Route::SongDetail { song_id: 42 }.to_path(), "song_detail/42");
        assert_eq!(
            Route::CategoryList(Category::Lyricist).to_path(),
            "lyricist_list"
        );
        assert_eq!(
            Route::search("a b&c", "song").to_path(),
            "search?query=a+b%26c&type=song"
        );
        assert_eq!(
            Route::songs_by_category(Category::Genre, "folk/baul").to_path(),
            "songs_by_category/genre/folk%2Fbaul"
        );
    }

    #[test]
    fn parses_what_it_builds() {
        let routes = [
            Route::Home,
            Route::SongList,
            Route::Favorites,
            Route::SongDetail { song_id: 7 },
            Route::search("রবীন্দ্র & নজরুল", "song"),
            Route::CategoryList(Category::Era),
            Route::songs_by_category(Category::Artist, "হেমন্ত মুখোপাধ্যায়, সন্ধ্যা মুখোপাধ্যায়"),
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.to_path()), Ok(route));
        }
    }

    #[test]
    fn search_arguments_default_to_empty() {
        assert_eq!(Route::parse("search"), Ok(Route::search("", "")));
        assert_eq!(
            Route::parse("search?query=baul"),
            Ok(Route::search("baul", ""))
        );
    }

    #[test]
    fn rejects_malformed_routes() {
        assert_eq!(
            Route::parse("song_detail/abc"),
            Err(RouteError::InvalidSongId("abc".into()))
        );
        assert!(matches!(
            Route::parse("song_detail"),
            Err(RouteError::MissingArgument { .. })
        ));
        assert_eq!(
            Route::parse("album_list"),
            Err(RouteError::Category(CategoryError("album".into())))
        );
        assert!(matches!(
            Route::parse("songs_by_category/album/x"),
            Err(RouteError::Category(_))
        ));
        assert_eq!(
            Route::parse("settings"),
            Err(RouteError::Unknown("settings".into()))
        );
    }

    #[test]
    fn titles_follow_current_route() {
        let mut nav = Navigator::default();
        assert_eq!(nav.title(), "বাংলা গানের সংগ্রহ");
        assert!(!nav.can_navigate_up());

        nav.navigate(Route::songs_by_category(Category::Artist, "মান্না দে"));
        assert_eq!(nav.title(), "মান্না দে");
        assert!(nav.shows_search_shortcut());

        nav.navigate(Route::SongDetail { song_id: 1 });
        assert_eq!(nav.title(), "গানের বিবরণ");
        assert!(!nav.shows_search_shortcut());
    }

    #[test]
    fn navigate_is_single_top() {
        let mut nav = Navigator::default();
        nav.navigate(Route::Favorites);
        nav.navigate(Route::Favorites);
        assert_eq!(nav.depth(), 2);

        assert!(nav.navigate_up());
        assert!(!nav.navigate_up());
        assert_eq!(nav.current(), &Route::Home);
    }

    #[test]
    fn top_level_screens_sit_on_home() {
        let mut nav = Navigator::default();
        nav.navigate(Route::CategoryList(Category::Genre));
        nav.navigate(Route::songs_by_category(Category::Genre, "বাউল"));

        nav.navigate_top_level(Route::SongList);
        nav.navigate_top_level(Route::Favorites);
        assert_eq!(nav.depth(), 2);
        assert_eq!(nav.current(), &Route::Favorites);

        for _ in 0..10 {
            nav.navigate_top_level(Route::SongList);
            nav.navigate_top_level(Route::Home);
        }
        assert_eq!(nav.depth(), 1);
        assert!(!nav.can_navigate_up());

        nav.navigate_top_level(Route::SongList);
        assert!(nav.navigate_up());
        assert_eq!(nav.current(), &Route::Home);
    }

    #[test]
    fn replacing_search_pops_previous_entry() {
        let mut nav = Navigator::default();
        nav.navigate(Route::search("", "song"));
        nav.replace_search("ক");
        nav.replace_search("কফি");
        assert_eq!(nav.depth(), 2);
        assert_eq!(nav.current(), &Route::search("কফি", ""));

        nav.navigate(Route::SongDetail { song_id: 10 });
        nav.replace_search("আমি");
        assert_eq!(nav.depth(), 2);

        assert!(nav.navigate_up());
        assert_eq!(nav.current(), &Route::Home);
    }

    #[test]
    fn starting_route_sits_above_home() {
        let nav = Navigator::starting_at(Route::Favorites);
        assert_eq!(nav.depth(), 2);
        assert_eq!(Navigator::starting_at(Route::Home).depth(), 1);
    }
}
