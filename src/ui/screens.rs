use crate::models::Category;
use crate::routes::Route;

/// Selection within a vertical list whose length can change under it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ListCursor {
    pub(crate) selected: usize,
}

impl ListCursor {
    pub(crate) fn move_selection(&mut self, offset: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let max = len as isize - 1;
        let new = (self.selected as isize + offset).clamp(0, max);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    /// Pull the selection back inside the list after it shrank.
    pub(crate) fn clamp(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

/// Columns in the home screen's category grid.
pub(crate) const HOME_GRID_COLUMNS: usize = 2;

/// Entries on the home screen: a grid of category tiles followed by two
/// full-width shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HomeItem {
    Songs,
    Category(Category),
    AllSongs,
    Favorites,
}

impl HomeItem {
    pub(crate) const ALL: [HomeItem; 8] = [
        HomeItem::Songs,
        HomeItem::Category(Category::Artist),
        HomeItem::Category(Category::Lyricist),
        HomeItem::Category(Category::Composer),
        HomeItem::Category(Category::Era),
        HomeItem::Category(Category::Genre),
        HomeItem::AllSongs,
        HomeItem::Favorites,
    ];

    /// Number of leading entries laid out as grid tiles.
    pub(crate) const TILE_COUNT: usize = 6;

    pub(crate) fn label(self) -> &'static str {
        match self {
            HomeItem::Songs => "গান",
            HomeItem::Category(category) => category.label(),
            HomeItem::AllSongs => "সব গান দেখুন",
            HomeItem::Favorites => "পছন্দের গান",
        }
    }

    pub(crate) fn route(self) -> Route {
        match self {
            HomeItem::Songs => Route::search("", "song"),
            HomeItem::Category(category) => Route::CategoryList(category),
            HomeItem::AllSongs => Route::SongList,
            HomeItem::Favorites => Route::Favorites,
        }
    }
}

/// Move horizontally within a tile row. Shortcuts below the grid ignore it.
pub(crate) fn home_move_horizontal(selected: usize, offset: isize) -> usize {
    if selected >= HomeItem::TILE_COUNT {
        return selected;
    }
    let row_start = selected - selected % HOME_GRID_COLUMNS;
    let column = selected % HOME_GRID_COLUMNS;
    let new_column = (column as isize + offset).clamp(0, HOME_GRID_COLUMNS as isize - 1);
    row_start + new_column as usize
}

/// Move vertically through tile rows and then the shortcut rows.
pub(crate) fn home_move_vertical(selected: usize, offset: isize) -> usize {
    let last = HomeItem::ALL.len() - 1;
    let tiles = HomeItem::TILE_COUNT;
    if offset > 0 {
        if selected < tiles {
            let below = selected + HOME_GRID_COLUMNS;
            if below < tiles {
                below
            } else {
                tiles
            }
        } else {
            (selected + 1).min(last)
        }
    } else if offset < 0 {
        if selected > tiles {
            selected - 1
        } else if selected == tiles {
            tiles - HOME_GRID_COLUMNS
        } else {
            selected.checked_sub(HOME_GRID_COLUMNS).unwrap_or(selected)
        }
    } else {
        selected
    }
}
