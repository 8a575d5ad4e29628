use std::cmp::min;
use std::collections::{HashMap, HashSet};
use std::mem;
use std::time::Instant;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, info};

use crate::models::{non_blank, Category, Song};
use crate::numerals::BanglaNumeral;
use crate::routes::{Navigator, Route};
use crate::viewmodel::SongViewModel;

use super::forms::{ConfirmSongDelete, SongField, SongForm};
use super::helpers::{centered_rect, key_hints, surface_error, window_start};
use super::screens::{
    home_move_horizontal, home_move_vertical, HomeItem, ListCursor, HOME_GRID_COLUMNS,
};

/// Title bar with the route title and the search shortcut.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height allocation per song card in list-style views.
const SONG_CARD_HEIGHT: u16 = 5;
const HOME_TILE_HEIGHT: u16 = 4;
const HOME_LINK_HEIGHT: u16 = 3;
const SEARCH_BAR_HEIGHT: u16 = 3;
const SEARCH_PROMPT: &str = "> ";
/// Rows skipped by PageUp and PageDown.
const PAGE_STEP: isize = 5;

const LOADING: &str = "লোড হচ্ছে...";
const SEARCH_CURSOR: &str = "search";

/// Modal state layered over whatever route is current.
enum Mode {
    Normal,
    AddingSong(SongForm),
    ConfirmSongDelete(ConfirmSongDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    vm: SongViewModel,
    nav: Navigator,
    /// Selection per route on the back stack, see [`cursor_key`].
    cursors: HashMap<String, ListCursor>,
    mode: Mode,
    status: Option<StatusMessage>,
    detail_scroll: u16,
    /// Route whose load effects have already been handed to the view-model.
    synced_route: Option<Route>,
}

impl App {
    pub fn new(vm: SongViewModel, nav: Navigator) -> Self {
        Self {
            vm,
            nav,
            cursors: HashMap::new(),
            mode: Mode::Normal,
            status: None,
            detail_scroll: 0,
            synced_route: None,
        }
    }

    /// Start loads for a newly entered route and pull fresh data into the
    /// view-model. Runs once per frame before drawing.
    pub fn tick(&mut self, now: Instant) {
        if self.synced_route.as_ref() != Some(self.nav.current()) {
            let route = self.nav.current().clone();
            self.on_route_changed(&route, now);
            self.synced_route = Some(route);
        }

        self.vm.sync(now);

        self.prune_cursors();
        let len = self.list_len();
        self.cursor_mut().clamp(len);
    }

    fn on_route_changed(&mut self, route: &Route, now: Instant) {
        debug!("Showing route {route}");
        match route {
            Route::SongsByCategory { category, name } => {
                self.vm.load_songs_for_category(*category, name.clone());
            }
            Route::Search { query, .. } => {
                if self.vm.current_search_query() != query {
                    self.vm.search_songs(query.clone(), now);
                }
            }
            Route::SongDetail { song_id } => {
                self.vm.load_song(*song_id);
                self.detail_scroll = 0;
            }
            Route::Home | Route::SongList | Route::Favorites | Route::CategoryList(_) => {}
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingSong(form) => self.handle_add_song(code, form)?,
            Mode::ConfirmSongDelete(confirm) => self.handle_confirm_song_delete(code, confirm)?,
        };

        Ok(exit)
    }

    /// Toggle the favorite flag of the highlighted song. Bound to ctrl-f so it
    /// also works while the search box is taking every printable key.
    pub(crate) fn handle_ctrl_f(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::Normal) {
            return Ok(());
        }
        let song = match self.nav.current() {
            Route::SongDetail { .. } => self.vm.selected_song().cloned(),
            _ => self.selected_song().cloned(),
        };
        match song {
            Some(song) => self.toggle_favorite(&song),
            None => self.set_status("কোনো গান বাছাই করা হয়নি।", StatusKind::Error),
        }
        Ok(())
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if matches!(self.nav.current(), Route::Search { .. }) {
            return self.handle_search_key(code);
        }

        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                self.clear_status();
                if !self.nav.navigate_up() {
                    *exit = true;
                }
            }
            KeyCode::Char('1') => self.open_top_level(Route::Home),
            KeyCode::Char('2') => self.open_top_level(Route::SongList),
            KeyCode::Char('3') => self.open_top_level(Route::Favorites),
            KeyCode::Char('/') if self.nav.shows_search_shortcut() => {
                self.open_route(Route::search("", ""));
            }
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingSong(SongForm::default()));
            }
            _ => return self.handle_screen_key(code),
        }
        Ok(Mode::Normal)
    }

    fn handle_screen_key(&mut self, code: KeyCode) -> Result<Mode> {
        match self.nav.current().clone() {
            Route::Home => self.handle_home_key(code),
            Route::CategoryList(category) => self.handle_category_key(code, category),
            Route::SongDetail { .. } => self.handle_detail_key(code),
            Route::SongList
            | Route::Favorites
            | Route::Search { .. }
            | Route::SongsByCategory { .. } => self.handle_song_list_key(code),
        }
    }

    fn handle_home_key(&mut self, code: KeyCode) -> Result<Mode> {
        let selected = self.cursor().selected;
        let next = match code {
            KeyCode::Left => home_move_horizontal(selected, -1),
            KeyCode::Right => home_move_horizontal(selected, 1),
            KeyCode::Up => home_move_vertical(selected, -1),
            KeyCode::Down => home_move_vertical(selected, 1),
            KeyCode::Enter => {
                if let Some(item) = HomeItem::ALL.get(selected) {
                    self.open_route(item.route());
                }
                return Ok(Mode::Normal);
            }
            _ => selected,
        };
        self.cursor_mut().selected = next;
        Ok(Mode::Normal)
    }

    fn handle_category_key(&mut self, code: KeyCode, category: Category) -> Result<Mode> {
        let len = self.vm.category_values(category).len();
        if self.move_in_list(code, len) {
            return Ok(Mode::Normal);
        }

        if code == KeyCode::Enter {
            let selected = self.cursor().selected;
            match self.vm.category_values(category).get(selected).cloned() {
                Some(name) => self.open_route(Route::songs_by_category(category, name)),
                None => self.set_status(
                    format!("কোনো {} বাছাই করা হয়নি।", category.label()),
                    StatusKind::Error,
                ),
            }
        }
        Ok(Mode::Normal)
    }

    fn handle_song_list_key(&mut self, code: KeyCode) -> Result<Mode> {
        let len = self.route_songs().len();
        if self.move_in_list(code, len) {
            return Ok(Mode::Normal);
        }

        match code {
            KeyCode::Enter => self.open_selected_song(),
            KeyCode::Char('f') => {
                if let Some(song) = self.selected_song().cloned() {
                    self.toggle_favorite(&song);
                }
            }
            KeyCode::Char('-') => {
                if let Some(song) = self.selected_song().cloned() {
                    return Ok(Mode::ConfirmSongDelete(ConfirmSongDelete { song }));
                }
                self.set_status("কোনো গান বাছাই করা হয়নি।", StatusKind::Error);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_search_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Route::Search { query, .. } = self.nav.current().clone() else {
            return Ok(Mode::Normal);
        };
        let len = self.route_songs().len();
        if self.move_in_list(code, len) {
            return Ok(Mode::Normal);
        }

        match code {
            KeyCode::Esc => {
                self.clear_status();
                self.nav.navigate_up();
            }
            KeyCode::Enter => self.open_selected_song(),
            KeyCode::Backspace => {
                let mut query = query;
                if query.pop().is_some() {
                    self.cursors.remove(SEARCH_CURSOR);
                    self.nav.replace_search(query);
                }
            }
            KeyCode::Char(ch) => {
                let mut query = query;
                query.push(ch);
                self.cursors.remove(SEARCH_CURSOR);
                self.nav.replace_search(query);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_detail_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Some(song) = self.vm.selected_song().cloned() else {
            return Ok(Mode::Normal);
        };

        match code {
            KeyCode::Up => self.scroll_detail(&song, -1),
            KeyCode::Down => self.scroll_detail(&song, 1),
            KeyCode::PageUp => self.scroll_detail(&song, -PAGE_STEP),
            KeyCode::PageDown => self.scroll_detail(&song, PAGE_STEP),
            KeyCode::Char('f') => self.toggle_favorite(&song),
            KeyCode::Char('a') => match song.category_value(Category::Artist) {
                Some(artist) => {
                    self.open_route(Route::songs_by_category(Category::Artist, artist));
                }
                None => self.set_status("এই গানের শিল্পীর নাম নেই।", StatusKind::Error),
            },
            KeyCode::Char('o') => self.open_media(&song.title, song.audio_url.as_deref(), "অডিও"),
            KeyCode::Char('v') => self.open_media(&song.title, song.video_url.as_deref(), "ভিডিও"),
            KeyCode::Char('-') => return Ok(Mode::ConfirmSongDelete(ConfirmSongDelete { song })),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_song(&mut self, code: KeyCode, mut form: SongForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                if !form.cancel_autocomplete() {
                    self.set_status("নতুন গান যোগ বাতিল হয়েছে।", StatusKind::Info);
                    keep_open = false;
                }
            }
            KeyCode::Tab => {
                if !form.accept_suggestion() {
                    form.next_field();
                }
                self.refresh_suggestion(&mut form);
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.previous_field();
                self.refresh_suggestion(&mut form);
            }
            KeyCode::Down => {
                form.next_field();
                self.refresh_suggestion(&mut form);
            }
            KeyCode::Backspace => {
                form.backspace();
                self.refresh_suggestion(&mut form);
            }
            KeyCode::Enter => match form.parse_inputs() {
                Ok(song) => match self.vm.add_song(song) {
                    Ok(song) => {
                        info!("Added song {} ({})", song.id, song.title);
                        self.set_status(
                            format!("'{}' যোগ করা হয়েছে।", song.title),
                            StatusKind::Info,
                        );
                        keep_open = false;
                    }
                    Err(err) => {
                        let message = surface_error(&err);
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                },
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                    self.refresh_suggestion(&mut form);
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingSong(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_song_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmSongDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("মুছে ফেলা বাতিল হয়েছে।", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.vm.delete_song(&confirm.song) {
                    Ok(()) => {
                        if self.nav.current() == &(Route::SongDetail { song_id: confirm.song.id }) {
                            self.nav.navigate_up();
                        }
                        self.set_status(
                            format!("'{}' মুছে ফেলা হয়েছে।", confirm.song.title),
                            StatusKind::Info,
                        );
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmSongDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmSongDelete(confirm)),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);
        let content = chunks[1];

        self.draw_header(frame, chunks[0]);

        match self.nav.current() {
            Route::Home => self.draw_home(frame, content),
            Route::SongList => self.draw_all_songs(frame, content),
            Route::Favorites => self.draw_song_collection(
                frame,
                content,
                self.vm.favorite_songs(),
                vec![
                    Line::from("কোনো পছন্দের গান নেই।"),
                    Line::from(Span::styled(
                        "গান বেছে [f] চাপলে তা এখানে দেখা যাবে।",
                        Style::default().fg(Color::Gray),
                    )),
                ],
            ),
            Route::Search { query, .. } => self.draw_search(frame, content, query),
            Route::CategoryList(category) => self.draw_category_values(frame, content, *category),
            Route::SongsByCategory { name, .. } => self.draw_category_songs(frame, content, name),
            Route::SongDetail { .. } => self.draw_song_detail(frame, content),
        }

        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::AddingSong(form) => self.draw_song_form(frame, area, form),
            Mode::ConfirmSongDelete(confirm) => self.draw_confirm_song_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut spans = Vec::new();
        if self.nav.can_navigate_up() {
            spans.push(Span::styled("← ", Style::default().fg(Color::Gray)));
        }
        spans.push(Span::styled(
            self.nav.title(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), inner);

        if self.nav.shows_search_shortcut() {
            let shortcut = Paragraph::new(Line::from(vec![
                Span::styled(
                    "[/]",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" খুঁজুন"),
            ]))
            .alignment(Alignment::Right);
            frame.render_widget(shortcut, inner);
        }
    }

    fn draw_home(&self, frame: &mut Frame, area: Rect) {
        let state = self.vm.ui_state();
        if state.is_loading {
            self.draw_message(frame, area, vec![Line::from(LOADING)]);
            return;
        }
        if let Some(error) = &state.error_message {
            self.draw_error(frame, area, error);
            return;
        }

        let tile_rows = HomeItem::TILE_COUNT.div_ceil(HOME_GRID_COLUMNS);
        let links = HomeItem::ALL.len() - HomeItem::TILE_COUNT;
        let mut constraints = vec![Constraint::Length(3)];
        constraints.extend((0..tile_rows).map(|_| Constraint::Length(HOME_TILE_HEIGHT)));
        constraints.extend((0..links).map(|_| Constraint::Length(HOME_LINK_HEIGHT)));
        constraints.push(Constraint::Min(0));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let welcome = Paragraph::new(vec![
            Line::from(Span::styled(
                "স্বাগতম!",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "বাংলা গানের ভাণ্ডার ঘুরে দেখুন।",
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(welcome, rows[0]);

        let selected = self.cursor().selected;
        for row in 0..tile_rows {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![
                    Constraint::Ratio(1, HOME_GRID_COLUMNS as u32);
                    HOME_GRID_COLUMNS
                ])
                .split(rows[row + 1]);
            for (col, chunk) in columns.iter().enumerate() {
                let index = row * HOME_GRID_COLUMNS + col;
                let Some(item) = HomeItem::ALL.get(index).copied() else {
                    continue;
                };
                if index >= HomeItem::TILE_COUNT {
                    continue;
                }
                let mut block = Block::default()
                    .borders(Borders::ALL)
                    .title(item.label());
                if index == selected {
                    block = block.style(Style::default().fg(Color::Yellow));
                }
                let count = Line::from(vec![
                    Span::styled(
                        self.home_count(item).to_bangla(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" টি"),
                ]);
                let tile = Paragraph::new(count)
                    .alignment(Alignment::Center)
                    .block(block);
                frame.render_widget(tile, *chunk);
            }
        }

        for (offset, item) in HomeItem::ALL[HomeItem::TILE_COUNT..].iter().enumerate() {
            let index = HomeItem::TILE_COUNT + offset;
            let mut block = Block::default().borders(Borders::ALL);
            if index == selected {
                block = block.style(Style::default().fg(Color::Yellow));
            }
            let label = match item {
                HomeItem::Favorites => format!(
                    "{} ({})",
                    item.label(),
                    self.vm.favorite_songs().len().to_bangla()
                ),
                _ => item.label().to_string(),
            };
            let link = Paragraph::new(label)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(link, rows[1 + tile_rows + offset]);
        }
    }

    fn home_count(&self, item: HomeItem) -> i64 {
        let state = self.vm.ui_state();
        match item {
            HomeItem::Songs | HomeItem::AllSongs => state.total_songs,
            HomeItem::Category(Category::Artist) => state.total_artists,
            HomeItem::Category(Category::Lyricist) => state.total_lyricists,
            HomeItem::Category(Category::Composer) => state.total_composers,
            HomeItem::Category(Category::Era) => state.total_eras,
            HomeItem::Category(Category::Genre) => state.total_genres,
            HomeItem::Favorites => self.vm.favorite_songs().len() as i64,
        }
    }

    fn draw_all_songs(&self, frame: &mut Frame, area: Rect) {
        let state = self.vm.ui_state();
        if state.is_loading {
            self.draw_message(frame, area, vec![Line::from(LOADING)]);
            return;
        }
        if let Some(error) = &state.error_message {
            self.draw_error(frame, area, error);
            return;
        }
        self.draw_song_collection(
            frame,
            area,
            &state.all_songs,
            vec![
                Line::from("কোনো গান পাওয়া যায়নি।"),
                Line::from(Span::styled(
                    "কিছু গান যোগ করুন অথবা ডাটাবেস সিঙ্ক করুন!",
                    Style::default().fg(Color::Gray),
                )),
            ],
        );
    }

    fn draw_search(&self, frame: &mut Frame, area: Rect, query: &str) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(SEARCH_BAR_HEIGHT), Constraint::Min(0)])
            .split(area);

        let block = Block::default().borders(Borders::ALL).title("খুঁজুন");
        let inner = block.inner(chunks[0]);
        let input = Paragraph::new(Line::from(vec![
            Span::styled(SEARCH_PROMPT, Style::default().fg(Color::Cyan)),
            Span::raw(query.to_string()),
        ]))
        .block(block);
        frame.render_widget(input, chunks[0]);
        if matches!(self.mode, Mode::Normal) {
            let typed = Span::raw(format!("{SEARCH_PROMPT}{query}")).width() as u16;
            frame.set_cursor_position((inner.x + typed, inner.y));
        }

        let results = chunks[1];
        if query.trim().is_empty() {
            self.draw_message(
                frame,
                results,
                vec![Line::from(Span::styled(
                    "গান, শিল্পী বা অ্যালবামের নাম লিখুন।",
                    Style::default().fg(Color::Gray),
                ))],
            );
            return;
        }
        if self.vm.is_search_pending() || self.vm.current_search_query() != query {
            self.draw_message(frame, results, vec![Line::from("খোঁজা হচ্ছে...")]);
            return;
        }
        self.draw_song_collection(
            frame,
            results,
            self.vm.search_results(),
            vec![Line::from(format!(
                "'{query}' এর জন্য কোনো ফলাফল পাওয়া যায়নি।"
            ))],
        );
    }

    fn draw_category_values(&self, frame: &mut Frame, area: Rect, category: Category) {
        let values = self.vm.category_values(category);
        if self.vm.ui_state().is_loading {
            self.draw_message(frame, area, vec![Line::from(LOADING)]);
            return;
        }
        if values.is_empty() {
            self.draw_message(
                frame,
                area,
                vec![Line::from(format!("কোনো {} পাওয়া যায়নি।", category.label()))],
            );
            return;
        }

        let items: Vec<ListItem> = values
            .iter()
            .map(|value| ListItem::new(value.clone()))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::NONE))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(self.cursor().selected));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn draw_category_songs(&self, frame: &mut Frame, area: Rect, name: &str) {
        if self.vm.is_category_loading() {
            self.draw_message(frame, area, vec![Line::from(LOADING)]);
            return;
        }
        self.draw_song_collection(
            frame,
            area,
            self.vm.songs_by_selected_category(),
            vec![Line::from(format!(
                "{name} ক্যাটেগরিতে কোনো গান পাওয়া যায়নি।"
            ))],
        );
    }

    fn draw_song_detail(&self, frame: &mut Frame, area: Rect) {
        if self.vm.is_song_loading() {
            self.draw_message(frame, area, vec![Line::from(LOADING)]);
            return;
        }
        let Some(song) = self.vm.selected_song() else {
            self.draw_message(
                frame,
                area,
                vec![Line::from("গান পাওয়া যায়নি অথবা অবৈধ আইডি।")],
            );
            return;
        };

        let block = Block::default().borders(Borders::ALL);
        let paragraph = Paragraph::new(detail_lines(song))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.detail_scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_song_collection(
        &self,
        frame: &mut Frame,
        area: Rect,
        songs: &[Song],
        empty: Vec<Line<'static>>,
    ) {
        if songs.is_empty() {
            self.draw_message(frame, area, empty);
            return;
        }
        let selected = min(self.cursor().selected, songs.len() - 1);
        self.render_song_cards(frame, area, songs, selected);
    }

    fn render_song_cards(&self, frame: &mut Frame, area: Rect, songs: &[Song], selected: usize) {
        if songs.is_empty() || area.height == 0 {
            return;
        }

        let card_height = SONG_CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = songs.len();
        let start = window_start(selected, capacity, len);
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(SONG_CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, chunk) in rows.iter().enumerate() {
            if chunk.height == 0 {
                continue;
            }

            let song_index = start + idx;
            if song_index >= len {
                break;
            }

            let song = &songs[song_index];
            let mut block = Block::default().borders(Borders::ALL);
            let mut paragraph_style = Style::default();
            if song_index == selected {
                block = block.style(Style::default().fg(Color::Yellow));
                paragraph_style = Style::default().fg(Color::Yellow);
            }

            let mut title = if song_index == selected {
                format!("▶ {}", song.title)
            } else {
                song.title.clone()
            };
            if song.is_favorite {
                title.push_str(" ♥");
            }

            let mut lines = vec![
                Line::from(Span::styled(
                    title,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("{}: {}", Category::Artist.label(), song.display_artist()),
                    Style::default().fg(Color::Gray),
                )),
            ];

            let mut meta: Vec<String> = [song.era.as_deref(), song.genre.as_deref()]
                .into_iter()
                .filter_map(non_blank)
                .map(str::to_string)
                .collect();
            if let Some(year) = song.release_year {
                meta.push(year.to_bangla());
            }
            if !meta.is_empty() {
                lines.push(Line::from(Span::styled(
                    meta.join(" • "),
                    Style::default().fg(Color::Cyan),
                )));
            }

            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Left)
                .style(paragraph_style);

            frame.render_widget(paragraph, *chunk);
        }
    }

    fn draw_message(&self, frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
        let message = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::NONE));
        frame.render_widget(message, area);
    }

    fn draw_error(&self, frame: &mut Frame, area: Rect, error: &str) {
        self.draw_message(
            frame,
            area,
            vec![
                Line::from(Span::styled(
                    "একটি সমস্যা হয়েছে:",
                    Style::default().fg(Color::Red),
                )),
                Line::from(error.to_string()),
            ],
        );
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.mode, self.nav.current()) {
            (Mode::AddingSong(_), _) => key_hints(&[
                ("Tab", "পরের ঘর"),
                ("Shift+Tab", "আগের ঘর"),
                ("Enter", "সংরক্ষণ"),
                ("Esc", "বাতিল"),
            ]),
            (Mode::ConfirmSongDelete(_), _) => key_hints(&[("Y", "মুছুন"), ("N", "বাতিল")]),
            (Mode::Normal, Route::Home) => key_hints(&[
                ("←↑↓→", "বাছাই"),
                ("Enter", "খুলুন"),
                ("2", "সব গান"),
                ("3", "পছন্দের গান"),
                ("+", "নতুন গান"),
                ("q", "বের হন"),
            ]),
            (Mode::Normal, Route::Search { .. }) => key_hints(&[
                ("↑↓", "বাছাই"),
                ("Enter", "বিবরণ"),
                ("Ctrl+F", "পছন্দ"),
                ("Esc", "পিছনে"),
            ]),
            (Mode::Normal, Route::CategoryList(_)) => key_hints(&[
                ("↑↓", "বাছাই"),
                ("Enter", "গান দেখুন"),
                ("1", "মূল পাতা"),
                ("Esc", "পিছনে"),
                ("q", "বের হন"),
            ]),
            (Mode::Normal, Route::SongDetail { .. }) => key_hints(&[
                ("↑↓", "স্ক্রল"),
                ("f", "পছন্দ"),
                ("a", "শিল্পীর গান"),
                ("o", "অডিও"),
                ("v", "ভিডিও"),
                ("-", "মুছুন"),
                ("Esc", "পিছনে"),
            ]),
            (Mode::Normal, _) => key_hints(&[
                ("↑↓", "বাছাই"),
                ("Enter", "বিবরণ"),
                ("f", "পছন্দ"),
                ("+", "নতুন গান"),
                ("-", "মুছুন"),
                ("Esc", "পিছনে"),
            ]),
        }
    }

    fn draw_song_form(&self, frame: &mut Frame, area: Rect, form: &SongForm) {
        let popup_area = centered_rect(80, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("নতুন গান").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = SongField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter সংরক্ষণ • Tab পরের ঘর • Esc বাতিল",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        frame.set_cursor_position((inner.x + form.cursor_offset(), inner.y + form.active_row()));
    }

    fn draw_confirm_song_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmSongDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("গান মুছুন").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "'{}' স্থায়ীভাবে মুছে ফেলবেন?",
                confirm.song.title
            )),
            Line::from("গানটি পছন্দের তালিকা থেকেও সরে যাবে।"),
            Line::from(""),
            Line::from(Span::styled(
                "নিশ্চিত করতে Y, বাতিল করতে N / Esc চাপুন।",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn open_route(&mut self, route: Route) {
        self.clear_status();
        self.nav.navigate(route);
    }

    fn open_top_level(&mut self, route: Route) {
        self.clear_status();
        self.nav.navigate_top_level(route);
    }

    fn open_selected_song(&mut self) {
        match self.selected_song().map(|song| song.id) {
            Some(song_id) => self.open_route(Route::SongDetail { song_id }),
            None => self.set_status("কোনো গান বাছাই করা হয়নি।", StatusKind::Error),
        }
    }

    fn toggle_favorite(&mut self, song: &Song) {
        match self.vm.toggle_favorite_status(song) {
            Ok(updated) => {
                let message = if updated.is_favorite {
                    format!("'{}' পছন্দের তালিকায় যোগ হয়েছে।", updated.title)
                } else {
                    format!("'{}' পছন্দের তালিকা থেকে বাদ দেওয়া হয়েছে।", updated.title)
                };
                self.set_status(message, StatusKind::Info);
            }
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn open_media(&mut self, title: &str, url: Option<&str>, kind: &str) {
        let Some(url) = non_blank(url) else {
            self.set_status(
                format!("এই গানের কোনো {kind} লিঙ্ক নেই।"),
                StatusKind::Error,
            );
            return;
        };
        match open_link(url.trim()) {
            Ok(()) => {
                info!("Opened {kind} link for {title}");
                self.set_status(format!("'{title}' এর {kind} খোলা হয়েছে।"), StatusKind::Info);
            }
            Err(err) => self.set_status(format!("লিঙ্ক খোলা যায়নি: {err}"), StatusKind::Error),
        }
    }

    fn scroll_detail(&mut self, song: &Song, offset: isize) {
        let max = detail_lines(song).len().saturating_sub(1) as isize;
        let next = (self.detail_scroll as isize + offset).clamp(0, max);
        self.detail_scroll = next as u16;
    }

    fn refresh_suggestion(&self, form: &mut SongForm) {
        let candidates = form
            .active
            .category()
            .map(|category| self.vm.category_values(category))
            .unwrap_or_default();
        form.update_suggestion(candidates);
    }

    fn move_in_list(&mut self, code: KeyCode, len: usize) -> bool {
        let cursor = self.cursor_mut();
        match code {
            KeyCode::Up => cursor.move_selection(-1, len),
            KeyCode::Down => cursor.move_selection(1, len),
            KeyCode::PageUp => cursor.move_selection(-PAGE_STEP, len),
            KeyCode::PageDown => cursor.move_selection(PAGE_STEP, len),
            KeyCode::Home => cursor.select_first(),
            KeyCode::End => cursor.select_last(len),
            _ => return false,
        }
        true
    }

    fn cursor(&self) -> ListCursor {
        self.cursors
            .get(&cursor_key(self.nav.current()))
            .copied()
            .unwrap_or_default()
    }

    fn cursor_mut(&mut self) -> &mut ListCursor {
        self.cursors
            .entry(cursor_key(self.nav.current()))
            .or_default()
    }

    /// Forget selections of routes that are no longer on the back stack.
    fn prune_cursors(&mut self) {
        let live: HashSet<String> = self.nav.routes().map(cursor_key).collect();
        self.cursors.retain(|key, _| live.contains(key));
    }

    /// Songs listed by the current route, empty on screens without a list.
    fn route_songs(&self) -> &[Song] {
        match self.nav.current() {
            Route::SongList => &self.vm.ui_state().all_songs,
            Route::Favorites => self.vm.favorite_songs(),
            Route::Search { .. } => self.vm.search_results(),
            Route::SongsByCategory { .. } => self.vm.songs_by_selected_category(),
            Route::Home | Route::CategoryList(_) | Route::SongDetail { .. } => &[],
        }
    }

    fn selected_song(&self) -> Option<&Song> {
        self.route_songs().get(self.cursor().selected)
    }

    fn list_len(&self) -> usize {
        match self.nav.current() {
            Route::Home => HomeItem::ALL.len(),
            Route::CategoryList(category) => self.vm.category_values(*category).len(),
            _ => self.route_songs().len(),
        }
    }
}

/// Key into `App::cursors`. All searches share one entry, reset whenever the
/// query changes.
fn cursor_key(route: &Route) -> String {
    match route {
        Route::Search { .. } => SEARCH_CURSOR.to_string(),
        _ => route.to_path(),
    }
}

/// Every filled-in field of `song`, one labelled line each, followed by the
/// lyrics and notes.
fn detail_lines(song: &Song) -> Vec<Line<'static>> {
    let label_style = Style::default().fg(Color::Gray);
    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label}: "), label_style),
            Span::raw(value),
        ])
    };

    let mut title = song.title.clone();
    if song.is_favorite {
        title.push_str(" ♥");
    }
    let mut lines = vec![
        Line::from(Span::styled(
            title,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field(SongField::Artist.label(), song.display_artist().to_string()),
    ];

    let optional = [
        (SongField::Album, song.album.as_deref()),
        (SongField::Lyricist, song.lyricist.as_deref()),
        (SongField::Composer, song.composer.as_deref()),
        (SongField::Era, song.era.as_deref()),
        (SongField::Genre, song.genre.as_deref()),
    ];
    for (label, value) in optional {
        if let Some(value) = non_blank(value) {
            lines.push(field(label.label(), value.to_string()));
        }
    }
    if let Some(year) = song.release_year {
        lines.push(field(SongField::Year.label(), year.to_bangla()));
    }

    let link_style = Style::default().fg(Color::Cyan);
    for (label, url, key) in [
        (SongField::AudioUrl, song.audio_url.as_deref(), "o"),
        (SongField::VideoUrl, song.video_url.as_deref(), "v"),
    ] {
        if let Some(url) = non_blank(url) {
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", label.label()), label_style),
                Span::styled(url.to_string(), link_style),
                Span::styled(format!("  [{key}]"), label_style),
            ]));
        }
    }

    for (label, text) in [
        (SongField::Lyrics, song.lyrics.as_deref()),
        (SongField::Notes, song.notes.as_deref()),
    ] {
        if let Some(text) = non_blank(text) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                label.label(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.extend(text.lines().map(|line| Line::from(line.to_string())));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::db::open_in_memory;
    use crate::models::NewSong;
    use crate::repository::SongRepository;

    fn app_at(route: Route) -> App {
        let repo = SongRepository::from_store(open_in_memory().unwrap(), true).unwrap();
        let vm = SongViewModel::new(repo, Duration::ZERO);
        let mut app = App::new(vm, Navigator::starting_at(route));
        app.tick(Instant::now());
        app
    }

    fn press(app: &mut App, keys: &[KeyCode]) -> bool {
        let mut exit = false;
        for key in keys {
            exit = app.handle_key(*key).unwrap();
            app.tick(Instant::now());
        }
        exit
    }

    fn type_text(app: &mut App, text: &str) {
        let keys: Vec<KeyCode> = text.chars().map(KeyCode::Char).collect();
        press(app, &keys);
    }

    /// Screen contents with blanks removed, since wide glyphs leave padding
    /// cells behind them.
    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 48)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
            .replace(' ', "")
    }

    fn shows(app: &App, text: &str) -> bool {
        rendered(app).contains(&text.replace(' ', ""))
    }

    #[test]
    fn home_shows_catalog_totals() {
        let app = app_at(Route::Home);
        assert!(shows(&app, "স্বাগতম!"));
        assert!(shows(&app, "১২"));
    }

    #[test]
    fn home_grid_opens_category_lists() {
        let mut app = app_at(Route::Home);
        press(&mut app, &[KeyCode::Right, KeyCode::Enter]);
        assert_eq!(app.nav.current(), &Route::CategoryList(Category::Artist));

        let first = app.vm.category_values(Category::Artist)[0].clone();
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(
            app.nav.current(),
            &Route::songs_by_category(Category::Artist, first.clone())
        );
        assert!(!app.vm.songs_by_selected_category().is_empty());
        assert!(app
            .vm
            .songs_by_selected_category()
            .iter()
            .all(|song| song.artist.as_deref() == Some(first.as_str())));

        press(&mut app, &[KeyCode::Esc, KeyCode::Esc]);
        assert_eq!(app.nav.current(), &Route::Home);
        press(&mut app, &[KeyCode::Left, KeyCode::Enter]);
        assert_eq!(app.nav.current(), &Route::search("", "song"));
    }

    #[test]
    fn favorite_from_song_list_appears_in_favorites() {
        let mut app = app_at(Route::Home);
        press(&mut app, &[KeyCode::Char('2'), KeyCode::Down, KeyCode::Char('f')]);
        assert_eq!(app.vm.favorite_songs().len(), 1);
        assert!(app.vm.ui_state().all_songs[1].is_favorite);

        press(&mut app, &[KeyCode::Char('3')]);
        assert_eq!(app.nav.current(), &Route::Favorites);
        assert!(shows(&app, "♥"));

        press(&mut app, &[KeyCode::Char('f')]);
        assert!(app.vm.favorite_songs().is_empty());
        assert!(shows(&app, "কোনো পছন্দের গান নেই।"));
    }

    #[test]
    fn typing_in_search_replaces_the_route() {
        let mut app = app_at(Route::Home);
        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "নজরুল");
        assert_eq!(app.nav.current(), &Route::search("নজরুল", ""));
        assert_eq!(app.nav.depth(), 2);
        assert_eq!(app.vm.search_results().len(), 2);

        assert!(!press(&mut app, &[KeyCode::Char('q')]));
        assert_eq!(app.nav.current(), &Route::search("নজরুলq", ""));
        assert!(app.vm.search_results().is_empty());
        assert!(shows(&app, "কোনো ফলাফল পাওয়া যায়নি।"));

        press(&mut app, &[KeyCode::Backspace]);
        assert_eq!(app.vm.search_results().len(), 2);
        app.handle_ctrl_f().unwrap();
        app.tick(Instant::now());
        assert_eq!(app.vm.favorite_songs().len(), 1);

        press(&mut app, &[KeyCode::Esc]);
        assert_eq!(app.nav.current(), &Route::Home);
    }

    #[test]
    fn add_song_form_requires_title_then_saves() {
        let mut app = app_at(Route::SongList);
        press(&mut app, &[KeyCode::Char('+'), KeyCode::Enter]);
        assert!(matches!(&app.mode, Mode::AddingSong(form) if form.error.is_some()));

        type_text(&mut app, "একতারা তুই দেশের কথা বল");
        press(&mut app, &[KeyCode::Enter]);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.vm.ui_state().total_songs, 13);
        assert!(app
            .vm
            .ui_state()
            .all_songs
            .iter()
            .any(|song| song.title == "একতারা তুই দেশের কথা বল"));
    }

    #[test]
    fn deleting_from_detail_returns_to_the_list() {
        let mut app = app_at(Route::Home);
        press(&mut app, &[KeyCode::Char('2'), KeyCode::Enter]);
        let song = app.vm.selected_song().cloned().unwrap();
        assert_eq!(app.nav.current(), &Route::SongDetail { song_id: song.id });

        press(&mut app, &[KeyCode::Char('-')]);
        assert!(matches!(app.mode, Mode::ConfirmSongDelete(_)));
        press(&mut app, &[KeyCode::Char('n')]);
        assert_eq!(app.vm.ui_state().total_songs, 12);

        press(&mut app, &[KeyCode::Char('-'), KeyCode::Char('y')]);
        assert_eq!(app.nav.current(), &Route::SongList);
        assert_eq!(app.vm.ui_state().total_songs, 11);
        assert_eq!(app.vm.get_song_by_id(song.id).unwrap(), None);
    }

    #[test]
    fn detail_links_to_artist_songs() {
        let mut app = app_at(Route::SongList);
        let artist = app.vm.ui_state().all_songs[0].artist.clone().unwrap();
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('a')]);
        assert_eq!(
            app.nav.current(),
            &Route::songs_by_category(Category::Artist, artist)
        );
        assert!(!app.vm.songs_by_selected_category().is_empty());
    }

    #[test]
    fn unknown_song_shows_not_found() {
        let app = app_at(Route::SongDetail { song_id: 999 });
        assert!(!app.vm.is_song_loading());
        assert!(shows(&app, "অবৈধ আইডি।"));
    }

    #[test]
    fn top_level_keys_keep_history_shallow() {
        let mut app = app_at(Route::Home);
        press(&mut app, &[KeyCode::Char('2'), KeyCode::Char('3')]);
        assert_eq!(app.nav.depth(), 2);
        assert!(!press(&mut app, &[KeyCode::Esc]));
        assert_eq!(app.nav.current(), &Route::Home);

        for _ in 0..10 {
            press(&mut app, &[KeyCode::Char('2'), KeyCode::Char('1')]);
        }
        assert_eq!(app.nav.depth(), 1);

        press(&mut app, &[KeyCode::Right, KeyCode::Enter, KeyCode::Enter]);
        assert_eq!(app.nav.depth(), 3);
        press(&mut app, &[KeyCode::Char('3')]);
        assert_eq!(app.nav.depth(), 2);
        assert!(!press(&mut app, &[KeyCode::Esc]));
        assert_eq!(app.nav.current(), &Route::Home);
    }

    #[test]
    fn selections_are_kept_only_for_stacked_routes() {
        let mut app = app_at(Route::Home);
        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "রবীন্দ্রনাথ ঠাকুর");
        press(&mut app, &[KeyCode::Down]);
        assert_eq!(app.cursor().selected, 1);
        assert!(app.cursors.len() <= app.nav.depth());

        press(&mut app, &[KeyCode::Backspace]);
        assert_eq!(app.cursor().selected, 0);

        press(&mut app, &[KeyCode::Esc, KeyCode::Right, KeyCode::Enter]);
        for _ in 0..5 {
            press(&mut app, &[KeyCode::Enter, KeyCode::Esc, KeyCode::Down]);
        }
        assert_eq!(app.nav.depth(), 2);
        assert!(app.cursors.len() <= app.nav.depth());
    }

    #[test]
    fn store_failure_shows_error_heading() {
        let mut app = app_at(Route::SongList);
        assert_eq!(app.vm.ui_state().all_songs.len(), 12);

        app.vm.repository().drop_songs_table().unwrap();
        app.tick(Instant::now());

        assert!(app.vm.ui_state().error_message.is_some());
        assert!(shows(&app, "একটি সমস্যা হয়েছে:"));
    }

    #[test]
    fn artist_link_matches_padded_names() {
        let mut app = app_at(Route::Home);
        let padded = NewSong {
            artist: Some("  লালন ফকির ".into()),
            ..NewSong::titled("খাঁচার ভিতর অচিন পাখি")
        };
        let song = app.vm.add_song(padded).unwrap();
        app.nav.navigate(Route::SongDetail { song_id: song.id });
        app.tick(Instant::now());

        press(&mut app, &[KeyCode::Char('a')]);
        assert_eq!(
            app.nav.current(),
            &Route::songs_by_category(Category::Artist, "লালন ফকির")
        );
        assert_eq!(app.vm.songs_by_selected_category().len(), 1);
    }

    #[test]
    fn esc_on_home_quits() {
        let mut app = app_at(Route::Home);
        assert!(press(&mut app, &[KeyCode::Esc]));
        let mut app = app_at(Route::Favorites);
        assert!(!press(&mut app, &[KeyCode::Esc]));
        assert!(press(&mut app, &[KeyCode::Char('q')]));
    }
}
