//! Core library surface for the Bangla Gan song catalog.
//!
//! `main.rs` wires these pieces together: configuration and logging first,
//! then the SQLite-backed repository, the view-model on top of it, and
//! finally the terminal UI.
pub mod config;
pub mod db;
pub mod live;
pub mod logging;
pub mod models;
pub mod numerals;
pub mod repository;
pub mod routes;
pub mod ui;
pub mod viewmodel;

pub use config::Config;
pub use db::{open_catalog, open_in_memory};
pub use logging::init_logging;

/// The domain types that other layers manipulate.
pub use models::{Category, NewSong, Song};

pub use repository::SongRepository;
pub use routes::{Navigator, Route};
pub use viewmodel::{SongUiState, SongViewModel};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
