//! Query results that re-run themselves once the catalog changes.
//!
//! A [`LiveQuery`] remembers the repository revision its value was computed
//! at. Calling [`LiveQuery::refresh`] on every UI tick re-runs the loader only
//! when a write has happened since, so unchanged screens cost nothing.

use anyhow::Result;
use tracing::warn;

use crate::repository::SongRepository;

pub struct LiveQuery<T> {
    value: T,
    seen_revision: Option<u64>,
    error: Option<String>,
}

impl<T: Default> Default for LiveQuery<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> LiveQuery<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: initial,
            seen_revision: None,
            error: None,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Message of the last failed load, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True until the first load has completed, successfully or not.
    pub fn is_pending(&self) -> bool {
        self.seen_revision.is_none()
    }

    /// Force the next `refresh` to run the loader.
    pub fn invalidate(&mut self) {
        self.seen_revision = None;
    }

    /// Re-run `loader` if the catalog changed since the last run. Returns
    /// whether the loader ran. On failure the previous value is kept.
    pub fn refresh<F>(&mut self, repo: &SongRepository, loader: F) -> bool
    where
        F: FnOnce(&SongRepository) -> Result<T>,
    {
        let revision = repo.revision();
        if self.seen_revision == Some(revision) {
            return false;
        }

        match loader(repo) {
            Ok(value) => {
                self.value = value;
                self.error = None;
            }
            Err(err) => {
                warn!("Live query failed: {err:#}");
                self.error = Some(format!("{err:#}"));
            }
        }
        self.seen_revision = Some(revision);
        true
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::db::open_in_memory;
    use crate::models::NewSong;

    fn repo() -> SongRepository {
        SongRepository::from_store(open_in_memory().unwrap(), false).unwrap()
    }

    #[test]
    fn reruns_only_after_writes() {
        let repo = repo();
        let mut songs: LiveQuery<Vec<_>> = LiveQuery::default();
        assert!(songs.is_pending());

        assert!(songs.refresh(&repo, |r| r.all_songs()));
        assert!(!songs.is_pending());
        assert!(songs.get().is_empty());

        assert!(!songs.refresh(&repo, |r| r.all_songs()));

        repo.insert_song(NewSong::titled("আমি বাংলায় গান গাই"))
            .unwrap();
        assert!(songs.refresh(&repo, |r| r.all_songs()));
        assert_eq!(songs.get().len(), 1);
    }

    #[test]
    fn invalidate_forces_reload() {
        let repo = repo();
        let mut count = LiveQuery::new(0usize);
        count.refresh(&repo, |_| Ok(1));
        count.invalidate();
        assert!(count.refresh(&repo, |_| Ok(2)));
        assert_eq!(*count.get(), 2);
    }

    #[test]
    fn failures_keep_previous_value() {
        let repo = repo();
        let mut value = LiveQuery::new(5);
        value.refresh(&repo, |_| Ok(7));
        value.invalidate();

        value.refresh(&repo, |_| Err(anyhow!("disk on fire")));
        assert_eq!(*value.get(), 7);
        assert_eq!(value.error(), Some("disk on fire"));

        value.invalidate();
        value.refresh(&repo, |_| Ok(8));
        assert_eq!(value.error(), None);
    }
}
