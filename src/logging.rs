use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to `log_path`. The terminal belongs to the UI, so
/// nothing is ever written to stdout or stderr.
pub fn init_logging(log_path: &Path, verbose: bool) -> Result<()> {
    let filter = build_filter(verbose)?;
    let file = open_log_file(log_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

fn build_filter(verbose: bool) -> Result<EnvFilter> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    Ok(EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        .add_directive("rusqlite=warn".parse().context("invalid rusqlite directive")?)
        .add_directive("crossterm=warn".parse().context("invalid crossterm directive")?))
}

fn open_log_file(log_path: &Path) -> Result<File> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create log directory")?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn creates_log_file_with_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("bangla-gan.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn filter_quiets_noisy_crates() {
        let filter = build_filter(true).unwrap();
        assert!(filter.to_string().contains("rusqlite=warn"));
    }
}
