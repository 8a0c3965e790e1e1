//! Logger façade with per-directory result collection.
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Outcome of one directory visited by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Directory path as listed.
    pub path: PathBuf,
    /// Final status.
    pub status: DirStatus,
    /// Error text for failed directories.
    pub message: Option<String>,
}

/// Status of a visited directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirStatus {
    Ok,
    Failed,
}

/// Structured logger that records directory results for the keep-going
/// summary.
#[derive(Debug, Default)]
pub struct Logger {
    dirs: Mutex<Vec<DirEntry>>,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header.
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: "dmake::stage", "{msg}");
    }

    /// Log an informational message (shown with `-v`).
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (shown with `--debug`).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Record the result of a directory run for the summary.
    pub fn record_dir(&self, path: &Path, status: DirStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.dirs.lock() {
            guard.push(DirEntry {
                path: path.to_path_buf(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// All recorded directory results, in visiting order.
    #[must_use]
    pub fn dir_entries(&self) -> Vec<DirEntry> {
        self.dirs.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Count the directories that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.dirs.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|d| d.status == DirStatus::Failed)
                .count()
        })
    }

    /// Report the failed directories, if any.
    pub fn print_summary(&self) {
        let dirs = self.dir_entries();
        let failed: Vec<&DirEntry> = dirs
            .iter()
            .filter(|d| d.status == DirStatus::Failed)
            .collect();
        if failed.is_empty() {
            return;
        }
        self.warn(&format!(
            "{} of {} directories failed",
            failed.len(),
            dirs.len()
        ));
        for entry in failed {
            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));
            self.warn(&format!("  {}{suffix}", entry.path.display()));
        }
    }
}
