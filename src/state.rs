//! Run state persistence
//!
//! Handles:
//! - Input line files (seed phrases, proxies)
//! - Append-only outcome files, one seed phrase per line

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::RegistrarResult;
use crate::pool::Outcome;

/// Read non-empty lines from a file, trimmed and deduplicated preserving
/// first occurrence
pub async fn read_lines(path: &Path) -> RegistrarResult<Vec<String>> {
    let content = fs::read_to_string(path).await?;
    let mut seen = HashSet::new();

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect())
}

/// Truncate a file, creating parent directories as needed
pub async fn clear_file(path: &Path) -> RegistrarResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, b"").await?;
    Ok(())
}

/// Append-only outcome files, one line per terminal wallet outcome
///
/// Both appends share one mutex, the only cross-task synchronization in
/// the run, so no two tasks can interleave partial writes.
pub struct OutcomeLog {
    succeeded: PathBuf,
    failed: PathBuf,
    lock: Mutex<()>,
}

impl OutcomeLog {
    pub fn new(succeeded: PathBuf, failed: PathBuf) -> Self {
        Self {
            succeeded,
            failed,
            lock: Mutex::new(()),
        }
    }

    /// Reset both files for a fresh run
    pub async fn reset(&self) -> RegistrarResult<()> {
        clear_file(&self.succeeded).await?;
        clear_file(&self.failed).await?;
        Ok(())
    }

    /// Append the wallet's seed phrase to the file matching its outcome
    pub async fn record(&self, outcome: Outcome, seed_phrase: &str) -> RegistrarResult<()> {
        let path = match outcome {
            Outcome::Succeeded => &self.succeeded,
            Outcome::Failed => &self.failed,
        };

        let _guard = self.lock.lock().await;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(format!("{}\n", seed_phrase).as_bytes())
            .await?;
        file.flush().await?;
        Ok(())
    }
}
