use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use log::debug;

use crate::errors::RemoteBackendError;
use crate::model::LeaderboardEntry;

/// Minimal capability a shared leaderboard has to offer.
pub trait RemoteBackend {
    /// Checked once when the store is opened.
    fn probe(&self) -> Result<(), RemoteBackendError>;
    fn append(&mut self, entry: &LeaderboardEntry) -> Result<(), RemoteBackendError>;
    /// Entries ordered by ascending time, at most `limit` of them.
    fn query_top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, RemoteBackendError>;
}

/// A JSON-lines ledger on a shared filesystem, one entry per line.
#[derive(Debug, Clone)]
pub struct LedgerFileBackend {
    path: PathBuf,
}

impl LedgerFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RemoteBackend for LedgerFileBackend {
    fn probe(&self) -> Result<(), RemoteBackendError> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        if !parent.is_dir() {
            return Err(RemoteBackendError::Unavailable(format!(
                "{} is not a directory",
                parent.display()
            )));
        }
        if self.path.exists() {
            fs::metadata(&self.path)?;
        }
        Ok(())
    }

    fn append(&mut self, entry: &LeaderboardEntry) -> Result<(), RemoteBackendError> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        debug!(target: "leaderboard", "Appended {} to {}", entry.player_name, self.path.display());
        Ok(())
    }

    fn query_top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, RemoteBackendError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => String::new(),
            Err(error) => return Err(error.into()),
        };
        let mut entries = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<LeaderboardEntry>)
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.time_ms);
        entries.truncate(limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_ledger_append_and_query() {
        let temp = TempDir::new().expect("temp");
        let mut ledger = LedgerFileBackend::new(temp.path().join("ledger.jsonl"));
        ledger.probe().unwrap();
        assert!(ledger.query_top(10).unwrap().is_empty());

        for (name, time) in [("c", 300), ("a", 100), ("b", 200), ("a2", 100)] {
            ledger.append(&LeaderboardEntry::new(name, time, Utc::now())).unwrap();
        }
        let top: Vec<String> = ledger
            .query_top(3)
            .unwrap()
            .into_iter()
            .map(|e| e.player_name)
            .collect();
        assert_eq!(top, vec!["a", "a2", "b"]);
    }

    #[test]
    fn test_probe_fails_without_parent_directory() {
        let temp = TempDir::new().expect("temp");
        let ledger = LedgerFileBackend::new(temp.path().join("missing/ledger.jsonl"));
        assert!(matches!(ledger.probe(), Err(RemoteBackendError::Unavailable(_))));
    }

    #[test]
    fn test_corrupt_ledger_is_an_error() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("ledger.jsonl");
        fs::write(&path, "{oops}\n").unwrap();
        let ledger = LedgerFileBackend::new(path);
        assert!(matches!(
            ledger.query_top(5),
            Err(RemoteBackendError::Serialization(_))
        ));
    }
}
