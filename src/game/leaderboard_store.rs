use chrono::Utc;
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use super::local_storage::{FileStorage, KeyValueStorage};
use super::remote_backend::{LedgerFileBackend, RemoteBackend};
use super::settings::LeaderboardSettings;
use crate::errors::{LeaderboardError, StorageError, ValidationError};
use crate::helpers::TrimmedNonEmpty;
use crate::model::{LeaderboardEntry, Ranking, RankingExport, RankingSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Remote,
    Local,
}

/// Best completion times, kept in a remote backend when one is reachable and in
/// local storage otherwise.
///
/// The mode is decided once in [`LeaderboardStore::open`]. A failed remote write
/// switches the store to local storage for the rest of its life; the remote is
/// dropped and never consulted again. A failed remote read only labels that one
/// result as degraded.
pub struct LeaderboardStore {
    mode: BackendMode,
    remote: Option<Box<dyn RemoteBackend>>,
    storage: Box<dyn KeyValueStorage>,
    storage_key: String,
    max_entries: usize,
    local_cache: Vec<LeaderboardEntry>,
    cache_loaded: bool,
    /// Persisted blob that failed to parse; moved to the backup key before the next rewrite.
    unreadable_blob: Option<String>,
}

impl LeaderboardStore {
    pub fn open(
        remote: Option<Box<dyn RemoteBackend>>,
        storage: Box<dyn KeyValueStorage>,
        settings: &LeaderboardSettings,
    ) -> Self {
        let mode = match &remote {
            Some(backend) => match backend.probe() {
                Ok(()) => {
                    info!(target: "leaderboard", "Remote leaderboard connected");
                    BackendMode::Remote
                }
                Err(err) => {
                    warn!(target: "leaderboard", "Remote leaderboard unavailable, using local storage: {}", err);
                    BackendMode::Local
                }
            },
            None => {
                info!(target: "leaderboard", "No remote leaderboard configured, using local storage");
                BackendMode::Local
            }
        };
        let mut store = Self {
            mode,
            remote: if mode == BackendMode::Remote { remote } else { None },
            storage,
            storage_key: settings.storage_key.clone(),
            max_entries: settings.max_entries.max(1),
            local_cache: Vec::new(),
            cache_loaded: false,
            unreadable_blob: None,
        };
        if mode == BackendMode::Local {
            if let Err(err) = store.ensure_cache_loaded() {
                warn!(target: "leaderboard", "Could not read local ranking: {}", err);
            }
        }
        store
    }

    /// File-backed local storage under `data_dir`, plus the shared ledger when one is
    /// configured.
    pub fn from_settings(settings: &LeaderboardSettings, data_dir: PathBuf) -> Self {
        let remote = settings
            .remote_ledger
            .as_ref()
            .map(|path| Box::new(LedgerFileBackend::new(path.clone())) as Box<dyn RemoteBackend>);
        Self::open(remote, Box::new(FileStorage::new(data_dir)), settings)
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Records a completion time. Returns where the entry ended up.
    pub fn submit(
        &mut self,
        player_name: &str,
        time_ms: i64,
    ) -> Result<RankingSource, LeaderboardError> {
        let name = player_name
            .trimmed_non_empty()
            .ok_or(ValidationError::EmptyName)?;
        let time_ms = u64::try_from(time_ms).map_err(|_| ValidationError::NegativeTime(time_ms))?;
        let entry = LeaderboardEntry::new(name, time_ms, Utc::now());

        if let Some(remote) = self.remote.as_mut() {
            match remote.append(&entry) {
                Ok(()) => {
                    info!(target: "leaderboard", "Saved {} ({} ms) remotely", entry.player_name, time_ms);
                    return Ok(RankingSource::Remote);
                }
                Err(err) => {
                    error!(target: "leaderboard", "Remote save failed, switching to local storage: {}", err);
                    self.degrade();
                }
            }
        }

        self.write_local(entry)?;
        Ok(RankingSource::Local)
    }

    fn degrade(&mut self) {
        self.mode = BackendMode::Local;
        self.remote = None;
    }

    /// The `limit` best entries. Never fails: a broken remote read falls back to the
    /// local cache, labeled [`RankingSource::Degraded`].
    pub fn fetch_top(&mut self, limit: usize) -> Ranking {
        if let Some(remote) = self.remote.as_ref() {
            match remote.query_top(limit) {
                Ok(mut entries) => {
                    entries.truncate(limit);
                    return Ranking {
                        entries,
                        source: RankingSource::Remote,
                    };
                }
                Err(err) => {
                    error!(target: "leaderboard", "Remote ranking unavailable, showing local: {}", err);
                    return Ranking {
                        entries: self.local_top(limit),
                        source: RankingSource::Degraded,
                    };
                }
            }
        }
        Ranking {
            entries: self.local_top(limit),
            source: RankingSource::Local,
        }
    }

    fn local_top(&mut self, limit: usize) -> Vec<LeaderboardEntry> {
        if let Err(err) = self.ensure_cache_loaded() {
            warn!(target: "leaderboard", "Could not read local ranking: {}", err);
        }
        self.local_cache.iter().take(limit).cloned().collect()
    }

    pub fn local_entries(&mut self) -> Result<&[LeaderboardEntry], LeaderboardError> {
        self.ensure_cache_loaded()?;
        Ok(&self.local_cache)
    }

    /// Key the unreadable blob is moved to before the ranking is rewritten.
    pub fn backup_key(&self) -> String {
        format!("{}.corrupt", self.storage_key)
    }

    /// A read error leaves the cache unloaded, so nothing gets rewritten over data
    /// that could not be read.
    fn ensure_cache_loaded(&mut self) -> Result<(), StorageError> {
        if self.cache_loaded {
            return Ok(());
        }
        let contents = self.storage.get(&self.storage_key)?;
        self.cache_loaded = true;
        self.local_cache = match contents {
            Some(contents) => match serde_json::from_str::<Vec<LeaderboardEntry>>(&contents) {
                Ok(mut entries) => {
                    entries.sort_by_key(|entry| entry.time_ms);
                    entries.truncate(self.max_entries);
                    entries
                }
                Err(err) => {
                    warn!(
                        target: "leaderboard",
                        "Local ranking is unreadable, keeping it under {}: {}",
                        self.backup_key(),
                        err
                    );
                    self.unreadable_blob = Some(contents);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        debug!(target: "leaderboard", "Local ranking holds {} entries", self.local_cache.len());
        Ok(())
    }

    /// Appends, re-sorts (stable, so equal times keep arrival order), caps and rewrites
    /// the whole blob. The cache is updated before persisting, so even a failed write
    /// keeps the entry visible for the rest of the session; that case is reported as
    /// [`LeaderboardError::NotPersisted`].
    fn write_local(&mut self, entry: LeaderboardEntry) -> Result<(), LeaderboardError> {
        self.ensure_cache_loaded()?;
        info!(target: "leaderboard", "Saving {} ({} ms) locally", entry.player_name, entry.time_ms);
        self.local_cache.push(entry);
        self.local_cache.sort_by_key(|entry| entry.time_ms);
        self.local_cache.truncate(self.max_entries);
        self.persist_local().map_err(LeaderboardError::NotPersisted)
    }

    fn persist_local(&mut self) -> Result<(), StorageError> {
        if let Some(blob) = &self.unreadable_blob {
            let backup_key = self.backup_key();
            self.storage.set(&backup_key, blob)?;
            self.unreadable_blob = None;
        }
        let contents =
            serde_json::to_string(&self.local_cache).map_err(|source| StorageError::Serialization {
                key: self.storage_key.clone(),
                source,
            })?;
        self.storage.set(&self.storage_key, &contents)
    }

    pub fn export_local(&mut self) -> Result<RankingExport, LeaderboardError> {
        self.ensure_cache_loaded()?;
        if self.local_cache.is_empty() {
            return Err(LeaderboardError::NothingToExport);
        }
        Ok(RankingExport {
            exported_at: Utc::now(),
            ranking: self.local_cache.clone(),
        })
    }

    pub fn export_to(&mut self, path: &Path) -> Result<RankingExport, LeaderboardError> {
        let export = self.export_local()?;
        let contents = serde_json::to_string_pretty(&export).map_err(|source| {
            StorageError::Serialization {
                key: self.storage_key.clone(),
                source,
            }
        })?;
        fs::write(path, contents).map_err(|source| LeaderboardError::Export {
            path: path.to_path_buf(),
            source,
        })?;
        info!(target: "leaderboard", "Exported {} entries to {}", export.ranking.len(), path.display());
        Ok(export)
    }

    pub fn clear_local(&mut self) -> Result<(), LeaderboardError> {
        self.storage.remove(&self.storage_key)?;
        self.local_cache.clear();
        self.cache_loaded = true;
        self.unreadable_blob = None;
        info!(target: "leaderboard", "Local ranking cleared");
        Ok(())
    }
}
