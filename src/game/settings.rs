use log::warn;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "rhino-detective";
pub const DATA_DIR_ENV: &str = "RHINO_DATA_DIR";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LeaderboardSettings {
    /// Local cache retention.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// How many entries a ranking view asks for.
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,

    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Shared ledger used as the remote backend; local-only when absent.
    #[serde(default)]
    pub remote_ledger: Option<PathBuf>,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_version")]
    version: u32,

    #[serde(default = "default_total_levels")]
    pub total_levels: usize,

    #[serde(default)]
    pub levels_dir: Option<PathBuf>,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_advance_delay")]
    pub advance_delay: Duration,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_tick_interval")]
    pub tick_interval: Duration,

    #[serde(default)]
    pub celebration_messages: Vec<String>,

    #[serde(default)]
    pub leaderboard: LeaderboardSettings,
}

fn default_version() -> u32 {
    2
}
fn default_total_levels() -> usize {
    6
}
fn default_advance_delay() -> Duration {
    Duration::from_millis(1000)
}
fn default_tick_interval() -> Duration {
    Duration::from_millis(100)
}
fn default_max_entries() -> usize {
    100
}
fn default_display_limit() -> usize {
    50
}
fn default_storage_key() -> String {
    "rhino_detective_ranking".to_string()
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        LeaderboardSettings {
            max_entries: default_max_entries(),
            display_limit: default_display_limit(),
            storage_key: default_storage_key(),
            remote_ledger: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: default_version(),
            total_levels: default_total_levels(),
            levels_dir: None,
            advance_delay: default_advance_delay(),
            tick_interval: default_tick_interval(),
            celebration_messages: Vec::new(),
            leaderboard: LeaderboardSettings::default(),
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        let path = Self::settings_path();
        if let Ok(contents) = fs::read_to_string(&path) {
            match Self::from_json(&contents) {
                Ok(settings) => return settings,
                Err(err) => warn!("Ignoring unreadable settings at {}: {}", path.display(), err),
            }
        }
        let default = Settings::default();
        if let Err(err) = default.save() {
            warn!("Could not write default settings: {}", err);
        }
        default
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let mut settings = serde_json::from_str::<Settings>(contents)?;
        settings.migrate();
        Ok(settings)
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        let path = Self::settings_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
    }

    /// `$RHINO_DATA_DIR`, else the platform's local data directory.
    pub fn data_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    fn settings_path() -> PathBuf {
        Self::data_dir().join("settings.json")
    }

    pub fn levels_dir(&self) -> PathBuf {
        self.levels_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("levels"))
    }

    fn migrate(&mut self) {
        match self.version {
            // version 1 stored no leaderboard section; serde defaults already filled it in
            0 | 1 => {
                self.version = 2;
            }
            _ => (),
        }
        if self.total_levels == 0 {
            self.total_levels = default_total_levels();
        }
        // a zero cap would accept submissions and keep none of them
        if self.leaderboard.max_entries == 0 {
            warn!("leaderboard.max_entries is 0, keeping {} instead", default_max_entries());
            self.leaderboard.max_entries = default_max_entries();
        }
        if self.leaderboard.display_limit == 0 {
            self.leaderboard.display_limit = default_display_limit();
        }
    }

    pub fn is_debug_mode() -> bool {
        std::env::var("DEBUG").map(|v| v == "1").unwrap_or(false)
    }

    pub fn seed_from_env() -> Option<u64> {
        std::env::var("SEED").ok().and_then(|v| v.parse::<u64>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_empty_document_gets_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.advance_delay, Duration::from_secs(1));
        assert_eq!(settings.leaderboard.max_entries, 100);
    }

    #[test]
    fn test_durations_are_milliseconds() {
        let settings =
            Settings::from_json(r#"{"advance_delay": 250, "tick_interval": 40}"#).unwrap();
        assert_eq!(settings.advance_delay, Duration::from_millis(250));
        assert_eq!(settings.tick_interval, Duration::from_millis(40));

        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["advance_delay"], 250);
    }

    #[test]
    fn test_migrate_from_version_one() {
        let settings = Settings::from_json(r#"{"version": 1, "total_levels": 0}"#).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.total_levels, 6);
    }

    #[test]
    fn test_zero_leaderboard_limits_are_restored() {
        let settings = Settings::from_json(
            r#"{"version": 2, "leaderboard": {"max_entries": 0, "display_limit": 0}}"#,
        )
        .unwrap();
        assert_eq!(settings.leaderboard.max_entries, 100);
        assert_eq!(settings.leaderboard.display_limit, 50);
    }

    #[test]
    #[serial]
    fn test_save_and_load_in_overridden_data_dir() {
        let temp = tempfile::TempDir::new().expect("temp");
        std::env::set_var(DATA_DIR_ENV, temp.path());

        let mut settings = Settings::default();
        settings.total_levels = 3;
        settings.leaderboard.remote_ledger = Some(temp.path().join("ledger.jsonl"));
        settings.save().expect("save");

        let loaded = Settings::load();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.levels_dir(), temp.path().join("levels"));

        std::env::remove_var(DATA_DIR_ENV);
    }

    #[test]
    #[serial]
    fn test_seed_from_env() {
        std::env::set_var("SEED", "1234");
        assert_eq!(Settings::seed_from_env(), Some(1234));
        std::env::set_var("SEED", "not a number");
        assert_eq!(Settings::seed_from_env(), None);
        std::env::remove_var("SEED");
    }
}
