use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::helpers::format_elapsed;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player_name: String,
    pub time_ms: u64,
    pub recorded_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn new(player_name: impl Into<String>, time_ms: u64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            player_name: player_name.into(),
            time_ms,
            recorded_at,
        }
    }

    pub fn completion_time(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }

    /// `mm:ss.cc`
    pub fn formatted_time(&self) -> String {
        format_elapsed(self.completion_time())
    }
}

/// Where a ranking came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankingSource {
    Remote,
    Local,
    /// The remote query failed; the entries are the local cache.
    Degraded,
}

impl RankingSource {
    pub fn is_degraded(&self) -> bool {
        matches!(self, RankingSource::Degraded)
    }
}

impl fmt::Display for RankingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingSource::Remote => write!(f, "online"),
            RankingSource::Local => write!(f, "local"),
            RankingSource::Degraded => write!(f, "local (online ranking unavailable)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    pub entries: Vec<LeaderboardEntry>,
    pub source: RankingSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingExport {
    pub exported_at: DateTime<Utc>,
    pub ranking: Vec<LeaderboardEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_json_shape() {
        let recorded_at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let entry = LeaderboardEntry::new("Ana", 65432, recorded_at);

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["playerName"], "Ana");
        assert_eq!(value["timeMs"], 65432);
        assert_eq!(value["recordedAt"], "2025-03-14T09:26:53Z");

        let back: LeaderboardEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
        assert_eq!(back.formatted_time(), "01:05.43");
    }

    #[test]
    fn test_source_labels() {
        assert!(RankingSource::Degraded.is_degraded());
        assert!(!RankingSource::Local.is_degraded());
        assert_eq!(RankingSource::Remote.to_string(), "online");
    }
}
