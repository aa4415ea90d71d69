use std::time::Duration;
use uuid::Uuid;

use super::{ObjectId, Ranking};

/// A finished playthrough waiting for the player's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedRun {
    pub final_time: Duration,
    pub playthrough_id: Uuid,
}

/// Feedback emitted by the core for whatever renders the game.
#[derive(Debug, Clone)]
pub enum GameEvent {
    SceneLoaded {
        level_index: usize,
        total_levels: usize,
        background: String,
        object_count: usize,
    },
    SceneUnavailable {
        level_index: usize,
        reason: String,
    },
    ObjectFound {
        object_id: ObjectId,
        message: String,
        found_count: usize,
        object_count: usize,
    },
    LevelComplete {
        level_index: usize,
        total_levels: usize,
    },
    GameComplete(CompletedRun),
    TimerTick(Duration),
    SessionPaused(Duration),
    SessionResumed,
    SessionAbandoned,
    LeaderboardUpdated(Ranking),
    SubmissionRejected(String),
}
