use std::fmt;
use std::time::{Duration, Instant};

/// Identifies one scene load. A result carrying an older ticket is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub level_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading(LoadRequest),
    Playing,
    LevelComplete { advance_at: Instant },
    GameComplete { final_time: Duration },
}

impl SessionPhase {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionPhase::Loading(_) | SessionPhase::Playing | SessionPhase::LevelComplete { .. }
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Loading(request) => write!(f, "loading level {}", request.level_index),
            SessionPhase::Playing => write!(f, "playing"),
            SessionPhase::LevelComplete { .. } => write!(f, "level complete"),
            SessionPhase::GameComplete { .. } => write!(f, "game complete"),
        }
    }
}
