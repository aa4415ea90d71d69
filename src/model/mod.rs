mod game_command;
mod game_event;
mod hidden_object;
mod hit_region;
mod leaderboard_entry;
mod scene;
mod session_phase;
mod timer_state;

pub use game_command::GameCommand;
pub use game_event::{CompletedRun, GameEvent};
pub use hidden_object::{HiddenObject, ObjectId};
pub use hit_region::{Point, Region};
pub use leaderboard_entry::{LeaderboardEntry, Ranking, RankingExport, RankingSource};
pub use scene::Scene;
pub use session_phase::{LoadRequest, LoadTicket, SessionPhase};
pub use timer_state::TimerState;
