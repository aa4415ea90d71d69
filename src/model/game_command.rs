use super::Point;

/// Requests sent into the core, usually by the input layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameCommand {
    StartGame,
    PointerClick(Point),
    Pause,
    Resume,
    RetryLevel,
    Abandon,
    Tick,
    SubmitScore { player_name: String },
    ShowRanking,
}
