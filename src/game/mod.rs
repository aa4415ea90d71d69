pub mod celebration;
pub mod clock;
pub mod leaderboard_store;
pub mod level_session;
pub mod local_storage;
pub mod remote_backend;
pub mod runtime;
pub mod scene_catalog;
pub mod settings;

pub use celebration::Celebration;
pub use clock::{Clock, ManualClock, SystemClock};
pub use hit_test::resolve_hit;
pub use leaderboard_store::{BackendMode, LeaderboardStore};
pub use level_session::{LevelSession, SessionTransition, DEFAULT_ADVANCE_DELAY};
pub use local_storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use remote_backend::{LedgerFileBackend, RemoteBackend};
pub use runtime::GameRuntime;
pub use scene_catalog::{DirectorySceneSource, InMemorySceneSource, SceneCatalog, SceneSource};
pub use settings::{LeaderboardSettings, Settings};
