use log::{debug, info, trace, warn};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::celebration::Celebration;
use super::clock::Clock;
use super::leaderboard_store::LeaderboardStore;
use super::level_session::{LevelSession, SessionTransition};
use super::scene_catalog::{DirectorySceneSource, SceneCatalog};
use super::settings::Settings;
use crate::destroyable::Destroyable;
use crate::errors::LeaderboardError;
use crate::events::{EventEmitter, EventObserver, Unsubscriber};
use crate::model::{CompletedRun, GameCommand, GameEvent, LoadRequest, Ranking, RankingSource};

/// Single-threaded dispatcher tying the session, the level catalog and the leaderboard
/// together.
///
/// Commands published on the command channel are queued and only run from
/// [`GameRuntime::pump`], one at a time and each to completion. Scene loads requested
/// by the session are queued the same way and run as their own steps, so a command
/// that arrives before a load completes (an abandon, a restart) is applied first and
/// the stale load result is then discarded by the session.
pub struct GameRuntime {
    session: LevelSession,
    catalog: SceneCatalog,
    leaderboard: LeaderboardStore,
    commands: Rc<RefCell<VecDeque<GameCommand>>>,
    pending_loads: VecDeque<LoadRequest>,
    pending_run: Option<CompletedRun>,
    display_limit: usize,
    command_subscription: Option<Unsubscriber<GameCommand>>,
    game_event_emitter: EventEmitter<GameEvent>,
}

impl Destroyable for GameRuntime {
    fn destroy(&mut self) {
        if let Some(subscription) = self.command_subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl GameRuntime {
    pub fn new(
        session: LevelSession,
        catalog: SceneCatalog,
        leaderboard: LeaderboardStore,
        display_limit: usize,
        game_command_observer: EventObserver<GameCommand>,
        game_event_emitter: EventEmitter<GameEvent>,
    ) -> Self {
        let commands = Rc::new(RefCell::new(VecDeque::new()));
        let queue = commands.clone();
        let subscription = game_command_observer.subscribe(move |command: &GameCommand| {
            queue.borrow_mut().push_back(command.clone());
        });
        Self {
            session,
            catalog,
            leaderboard,
            commands,
            pending_loads: VecDeque::new(),
            pending_run: None,
            display_limit,
            command_subscription: Some(subscription),
            game_event_emitter,
        }
    }

    /// Wires everything from persisted settings: levels from a directory, the ranking
    /// in the data directory and, when configured, a shared ledger as remote backend.
    pub fn from_settings(
        settings: &Settings,
        clock: Rc<dyn Clock>,
        game_command_observer: EventObserver<GameCommand>,
        game_event_emitter: EventEmitter<GameEvent>,
    ) -> Self {
        let messages = settings.celebration_messages.clone();
        let celebration = match Settings::seed_from_env() {
            Some(seed) => Celebration::with_messages(messages, seed),
            None => Celebration::from_entropy(messages),
        };
        if Settings::is_debug_mode() {
            info!("Debug mode; celebration seed {}", celebration.seed());
        }
        let session = LevelSession::new(
            settings.total_levels,
            settings.advance_delay,
            clock,
            celebration,
            game_event_emitter.clone(),
        );
        let catalog = SceneCatalog::new(
            Box::new(DirectorySceneSource::new(settings.levels_dir())),
            settings.total_levels,
        );
        let leaderboard = LeaderboardStore::from_settings(&settings.leaderboard, Settings::data_dir());
        Self::new(
            session,
            catalog,
            leaderboard,
            settings.leaderboard.display_limit,
            game_command_observer,
            game_event_emitter,
        )
    }

    pub fn session(&self) -> &LevelSession {
        &self.session
    }

    pub fn leaderboard(&mut self) -> &mut LeaderboardStore {
        &mut self.leaderboard
    }

    pub fn pending_run(&self) -> Option<CompletedRun> {
        self.pending_run
    }

    pub fn has_pending_work(&self) -> bool {
        !self.commands.borrow().is_empty() || !self.pending_loads.is_empty()
    }

    /// Runs queued commands and loads until both queues are empty. Returns the number of
    /// steps dispatched.
    pub fn pump(&mut self) -> usize {
        let mut steps = 0;
        loop {
            // pop in its own statement so the queue is not borrowed while handling
            let command = self.commands.borrow_mut().pop_front();
            if let Some(command) = command {
                self.handle_command(command);
            } else if let Some(request) = self.pending_loads.pop_front() {
                self.perform_load(request);
            } else {
                break;
            }
            steps += 1;
        }
        steps
    }

    fn handle_command(&mut self, command: GameCommand) {
        trace!(target: "session", "Handling command: {:?}", command);
        match command {
            GameCommand::StartGame => {
                self.pending_run = None;
                let request = self.session.start();
                self.pending_loads.push_back(request);
            }
            GameCommand::PointerClick(point) => {
                self.session.click(point);
            }
            GameCommand::Pause => {
                self.session.pause();
            }
            GameCommand::Resume => {
                self.session.resume();
            }
            GameCommand::RetryLevel => {
                if let Some(request) = self.session.retry() {
                    self.pending_loads.push_back(request);
                }
            }
            GameCommand::Abandon => {
                self.pending_run = None;
                self.session.abandon();
            }
            GameCommand::Tick => self.tick(),
            GameCommand::SubmitScore { player_name } => {
                let _ = self.submit_score(&player_name);
            }
            GameCommand::ShowRanking => {
                self.refresh_ranking();
            }
        }
    }

    fn tick(&mut self) {
        match self.session.tick() {
            Some(SessionTransition::Load(request)) => self.pending_loads.push_back(request),
            Some(SessionTransition::Finished(run)) => self.pending_run = Some(run),
            None => (),
        }
    }

    fn perform_load(&mut self, request: LoadRequest) {
        debug!(target: "catalog", "Loading level {}", request.level_index);
        match self.catalog.load(request.level_index) {
            Ok(scene) => {
                self.session.on_scene_loaded(request.ticket, scene);
            }
            Err(err) => {
                self.session.on_scene_load_failed(request.ticket, &err);
            }
        }
    }

    /// Records the finished run under `player_name` and publishes the refreshed ranking.
    /// A rejected name keeps the run so the player can try again.
    pub fn submit_score(&mut self, player_name: &str) -> Result<RankingSource, LeaderboardError> {
        let Some(run) = self.pending_run else {
            return Err(LeaderboardError::NothingToSubmit);
        };
        let time_ms = i64::try_from(run.final_time.as_millis()).unwrap_or(i64::MAX);
        match self.leaderboard.submit(player_name, time_ms) {
            Ok(source) => {
                self.pending_run = None;
                self.refresh_ranking();
                Ok(source)
            }
            Err(err) => {
                warn!(target: "leaderboard", "Submission failed: {}", err);
                if let LeaderboardError::NotPersisted(_) = err {
                    // the entry is in the in-memory ranking already; resubmitting would duplicate it
                    self.pending_run = None;
                }
                self.game_event_emitter
                    .emit(GameEvent::SubmissionRejected(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn refresh_ranking(&mut self) -> Ranking {
        let ranking = self.leaderboard.fetch_top(self.display_limit);
        self.game_event_emitter
            .emit(GameEvent::LeaderboardUpdated(ranking.clone()));
        ranking
    }
}
