use log::{debug, info, trace, warn};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;
use uuid::Uuid;

use super::celebration::Celebration;
use super::clock::Clock;
use super::hit_test::resolve_hit;
use crate::errors::{HitRejection, SceneLoadError};
use crate::events::EventEmitter;
use crate::model::{
    CompletedRun, GameEvent, LoadRequest, LoadTicket, ObjectId, Point, Scene, SessionPhase,
    TimerState,
};

pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(1000);

/// What the host has to do after a tick moved the session forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransition {
    Load(LoadRequest),
    Finished(CompletedRun),
}

/// Progression state for one playthrough.
///
/// Scene loading happens outside: [`LevelSession::start`] and friends hand back a
/// [`LoadRequest`], and the result comes back through [`LevelSession::on_scene_loaded`]
/// or [`LevelSession::on_scene_load_failed`] with the request's ticket. Only the ticket
/// of the load currently awaited is accepted, so late results from an abandoned or
/// restarted session are dropped.
pub struct LevelSession {
    total_levels: usize,
    current_level_index: usize,
    phase: SessionPhase,
    active_scene: Option<Rc<Scene>>,
    found: HashSet<ObjectId>,
    timer_state: TimerState,
    is_paused: bool,
    next_ticket: u64,
    failed_level: Option<usize>,
    playthrough_id: Uuid,
    advance_delay: Duration,
    clock: Rc<dyn Clock>,
    celebration: Celebration,
    game_event_emitter: EventEmitter<GameEvent>,
}

impl LevelSession {
    pub fn new(
        total_levels: usize,
        advance_delay: Duration,
        clock: Rc<dyn Clock>,
        celebration: Celebration,
        game_event_emitter: EventEmitter<GameEvent>,
    ) -> Self {
        Self {
            total_levels,
            current_level_index: 1,
            phase: SessionPhase::Idle,
            active_scene: None,
            found: HashSet::new(),
            timer_state: TimerState::default(),
            is_paused: false,
            next_ticket: 0,
            failed_level: None,
            playthrough_id: Uuid::new_v4(),
            advance_delay,
            clock,
            celebration,
            game_event_emitter,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn current_level_index(&self) -> usize {
        self.current_level_index
    }

    pub fn total_levels(&self) -> usize {
        self.total_levels
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.active_scene.as_deref()
    }

    pub fn found(&self) -> &HashSet<ObjectId> {
        &self.found
    }

    pub fn failed_level(&self) -> Option<usize> {
        self.failed_level
    }

    pub fn playthrough_id(&self) -> Uuid {
        self.playthrough_id
    }

    pub fn elapsed(&self) -> Duration {
        self.timer_state.elapsed(self.clock.now())
    }

    /// Begins a new playthrough at level 1, discarding any previous progress.
    pub fn start(&mut self) -> LoadRequest {
        let now = self.clock.now();
        info!(target: "session", "New game; {} levels", self.total_levels);
        self.current_level_index = 1;
        self.active_scene = None;
        self.found.clear();
        self.failed_level = None;
        self.is_paused = false;
        self.playthrough_id = Uuid::new_v4();
        self.timer_state.start(now);
        self.request_load(1)
    }

    fn request_load(&mut self, level_index: usize) -> LoadRequest {
        let request = LoadRequest {
            ticket: LoadTicket(self.next_ticket),
            level_index,
        };
        self.next_ticket += 1;
        self.phase = SessionPhase::Loading(request);
        debug!(target: "session", "Requesting level {} ({:?})", level_index, request.ticket);
        request
    }

    fn awaited_request(&self, ticket: LoadTicket) -> Option<LoadRequest> {
        match self.phase {
            SessionPhase::Loading(request) if request.ticket == ticket => Some(request),
            _ => None,
        }
    }

    /// Returns false when the result was not the one being awaited and was dropped.
    pub fn on_scene_loaded(&mut self, ticket: LoadTicket, scene: Scene) -> bool {
        let Some(request) = self.awaited_request(ticket) else {
            debug!(target: "session", "Discarding stale scene for level {}", scene.level_index);
            return false;
        };
        if scene.level_index != request.level_index {
            let reason = format!(
                "expected level {} but received level {}",
                request.level_index, scene.level_index
            );
            self.fail_load(request.level_index, reason);
            return true;
        }

        self.current_level_index = request.level_index;
        self.found.clear();
        self.game_event_emitter.emit(GameEvent::SceneLoaded {
            level_index: scene.level_index,
            total_levels: self.total_levels,
            background: scene.background.clone(),
            object_count: scene.object_count(),
        });
        info!(
            target: "session",
            "Level {}/{} ready with {} objects",
            scene.level_index,
            self.total_levels,
            scene.object_count()
        );
        self.active_scene = Some(Rc::new(scene));
        self.phase = SessionPhase::Playing;
        true
    }

    /// Returns false when the failure was for a load nobody is waiting on.
    pub fn on_scene_load_failed(&mut self, ticket: LoadTicket, error: &SceneLoadError) -> bool {
        let Some(request) = self.awaited_request(ticket) else {
            debug!(target: "session", "Ignoring stale load failure: {}", error);
            return false;
        };
        self.fail_load(request.level_index, error.to_string());
        true
    }

    fn fail_load(&mut self, level_index: usize, reason: String) {
        warn!(target: "session", "Level {} unavailable: {}", level_index, reason);
        self.timer_state.pause(self.clock.now());
        self.active_scene = None;
        self.found.clear();
        self.failed_level = Some(level_index);
        self.phase = SessionPhase::Idle;
        self.game_event_emitter
            .emit(GameEvent::SceneUnavailable { level_index, reason });
    }

    /// Re-requests the level whose load failed, keeping the time already played.
    pub fn retry(&mut self) -> Option<LoadRequest> {
        if self.phase != SessionPhase::Idle {
            return None;
        }
        let level_index = self.failed_level.take()?;
        self.is_paused = false;
        self.timer_state.resume(self.clock.now());
        Some(self.request_load(level_index))
    }

    pub fn register_hit(&mut self, object_id: &str) -> Result<(), HitRejection> {
        if self.phase != SessionPhase::Playing {
            return Err(HitRejection::NotPlaying);
        }
        if self.is_paused {
            return Err(HitRejection::Paused);
        }
        let Some(scene) = self.active_scene.clone() else {
            return Err(HitRejection::NotPlaying);
        };
        if !scene.contains_object(object_id) {
            return Err(HitRejection::UnknownObject(object_id.to_string()));
        }
        if !self.found.insert(object_id.to_string()) {
            return Err(HitRejection::AlreadyFound(object_id.to_string()));
        }

        let message = self.celebration.pick();
        trace!(target: "session", "Found {} ({})", object_id, message);
        self.game_event_emitter.emit(GameEvent::ObjectFound {
            object_id: object_id.to_string(),
            message,
            found_count: self.found.len(),
            object_count: scene.object_count(),
        });

        if self.found.len() == scene.object_count() {
            self.phase = SessionPhase::LevelComplete {
                advance_at: self.clock.now() + self.advance_delay,
            };
            info!(target: "session", "Level {} complete", scene.level_index);
            self.game_event_emitter.emit(GameEvent::LevelComplete {
                level_index: scene.level_index,
                total_levels: self.total_levels,
            });
        }
        Ok(())
    }

    /// Resolves a pointer position against the active scene and records the hit.
    pub fn click(&mut self, point: Point) -> Option<ObjectId> {
        if self.phase != SessionPhase::Playing || self.is_paused {
            trace!(target: "session", "Ignoring click at {:?} while {}", point, self.phase);
            return None;
        }
        let scene = self.active_scene.clone()?;
        let object_id = resolve_hit(&scene, &self.found, point)?.id.clone();
        self.register_hit(&object_id).ok()?;
        Some(object_id)
    }

    /// Publishes the current elapsed time and performs a level advance once its delay is up.
    pub fn tick(&mut self) -> Option<SessionTransition> {
        let now = self.clock.now();
        if self.phase.is_active() {
            self.game_event_emitter
                .emit(GameEvent::TimerTick(self.timer_state.elapsed(now)));
        }
        match self.phase {
            SessionPhase::LevelComplete { advance_at } if !self.is_paused && now >= advance_at => {
                Some(self.advance())
            }
            _ => None,
        }
    }

    fn advance(&mut self) -> SessionTransition {
        self.active_scene = None;
        self.found.clear();
        if self.current_level_index < self.total_levels {
            self.current_level_index += 1;
            SessionTransition::Load(self.request_load(self.current_level_index))
        } else {
            SessionTransition::Finished(self.finish())
        }
    }

    fn finish(&mut self) -> CompletedRun {
        let now = self.clock.now();
        self.timer_state.stop(now);
        let final_time = self.timer_state.elapsed(now);
        self.phase = SessionPhase::GameComplete { final_time };
        let run = CompletedRun {
            final_time,
            playthrough_id: self.playthrough_id,
        };
        info!(target: "session", "Game complete in {:?}", final_time);
        self.game_event_emitter.emit(GameEvent::GameComplete(run));
        run
    }

    pub fn pause(&mut self) -> bool {
        if !self.phase.is_active() || self.is_paused {
            return false;
        }
        let now = self.clock.now();
        self.is_paused = true;
        self.timer_state.pause(now);
        self.game_event_emitter
            .emit(GameEvent::SessionPaused(self.timer_state.elapsed(now)));
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.phase.is_active() || !self.is_paused {
            return false;
        }
        self.is_paused = false;
        self.timer_state.resume(self.clock.now());
        self.game_event_emitter.emit(GameEvent::SessionResumed);
        true
    }

    /// Drops the playthrough without recording anything.
    pub fn abandon(&mut self) {
        let was_idle = self.phase == SessionPhase::Idle && self.failed_level.is_none();
        self.timer_state.stop(self.clock.now());
        self.phase = SessionPhase::Idle;
        self.active_scene = None;
        self.found.clear();
        self.failed_level = None;
        self.is_paused = false;
        if !was_idle {
            info!(target: "session", "Session abandoned");
            self.game_event_emitter.emit(GameEvent::SessionAbandoned);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use test_context::test_context;

    use super::*;
    use crate::events::Channel;
    use crate::game::clock::ManualClock;
    use crate::model::{HiddenObject, Region};
    use crate::tests::UsingLogger;

    struct Harness {
        session: LevelSession,
        clock: Rc<ManualClock>,
        events: Rc<RefCell<Vec<GameEvent>>>,
    }

    fn harness(total_levels: usize) -> Harness {
        let (emitter, observer) = Channel::<GameEvent>::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let _ = observer.subscribe(move |event: &GameEvent| sink.borrow_mut().push(event.clone()));
        let clock = Rc::new(ManualClock::default());
        let session = LevelSession::new(
            total_levels,
            DEFAULT_ADVANCE_DELAY,
            clock.clone(),
            Celebration::seeded(11),
            emitter,
        );
        Harness {
            session,
            clock,
            events,
        }
    }

    fn two_object_scene(level_index: usize) -> Scene {
        Scene::new(
            level_index,
            format!("screen{:02}.png", level_index),
            vec![
                HiddenObject::with_single_region("a", Region::new(10, 10, 5, 5)),
                HiddenObject::with_single_region("b", Region::new(50, 50, 5, 5)),
            ],
        )
        .unwrap()
    }

    fn count(events: &Rc<RefCell<Vec<GameEvent>>>, pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.borrow().iter().filter(|e| pred(e)).count()
    }

    fn is_found(event: &GameEvent) -> bool {
        matches!(event, GameEvent::ObjectFound { .. })
    }

    fn is_level_complete(event: &GameEvent) -> bool {
        matches!(event, GameEvent::LevelComplete { .. })
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_two_object_scene_advances_after_delay(_: &mut UsingLogger) {
        let mut h = harness(2);
        let request = h.session.start();
        assert_eq!(request.level_index, 1);
        assert!(h.session.on_scene_loaded(request.ticket, two_object_scene(1)));
        assert_eq!(h.session.phase(), SessionPhase::Playing);

        assert_eq!(h.session.click(Point::new(12, 12)).as_deref(), Some("a"));
        assert_eq!(h.session.found().len(), 1);
        assert_eq!(count(&h.events, is_level_complete), 0);

        assert_eq!(h.session.click(Point::new(52, 52)).as_deref(), Some("b"));
        assert_eq!(h.session.found().len(), 2);
        assert_eq!(count(&h.events, is_level_complete), 1);
        assert!(matches!(h.session.phase(), SessionPhase::LevelComplete { .. }));

        h.clock.advance(Duration::from_millis(500));
        assert_eq!(h.session.tick(), None);

        h.clock.advance(Duration::from_millis(500));
        match h.session.tick() {
            Some(SessionTransition::Load(next)) => {
                assert_eq!(next.level_index, 2);
                assert_ne!(next.ticket, request.ticket);
            }
            other => panic!("unexpected transition: {:?}", other),
        }
        assert_eq!(h.session.current_level_index(), 2);
        assert!(h.session.found().is_empty());
        assert_eq!(count(&h.events, is_level_complete), 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_single_level_game_completes_and_stops_timer(_: &mut UsingLogger) {
        let mut h = harness(1);
        let request = h.session.start();
        h.session.on_scene_loaded(request.ticket, two_object_scene(1));
        h.clock.advance(Duration::from_secs(3));
        h.session.click(Point::new(10, 10));
        h.clock.advance(Duration::from_secs(2));
        h.session.click(Point::new(55, 55));
        h.clock.advance(DEFAULT_ADVANCE_DELAY);

        let run = match h.session.tick() {
            Some(SessionTransition::Finished(run)) => run,
            other => panic!("unexpected transition: {:?}", other),
        };
        assert_eq!(run.final_time, Duration::from_secs(6));
        assert_eq!(run.playthrough_id, h.session.playthrough_id());
        assert!(!h.session.is_active());

        h.clock.advance(Duration::from_secs(60));
        assert_eq!(h.session.elapsed(), Duration::from_secs(6));
        assert_eq!(h.session.tick(), None);
        assert_eq!(
            count(&h.events, |e| matches!(e, GameEvent::GameComplete(_))),
            1
        );
    }

    #[test]
    fn test_duplicate_hit_is_rejected_without_second_event() {
        let mut h = harness(2);
        let request = h.session.start();
        h.session.on_scene_loaded(request.ticket, two_object_scene(1));

        assert_eq!(h.session.register_hit("a"), Ok(()));
        assert_eq!(
            h.session.register_hit("a"),
            Err(HitRejection::AlreadyFound("a".to_string()))
        );
        assert_eq!(h.session.found().len(), 1);
        assert_eq!(count(&h.events, is_found), 1);

        assert_eq!(
            h.session.register_hit("zebra"),
            Err(HitRejection::UnknownObject("zebra".to_string()))
        );
    }

    #[test]
    fn test_found_set_never_shrinks_while_playing() {
        let mut h = harness(1);
        let request = h.session.start();
        h.session.on_scene_loaded(request.ticket, two_object_scene(1));

        let mut last = 0;
        for point in [(0, 0), (12, 12), (12, 12), (100, 100), (51, 51)] {
            h.session.click(Point::new(point.0, point.1));
            let size = h.session.found().len();
            assert!(size >= last);
            last = size;
        }
        assert_eq!(last, 2);
    }

    #[test]
    fn test_hits_during_pending_advance_are_rejected() {
        let mut h = harness(2);
        let request = h.session.start();
        h.session.on_scene_loaded(request.ticket, two_object_scene(1));
        h.session.register_hit("a").unwrap();
        h.session.register_hit("b").unwrap();

        assert_eq!(h.session.register_hit("a"), Err(HitRejection::NotPlaying));
        assert_eq!(h.session.click(Point::new(12, 12)), None);

        h.clock.advance(DEFAULT_ADVANCE_DELAY);
        let next = match h.session.tick() {
            Some(SessionTransition::Load(next)) => next,
            other => panic!("unexpected transition: {:?}", other),
        };
        // still loading level 2
        assert_eq!(h.session.register_hit("a"), Err(HitRejection::NotPlaying));

        let level_two = Scene::new(
            2,
            "screen02.png",
            vec![HiddenObject::with_single_region("c", Region::new(0, 0, 1, 1))],
        )
        .unwrap();
        h.session.on_scene_loaded(next.ticket, level_two);
        assert_eq!(
            h.session.register_hit("a"),
            Err(HitRejection::UnknownObject("a".to_string()))
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_load_failure_stops_timer_and_retry_keeps_progress(_: &mut UsingLogger) {
        let mut h = harness(3);
        let request = h.session.start();
        h.clock.advance(Duration::from_secs(4));

        let error = SceneLoadError::EmptyScene { level: 1 };
        assert!(h.session.on_scene_load_failed(request.ticket, &error));
        assert_eq!(h.session.phase(), SessionPhase::Idle);
        assert!(!h.session.is_active());
        assert!(h.session.active_scene().is_none());
        assert_eq!(h.session.failed_level(), Some(1));
        assert_eq!(
            count(&h.events, |e| matches!(e, GameEvent::SceneUnavailable { level_index: 1, .. })),
            1
        );

        h.clock.advance(Duration::from_secs(30));
        assert_eq!(h.session.elapsed(), Duration::from_secs(4));

        let retry = h.session.retry().expect("retry request");
        assert_eq!(retry.level_index, 1);
        h.clock.advance(Duration::from_secs(1));
        assert!(h.session.on_scene_loaded(retry.ticket, two_object_scene(1)));
        assert_eq!(h.session.elapsed(), Duration::from_secs(5));
        assert_eq!(h.session.retry(), None);
    }

    #[test]
    fn test_abandon_mid_load_discards_late_scene() {
        let mut h = harness(2);
        let request = h.session.start();
        h.session.abandon();

        assert!(!h.session.on_scene_loaded(request.ticket, two_object_scene(1)));
        assert_eq!(h.session.phase(), SessionPhase::Idle);
        assert!(h.session.active_scene().is_none());
        assert!(!h.session.on_scene_load_failed(
            request.ticket,
            &SceneLoadError::UnknownLevel { level: 1 }
        ));
        assert_eq!(
            count(&h.events, |e| matches!(e, GameEvent::SessionAbandoned)),
            1
        );
    }

    #[test]
    fn test_restart_invalidates_previous_ticket() {
        let mut h = harness(2);
        let first = h.session.start();
        let second = h.session.start();

        assert!(!h.session.on_scene_loaded(first.ticket, two_object_scene(1)));
        assert!(h.session.on_scene_loaded(second.ticket, two_object_scene(1)));
    }

    #[test]
    fn test_scene_for_wrong_level_fails_the_load() {
        let mut h = harness(2);
        let request = h.session.start();
        assert!(h.session.on_scene_loaded(request.ticket, two_object_scene(2)));
        assert_eq!(h.session.phase(), SessionPhase::Idle);
        assert_eq!(h.session.failed_level(), Some(1));
    }

    #[test]
    fn test_pause_freezes_time_and_blocks_hits() {
        let mut h = harness(1);
        let request = h.session.start();
        h.session.on_scene_loaded(request.ticket, two_object_scene(1));
        h.clock.advance(Duration::from_secs(2));

        assert!(h.session.pause());
        assert!(!h.session.pause());
        assert_eq!(h.session.register_hit("a"), Err(HitRejection::Paused));
        assert_eq!(h.session.click(Point::new(12, 12)), None);

        h.clock.advance(Duration::from_secs(10));
        assert_eq!(h.session.elapsed(), Duration::from_secs(2));

        assert!(h.session.resume());
        h.clock.advance(Duration::from_secs(1));
        assert_eq!(h.session.elapsed(), Duration::from_secs(3));
        assert_eq!(h.session.register_hit("a"), Ok(()));
    }

    #[test]
    fn test_ticks_report_elapsed_time_only_while_active() {
        let mut h = harness(1);
        h.session.tick();
        assert_eq!(count(&h.events, |e| matches!(e, GameEvent::TimerTick(_))), 0);

        h.session.start();
        h.clock.advance(Duration::from_millis(100));
        h.session.tick();
        h.session.tick();
        let ticks: Vec<Duration> = h
            .events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                GameEvent::TimerTick(elapsed) => Some(*elapsed),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![Duration::from_millis(100), Duration::from_millis(100)]);
    }
}
