//! Story playback controller.
//!
//! Owns the [`PlaybackState`] and the single [`Ticker`] that drives it. All
//! commands and ticks are serialized through one session lock, so a command
//! fully resolves before the next tick observes the state. Every `Start`
//! effect cancels the previous ticker before spawning a new one, and every
//! `Stop` effect cancels it, so at most one ticker is ever alive per
//! controller.

use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use shared::{
    domain::Story,
    protocol::{PlaybackCommand, PlaybackEvent},
};
use tokio::{runtime::Handle, sync::broadcast};
use tracing::{debug, info, warn};

use crate::{
    error::PlaybackError,
    reducer::{PlaybackState, PlaybackTiming, TimerEffect, Transition},
    store::StoryStore,
    ticker::Ticker,
};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// What the viewer surface reads to render a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub is_open: bool,
    pub current_index: usize,
    pub progress: f32,
    pub is_paused: bool,
    pub current_story: Option<Story>,
}

/// Cheap to clone; all clones drive the same session. Dropping the last
/// clone cancels the ticker.
#[derive(Clone)]
pub struct PlaybackController {
    shared: Arc<Shared>,
}

struct Shared {
    store: Arc<StoryStore>,
    timing: PlaybackTiming,
    session: Mutex<Session>,
    events: broadcast::Sender<PlaybackEvent>,
}

struct Session {
    state: PlaybackState,
    /// Sequence the current session was opened with.
    stories: Arc<Vec<Story>>,
    ticker: Option<Ticker>,
    generation: u64,
}

impl PlaybackController {
    pub fn new(store: Arc<StoryStore>, timing: PlaybackTiming) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                store,
                timing,
                session: Mutex::new(Session {
                    state: PlaybackState::new(timing),
                    stories: Arc::new(Vec::new()),
                    ticker: None,
                    generation: 0,
                }),
                events,
            }),
        }
    }

    pub fn timing(&self) -> PlaybackTiming {
        self.shared.timing
    }

    pub fn store(&self) -> &Arc<StoryStore> {
        &self.shared.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.shared.events.subscribe()
    }

    /// Opens the viewer at `index` of the current store snapshot.
    ///
    /// The ticker is spawned on the current tokio runtime. Without one the
    /// command fails with [`PlaybackError::NoRuntime`] and nothing changes.
    pub fn open(&self, index: usize) -> Result<(), PlaybackError> {
        self.dispatch(PlaybackCommand::Open { index }).map(|_| ())
    }

    pub fn next(&self) {
        self.dispatch_infallible(PlaybackCommand::Next);
    }

    pub fn prev(&self) {
        self.dispatch_infallible(PlaybackCommand::Prev);
    }

    pub fn pause(&self) {
        self.dispatch_infallible(PlaybackCommand::Pause);
    }

    pub fn resume(&self) {
        self.dispatch_infallible(PlaybackCommand::Resume);
    }

    pub fn close(&self) {
        self.dispatch_infallible(PlaybackCommand::Close);
    }

    /// Applies `command` and returns whether anything changed.
    ///
    /// State is only replaced once the transition can be carried out, so a
    /// rejected command leaves the session as it was.
    pub fn dispatch(&self, command: PlaybackCommand) -> Result<bool, PlaybackError> {
        let runtime = Handle::try_current().ok();
        let mut session = self.shared.lock_session();

        let stories = match command {
            PlaybackCommand::Open { .. } => self.shared.store.list(),
            _ => Arc::clone(&session.stories),
        };

        let mut next = session.state.clone();
        let transition = match next.apply(command, &stories) {
            Ok(transition) => transition,
            Err(err) => {
                warn!(?command, error = %err, "playback command rejected");
                return Err(err);
            }
        };

        if transition.is_noop() {
            debug!(?command, "playback command ignored in current state");
            return Ok(false);
        }

        if transition.timer == TimerEffect::Start && runtime.is_none() {
            warn!(?command, "playback command needs a tokio runtime for its ticker");
            return Err(PlaybackError::NoRuntime);
        }

        session.state = next;
        session.stories = stories;
        self.shared.commit(&mut session, transition, runtime.as_ref());
        Ok(true)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let session = self.shared.lock_session();
        let state = &session.state;
        let current_story = if state.is_open() {
            session.stories.get(state.current_index()).cloned()
        } else {
            None
        };

        PlaybackSnapshot {
            is_open: state.is_open(),
            current_index: state.current_index(),
            progress: state.progress(),
            is_paused: state.is_paused(),
            current_story,
        }
    }

    /// One fill percentage per story in the open session; empty when closed.
    pub fn progress_bars(&self) -> Vec<f32> {
        let session = self.shared.lock_session();
        if !session.state.is_open() {
            return Vec::new();
        }
        (0..session.stories.len())
            .map(|index| session.state.bar_progress(index))
            .collect()
    }

    pub fn has_active_ticker(&self) -> bool {
        let session = self.shared.lock_session();
        session
            .ticker
            .as_ref()
            .is_some_and(|ticker| !ticker.is_finished())
    }

    fn dispatch_infallible(&self, command: PlaybackCommand) {
        // Failures are already logged by `dispatch`.
        let _ = self.dispatch(command);
    }
}

impl Shared {
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(
        self: &Arc<Self>,
        session: &mut Session,
        transition: Transition,
        runtime: Option<&Handle>,
    ) {
        match transition.timer {
            TimerEffect::Start => match runtime {
                Some(runtime) => self.restart_ticker(session, runtime),
                None => warn!("no tokio runtime; ticker not started"),
            },
            TimerEffect::Stop => {
                if let Some(ticker) = session.ticker.take() {
                    ticker.cancel();
                }
            }
            TimerEffect::Keep => {}
        }

        if let Some(index) = transition.entered {
            if let Some(story) = Arc::make_mut(&mut session.stories).get_mut(index) {
                story.viewed = true;
                self.store.mark_viewed(story.id);
            }
        }

        for event in transition.events {
            match &event {
                PlaybackEvent::Opened { index, story_id } => {
                    info!(index, story_id = story_id.0, "story viewer opened");
                }
                PlaybackEvent::Advanced { from, to, story_id } => {
                    info!(from, to, story_id = story_id.0, "story viewer advanced");
                }
                PlaybackEvent::Closed { reason } => {
                    info!(?reason, "story viewer closed");
                }
                PlaybackEvent::Paused { index, progress }
                | PlaybackEvent::Resumed { index, progress } => {
                    debug!(
                        index,
                        progress,
                        paused = session.state.is_paused(),
                        "story playback toggled"
                    );
                }
                PlaybackEvent::Progress { .. } => {}
            }
            // No subscribers is fine; the surface may poll snapshots instead.
            let _ = self.events.send(event);
        }
    }

    fn restart_ticker(self: &Arc<Self>, session: &mut Session, runtime: &Handle) {
        if let Some(previous) = session.ticker.take() {
            previous.cancel();
        }

        session.generation = session.generation.wrapping_add(1);
        let generation = session.generation;
        let shared: Weak<Shared> = Arc::downgrade(self);

        session.ticker = Some(Ticker::spawn(runtime, self.timing.tick_interval, move || {
            match shared.upgrade() {
                Some(shared) => shared.on_tick(generation),
                None => ControlFlow::Break(()),
            }
        }));
    }

    fn on_tick(self: &Arc<Self>, generation: u64) -> ControlFlow<()> {
        let mut session = self.lock_session();
        // A cancelled ticker may already be waiting on the lock.
        if session.generation != generation || !session.state.is_playing() {
            return ControlFlow::Break(());
        }

        let stories = Arc::clone(&session.stories);
        let transition = match session.state.apply(PlaybackCommand::Tick, &stories) {
            Ok(transition) => transition,
            Err(err) => {
                warn!(error = %err, "tick rejected");
                return ControlFlow::Break(());
            }
        };

        let keep_ticking = transition.timer == TimerEffect::Keep;
        let runtime = Handle::try_current().ok();
        self.commit(&mut session, transition, runtime.as_ref());

        if keep_ticking {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
