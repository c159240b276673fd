//! Pure playback state machine: `PlaybackState x PlaybackCommand -> Transition`.
//!
//! The reducer never touches timers. It reports what the owner of the timer
//! has to do through [`TimerEffect`], so the whole state machine can be driven
//! deterministically in tests.

use std::time::Duration;

use shared::{
    domain::Story,
    protocol::{CloseReason, PlaybackCommand, PlaybackEvent},
};

use crate::error::PlaybackError;

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(30);
const DEFAULT_STORY_DURATION: Duration = Duration::from_millis(5000);

/// Tick period and per-story duration.
///
/// A story lasts a whole number of ticks, `story_duration / tick_interval`
/// rounded down, so when the duration is not a multiple of the tick the bar
/// fills up to one tick early (100 ms at 30 ms per tick fills after 90 ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTiming {
    pub tick_interval: Duration,
    pub story_duration: Duration,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            story_duration: DEFAULT_STORY_DURATION,
        }
    }
}

impl PlaybackTiming {
    pub fn new(tick_interval: Duration, story_duration: Duration) -> Self {
        Self {
            tick_interval,
            story_duration,
        }
    }

    /// Whole ticks needed to fill one bar; never zero.
    pub fn ticks_per_story(&self) -> u32 {
        let tick = self.tick_interval.as_millis().max(1);
        let ticks = self.story_duration.as_millis() / tick;
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }

    /// Percentage added by a single tick.
    pub fn step(&self) -> f32 {
        100.0 / self.ticks_per_story() as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEffect {
    /// Cancel any running ticker, then start a fresh one.
    Start,
    Stop,
    Keep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub timer: TimerEffect,
    /// Index that just became visible.
    pub entered: Option<usize>,
    pub events: Vec<PlaybackEvent>,
}

impl Transition {
    fn unchanged() -> Self {
        Self {
            timer: TimerEffect::Keep,
            entered: None,
            events: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.timer == TimerEffect::Keep && self.entered.is_none() && self.events.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    is_open: bool,
    current_index: usize,
    elapsed_ticks: u32,
    is_paused: bool,
    ticks_per_story: u32,
}

impl PlaybackState {
    pub fn new(timing: PlaybackTiming) -> Self {
        Self {
            is_open: false,
            current_index: 0,
            elapsed_ticks: 0,
            is_paused: false,
            ticks_per_story: timing.ticks_per_story(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_playing(&self) -> bool {
        self.is_open && !self.is_paused
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Bar fill for the current story, in `[0, 100]`.
    pub fn progress(&self) -> f32 {
        if self.elapsed_ticks >= self.ticks_per_story {
            return 100.0;
        }
        self.elapsed_ticks as f32 * 100.0 / self.ticks_per_story as f32
    }

    /// Fill of bar `index`: earlier stories are full, later ones empty.
    pub fn bar_progress(&self, index: usize) -> f32 {
        if !self.is_open {
            return 0.0;
        }
        match index.cmp(&self.current_index) {
            std::cmp::Ordering::Less => 100.0,
            std::cmp::Ordering::Equal => self.progress(),
            std::cmp::Ordering::Greater => 0.0,
        }
    }

    pub fn apply(
        &mut self,
        command: PlaybackCommand,
        stories: &[Story],
    ) -> Result<Transition, PlaybackError> {
        let transition = match command {
            PlaybackCommand::Open { index } => self.open(index, stories)?,
            PlaybackCommand::Tick => self.tick(stories),
            PlaybackCommand::Next => self.next(stories),
            PlaybackCommand::Prev => self.prev(stories),
            PlaybackCommand::Pause => self.pause(),
            PlaybackCommand::Resume => self.resume(),
            PlaybackCommand::Close => self.close(CloseReason::UserClosed),
        };
        Ok(transition)
    }

    fn open(&mut self, index: usize, stories: &[Story]) -> Result<Transition, PlaybackError> {
        if stories.is_empty() {
            return Err(PlaybackError::EmptyStore);
        }
        let Some(story) = stories.get(index) else {
            return Err(PlaybackError::IndexOutOfRange {
                index,
                len: stories.len(),
            });
        };

        let mut events = Vec::with_capacity(2);
        if self.is_open {
            events.push(PlaybackEvent::Closed {
                reason: CloseReason::Reopened,
            });
        }

        self.is_open = true;
        self.current_index = index;
        self.elapsed_ticks = 0;
        self.is_paused = false;

        events.push(PlaybackEvent::Opened {
            index,
            story_id: story.id,
        });
        Ok(Transition {
            timer: TimerEffect::Start,
            entered: Some(index),
            events,
        })
    }

    fn tick(&mut self, stories: &[Story]) -> Transition {
        if !self.is_playing() {
            return Transition::unchanged();
        }

        self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);
        if self.elapsed_ticks >= self.ticks_per_story {
            return self.advance(stories, TimerEffect::Keep);
        }

        Transition {
            timer: TimerEffect::Keep,
            entered: None,
            events: vec![PlaybackEvent::Progress {
                index: self.current_index,
                progress: self.progress(),
            }],
        }
    }

    fn next(&mut self, stories: &[Story]) -> Transition {
        if !self.is_open {
            return Transition::unchanged();
        }
        self.advance(stories, TimerEffect::Start)
    }

    fn prev(&mut self, stories: &[Story]) -> Transition {
        if !self.is_open || self.current_index == 0 {
            return Transition::unchanged();
        }
        let from = self.current_index;
        let to = (from - 1).min(stories.len().saturating_sub(1));
        self.enter(from, to, stories, TimerEffect::Start)
    }

    fn pause(&mut self) -> Transition {
        if !self.is_playing() {
            return Transition::unchanged();
        }
        self.is_paused = true;
        Transition {
            timer: TimerEffect::Stop,
            entered: None,
            events: vec![PlaybackEvent::Paused {
                index: self.current_index,
                progress: self.progress(),
            }],
        }
    }

    fn resume(&mut self) -> Transition {
        if !self.is_open || !self.is_paused {
            return Transition::unchanged();
        }
        self.is_paused = false;
        Transition {
            timer: TimerEffect::Start,
            entered: None,
            events: vec![PlaybackEvent::Resumed {
                index: self.current_index,
                progress: self.progress(),
            }],
        }
    }

    fn close(&mut self, reason: CloseReason) -> Transition {
        if !self.is_open {
            return Transition::unchanged();
        }
        self.reset();
        Transition {
            timer: TimerEffect::Stop,
            entered: None,
            events: vec![PlaybackEvent::Closed { reason }],
        }
    }

    /// Moves to the following story, or finishes the session on the last one.
    fn advance(&mut self, stories: &[Story], timer: TimerEffect) -> Transition {
        let from = self.current_index;
        let to = from + 1;
        if to >= stories.len() {
            return self.close(CloseReason::Finished);
        }
        // Leaving a paused story always needs a fresh ticker.
        let timer = if self.is_paused {
            TimerEffect::Start
        } else {
            timer
        };
        self.enter(from, to, stories, timer)
    }

    fn enter(
        &mut self,
        from: usize,
        to: usize,
        stories: &[Story],
        timer: TimerEffect,
    ) -> Transition {
        self.current_index = to;
        self.elapsed_ticks = 0;
        self.is_paused = false;

        let events = stories
            .get(to)
            .map(|story| PlaybackEvent::Advanced {
                from,
                to,
                story_id: story.id,
            })
            .into_iter()
            .collect();

        Transition {
            timer,
            entered: Some(to),
            events,
        }
    }

    fn reset(&mut self) {
        self.is_open = false;
        self.current_index = 0;
        self.elapsed_ticks = 0;
        self.is_paused = false;
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
