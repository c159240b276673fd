use serde::{Deserialize, Serialize};

use crate::domain::StoryId;

/// Commands accepted by the story playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PlaybackCommand {
    Open { index: usize },
    Tick,
    Next,
    Prev,
    Pause,
    Resume,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The last story's bar filled up or `next` was pressed on it.
    Finished,
    UserClosed,
    /// A new `open` replaced the running session.
    Reopened,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PlaybackEvent {
    Opened {
        index: usize,
        story_id: StoryId,
    },
    Progress {
        index: usize,
        progress: f32,
    },
    Advanced {
        from: usize,
        to: usize,
        story_id: StoryId,
    },
    Paused {
        index: usize,
        progress: f32,
    },
    Resumed {
        index: usize,
        progress: f32,
    },
    Closed {
        reason: CloseReason,
    },
}
