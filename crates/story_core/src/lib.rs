//! Ephemeral stories shown in a full-screen viewer with timed progress bars.

pub mod controller;
pub mod error;
pub mod reducer;
pub mod store;
pub mod surface;
mod ticker;

pub use controller::{PlaybackController, PlaybackSnapshot};
pub use error::{PlaybackError, StoryError};
pub use reducer::{PlaybackState, PlaybackTiming, TimerEffect, Transition};
pub use store::StoryStore;
pub use surface::{gesture_command, render_frame, render_progress_bars, Gesture, ViewerChrome};
