//! Boundary the viewer surface talks to: gesture translation, chrome
//! selection and a plain-text rendering of the progress bars.

use chrono::{DateTime, Utc};
use shared::{domain::Story, protocol::PlaybackCommand};

use crate::controller::PlaybackSnapshot;

const SPONSORED_BANNER: &str = "Sponsored";
const BAR_SEPARATOR: char = ' ';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    TapLeft,
    TapRight,
    HoldStart,
    HoldEnd,
    Close,
    Escape,
}

pub fn gesture_command(gesture: Gesture) -> PlaybackCommand {
    match gesture {
        Gesture::TapLeft => PlaybackCommand::Prev,
        Gesture::TapRight => PlaybackCommand::Next,
        Gesture::HoldStart => PlaybackCommand::Pause,
        Gesture::HoldEnd => PlaybackCommand::Resume,
        Gesture::Close | Gesture::Escape => PlaybackCommand::Close,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerChrome {
    Sponsored { banner: String },
    Reply { placeholder: String },
}

impl ViewerChrome {
    pub fn for_story(story: &Story) -> Self {
        if story.sponsored {
            Self::Sponsored {
                banner: SPONSORED_BANNER.to_string(),
            }
        } else {
            Self::Reply {
                placeholder: format!("Reply to {}...", story.owner.username),
            }
        }
    }

    pub fn accepts_replies(&self) -> bool {
        matches!(self, Self::Reply { .. })
    }
}

/// Renders one bar per entry, `width` cells each.
pub fn render_progress_bars(bars: &[f32], width: usize) -> String {
    let mut out = String::with_capacity(bars.len() * (width + 1));
    for (position, fill) in bars.iter().enumerate() {
        if position > 0 {
            out.push(BAR_SEPARATOR);
        }
        let filled = ((fill.clamp(0.0, 100.0) / 100.0) * width as f32).round() as usize;
        let filled = filled.min(width);
        out.extend(std::iter::repeat('=').take(filled));
        out.extend(std::iter::repeat('-').take(width - filled));
    }
    out
}

/// Text lines for one frame of the full-screen viewer.
pub fn render_frame(
    snapshot: &PlaybackSnapshot,
    bars: &[f32],
    bar_width: usize,
    now: DateTime<Utc>,
) -> Vec<String> {
    let Some(story) = snapshot.current_story.as_ref().filter(|_| snapshot.is_open) else {
        return Vec::new();
    };

    let mut lines = vec![render_progress_bars(bars, bar_width)];

    let verified = if story.owner.verified { " [v]" } else { "" };
    let paused = if snapshot.is_paused { "  (paused)" } else { "" };
    lines.push(format!(
        "{}{verified} @{} · {}{paused}",
        story.owner.display_name,
        story.owner.username,
        story.created_label(now)
    ));
    lines.push(format!("[{}]", story.media_url));
    if let Some(caption) = &story.caption {
        lines.push(caption.clone());
    }
    lines.push(match ViewerChrome::for_story(story) {
        ViewerChrome::Sponsored { banner } => format!(">> {banner} <<"),
        ViewerChrome::Reply { placeholder } => placeholder,
    });
    lines
}

#[cfg(test)]
#[path = "tests/surface_tests.rs"]
mod tests;
