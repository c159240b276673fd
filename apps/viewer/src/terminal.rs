//! Line-oriented viewer surface: stdin lines become gestures, controller
//! events become redraws.

use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, Utc};
use shared::{
    domain::Story,
    protocol::{CloseReason, PlaybackEvent},
};
use story_core::{
    gesture_command, render_frame, render_progress_bars, Gesture, PlaybackController,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};
use tracing::debug;

pub const HELP: &str = "keys: [a] prev  [d] next  [h] hold  [r] release  [q] close  [esc] escape";

pub fn parse_gesture(line: &str) -> Option<Gesture> {
    match line.trim().to_ascii_lowercase().as_str() {
        "a" | "p" | "prev" | "left" => Some(Gesture::TapLeft),
        "d" | "n" | "next" | "right" => Some(Gesture::TapRight),
        "h" | "hold" => Some(Gesture::HoldStart),
        "r" | "release" => Some(Gesture::HoldEnd),
        "q" | "x" | "close" => Some(Gesture::Close),
        "esc" | "escape" | "\u{1b}" => Some(Gesture::Escape),
        _ => None,
    }
}

/// Story ring shown above the feed: unviewed stories are marked with `*`.
pub fn render_story_ring(stories: &[Story], now: DateTime<Utc>) -> Vec<String> {
    stories
        .iter()
        .enumerate()
        .map(|(index, story)| {
            let marker = if story.viewed { ' ' } else { '*' };
            let sponsored = if story.sponsored { " (ad)" } else { "" };
            format!(
                "{marker} [{index}] {}{sponsored} · {}",
                story.owner.display_name,
                story.created_label(now)
            )
        })
        .collect()
}

/// Opens the viewer at `open_index` and runs until it closes.
///
/// Playback keeps running after `input` reaches EOF.
pub async fn run<R, W>(
    controller: &PlaybackController,
    open_index: usize,
    bar_width: usize,
    input: R,
    out: &mut W,
) -> anyhow::Result<CloseReason>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut events = BroadcastStream::new(controller.subscribe());
    controller
        .open(open_index)
        .with_context(|| format!("failed to open story viewer at index {open_index}"))?;

    let mut lines = input.lines();
    let mut input_open = true;
    writeln!(out, "{HELP}")?;

    loop {
        tokio::select! {
            // Render before reading more input so frames match the state they announce.
            biased;

            event = events.next() => {
                match event {
                    Some(Ok(PlaybackEvent::Closed { reason })) if reason != CloseReason::Reopened => {
                        writeln!(out)?;
                        writeln!(out, "viewer closed ({reason:?})")?;
                        return Ok(reason);
                    }
                    Some(Ok(PlaybackEvent::Progress { .. })) => {
                        let bars = render_progress_bars(&controller.progress_bars(), bar_width);
                        write!(out, "\r{bars}")?;
                        out.flush()?;
                    }
                    Some(Ok(_)) => draw_frame(controller, bar_width, out)?,
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        debug!(skipped, "viewer lagged behind playback events");
                    }
                    None => return Ok(CloseReason::UserClosed),
                }
            }
            line = lines.next_line(), if input_open => {
                match line.context("failed to read viewer input")? {
                    Some(line) => match parse_gesture(&line) {
                        Some(gesture) => {
                            let changed = controller.dispatch(gesture_command(gesture))?;
                            debug!(?gesture, changed, "gesture handled");
                        }
                        None => writeln!(out, "{HELP}")?,
                    },
                    None => input_open = false,
                }
            }
        }
    }
}

fn draw_frame<W: Write>(
    controller: &PlaybackController,
    bar_width: usize,
    out: &mut W,
) -> std::io::Result<()> {
    let snapshot = controller.snapshot();
    let lines = render_frame(&snapshot, &controller.progress_bars(), bar_width, Utc::now());
    writeln!(out)?;
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
