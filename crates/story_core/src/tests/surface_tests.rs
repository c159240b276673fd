use super::*;
use chrono::{Duration, TimeZone};
use shared::domain::{StoryDraft, StoryId, UserId, UserSummary};

fn story(sponsored: bool) -> Story {
    let owner = UserSummary {
        user_id: UserId(2),
        username: "lena".into(),
        display_name: "Lena Park".into(),
        avatar_url: String::new(),
        verified: true,
    };
    let mut draft = StoryDraft::new(owner, "https://cdn.example/s/9.jpg").with_caption("rooftop");
    draft.sponsored = sponsored;
    Story::from_draft(
        StoryId(9),
        draft,
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
    )
}

#[test]
fn gestures_map_to_controller_commands() {
    assert_eq!(gesture_command(Gesture::TapLeft), PlaybackCommand::Prev);
    assert_eq!(gesture_command(Gesture::TapRight), PlaybackCommand::Next);
    assert_eq!(gesture_command(Gesture::HoldStart), PlaybackCommand::Pause);
    assert_eq!(gesture_command(Gesture::HoldEnd), PlaybackCommand::Resume);
    assert_eq!(gesture_command(Gesture::Close), PlaybackCommand::Close);
    assert_eq!(gesture_command(Gesture::Escape), PlaybackCommand::Close);
}

#[test]
fn sponsored_stories_swap_reply_box_for_banner() {
    let chrome = ViewerChrome::for_story(&story(true));
    assert_eq!(
        chrome,
        ViewerChrome::Sponsored {
            banner: "Sponsored".into()
        }
    );
    assert!(!chrome.accepts_replies());

    let chrome = ViewerChrome::for_story(&story(false));
    assert!(chrome.accepts_replies());
    assert_eq!(
        chrome,
        ViewerChrome::Reply {
            placeholder: "Reply to lena...".into()
        }
    );
}

#[test]
fn progress_bars_render_fill_per_story() {
    assert_eq!(render_progress_bars(&[100.0, 50.0, 0.0], 4), "==== ==-- ----");
    assert_eq!(render_progress_bars(&[130.0, -5.0], 2), "== --");
    assert_eq!(render_progress_bars(&[], 4), "");
}

#[test]
fn frame_shows_header_caption_and_chrome() {
    let snapshot = PlaybackSnapshot {
        is_open: true,
        current_index: 0,
        progress: 50.0,
        is_paused: true,
        current_story: Some(story(false)),
    };
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let lines = render_frame(&snapshot, &[50.0, 0.0], 2, now);
    assert_eq!(
        lines,
        vec![
            "=- --".to_string(),
            "Lena Park [v] @lena · 2h ago  (paused)".to_string(),
            "[https://cdn.example/s/9.jpg]".to_string(),
            "rooftop".to_string(),
            "Reply to lena...".to_string(),
        ]
    );
}

#[test]
fn closed_viewer_renders_nothing() {
    let snapshot = PlaybackSnapshot {
        is_open: false,
        current_index: 0,
        progress: 0.0,
        is_paused: false,
        current_story: None,
    };
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(1);
    assert!(render_frame(&snapshot, &[], 4, now).is_empty());
}
