//! Mock users and stories for the terminal viewer.

use chrono::{DateTime, Duration, Utc};
use shared::domain::{Story, StoryDraft, StoryId, UserId, UserSummary};
use story_core::StoryStore;

fn user(id: i64, username: &str, display_name: &str, verified: bool) -> UserSummary {
    UserSummary {
        user_id: UserId(id),
        username: username.into(),
        display_name: display_name.into(),
        avatar_url: format!("https://picsum.photos/seed/{username}/96/96"),
        verified,
    }
}

/// The signed-in account that uploads new stories.
pub fn current_user() -> UserSummary {
    user(1, "you", "You", false)
}

pub fn seed_store(now: DateTime<Utc>) -> StoryStore {
    let stories = [
        (
            user(2, "sarah.j", "Sarah Jenkins", true),
            "https://picsum.photos/seed/s1/1080/1920",
            Some("Morning hike done"),
            12,
            false,
        ),
        (
            user(3, "mike_ross", "Mike Ross", false),
            "https://picsum.photos/seed/s2/1080/1920",
            None,
            95,
            false,
        ),
        (
            user(9, "lumen.shop", "Lumen Shop", true),
            "https://picsum.photos/seed/ad1/1080/1920",
            Some("New drop: 20% off this week"),
            180,
            true,
        ),
        (
            user(4, "emma.codes", "Emma Wilson", false),
            "https://picsum.photos/seed/s3/1080/1920",
            Some("Shipping day"),
            300,
            false,
        ),
        (
            user(5, "dkim", "David Kim", false),
            "https://picsum.photos/seed/s4/1080/1920",
            None,
            1500,
            false,
        ),
    ];

    let count = stories.len() as i64;
    let seeded = stories
        .into_iter()
        .enumerate()
        .map(|(position, (owner, media, caption, minutes_ago, sponsored))| {
            let mut draft = StoryDraft::new(owner, media);
            draft.caption = caption.map(str::to_string);
            draft.sponsored = sponsored;
            Story::from_draft(
                StoryId(count - position as i64),
                draft,
                now - Duration::minutes(minutes_ago),
            )
        })
        .collect();

    StoryStore::with_stories(seeded)
}
