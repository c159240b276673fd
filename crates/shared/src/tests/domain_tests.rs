use super::*;
use chrono::{Duration, TimeZone};

fn owner() -> UserSummary {
    UserSummary {
        user_id: UserId(7),
        username: "mira".into(),
        display_name: "Mira Okafor".into(),
        avatar_url: "https://cdn.example/avatars/mira.png".into(),
        verified: true,
    }
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

#[test]
fn recency_label_buckets() {
    let now = noon();
    assert_eq!(recency_label(now, now), "Just now");
    assert_eq!(recency_label(now - Duration::seconds(59), now), "Just now");
    assert_eq!(recency_label(now - Duration::minutes(5), now), "5m ago");
    assert_eq!(recency_label(now - Duration::hours(2), now), "2h ago");
    assert_eq!(recency_label(now - Duration::hours(23), now), "23h ago");
    assert_eq!(recency_label(now - Duration::days(3), now), "3d ago");
}

#[test]
fn future_timestamps_read_as_just_now() {
    let now = noon();
    assert_eq!(recency_label(now + Duration::minutes(10), now), "Just now");
}

#[test]
fn story_from_draft_starts_unviewed() {
    let draft = StoryDraft::new(owner(), "https://cdn.example/s/1.jpg")
        .with_caption("sunset run")
        .sponsored();
    let story = Story::from_draft(StoryId(3), draft, noon());

    assert_eq!(story.id, StoryId(3));
    assert!(!story.viewed);
    assert!(story.sponsored);
    assert_eq!(story.caption.as_deref(), Some("sunset run"));
    assert_eq!(story.created_label(noon() + Duration::hours(2)), "2h ago");
}

#[test]
fn story_deserializes_with_missing_flags() {
    let raw = serde_json::json!({
        "id": 1,
        "owner": {
            "user_id": 7,
            "username": "mira",
            "display_name": "Mira Okafor",
            "avatar_url": "a.png"
        },
        "media_url": "m.jpg",
        "created_at": "2024-05-01T12:00:00Z"
    });

    let story: Story = serde_json::from_value(raw).expect("story");
    assert!(!story.viewed);
    assert!(!story.sponsored);
    assert!(!story.owner.verified);
    assert!(story.caption.is_none());
}
