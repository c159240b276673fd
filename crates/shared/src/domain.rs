use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);
id_newtype!(StoryId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    #[serde(default)]
    pub verified: bool,
}

/// Media handed to the story store by an upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDraft {
    pub owner: UserSummary,
    pub media_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default)]
    pub sponsored: bool,
}

impl StoryDraft {
    pub fn new(owner: UserSummary, media_url: impl Into<String>) -> Self {
        Self {
            owner,
            media_url: media_url.into(),
            caption: None,
            sponsored: false,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn sponsored(mut self) -> Self {
        self.sponsored = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub owner: UserSummary,
    pub media_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub viewed: bool,
    #[serde(default)]
    pub sponsored: bool,
}

impl Story {
    pub fn from_draft(id: StoryId, draft: StoryDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            owner: draft.owner,
            media_url: draft.media_url,
            caption: draft.caption,
            created_at,
            viewed: false,
            sponsored: draft.sponsored,
        }
    }

    pub fn created_label(&self, now: DateTime<Utc>) -> String {
        recency_label(self.created_at, now)
    }
}

/// Short "posted ago" label. Timestamps in the future count as "Just now".
pub fn recency_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
