//! Ordered, most-recent-first story sequence.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use shared::domain::{Story, StoryDraft, StoryId};
use tracing::{debug, info};

use crate::error::StoryError;

#[derive(Default)]
pub struct StoryStore {
    inner: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    stories: Arc<Vec<Story>>,
    next_id: i64,
}

impl StoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with `stories` in the given order.
    pub fn with_stories(stories: Vec<Story>) -> Self {
        let next_id = stories.iter().map(|story| story.id.0).max().unwrap_or(0) + 1;
        Self {
            inner: RwLock::new(StoreState {
                stories: Arc::new(stories),
                next_id,
            }),
        }
    }

    pub fn add_story(&self, draft: StoryDraft) -> Result<Story, StoryError> {
        self.add_story_at(draft, Utc::now())
    }

    pub fn add_story_at(
        &self,
        draft: StoryDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Story, StoryError> {
        if draft.media_url.trim().is_empty() {
            return Err(StoryError::EmptyMedia);
        }

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = StoryId(guard.next_id.max(1));
        guard.next_id = id.0 + 1;

        let story = Story::from_draft(id, draft, created_at);
        // Snapshots already handed out keep the old vector.
        Arc::make_mut(&mut guard.stories).insert(0, story.clone());

        info!(
            story_id = story.id.0,
            owner = %story.owner.username,
            sponsored = story.sponsored,
            "story added"
        );
        Ok(story)
    }

    /// Read-only snapshot of the sequence, most recent first.
    pub fn list(&self) -> Arc<Vec<Story>> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard.stories)
    }

    pub fn get(&self, id: StoryId) -> Option<Story> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.stories.iter().find(|story| story.id == id).cloned()
    }

    /// Returns true if the flag flipped.
    pub fn mark_viewed(&self, id: StoryId) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let Some(position) = guard
            .stories
            .iter()
            .position(|story| story.id == id && !story.viewed)
        else {
            return false;
        };

        Arc::make_mut(&mut guard.stories)[position].viewed = true;
        debug!(story_id = id.0, "story marked viewed");
        true
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unviewed_count(&self) -> usize {
        self.list().iter().filter(|story| !story.viewed).count()
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
