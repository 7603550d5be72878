//! Story store: in-memory collection plus sync-on-write persistence.
//!
//! # Responsibility
//! - Own the single authoritative ordered collection of stories.
//! - Provide the CRUD operations screens are built on.
//! - Rewrite the full persisted snapshot after every mutation.
//!
//! # Invariants
//! - Stories are ordered newest-created first; chapters keep reading order.
//! - `last_updated` of a story moves forward on every mutation of the
//!   story or of any of its chapters, never backwards.
//! - Unknown ids are silent no-ops surfaced as `false`/`None`, not errors;
//!   the only error category is persistence failure.
//! - If a save fails, the in-memory mutation is kept and the error is
//!   surfaced; the next successful mutation rewrites the full snapshot.

use crate::model::story::{
    now_epoch_ms, Chapter, ChapterId, ChapterPatch, Story, StoryDraft, StoryId, StoryPatch,
};
use crate::repo::snapshot_repo::{RepoResult, SnapshotRepository};
use log::{debug, info};

/// The in-memory authoritative collection of all stories, generic over an
/// injected persistence port. Constructed once at process start and handed
/// to every consumer; there is no hidden global instance.
pub struct StoryStore<R: SnapshotRepository> {
    repo: R,
    stories: Vec<Story>,
}

impl<R: SnapshotRepository> StoryStore<R> {
    /// Loads the persisted snapshot and returns a ready store.
    ///
    /// An absent or unreadable snapshot yields an empty collection; only
    /// storage transport failures propagate.
    pub fn open(repo: R) -> RepoResult<Self> {
        let stories = repo.load()?.unwrap_or_default();
        info!(
            "event=store_open module=store status=ok stories={}",
            stories.len()
        );
        Ok(Self { repo, stories })
    }

    /// Current snapshot, most-recently-created story first.
    pub fn list_stories(&self) -> &[Story] {
        &self.stories
    }

    /// Looks up one story. Absence is a normal outcome, not an error.
    pub fn get_story(&self, id: StoryId) -> Option<&Story> {
        self.stories.iter().find(|story| story.id == id)
    }

    /// Creates a story from the draft and prepends it to the collection.
    ///
    /// Returns the generated id so callers can address the new story.
    pub fn create_story(&mut self, draft: StoryDraft) -> RepoResult<StoryId> {
        let story = Story::new(draft);
        let id = story.id;
        self.stories.insert(0, story);
        self.sync()?;
        Ok(id)
    }

    /// Merges `patch` into the matching story and refreshes its
    /// `last_updated`. Returns whether the story existed.
    pub fn update_story(&mut self, id: StoryId, patch: StoryPatch) -> RepoResult<bool> {
        let now = now_epoch_ms();
        let Some(story) = self.story_mut(id) else {
            debug!("event=story_update module=store status=missing story={id}");
            return Ok(false);
        };
        story.apply(patch);
        story.touch(now);
        self.sync()?;
        Ok(true)
    }

    /// Removes the story and, by ownership, all of its chapters.
    pub fn delete_story(&mut self, id: StoryId) -> RepoResult<bool> {
        let Some(index) = self.stories.iter().position(|story| story.id == id) else {
            debug!("event=story_delete module=store status=missing story={id}");
            return Ok(false);
        };
        self.stories.remove(index);
        self.sync()?;
        Ok(true)
    }

    /// Appends a new chapter to the story (it becomes the last chapter)
    /// and refreshes the parent's `last_updated`.
    ///
    /// Returns the generated chapter id, or `None` when the story is
    /// absent.
    pub fn create_chapter(
        &mut self,
        story_id: StoryId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> RepoResult<Option<ChapterId>> {
        let now = now_epoch_ms();
        let Some(story) = self.story_mut(story_id) else {
            debug!("event=chapter_create module=store status=missing story={story_id}");
            return Ok(None);
        };
        let chapter = Chapter::new(title, content);
        let id = chapter.id;
        story.chapters.push(chapter);
        story.touch(now);
        self.sync()?;
        Ok(Some(id))
    }

    /// Merges `patch` into the matching chapter and refreshes both the
    /// chapter's and the parent story's `last_updated`. Returns whether
    /// both ids matched.
    pub fn update_chapter(
        &mut self,
        story_id: StoryId,
        chapter_id: ChapterId,
        patch: ChapterPatch,
    ) -> RepoResult<bool> {
        let now = now_epoch_ms();
        let Some(story) = self.story_mut(story_id) else {
            debug!("event=chapter_update module=store status=missing story={story_id}");
            return Ok(false);
        };
        let Some(chapter) = story.chapter_mut(chapter_id) else {
            debug!(
                "event=chapter_update module=store status=missing story={story_id} chapter={chapter_id}"
            );
            return Ok(false);
        };
        chapter.apply(patch);
        chapter.touch(now);
        story.touch(now);
        self.sync()?;
        Ok(true)
    }

    /// Removes the chapter from its parent's sequence and refreshes the
    /// parent's `last_updated`. Returns whether both ids matched.
    pub fn delete_chapter(
        &mut self,
        story_id: StoryId,
        chapter_id: ChapterId,
    ) -> RepoResult<bool> {
        let now = now_epoch_ms();
        let Some(story) = self.story_mut(story_id) else {
            debug!("event=chapter_delete module=store status=missing story={story_id}");
            return Ok(false);
        };
        let Some(index) = story
            .chapters
            .iter()
            .position(|chapter| chapter.id == chapter_id)
        else {
            debug!(
                "event=chapter_delete module=store status=missing story={story_id} chapter={chapter_id}"
            );
            return Ok(false);
        };
        story.chapters.remove(index);
        story.touch(now);
        self.sync()?;
        Ok(true)
    }

    fn story_mut(&mut self, id: StoryId) -> Option<&mut Story> {
        self.stories.iter_mut().find(|story| story.id == id)
    }

    fn sync(&self) -> RepoResult<()> {
        self.repo.save(&self.stories)
    }
}
