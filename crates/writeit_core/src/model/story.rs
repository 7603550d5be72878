//! Story and chapter domain model.
//!
//! # Responsibility
//! - Define `Story`, `Chapter` and the fixed `Genre` catalog.
//! - Provide draft/patch request models with explicit merge semantics.
//!
//! # Invariants
//! - `id` is stable and never reused for another story or chapter.
//! - `created_at` is immutable after construction.
//! - `last_updated` never decreases; `touch` clamps against regression.
//! - Tags are deduplicated when a story is created, never retroactively.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier of a story.
pub type StoryId = Uuid;

/// Stable identifier of a chapter, unique within its parent story.
pub type ChapterId = Uuid;

/// Current wall-clock time in unix epoch milliseconds.
///
/// A clock before the epoch maps to 0; `touch` keeps `last_updated`
/// monotonic regardless of what the clock reports.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Fixed genre domain offered by the editing surface.
///
/// The serde representation is the human-facing label, so persisted
/// snapshots carry `"Sci-Fi"` and `"Non-Fiction"` verbatim. A snapshot
/// containing a label outside this domain fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Genre {
    Fantasy,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Romance,
    Mystery,
    Thriller,
    Horror,
    Historical,
    #[serde(rename = "Non-Fiction")]
    NonFiction,
}

impl Genre {
    /// Every genre, in the order the editing surface presents them.
    pub const ALL: [Genre; 8] = [
        Genre::Fantasy,
        Genre::SciFi,
        Genre::Romance,
        Genre::Mystery,
        Genre::Thriller,
        Genre::Horror,
        Genre::Historical,
        Genre::NonFiction,
    ];

    /// Human-facing label, also the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Genre::Fantasy => "Fantasy",
            Genre::SciFi => "Sci-Fi",
            Genre::Romance => "Romance",
            Genre::Mystery => "Mystery",
            Genre::Thriller => "Thriller",
            Genre::Horror => "Horror",
            Genre::Historical => "Historical",
            Genre::NonFiction => "Non-Fiction",
        }
    }
}

/// Parses a genre label back into the enum. Unknown labels yield `None`.
pub fn parse_genre(value: &str) -> Option<Genre> {
    Genre::ALL
        .into_iter()
        .find(|genre| genre.label() == value)
}

/// A titled text section belonging to exactly one story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Stable chapter id.
    pub id: ChapterId,
    pub title: String,
    /// Free-text body.
    pub content: String,
    /// Unix epoch milliseconds, refreshed on every mutation.
    pub last_updated: i64,
}

impl Chapter {
    /// Creates a chapter with a generated stable id, stamped now.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, content)
    }

    /// Creates a chapter with a caller-provided id.
    ///
    /// Used by tests and import paths where identity already exists.
    pub fn with_id(
        id: ChapterId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            last_updated: now_epoch_ms(),
        }
    }

    /// Advances `last_updated` to `at_epoch_ms`, never backwards.
    pub fn touch(&mut self, at_epoch_ms: i64) {
        self.last_updated = self.last_updated.max(at_epoch_ms);
    }

    /// Merges a patch. Each supplied field replaces the old value
    /// wholesale; absent fields are left unchanged. Does not stamp
    /// `last_updated` (the store does, so an empty patch still refreshes).
    pub fn apply(&mut self, patch: ChapterPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
    }

    /// Whitespace-separated word count of the body, as shown by the
    /// chapter editor.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Top-level writing project: metadata plus chapters in narrative order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Stable story id.
    pub id: StoryId,
    pub title: String,
    /// Already-encoded image text (e.g. a data URL). The core never
    /// decodes it and enforces no size limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Genre set, entry order preserved.
    pub genres: Vec<Genre>,
    /// Free-text tags, case-sensitive, entry order preserved.
    pub tags: Vec<String>,
    /// Chapters in narrative/reading order.
    pub chapters: Vec<Chapter>,
    /// Unix epoch milliseconds, immutable after creation.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed whenever the story or any of
    /// its chapters changes.
    pub last_updated: i64,
}

impl Story {
    /// Creates a story from a draft with a generated stable id.
    ///
    /// # Invariants
    /// - `created_at == last_updated` on the fresh story.
    /// - The chapter list starts empty.
    /// - Draft genres/tags are deduplicated preserving entry order; tags
    ///   are trimmed and empty tags dropped.
    pub fn new(draft: StoryDraft) -> Self {
        Self::with_id(Uuid::new_v4(), draft)
    }

    /// Creates a story with a caller-provided id.
    pub fn with_id(id: StoryId, draft: StoryDraft) -> Self {
        let now = now_epoch_ms();
        Self {
            id,
            title: draft.title,
            cover_image: draft.cover_image,
            genres: dedup_genres(draft.genres),
            tags: normalize_tags(draft.tags),
            chapters: Vec::new(),
            created_at: now,
            last_updated: now,
        }
    }

    /// Advances `last_updated` to `at_epoch_ms`, never backwards.
    pub fn touch(&mut self, at_epoch_ms: i64) {
        self.last_updated = self.last_updated.max(at_epoch_ms);
    }

    /// Merges a patch. Per-field contract:
    /// - `title`: overwrite when supplied.
    /// - `cover_image`: `Some(Some(_))` replaces, `Some(None)` clears,
    ///   `None` keeps the current image.
    /// - `genres`/`tags`: supplied sequences replace the old ones
    ///   wholesale, verbatim; no element-wise merge and no retroactive
    ///   dedup.
    ///
    /// Does not stamp `last_updated`; the store does.
    pub fn apply(&mut self, patch: StoryPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(cover_image) = patch.cover_image {
            self.cover_image = cover_image;
        }
        if let Some(genres) = patch.genres {
            self.genres = genres;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }

    /// Looks up a chapter of this story by id.
    pub fn chapter(&self, id: ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|chapter| chapter.id == id)
    }

    pub fn chapter_mut(&mut self, id: ChapterId) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find(|chapter| chapter.id == id)
    }
}

/// Caller-supplied fields for creating a story.
///
/// Identity, timestamps and the (empty) chapter list are allocated by the
/// store, mirroring what the editing surface submits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryDraft {
    pub title: String,
    pub cover_image: Option<String>,
    pub genres: Vec<Genre>,
    pub tags: Vec<String>,
}

/// Partial update for a story. See [`Story::apply`] for the per-field
/// merge contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryPatch {
    pub title: Option<String>,
    pub cover_image: Option<Option<String>>,
    pub genres: Option<Vec<Genre>>,
    pub tags: Option<Vec<String>>,
}

/// Partial update for a chapter. See [`Chapter::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

fn dedup_genres(genres: Vec<Genre>) -> Vec<Genre> {
    let mut unique: Vec<Genre> = Vec::new();
    for genre in genres {
        if !unique.contains(&genre) {
            unique.push(genre);
        }
    }
    unique
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() || unique.iter().any(|existing| existing == trimmed) {
            continue;
        }
        unique.push(trimmed.to_string());
    }
    unique
}
