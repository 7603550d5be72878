//! Domain model for the writing notebook.
//!
//! # Responsibility
//! - Define the canonical Story/Chapter shapes shared by store and
//!   persistence.
//! - Keep the serde representation identical to the persisted snapshot
//!   layout.
//!
//! # Invariants
//! - Every story and chapter is identified by a stable UUID, never reused.
//! - A chapter lives and dies with its owning story.

pub mod story;
