//! The authoritative in-memory story collection.
//!
//! # Responsibility
//! - Back every screen with one ordered collection of stories.
//! - Mirror each mutation to the injected persistence port.

pub mod story_store;
