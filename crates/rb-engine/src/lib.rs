//! # rb-engine
//!
//! Post lifecycle, rating, and comment operations on top of any
//! [`PostStore`]. Each operation takes the caller's [`Context`], performs
//! one or more store round-trips through it, and either returns the
//! requested value or an [`AppError`] classification.
//!
//! The engine holds no locks and no caches; the store is the only arbiter
//! of atomicity.
//!
//! [`Context`]: rb_core::Context
//! [`AppError`]: rb_core::AppError

pub mod comments;
pub mod posts;
pub mod rating;

use rb_core::{AppError, PostId, PostStore, Result};
use std::sync::Arc;

pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 5;

/// Tuning knobs for [`PostService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound on version-checked read-modify-write attempts for
    /// rating operations before giving up with `Conflict`.
    pub max_write_attempts: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }
}

/// The post engine. Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
    options: EngineOptions,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self::with_options(store, EngineOptions::default())
    }

    pub fn with_options(store: Arc<dyn PostStore>, options: EngineOptions) -> Self {
        Self {
            store,
            options: EngineOptions {
                max_write_attempts: options.max_write_attempts.max(1),
            },
        }
    }

    #[must_use]
    pub fn options(&self) -> EngineOptions {
        self.options
    }
}

pub(crate) fn parse_post_id(raw: &str) -> Result<PostId> {
    Ok(raw.parse()?)
}

pub(crate) fn post_not_found(id: PostId) -> AppError {
    AppError::NotFound("post", id.to_string())
}
