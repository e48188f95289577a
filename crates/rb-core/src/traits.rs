//! # Core Traits (Ports)
//!
//! Any document-store plugin must implement [`PostStore`] to back the engine.
//! The store only has to be atomic per document; every write reports how
//! many documents it matched and modified so the engine can detect races.

use crate::ids::UserId;
use crate::models::{Comment, CommentId, Post, PostId};
use async_trait::async_trait;

/// Equality filters the engine issues against the posts collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Id(PostId),
    Category(String),
    AuthorUsername(String),
    /// The post exists and was written by `user`.
    OwnedBy { post: PostId, user: UserId },
    /// The post holds a comment with this id written by `user`.
    CommentOwnedBy {
        post: PostId,
        comment: CommentId,
        user: UserId,
    },
}

impl PostFilter {
    /// Evaluates the filter against an in-memory document.
    #[must_use]
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Id(id) => post.id == *id,
            PostFilter::Category(category) => &post.category == category,
            PostFilter::AuthorUsername(username) => &post.author.username == username,
            PostFilter::OwnedBy { post: id, user } => post.id == *id && post.is_authored_by(user),
            PostFilter::CommentOwnedBy {
                post: id,
                comment,
                user,
            } => {
                post.id == *id
                    && post
                        .comments
                        .iter()
                        .any(|c| c.id == *comment && &c.author.user_id == user)
            }
        }
    }
}

/// Matched/modified counts reported by a single-document write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl WriteOutcome {
    pub const NONE: WriteOutcome = WriteOutcome {
        matched: 0,
        modified: 0,
    };
    pub const ONE: WriteOutcome = WriteOutcome {
        matched: 1,
        modified: 1,
    };

    /// Exactly one document was matched and changed.
    #[must_use]
    pub fn is_single(self) -> bool {
        self == Self::ONE
    }
}

/// Data persistence contract for the posts collection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Inserts a new document and returns its id.
    async fn insert(&self, post: Post) -> anyhow::Result<PostId>;

    /// All documents matching `filter`, in a stable store-defined order.
    async fn find(&self, filter: PostFilter) -> anyhow::Result<Vec<Post>>;

    async fn find_one(&self, id: PostId) -> anyhow::Result<Option<Post>>;

    /// Whether any document matches `filter`, without fetching it.
    async fn exists(&self, filter: PostFilter) -> anyhow::Result<bool>;

    /// Increments `views` by one and returns the document as it was
    /// before the increment.
    async fn find_and_increment_views(&self, id: PostId) -> anyhow::Result<Option<Post>>;

    /// Appends to `comments` and bumps `version`, without replacing the document.
    async fn push_comment(&self, id: PostId, comment: Comment) -> anyhow::Result<WriteOutcome>;

    /// Removes the comment with `comment_id` and bumps `version`.
    /// Reports zero modified when the comment is absent.
    async fn pull_comment(
        &self,
        id: PostId,
        comment_id: CommentId,
    ) -> anyhow::Result<WriteOutcome>;

    /// Replaces the whole document if its stored version equals
    /// `expected_version`. `post.version` is written as given.
    async fn replace(
        &self,
        id: PostId,
        expected_version: u64,
        post: Post,
    ) -> anyhow::Result<WriteOutcome>;

    async fn delete(&self, id: PostId) -> anyhow::Result<WriteOutcome>;
}
