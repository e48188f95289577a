//! # rb-db-memory
//!
//! In-process implementation of `PostStore`.
//! Each operation runs under the map shard lock of the document it touches,
//! which gives the same per-document atomicity a document database offers
//! and nothing more.

use anyhow::bail;
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use rb_core::models::{Comment, CommentId, Post, PostId};
use rb_core::traits::{PostFilter, PostStore, WriteOutcome};
use tracing::trace;

#[derive(Default)]
pub struct MemoryPostStore {
    posts: DashMap<PostId, Post>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn insert(&self, post: Post) -> anyhow::Result<PostId> {
        let id = post.id;
        match self.posts.entry(id) {
            Entry::Occupied(_) => bail!("duplicate key: post {id} already exists"),
            Entry::Vacant(slot) => {
                slot.insert(post);
            }
        }
        trace!(post_id = %id, "inserted");
        Ok(id)
    }

    /// Results are ordered by id, which follows creation order.
    async fn find(&self, filter: PostFilter) -> anyhow::Result<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        posts.sort_by_key(|post| post.id);
        Ok(posts)
    }

    async fn find_one(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|entry| entry.value().clone()))
    }

    async fn exists(&self, filter: PostFilter) -> anyhow::Result<bool> {
        // Every id-scoped filter needs to look at one document only.
        let post_id = match &filter {
            PostFilter::Id(id)
            | PostFilter::OwnedBy { post: id, .. }
            | PostFilter::CommentOwnedBy { post: id, .. } => Some(*id),
            _ => None,
        };
        let found = match post_id {
            Some(id) => self
                .posts
                .get(&id)
                .is_some_and(|entry| filter.matches(entry.value())),
            None => self.posts.iter().any(|entry| filter.matches(entry.value())),
        };
        Ok(found)
    }

    async fn find_and_increment_views(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        Ok(self.posts.get_mut(&id).map(|mut entry| {
            let before = entry.value().clone();
            entry.views += 1;
            before
        }))
    }

    async fn push_comment(&self, id: PostId, comment: Comment) -> anyhow::Result<WriteOutcome> {
        let Some(mut entry) = self.posts.get_mut(&id) else {
            return Ok(WriteOutcome::NONE);
        };
        entry.comments.push(comment);
        entry.version += 1;
        Ok(WriteOutcome::ONE)
    }

    async fn pull_comment(
        &self,
        id: PostId,
        comment_id: CommentId,
    ) -> anyhow::Result<WriteOutcome> {
        let Some(mut entry) = self.posts.get_mut(&id) else {
            return Ok(WriteOutcome::NONE);
        };
        let before = entry.comments.len();
        entry.comments.retain(|comment| comment.id != comment_id);
        if entry.comments.len() == before {
            return Ok(WriteOutcome {
                matched: 1,
                modified: 0,
            });
        }
        entry.version += 1;
        Ok(WriteOutcome::ONE)
    }

    async fn replace(
        &self,
        id: PostId,
        expected_version: u64,
        mut post: Post,
    ) -> anyhow::Result<WriteOutcome> {
        let Some(mut entry) = self.posts.get_mut(&id) else {
            return Ok(WriteOutcome::NONE);
        };
        if entry.version != expected_version {
            trace!(post_id = %id, expected_version, actual = entry.version, "stale replace");
            return Ok(WriteOutcome::NONE);
        }
        post.id = id;
        *entry = post;
        Ok(WriteOutcome::ONE)
    }

    async fn delete(&self, id: PostId) -> anyhow::Result<WriteOutcome> {
        Ok(match self.posts.remove(&id) {
            Some(_) => {
                trace!(post_id = %id, "deleted");
                WriteOutcome::ONE
            }
            None => WriteOutcome::NONE,
        })
    }
}
