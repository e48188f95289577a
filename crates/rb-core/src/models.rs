//! # Domain Models
//!
//! The Post aggregate: a single document carrying its comments and votes.
//! The store offers atomicity per document only, so every invariant below
//! (score equals the vote sum, one vote per user) is maintained on the
//! whole aggregate in memory and written back as one unit.

use crate::ids::{Id, Marker, UserId};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

impl Marker for PostMarker {
    const KIND: &'static str = "post";
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

impl Marker for CommentMarker {
    const KIND: &'static str = "comment";
}

pub type PostId = Id<PostMarker>;
pub type CommentId = Id<CommentMarker>;

/// The acting principal, as resolved by the authentication collaborator.
///
/// Posts and comments embed a copy taken at write time. Later username
/// changes are not propagated into existing documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(rename = "id")]
    pub user_id: UserId,
}

impl User {
    pub fn new(username: impl Into<String>, user_id: UserId) -> Self {
        Self {
            username: username.into(),
            user_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Text,
    Link,
}

/// A single user's rating of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "user")]
    pub user_id: UserId,
    #[serde(rename = "vote")]
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub created: String,
    pub author: User,
    pub body: String,
}

impl Comment {
    #[must_use]
    pub fn new(body: String, author: User) -> Self {
        Self {
            id: CommentId::generate(),
            created: timestamp_now(),
            author,
            body,
        }
    }
}

/// Submission payload, already validated upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub category: String,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: String,
}

/// The root aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    /// Bumped by every whole-document replace and comment push/pull.
    /// Replaces are conditional on the version they read.
    #[serde(default)]
    pub version: u64,
    pub score: i64,
    pub views: i64,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    pub author: User,
    pub category: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    pub votes: Vec<Vote>,
    pub comments: Vec<Comment>,
    pub created: String,
    #[serde(rename = "upvotepercentage")]
    pub upvote_percentage: i64,
}

impl Post {
    /// Builds a fresh, unrated post. Only the body field matching `kind`
    /// is kept: link posts drop `text`, text posts drop `url`.
    #[must_use]
    pub fn new(id: PostId, new_post: NewPost, author: User) -> Self {
        let (url, text) = match new_post.kind {
            PostKind::Link => (new_post.url, String::new()),
            PostKind::Text => (String::new(), new_post.text),
        };

        Self {
            id,
            version: 0,
            score: 0,
            views: 0,
            kind: new_post.kind,
            title: new_post.title,
            url,
            author,
            category: new_post.category,
            text,
            votes: Vec::new(),
            comments: Vec::new(),
            created: timestamp_now(),
            upvote_percentage: 0,
        }
    }

    #[must_use]
    pub fn is_authored_by(&self, user_id: &UserId) -> bool {
        &self.author.user_id == user_id
    }

    #[must_use]
    pub fn vote_of(&self, user_id: &UserId) -> Option<i64> {
        self.votes
            .iter()
            .find(|vote| &vote.user_id == user_id)
            .map(|vote| vote.value)
    }

    #[must_use]
    pub fn comment(&self, comment_id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == comment_id)
    }

    /// Sets `user_id`'s vote to `value`, replacing any earlier vote by the
    /// same user. Returns the replaced value.
    ///
    /// Any `i64` is accepted. `score` wraps on overflow, so retracting a
    /// vote always takes back exactly the value it added.
    pub fn apply_vote(&mut self, user_id: &UserId, value: i64) -> Option<i64> {
        let previous = match self.votes.iter_mut().find(|vote| &vote.user_id == user_id) {
            Some(vote) => {
                let old = vote.value;
                self.score = self.score.wrapping_add(value.wrapping_sub(old));
                vote.value = value;
                Some(old)
            }
            None => {
                self.score = self.score.wrapping_add(value);
                self.votes.push(Vote {
                    user_id: user_id.clone(),
                    value,
                });
                None
            }
        };

        self.upvote_percentage = upvote_percentage(self.score, self.votes.len());
        previous
    }

    /// Removes `user_id`'s vote, keeping the order of the remaining votes.
    /// Returns the removed value, or `None` if the user had not voted.
    ///
    /// When the last vote is removed `upvote_percentage` keeps its previous
    /// value.
    pub fn retract_vote(&mut self, user_id: &UserId) -> Option<i64> {
        let index = self.votes.iter().position(|vote| &vote.user_id == user_id)?;
        let removed = self.votes.remove(index);
        self.score = self.score.wrapping_sub(removed.value);

        if !self.votes.is_empty() {
            self.upvote_percentage = upvote_percentage(self.score, self.votes.len());
        }
        Some(removed.value)
    }
}

/// Display metric stored alongside the score.
///
/// Algebraically this is `score * 50` for any non-zero vote count; it is
/// not the share of upvotes among voters. Stored documents and clients
/// depend on this exact value. Results beyond the `i64` range saturate.
#[must_use]
pub fn upvote_percentage(score: i64, vote_count: usize) -> i64 {
    if vote_count == 0 {
        return 0;
    }
    let count = vote_count as i128;
    ((i128::from(score) * count) as f64 / count as f64 * 0.5 * 100.0) as i64
}

/// Outcome of looking a comment up under a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentStatus {
    Ok,
    PostNotFound,
    CommentNotFound,
}

/// RFC3339, second precision, UTC.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
