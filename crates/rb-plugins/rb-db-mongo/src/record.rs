//! BSON shapes of the posts collection and their mapping to `rb-core` models.

use mongodb::bson::oid::ObjectId as BsonObjectId;
use rb_core::ids::{InvalidIdError, ObjectId, UserId};
use rb_core::models::{Comment, Post, PostKind, User, Vote};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("post {post} holds an invalid entry: {source}")]
pub struct RecordError {
    pub post: String,
    #[source]
    pub source: InvalidIdError,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub username: String,
    #[serde(rename = "_id")]
    pub user_id: String,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct VoteRecord {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub vote: i64,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(rename = "_id")]
    pub id: BsonObjectId,
    pub created: String,
    pub author: AuthorRecord,
    pub body: String,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "_id")]
    pub id: BsonObjectId,
    #[serde(default)]
    pub version: i64,
    pub score: i64,
    pub views: i64,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    pub author: AuthorRecord,
    pub category: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default)]
    pub votes: Vec<VoteRecord>,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    pub created: String,
    #[serde(rename = "upvotepercentage", default)]
    pub upvote_percentage: i64,
}

pub(crate) fn to_bson_id(id: impl Into<ObjectId>) -> BsonObjectId {
    let id: ObjectId = id.into();
    id.into()
}

pub(crate) fn from_bson_id<T: From<ObjectId>>(id: BsonObjectId) -> T {
    ObjectId::from(id).into()
}

impl From<&User> for AuthorRecord {
    fn from(value: &User) -> Self {
        Self {
            username: value.username.clone(),
            user_id: value.user_id.to_hex(),
        }
    }
}

impl From<Comment> for CommentRecord {
    fn from(value: Comment) -> Self {
        Self {
            id: to_bson_id(value.id),
            created: value.created,
            author: AuthorRecord::from(&value.author),
            body: value.body,
        }
    }
}

impl From<Post> for PostRecord {
    fn from(value: Post) -> Self {
        Self {
            id: to_bson_id(value.id),
            version: value.version as i64,
            score: value.score,
            views: value.views,
            kind: value.kind,
            title: value.title,
            url: value.url,
            author: AuthorRecord::from(&value.author),
            category: value.category,
            text: value.text,
            votes: value
                .votes
                .into_iter()
                .map(|vote| VoteRecord {
                    user_id: vote.user_id.to_hex(),
                    vote: vote.value,
                })
                .collect(),
            comments: value.comments.into_iter().map(CommentRecord::from).collect(),
            created: value.created,
            upvote_percentage: value.upvote_percentage,
        }
    }
}

fn parse_user(raw: &str) -> Result<UserId, InvalidIdError> {
    raw.parse()
}

impl TryFrom<PostRecord> for Post {
    type Error = RecordError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        let post = value.id.to_hex();
        let invalid = |source| RecordError {
            post: post.clone(),
            source,
        };

        let author = User::new(
            value.author.username,
            parse_user(&value.author.user_id).map_err(invalid)?,
        );
        let votes = value
            .votes
            .into_iter()
            .map(|vote| {
                Ok(Vote {
                    user_id: parse_user(&vote.user_id)?,
                    value: vote.vote,
                })
            })
            .collect::<Result<_, InvalidIdError>>()
            .map_err(invalid)?;
        let comments = value
            .comments
            .into_iter()
            .map(|comment| {
                Ok(Comment {
                    id: from_bson_id(comment.id),
                    created: comment.created,
                    author: User::new(
                        comment.author.username,
                        parse_user(&comment.author.user_id)?,
                    ),
                    body: comment.body,
                })
            })
            .collect::<Result<_, InvalidIdError>>()
            .map_err(invalid)?;

        Ok(Self {
            id: from_bson_id(value.id),
            version: value.version as u64,
            score: value.score,
            views: value.views,
            kind: value.kind,
            title: value.title,
            url: value.url,
            author,
            category: value.category,
            text: value.text,
            votes,
            comments,
            created: value.created,
            upvote_percentage: value.upvote_percentage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rb_core::models::{NewPost, PostId};

    fn sample_post() -> Post {
        let alice = User::new("alice", "0a0b".parse().unwrap());
        let bob = User::new("bob", "0c0d".parse().unwrap());
        let new_post = NewPost {
            category: "links".into(),
            kind: PostKind::Link,
            title: "Rust".into(),
            url: "https://www.rust-lang.org".into(),
            text: String::new(),
        };
        let mut post = Post::new(PostId::generate(), new_post, alice.clone());
        post.apply_vote(&alice.user_id, 1);
        post.apply_vote(&bob.user_id, -1);
        post.comments.push(Comment::new("first".into(), bob));
        post.version = 3;
        post
    }

    #[test]
    fn test_post_survives_record_conversion() {
        let post = sample_post();
        let record = PostRecord::from(post.clone());

        assert_eq!(record.id.bytes(), post.id.object_id().bytes());
        assert_eq!(record.author.user_id, "0a0b");
        assert_eq!(record.votes[1].vote, -1);
        assert_eq!(record.version, 3);

        assert_eq!(Post::try_from(record).unwrap(), post);
    }

    #[test]
    fn test_corrupt_user_id_is_rejected() {
        let mut record = PostRecord::from(sample_post());
        record.votes[0].user_id = "not hex".into();

        let err = Post::try_from(record).unwrap_err();
        assert_eq!(err.source.kind, "user");
    }
}
