//! # rb-db-mongo
//!
//! `PostStore` over a MongoDB collection. Every post is a single document
//! with its votes and comments embedded, so each trait operation maps onto
//! exactly one single-document driver call.

mod record;

pub use record::{AuthorRecord, CommentRecord, PostRecord, RecordError, VoteRecord};

use anyhow::Context as _;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, to_bson, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, IndexModel};
use rb_core::models::{Comment, CommentId, Post, PostId};
use rb_core::traits::{PostFilter, PostStore, WriteOutcome};
use record::to_bson_id;
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct MongoPostStore {
    posts: Collection<PostRecord>,
}

impl MongoPostStore {
    pub fn new(posts: Collection<PostRecord>) -> Self {
        Self { posts }
    }

    /// Connects, pings the server, and makes sure the listing indexes exist.
    #[instrument(skip(uri))]
    pub async fn connect(uri: &str, database: &str, collection: &str) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("parsing MongoDB connection string")?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 })
            .await
            .context("pinging MongoDB")?;
        info!("connected to MongoDB");

        let store = Self::new(db.collection(collection));
        store.ensure_indexes().await?;
        Ok(store)
    }

    pub async fn ensure_indexes(&self) -> anyhow::Result<()> {
        for keys in [doc! { "category": 1 }, doc! { "author.username": 1 }] {
            self.posts
                .create_index(IndexModel::builder().keys(keys).build())
                .await
                .context("creating index on posts")?;
        }
        Ok(())
    }
}

/// Translates a store filter into a query document.
pub fn filter_doc(filter: &PostFilter) -> Document {
    match filter {
        PostFilter::All => doc! {},
        PostFilter::Id(id) => doc! { "_id": to_bson_id(*id) },
        PostFilter::Category(category) => doc! { "category": category.as_str() },
        PostFilter::AuthorUsername(username) => doc! { "author.username": username.as_str() },
        PostFilter::OwnedBy { post, user } => doc! {
            "_id": to_bson_id(*post),
            "author._id": user.to_hex(),
        },
        PostFilter::CommentOwnedBy {
            post,
            comment,
            user,
        } => doc! {
            "_id": to_bson_id(*post),
            "comments": {
                "$elemMatch": {
                    "_id": to_bson_id(*comment),
                    "author._id": user.to_hex(),
                }
            },
        },
    }
}

/// Matches the post only while it is still at `expected_version`.
/// Documents written before versioning carry no `version` field and count
/// as version 0.
pub fn versioned_filter(id: PostId, expected_version: u64) -> Document {
    let version = if expected_version == 0 {
        doc! { "$in": [0_i64, null] }
    } else {
        doc! { "$eq": expected_version as i64 }
    };
    doc! { "_id": to_bson_id(id), "version": version }
}

fn into_post(record: PostRecord) -> anyhow::Result<Post> {
    Ok(Post::try_from(record)?)
}

#[async_trait]
impl PostStore for MongoPostStore {
    async fn insert(&self, post: Post) -> anyhow::Result<PostId> {
        let id = post.id;
        self.posts
            .insert_one(PostRecord::from(post))
            .await
            .with_context(|| format!("inserting post {id}"))?;
        Ok(id)
    }

    async fn find(&self, filter: PostFilter) -> anyhow::Result<Vec<Post>> {
        let records: Vec<PostRecord> = self
            .posts
            .find(filter_doc(&filter))
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;
        records.into_iter().map(into_post).collect()
    }

    async fn find_one(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        self.posts
            .find_one(filter_doc(&PostFilter::Id(id)))
            .await?
            .map(into_post)
            .transpose()
    }

    async fn exists(&self, filter: PostFilter) -> anyhow::Result<bool> {
        let count = self
            .posts
            .count_documents(filter_doc(&filter))
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    async fn find_and_increment_views(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        self.posts
            .find_one_and_update(
                filter_doc(&PostFilter::Id(id)),
                doc! { "$inc": { "views": 1 } },
            )
            .return_document(ReturnDocument::Before)
            .await?
            .map(into_post)
            .transpose()
    }

    async fn push_comment(&self, id: PostId, comment: Comment) -> anyhow::Result<WriteOutcome> {
        let comment = to_bson(&CommentRecord::from(comment))?;
        let result = self
            .posts
            .update_one(
                filter_doc(&PostFilter::Id(id)),
                doc! {
                    "$push": { "comments": comment },
                    "$inc": { "version": 1 },
                },
            )
            .await?;
        Ok(WriteOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn pull_comment(
        &self,
        id: PostId,
        comment_id: CommentId,
    ) -> anyhow::Result<WriteOutcome> {
        let comment_id = to_bson_id(comment_id);
        let result = self
            .posts
            .update_one(
                doc! { "_id": to_bson_id(id), "comments._id": comment_id },
                doc! {
                    "$pull": { "comments": { "_id": comment_id } },
                    "$inc": { "version": 1 },
                },
            )
            .await?;
        Ok(WriteOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn replace(
        &self,
        id: PostId,
        expected_version: u64,
        mut post: Post,
    ) -> anyhow::Result<WriteOutcome> {
        post.id = id;
        let result = self
            .posts
            .replace_one(versioned_filter(id, expected_version), PostRecord::from(post))
            .await?;
        if result.matched_count == 0 {
            debug!(post_id = %id, expected_version, "versioned replace matched nothing");
        }
        Ok(WriteOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete(&self, id: PostId) -> anyhow::Result<WriteOutcome> {
        let result = self.posts.delete_one(filter_doc(&PostFilter::Id(id))).await?;
        Ok(WriteOutcome {
            matched: result.deleted_count,
            modified: result.deleted_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;
    use rb_core::ids::UserId;

    #[test]
    fn test_listing_filters_are_plain_equality() {
        assert!(filter_doc(&PostFilter::All).is_empty());
        assert_eq!(
            filter_doc(&PostFilter::Category("music".into())),
            doc! { "category": "music" }
        );
        assert_eq!(
            filter_doc(&PostFilter::AuthorUsername("alice".into())),
            doc! { "author.username": "alice" }
        );
    }

    #[test]
    fn test_id_filter_uses_native_object_id() {
        let id: PostId = "65a1b2c3d4e5f60718293a4b".parse().unwrap();
        let filter = filter_doc(&PostFilter::Id(id));
        match filter.get("_id") {
            Some(Bson::ObjectId(oid)) => assert_eq!(oid.to_hex(), id.to_string()),
            other => panic!("unexpected _id value {other:?}"),
        }
    }

    #[test]
    fn test_comment_ownership_filter_matches_one_element() {
        let post: PostId = "65a1b2c3d4e5f60718293a4b".parse().unwrap();
        let comment: CommentId = "65a1b2c3d4e5f60718293a4c".parse().unwrap();
        let user: UserId = "beef".parse().unwrap();

        let filter = filter_doc(&PostFilter::CommentOwnedBy {
            post,
            comment,
            user,
        });
        let elem = filter
            .get_document("comments")
            .unwrap()
            .get_document("$elemMatch")
            .unwrap();
        assert_eq!(elem.get_str("author._id").unwrap(), "beef");
        assert_eq!(
            elem.get_object_id("_id").unwrap().to_hex(),
            comment.to_string()
        );
    }

    #[test]
    fn test_first_replace_also_matches_unversioned_documents() {
        let id: PostId = "65a1b2c3d4e5f60718293a4b".parse().unwrap();

        let first = versioned_filter(id, 0);
        let allowed = first
            .get_document("version")
            .unwrap()
            .get_array("$in")
            .unwrap();
        assert_eq!(allowed, &vec![Bson::Int64(0), Bson::Null]);

        let later = versioned_filter(id, 4);
        assert_eq!(later.get_document("version").unwrap(), &doc! { "$eq": 4_i64 });
        assert_eq!(later.get_object_id("_id").unwrap().to_hex(), id.to_string());
    }
}
