//! Post lifecycle: create, read, list, ownership, delete.

use crate::{parse_post_id, post_not_found, PostService};
use rb_core::{AppError, Context, NewPost, Post, PostFilter, PostId, Result, User, UserId};
use tracing::{info, instrument, warn};

impl PostService {
    /// Inserts a new unrated post and returns its id.
    #[instrument(skip_all, fields(author = %author.username, category = %new_post.category))]
    pub async fn create(&self, ctx: &Context, new_post: NewPost, author: &User) -> Result<PostId> {
        let post = Post::new(PostId::generate(), new_post, author.clone());
        let id = ctx
            .run(self.store.insert(post))
            .await
            .inspect_err(|err| warn!(error = %err, "insert failed"))?;

        info!(post_id = %id, "post created");
        Ok(id)
    }

    /// Creates a post, applies its author's upvote, and reads it back.
    ///
    /// The three steps are separate store writes. If the upvote fails the
    /// post stays in the store unrated and the error is returned.
    pub async fn submit(&self, ctx: &Context, new_post: NewPost, author: &User) -> Result<Post> {
        let id = self.create(ctx, new_post, author).await?;
        self.rate_post(ctx, id, 1, &author.user_id).await?;
        self.get_post(ctx, id).await
    }

    /// Fetches a post, counting the read as a view. The returned `views`
    /// does not include this read.
    #[instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &Context, post_id: &str) -> Result<Post> {
        let id = parse_post_id(post_id)?;
        self.get_post(ctx, id).await
    }

    pub(crate) async fn get_post(&self, ctx: &Context, id: PostId) -> Result<Post> {
        ctx.run(self.store.find_and_increment_views(id))
            .await?
            .ok_or_else(|| post_not_found(id))
    }

    pub async fn list(&self, ctx: &Context) -> Result<Vec<Post>> {
        ctx.run(self.store.find(PostFilter::All)).await
    }

    pub async fn list_by_category(&self, ctx: &Context, category: &str) -> Result<Vec<Post>> {
        ctx.run(self.store.find(PostFilter::Category(category.to_owned())))
            .await
    }

    /// Posts whose embedded author snapshot carries `username`.
    pub async fn list_by_author(&self, ctx: &Context, username: &str) -> Result<Vec<Post>> {
        ctx.run(self.store.find(PostFilter::AuthorUsername(username.to_owned())))
            .await
    }

    /// A missing post is `Ok(false)`, never `NotFound`.
    pub async fn exists(&self, ctx: &Context, post_id: &str) -> Result<bool> {
        let id = parse_post_id(post_id)?;
        ctx.run(self.store.exists(PostFilter::Id(id))).await
    }

    pub async fn is_owner(&self, ctx: &Context, post_id: &str, user_id: &UserId) -> Result<bool> {
        let id = parse_post_id(post_id)?;
        let filter = PostFilter::OwnedBy {
            post: id,
            user: user_id.clone(),
        };
        ctx.run(self.store.exists(filter)).await
    }

    /// Removes the post with its comments and votes.
    ///
    /// Deleting an id that no longer exists is a `Conflict`.
    #[instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &Context, post_id: &str) -> Result<()> {
        let id = parse_post_id(post_id)?;
        let outcome = ctx.run(self.store.delete(id)).await?;

        if outcome.matched == 0 {
            warn!(post_id = %id, "delete matched no document");
            return Err(AppError::Conflict(format!("post {id} was already deleted")));
        }
        info!(post_id = %id, "post deleted");
        Ok(())
    }

    /// Deletes a post on behalf of `user_id`, checking existence and
    /// ownership first.
    pub async fn delete_own_post(
        &self,
        ctx: &Context,
        post_id: &str,
        user_id: &UserId,
    ) -> Result<()> {
        if !self.exists(ctx, post_id).await? {
            return Err(AppError::NotFound("post", post_id.to_owned()));
        }
        if !self.is_owner(ctx, post_id, user_id).await? {
            return Err(AppError::Forbidden(format!(
                "user {user_id} does not own post {post_id}"
            )));
        }
        self.delete(ctx, post_id).await
    }
}
