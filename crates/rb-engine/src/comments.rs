//! Comment engine.
//!
//! Comments are appended and removed with single-document array updates,
//! never with a whole-document replace.

use crate::{parse_post_id, PostService};
use rb_core::{
    AppError, Comment, CommentId, CommentStatus, Context, PostFilter, Result, User, UserId,
};
use tracing::{info, instrument, warn};

fn parse_comment_id(raw: &str) -> Result<CommentId> {
    Ok(raw.parse()?)
}

impl PostService {
    /// Appends a comment by `author` and returns its generated id.
    #[instrument(skip(self, ctx, body, author), fields(author = %author.username))]
    pub async fn add_comment(
        &self,
        ctx: &Context,
        post_id: &str,
        body: String,
        author: &User,
    ) -> Result<CommentId> {
        let id = parse_post_id(post_id)?;
        let comment = Comment::new(body, author.clone());
        let comment_id = comment.id;

        let outcome = ctx.run(self.store.push_comment(id, comment)).await?;
        if !outcome.is_single() {
            warn!(post_id = %id, "comment push matched no document");
            return Err(AppError::Conflict(format!(
                "post {id} disappeared before the comment was added"
            )));
        }

        info!(post_id = %id, comment_id = %comment_id, "comment added");
        Ok(comment_id)
    }

    /// Pulls the comment out of the post. Zero modified documents, whether
    /// the post or the comment is gone, is a `Conflict`.
    #[instrument(skip(self, ctx))]
    pub async fn remove_comment(
        &self,
        ctx: &Context,
        post_id: &str,
        comment_id: &str,
    ) -> Result<()> {
        let id = parse_post_id(post_id)?;
        let comment_id = parse_comment_id(comment_id)?;

        let outcome = ctx.run(self.store.pull_comment(id, comment_id)).await?;
        if outcome.modified == 0 {
            warn!(post_id = %id, comment_id = %comment_id, "comment pull modified nothing");
            return Err(AppError::Conflict(format!(
                "comment {comment_id} on post {id} was already removed"
            )));
        }

        info!(post_id = %id, comment_id = %comment_id, "comment removed");
        Ok(())
    }

    pub async fn comment_status(
        &self,
        ctx: &Context,
        post_id: &str,
        comment_id: &str,
    ) -> Result<CommentStatus> {
        let id = parse_post_id(post_id)?;
        let comment_id = parse_comment_id(comment_id)?;

        let status = match ctx.run(self.store.find_one(id)).await? {
            None => CommentStatus::PostNotFound,
            Some(post) if post.comment(comment_id).is_some() => CommentStatus::Ok,
            Some(_) => CommentStatus::CommentNotFound,
        };
        Ok(status)
    }

    pub async fn is_comment_owner(
        &self,
        ctx: &Context,
        post_id: &str,
        comment_id: &str,
        user_id: &UserId,
    ) -> Result<bool> {
        let filter = PostFilter::CommentOwnedBy {
            post: parse_post_id(post_id)?,
            comment: parse_comment_id(comment_id)?,
            user: user_id.clone(),
        };
        ctx.run(self.store.exists(filter)).await
    }

    /// Removes a comment on behalf of `user_id`: the post and comment must
    /// exist and the comment must be theirs.
    pub async fn remove_own_comment(
        &self,
        ctx: &Context,
        post_id: &str,
        comment_id: &str,
        user_id: &UserId,
    ) -> Result<()> {
        match self.comment_status(ctx, post_id, comment_id).await? {
            CommentStatus::Ok => {}
            CommentStatus::PostNotFound => {
                return Err(AppError::NotFound("post", post_id.to_owned()))
            }
            CommentStatus::CommentNotFound => {
                return Err(AppError::NotFound("comment", comment_id.to_owned()))
            }
        }
        if !self.is_comment_owner(ctx, post_id, comment_id, user_id).await? {
            return Err(AppError::Forbidden(format!(
                "user {user_id} does not own comment {comment_id}"
            )));
        }
        self.remove_comment(ctx, post_id, comment_id).await
    }
}
