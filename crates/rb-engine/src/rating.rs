//! Rating engine.
//!
//! A vote is a read-modify-write of the whole document: read the post,
//! adjust `votes`, `score` and `upvote_percentage`, then replace it on the
//! condition that its version is still the one that was read. A replace
//! that matches nothing means another writer got there first (or the post
//! was deleted), so the whole cycle starts over from a fresh read, up to
//! `max_write_attempts` times.

use crate::{parse_post_id, post_not_found, PostService};
use rb_core::{AppError, Context, Post, PostId, Result, UserId};
use tracing::{debug, info, instrument, warn};

impl PostService {
    /// Sets `user_id`'s vote on the post to `value`.
    ///
    /// Any signed value is accepted; a repeated vote by the same user
    /// replaces the earlier one.
    #[instrument(skip(self, ctx, user_id), fields(user = %user_id))]
    pub async fn rate(
        &self,
        ctx: &Context,
        post_id: &str,
        value: i64,
        user_id: &UserId,
    ) -> Result<Post> {
        let id = parse_post_id(post_id)?;
        self.rate_post(ctx, id, value, user_id).await
    }

    pub async fn upvote(&self, ctx: &Context, post_id: &str, user_id: &UserId) -> Result<Post> {
        self.rate(ctx, post_id, 1, user_id).await
    }

    pub async fn downvote(&self, ctx: &Context, post_id: &str, user_id: &UserId) -> Result<Post> {
        self.rate(ctx, post_id, -1, user_id).await
    }

    /// Retracts `user_id`'s vote. Succeeds without writing if there is none.
    #[instrument(skip(self, ctx, user_id), fields(user = %user_id))]
    pub async fn unrate(&self, ctx: &Context, post_id: &str, user_id: &UserId) -> Result<Post> {
        let id = parse_post_id(post_id)?;
        let post = self
            .modify_votes(ctx, id, |post| post.retract_vote(user_id).is_some())
            .await?;
        info!(post_id = %id, score = post.score, "vote retracted");
        Ok(post)
    }

    pub(crate) async fn rate_post(
        &self,
        ctx: &Context,
        id: PostId,
        value: i64,
        user_id: &UserId,
    ) -> Result<Post> {
        let post = self
            .modify_votes(ctx, id, |post| {
                post.apply_vote(user_id, value);
                true
            })
            .await?;
        info!(post_id = %id, value, score = post.score, "vote applied");
        Ok(post)
    }

    /// Optimistic read-modify-write loop. `mutate` returns whether it
    /// changed the post; an unchanged post is returned without a write.
    async fn modify_votes<F>(&self, ctx: &Context, id: PostId, mut mutate: F) -> Result<Post>
    where
        F: FnMut(&mut Post) -> bool,
    {
        let attempts = self.options.max_write_attempts;

        for attempt in 1..=attempts {
            let mut post = ctx
                .run(self.store.find_one(id))
                .await?
                .ok_or_else(|| post_not_found(id))?;

            if !mutate(&mut post) {
                return Ok(post);
            }

            let expected_version = post.version;
            post.version += 1;

            let outcome = ctx
                .run(self.store.replace(id, expected_version, post.clone()))
                .await?;
            if outcome.is_single() {
                return Ok(post);
            }

            debug!(
                post_id = %id,
                attempt,
                expected_version,
                "post changed before replace, retrying"
            );
        }

        warn!(post_id = %id, attempts, "giving up on contended post");
        Err(AppError::Conflict(format!(
            "post {id} was modified concurrently {attempts} times in a row"
        )))
    }
}
