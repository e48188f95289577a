//! # seed
//!
//! Assembles the engine from settings and fills the store with a handful
//! of demo posts, votes and comments.

use anyhow::Context as _;
use rb_config::{Backend, Settings};
use rb_core::{Context, NewPost, PostKind, PostStore, User, UserId};
use rb_db_memory::MemoryPostStore;
use rb_db_mongo::MongoPostStore;
use rb_engine::{EngineOptions, PostService};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.log.json {
        fmt.json().init();
    } else {
        fmt.init();
    }
}

async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn PostStore>> {
    Ok(match settings.store.backend {
        Backend::Memory => Arc::new(MemoryPostStore::new()),
        Backend::Mongo => Arc::new(
            MongoPostStore::connect(
                settings.store.uri.expose_secret(),
                &settings.store.database,
                &settings.store.collection,
            )
            .await?,
        ),
    })
}

fn demo_user(name: &str, id: &str) -> anyhow::Result<User> {
    let user_id: UserId = id.parse()?;
    Ok(User::new(name, user_id))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings);

    let store = open_store(&settings).await?;
    let service = PostService::with_options(
        store,
        EngineOptions {
            max_write_attempts: settings.engine.max_write_attempts,
        },
    );
    let timeout = settings.engine.request_timeout();

    let alice = demo_user("alice", "5f1a2b3c4d5e6f7081920a1b")?;
    let bob = demo_user("bob", "5f1a2b3c4d5e6f7081920a1c")?;
    let carol = demo_user("carol", "5f1a2b3c4d5e6f7081920a1d")?;

    let ctx = Context::with_timeout(timeout);
    let rust = service
        .submit(
            &ctx,
            NewPost {
                category: "programming".into(),
                kind: PostKind::Link,
                title: "The Rust Programming Language".into(),
                url: "https://doc.rust-lang.org/book/".into(),
                text: String::new(),
            },
            &alice,
        )
        .await
        .context("submitting link post")?;
    let rust_id = rust.id.to_string();

    let ctx = Context::with_timeout(timeout);
    let music = service
        .submit(
            &ctx,
            NewPost {
                category: "music".into(),
                kind: PostKind::Text,
                title: "Albums on repeat this week".into(),
                url: String::new(),
                text: "Post yours below.".into(),
            },
            &bob,
        )
        .await
        .context("submitting text post")?;
    let music_id = music.id.to_string();

    let ctx = Context::with_timeout(timeout);
    service.upvote(&ctx, &rust_id, &bob.user_id).await?;
    service.downvote(&ctx, &rust_id, &carol.user_id).await?;
    service.upvote(&ctx, &music_id, &carol.user_id).await?;
    service.unrate(&ctx, &rust_id, &carol.user_id).await?;

    service
        .add_comment(&ctx, &rust_id, "Chapter 16 is a gem.".into(), &bob)
        .await?;
    let stray = service
        .add_comment(&ctx, &music_id, "first".into(), &carol)
        .await?;
    service
        .remove_own_comment(&ctx, &music_id, &stray.to_string(), &carol.user_id)
        .await?;
    service
        .add_comment(&ctx, &music_id, "Blue Train, every time.".into(), &alice)
        .await?;

    let ctx = Context::with_timeout(timeout);
    for post in service.list(&ctx).await? {
        info!(
            post_id = %post.id,
            category = %post.category,
            score = post.score,
            votes = post.votes.len(),
            comments = post.comments.len(),
            upvote_percentage = post.upvote_percentage,
            "seeded"
        );
    }
    Ok(())
}
