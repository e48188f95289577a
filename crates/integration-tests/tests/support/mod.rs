//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use rb_core::{NewPost, PostKind, User, UserId};
use rb_db_memory::MemoryPostStore;
use rb_engine::PostService;
use std::sync::Arc;

pub fn service() -> (PostService, Arc<MemoryPostStore>) {
    let store = Arc::new(MemoryPostStore::new());
    (PostService::new(store.clone()), store)
}

/// A user whose id is `n` rendered as two hex digits.
pub fn user(n: u8) -> User {
    let id: UserId = format!("{n:02x}").parse().unwrap();
    User::new(format!("user{n}"), id)
}

pub fn text_post(title: &str, category: &str) -> NewPost {
    NewPost {
        category: category.into(),
        kind: PostKind::Text,
        title: title.into(),
        url: String::new(),
        text: "body".into(),
    }
}

pub fn link_post(title: &str, category: &str, url: &str) -> NewPost {
    NewPost {
        category: category.into(),
        kind: PostKind::Link,
        title: title.into(),
        url: url.into(),
        text: String::new(),
    }
}
