//! redboard/crates/rb-core/src/lib.rs
//!
//! The Post aggregate and the interface definitions for redboard's
//! document-store plugins.

pub mod context;
pub mod error;
pub mod ids;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use context::*;
pub use error::*;
pub use ids::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_json_round_trip() {
        let author = User::new("alice", "a1".parse().unwrap());
        let new_post = NewPost {
            category: "programming".into(),
            kind: PostKind::Link,
            title: "Hello Rust!".into(),
            url: "https://www.rust-lang.org".into(),
            text: String::new(),
        };
        let mut post = Post::new(PostId::generate(), new_post, author.clone());
        post.comments.push(Comment::new("first".into(), author));

        let json = serde_json::to_string(&post).unwrap();
        let decoded: Post = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, post);
    }
}
