//! Comment append, removal, status and ownership.

mod support;

use rb_core::{AppError, CommentStatus, Context};
use support::{service, text_post, user};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn comment_status_follows_add_and_remove() {
    let (service, _) = service();
    let ctx = Context::background();
    let author = user(1);
    let post_id = service
        .create(&ctx, text_post("T", "misc"), &author)
        .await
        .unwrap()
        .to_string();

    let comment_id = service
        .add_comment(&ctx, &post_id, "hello".into(), &author)
        .await
        .unwrap()
        .to_string();
    assert_eq!(
        service.comment_status(&ctx, &post_id, &comment_id).await.unwrap(),
        CommentStatus::Ok
    );

    service.remove_comment(&ctx, &post_id, &comment_id).await.unwrap();
    assert_eq!(
        service.comment_status(&ctx, &post_id, &comment_id).await.unwrap(),
        CommentStatus::CommentNotFound
    );

    assert_eq!(
        service
            .comment_status(&ctx, "65a1b2c3d4e5f60718293a4b", &comment_id)
            .await
            .unwrap(),
        CommentStatus::PostNotFound
    );
}

#[tokio::test]
async fn comments_keep_insertion_order_and_author_snapshot() {
    let (service, _) = service();
    let ctx = Context::background();
    let (alice, bob) = (user(1), user(2));
    let post_id = service
        .create(&ctx, text_post("T", "misc"), &alice)
        .await
        .unwrap()
        .to_string();

    service.add_comment(&ctx, &post_id, "one".into(), &bob).await.unwrap();
    service.add_comment(&ctx, &post_id, "two".into(), &alice).await.unwrap();

    let post = service.get(&ctx, &post_id).await.unwrap();
    let bodies: Vec<_> = post.comments.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(bodies, ["one", "two"]);
    assert_eq!(post.comments[0].author, bob);
    assert!(!post.comments[0].created.is_empty());
}

#[tokio::test]
async fn removing_twice_is_a_conflict() {
    let (service, _) = service();
    let ctx = Context::background();
    let author = user(1);
    let post_id = service
        .create(&ctx, text_post("T", "misc"), &author)
        .await
        .unwrap()
        .to_string();
    let comment_id = service
        .add_comment(&ctx, &post_id, "bye".into(), &author)
        .await
        .unwrap()
        .to_string();

    assert_ok!(service.remove_comment(&ctx, &post_id, &comment_id).await);
    let err = assert_err!(service.remove_comment(&ctx, &post_id, &comment_id).await);
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn commenting_on_deleted_post_is_a_conflict() {
    let (service, _) = service();
    let ctx = Context::background();
    let author = user(1);
    let post_id = service
        .create(&ctx, text_post("T", "misc"), &author)
        .await
        .unwrap()
        .to_string();
    service.delete(&ctx, &post_id).await.unwrap();

    let err = assert_err!(service.add_comment(&ctx, &post_id, "late".into(), &author).await);
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn comment_ownership_is_per_comment() {
    let (service, _) = service();
    let ctx = Context::background();
    let (alice, bob) = (user(1), user(2));
    let post_id = service
        .create(&ctx, text_post("T", "misc"), &alice)
        .await
        .unwrap()
        .to_string();
    let by_bob = service
        .add_comment(&ctx, &post_id, "bob's".into(), &bob)
        .await
        .unwrap()
        .to_string();

    assert!(service.is_comment_owner(&ctx, &post_id, &by_bob, &bob.user_id).await.unwrap());
    // Owning the post does not grant ownership of its comments.
    assert!(!service.is_comment_owner(&ctx, &post_id, &by_bob, &alice.user_id).await.unwrap());
    assert!(!service
        .is_comment_owner(&ctx, &post_id, "65a1b2c3d4e5f60718293a4c", &bob.user_id)
        .await
        .unwrap());
}

#[tokio::test]
async fn remove_own_comment_checks_existence_then_ownership() {
    let (service, _) = service();
    let ctx = Context::background();
    let (alice, bob) = (user(1), user(2));
    let post_id = service
        .create(&ctx, text_post("T", "misc"), &alice)
        .await
        .unwrap()
        .to_string();
    let comment_id = service
        .add_comment(&ctx, &post_id, "mine".into(), &bob)
        .await
        .unwrap()
        .to_string();

    let err = assert_err!(
        service
            .remove_own_comment(&ctx, &post_id, &comment_id, &alice.user_id)
            .await
    );
    assert!(matches!(err, AppError::Forbidden(_)));

    assert_ok!(
        service
            .remove_own_comment(&ctx, &post_id, &comment_id, &bob.user_id)
            .await
    );

    let err = assert_err!(
        service
            .remove_own_comment(&ctx, &post_id, &comment_id, &bob.user_id)
            .await
    );
    assert!(matches!(err, AppError::NotFound("comment", _)));
}

#[tokio::test]
async fn comments_do_not_disturb_votes() {
    let (service, _) = service();
    let ctx = Context::background();
    let author = user(1);
    let post_id = service
        .submit(&ctx, text_post("T", "misc"), &author)
        .await
        .unwrap()
        .id
        .to_string();

    service.add_comment(&ctx, &post_id, "a".into(), &author).await.unwrap();
    let post = service.rate(&ctx, &post_id, 1, &user(2).user_id).await.unwrap();

    assert_eq!(post.score, 2);
    assert_eq!(post.comments.len(), 1);
}
