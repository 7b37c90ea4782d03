mod common;

use microblog::{AppError, PostOrder};

#[tokio::test]
async fn create_validates_content() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "poster").await;

    let post = app.posts.create(user.id, "Lorem ipsum").await.unwrap();
    assert_eq!(post.user_id, user.id);
    assert_eq!(post.content, "Lorem ipsum");

    assert!(app.posts.create(user.id, &"a".repeat(140)).await.is_ok());

    let err = app.posts.create(user.id, &"a".repeat(141)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = app.posts.create(user.id, "   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = app.posts.create(9999, "orphan").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn only_author_can_delete() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "author").await;
    let other = common::create_test_user(&app, "other").await;
    let post = app.posts.create(author.id, "mine").await.unwrap();

    let err = app.posts.delete(other.id, post.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    app.posts.delete(author.id, post.id).await.unwrap();

    let err = app.posts.delete(author.id, post.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn list_by_user_uses_requested_order() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "lister").await;
    let other = common::create_test_user(&app, "someone").await;

    let older = common::create_post_at(&app.db, user.id, "older", 60).await;
    let newer = common::create_post_at(&app.db, user.id, "newer", 1).await;
    common::create_post_at(&app.db, other.id, "not mine", 2).await;

    let (posts, total) = app
        .posts
        .list_by_user(user.id, PostOrder::NewestFirst, 1, 10)
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(
        posts.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![newer.id, older.id]
    );

    let (posts, _) = app
        .posts
        .list_by_user(user.id, PostOrder::OldestFirst, 1, 10)
        .await
        .unwrap();
    assert_eq!(
        posts.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![older.id, newer.id]
    );
}
