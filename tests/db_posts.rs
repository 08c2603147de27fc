use secret_board::application::repos::{CreatePostParams, PostsRepo, PostsWriteRepo, RepoError};
use secret_board::infra::db::PostgresRepositories;
use sqlx::PgPool;

fn params(content: &str, posted_by: Option<&str>) -> CreatePostParams {
    CreatePostParams {
        content: content.to_string(),
        posted_by: posted_by.map(str::to_string),
        tracking_cookie: Some("42".to_string()),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn posts_round_trip_through_postgres(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);

    let first = repos
        .create_post(params("line1\nline2", Some("alice")))
        .await
        .expect("insert first");
    let second = repos
        .create_post(params("second", None))
        .await
        .expect("insert second");
    assert!(second.id > first.id);

    let listed = repos.list_posts().await.expect("list posts");
    let ids: Vec<i64> = listed.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(listed[1].content, "line1\nline2");
    assert_eq!(listed[1].posted_by.as_deref(), Some("alice"));
    assert_eq!(listed[0].posted_by, None);

    let found = repos
        .find_by_id(first.id)
        .await
        .expect("find post")
        .expect("post exists");
    assert_eq!(found.tracking_cookie.as_deref(), Some("42"));

    repos.delete_post(first.id).await.expect("delete post");
    assert!(repos.find_by_id(first.id).await.expect("find").is_none());
    assert!(matches!(
        repos.delete_post(first.id).await,
        Err(RepoError::NotFound)
    ));

    repos.ping().await.expect("ping");
}
