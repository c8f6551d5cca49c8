use chrono::{DateTime, Duration, SubsecRound, Utc};
use snip::domain::entities::{ExpiredEntry, NewShortUrl, ShortUrl};
use snip::domain::repositories::Registry;
use snip::error::AppError;
use snip::infrastructure::persistence::PgRegistry;
use sqlx::PgPool;
use std::sync::Arc;

fn registry(pool: PgPool) -> PgRegistry {
    PgRegistry::new(Arc::new(pool), std::time::Duration::from_secs(5))
}

// Postgres keeps microseconds.
fn in_minutes(minutes: i64) -> DateTime<Utc> {
    (Utc::now() + Duration::minutes(minutes)).trunc_subsecs(6)
}

fn tokens(entries: &[ExpiredEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.token.as_str()).collect()
}

fn new_url(token: &str, expiration: DateTime<Utc>) -> NewShortUrl {
    NewShortUrl::new(
        token.to_string(),
        format!("https://example.com/{token}"),
        "http://sho.rt",
        expiration,
    )
}

#[sqlx::test]
async fn test_create_and_get(pool: PgPool) {
    let repo = registry(pool);
    let expiration = in_minutes(10);

    let created = repo.create(new_url("abcd1234", expiration)).await.unwrap();

    assert_eq!(
        created,
        ShortUrl {
            token: "abcd1234".to_string(),
            url: "https://example.com/abcd1234".to_string(),
            shortened_url: "http://sho.rt/abcd1234".to_string(),
            expiration,
            redirects: 0,
        }
    );
    assert_eq!(repo.get("abcd1234").await.unwrap(), created);
}

#[sqlx::test]
async fn test_duplicate_token_is_conflict(pool: PgPool) {
    let repo = registry(pool);

    repo.create(new_url("dup12345", in_minutes(10))).await.unwrap();
    let err = repo
        .create(new_url("dup12345", in_minutes(20)))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict { .. }));
}

#[sqlx::test]
async fn test_get_unknown_is_not_found(pool: PgPool) {
    let repo = registry(pool);

    let err = repo.get("missing1").await.unwrap_err();

    assert!(matches!(err, AppError::NotFound { .. }));
}

#[sqlx::test]
async fn test_increment_redirects(pool: PgPool) {
    let repo = registry(pool);
    repo.create(new_url("counted1", in_minutes(10))).await.unwrap();

    for expected in 1..=3 {
        assert_eq!(repo.increment_redirects("counted1").await.unwrap(), expected);
    }
    assert_eq!(repo.get("counted1").await.unwrap().redirects, 3);

    let err = repo.increment_redirects("missing1").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[sqlx::test]
async fn test_update_overwrites_redirects(pool: PgPool) {
    let repo = registry(pool);
    let mut record = repo.create(new_url("update12", in_minutes(10))).await.unwrap();

    record.redirects = 42;
    repo.update(&record).await.unwrap();

    assert_eq!(repo.get("update12").await.unwrap().redirects, 42);
}

#[sqlx::test]
async fn test_delete(pool: PgPool) {
    let repo = registry(pool);
    repo.create(new_url("gone1234", in_minutes(10))).await.unwrap();

    repo.delete("gone1234").await.unwrap();

    let err = repo.delete("gone1234").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
    assert!(matches!(
        repo.get("gone1234").await.unwrap_err(),
        AppError::NotFound { .. }
    ));
}

#[sqlx::test]
async fn test_list_expired_in_expiration_order(pool: PgPool) {
    let repo = registry(pool);
    repo.create(new_url("later123", in_minutes(-1))).await.unwrap();
    repo.create(new_url("oldest12", in_minutes(-30))).await.unwrap();
    repo.create(new_url("middle12", in_minutes(-10))).await.unwrap();
    repo.create(new_url("live1234", in_minutes(10))).await.unwrap();

    let expired = repo.list_expired(Utc::now(), None, 10).await.unwrap();
    assert_eq!(tokens(&expired), vec!["oldest12", "middle12", "later123"]);

    let first_page = repo.list_expired(Utc::now(), None, 2).await.unwrap();
    assert_eq!(tokens(&first_page), vec!["oldest12", "middle12"]);

    let second_page = repo
        .list_expired(Utc::now(), first_page.last().cloned(), 2)
        .await
        .unwrap();
    assert_eq!(tokens(&second_page), vec!["later123"]);
}

#[sqlx::test]
async fn test_list_expired_pages_past_equal_expirations(pool: PgPool) {
    let repo = registry(pool);
    let expiration = in_minutes(-5);
    for token in ["tie00003", "tie00001", "tie00002"] {
        repo.create(new_url(token, expiration)).await.unwrap();
    }

    let first = repo.list_expired(Utc::now(), None, 2).await.unwrap();
    assert_eq!(tokens(&first), vec!["tie00001", "tie00002"]);

    let rest = repo
        .list_expired(Utc::now(), first.last().cloned(), 2)
        .await
        .unwrap();
    assert_eq!(tokens(&rest), vec!["tie00003"]);
}

#[sqlx::test]
async fn test_delete_all(pool: PgPool) {
    let repo = registry(pool);
    for token in ["first123", "second12"] {
        repo.create(new_url(token, in_minutes(10))).await.unwrap();
    }

    let mut deleted = repo.delete_all().await.unwrap();
    deleted.sort();

    assert_eq!(deleted, vec!["first123", "second12"]);
    assert!(repo.list_tokens().await.unwrap().is_empty());
}

#[sqlx::test]
async fn test_aggregate_stats(pool: PgPool) {
    let repo = registry(pool);

    let empty = repo.aggregate_stats().await.unwrap();
    assert_eq!(empty.total_urls, 0);
    assert_eq!(empty.total_redirects, 0);

    repo.create(new_url("stats123", in_minutes(10))).await.unwrap();
    repo.create(new_url("stats456", in_minutes(10))).await.unwrap();
    repo.increment_redirects("stats123").await.unwrap();
    repo.increment_redirects("stats123").await.unwrap();
    repo.increment_redirects("stats456").await.unwrap();

    let stats = repo.aggregate_stats().await.unwrap();
    assert_eq!(stats.total_urls, 2);
    assert_eq!(stats.total_redirects, 3);
}

#[sqlx::test]
async fn test_ping(pool: PgPool) {
    assert!(registry(pool).ping().await);
}
