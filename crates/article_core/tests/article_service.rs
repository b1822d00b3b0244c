use article_core::db::{open_db, open_db_in_memory};
use article_core::{
    decode_article, ArticleError, ArticleFilter, ArticleKey, ArticleListQuery, ArticlePatch,
    ArticleService, ArticleValidationError, NewArticle, PublishedAtPatch, SqliteArticleStore,
};
use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Barrier};
use std::thread;

fn candidate(title: &str, category: &str, publisher: &str) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        body: format!("{title} body"),
        category: category.to_string(),
        publisher: publisher.to_string(),
        published_at: None,
    }
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn create_returns_persisted_article_and_resolves_lookups() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));

    let created = service
        .create(candidate("Tommy test", "Extras", "Femonofsky"))
        .unwrap();

    assert!(created.id >= 1);
    assert_eq!(created.title, "Tommy test");
    assert_eq!(created.category, "Extras");
    assert_eq!(created.publisher, "Femonofsky");
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM categories WHERE name = 'Extras';"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM publishers WHERE name = 'Femonofsky';"), 1);
}

#[test]
fn create_rejects_missing_fields_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));

    let err = service
        .create(candidate("", "Money", "tunde"))
        .unwrap_err();
    assert!(matches!(
        err,
        ArticleError::ValidationFailed(ArticleValidationError::MissingFields(ref fields))
            if fields == &vec!["title"]
    ));

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM articles;"), 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM categories;"), 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM publishers;"), 0);
}

#[test]
fn second_create_with_same_title_fails_and_keeps_one_row() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));

    service
        .create(candidate("Love of Money", "Money", "tunde"))
        .unwrap();
    let err = service
        .create(candidate("Love of Money", "Other", "someone"))
        .unwrap_err();

    assert!(matches!(err, ArticleError::DuplicateTitle(ref title) if title == "Love of Money"));
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM articles WHERE title = 'Love of Money';"),
        1
    );
    // Rejected before resolution, so the second lookup names were never created.
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM categories WHERE name = 'Other';"), 0);
}

#[test]
fn get_and_delete_follow_not_found_rules() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));
    let created = service
        .create(candidate("Money", "social", "femonofsky"))
        .unwrap();

    assert_eq!(service.get(created.id).unwrap(), created);

    service.delete(created.id).unwrap();
    let err = service.get(created.id).unwrap_err();
    assert!(matches!(err, ArticleError::NotFound(ArticleKey::Id(id)) if id == created.id));

    let err = service.delete(created.id).unwrap_err();
    assert!(matches!(err, ArticleError::NotFound(_)));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM categories WHERE name = 'social';"), 1);
}

#[test]
fn title_becomes_available_again_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));
    let created = service
        .create(candidate("Money", "social", "femonofsky"))
        .unwrap();
    service.delete(created.id).unwrap();

    let recreated = service
        .create(candidate("Money", "social", "femonofsky"))
        .unwrap();
    assert_ne!(recreated.id, created.id);
}

#[test]
fn update_merges_present_fields_only() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));
    let published_at = Utc.with_ymd_and_hms(2019, 1, 1, 8, 0, 0).unwrap();
    let mut initial = candidate("Money", "social", "femonofsky");
    initial.published_at = Some(published_at);
    let created = service.create(initial).unwrap();

    let patch = decode_article(br#"{ "body": "Money is good sjdnaj", "category": "finance" }"#)
        .unwrap()
        .into_patch();
    let updated = service.update(created.id, patch).unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Money");
    assert_eq!(updated.body, "Money is good sjdnaj");
    assert_eq!(updated.category, "finance");
    assert_eq!(updated.publisher, "femonofsky");
    assert_eq!(updated.published_at, Some(published_at));
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM categories WHERE name = 'finance';"), 1);
}

#[test]
fn update_can_clear_published_at() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));
    let mut initial = candidate("Money", "social", "femonofsky");
    initial.published_at = Some(Utc.with_ymd_and_hms(2019, 1, 1, 8, 0, 0).unwrap());
    let created = service.create(initial).unwrap();

    let patch = ArticlePatch {
        published_at: PublishedAtPatch::Clear,
        ..ArticlePatch::default()
    };
    let updated = service.update(created.id, patch).unwrap();
    assert_eq!(updated.published_at, None);
}

#[test]
fn update_rejects_explicitly_emptied_required_field() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));
    let created = service
        .create(candidate("Money", "social", "femonofsky"))
        .unwrap();

    let patch = ArticlePatch {
        publisher: Some(String::new()),
        ..ArticlePatch::default()
    };
    let err = service.update(created.id, patch).unwrap_err();
    assert!(matches!(err, ArticleError::ValidationFailed(_)));
    assert_eq!(service.get(created.id).unwrap().publisher, "femonofsky");
}

#[test]
fn update_rejects_title_owned_by_another_article() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));
    service
        .create(candidate("Money", "social", "femonofsky"))
        .unwrap();
    let other = service
        .create(candidate("Love of Money", "Money", "tunde"))
        .unwrap();

    let rename = ArticlePatch {
        title: Some("Money".to_string()),
        ..ArticlePatch::default()
    };
    let err = service.update(other.id, rename).unwrap_err();
    assert!(matches!(err, ArticleError::DuplicateTitle(_)));

    let keep_own_title = ArticlePatch {
        title: Some("Love of Money".to_string()),
        body: Some("new body".to_string()),
        ..ArticlePatch::default()
    };
    assert_eq!(
        service.update(other.id, keep_own_title).unwrap().body,
        "new body"
    );
}

#[test]
fn update_missing_article_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));

    let err = service.update(404, ArticlePatch::default()).unwrap_err();
    assert!(matches!(err, ArticleError::NotFound(ArticleKey::Id(404))));
}

#[test]
fn list_returns_exact_filter_subsets() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));
    service
        .create(candidate("Money", "social", "femonofsky"))
        .unwrap();
    service
        .create(candidate("Love of Money", "Money", "tunde"))
        .unwrap();

    assert_eq!(service.list(&ArticleFilter::default()).unwrap().len(), 2);

    let query = ArticleListQuery {
        category: Some("Money".to_string()),
        ..ArticleListQuery::default()
    };
    let listed = service.list_from_query(&query).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Love of Money");

    let query = ArticleListQuery {
        category: Some("Money23".to_string()),
        ..ArticleListQuery::default()
    };
    assert!(service.list_from_query(&query).unwrap().is_empty());
}

#[test]
fn list_rejects_malformed_date_filter() {
    let conn = open_db_in_memory().unwrap();
    let service = ArticleService::new(SqliteArticleStore::new(&conn));

    let query = ArticleListQuery {
        created_at: Some("2019-13-01 00:00:00".to_string()),
        ..ArticleListQuery::default()
    };
    let err = service.list_from_query(&query).unwrap_err();
    assert!(matches!(err, ArticleError::InvalidInput(ref message) if message.contains("created_at")));
}

#[test]
fn concurrent_creates_share_one_new_category() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.db");
    drop(open_db(&path).unwrap());

    let workers = 6;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|index| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = ArticleService::new(SqliteArticleStore::new(&conn));
                barrier.wait();
                service
                    .create(candidate(&format!("story {index}"), "Breaking", "wire"))
                    .unwrap()
                    .id
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM categories WHERE name = 'Breaking';"), 1);
    let service = ArticleService::new(SqliteArticleStore::new(&conn));
    let filter = ArticleFilter {
        category: Some("Breaking".to_string()),
        ..ArticleFilter::default()
    };
    assert_eq!(service.list(&filter).unwrap().len(), workers);
}
