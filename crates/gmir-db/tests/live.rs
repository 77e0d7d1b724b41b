//! Live integration tests for gmir-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness (`DATABASE_URL` must point at a server the harness can
//! create databases on). The `migrations` path is relative to the crate root
//! (`crates/gmir-db/`). Run with `cargo test -p gmir-db -- --ignored`.

use chrono::{NaiveDate, Utc};
use gmir_db::{
    claim_report_run, complete_report_run, fail_report_run, get_ai_config,
    get_latest_report_run, get_report_run_by_date, list_enabled_sources, list_keywords,
    list_report_items, list_report_runs, record_report_run_counts, replace_report_items,
    DbError, NewReportItem,
};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).expect("valid date")
}

fn item(region: &str, title: &str) -> NewReportItem {
    NewReportItem {
        region: region.to_string(),
        title_en: title.to_string(),
        title_ko: String::new(),
        summary_en: vec!["one".to_string(), "two".to_string()],
        summary_ko: vec![],
        impact_en: "impact".to_string(),
        impact_ko: String::new(),
        tags: vec!["maps".to_string()],
        confidence: Decimal::new(750, 3),
        relevance_score: Decimal::new(5, 1),
        source_url: "https://example.com/a".to_string(),
        source_name: "Example".to_string(),
        published_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Section 1: Report run lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn claim_creates_running_run(pool: sqlx::PgPool) {
    let run = claim_report_run(&pool, day(1))
        .await
        .expect("claim failed")
        .expect("fresh date should be claimable");

    assert_eq!(run.status, "running");
    assert_eq!(run.run_date, day(1));
    assert!(run.started_at.is_some());
    assert_eq!(run.total_articles, 0);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn claim_reuses_failed_run_for_same_date(pool: sqlx::PgPool) {
    let first = claim_report_run(&pool, day(2)).await.unwrap().unwrap();
    fail_report_run(&pool, first.id, "AI summarization failed")
        .await
        .expect("fail failed");

    let second = claim_report_run(&pool, day(2)).await.unwrap().unwrap();
    assert_eq!(second.id, first.id, "retry must reuse the same run row");
    assert_eq!(second.status, "running");
    assert!(second.error_message.is_none());

    let all = list_report_runs(&pool, 10).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn claim_returns_none_once_completed(pool: sqlx::PgPool) {
    let run = claim_report_run(&pool, day(3)).await.unwrap().unwrap();
    complete_report_run(&pool, run.id).await.expect("complete");

    let again = claim_report_run(&pool, day(3)).await.expect("claim");
    assert!(again.is_none(), "completed run must not be re-armed");

    let fetched = get_report_run_by_date(&pool, day(3)).await.unwrap().unwrap();
    assert_eq!(fetched.status, "completed");
    assert!(fetched.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn complete_requires_running(pool: sqlx::PgPool) {
    let run = claim_report_run(&pool, day(4)).await.unwrap().unwrap();
    complete_report_run(&pool, run.id).await.unwrap();

    let err = complete_report_run(&pool, run.id)
        .await
        .expect_err("completing twice should fail");
    assert!(matches!(
        err,
        DbError::InvalidReportRunTransition {
            expected_status: "running",
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn counts_are_recorded(pool: sqlx::PgPool) {
    let run = claim_report_run(&pool, day(5)).await.unwrap().unwrap();
    record_report_run_counts(&pool, run.id, 5, 4).await.unwrap();

    let fetched = get_report_run_by_date(&pool, day(5)).await.unwrap().unwrap();
    assert_eq!(fetched.total_articles, 5);
    assert_eq!(fetched.filtered_articles, 4);

    let err = record_report_run_counts(&pool, 999_999, 1, 1)
        .await
        .expect_err("unknown run");
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn list_runs_orders_by_date_desc(pool: sqlx::PgPool) {
    for d in [7, 9, 8] {
        claim_report_run(&pool, day(d)).await.unwrap().unwrap();
    }
    let runs = list_report_runs(&pool, 10).await.unwrap();
    let dates: Vec<NaiveDate> = runs.iter().map(|r| r.run_date).collect();
    assert_eq!(dates, vec![day(9), day(8), day(7)]);

    let latest = get_latest_report_run(&pool).await.unwrap().unwrap();
    assert_eq!(latest.run_date, day(9));
}

// ---------------------------------------------------------------------------
// Section 2: Report items
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn replace_items_is_idempotent(pool: sqlx::PgPool) {
    let run = claim_report_run(&pool, day(10)).await.unwrap().unwrap();
    let items = vec![item("NA", "first"), item("KR", "second")];

    replace_report_items(&pool, run.id, &items).await.unwrap();
    replace_report_items(&pool, run.id, &items).await.unwrap();

    let stored = list_report_items(&pool, run.id).await.unwrap();
    assert_eq!(stored.len(), 2, "second replace must not duplicate rows");
    // Ordered by region: KR before NA.
    assert_eq!(stored[0].region, "KR");
    assert_eq!(stored[1].region, "NA");
    assert_eq!(stored[0].confidence, Decimal::new(750, 3));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn replace_items_with_empty_set_clears_run(pool: sqlx::PgPool) {
    let run = claim_report_run(&pool, day(11)).await.unwrap().unwrap();
    replace_report_items(&pool, run.id, &[item("EU", "x")])
        .await
        .unwrap();
    replace_report_items(&pool, run.id, &[]).await.unwrap();

    assert!(list_report_items(&pool, run.id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Section 3: Configuration rows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn config_rows_are_read(pool: sqlx::PgPool) {
    sqlx::query(
        "INSERT INTO sources (name, type, url, region_hint, enabled) VALUES \
         ('On', 'rss', 'https://a.example/feed', 'KR', true), \
         ('Off', 'rss', 'https://b.example/feed', 'NA', false)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO keywords (value, type) VALUES ('maps', 'include'), ('waze', 'exclude')")
        .execute(&pool)
        .await
        .unwrap();

    let sources = list_enabled_sources(&pool).await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].name, "On");

    let keywords = list_keywords(&pool).await.unwrap();
    assert_eq!(keywords.len(), 2);

    assert!(get_ai_config(&pool).await.unwrap().is_none());
}
