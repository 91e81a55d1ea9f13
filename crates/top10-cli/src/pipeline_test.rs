use chrono::NaiveDate;
use top10_core::{default_countries, Category, CategoryRanking, RankingKey};
use top10_db::{DbError, MemoryRankingStore};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

const HEADER: &str = "country_name\tcountry_iso2\tweek\tcategory\tweekly_rank\tshow_title\tseason_title\tcumulative_weeks_in_top_10";

fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        database_url: None,
        log_level: "debug".to_owned(),
        countries: default_countries()
            .into_iter()
            .filter(|c| c.code == "KR" || c.code == "US")
            .collect(),
        categories: Category::ALL.to_vec(),
        bulk_url: format!("{}/data/all-weeks-countries.tsv", server.uri()),
        page_base_url: format!("{}/top10", server.uri()),
        request_timeout_secs: 5,
        user_agent: "top10-test/0.1".to_owned(),
        max_retries: 0,
        retry_backoff_base_ms: 0,
        inter_request_delay_ms: 0,
        run_budget_secs: 900,
        schedule: "0 0 12 * * TUE".to_owned(),
        db_max_connections: 1,
        db_min_connections: 0,
        db_acquire_timeout_secs: 5,
    }
}

fn test_client() -> Top10Client {
    Top10Client::new(5, "top10-test/0.1", 0, 0).expect("failed to build test client")
}

fn week() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
}

fn bulk_export() -> String {
    let mut lines = vec![HEADER.to_owned()];
    for code in ["US", "KR"] {
        for category in ["Films", "TV"] {
            for rank in 1..=10 {
                lines.push(format!(
                    "{code}\t{code}\t2026-02-01\t{category}\t{rank}\t{code} {category} {rank}\tN/A\t1"
                ));
            }
        }
    }
    lines.join("\n")
}

fn page(rows: &[(u8, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(rank, title)| {
            format!(
                r#"<tr><td data-uia="top10-table-row-rank">{rank}</td><td data-uia="top10-table-row-title">{title}</td><td data-uia="top10-table-row-weeks">1</td></tr>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><time data-uia="top10-week-start" datetime="2026-02-01"></time><table data-uia="top10-table"><tbody>{body}</tbody></table></body></html>"#
    )
}

fn good_page() -> String {
    page(&[(1, "First"), (2, "Second"), (3, "Third")])
}

async fn mount_bulk(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/data/all-weeks-countries.tsv"))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Store whose writes can be made to fail; successful calls go to `inner`.
struct FlakyStore {
    inner: MemoryRankingStore,
    fail_save: bool,
    fail_record: bool,
}

impl FlakyStore {
    fn new(fail_save: bool, fail_record: bool) -> Self {
        Self {
            inner: MemoryRankingStore::new(),
            fail_save,
            fail_record,
        }
    }
}

impl RankingStore for FlakyStore {
    async fn save(&self, rankings: &[CategoryRanking]) -> Result<u64, DbError> {
        if self.fail_save {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        self.inner.save(rankings).await
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), DbError> {
        if self.fail_record {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        self.inner.record_run(run).await
    }
}

#[tokio::test]
async fn bulk_run_saves_everything_and_succeeds() {
    let server = MockServer::start().await;
    mount_bulk(&server, ResponseTemplate::new(200).set_body_string(bulk_export())).await;
    let store = MemoryRankingStore::new();

    let result = run_pipeline(&test_config(&server), &test_client(), &store, None).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.source_used, "bulk");
    assert_eq!(result.saved, 4);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(store.rankings().len(), 4);

    let runs = store.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, result.run_id);
    assert_eq!(runs[0].status, RunStatus::Success);
}

#[tokio::test]
async fn rerunning_the_same_week_does_not_duplicate_rankings() {
    let server = MockServer::start().await;
    mount_bulk(&server, ResponseTemplate::new(200).set_body_string(bulk_export())).await;
    let store = MemoryRankingStore::new();
    let config = test_config(&server);

    let first = run_pipeline(&config, &test_client(), &store, None).await;
    let second = run_pipeline(&config, &test_client(), &store, None).await;

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(store.rankings().len(), 4);
    assert_eq!(store.runs().len(), 2);
}

#[tokio::test]
async fn fallback_run_is_partial_failure_with_bulk_error() {
    let server = MockServer::start().await;
    mount_bulk(&server, ResponseTemplate::new(503)).await;
    Mock::given(method("GET"))
        .and(path_regex("^/top10/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(good_page()))
        .mount(&server)
        .await;
    let store = MemoryRankingStore::new();

    let result = run_pipeline(&test_config(&server), &test_client(), &store, None).await;

    assert_eq!(result.status, RunStatus::PartialFailure);
    assert_eq!(result.source_used, "per-item");
    assert_eq!(result.saved, 4);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("bulk source failed"));
}

#[tokio::test]
async fn duplicate_rank_ranking_is_rejected_and_not_persisted() {
    let server = MockServer::start().await;
    mount_bulk(&server, ResponseTemplate::new(500)).await;
    Mock::given(method("GET"))
        .and(path("/top10/south-korea"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(page(&[(1, "Alpha"), (1, "Beta")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/top10/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(good_page()))
        .mount(&server)
        .await;
    let store = MemoryRankingStore::new();

    let result = run_pipeline(&test_config(&server), &test_client(), &store, None).await;

    assert_eq!(result.status, RunStatus::PartialFailure);
    assert_eq!(result.saved, 3);
    assert!(store
        .get(&RankingKey::new(week(), "KR", Category::Films))
        .is_none());
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.starts_with("validation rejected KR/films/2026-02-01: duplicate rank 1")),
        "{:?}",
        result.errors
    );
}

#[tokio::test]
async fn everything_rejected_is_a_failure() {
    let server = MockServer::start().await;
    mount_bulk(&server, ResponseTemplate::new(500)).await;
    Mock::given(method("GET"))
        .and(path_regex("^/top10/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(page(&[(2, "Out"), (1, "Of order")])),
        )
        .mount(&server)
        .await;
    let store = MemoryRankingStore::new();

    let result = run_pipeline(&test_config(&server), &test_client(), &store, None).await;

    assert_eq!(result.status, RunStatus::Failure);
    assert_eq!(result.saved, 0);
    assert!(store.rankings().is_empty());
    assert_eq!(
        result.errors.last().map(String::as_str),
        Some("no rankings passed validation")
    );
}

#[tokio::test]
async fn both_sources_failing_is_recorded_as_failure() {
    let server = MockServer::start().await;
    mount_bulk(&server, ResponseTemplate::new(500)).await;
    Mock::given(method("GET"))
        .and(path_regex("^/top10/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let store = MemoryRankingStore::new();

    let result = run_pipeline(&test_config(&server), &test_client(), &store, None).await;

    assert_eq!(result.status, RunStatus::Failure);
    assert_eq!(result.source_used, "none");
    assert_eq!(result.saved, 0);
    assert!(result.errors[0].starts_with("bulk source failed"));
    assert!(result
        .errors
        .iter()
        .any(|e| e.starts_with("KR/films: endpoint not found")));

    let runs = store.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Failure);
    assert_eq!(runs[0].source_label(), "none");
}

#[tokio::test]
async fn storage_failure_still_writes_run_record() {
    let server = MockServer::start().await;
    mount_bulk(&server, ResponseTemplate::new(200).set_body_string(bulk_export())).await;
    let store = FlakyStore::new(true, false);

    let result = run_pipeline(&test_config(&server), &test_client(), &store, None).await;

    assert_eq!(result.status, RunStatus::Failure);
    assert_eq!(result.source_used, "bulk");
    assert_eq!(result.saved, 0);
    assert!(result.errors[0].starts_with("storage failed:"));

    let runs = store.inner.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].errors, result.errors);
}

#[tokio::test]
async fn run_record_failure_does_not_change_result() {
    let server = MockServer::start().await;
    mount_bulk(&server, ResponseTemplate::new(200).set_body_string(bulk_export())).await;
    let store = FlakyStore::new(false, true);

    let result = run_pipeline(&test_config(&server), &test_client(), &store, None).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.saved, 4);
    assert!(store.inner.runs().is_empty());
}

#[tokio::test]
async fn explicit_week_is_collected() {
    let server = MockServer::start().await;
    let mut text = bulk_export();
    text.push('\n');
    text.push_str("US\tUS\t2026-02-08\tFilms\t1\tNext week\tN/A\t1");
    mount_bulk(&server, ResponseTemplate::new(200).set_body_string(text)).await;
    let store = MemoryRankingStore::new();

    let result = run_pipeline(&test_config(&server), &test_client(), &store, Some(week())).await;

    assert_eq!(result.saved, 4);
    assert!(store.rankings().iter().all(|r| r.period() == week()));
}

#[test]
fn invocation_result_serializes_to_flat_json() {
    let result = InvocationResult {
        run_id: Uuid::nil(),
        status: RunStatus::PartialFailure,
        source_used: "per-item",
        saved: 35,
        errors: vec!["JP/films: parse error in ranking page: no ranking rows".to_owned()],
    };

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "run_id": "00000000-0000-0000-0000-000000000000",
            "status": "partial_failure",
            "source_used": "per-item",
            "saved": 35,
            "errors": ["JP/films: parse error in ranking page: no ranking rows"],
        })
    );
}
