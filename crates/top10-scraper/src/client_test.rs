use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn test_client(max_retries: u32) -> Top10Client {
    Top10Client::new(5, "top10-test/0.1", max_retries, 0).expect("failed to build test client")
}

#[tokio::test]
async fn fetch_text_returns_body_and_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.tsv"))
        .and(header("user-agent", "top10-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("week\tcategory\n"))
        .expect(1)
        .mount(&server)
        .await;

    let body = test_client(0)
        .fetch_text(&format!("{}/data.tsv", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "week\tcategory\n");
}

#[tokio::test]
async fn fetch_text_maps_404_to_not_found_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(3)
        .fetch_text(&format!("{}/top10/atlantis", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScraperError::NotFound { ref url } if url.ends_with("/top10/atlantis")),
        "expected NotFound, got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_text_retries_server_errors_then_gives_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = test_client(2)
        .fetch_text(&format!("{}/data.tsv", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScraperError::UnexpectedStatus { status: 502, .. }),
        "expected UnexpectedStatus(502), got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_text_recovers_after_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let body = test_client(1)
        .fetch_text(&format!("{}/top10/korea", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn fetch_text_reports_retry_after_when_rate_limit_persists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let err = test_client(0)
        .fetch_text(&format!("{}/top10/korea", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ScraperError::RateLimited {
                retry_after_secs: 7,
                ..
            }
        ),
        "expected RateLimited(7), got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_text_does_not_retry_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(3)
        .fetch_text(&format!("{}/data.tsv", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScraperError::UnexpectedStatus { status: 403, .. }
    ));
}
