use super::*;
use crate::config::ConnectorConfig;
use crate::error::Error;
use crate::retry::RetryPolicy;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-bearer",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
}

fn test_config(server: &MockServer) -> ConnectorConfig {
    ConnectorConfig::from_json(&format!(
        r#"{{
            "start_date": "2024-01-01",
            "customer_id": "C100",
            "account_ids": "",
            "oauth_client_id": "id",
            "oauth_client_secret": "secret",
            "refresh_token": "refresh",
            "developer_token": "dev",
            "token_url": "{}/token",
            "api_url": "{}"
        }}"#,
        server.uri(),
        server.uri()
    ))
    .unwrap()
}

fn test_client(server: &MockServer) -> HttpAdsClient {
    HttpAdsClient::from_config(&test_config(server))
        .unwrap()
        .with_retry_policy(RetryPolicy::fast())
}

#[tokio::test]
async fn test_get_campaigns_applies_auth_headers() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/accounts/A1/campaigns"))
        .and(header("Authorization", "Bearer test-bearer"))
        .and(header("DeveloperToken", "dev"))
        .and(header("CustomerId", "C100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "campaigns": [ { "id": "1", "name": "spring" } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let campaigns = client.get_campaigns("A1").await.unwrap();
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0]["name"], "spring");
}

#[tokio::test]
async fn test_transient_server_error_is_retried() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/customers/C100/accounts"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/customers/C100/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accounts": [ { "id": "A1" } ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let accounts = client.get_accounts().await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert!(client.total_backoff() > std::time::Duration::ZERO);
}

#[tokio::test]
async fn test_bad_request_is_not_retried() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/reports/submit"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("InvalidCustomDateRangeEnd"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let request = ReportRequest {
        report: "keyword_performance_report".to_string(),
        columns: vec!["TimePeriod".to_string()],
        start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        account_id: "A1".to_string(),
        aggregation: "Daily".to_string(),
    };

    let err = client.submit_report("A1", &request).await.unwrap_err();
    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("InvalidCustomDateRangeEnd"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_submit_report_sends_request_body() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/reports/submit"))
        .and(body_partial_json(json!({
            "report": "campaign_performance_report",
            "account_id": "A1",
            "aggregation": "Daily",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-42"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let request = ReportRequest {
        report: "campaign_performance_report".to_string(),
        columns: vec!["TimePeriod".to_string(), "Clicks".to_string()],
        start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        account_id: "A1".to_string(),
        aggregation: "Daily".to_string(),
    };

    let request_id = client.submit_report("A1", &request).await.unwrap();
    assert_eq!(request_id, "req-42");
}

#[tokio::test]
async fn test_poll_report_status_mapping() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/reports/req-1"))
        .and(query_param("account_id", "A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Success",
            "download_url": "https://files.example.com/r.zip"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let poll = client.poll_report("A1", "req-1").await.unwrap();
    assert_eq!(poll.status, ReportStatus::Success);
    assert_eq!(
        poll.download_url.as_deref(),
        Some("https://files.example.com/r.zip")
    );
}

#[tokio::test]
async fn test_poll_report_unknown_status_keeps_pending() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/reports/req-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Queued"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let poll = client.poll_report("A1", "req-2").await.unwrap();
    assert_eq!(poll.status, ReportStatus::Pending);
    assert!(poll.download_url.is_none());
}

#[tokio::test]
async fn test_download_report_propagates_status_error() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/files/gone.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .download_report(&format!("{}/files/gone.zip", server.uri()))
        .await
        .unwrap_err();
    match err {
        Error::HttpStatus { status, .. } => assert_eq!(status, 404),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_token_refresh_failure_surfaces() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.get_accounts().await.unwrap_err();
    match err {
        Error::TokenRefresh { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("invalid_grant"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_token_endpoint_transient_error_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("temporarily unavailable"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/customers/C100/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accounts": [ { "id": "A1" } ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let accounts = client.get_accounts().await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert!(client.total_backoff() > std::time::Duration::ZERO);
}
