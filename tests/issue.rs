use httpmock::{Method::POST, Mock, MockServer};
use serde_json::json;
use serial_test::serial;

mod common;

use coupon_loadtest::config::{CouponConfiguration, IssueEndpoint};
use coupon_loadtest::request::UserIdMode;
use goose::config::GooseConfiguration;
use goose::goose::GooseMethod;
use goose::metrics::GooseMetrics;

// Paths used in load tests performed during these tests.
const ISSUE_ASYNC_PATH: &str = "/v1/issue-async";
const ISSUE_ASYNC_V2_PATH: &str = "/v2/issue-async";
const ISSUE_PATH: &str = "/v1/issue";

// Indexes to the above paths.
const ISSUE_ASYNC_KEY: usize = 0;
const ISSUE_ASYNC_V2_KEY: usize = 1;
const ISSUE_KEY: usize = 2;

const ISSUED: &str = r#"{"isSuccess":true,"comment":null}"#;

// All tests in this file run against common endpoints.
fn setup_mock_server_endpoints(server: &MockServer) -> Vec<Mock<'_>> {
    vec![
        // First set up ISSUE_ASYNC_PATH, store in vector at ISSUE_ASYNC_KEY.
        server.mock(|when, then| {
            when.method(POST)
                .path(ISSUE_ASYNC_PATH)
                .header("content-type", "application/json");
            then.status(200)
                .header("content-type", "application/json")
                .body(ISSUED);
        }),
        // Next set up ISSUE_ASYNC_V2_PATH, store in vector at ISSUE_ASYNC_V2_KEY.
        server.mock(|when, then| {
            when.method(POST)
                .path(ISSUE_ASYNC_V2_PATH)
                .header("content-type", "application/json");
            then.status(200)
                .header("content-type", "application/json")
                .body(ISSUED);
        }),
        // Last set up ISSUE_PATH, store in vector at ISSUE_KEY.
        server.mock(|when, then| {
            when.method(POST)
                .path(ISSUE_PATH)
                .header("content-type", "application/json");
            then.status(200)
                .header("content-type", "application/json")
                .body(ISSUED);
        }),
    ]
}

// Build appropriate configuration for these tests.
fn common_build_configuration(server: &MockServer) -> GooseConfiguration {
    common::build_configuration(
        server,
        vec!["--users", "2", "--hatch-rate", "4", "--run-time", "2", "--no-reset-metrics"],
    )
}

// Confirm every request went to `path`, and Goose agrees with the mock server.
fn validate_issue(goose_metrics: &GooseMetrics, mock: &Mock, path: &str) {
    // Confirm that we loaded the mock endpoint.
    assert!(mock.calls() > 0);

    let issue_metrics = goose_metrics
        .requests
        .get(&format!("POST {}", path))
        .unwrap();

    // Confirm that the path and method are correct in the metrics.
    assert!(issue_metrics.path == path);
    assert!(issue_metrics.method == GooseMethod::Post);

    // Every request was a success, and each one reached the server once.
    assert!(issue_metrics.fail_count == 0);
    mock.assert_calls(issue_metrics.raw_data.counter);
    mock.assert_calls(issue_metrics.success_count);

    // Only the issuance endpoint was requested.
    assert_eq!(goose_metrics.requests.len(), 1);
}

#[tokio::test]
#[serial]
/// Default configuration POSTs to /v1/issue-async only.
async fn test_issue_async_default() {
    let server = MockServer::start();
    let mock_endpoints = setup_mock_server_endpoints(&server);

    let configuration = CouponConfiguration::default();
    let goose_attack =
        common::build_load_test(common_build_configuration(&server), &configuration);
    let goose_metrics = common::run_load_test(goose_attack).await;

    validate_issue(
        &goose_metrics,
        &mock_endpoints[ISSUE_ASYNC_KEY],
        ISSUE_ASYNC_PATH,
    );
    assert!(mock_endpoints[ISSUE_ASYNC_V2_KEY].calls() == 0);
    assert!(mock_endpoints[ISSUE_KEY].calls() == 0);
}

#[tokio::test]
#[serial]
/// Requests are recorded under the endpoint, whichever route is targeted.
async fn test_requests_keyed_by_endpoint() {
    for endpoint in [
        IssueEndpoint::IssueV1,
        IssueEndpoint::AsyncIssueV1,
        IssueEndpoint::AsyncIssueV2,
    ] {
        let server = MockServer::start();
        let _mock_endpoints = setup_mock_server_endpoints(&server);

        let configuration = CouponConfiguration {
            endpoint: endpoint.clone(),
            ..Default::default()
        };
        let goose_attack =
            common::build_load_test(common::build_configuration(&server, vec![]), &configuration);
        let goose_metrics = common::run_load_test(goose_attack).await;

        let keys: Vec<&String> = goose_metrics.requests.keys().collect();
        assert_eq!(keys, vec![&endpoint.request_key()]);
        assert_eq!(endpoint.request_key(), format!("POST {}", endpoint.path()));
    }
}

#[tokio::test]
#[serial]
/// A fixed user id sends the same body every time.
async fn test_issue_fixed_user() {
    let server = MockServer::start();
    let duplicate = server.mock(|when, then| {
        when.method(POST)
            .path(ISSUE_ASYNC_PATH)
            .json_body(json!({"userId": 1, "couponId": 1}));
        then.status(200).body(ISSUED);
    });

    let configuration = CouponConfiguration {
        user_ids: UserIdMode::Fixed(1),
        ..Default::default()
    };
    let goose_attack =
        common::build_load_test(common_build_configuration(&server), &configuration);
    let goose_metrics = common::run_load_test(goose_attack).await;

    validate_issue(&goose_metrics, &duplicate, ISSUE_ASYNC_PATH);
}

#[tokio::test]
#[serial]
/// The other issuance routes can be targeted instead.
async fn test_issue_other_endpoints() {
    for (endpoint, key, path) in [
        (IssueEndpoint::AsyncIssueV2, ISSUE_ASYNC_V2_KEY, ISSUE_ASYNC_V2_PATH),
        (IssueEndpoint::IssueV1, ISSUE_KEY, ISSUE_PATH),
    ] {
        let server = MockServer::start();
        let mock_endpoints = setup_mock_server_endpoints(&server);

        let configuration = CouponConfiguration {
            endpoint,
            ..Default::default()
        };
        let goose_attack =
            common::build_load_test(common_build_configuration(&server), &configuration);
        let goose_metrics = common::run_load_test(goose_attack).await;

        validate_issue(&goose_metrics, &mock_endpoints[key], path);
        assert!(mock_endpoints[ISSUE_ASYNC_KEY].calls() == 0);
    }
}

#[tokio::test]
#[serial]
/// COUPON_HOST is only a default: --host wins.
async fn test_host_option_wins() {
    let server = MockServer::start();
    let mock_endpoints = setup_mock_server_endpoints(&server);

    let configuration = CouponConfiguration {
        host: "http://coupon.invalid:8080".to_string(),
        ..Default::default()
    };
    let goose_attack =
        common::build_load_test(common_build_configuration(&server), &configuration);
    let goose_metrics = common::run_load_test(goose_attack).await;

    validate_issue(
        &goose_metrics,
        &mock_endpoints[ISSUE_ASYNC_KEY],
        ISSUE_ASYNC_PATH,
    );
}
