use crate::e2e::helpers;

use helpers::TestContext;
use reqwest::StatusCode;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_ok_for_health_check(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);

    // Health endpoint returns plain text
    let body = String::from_utf8(response.body_bytes.clone()).unwrap();
    assert_eq!(body, "OK");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_configured_providers_when_ready(ctx: &TestContext) {
    let response = ctx.client.get("/health/ready").await.unwrap();

    response.assert_status(StatusCode::OK);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body.get("status").and_then(|v| v.as_str()), Some("ready"));

    let providers: Vec<&str> = body["providers"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(providers.contains(&"yandex_speechkit"));
    assert!(providers.contains(&"google_cloud_long_tts"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_responses(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();
    response.assert_header_exists("x-request-id");

    let response = ctx.client.get("/health/ready").await.unwrap();
    response.assert_header_exists("x-request-id");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_echo_caller_request_id(ctx: &TestContext) {
    let response = ctx
        .client
        .get_with_headers("/health", &[("x-request-id", "story-42")])
        .await
        .unwrap();

    assert_eq!(response.header("x-request-id").map(String::as_str), Some("story-42"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_json_not_found_for_unknown_routes(ctx: &TestContext) {
    let response = ctx.client.get("/api/unknown").await.unwrap();

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_message("/api/unknown");
}
