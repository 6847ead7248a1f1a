//! Collector integration tests
//!
//! REST sessions against wiremock servers standing in for the arrays.

use pure_exporter::collector::{
    DataSource, EntityClass, FlashArrayClient, FlashBladeClient, Query, UpstreamSettings,
};
use pure_exporter::error::CollectorError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FA_TOKEN: &str = "3bdf3b60-f0c0-fa8a-83c1-b794ba8f562c";
const FB_TOKEN: &str = "T-c61e4dec-3a0a-4a59-9bd5-5d6a8e5e8c0e";

fn settings() -> UpstreamSettings {
    UpstreamSettings {
        read_timeout_ms: 5000,
        ..UpstreamSettings::default()
    }
}

async fn flasharray_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/1.17/auth/session"))
        .and(body_json(json!({ "api_token": FA_TOKEN })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=abc; Path=/")
                .set_body_json(json!({ "username": "pureuser" })),
        )
        .mount(server)
        .await;
}

async fn flashblade_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(header("api-token", FB_TOKEN))
        .respond_with(ResponseTemplate::new(200).insert_header("x-auth-token", "session-1"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_flasharray_listing_with_flags() {
    let server = MockServer::start().await;
    flasharray_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/1.17/volume"))
        .and(query_param("action", "monitor"))
        .and(query_param("mirrored", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "v1", "mirrored_input_per_sec": 100, "usec_per_mirrored_write_op": null},
            {"name": "v2", "mirrored_input_per_sec": 0, "usec_per_mirrored_write_op": 250}
        ])))
        .mount(&server)
        .await;

    let client = FlashArrayClient::connect(&settings(), &server.uri(), FA_TOKEN)
        .await
        .unwrap();
    let records = client
        .list(EntityClass::Volume, &Query::monitor().mirrored())
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name(), Some("v1"));
    assert_eq!(records[0].number("mirrored_input_per_sec"), Some(100.0));
    assert_eq!(records[1].number("usec_per_mirrored_write_op"), Some(250.0));
}

#[tokio::test]
async fn test_flasharray_object_response_is_one_record() {
    let server = MockServer::start().await;
    flasharray_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/1.17/array"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "array_name": "fa1",
            "id": "a-1",
            "version": "6.1.0",
            "hostname": "fa1-ct0"
        })))
        .mount(&server)
        .await;

    let client = FlashArrayClient::connect(&settings(), &server.uri(), FA_TOKEN)
        .await
        .unwrap();
    let records = client.list(EntityClass::Array, &Query::new()).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("array_name").as_text(), Some("fa1"));
}

#[tokio::test]
async fn test_flasharray_rejected_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/1.17/auth/session"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = FlashArrayClient::connect(&settings(), &server.uri(), FA_TOKEN).await;
    assert!(matches!(result, Err(CollectorError::AuthenticationFailed)));
}

#[tokio::test]
async fn test_flasharray_missing_resource_is_unsupported() {
    let server = MockServer::start().await;
    flasharray_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/1.17/pod"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = FlashArrayClient::connect(&settings(), &server.uri(), FA_TOKEN)
        .await
        .unwrap();
    let err = client.list(EntityClass::Pod, &Query::new()).await.unwrap_err();

    assert!(err.is_unsupported());
}

#[tokio::test]
async fn test_flasharray_close_deletes_session() {
    let server = MockServer::start().await;
    flasharray_session(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/1.17/auth/session"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = FlashArrayClient::connect(&settings(), &server.uri(), FA_TOKEN)
        .await
        .unwrap();
    client.close().await;
}

#[tokio::test]
async fn test_flashblade_follows_continuation_tokens() {
    let server = MockServer::start().await;
    flashblade_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/1.8/file-systems"))
        .and(header("x-auth-token", "session-1"))
        .and(query_param_is_missing("token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "fs1", "space": {"virtual": 10}}],
            "pagination_info": {"continuation_token": "page-2", "total_item_count": 2}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/1.8/file-systems"))
        .and(query_param("token", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "fs2", "space": {"virtual": 20}}],
            "pagination_info": {"continuation_token": null, "total_item_count": 2}
        })))
        .mount(&server)
        .await;

    let client = FlashBladeClient::connect(&settings(), &server.uri(), FB_TOKEN)
        .await
        .unwrap();
    let records = client.list(EntityClass::FileSystem, &Query::new()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].name(), Some("fs2"));
    assert_eq!(records[1].number("space.virtual"), Some(20.0));
}

#[tokio::test]
async fn test_flashblade_specific_performance_path() {
    let server = MockServer::start().await;
    flashblade_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/1.8/arrays/nfs-specific-performance"))
        .and(query_param_is_missing("protocol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"usec_per_access_op": 12.5, "accesses_per_sec": 300}]
        })))
        .mount(&server)
        .await;

    let client = FlashBladeClient::connect(&settings(), &server.uri(), FB_TOKEN)
        .await
        .unwrap();
    let records = client
        .list(EntityClass::ArraySpecificPerformance, &Query::new().protocol("nfs"))
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].number("usec_per_access_op"), Some(12.5));
}

#[tokio::test]
async fn test_flashblade_login_without_session_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = FlashBladeClient::connect(&settings(), &server.uri(), FB_TOKEN).await;
    assert!(matches!(result, Err(CollectorError::AuthenticationFailed)));
}

#[tokio::test]
async fn test_flashblade_close_logs_out() {
    let server = MockServer::start().await;
    flashblade_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .and(header("x-auth-token", "session-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = FlashBladeClient::connect(&settings(), &server.uri(), FB_TOKEN)
        .await
        .unwrap();
    client.close().await;
}
