//! Integration tests for the authenticated request client
//!
//! Exercises the check → refresh → send → retry-once state machine against a
//! wiremock server, with a scripted session flow standing in for the backend
//! refresh endpoint.

mod support;

use std::sync::Arc;
use std::time::Duration;

use mani_common::auth::{SessionFlow, SingleFlightSession};
use mani_common::testing::{MockCredentialStore, MockSessionFlow};
use mani_infra::api::{
    ApiError, ApiResponse, MediaFile, MultipartPayload, RequestDescriptor,
};
use serde_json::{json, Value};
use support::{authorizations, client_for, header_value, Harness};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn valid_credential_passes_through_without_refresh() {
    let harness = Harness::start(MockCredentialStore::valid("live"), |flow| flow).await;

    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(header("Authorization", "Bearer live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "title": "Vespers" }])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response: ApiResponse<Value> = harness.client.get("/api/events").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.data[0]["title"], "Vespers");
    assert_eq!(harness.session.refresh_calls(), 0);
    assert_eq!(harness.session.logout_calls(), 0);
}

#[tokio::test]
async fn invalid_credential_is_refreshed_before_send() {
    let harness =
        Harness::start(MockCredentialStore::invalid("stale"), |flow| flow.then_refresh_to("fresh"))
            .await;

    Mock::given(method("GET"))
        .and(path("/api/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 3 })))
        .mount(&harness.server)
        .await;

    let response: ApiResponse<Value> = harness.client.get("/api/members").await.unwrap();

    assert_eq!(response.data["count"], 3);
    assert_eq!(harness.session.refresh_calls(), 1);

    let received = harness.received().await;
    assert_eq!(authorizations(&received), vec![Some("Bearer fresh".to_string())]);
}

#[tokio::test]
async fn failed_pre_send_refresh_logs_out_and_never_sends() {
    let harness =
        Harness::start(MockCredentialStore::invalid("stale"), |flow| flow.then_fail_refresh())
            .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    let result: Result<ApiResponse<Value>, ApiError> =
        harness.client.post("/api/events", &json!({ "title": "Retreat" })).await;

    assert!(matches!(result, Err(ApiError::Authentication(_))));
    assert_eq!(harness.session.refresh_calls(), 1);
    assert_eq!(harness.session.logout_calls(), 1);
    assert!(harness.store.token().is_none());
    assert!(harness.received().await.is_empty());
}

#[tokio::test]
async fn server_rejection_refreshes_and_retries_once() {
    let harness =
        Harness::start(MockCredentialStore::valid("old"), |flow| flow.then_refresh_to("new")).await;

    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .and(header("Authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .and(header("Authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Admin" })))
        .mount(&harness.server)
        .await;

    let response: ApiResponse<Value> = harness.client.get("/api/profile").await.unwrap();

    assert_eq!(response.data["name"], "Admin");
    assert_eq!(harness.session.refresh_calls(), 1);
    assert_eq!(harness.session.logout_calls(), 0);
    assert_eq!(
        authorizations(&harness.received().await),
        vec![Some("Bearer old".to_string()), Some("Bearer new".to_string())]
    );
}

#[tokio::test]
async fn second_rejection_is_http_error_without_third_attempt() {
    let harness = Harness::start(MockCredentialStore::valid("old"), |flow| {
        flow.then_refresh_to("new").then_refresh_to("newer")
    })
    .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid token" })))
        .mount(&harness.server)
        .await;

    let err = harness.client.get::<Value>("/api/profile").await.unwrap_err();

    assert!(matches!(err, ApiError::Http { status: 401, .. }));
    assert!(err.to_string().contains("Invalid token"));
    assert_eq!(harness.received().await.len(), 2);
    assert_eq!(harness.session.refresh_calls(), 1);
    assert_eq!(harness.session.logout_calls(), 0);
}

#[tokio::test]
async fn rejection_then_failed_refresh_logs_out_once() {
    let harness =
        Harness::start(MockCredentialStore::valid("old"), |flow| flow.then_fail_refresh()).await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;

    let err = harness.client.delete::<()>("/api/events/9").await.unwrap_err();

    assert!(err.is_authentication());
    assert_eq!(harness.received().await.len(), 1);
    assert_eq!(harness.session.refresh_calls(), 1);
    assert_eq!(harness.session.logout_calls(), 1);
}

#[tokio::test]
async fn caller_headers_are_sent_with_auth_header() {
    let harness = Harness::start(MockCredentialStore::valid("live"), |flow| flow).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&harness.server)
        .await;

    let request = RequestDescriptor::put("/api/settings")
        .json(&json!({ "language": "am" }))
        .unwrap()
        .header("Accept-Language", "am");

    let response: ApiResponse<()> = harness.client.execute(request).await.unwrap();
    assert_eq!(response.status, 204);

    let received = harness.received().await;
    assert_eq!(header_value(&received[0], "authorization").as_deref(), Some("Bearer live"));
    assert_eq!(header_value(&received[0], "accept-language").as_deref(), Some("am"));
    assert_eq!(header_value(&received[0], "content-type").as_deref(), Some("application/json"));
}

#[tokio::test]
async fn multipart_upload_keeps_transport_content_type_across_retry() {
    let harness =
        Harness::start(MockCredentialStore::valid("old"), |flow| flow.then_refresh_to("new")).await;

    Mock::given(method("POST"))
        .and(path("/api/upload/media"))
        .and(header("Authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload/media"))
        .and(header("Authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "uploaded": 1 })))
        .mount(&harness.server)
        .await;

    let payload = MultipartPayload::media_files(vec![MediaFile::new(
        "easter.mp4",
        "video/mp4",
        b"video-bytes".to_vec(),
    )])
    .unwrap();
    let request = RequestDescriptor::post("/api/upload/media")
        .multipart(payload)
        .header("Content-Type", "application/json");

    let response: ApiResponse<Value> = harness.client.execute(request).await.unwrap();
    assert_eq!(response.status, 201);

    let received = harness.received().await;
    assert_eq!(received.len(), 2);
    for request in &received {
        let content_type = header_value(request, "content-type").unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="), "{content_type}");

        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains(r#"name="media""#));
        assert!(body.contains("easter.mp4"));
        assert!(body.contains("video-bytes"));
    }
}

#[tokio::test]
async fn upload_media_sends_files_from_disk_and_retries_after_rejection() {
    let harness =
        Harness::start(MockCredentialStore::valid("old"), |flow| flow.then_refresh_to("new")).await;

    Mock::given(method("POST"))
        .and(path("/api/upload/media"))
        .and(header("Authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload/media"))
        .and(header("Authorization", "Bearer new"))
        .and(header("X-Album", "choir"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "uploaded": 2 })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("service.mp4");
    let image = dir.path().join("poster.JPG");
    std::fs::write(&video, b"video-bytes").unwrap();
    std::fs::write(&image, b"image-bytes").unwrap();

    let request = RequestDescriptor::post("/api/upload/media").header("X-Album", "choir");
    let response: ApiResponse<Value> =
        harness.client.upload_media(request, &[video, image]).await.unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.data["uploaded"], 2);
    assert_eq!(harness.session.refresh_calls(), 1);

    let received = harness.received().await;
    assert_eq!(received.len(), 2);
    let body = String::from_utf8_lossy(&received[1].body);
    assert!(body.contains("service.mp4"));
    assert!(body.contains("poster.JPG"));
    assert!(body.contains("image/jpeg"));
}

#[tokio::test]
async fn upload_media_rejects_unsupported_file_before_sending() {
    let harness = Harness::start(MockCredentialStore::valid("live"), |flow| flow).await;

    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, b"plain").unwrap();

    let result: Result<ApiResponse<Value>, ApiError> = harness
        .client
        .upload_media(RequestDescriptor::post("/api/upload/media"), &[notes])
        .await;

    assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    assert!(harness.received().await.is_empty());
    assert_eq!(harness.session.refresh_calls(), 0);
}

#[tokio::test]
async fn server_error_is_surfaced_without_refresh() {
    let harness =
        Harness::start(MockCredentialStore::valid("live"), |flow| flow.then_refresh_to("unused"))
            .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&harness.server)
        .await;

    let err = harness.client.get::<Value>("/api/events").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(matches!(err, ApiError::Http { status: 500, .. }));
    assert_eq!(harness.session.refresh_calls(), 0);
}

#[tokio::test]
async fn forbidden_is_not_treated_as_rejection() {
    let harness =
        Harness::start(MockCredentialStore::valid("live"), |flow| flow.then_refresh_to("unused"))
            .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&harness.server)
        .await;

    let err = harness.client.get::<Value>("/api/admin").await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(harness.session.refresh_calls(), 0);
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = Arc::new(MockCredentialStore::valid("live"));
    let session = Arc::new(MockSessionFlow::new(store.clone()));
    let client = mani_infra::api::ApiClient::builder()
        .config(mani_domain::ApiConfig {
            base_url: format!("http://{}", addr),
            ..Default::default()
        })
        .credential_store(store)
        .session(session.clone())
        .build()
        .unwrap();

    let err = client.get::<Value>("/api/events").await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(session.refresh_calls(), 0);
}

#[tokio::test]
async fn concurrent_calls_refresh_independently_by_default() {
    let harness = Harness::start(MockCredentialStore::invalid("stale"), |flow| {
        flow.then_refresh_to("a").then_refresh_to("b").with_delay(Duration::from_millis(50))
    })
    .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&harness.server)
        .await;

    let (first, second) = tokio::join!(
        harness.client.get::<Value>("/api/events"),
        harness.client.get::<Value>("/api/members"),
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(harness.session.refresh_calls(), 2);
}

#[tokio::test]
async fn single_flight_session_shares_one_refresh() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let store = Arc::new(MockCredentialStore::invalid("stale"));
    let flow = MockSessionFlow::new(store.clone())
        .then_refresh_to("fresh")
        .with_delay(Duration::from_millis(50));
    let session = Arc::new(SingleFlightSession::new(flow));
    let client = client_for(&server, store.clone(), session.clone() as Arc<dyn SessionFlow>);

    let results = futures::future::join_all(
        ["/api/events", "/api/members", "/api/media"].map(|path| client.get::<Value>(path)),
    )
    .await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(session.inner().refresh_calls(), 1);
    assert_eq!(
        authorizations(&server.received_requests().await.unwrap()),
        vec![Some("Bearer fresh".to_string()); 3]
    );
}
