mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::json;
use shopadmin::batch::{BatchPoller, BatchService, JobStatus, PollOutcome, UploadPhase};
use shopadmin::{ApiError, ClientConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn job(status: &str) -> serde_json::Value {
    json!({
        "jobExecutionId": 42,
        "status": status,
        "startTime": "2024-06-01T12:00:00",
        "endTime": null,
        "totalRecords": null,
        "successCount": null,
        "failureCount": null,
        "skipCount": null,
        "errors": [],
        "message": null
    })
}

async fn status_queries(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/products/batch/status/42")
        .count()
}

async fn mount_upload(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/products/batch/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("STARTED")))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_upload_polls_until_completed() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/products/batch/status/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("STARTED")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products/batch/status/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobExecutionId": 42,
            "status": "COMPLETED",
            "totalRecords": 3,
            "successCount": 3,
            "failureCount": 0,
            "skipCount": 0,
            "errors": []
        })))
        .mount(&server)
        .await;

    let (state, _) = common::logged_in(&server, "/products/batch", "ADMIN").await;
    let mut upload = state.batch_upload();
    assert!(upload.select_file("items.csv", Bytes::from_static(b"name,price\nA,1\n")));
    upload.upload().await;
    assert!(upload.error().is_none());
    assert!(upload.is_uploading());

    let settled = tokio::time::timeout(Duration::from_secs(5), upload.wait())
        .await
        .unwrap()
        .unwrap();
    assert!(!settled.polling);
    assert_eq!(upload.phase(), UploadPhase::Completed);
    assert!(!upload.is_uploading());
    let done = upload.status().unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.success_count, Some(3));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(status_queries(&server).await, 3);
}

#[tokio::test]
async fn test_status_failure_stops_polling() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/products/batch/status/42"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .mount(&server)
        .await;

    let (state, _) = common::logged_in(&server, "/products/batch", "ADMIN").await;
    let mut upload = state.batch_upload();
    upload.select_file("items.csv", Bytes::from_static(b"a"));
    upload.upload().await;
    tokio::time::timeout(Duration::from_secs(5), upload.wait())
        .await
        .unwrap();

    assert_eq!(upload.phase(), UploadPhase::Idle);
    assert!(!upload.is_uploading());
    // the initial record from the upload is what remains
    assert_eq!(upload.status().unwrap().status, JobStatus::Started);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(status_queries(&server).await, 1);
}

#[tokio::test]
async fn test_network_error_ends_poll_with_transport_error() {
    // nothing listens on port 9
    let mut cfg = ClientConfig::for_base_url("http://127.0.0.1:9");
    cfg.timeout = Duration::from_secs(2);
    let server = MockServer::start().await;
    let (state, _) = common::logged_in(&server, "/products/batch", "ADMIN").await;
    let api = shopadmin::http::ApiClient::new(&cfg, state.session.clone(), state.navigator.clone()).unwrap();
    let service = Arc::new(BatchService::new(api, cfg.batch.max_upload_bytes));

    let handle = BatchPoller::new(service, Duration::from_millis(50)).spawn(42, None);
    let settled = tokio::time::timeout(Duration::from_secs(5), handle.settled())
        .await
        .unwrap();
    assert!(!settled.polling);
    assert!(settled.job.is_none());
    match handle.outcome().await {
        PollOutcome::TransportError(ApiError::Http(_)) => {}
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upload_rejection_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products/batch/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "File is empty"})))
        .mount(&server)
        .await;

    let (state, _) = common::logged_in(&server, "/products/batch", "ADMIN").await;
    let mut upload = state.batch_upload();
    upload.select_file("items.csv", Bytes::new());
    upload.upload().await;
    assert_eq!(upload.phase(), UploadPhase::Idle);
    assert_eq!(upload.error(), Some("File is empty"));
    assert_eq!(status_queries(&server).await, 0);
}

#[tokio::test]
async fn test_reset_cancels_polling() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/products/batch/status/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("STARTED")))
        .mount(&server)
        .await;

    let (state, _) = common::logged_in(&server, "/products/batch", "ADMIN").await;
    let mut upload = state.batch_upload();
    upload.select_file("items.csv", Bytes::from_static(b"a"));
    upload.upload().await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    upload.reset();
    assert_eq!(upload.phase(), UploadPhase::Idle);

    // let an in-flight query land, then make sure nothing follows it
    tokio::time::sleep(Duration::from_millis(100)).await;
    let after_reset = status_queries(&server).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(status_queries(&server).await, after_reset);
}

#[tokio::test]
async fn test_template_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/batch/template"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/csv")
                .set_body_bytes(b"name,description,price,stockQuantity\n".to_vec()),
        )
        .mount(&server)
        .await;

    let (state, _) = common::logged_in(&server, "/products/batch", "ADMIN").await;
    let bytes = state.batch().template().await.unwrap();
    assert!(bytes.starts_with(b"name,"));
}
