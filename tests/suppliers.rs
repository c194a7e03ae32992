mod common;

use serde_json::json;
use shopadmin::suppliers::{ApplicationStatus, Decision, SupplierApplicationRequest};
use shopadmin::ApiError;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn application(status: &str) -> serde_json::Value {
    json!({
        "id": 5,
        "businessName": "Acme Supply",
        "businessEmail": "ops@acme.io",
        "businessPhone": null,
        "website": "https://acme.io",
        "message": null,
        "status": status,
        "submittedAt": "2024-05-01T10:00:00",
        "reviewedAt": null,
        "reviewedBy": null,
        "adminNote": null
    })
}

#[tokio::test]
async fn test_review_sends_decision_and_note() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/admin/suppliers/applications/5"))
        .and(body_json(json!({"decision": "APPROVE", "adminNote": "Welcome aboard"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(application("APPROVED")))
        .expect(1)
        .mount(&server)
        .await;

    let (state, _) = common::logged_in(&server, "/admin/suppliers", "ADMIN").await;
    let reviewed = state
        .suppliers()
        .review(5, Decision::Approve, Some(" Welcome aboard ".into()))
        .await
        .unwrap();
    assert_eq!(reviewed.status, ApplicationStatus::Approved);
}

#[tokio::test]
async fn test_list_applications_filters_by_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/suppliers/applications"))
        .and(query_param("status", "PENDING"))
        .and(query_param("page", "0"))
        .and(query_param("size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [application("PENDING")],
            "number": 0,
            "size": 20,
            "totalElements": 1,
            "totalPages": 1,
            "first": true,
            "last": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (state, _) = common::logged_in(&server, "/admin/suppliers", "ADMIN").await;
    let page = state
        .suppliers()
        .list_applications(Some(ApplicationStatus::Pending), 0, 20)
        .await
        .unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].business_name, "Acme Supply");
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_apply_validates_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/suppliers/applications"))
        .and(body_json(json!({"businessName": "Acme Supply", "businessEmail": "ops@acme.io"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(application("PENDING")))
        .expect(1)
        .mount(&server)
        .await;

    let (state, _) = common::logged_in(&server, "/supplier", "USER").await;
    let bad = SupplierApplicationRequest {
        business_name: "Acme Supply".into(),
        business_email: "not-an-email".into(),
        ..Default::default()
    };
    assert!(matches!(
        state.suppliers().apply(bad).await,
        Err(ApiError::Validation(_))
    ));

    let good = SupplierApplicationRequest {
        business_name: " Acme Supply ".into(),
        business_email: "ops@acme.io".into(),
        website: Some("  ".into()),
        ..Default::default()
    };
    let created = state.suppliers().apply(good).await.unwrap();
    assert_eq!(created.status, ApplicationStatus::Pending);
}

#[tokio::test]
async fn test_dashboard_and_my_applications() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/suppliers/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "supplier": false,
            "canApply": true,
            "latestStatus": null,
            "applications": [],
            "alerts": [{"severity": "info", "message": "Apply to become a supplier", "createdAt": null}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/suppliers/applications/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([application("REJECTED")])))
        .mount(&server)
        .await;

    let (state, _) = common::logged_in(&server, "/supplier", "USER").await;
    let dash = state.suppliers().dashboard().await.unwrap();
    assert!(dash.can_apply);
    assert!(dash.latest_status.is_none());
    assert_eq!(dash.alerts.len(), 1);

    let mine = state.suppliers().my_applications().await.unwrap();
    assert_eq!(mine[0].status, ApplicationStatus::Rejected);
}

#[tokio::test]
async fn test_admin_users_list_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "fullName": "Alice Admin", "email": "alice@example.com", "roles": ["ROLE_ADMIN"]},
            {"id": 2, "username": "bob", "email": "bob@example.com", "role": "USER"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/users/2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (state, _) = common::logged_in(&server, "/admin/users", "ADMIN").await;
    let users = state.admin_users().list().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].display_name(), "Alice Admin");
    assert_eq!(users[1].role_list(), vec!["USER".to_string()]);

    state.admin_users().delete(2).await.unwrap();
}
