mod common;

use axum::http::{Method, StatusCode};
use common::{admin, TestApp};
use serde_json::json;

async fn create_ticket(app: &TestApp, inquiry_type: &str) -> String {
    let (status, body) = app
        .send_json(
            Method::POST,
            "/api/tickets",
            &[],
            json!({
                "name": "Kasun",
                "email": "kasun@example.com",
                "subject": "Deposit not reflected",
                "inquiryType": inquiry_type,
                "description": "I paid the deposit yesterday."
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["ticket"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn support_routes_require_admin() {
    let app = TestApp::spawn().await;
    let id = create_ticket(&app, "payment").await;

    let (status, _) = app
        .get("/api/support/tickets", &[("x-user-email", "kasun@example.com")])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send_json(
            Method::POST,
            &format!("/api/support/tickets/{}/response", id),
            &[("x-admin-secret", "wrong-secret")],
            json!({ "message": "hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_bearer_token_is_unauthorized() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .get("/api/support/tickets", &[("authorization", "Bearer not-a-jwt")])
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn list_filters_by_status_and_inquiry_type() {
    let app = TestApp::spawn().await;
    let payment_ticket = create_ticket(&app, "payment").await;
    create_ticket(&app, "bidding").await;

    app.send_json(
        Method::PATCH,
        &format!("/api/support/tickets/{}/status", payment_ticket),
        &admin(),
        json!({ "status": "resolved" }),
    )
    .await;

    let (_, by_type) = app
        .get("/api/support/tickets?inquiryType=bidding", &admin())
        .await;
    assert_eq!(by_type["count"], 1);

    let (_, resolved) = app
        .get("/api/support/tickets?status=resolved", &admin())
        .await;
    assert_eq!(resolved["count"], 1);
    assert_eq!(resolved["tickets"][0]["id"], payment_ticket.as_str());

    let (status, _) = app
        .get("/api/support/tickets?status=bogus", &admin())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bogus_status_is_rejected() {
    let app = TestApp::spawn().await;
    let id = create_ticket(&app, "general").await;

    let (status, body) = app
        .send_json(
            Method::PATCH,
            &format!("/api/support/tickets/{}/status", id),
            &admin(),
            json!({ "status": "bogus" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, ticket) = app
        .get(&format!("/api/support/tickets/{}", id), &admin())
        .await;
    assert_eq!(ticket["ticket"]["status"], "open");
}

#[tokio::test]
async fn posting_and_editing_response_keeps_a_single_reply() {
    let app = TestApp::spawn().await;
    let id = create_ticket(&app, "account").await;
    let uri = format!("/api/support/tickets/{}/response", id);

    let (status, body) = app
        .send_json(Method::POST, &uri, &admin(), json!({ "message": "Looking into it" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["status"], "in_progress");

    let (status, _) = app
        .send_json(Method::PUT, &uri, &admin(), json!({ "message": "Fixed your account" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send_json(Method::PUT, &uri, &admin(), json!({ "message": "Fixed, please retry" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let responses = body["ticket"]["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["message"], "Fixed, please retry");

    let (status, body) = app
        .send_json(Method::POST, &uri, &admin(), json!({ "message": "Overwritten" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["responses"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn editing_missing_response_is_not_found() {
    let app = TestApp::spawn().await;
    let id = create_ticket(&app, "technical").await;
    let uri = format!("/api/support/tickets/{}/response", id);

    let (status, _) = app
        .send_json(Method::PUT, &uri, &admin(), json!({ "message": "Nothing to edit" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send_json(Method::POST, &uri, &admin(), json!({ "message": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_response_and_ticket() {
    let app = TestApp::spawn().await;
    let id = create_ticket(&app, "other").await;
    let response_uri = format!("/api/support/tickets/{}/response", id);

    app.send_json(Method::POST, &response_uri, &admin(), json!({ "message": "Hello" }))
        .await;

    let (status, body) = app.delete(&response_uri, &admin()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["responses"], json!([]));

    let ticket_uri = format!("/api/support/tickets/{}", id);
    let (status, _) = app.delete(&ticket_uri, &admin()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&ticket_uri, &admin()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
