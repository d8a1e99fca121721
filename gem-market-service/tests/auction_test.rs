mod common;

use axum::http::{Method, StatusCode};
use common::{admin, Part, TestApp};
use serde_json::{json, Value};

const LIVE_FROM: &str = "2020-01-01T00:00:00Z";
const LIVE_UNTIL: &str = "2099-01-01T00:00:00Z";

async fn list_gem(app: &TestApp) -> String {
    let parts = [
        Part::Text("name", "Padparadscha"),
        Part::Text("category", "sapphire"),
        Part::Text("weight", "1.8"),
        Part::Text("certificateDetails", "NGJA 9921"),
        Part::Text("minimumBid", "1000"),
    ];
    let (status, body) = app.send_multipart("/gemstone", &admin(), &parts).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["gemstone"]["id"].as_str().unwrap().to_string()
}

async fn schedule(app: &TestApp, body: Value) -> (StatusCode, Value) {
    app.send_json(Method::POST, "/api/auctions", &admin(), body)
        .await
}

async fn live_auction(app: &TestApp) -> (String, String) {
    let gem_id = list_gem(app).await;
    let (status, body) = schedule(
        app,
        json!({ "gemstoneId": gem_id, "startTime": LIVE_FROM, "endTime": LIVE_UNTIL }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (body["auction"]["id"].as_str().unwrap().to_string(), gem_id)
}

async fn bid(app: &TestApp, auction_id: &str, email: &str, amount: f64) -> (StatusCode, Value) {
    app.send_json(
        Method::POST,
        &format!("/api/auctions/{}/bids", auction_id),
        &[("x-user-email", email)],
        json!({ "amount": amount }),
    )
    .await
}

#[tokio::test]
async fn scheduling_marks_gem_as_auctioned() {
    let app = TestApp::spawn().await;
    let gem_id = list_gem(&app).await;

    let (status, body) = schedule(
        &app,
        json!({ "gemstoneId": gem_id, "startTime": LIVE_FROM, "endTime": LIVE_UNTIL }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["auction"]["startingBid"], 1000.0);
    assert_eq!(body["auction"]["gemstoneName"], "Padparadscha");
    assert_eq!(body["auction"]["state"], "live");

    let (_, gem) = app.get(&format!("/gemstone/{}", gem_id), &[]).await;
    assert_eq!(gem["gemstone"]["isAuctioned"], true);

    let (status, _) = schedule(
        &app,
        json!({ "gemstoneId": gem_id, "startTime": LIVE_FROM, "endTime": LIVE_UNTIL }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn scheduling_is_validated() {
    let app = TestApp::spawn().await;
    let gem_id = list_gem(&app).await;

    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/auctions",
            &[("x-user-email", "buyer@example.com")],
            json!({ "gemstoneId": gem_id, "startTime": LIVE_FROM, "endTime": LIVE_UNTIL }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = schedule(
        &app,
        json!({ "gemstoneId": gem_id, "startTime": LIVE_UNTIL, "endTime": LIVE_FROM }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = schedule(
        &app,
        json!({ "gemstoneId": "missing", "startTime": LIVE_FROM, "endTime": LIVE_UNTIL }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = schedule(
        &app,
        json!({
            "gemstoneId": gem_id,
            "startTime": LIVE_FROM,
            "endTime": LIVE_UNTIL,
            "startingBid": -5
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bids_must_rise_and_need_an_email() {
    let app = TestApp::spawn().await;
    let (auction_id, _) = live_auction(&app).await;

    let (status, _) = app
        .send_json(
            Method::POST,
            &format!("/api/auctions/{}/bids", auction_id),
            &[],
            json!({ "amount": 5000 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = bid(&app, &auction_id, "amal@example.com", 999.0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = bid(&app, &auction_id, "amal@example.com", 1200.0).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["auction"]["currentBid"], 1200.0);
    assert_eq!(body["auction"]["highestBidder"], "amal@example.com");

    let (status, _) = bid(&app, &auction_id, "nimal@example.com", 1200.0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = bid(&app, &auction_id, "Nimal@Example.com", 1500.0).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, bids) = app
        .get(&format!("/api/auctions/{}/bids", auction_id), &[])
        .await;
    assert_eq!(bids["count"], 2);
    assert_eq!(bids["bids"][0]["amount"], 1500.0);
    assert_eq!(bids["bids"][0]["bidderEmail"], "nimal@example.com");
    assert_eq!(bids["bids"][1]["amount"], 1200.0);

    let (_, auction) = app
        .get(&format!("/api/auctions/{}", auction_id), &[])
        .await;
    assert_eq!(auction["auction"]["bidCount"], 2);
}

#[tokio::test]
async fn upcoming_and_closed_auctions_reject_bids() {
    let app = TestApp::spawn().await;
    let gem_id = list_gem(&app).await;
    let (_, upcoming) = schedule(
        &app,
        json!({ "gemstoneId": gem_id, "startTime": "2098-01-01T00:00:00Z", "endTime": LIVE_UNTIL }),
    )
    .await;
    let upcoming_id = upcoming["auction"]["id"].as_str().unwrap();
    assert_eq!(upcoming["auction"]["state"], "upcoming");

    let (status, _) = bid(&app, upcoming_id, "amal@example.com", 5000.0).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (live_id, _) = live_auction(&app).await;
    bid(&app, &live_id, "amal@example.com", 2000.0).await;

    let close_uri = format!("/api/auctions/{}/close", live_id);
    let (status, body) = app
        .send_json(Method::POST, &close_uri, &admin(), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auction"]["state"], "ended");
    assert_eq!(body["auction"]["winnerEmail"], "amal@example.com");

    let (status, _) = bid(&app, &live_id, "nimal@example.com", 9000.0).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send_json(Method::POST, &close_uri, &admin(), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, ended) = app.get("/api/auctions?state=ended", &[]).await;
    assert_eq!(ended["count"], 1);
    let (_, pending) = app.get("/api/auctions?state=upcoming", &[]).await;
    assert_eq!(pending["count"], 1);
    let (status, _) = app.get("/api/auctions?state=paused", &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_an_auction_releases_the_gem() {
    let app = TestApp::spawn().await;
    let (auction_id, gem_id) = live_auction(&app).await;
    bid(&app, &auction_id, "amal@example.com", 1500.0).await;

    let uri = format!("/api/auctions/{}", auction_id);
    let (status, _) = app
        .delete(&uri, &[("x-user-email", "amal@example.com")])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&uri, &admin()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&uri, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("{}/bids", uri), &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, gem) = app.get(&format!("/gemstone/{}", gem_id), &[]).await;
    assert_eq!(gem["gemstone"]["isAuctioned"], false);

    let (status, _) = schedule(
        &app,
        json!({ "gemstoneId": gem_id, "startTime": LIVE_FROM, "endTime": LIVE_UNTIL }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
