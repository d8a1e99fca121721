mod common;

use axum::http::{Method, StatusCode};
use common::{admin, Part, TestApp};
use serde_json::{json, Value};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-bytes";
const SELLER: (&str, &str) = ("x-user-email", "seller@example.com");

fn listing_fields<'a>() -> Vec<Part<'a>> {
    vec![
        Part::Text("name", "Blue Sapphire"),
        Part::Text("category", "sapphire"),
        Part::Text("weight", "2.4"),
        Part::Text("certificateDetails", "GIA 2211"),
        Part::Text("minimumBid", "150000"),
        Part::Text("color", "Cornflower blue"),
    ]
}

fn image<'a>(file_name: &'a str) -> Part<'a> {
    Part::File {
        name: "images",
        file_name,
        content_type: "image/png",
        data: PNG,
    }
}

async fn list_gem(app: &TestApp, category: &str) -> Value {
    let mut parts = listing_fields();
    parts[1] = Part::Text("category", category);
    parts.push(image("front.png"));
    let (status, body) = app.send_multipart("/gemstone", &[SELLER], &parts).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["gemstone"].clone()
}

#[tokio::test]
async fn create_stores_images_under_uploads() {
    let app = TestApp::spawn().await;

    let mut parts = listing_fields();
    parts.push(image("front.png"));
    parts.push(image("side.png"));
    let (status, body) = app.send_multipart("/gemstone", &[SELLER], &parts).await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let gem = &body["gemstone"];
    assert_eq!(gem["sellerEmail"], "seller@example.com");
    assert_eq!(gem["isAuctioned"], false);
    assert_eq!(gem["weight"], 2.4);

    let images = gem["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    for url in images {
        let url = url.as_str().unwrap();
        assert!(url.starts_with("/uploads/gemstones/"), "{}", url);
        assert!(url.ends_with(".png"));

        let response = app.get_raw(url).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
    }

    let (_, fetched) = app
        .get(&format!("/gemstone/{}", gem["id"].as_str().unwrap()), &[])
        .await;
    assert_eq!(fetched["gemstone"]["images"], gem["images"]);
}

#[tokio::test]
async fn create_requires_identity_and_valid_fields() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .send_multipart("/gemstone", &[], &listing_fields())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut parts = listing_fields();
    parts[2] = Part::Text("weight", "-1");
    let (status, _) = app.send_multipart("/gemstone", &[SELLER], &parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut parts = listing_fields();
    parts.remove(3);
    let (status, body) = app.send_multipart("/gemstone", &[SELLER], &parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("certificateDetails"));

    let mut parts = listing_fields();
    parts.push(Part::File {
        name: "images",
        file_name: "notes.txt",
        content_type: "text/plain",
        data: b"not an image",
    });
    let (status, _) = app.send_multipart("/gemstone", &[SELLER], &parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = app.get("/gemstone", &[]).await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn admin_can_list_without_email() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send_multipart("/gemstone", &admin(), &listing_fields())
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["gemstone"]["sellerEmail"], Value::Null);
    assert_eq!(body["gemstone"]["images"], json!([]));
}

#[tokio::test]
async fn listing_filters_by_category_and_auction_flag() {
    let app = TestApp::spawn().await;
    let ruby = list_gem(&app, "ruby").await;
    list_gem(&app, "sapphire").await;

    let (_, body) = app.get("/gemstone?category=ruby", &[]).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["gemstones"][0]["id"], ruby["id"]);

    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/auctions",
            &admin(),
            json!({
                "gemstoneId": ruby["id"],
                "startTime": "2020-01-01T00:00:00Z",
                "endTime": "2099-01-01T00:00:00Z"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, auctioned) = app.get("/gemstone/auctioned", &[]).await;
    assert_eq!(auctioned["count"], 1);
    assert_eq!(auctioned["gemstones"][0]["id"], ruby["id"]);

    let (_, not_auctioned) = app.get("/gemstone?isAuctioned=false", &[]).await;
    assert_eq!(not_auctioned["count"], 1);
    assert_eq!(not_auctioned["gemstones"][0]["category"], "sapphire");
}

#[tokio::test]
async fn update_normalizes_images_and_checks_ownership() {
    let app = TestApp::spawn().await;
    let gem = list_gem(&app, "sapphire").await;
    let uri = format!("/gemstone/{}", gem["id"].as_str().unwrap());
    let stored = gem["images"][0].as_str().unwrap().to_string();

    let (status, _) = app
        .send_json(
            Method::PUT,
            &uri,
            &[("x-user-email", "intruder@example.com")],
            json!({ "name": "Mine now" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let windows_path = format!(".{}", stored.replace('/', "\\"));
    let (status, body) = app
        .send_json(
            Method::PUT,
            &uri,
            &[SELLER],
            json!({
                "minimumBid": 175000,
                "images": [windows_path, "https://cdn.example.com/extra.jpg"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["gemstone"]["minimumBid"], 175000.0);
    assert_eq!(
        body["gemstone"]["images"],
        json!([stored, "https://cdn.example.com/extra.jpg"])
    );

    let (status, _) = app
        .send_json(Method::PUT, &uri, &[SELLER], json!({ "weight": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dropping_an_image_removes_the_stored_file() {
    let app = TestApp::spawn().await;
    let gem = list_gem(&app, "sapphire").await;
    let stored = gem["images"][0].as_str().unwrap().to_string();

    let (status, _) = app
        .send_json(
            Method::PUT,
            &format!("/gemstone/{}", gem["id"].as_str().unwrap()),
            &admin(),
            json!({ "images": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let response = app.get_raw(&stored).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_blocked_by_an_open_auction() {
    let app = TestApp::spawn().await;
    let gem = list_gem(&app, "sapphire").await;
    let gem_id = gem["id"].as_str().unwrap();
    let uri = format!("/gemstone/{}", gem_id);

    let (_, auction) = app
        .send_json(
            Method::POST,
            "/api/auctions",
            &admin(),
            json!({
                "gemstoneId": gem_id,
                "startTime": "2020-01-01T00:00:00Z",
                "endTime": "2099-01-01T00:00:00Z"
            }),
        )
        .await;

    let (status, _) = app
        .delete(&uri, &[("x-user-email", "intruder@example.com")])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&uri, &[SELLER]).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let close_uri = format!("/api/auctions/{}/close", auction["auction"]["id"].as_str().unwrap());
    let (status, _) = app
        .send_json(Method::POST, &close_uri, &admin(), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.delete(&uri, &[SELLER]).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&uri, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let response = app.get_raw(gem["images"][0].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (_, auctions) = app.get("/api/auctions", &[]).await;
    assert_eq!(auctions["count"], 0);
}

#[tokio::test]
async fn deleting_a_gem_removes_its_ended_auctions_and_bids() {
    let app = TestApp::spawn().await;
    let gem = list_gem(&app, "ruby").await;
    let gem_id = gem["id"].as_str().unwrap();

    let (_, auction) = app
        .send_json(
            Method::POST,
            "/api/auctions",
            &admin(),
            json!({
                "gemstoneId": gem_id,
                "startTime": "2020-01-01T00:00:00Z",
                "endTime": "2099-01-01T00:00:00Z"
            }),
        )
        .await;
    let auction_id = auction["auction"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send_json(
            Method::POST,
            &format!("/api/auctions/{}/bids", auction_id),
            &[("x-user-email", "buyer@example.com")],
            json!({ "amount": 160000 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .send_json(
            Method::POST,
            &format!("/api/auctions/{}/close", auction_id),
            &admin(),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.delete(&format!("/gemstone/{}", gem_id), &admin()).await;
    assert_eq!(status, StatusCode::OK);

    let (_, auctions) = app.get("/api/auctions", &[]).await;
    assert_eq!(auctions["count"], 0);
    let (status, _) = app
        .get(&format!("/api/auctions/{}/bids", auction_id), &[])
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let remaining_bids = app
        .state
        .repos
        .bids
        .find(gem_market_service::services::Filter::new())
        .await
        .unwrap();
    assert!(remaining_bids.is_empty());
}

#[tokio::test]
async fn sellers_cannot_adopt_or_remove_files_they_do_not_own() {
    let app = TestApp::spawn().await;
    let victim = list_gem(&app, "sapphire").await;
    let victim_image = victim["images"][0].as_str().unwrap().to_string();

    let mut parts = listing_fields();
    parts.push(image("other.png"));
    let (status, body) = app
        .send_multipart("/gemstone", &[("x-user-email", "rival@example.com")], &parts)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let rival_uri = format!("/gemstone/{}", body["gemstone"]["id"].as_str().unwrap());
    let rival_image = body["gemstone"]["images"][0].clone();

    for foreign in [victim_image.as_str(), "uploads\\payments\\slip.pdf"] {
        let (status, _) = app
            .send_json(
                Method::PUT,
                &rival_uri,
                &[("x-user-email", "rival@example.com")],
                json!({ "images": [rival_image.clone(), foreign] }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", foreign);
    }

    let (status, _) = app
        .send_json(
            Method::PUT,
            &rival_uri,
            &[("x-user-email", "rival@example.com")],
            json!({ "images": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .delete(&rival_uri, &[("x-user-email", "rival@example.com")])
        .await;
    assert_eq!(status, StatusCode::OK);

    let response = app.get_raw(&victim_image).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_paths_cannot_escape_the_storage_root() {
    let app = TestApp::spawn().await;

    for uri in [
        "/uploads/gemstones/..%2F..%2Fsecret.txt",
        "/uploads/..%2Fpayments%2Fslip.pdf",
    ] {
        let (status, body) = app.get(uri, &[]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn malformed_auction_filter_uses_error_envelope() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/gemstone?isAuctioned=maybe", &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}
