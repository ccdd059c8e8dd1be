//! Example image uploads through the full router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

use poster_studio_app::test_support::{TEST_MAX_UPLOAD_BYTES, TestApp};
use poster_studio_integration_tests::{
    SHOP_A, body_json, error_fields, json_request, send,
};

fn png(len: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(len.max(bytes.len()), 0);
    bytes
}

#[tokio::test]
async fn test_upload_stores_under_shop_prefix() {
    let app = TestApp::new();
    let token = app.token_for(SHOP_A);
    let image = format!("data:image/png;base64,{}", STANDARD.encode(png(256)));

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/uploads",
            Some(&token),
            &json!({"image": image, "filename": "My Dog.png"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with(&format!("https://cdn.test/{SHOP_A}/")));
    assert!(url.ends_with("-My_Dog.png"));

    let keys = app.images.keys();
    assert_eq!(keys.len(), 1);
    assert!(keys.iter().all(|k| k.starts_with(SHOP_A)));
}

#[tokio::test]
async fn test_upload_without_session_is_unauthorized() {
    let app = TestApp::new();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/uploads",
            None,
            &json!({"image": STANDARD.encode(png(64)), "filename": "rex.png"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({"success": false, "error": "Unauthorized: missing session token"})
    );
    assert_eq!(app.images.upload_calls(), 0);
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = TestApp::new();
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/uploads",
            Some(&token),
            &json!({"image": STANDARD.encode(png(TEST_MAX_UPLOAD_BYTES + 1)), "filename": "big.png"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_fields(&body_json(response).await), vec!["image"]);
    assert_eq!(app.images.upload_calls(), 0);
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let app = TestApp::new();
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/uploads",
            Some(&token),
            &json!({"image": STANDARD.encode(b"GIF89a not accepted"), "filename": "a.gif"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.images.upload_calls(), 0);
}

#[tokio::test]
async fn test_upload_missing_field_is_bad_request() {
    let app = TestApp::new();
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/uploads",
            Some(&token),
            &json!({"image": STANDARD.encode(png(64))}),
        ),
    )
    .await;

    // Missing required keys fail deserialization, not validation.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        body_json(response).await["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request: ")
    );
    assert_eq!(app.images.upload_calls(), 0);
}
