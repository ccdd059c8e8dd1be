//! Style management through the full router.
//!
//! Form posts carry `_action` and redirect back to the listing; every check
//! here also asserts what reached the store.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use poster_studio_app::test_support::TestApp;
use poster_studio_core::StyleId;
use poster_studio_integration_tests::{
    SHOP_A, SHOP_B, body_json, body_text, empty_request, error_fields, form_request, location,
    send, shop, style,
};

const SHARED_UUID: &str = "11111111-1111-1111-1111-111111111111";

fn listing_for(token: &str) -> String {
    format!("/app/styles?id_token={token}")
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_style_redirects_to_listing() {
    let app = TestApp::new();
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        form_request(
            "/app/styles",
            Some(&token),
            &[
                ("_action", "create"),
                ("name", "Watercolor"),
                ("promptTemplate", "A watercolor portrait of the pet"),
                ("isActive", "true"),
            ],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), listing_for(&token));
    assert_eq!(app.store.persistence_calls(), 1);

    let listed = body_json(send(&app, empty_request("GET", "/api/styles", Some(&token))).await).await;
    assert_eq!(listed["styles"][0]["name"], "Watercolor");
    assert_eq!(listed["styles"][0]["shopId"], SHOP_A);
}

#[tokio::test]
async fn test_create_style_invalid_never_reaches_store() {
    let app = TestApp::new();
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        form_request(
            "/app/styles",
            Some(&token),
            &[
                ("_action", "create"),
                ("name", ""),
                ("exampleImageUrl", "ftp://example.com/a.png"),
            ],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Validation failed");
    let fields = error_fields(&body);
    assert!(fields.contains(&"name".to_owned()));
    assert!(fields.contains(&"promptTemplate".to_owned()));
    assert!(fields.contains(&"exampleImageUrl".to_owned()));
    assert_eq!(app.store.persistence_calls(), 0);
}

#[tokio::test]
async fn test_unknown_action_rejected() {
    let app = TestApp::new();
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        form_request("/app/styles", Some(&token), &[("_action", "archive")]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_fields(&body_json(response).await), vec!["_action"]);
    assert_eq!(app.store.persistence_calls(), 0);
}

#[tokio::test]
async fn test_valid_form_without_session_is_unauthorized() {
    let app = TestApp::new();

    let response = send(
        &app,
        form_request(
            "/app/styles",
            None,
            &[
                ("_action", "create"),
                ("name", "Watercolor"),
                ("promptTemplate", "A watercolor portrait"),
            ],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Unauthorized: missing session token");
    assert_eq!(app.store.persistence_calls(), 0);
}

#[tokio::test]
async fn test_forged_token_is_unauthorized() {
    let app = TestApp::new();
    let token = app.token_for(SHOP_A);
    let forged = format!("{}AAAA", token.trim_end_matches(|c| c != '.'));

    let response = send(
        &app,
        form_request(
            "/app/styles",
            Some(&forged),
            &[("_action", "delete"), ("id", SHARED_UUID)],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.persistence_calls(), 0);
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_touches_only_the_callers_shop() {
    let app = TestApp::new();
    let mut stale = style(SHOP_A, SHARED_UUID, "Classic");
    stale.updated_at -= chrono::Duration::hours(1);
    let before = stale.updated_at;
    app.store.put_style(stale);
    app.store.put_style(style(SHOP_B, SHARED_UUID, "Classic"));
    let token = app.token_for(SHOP_A);

    let id = StyleId::parse(SHARED_UUID).unwrap();

    let response = send(
        &app,
        form_request(
            "/app/styles",
            Some(&token),
            &[
                ("_action", "update"),
                ("id", SHARED_UUID),
                ("name", "Vivid"),
                ("promptTemplate", "x"),
                ("isActive", "true"),
            ],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), listing_for(&token));

    let updated = app.store.style(&shop(SHOP_A), id).unwrap();
    assert_eq!(updated.name, "Vivid");
    assert_eq!(updated.prompt_template, "x");
    assert!(updated.is_active);
    assert!(updated.updated_at > before);

    let untouched = app.store.style(&shop(SHOP_B), id).unwrap();
    assert_eq!(untouched.name, "Classic");
    assert_eq!(untouched.prompt_template, "A Classic portrait of the pet");
}

#[tokio::test]
async fn test_update_is_idempotent() {
    let app = TestApp::new();
    app.store.put_style(style(SHOP_A, SHARED_UUID, "Classic"));
    let token = app.token_for(SHOP_A);
    let fields = [
        ("_action", "update"),
        ("id", SHARED_UUID),
        ("name", "Vivid"),
        ("isActive", "false"),
    ];

    let first = send(&app, form_request("/app/styles", Some(&token), &fields)).await;
    let id = StyleId::parse(SHARED_UUID).unwrap();
    let after_first = app.store.style(&shop(SHOP_A), id).unwrap();

    let second = send(&app, form_request("/app/styles", Some(&token), &fields)).await;
    let after_second = app.store.style(&shop(SHOP_A), id).unwrap();

    assert_eq!(first.status(), StatusCode::SEE_OTHER);
    assert_eq!(second.status(), StatusCode::SEE_OTHER);
    assert_eq!(after_first.name, after_second.name);
    assert_eq!(after_first.is_active, after_second.is_active);
    assert!(!after_second.is_active);
    assert_eq!(after_second.prompt_template, "A Classic portrait of the pet");
}

#[tokio::test]
async fn test_update_other_shops_style_reports_not_found() {
    let app = TestApp::new();
    app.store.put_style(style(SHOP_B, SHARED_UUID, "Classic"));
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        form_request(
            "/app/styles",
            Some(&token),
            &[("_action", "update"), ("id", SHARED_UUID), ("name", "Vivid")],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("{}&error=not_found", listing_for(&token))
    );
    let id = StyleId::parse(SHARED_UUID).unwrap();
    assert_eq!(app.store.style(&shop(SHOP_B), id).unwrap().name, "Classic");
}

#[tokio::test]
async fn test_update_clears_example_image_with_empty_value() {
    let app = TestApp::new();
    let mut existing = style(SHOP_A, SHARED_UUID, "Classic");
    existing.example_image_url = Some("https://cdn.test/a.png".to_owned());
    app.store.put_style(existing);
    let token = app.token_for(SHOP_A);

    send(
        &app,
        form_request(
            "/app/styles",
            Some(&token),
            &[
                ("_action", "update"),
                ("id", SHARED_UUID),
                ("exampleImageUrl", ""),
            ],
        ),
    )
    .await;

    let id = StyleId::parse(SHARED_UUID).unwrap();
    let updated = app.store.style(&shop(SHOP_A), id).unwrap();
    assert_eq!(updated.example_image_url, None);
    assert_eq!(updated.name, "Classic");
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_is_tenant_scoped() {
    let app = TestApp::new();
    app.store.put_style(style(SHOP_B, SHARED_UUID, "Classic"));
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        form_request(
            "/app/styles",
            Some(&token),
            &[("_action", "delete"), ("id", SHARED_UUID)],
        ),
    )
    .await;

    // Zero matched rows still lands on the listing.
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), listing_for(&token));
    let id = StyleId::parse(SHARED_UUID).unwrap();
    assert!(app.store.style(&shop(SHOP_B), id).is_some());
}

#[tokio::test]
async fn test_delete_own_style() {
    let app = TestApp::new();
    app.store.put_style(style(SHOP_A, SHARED_UUID, "Classic"));
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        form_request(
            "/app/styles",
            Some(&token),
            &[("_action", "delete"), ("id", SHARED_UUID)],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let id = StyleId::parse(SHARED_UUID).unwrap();
    assert!(app.store.style(&shop(SHOP_A), id).is_none());
}

#[tokio::test]
async fn test_delete_requires_uuid() {
    let app = TestApp::new();
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        form_request(
            "/app/styles",
            Some(&token),
            &[("_action", "delete"), ("id", "not-a-uuid")],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_fields(&body_json(response).await), vec!["id"]);
    assert_eq!(app.store.persistence_calls(), 0);
}

#[tokio::test]
async fn test_persistence_failure_is_generic() {
    let app = TestApp::new();
    app.store.fail_next_calls(true);
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        form_request(
            "/app/styles",
            Some(&token),
            &[
                ("_action", "create"),
                ("name", "Watercolor"),
                ("promptTemplate", "A watercolor portrait"),
            ],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Something went wrong. Please try again.");
    assert_eq!(app.store.persistence_calls(), 1);
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_styles_page_lists_only_own_styles() {
    let app = TestApp::new();
    app.store.put_style(style(SHOP_A, SHARED_UUID, "Watercolor"));
    app.store.put_style(style(
        SHOP_B,
        "22222222-2222-4222-8222-222222222222",
        "Neon",
    ));
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        empty_request("GET", &format!("/app/styles?id_token={token}"), None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Watercolor"));
    assert!(!html.contains("Neon"));
}

#[tokio::test]
async fn test_styles_page_refreshes_token_through_app_bridge() {
    let app = TestApp::new();
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        empty_request("GET", &format!("/app/styles?id_token={token}"), None),
    )
    .await;

    let html = body_text(response).await;
    assert!(html.contains(r#"<meta name="shopify-api-key" content="test-api-key">"#));
    assert!(html.contains("app-bridge.js"));
    assert!(html.contains("shopify.idToken()"));
    assert!(html.contains("data-session-form"));
}

#[tokio::test]
async fn test_styles_page_shows_not_found_banner() {
    let app = TestApp::new();
    let token = app.token_for(SHOP_A);

    let response = send(
        &app,
        empty_request(
            "GET",
            &format!("/app/styles?id_token={token}&error=not_found"),
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("That item no longer exists."));
}

#[tokio::test]
async fn test_styles_page_requires_session() {
    let app = TestApp::new();

    let response = send(&app, empty_request("GET", "/app/styles", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_fallback() {
    let app = TestApp::new();

    let health = send(&app, empty_request("GET", "/health", None)).await;
    assert_eq!(health.status(), StatusCode::OK);
    assert!(health.headers().contains_key("x-request-id"));

    let ready = send(&app, empty_request("GET", "/health/ready", None)).await;
    assert_eq!(ready.status(), StatusCode::OK);

    let missing = send(&app, empty_request("GET", "/app/nowhere", None)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await["error"], "Not found: /app/nowhere");
}
