//! Integration tests for Poster Studio.
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests (in-memory stores, no services needed)
//! cargo test -p poster-studio-integration-tests
//!
//! # Include the PostgreSQL tests
//! TEST_DATABASE_URL=postgres://localhost/poster_studio_test \
//!     cargo test -p poster-studio-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `styles` - Style form posts and listing
//! - `variants` - Variant JSON API
//! - `uploads` - Example image uploads
//! - `postgres` - Tenant isolation against a real database

use axum::body::Body;
use axum::http::{Request, Response, header};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use url::form_urlencoded;

use poster_studio_app::models::{ProductBaseVariant, Style};
use poster_studio_app::test_support::TestApp;
use poster_studio_core::{Price, ShopDomain, StyleId, VariantId};

pub const SHOP_A: &str = "shop-a.myshopify.com";
pub const SHOP_B: &str = "shop-b.myshopify.com";

/// Parse a fixture shop domain.
///
/// # Panics
///
/// Panics if `shop` is not a valid shop domain.
#[must_use]
pub fn shop(shop: &str) -> ShopDomain {
    ShopDomain::parse(shop).expect("fixture shop domain")
}

/// A stored style fixture.
///
/// # Panics
///
/// Panics if `shop` or `uuid` is invalid.
#[must_use]
pub fn style(shop_domain: &str, uuid: &str, name: &str) -> Style {
    let now = Utc::now();
    Style {
        uuid: StyleId::parse(uuid).expect("fixture style id"),
        shop_id: shop(shop_domain),
        name: name.to_owned(),
        prompt_template: format!("A {name} portrait of the pet"),
        example_image_url: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// A stored variant fixture.
///
/// # Panics
///
/// Panics if `shop` or `id` is invalid.
#[must_use]
pub fn variant(shop_domain: &str, id: &str, name: &str) -> ProductBaseVariant {
    let now = Utc::now();
    ProductBaseVariant {
        id: VariantId::parse(id).expect("fixture variant id"),
        shop_id: shop(shop_domain),
        name: name.to_owned(),
        width_px: 2400,
        height_px: 3600,
        price: Price::parse("29.99").expect("fixture price"),
        created_at: now,
        updated_at: now,
    }
}

/// Build a JSON request, optionally with a bearer session token.
///
/// # Panics
///
/// Panics if the request cannot be built.
#[must_use]
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Build a bodiless request, optionally with a bearer session token.
///
/// # Panics
///
/// Panics if the request cannot be built.
#[must_use]
pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("valid request")
}

/// Build a form post the way the embedded styles page submits it: the
/// session token rides in the `id_token` query parameter.
///
/// # Panics
///
/// Panics if the request cannot be built.
#[must_use]
pub fn form_request(path: &str, token: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
    let uri = match token {
        Some(token) => {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("id_token", token)
                .finish();
            format!("{path}?{query}")
        }
        None => path.to_owned(),
    };
    let body = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("valid request")
}

/// Send a request through a fresh router for `app`.
///
/// # Panics
///
/// Panics if the router fails (it is infallible).
pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router().oneshot(request).await.expect("infallible")
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// Read a response body as text.
///
/// # Panics
///
/// Panics if the body is not UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("UTF-8 body")
}

/// The `Location` header of a redirect.
///
/// # Panics
///
/// Panics if there is no `Location` header.
#[must_use]
pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .expect("ASCII Location")
        .to_owned()
}

/// Field names reported in a 422 body.
#[must_use]
pub fn error_fields(body: &Value) -> Vec<String> {
    body["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f["field"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
