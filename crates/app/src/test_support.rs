//! Helpers for router-level tests: in-memory stores and signed session tokens.

use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use secrecy::SecretString;

use crate::auth::SessionTokenVerifier;
use crate::db::MemoryStore;
use crate::state::{AppState, Services};
use crate::storage::MemoryImageStore;

/// API key the test verifier expects as `aud`.
pub const TEST_API_KEY: &str = "test-api-key";
/// API secret test tokens are signed with.
pub const TEST_API_SECRET: &str = "3f9a1c7e5b2d8f4a6c0e9b7d1f3a5c8e";
/// Upload limit used by [`TestApp`].
pub const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;

/// An app wired to in-memory stores.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub images: Arc<MemoryImageStore>,
    pub verifier: SessionTokenVerifier,
}

impl TestApp {
    /// Build a fresh app with empty stores.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let images = Arc::new(MemoryImageStore::new());
        let verifier = SessionTokenVerifier::new(
            TEST_API_KEY.to_owned(),
            SecretString::from(TEST_API_SECRET),
        );

        let state = AppState::new(
            Services {
                verifier: verifier.clone(),
                styles: store.clone(),
                variants: store.clone(),
                images: images.clone(),
                max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
            },
            None,
        );

        Self {
            state,
            store,
            images,
            verifier,
        }
    }

    /// The full router.
    #[must_use]
    pub fn router(&self) -> Router {
        crate::app(self.state.clone())
    }

    /// A valid session token for `shop`.
    ///
    /// # Panics
    ///
    /// Panics if the claims cannot be signed.
    #[must_use]
    pub fn token_for(&self, shop: &str) -> String {
        let claims = self.verifier.claims_for(shop, Utc::now().timestamp());
        self.verifier
            .sign(&claims)
            .expect("test claims always serialize")
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
