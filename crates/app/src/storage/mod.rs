//! Object storage for uploaded example images.
//!
//! Objects are written with a plain HTTP `PUT` to
//! `{endpoint}/{shop}/{uuid}-{filename}` and served from the same path
//! under the public base URL. Keys always start with the shop domain.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use poster_studio_core::ShopDomain;

use crate::config::UploadConfig;
use crate::schemas::ImageUpload;

/// Errors that can occur when storing an image.
#[derive(Debug, Error)]
pub enum UploadError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage answered with a non-success status.
    #[error("storage rejected upload with status {status}")]
    Rejected { status: u16 },

    /// The object key could not be turned into a URL.
    #[error("invalid object key: {0}")]
    InvalidKey(String),
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Public URL of the object.
    pub url: String,
}

/// Stores images for a shop.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload one image under the shop's prefix.
    async fn upload(
        &self,
        shop: &ShopDomain,
        image: &ImageUpload,
    ) -> Result<StoredImage, UploadError>;
}

/// Object key for an upload: `{shop}/{uuid}-{filename}`.
fn object_key(shop: &ShopDomain, filename: &str) -> String {
    format!("{shop}/{}-{filename}", Uuid::new_v4())
}

/// Join a key onto a base URL, keeping the base path.
fn join_key(base: &Url, key: &str) -> Result<Url, UploadError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(key)
        .map_err(|e| UploadError::InvalidKey(format!("{key}: {e}")))
}

/// Object storage client speaking plain HTTP `PUT`.
#[derive(Clone)]
pub struct HttpImageStore {
    inner: Arc<HttpImageStoreInner>,
}

struct HttpImageStoreInner {
    client: reqwest::Client,
    endpoint: Url,
    public_url: Url,
}

impl HttpImageStore {
    /// Create a new storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &UploadConfig) -> Result<Self, UploadError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| UploadError::InvalidKey(format!("invalid upload token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpImageStoreInner {
                client,
                endpoint: config.endpoint.clone(),
                public_url: config.public_url.clone(),
            }),
        })
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    #[instrument(skip(self, image), fields(shop = %shop, bytes = image.bytes.len()))]
    async fn upload(
        &self,
        shop: &ShopDomain,
        image: &ImageUpload,
    ) -> Result<StoredImage, UploadError> {
        let key = object_key(shop, &image.filename);
        let target = join_key(&self.inner.endpoint, &key)?;
        let public = join_key(&self.inner.public_url, &key)?;

        let response = self
            .inner
            .client
            .put(target)
            .header(CONTENT_TYPE, image.image_type.mime())
            .body(image.bytes.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::info!(key = %key, "Image uploaded");
        Ok(StoredImage {
            url: public.to_string(),
        })
    }
}

/// In-memory image store for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct MemoryImageStore {
    objects: std::sync::Mutex<Vec<(String, usize)>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-support"))]
impl MemoryImageStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of upload calls.
    #[must_use]
    pub fn upload_calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Stored object keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(
        &self,
        shop: &ShopDomain,
        image: &ImageUpload,
    ) -> Result<StoredImage, UploadError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let key = object_key(shop, &image.filename);
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((key.clone(), image.bytes.len()));
        Ok(StoredImage {
            url: format!("https://cdn.test/{key}"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_is_shop_prefixed() {
        let shop = ShopDomain::parse("a.myshopify.com").unwrap();
        let key = object_key(&shop, "rex.png");
        assert!(key.starts_with("a.myshopify.com/"));
        assert!(key.ends_with("-rex.png"));
    }

    #[test]
    fn test_join_key_keeps_base_path() {
        let base = Url::parse("https://storage.local/bucket").unwrap();
        let url = join_key(&base, "a.myshopify.com/x-rex.png").unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.local/bucket/a.myshopify.com/x-rex.png"
        );

        let base = Url::parse("https://cdn.local/").unwrap();
        let url = join_key(&base, "a.myshopify.com/x-rex.png").unwrap();
        assert_eq!(url.as_str(), "https://cdn.local/a.myshopify.com/x-rex.png");
    }
}
