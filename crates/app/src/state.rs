//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use poster_studio_core::ShopDomain;

use crate::auth::SessionTokenVerifier;
use crate::config::AppConfig;
use crate::db::{PgStyleStore, PgVariantStore, Scoped, TenantStore};
use crate::models::{ProductBaseVariant, Style};
use crate::storage::{HttpImageStore, ImageStore, UploadError};

/// The collaborators a request may reach.
pub struct Services {
    pub verifier: SessionTokenVerifier,
    pub styles: Arc<dyn TenantStore<Style>>,
    pub variants: Arc<dyn TenantStore<ProductBaseVariant>>,
    pub images: Arc<dyn ImageStore>,
    pub max_upload_bytes: usize,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Stores are not exposed
/// directly; handlers reach them through [`AppState::scope`], which binds
/// the tenant.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    services: Services,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// `pool` is used for readiness checks only; pass `None` when the stores
    /// are not database-backed.
    #[must_use]
    pub fn new(services: Services, pool: Option<PgPool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { services, pool }),
        }
    }

    /// Build the production state: `PostgreSQL` stores and HTTP object storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the object storage client cannot be built.
    pub fn from_config(config: &AppConfig, pool: PgPool) -> Result<Self, UploadError> {
        let services = Services {
            verifier: SessionTokenVerifier::new(
                config.shopify.api_key.clone(),
                config.shopify.api_secret.clone(),
            ),
            styles: Arc::new(PgStyleStore::new(pool.clone())),
            variants: Arc::new(PgVariantStore::new(pool.clone())),
            images: Arc::new(HttpImageStore::new(&config.upload)?),
            max_upload_bytes: config.upload.max_bytes,
        };
        Ok(Self::new(services, Some(pool)))
    }

    /// Get the session token verifier.
    #[must_use]
    pub fn verifier(&self) -> &SessionTokenVerifier {
        &self.inner.services.verifier
    }

    /// Get the database pool, if the stores are database-backed.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Maximum decoded upload size in bytes.
    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.inner.services.max_upload_bytes
    }

    /// Bind the stores to a resolved tenant.
    #[must_use]
    pub fn scope(&self, shop: ShopDomain) -> TenantScope {
        TenantScope {
            state: self.clone(),
            shop,
        }
    }
}

/// The stores of one tenant.
///
/// Created only from a resolved [`ShopDomain`], and every accessor returns a
/// view with that shop bound in.
pub struct TenantScope {
    state: AppState,
    shop: ShopDomain,
}

impl TenantScope {
    /// The tenant this scope is bound to.
    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        &self.shop
    }

    /// Styles of this tenant.
    #[must_use]
    pub fn styles(&self) -> Scoped<'_, Style> {
        Scoped::new(self.state.inner.services.styles.as_ref(), &self.shop)
    }

    /// Product base variants of this tenant.
    #[must_use]
    pub fn variants(&self) -> Scoped<'_, ProductBaseVariant> {
        Scoped::new(self.state.inner.services.variants.as_ref(), &self.shop)
    }

    /// Image storage, paired with this tenant.
    #[must_use]
    pub fn images(&self) -> ScopedImages<'_> {
        ScopedImages {
            store: self.state.inner.services.images.as_ref(),
            shop: &self.shop,
        }
    }
}

/// Image storage with the tenant bound in.
pub struct ScopedImages<'a> {
    store: &'a dyn ImageStore,
    shop: &'a ShopDomain,
}

impl ScopedImages<'_> {
    /// Upload an image under the tenant's prefix.
    ///
    /// # Errors
    ///
    /// Returns the store's `UploadError` unchanged.
    pub async fn upload(
        &self,
        image: &crate::schemas::ImageUpload,
    ) -> Result<crate::storage::StoredImage, UploadError> {
        self.store.upload(self.shop, image).await
    }
}
