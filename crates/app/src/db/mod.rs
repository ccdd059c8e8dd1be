//! Database operations for the app `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `styles` - Poster art styles, keyed by `(shop_id, uuid)`
//! - `product_base_variants` - Poster sizes and prices, keyed by `(shop_id, id)`
//!
//! Every table carries the owning shop's domain in `shop_id`. Storage is
//! reached through [`TenantStore`], whose every method takes the shop, and
//! handlers only ever hold a [`Scoped`] view that has the shop bound in.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/app/migrations/` and run via:
//! ```bash
//! cargo run -p poster-studio-cli -- migrate
//! ```

pub mod styles;
pub mod variants;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use poster_studio_core::ShopDomain;

pub use styles::PgStyleStore;
pub use variants::PgVariantStore;

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate key within a shop).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn on_unique_violation(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// An entity owned by a shop.
pub trait TenantEntity: Send + Sync + 'static {
    /// Natural key, unique within one shop.
    type Key: Send + Sync + fmt::Display;
    /// Validated creation input.
    type Create: Send;
    /// Validated partial update.
    type Update: Send;

    /// Human-readable entity name for logs and messages.
    const NAME: &'static str;
}

/// Persistence for one tenant-owned entity type.
///
/// Every operation is a single statement filtered by the shop; update and
/// delete additionally filter by the natural key and return `None` when no
/// row matched.
#[async_trait]
pub trait TenantStore<E: TenantEntity>: Send + Sync {
    /// Insert a new row for `shop`.
    async fn insert(&self, shop: &ShopDomain, input: E::Create) -> Result<E, RepositoryError>;

    /// Update the row `(shop, key)`, returning it after the update.
    async fn update(
        &self,
        shop: &ShopDomain,
        key: &E::Key,
        patch: E::Update,
    ) -> Result<Option<E>, RepositoryError>;

    /// Delete the row `(shop, key)`, returning the deleted row.
    async fn delete(&self, shop: &ShopDomain, key: &E::Key) -> Result<Option<E>, RepositoryError>;

    /// List all rows owned by `shop`.
    async fn list(&self, shop: &ShopDomain) -> Result<Vec<E>, RepositoryError>;
}

/// A store with the tenant bound in.
///
/// This is the only handle mutation code receives, so a query without the
/// shop filter cannot be expressed from a handler.
pub struct Scoped<'a, E: TenantEntity> {
    store: &'a dyn TenantStore<E>,
    shop: &'a ShopDomain,
}

impl<'a, E: TenantEntity> Scoped<'a, E> {
    /// Bind `store` to `shop`.
    #[must_use]
    pub fn new(store: &'a dyn TenantStore<E>, shop: &'a ShopDomain) -> Self {
        Self { store, shop }
    }

    /// The shop this view is bound to.
    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        self.shop
    }

    /// Insert a row owned by the bound shop.
    ///
    /// # Errors
    ///
    /// Returns the store's `RepositoryError` unchanged.
    pub async fn insert(&self, input: E::Create) -> Result<E, RepositoryError> {
        tracing::debug!(entity = E::NAME, shop = %self.shop, "insert");
        self.store.insert(self.shop, input).await
    }

    /// Update one row of the bound shop.
    ///
    /// # Errors
    ///
    /// Returns the store's `RepositoryError` unchanged.
    pub async fn update(&self, key: &E::Key, patch: E::Update) -> Result<Option<E>, RepositoryError> {
        tracing::debug!(entity = E::NAME, shop = %self.shop, key = %key, "update");
        self.store.update(self.shop, key, patch).await
    }

    /// Delete one row of the bound shop.
    ///
    /// # Errors
    ///
    /// Returns the store's `RepositoryError` unchanged.
    pub async fn delete(&self, key: &E::Key) -> Result<Option<E>, RepositoryError> {
        tracing::debug!(entity = E::NAME, shop = %self.shop, key = %key, "delete");
        self.store.delete(self.shop, key).await
    }

    /// List the bound shop's rows.
    ///
    /// # Errors
    ///
    /// Returns the store's `RepositoryError` unchanged.
    pub async fn list(&self) -> Result<Vec<E>, RepositoryError> {
        self.store.list(self.shop).await
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
