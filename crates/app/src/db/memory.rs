//! In-memory tenant store for tests.
//!
//! Behaves like the `PostgreSQL` stores (composite `(shop, key)` identity,
//! `updated_at` refresh, `None` on zero matched rows) and counts every
//! persistence call so tests can assert that rejected requests never
//! reached storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use poster_studio_core::{ShopDomain, StyleId, VariantId};

use super::{RepositoryError, TenantStore};
use crate::models::{NewStyle, NewVariant, ProductBaseVariant, Style, StylePatch, VariantPatch};

#[derive(Default)]
struct Tables {
    styles: HashMap<(ShopDomain, StyleId), Style>,
    variants: HashMap<(ShopDomain, String), ProductBaseVariant>,
}

/// Thread-safe in-memory store for styles and variants.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persistence calls made through [`TenantStore`].
    #[must_use]
    pub fn persistence_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent persistence call fail.
    pub fn fail_next_calls(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Seed a style directly, bypassing the call counter.
    pub fn put_style(&self, style: Style) {
        self.tables()
            .styles
            .insert((style.shop_id.clone(), style.uuid), style);
    }

    /// Seed a variant directly, bypassing the call counter.
    pub fn put_variant(&self, variant: ProductBaseVariant) {
        self.tables().variants.insert(
            (variant.shop_id.clone(), variant.id.as_str().to_owned()),
            variant,
        );
    }

    /// Look up a style without counting a call.
    #[must_use]
    pub fn style(&self, shop: &ShopDomain, id: StyleId) -> Option<Style> {
        self.tables().styles.get(&(shop.clone(), id)).cloned()
    }

    /// Look up a variant without counting a call.
    #[must_use]
    pub fn variant(&self, shop: &ShopDomain, id: &VariantId) -> Option<ProductBaseVariant> {
        self.tables()
            .variants
            .get(&(shop.clone(), id.as_str().to_owned()))
            .cloned()
    }

    /// Total number of stored variants across all shops.
    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.tables().variants.len()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.tables())
    }
}

#[async_trait]
impl TenantStore<Style> for MemoryStore {
    async fn insert(&self, shop: &ShopDomain, input: NewStyle) -> Result<Style, RepositoryError> {
        let mut tables = self.begin()?;
        let now = Utc::now();
        let style = Style {
            uuid: StyleId::new_v4(),
            shop_id: shop.clone(),
            name: input.name,
            prompt_template: input.prompt_template,
            example_image_url: input.example_image_url.map(String::from),
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        tables
            .styles
            .insert((shop.clone(), style.uuid), style.clone());
        Ok(style)
    }

    async fn update(
        &self,
        shop: &ShopDomain,
        key: &StyleId,
        patch: StylePatch,
    ) -> Result<Option<Style>, RepositoryError> {
        let mut tables = self.begin()?;
        Ok(tables.styles.get_mut(&(shop.clone(), *key)).map(|style| {
            patch.apply_to(style, Utc::now());
            style.clone()
        }))
    }

    async fn delete(
        &self,
        shop: &ShopDomain,
        key: &StyleId,
    ) -> Result<Option<Style>, RepositoryError> {
        let mut tables = self.begin()?;
        Ok(tables.styles.remove(&(shop.clone(), *key)))
    }

    async fn list(&self, shop: &ShopDomain) -> Result<Vec<Style>, RepositoryError> {
        let tables = self.begin()?;
        let mut styles: Vec<Style> = tables
            .styles
            .values()
            .filter(|s| &s.shop_id == shop)
            .cloned()
            .collect();
        styles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(styles)
    }
}

#[async_trait]
impl TenantStore<ProductBaseVariant> for MemoryStore {
    async fn insert(
        &self,
        shop: &ShopDomain,
        input: NewVariant,
    ) -> Result<ProductBaseVariant, RepositoryError> {
        let mut tables = self.begin()?;
        let now = Utc::now();
        let variant = ProductBaseVariant {
            id: VariantId::generate(),
            shop_id: shop.clone(),
            name: input.name,
            width_px: input.width_px,
            height_px: input.height_px,
            price: input.price,
            created_at: now,
            updated_at: now,
        };
        tables.variants.insert(
            (shop.clone(), variant.id.as_str().to_owned()),
            variant.clone(),
        );
        Ok(variant)
    }

    async fn update(
        &self,
        shop: &ShopDomain,
        key: &VariantId,
        patch: VariantPatch,
    ) -> Result<Option<ProductBaseVariant>, RepositoryError> {
        let mut tables = self.begin()?;
        Ok(tables
            .variants
            .get_mut(&(shop.clone(), key.as_str().to_owned()))
            .map(|variant| {
                patch.apply_to(variant, Utc::now());
                variant.clone()
            }))
    }

    async fn delete(
        &self,
        shop: &ShopDomain,
        key: &VariantId,
    ) -> Result<Option<ProductBaseVariant>, RepositoryError> {
        let mut tables = self.begin()?;
        Ok(tables
            .variants
            .remove(&(shop.clone(), key.as_str().to_owned())))
    }

    async fn list(&self, shop: &ShopDomain) -> Result<Vec<ProductBaseVariant>, RepositoryError> {
        let tables = self.begin()?;
        let mut variants: Vec<ProductBaseVariant> = tables
            .variants
            .values()
            .filter(|v| &v.shop_id == shop)
            .cloned()
            .collect();
        variants.sort_by_key(|v| (v.width_px, v.height_px));
        Ok(variants)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::Scoped;
    use poster_studio_core::Price;

    fn shop(s: &str) -> ShopDomain {
        ShopDomain::parse(s).unwrap()
    }

    fn new_variant(name: &str) -> NewVariant {
        NewVariant {
            name: name.to_owned(),
            width_px: 3600,
            height_px: 5400,
            price: Price::parse("24.99").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_scoped_list_only_sees_own_shop() {
        let store = MemoryStore::new();
        let a = shop("a.myshopify.com");
        let b = shop("b.myshopify.com");

        Scoped::<ProductBaseVariant>::new(&store, &a)
            .insert(new_variant("12x18"))
            .await
            .unwrap();
        Scoped::<ProductBaseVariant>::new(&store, &b)
            .insert(new_variant("18x24"))
            .await
            .unwrap();

        let listed = Scoped::<ProductBaseVariant>::new(&store, &a)
            .list()
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "12x18");
        assert_eq!(store.persistence_calls(), 3);
    }

    #[tokio::test]
    async fn test_delete_other_shop_is_none() {
        let store = MemoryStore::new();
        let a = shop("a.myshopify.com");
        let b = shop("b.myshopify.com");

        let created = Scoped::<ProductBaseVariant>::new(&store, &a)
            .insert(new_variant("12x18"))
            .await
            .unwrap();
        let deleted = Scoped::<ProductBaseVariant>::new(&store, &b)
            .delete(&created.id)
            .await
            .unwrap();

        assert!(deleted.is_none());
        assert!(store.variant(&a, &created.id).is_some());
    }

    #[tokio::test]
    async fn test_failing_store_still_counts() {
        let store = MemoryStore::new();
        store.fail_next_calls(true);
        let a = shop("a.myshopify.com");

        let result = Scoped::<Style>::new(&store, &a).list().await;
        assert!(matches!(
            result,
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        ));
        assert_eq!(store.persistence_calls(), 1);
    }
}
