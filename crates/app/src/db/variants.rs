//! Product base variant repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use poster_studio_core::{Price, ShopDomain, VariantId};

use super::{RepositoryError, TenantEntity, TenantStore};
use crate::models::{NewVariant, ProductBaseVariant, VariantPatch};

impl TenantEntity for ProductBaseVariant {
    type Key = VariantId;
    type Create = NewVariant;
    type Update = VariantPatch;

    const NAME: &'static str = "variant";
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: String,
    shop_id: String,
    name: String,
    width_px: i32,
    height_px: i32,
    price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VariantRow> for ProductBaseVariant {
    type Error = RepositoryError;

    fn try_from(row: VariantRow) -> Result<Self, Self::Error> {
        let id = VariantId::parse(&row.id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid id in product_base_variants: {e}"))
        })?;
        let shop_id = ShopDomain::parse(&row.shop_id).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid shop_id in product_base_variants: {e}"
            ))
        })?;
        if row.price.is_sign_negative() {
            return Err(RepositoryError::DataCorruption(format!(
                "negative price for variant {}",
                row.id
            )));
        }

        Ok(Self {
            id,
            shop_id,
            name: row.name,
            width_px: row.width_px,
            height_px: row.height_px,
            price: Price::from_decimal(row.price),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const RETURNING: &str = "id, shop_id, name, width_px, height_px, price, created_at, updated_at";

/// `PostgreSQL` store for product base variants.
#[derive(Clone)]
pub struct PgVariantStore {
    pool: PgPool,
}

impl PgVariantStore {
    /// Create a new variant store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore<ProductBaseVariant> for PgVariantStore {
    #[instrument(skip(self, input), fields(shop = %shop))]
    async fn insert(
        &self,
        shop: &ShopDomain,
        input: NewVariant,
    ) -> Result<ProductBaseVariant, RepositoryError> {
        let row: VariantRow = sqlx::query_as(&format!(
            r"
            INSERT INTO product_base_variants (id, shop_id, name, width_px, height_px, price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RETURNING}
            "
        ))
        .bind(VariantId::generate())
        .bind(shop)
        .bind(&input.name)
        .bind(input.width_px)
        .bind(input.height_px)
        .bind(input.price.amount())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, "variant"))?;

        row.try_into()
    }

    #[instrument(skip(self, patch), fields(shop = %shop, id = %key))]
    async fn update(
        &self,
        shop: &ShopDomain,
        key: &VariantId,
        patch: VariantPatch,
    ) -> Result<Option<ProductBaseVariant>, RepositoryError> {
        let row: Option<VariantRow> = sqlx::query_as(&format!(
            r"
            UPDATE product_base_variants
            SET name = COALESCE($3, name),
                width_px = COALESCE($4, width_px),
                height_px = COALESCE($5, height_px),
                price = COALESCE($6, price),
                updated_at = NOW()
            WHERE id = $1 AND shop_id = $2
            RETURNING {RETURNING}
            "
        ))
        .bind(key)
        .bind(shop)
        .bind(patch.name)
        .bind(patch.width_px)
        .bind(patch.height_px)
        .bind(patch.price.map(|p| p.amount()))
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self), fields(shop = %shop, id = %key))]
    async fn delete(
        &self,
        shop: &ShopDomain,
        key: &VariantId,
    ) -> Result<Option<ProductBaseVariant>, RepositoryError> {
        let row: Option<VariantRow> = sqlx::query_as(&format!(
            "DELETE FROM product_base_variants WHERE id = $1 AND shop_id = $2 RETURNING {RETURNING}"
        ))
        .bind(key)
        .bind(shop)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self), fields(shop = %shop))]
    async fn list(&self, shop: &ShopDomain) -> Result<Vec<ProductBaseVariant>, RepositoryError> {
        let rows: Vec<VariantRow> = sqlx::query_as(&format!(
            "SELECT {RETURNING} FROM product_base_variants WHERE shop_id = $1 ORDER BY width_px, height_px"
        ))
        .bind(shop)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
