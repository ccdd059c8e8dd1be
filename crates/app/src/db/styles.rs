//! Style repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use poster_studio_core::{Patch, ShopDomain, StyleId};

use super::{RepositoryError, TenantEntity, TenantStore};
use crate::models::{NewStyle, Style, StylePatch};

impl TenantEntity for Style {
    type Key = StyleId;
    type Create = NewStyle;
    type Update = StylePatch;

    const NAME: &'static str = "style";
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct StyleRow {
    uuid: Uuid,
    shop_id: String,
    name: String,
    prompt_template: String,
    example_image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StyleRow> for Style {
    type Error = RepositoryError;

    fn try_from(row: StyleRow) -> Result<Self, Self::Error> {
        let shop_id = ShopDomain::parse(&row.shop_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid shop_id in styles: {e}"))
        })?;

        Ok(Self {
            uuid: StyleId::new(row.uuid),
            shop_id,
            name: row.name,
            prompt_template: row.prompt_template,
            example_image_url: row.example_image_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const RETURNING: &str =
    "uuid, shop_id, name, prompt_template, example_image_url, is_active, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` store for styles.
#[derive(Clone)]
pub struct PgStyleStore {
    pool: PgPool,
}

impl PgStyleStore {
    /// Create a new style store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore<Style> for PgStyleStore {
    #[instrument(skip(self, input), fields(shop = %shop))]
    async fn insert(&self, shop: &ShopDomain, input: NewStyle) -> Result<Style, RepositoryError> {
        let row: StyleRow = sqlx::query_as(&format!(
            r"
            INSERT INTO styles (uuid, shop_id, name, prompt_template, example_image_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RETURNING}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(shop)
        .bind(&input.name)
        .bind(&input.prompt_template)
        .bind(input.example_image_url.as_ref().map(url::Url::as_str))
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, "style"))?;

        row.try_into()
    }

    #[instrument(skip(self, patch), fields(shop = %shop, uuid = %key))]
    async fn update(
        &self,
        shop: &ShopDomain,
        key: &StyleId,
        patch: StylePatch,
    ) -> Result<Option<Style>, RepositoryError> {
        let touch_image = !patch.example_image_url.is_keep();
        let image = match patch.example_image_url {
            Patch::Set(url) => Some(url.to_string()),
            Patch::Keep | Patch::Clear => None,
        };

        let row: Option<StyleRow> = sqlx::query_as(&format!(
            r"
            UPDATE styles
            SET name = COALESCE($3, name),
                prompt_template = COALESCE($4, prompt_template),
                example_image_url = CASE WHEN $5 THEN $6 ELSE example_image_url END,
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE uuid = $1 AND shop_id = $2
            RETURNING {RETURNING}
            "
        ))
        .bind(key)
        .bind(shop)
        .bind(patch.name)
        .bind(patch.prompt_template)
        .bind(touch_image)
        .bind(image)
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self), fields(shop = %shop, uuid = %key))]
    async fn delete(
        &self,
        shop: &ShopDomain,
        key: &StyleId,
    ) -> Result<Option<Style>, RepositoryError> {
        let row: Option<StyleRow> = sqlx::query_as(&format!(
            "DELETE FROM styles WHERE uuid = $1 AND shop_id = $2 RETURNING {RETURNING}"
        ))
        .bind(key)
        .bind(shop)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self), fields(shop = %shop))]
    async fn list(&self, shop: &ShopDomain) -> Result<Vec<Style>, RepositoryError> {
        let rows: Vec<StyleRow> = sqlx::query_as(&format!(
            "SELECT {RETURNING} FROM styles WHERE shop_id = $1 ORDER BY created_at DESC"
        ))
        .bind(shop)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
