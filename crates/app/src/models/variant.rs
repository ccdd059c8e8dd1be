//! Product base variant models (poster sizes and their prices).

use chrono::{DateTime, Utc};
use serde::Serialize;

use poster_studio_core::{Price, ShopDomain, VariantId};

/// A printable poster size offered by a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBaseVariant {
    pub id: VariantId,
    pub shop_id: ShopDomain,
    pub name: String,
    pub width_px: i32,
    pub height_px: i32,
    pub price: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVariant {
    pub name: String,
    pub width_px: i32,
    pub height_px: i32,
    pub price: Price,
}

/// Validated partial update for a variant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariantPatch {
    pub name: Option<String>,
    pub width_px: Option<i32>,
    pub height_px: Option<i32>,
    pub price: Option<Price>,
}

impl VariantPatch {
    /// Apply the patch to an in-memory variant, refreshing `updated_at`.
    pub fn apply_to(self, variant: &mut ProductBaseVariant, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            variant.name = name;
        }
        if let Some(width_px) = self.width_px {
            variant.width_px = width_px;
        }
        if let Some(height_px) = self.height_px {
            variant.height_px = height_px;
        }
        if let Some(price) = self.price {
            variant.price = price;
        }
        variant.updated_at = now;
    }
}
