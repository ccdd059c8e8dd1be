//! Poster style models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use poster_studio_core::{Patch, ShopDomain, StyleId};

/// An art style merchants offer for pet posters.
///
/// `prompt_template` is the text handed to the image generator; the
/// optional example image is shown to shoppers when picking a style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub uuid: StyleId,
    pub shop_id: ShopDomain,
    pub name: String,
    pub prompt_template: String,
    pub example_image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStyle {
    pub name: String,
    pub prompt_template: String,
    pub example_image_url: Option<Url>,
    pub is_active: bool,
}

/// Validated partial update for a style. `None` leaves the column untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StylePatch {
    pub name: Option<String>,
    pub prompt_template: Option<String>,
    pub example_image_url: Patch<Url>,
    pub is_active: Option<bool>,
}

impl StylePatch {
    /// Apply the patch to an in-memory style, refreshing `updated_at`.
    pub fn apply_to(self, style: &mut Style, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            style.name = name;
        }
        if let Some(prompt_template) = self.prompt_template {
            style.prompt_template = prompt_template;
        }
        style.example_image_url = self
            .example_image_url
            .map(String::from)
            .apply(style.example_image_url.take());
        if let Some(is_active) = self.is_active {
            style.is_active = is_active;
        }
        style.updated_at = now;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Style {
        let now = Utc::now();
        Style {
            uuid: StyleId::new_v4(),
            shop_id: ShopDomain::parse("a.myshopify.com").unwrap(),
            name: "Watercolor".to_owned(),
            prompt_template: "a watercolor painting of {pet}".to_owned(),
            example_image_url: Some("https://cdn.example.com/w.png".to_owned()),
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_apply_patch_sets_and_keeps() {
        let mut style = sample();
        let later = style.updated_at + chrono::Duration::seconds(5);
        StylePatch {
            name: Some("Vivid".to_owned()),
            is_active: Some(true),
            ..StylePatch::default()
        }
        .apply_to(&mut style, later);

        assert_eq!(style.name, "Vivid");
        assert!(style.is_active);
        assert_eq!(style.prompt_template, "a watercolor painting of {pet}");
        assert!(style.example_image_url.is_some());
        assert_eq!(style.updated_at, later);
    }

    #[test]
    fn test_apply_patch_clears_image() {
        let mut style = sample();
        StylePatch {
            example_image_url: Patch::Clear,
            ..StylePatch::default()
        }
        .apply_to(&mut style, Utc::now());
        assert_eq!(style.example_image_url, None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("promptTemplate").is_some());
        assert!(json.get("exampleImageUrl").is_some());
        assert_eq!(json["shopId"], "a.myshopify.com");
    }
}
