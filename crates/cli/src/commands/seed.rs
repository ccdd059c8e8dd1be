//! Seed a shop with the default style set.
//!
//! Rows are written through the same shop-scoped store the server uses, so
//! seeded styles are indistinguishable from merchant-created ones.

use tracing::{info, warn};

use poster_studio_app::db::{self, PgStyleStore, Scoped};
use poster_studio_app::models::{NewStyle, Style};
use poster_studio_core::ShopDomain;

use super::migrate::database_url;

/// Default styles as `(name, prompt template)`.
const DEFAULT_STYLES: &[(&str, &str)] = &[
    (
        "Watercolor",
        "A soft watercolor portrait of the pet in the photo, loose brush strokes, \
         pastel palette, white paper background",
    ),
    (
        "Pop Art",
        "A bold pop art portrait of the pet in the photo, flat saturated colors, \
         halftone dots, thick black outlines",
    ),
    (
        "Renaissance",
        "A classical Renaissance oil painting of the pet in the photo dressed as \
         nobility, dramatic lighting, ornate background",
    ),
    (
        "Line Art",
        "A minimal single-line drawing of the pet in the photo, black ink on a \
         plain cream background",
    ),
];

/// Insert the default styles for `shop`.
///
/// Skips seeding when the shop already has styles unless `force` is set.
///
/// # Errors
///
/// Returns an error if the shop domain is invalid, environment variables are
/// missing, or a database operation fails.
pub async fn default_styles(shop: &str, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let shop = ShopDomain::parse(shop)?;
    let pool = db::create_pool(&database_url()?).await?;
    info!(shop = %shop, "Connected to database");

    let store = PgStyleStore::new(pool);
    let styles = Scoped::<Style>::new(&store, &shop);

    let existing = styles.list().await?;
    if !existing.is_empty() && !force {
        warn!(
            count = existing.len(),
            "Shop already has styles, skipping (use --force to seed anyway)"
        );
        return Ok(());
    }

    for (name, prompt_template) in DEFAULT_STYLES {
        let style = styles
            .insert(NewStyle {
                name: (*name).to_owned(),
                prompt_template: (*prompt_template).to_owned(),
                example_image_url: None,
                is_active: true,
            })
            .await?;
        info!(id = %style.uuid, name = %style.name, "Style created");
    }

    info!(count = DEFAULT_STYLES.len(), "Seeding complete!");
    Ok(())
}
