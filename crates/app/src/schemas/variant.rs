//! Product base variant JSON schema.

use serde::Deserialize;

use poster_studio_core::{Scalar, ValidationError, VariantId, Validator};

use crate::models::{NewVariant, VariantPatch};

/// Maximum variant name length.
pub const MAX_NAME_LENGTH: usize = 100;

/// Raw variant body. Dimensions may arrive as JSON numbers or strings;
/// `price` must be a decimal string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantBody {
    pub name: Option<String>,
    pub width_px: Option<Scalar>,
    pub height_px: Option<Scalar>,
    pub price: Option<Scalar>,
}

impl VariantBody {
    /// Validate a create request; every field is required.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming every failing field.
    pub fn validate_new(&self) -> Result<NewVariant, ValidationError> {
        let width = self.width_px.as_ref().map(Scalar::to_text);
        let height = self.height_px.as_ref().map(Scalar::to_text);

        let mut v = Validator::new();
        let name = v.text("name", self.name.as_deref(), MAX_NAME_LENGTH);
        let width_px = v.int_at_least("widthPx", width.as_deref(), 1);
        let height_px = v.int_at_least("heightPx", height.as_deref(), 1);
        let price = price_text(&mut v, self.price.as_ref()).and_then(|p| v.price("price", p));

        match (name, width_px, height_px, price) {
            (Some(name), Some(width_px), Some(height_px), Some(price)) => Ok(NewVariant {
                name,
                width_px,
                height_px,
                price,
            }),
            _ => Err(v.into_error()),
        }
    }

    /// Validate a partial update; absent fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming every present field that fails.
    pub fn validate_patch(&self) -> Result<VariantPatch, ValidationError> {
        let width = self.width_px.as_ref().map(Scalar::to_text);
        let height = self.height_px.as_ref().map(Scalar::to_text);

        let mut v = Validator::new();
        let name = v.optional_text("name", self.name.as_deref(), MAX_NAME_LENGTH);
        let width_px = v.optional_int_at_least("widthPx", width.as_deref(), 1);
        let height_px = v.optional_int_at_least("heightPx", height.as_deref(), 1);
        let price = price_text(&mut v, self.price.as_ref())
            .and_then(|p| v.optional_price("price", p));

        match (name, width_px, height_px, price) {
            (Some(name), Some(width_px), Some(height_px), Some(price)) => Ok(VariantPatch {
                name,
                width_px,
                height_px,
                price,
            }),
            _ => Err(v.into_error()),
        }
    }
}

/// The submitted price text. A JSON number has already been rounded
/// through `f64`, so it is recorded as an error and `None` is returned.
fn price_text<'a>(v: &mut Validator, price: Option<&'a Scalar>) -> Option<Option<&'a str>> {
    match price {
        None => Some(None),
        Some(Scalar::Text(text)) => Some(Some(text.as_str())),
        Some(_) => {
            v.push("price", "must be a decimal string such as \"19.99\"");
            None
        }
    }
}

/// Validate a variant id taken from the request path.
///
/// # Errors
///
/// Returns a `ValidationError` on field `id`.
pub fn variant_key(raw: &str) -> Result<VariantId, ValidationError> {
    VariantId::parse(raw).map_err(|e| ValidationError::single("id", e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use poster_studio_core::Price;

    fn body(json: &str) -> VariantBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_new_variant_accepts_numbers_and_strings() {
        let variant = body(r#"{"name":"12x18","widthPx":3600,"heightPx":"5400","price":"24.99"}"#)
            .validate_new()
            .unwrap();

        assert_eq!(variant.width_px, 3600);
        assert_eq!(variant.height_px, 5400);
        assert_eq!(variant.price, Price::parse("24.99").unwrap());
    }

    #[test]
    fn test_new_variant_collects_errors() {
        let err = body(r#"{"widthPx":0,"heightPx":-2,"price":"12.345"}"#)
            .validate_new()
            .unwrap_err();

        assert!(err.has_field("name"));
        assert!(err.has_field("widthPx"));
        assert!(err.has_field("heightPx"));
        assert!(err.has_field("price"));
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = body(r#"{"name":"A4","widthPx":1,"heightPx":1,"price":"-1.00"}"#)
            .validate_new()
            .unwrap_err();
        assert!(err.has_field("price"));
        assert_eq!(err.errors().len(), 1);
    }

    #[test]
    fn test_numeric_price_rejected() {
        let err = body(r#"{"name":"A4","widthPx":1,"heightPx":1,"price":19.999999999999999}"#)
            .validate_new()
            .unwrap_err();
        assert!(err.has_field("price"));
        assert_eq!(err.errors().len(), 1);

        let err = body(r#"{"name":"A4","widthPx":1,"heightPx":1,"price":20}"#)
            .validate_new()
            .unwrap_err();
        assert!(err.has_field("price"));

        let err = body(r#"{"price":19.99}"#).validate_patch().unwrap_err();
        assert!(err.has_field("price"));
    }

    #[test]
    fn test_missing_price_required_on_create_only() {
        let err = body(r#"{"name":"A4","widthPx":1,"heightPx":1}"#)
            .validate_new()
            .unwrap_err();
        assert_eq!(err.errors()[0].message, "is required");
        assert!(body(r#"{"name":"A4"}"#).validate_patch().is_ok());
    }

    #[test]
    fn test_fractional_dimension_rejected() {
        let err = body(r#"{"name":"A4","widthPx":12.5,"heightPx":1,"price":"1"}"#)
            .validate_new()
            .unwrap_err();
        assert!(err.has_field("widthPx"));
    }

    #[test]
    fn test_patch_all_optional() {
        let patch = body("{}").validate_patch().unwrap();
        assert_eq!(patch, VariantPatch::default());

        let patch = body(r#"{"price":"30"}"#).validate_patch().unwrap();
        assert_eq!(patch.price, Some(Price::parse("30").unwrap()));
        assert_eq!(patch.name, None);
    }

    #[test]
    fn test_patch_keeps_constraints() {
        let err = body(r#"{"name":"","heightPx":0}"#)
            .validate_patch()
            .unwrap_err();
        assert!(err.has_field("name"));
        assert!(err.has_field("heightPx"));
    }

    #[test]
    fn test_variant_key() {
        assert!(variant_key("v1").is_ok());
        assert!(variant_key("").unwrap_err().has_field("id"));
        assert!(variant_key("v1;drop").unwrap_err().has_field("id"));
    }
}
