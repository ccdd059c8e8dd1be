//! Field validators for untrusted input.
//!
//! Input schemas in the app are written as a raw `serde` struct (every field
//! optional, no constraints) plus a `validate` function that runs each field
//! through a [`Validator`]. The validator records *every* failing field
//! before the schema gives up, so a rejected form can report all of its
//! problems at once.
//!
//! Each validator method returns `Option<T>`: `None` means the field failed
//! and an error was recorded. Optional fields return `Option<Option<T>>`
//! (outer `None` = invalid, inner `None` = absent), which lets a schema build
//! its typed value with a single `match` over all fields:
//!
//! ```
//! use poster_studio_core::{Validator, ValidationError};
//!
//! #[derive(Debug)]
//! struct Rename {
//!     name: String,
//!     width: i32,
//! }
//!
//! fn validate(name: Option<&str>, width: Option<&str>) -> Result<Rename, ValidationError> {
//!     let mut v = Validator::new();
//!     let name = v.text("name", name, 100);
//!     let width = v.int_at_least("width", width, 1);
//!
//!     match (name, width) {
//!         (Some(name), Some(width)) => Ok(Rename { name, width }),
//!         _ => Err(v.into_error()),
//!     }
//! }
//!
//! assert!(validate(Some("Vivid"), Some("12")).is_ok());
//! assert_eq!(validate(Some(""), Some("0")).unwrap_err().errors().len(), 2);
//! ```

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::types::Price;

/// Maximum accepted URL length.
const MAX_URL_LENGTH: usize = 2048;

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as it appears in the submitted payload.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

/// Input failed schema validation.
///
/// Carries one [`FieldError`] per offending field, in the order the schema
/// checked them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid input: {}", summarize(.errors))]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Build an error for a single field.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    /// The failing fields.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Consume the error and return the failing fields.
    #[must_use]
    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// Append the failures of another error (e.g. path and body checked separately).
    pub fn extend(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }

    /// Whether the given field is among the failures.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Three-way update for nullable columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Field absent from the payload - leave the column as is.
    #[default]
    Keep,
    /// Field present but empty - set the column to NULL.
    Clear,
    /// Field present with a value.
    Set(T),
}

impl<T> Patch<T> {
    /// Whether this patch touches the column at all.
    #[must_use]
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Map the value of a `Set` patch.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Keep => Patch::Keep,
            Self::Clear => Patch::Clear,
            Self::Set(value) => Patch::Set(f(value)),
        }
    }

    /// Apply the patch to a current value.
    #[must_use]
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(value) => Some(value),
        }
    }
}

/// A scalar from a JSON body that may arrive as a number, boolean or string.
///
/// Form posts always produce strings, JSON clients usually send numbers;
/// validators work on the textual form so both go through the same checks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON boolean.
    Bool(bool),
    /// JSON integer.
    Int(i64),
    /// JSON float.
    Float(f64),
    /// JSON string.
    Text(String),
}

impl Scalar {
    /// Textual form of the scalar.
    #[must_use]
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Self::Bool(b) => Cow::Owned(b.to_string()),
            Self::Int(i) => Cow::Owned(i.to_string()),
            Self::Float(f) => Cow::Owned(f.to_string()),
            Self::Text(s) => Cow::Borrowed(s),
        }
    }
}

/// Collects field errors while a schema checks its input.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    /// Create an empty validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_owned(),
            message: message.into(),
        });
    }

    /// Record the error of a failed parse, passing successes through.
    pub fn check<T, E: fmt::Display>(&mut self, field: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(field, e.to_string());
                None
            }
        }
    }

    /// Whether no errors have been recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish validation.
    ///
    /// # Errors
    ///
    /// Returns the collected [`ValidationError`] if any field failed.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }

    /// Convert the collected errors into a [`ValidationError`].
    ///
    /// If nothing was recorded (a schema bug), a generic error is produced so
    /// an empty error list never reaches a client.
    #[must_use]
    pub fn into_error(self) -> ValidationError {
        if self.errors.is_empty() {
            return ValidationError::single("_form", "invalid input");
        }
        ValidationError {
            errors: self.errors,
        }
    }

    // =========================================================================
    // Required fields
    // =========================================================================

    /// Required, non-blank text of at most `max_len` characters (trimmed).
    pub fn text(&mut self, field: &str, value: Option<&str>, max_len: usize) -> Option<String> {
        let Some(value) = value else {
            self.push(field, "is required");
            return None;
        };
        self.non_empty(field, value, max_len)
    }

    /// Required UUID.
    pub fn uuid(&mut self, field: &str, value: Option<&str>) -> Option<Uuid> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            self.push(field, "is required");
            return None;
        };
        if let Ok(id) = Uuid::parse_str(value) {
            Some(id)
        } else {
            self.push(field, "must be a valid UUID");
            None
        }
    }

    /// Required integer no smaller than `min`.
    pub fn int_at_least(&mut self, field: &str, value: Option<&str>, min: i32) -> Option<i32> {
        let Some(value) = value else {
            self.push(field, "is required");
            return None;
        };
        self.int_value(field, value, min)
    }

    /// Required price string (see [`Price`]).
    pub fn price(&mut self, field: &str, value: Option<&str>) -> Option<Price> {
        let Some(value) = value else {
            self.push(field, "is required");
            return None;
        };
        let result = Price::parse(value);
        self.check(field, result)
    }

    /// Required enumerated literal, e.g. an `_action` discriminator.
    pub fn literal<'a>(
        &mut self,
        field: &str,
        value: Option<&str>,
        allowed: &[&'a str],
    ) -> Option<&'a str> {
        let found = value.and_then(|v| allowed.iter().find(|a| **a == v.trim()).copied());
        if found.is_none() {
            self.push(field, format!("must be one of: {}", allowed.join(", ")));
        }
        found
    }

    // =========================================================================
    // Optional fields (outer None = invalid, inner None = absent)
    // =========================================================================

    /// Optional text; when present it must satisfy the same rules as [`Self::text`].
    pub fn optional_text(
        &mut self,
        field: &str,
        value: Option<&str>,
        max_len: usize,
    ) -> Option<Option<String>> {
        match value {
            None => Some(None),
            Some(value) => self.non_empty(field, value, max_len).map(Some),
        }
    }

    /// Optional integer; when present it must be at least `min`.
    pub fn optional_int_at_least(
        &mut self,
        field: &str,
        value: Option<&str>,
        min: i32,
    ) -> Option<Option<i32>> {
        match value {
            None => Some(None),
            Some(value) => self.int_value(field, value, min).map(Some),
        }
    }

    /// Optional price.
    pub fn optional_price(&mut self, field: &str, value: Option<&str>) -> Option<Option<Price>> {
        match value {
            None => Some(None),
            Some(value) => {
                let result = Price::parse(value);
                self.check(field, result).map(Some)
            }
        }
    }

    /// Optional boolean (`true/false/on/off/1/0`, case-insensitive).
    pub fn optional_bool(&mut self, field: &str, value: Option<&str>) -> Option<Option<bool>> {
        let Some(value) = value else {
            return Some(None);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" => Some(Some(true)),
            "false" | "off" | "0" => Some(Some(false)),
            _ => {
                self.push(field, "must be true or false");
                None
            }
        }
    }

    /// Optional http(s) URL. An empty string counts as absent.
    pub fn optional_url(&mut self, field: &str, value: Option<&str>) -> Option<Option<Url>> {
        match value.map(str::trim) {
            None | Some("") => Some(None),
            Some(value) => self.url_value(field, value).map(Some),
        }
    }

    /// Nullable http(s) URL for partial updates: absent keeps, empty clears.
    pub fn url_patch(&mut self, field: &str, value: Option<&str>) -> Option<Patch<Url>> {
        match value.map(str::trim) {
            None => Some(Patch::Keep),
            Some("") => Some(Patch::Clear),
            Some(value) => self.url_value(field, value).map(Patch::Set),
        }
    }

    // =========================================================================
    // Shared checks
    // =========================================================================

    fn non_empty(&mut self, field: &str, value: &str, max_len: usize) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            self.push(field, "cannot be empty");
            return None;
        }
        if value.chars().count() > max_len {
            self.push(field, format!("must be at most {max_len} characters"));
            return None;
        }
        Some(value.to_owned())
    }

    fn int_value(&mut self, field: &str, value: &str, min: i32) -> Option<i32> {
        let Ok(parsed) = value.trim().parse::<i32>() else {
            self.push(field, "must be a whole number");
            return None;
        };
        if parsed < min {
            self.push(field, format!("must be at least {min}"));
            return None;
        }
        Some(parsed)
    }

    fn url_value(&mut self, field: &str, value: &str) -> Option<Url> {
        if value.len() > MAX_URL_LENGTH {
            self.push(field, format!("must be at most {MAX_URL_LENGTH} characters"));
            return None;
        }
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
                Some(url)
            }
            _ => {
                self.push(field, "must be a valid http(s) URL");
                None
            }
        }
    }
}
