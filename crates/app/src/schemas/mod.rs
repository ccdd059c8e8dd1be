//! Input schemas for mutation endpoints.
//!
//! Each schema is a raw `serde` struct that accepts anything shaped roughly
//! right, plus a `validate` method producing the typed input for storage or
//! a [`ValidationError`](poster_studio_core::ValidationError) listing every
//! failing field. Bodies that do not even deserialize are rejected earlier
//! as malformed.

pub mod style;
pub mod upload;
pub mod variant;

pub use style::{StyleCommand, StyleForm};
pub use upload::{ImageType, ImageUpload, UploadBody};
pub use variant::{VariantBody, variant_key};
