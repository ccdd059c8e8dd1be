//! Domain models for the embedded app.
//!
//! Models are the validated, typed form of rows owned by a shop. Row structs
//! used for `sqlx` decoding live next to the queries in [`crate::db`].

pub mod style;
pub mod variant;

pub use style::{NewStyle, Style, StylePatch};
pub use variant::{NewVariant, ProductBaseVariant, VariantPatch};
