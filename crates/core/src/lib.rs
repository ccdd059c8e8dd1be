//! Poster Studio Core - Shared types library.
//!
//! This crate provides the types used across all Poster Studio components:
//! - `app` - The embedded Shopify app (style and variant management, uploads)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and input schemas - no I/O, no database
//! access, no HTTP clients. Anything that crosses a trust boundary is parsed
//! into one of these types before it reaches storage.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for shop domains, IDs and prices
//! - [`schema`] - Field validators and the [`ValidationError`] they produce

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod schema;
pub mod types;

pub use schema::{FieldError, Patch, Scalar, ValidationError, Validator};
pub use types::*;
