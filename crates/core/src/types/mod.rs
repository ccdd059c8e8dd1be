//! Core types for Poster Studio.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod shop;

pub use id::*;
pub use price::{Price, PriceError};
pub use shop::{ShopDomain, ShopDomainError};
