//! Shop authentication and tenant resolution.
//!
//! A request is authenticated by its Shopify session token
//! ([`SessionTokenVerifier`]), which yields a [`ShopSession`]. The session's
//! shop string is then resolved into the [`ShopDomain`] tenant key with
//! [`resolve_tenant`]; nothing else in the app derives a tenant.

mod error;
mod session_token;

pub use error::AuthError;
pub use session_token::{Audience, SessionClaims, SessionTokenVerifier};

use poster_studio_core::ShopDomain;

/// An authenticated embedded-app session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopSession {
    /// Shop host taken from the token's `dest` claim.
    pub shop: String,
}

/// Resolve the tenant key for a session.
///
/// Pure and deterministic: the shop domain itself is the tenant identity.
///
/// # Errors
///
/// Returns `AuthError::MissingTenant` if the shop is empty or not a host name.
pub fn resolve_tenant(session: &ShopSession) -> Result<ShopDomain, AuthError> {
    ShopDomain::parse(&session.shop).map_err(|e| {
        tracing::debug!(error = %e, "Session shop does not resolve to a tenant");
        AuthError::MissingTenant
    })
}
