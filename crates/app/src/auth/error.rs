//! Authentication errors.

use thiserror::Error;

/// Reasons a request could not be tied to a shop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No bearer header and no `id_token` query parameter.
    #[error("missing session token")]
    MissingToken,

    /// The token is not a well-formed JWT.
    #[error("malformed session token: {0}")]
    Malformed(String),

    /// The token header names an algorithm other than HS256.
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The HMAC signature does not match the app secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// `exp` is in the past.
    #[error("session token expired")]
    Expired,

    /// `nbf` is in the future.
    #[error("session token not yet valid")]
    NotYetValid,

    /// `aud` is not this app's API key.
    #[error("session token issued for another app")]
    AudienceMismatch,

    /// `dest`/`iss` do not name the same https shop host.
    #[error("invalid token destination: {0}")]
    InvalidDestination(String),

    /// The session carried no usable shop domain.
    #[error("session has no shop")]
    MissingTenant,
}
