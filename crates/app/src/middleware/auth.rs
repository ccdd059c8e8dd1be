//! Session extraction for embedded-app requests.
//!
//! The Shopify admin sends the session token as `Authorization: Bearer` on
//! fetch requests and as the `id_token` query parameter on document loads.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use url::form_urlencoded;

use poster_studio_core::ShopDomain;

use crate::auth::{AuthError, ShopSession, resolve_tenant};
use crate::state::AppState;

/// Outcome of authenticating the current request.
///
/// Extraction never fails: handlers receive the result explicitly and
/// decide how an unauthenticated request is answered.
#[derive(Debug, Clone)]
pub struct SessionContext {
    session: Result<ShopSession, AuthError>,
    token: Option<String>,
}

impl SessionContext {
    /// Resolve the tenant of this request.
    ///
    /// # Errors
    ///
    /// Returns the authentication failure, or `AuthError::MissingTenant` if
    /// the session carries no usable shop.
    pub fn tenant(&self) -> Result<ShopDomain, AuthError> {
        let session = self.session.as_ref().map_err(Clone::clone)?;
        resolve_tenant(session)
    }

    /// The raw token, for echoing into follow-up form posts.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Read the session token from the bearer header, then the query string.
fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }

    let query = parts.uri.query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "id_token")
        .map(|(_, value)| value.into_owned())
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for SessionContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts);
        let session = token
            .as_deref()
            .ok_or(AuthError::MissingToken)
            .and_then(|t| state.verifier().verify(t));

        if let Err(e) = &session {
            tracing::debug!(error = %e, "Request not authenticated");
        }

        Ok(Self { session, token })
    }
}
