//! Shopify session token verification.
//!
//! The Shopify admin hands an embedded app a short-lived JWT signed with the
//! app's client secret (HS256). The token's `dest` claim is the shop's admin
//! URL, which is how a request is tied to a shop.
//!
//! See <https://shopify.dev/docs/apps/build/authentication-authorization/session-tokens>.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{AuthError, ShopSession};

/// Clock skew tolerated on `exp` and `nbf`, in seconds.
const LEEWAY_SECS: u64 = 5;

/// `aud` may be a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Shop admin URL, e.g. `https://a.myshopify.com/admin`.
    pub iss: String,
    /// Shop URL, e.g. `https://a.myshopify.com`.
    pub dest: String,
    /// App client ID.
    pub aud: Audience,
    /// Staff member ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: i64,
    pub nbf: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

/// Verifies session tokens against the app credentials.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone)]
pub struct SessionTokenVerifier {
    api_key: String,
    api_secret: SecretString,
}

impl std::fmt::Debug for SessionTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenVerifier")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl SessionTokenVerifier {
    /// Create a verifier for the given app credentials.
    #[must_use]
    pub const fn new(api_key: String, api_secret: SecretString) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }

    /// The app client ID tokens must be issued for.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Verify a token against the current time.
    ///
    /// Signature, `aud`, `exp` and `nbf` are checked by `jsonwebtoken`;
    /// the shop is then taken from `dest`, which must agree with `iss`.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] describing the first check that failed.
    #[instrument(skip_all)]
    pub fn verify(&self, token: &str) -> Result<ShopSession, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::HS256 {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let key = DecodingKey::from_secret(self.api_secret.expose_secret().as_bytes());
        let claims = decode::<SessionClaims>(token, &key, &self.validation())
            .map_err(auth_error)?
            .claims;

        let shop = destination_host(&claims)?;
        debug!(shop = %shop, "Session token verified");

        Ok(ShopSession { shop })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.api_key]);
        validation.set_required_spec_claims(&["exp", "nbf", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = LEEWAY_SECS;
        validation
    }

    /// Sign claims with the app secret.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Malformed` if the claims cannot be encoded.
    #[cfg(any(test, feature = "test-support"))]
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        self.sign_with(Algorithm::HS256, claims)
    }

    #[cfg(any(test, feature = "test-support"))]
    fn sign_with(&self, alg: Algorithm, claims: &SessionClaims) -> Result<String, AuthError> {
        let key =
            jsonwebtoken::EncodingKey::from_secret(self.api_secret.expose_secret().as_bytes());
        jsonwebtoken::encode(&jsonwebtoken::Header::new(alg), claims, &key)
            .map_err(|e| AuthError::Malformed(e.to_string()))
    }

    /// Claims for a token issued to `shop` for this app, valid for one minute from `now`.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn claims_for(&self, shop: &str, now: i64) -> SessionClaims {
        SessionClaims {
            iss: format!("https://{shop}/admin"),
            dest: format!("https://{shop}"),
            aud: Audience::One(self.api_key.clone()),
            sub: Some("42".to_owned()),
            exp: now + 60,
            nbf: now - 1,
            iat: Some(now),
            jti: Some(uuid::Uuid::new_v4().to_string()),
            sid: None,
        }
    }
}

fn auth_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::ImmatureSignature => AuthError::NotYetValid,
        ErrorKind::InvalidAudience => AuthError::AudienceMismatch,
        ErrorKind::InvalidAlgorithm => AuthError::UnsupportedAlgorithm("HS256 required".to_owned()),
        _ => AuthError::Malformed(err.to_string()),
    }
}

/// The shop host named by `dest`, checked against `iss`.
fn destination_host(claims: &SessionClaims) -> Result<String, AuthError> {
    let dest = Url::parse(&claims.dest)
        .map_err(|e| AuthError::InvalidDestination(format!("dest: {e}")))?;
    if dest.scheme() != "https" {
        return Err(AuthError::InvalidDestination("dest must be https".to_owned()));
    }
    let Some(host) = dest.host_str() else {
        return Err(AuthError::InvalidDestination("dest has no host".to_owned()));
    };

    let iss = Url::parse(&claims.iss)
        .map_err(|e| AuthError::InvalidDestination(format!("iss: {e}")))?;
    if iss.host_str() != Some(host) {
        return Err(AuthError::InvalidDestination(
            "iss and dest name different shops".to_owned(),
        ));
    }

    Ok(host.to_owned())
}
