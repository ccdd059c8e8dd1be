//! The validated, shop-scoped mutation pipeline.
//!
//! Every write endpoint runs the same four steps:
//!
//! ```text
//! validate -> authorize -> execute -> format
//! ```
//!
//! 1. **validate**: the handler hands over its schema result. A rejection
//!    short-circuits with 400 (malformed body) or 422 (field errors).
//! 2. **authorize**: the tenant is resolved from the request's
//!    [`SessionContext`]. Failure short-circuits with 401.
//! 3. **execute**: the operation receives a [`TenantScope`] and the typed
//!    input, and performs its single persistence call. Errors are logged,
//!    sent to Sentry and reported as a generic 500 envelope.
//! 4. **format**: success and not-found are rendered by the handler's
//!    [`Formatter`]; every other outcome uses the shared failure envelope.
//!
//! Nothing reaches storage unless validation and authorization both passed.
//!
//! ```rust,ignore
//! Mutation::new(&state, &session)
//!     .validate(variant_key(&id))
//!     .authorize()
//!     .execute(|scope, id| async move {
//!         let deleted = scope.variants().delete(&id).await?;
//!         Ok::<_, RepositoryError>(Mutated::found(deleted, "Variant not found"))
//!     })
//!     .await
//!     .format(JsonEnvelope::new(|_| MessagePayload {
//!         message: "Variant deleted successfully",
//!     }))
//! ```

use std::future::Future;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;
use url::form_urlencoded;

use poster_studio_core::{FieldError, ValidationError};

use crate::auth::AuthError;
use crate::middleware::SessionContext;
use crate::state::{AppState, TenantScope};

/// Message returned for unexpected failures; no internal detail is exposed.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Why input was refused before any side effect.
#[derive(Debug)]
pub enum Rejection {
    /// The body could not be parsed at all.
    Malformed(String),
    /// The body parsed but failed schema validation.
    Invalid(ValidationError),
}

impl From<ValidationError> for Rejection {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

/// Result of the execute step's single persistence call.
#[derive(Debug)]
pub enum Mutated<T> {
    /// A row was written (or the operation otherwise succeeded).
    Done(T),
    /// No row matched `(key, shop)`.
    NotFound(&'static str),
}

impl<T> Mutated<T> {
    /// `Done` for `Some`, `NotFound(message)` for `None`.
    pub fn found(row: Option<T>, message: &'static str) -> Self {
        row.map_or(Self::NotFound(message), Self::Done)
    }
}

/// Terminal state of one mutation.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    RejectedInput(Rejection),
    Unauthorized(AuthError),
    NotFound(&'static str),
    PersistenceFailure,
}

impl<T> Outcome<T> {
    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::RejectedInput(_) => "rejected_input",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::PersistenceFailure => "persistence_failure",
        }
    }

    /// Render the outcome as an HTTP response.
    pub fn format<F: Formatter<T>>(self, formatter: F) -> Response {
        match self {
            Self::Success(value) => formatter.success(value),
            Self::NotFound(message) => formatter.not_found(message),
            Self::RejectedInput(Rejection::Malformed(detail)) => failure(
                StatusCode::BAD_REQUEST,
                format!("Invalid request: {detail}"),
                None,
            ),
            Self::RejectedInput(Rejection::Invalid(err)) => failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_owned(),
                Some(err.into_errors()),
            ),
            Self::Unauthorized(err) => {
                failure(StatusCode::UNAUTHORIZED, format!("Unauthorized: {err}"), None)
            }
            Self::PersistenceFailure => failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERIC_FAILURE.to_owned(),
                None,
            ),
        }
    }
}

/// Shared failure envelope.
#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

/// Build a `{success: false, error, fields?}` response.
pub fn failure(status: StatusCode, error: String, fields: Option<Vec<FieldError>>) -> Response {
    (
        status,
        Json(FailureBody {
            success: false,
            error,
            fields,
        }),
    )
        .into_response()
}

/// Renders the success and not-found outcomes of a handler.
pub trait Formatter<T> {
    /// Response for a successful mutation.
    fn success(self, value: T) -> Response;

    /// Response when no row matched.
    fn not_found(self, message: &'static str) -> Response;
}

/// JSON envelope: `{success: true, ...payload}` / 404 `{success: false, error}`.
pub struct JsonEnvelope<F>(F);

impl<F> JsonEnvelope<F> {
    /// Build the payload from the mutation result with `payload`.
    pub const fn new(payload: F) -> Self {
        Self(payload)
    }
}

#[derive(Serialize)]
struct SuccessBody<P> {
    success: bool,
    #[serde(flatten)]
    payload: P,
}

impl<T, P, F> Formatter<T> for JsonEnvelope<F>
where
    F: FnOnce(T) -> P,
    P: Serialize,
{
    fn success(self, value: T) -> Response {
        Json(SuccessBody {
            success: true,
            payload: (self.0)(value),
        })
        .into_response()
    }

    fn not_found(self, message: &'static str) -> Response {
        failure(StatusCode::NOT_FOUND, message.to_owned(), None)
    }
}

/// Redirect to a listing view after a form post.
///
/// A not-found result redirects to the same view with `error=not_found`.
/// The session token is carried over so the embedded page can load again.
pub struct RedirectTo {
    path: &'static str,
    params: Vec<(&'static str, String)>,
}

impl RedirectTo {
    /// Redirect to `path`.
    #[must_use]
    pub const fn new(path: &'static str) -> Self {
        Self {
            path,
            params: Vec::new(),
        }
    }

    /// Append the session token as `id_token`, if there is one.
    #[must_use]
    pub fn with_token(mut self, token: Option<&str>) -> Self {
        if let Some(token) = token {
            self.params.push(("id_token", token.to_owned()));
        }
        self
    }

    fn location(&self) -> String {
        if self.params.is_empty() {
            return self.path.to_owned();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();
        format!("{}?{query}", self.path)
    }
}

impl<T> Formatter<T> for RedirectTo {
    fn success(self, _value: T) -> Response {
        Redirect::to(&self.location()).into_response()
    }

    fn not_found(mut self, _message: &'static str) -> Response {
        self.params.push(("error", "not_found".to_owned()));
        Redirect::to(&self.location()).into_response()
    }
}

/// Entry point of the pipeline.
pub struct Mutation<'a> {
    state: &'a AppState,
    session: &'a SessionContext,
}

impl<'a> Mutation<'a> {
    /// Start a mutation for the current request.
    #[must_use]
    pub const fn new(state: &'a AppState, session: &'a SessionContext) -> Self {
        Self { state, session }
    }

    /// Step 1: accept the schema result.
    pub fn validate<I, R: Into<Rejection>>(self, input: Result<I, R>) -> Validated<'a, I> {
        Validated {
            state: self.state,
            session: self.session,
            input: input.map_err(|r| Halt::Rejected(r.into())),
        }
    }
}

enum Halt {
    Rejected(Rejection),
    Unauthorized(AuthError),
}

/// Input has been through the schema.
pub struct Validated<'a, I> {
    state: &'a AppState,
    session: &'a SessionContext,
    input: Result<I, Halt>,
}

impl<I> Validated<'_, I> {
    /// Step 2: resolve the tenant.
    pub fn authorize(self) -> Authorized<I> {
        let Self {
            state,
            session,
            input,
        } = self;
        let staged = input.and_then(|input| {
            let shop = session.tenant().map_err(Halt::Unauthorized)?;
            Ok((state.scope(shop), input))
        });
        Authorized { staged }
    }
}

/// Input is valid and the tenant is known.
pub struct Authorized<I> {
    staged: Result<(TenantScope, I), Halt>,
}

impl<I> Authorized<I> {
    /// Step 3: run the single persistence operation.
    pub async fn execute<T, E, F, Fut>(self, operation: F) -> Outcome<T>
    where
        F: FnOnce(TenantScope, I) -> Fut,
        Fut: Future<Output = Result<Mutated<T>, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let (scope, input) = match self.staged {
            Ok(staged) => staged,
            Err(Halt::Rejected(rejection)) => {
                tracing::info!(outcome = "rejected_input", "Mutation rejected");
                return Outcome::RejectedInput(rejection);
            }
            Err(Halt::Unauthorized(err)) => {
                tracing::info!(outcome = "unauthorized", error = %err, "Mutation unauthorized");
                return Outcome::Unauthorized(err);
            }
        };

        let shop = scope.shop().clone();
        let outcome = match operation(scope, input).await {
            Ok(Mutated::Done(value)) => Outcome::Success(value),
            Ok(Mutated::NotFound(message)) => Outcome::NotFound(message),
            Err(err) => {
                let event_id = sentry::capture_error(&err);
                tracing::error!(
                    error = %err,
                    shop = %shop,
                    sentry_event_id = %event_id,
                    "Mutation failed"
                );
                Outcome::PersistenceFailure
            }
        };

        tracing::info!(outcome = outcome.label(), shop = %shop, "Mutation finished");
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_malformed_is_400() {
        let response = Outcome::<()>::RejectedInput(Rejection::Malformed("expected JSON".into()))
            .format(RedirectTo::new("/app/styles"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": "Invalid request: expected JSON"})
        );
    }

    #[tokio::test]
    async fn test_invalid_lists_fields() {
        let response = Outcome::<()>::RejectedInput(Rejection::Invalid(ValidationError::single(
            "price",
            "must be a non-negative amount with at most two decimals",
        )))
        .format(RedirectTo::new("/app/styles"));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["fields"][0]["field"], "price");
    }

    #[tokio::test]
    async fn test_unauthorized_is_401() {
        let response =
            Outcome::<()>::Unauthorized(AuthError::MissingToken).format(RedirectTo::new("/app/styles"));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": "Unauthorized: missing session token"})
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_is_generic() {
        let response = Outcome::<()>::PersistenceFailure.format(RedirectTo::new("/app/styles"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn test_json_envelope_flattens_payload() {
        #[derive(Serialize)]
        struct Url {
            url: &'static str,
        }

        let response = Outcome::Success("https://cdn.test/a.png")
            .format(JsonEnvelope::new(|url| Url { url }));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"success": true, "url": "https://cdn.test/a.png"})
        );
    }

    #[tokio::test]
    async fn test_json_envelope_not_found() {
        let response = Outcome::<()>::NotFound("Variant not found")
            .format(JsonEnvelope::new(|()| json!({})));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": "Variant not found"})
        );
    }

    #[test]
    fn test_redirects() {
        let response = Outcome::Success(()).format(RedirectTo::new("/app/styles"));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/app/styles");

        let response = Outcome::<()>::NotFound("Style not found")
            .format(RedirectTo::new("/app/styles").with_token(Some("a.b+c")));
        assert_eq!(
            response.headers()["location"],
            "/app/styles?id_token=a.b%2Bc&error=not_found"
        );
    }

    #[test]
    fn test_mutated_found() {
        assert!(matches!(Mutated::found(Some(1), "x"), Mutated::Done(1)));
        assert!(matches!(
            Mutated::<i32>::found(None, "x"),
            Mutated::NotFound("x")
        ));
    }
}
