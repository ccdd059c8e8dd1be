//! Example image uploads.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    response::Response,
    routing::post,
};
use serde::Serialize;
use tracing::instrument;

use crate::config::UPLOAD_MAX_BYTES_CEILING;
use crate::middleware::SessionContext;
use crate::mutation::{JsonEnvelope, Mutated, Mutation, Rejection};
use crate::schemas::UploadBody;
use crate::state::AppState;
use crate::storage::UploadError;

/// Request body limit: base64 of the largest allowed image plus JSON overhead.
const UPLOAD_BODY_LIMIT: usize = UPLOAD_MAX_BYTES_CEILING / 3 * 4 + 64 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadPayload {
    pub url: String,
}

/// Build the uploads router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/uploads", post(upload_image))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

#[instrument(skip_all)]
async fn upload_image(
    State(state): State<AppState>,
    session: SessionContext,
    body: Result<Json<UploadBody>, JsonRejection>,
) -> Response {
    let input = match body {
        Ok(Json(body)) => body
            .validate(state.max_upload_bytes())
            .map_err(Rejection::from),
        Err(rejection) => Err(Rejection::Malformed(rejection.body_text())),
    };

    Mutation::new(&state, &session)
        .validate(input)
        .authorize()
        .execute(|scope, image| async move {
            let stored = scope.images().upload(&image).await?;
            Ok::<_, UploadError>(Mutated::Done(stored))
        })
        .await
        .format(JsonEnvelope::new(|stored: crate::storage::StoredImage| {
            UploadPayload { url: stored.url }
        }))
}
