//! Product base variant routes (poster sizes and prices).

use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::{Html, Response},
    routing::get,
};
use serde::Serialize;
use tracing::instrument;

use poster_studio_core::{ValidationError, VariantId};

use super::styles::{PageQuery, error_message};
use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::SessionContext;
use crate::models::{ProductBaseVariant, VariantPatch};
use crate::mutation::{JsonEnvelope, Mutated, Mutation, Rejection};
use crate::schemas::{VariantBody, variant_key};
use crate::state::AppState;

/// Variants page template.
#[derive(Template)]
#[template(path = "variants/index.html")]
pub struct VariantsTemplate {
    pub variants: Vec<ProductBaseVariant>,
    pub api_key: String,
    pub id_token: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VariantsResponse {
    pub success: bool,
    pub variants: Vec<ProductBaseVariant>,
}

#[derive(Debug, Serialize)]
pub struct VariantPayload {
    pub variant: ProductBaseVariant,
}

#[derive(Debug, Serialize)]
pub struct MessagePayload {
    pub message: &'static str,
}

/// Build the variants router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/app/variants", get(variants_page))
        .route("/api/variants", get(list_variants).post(create_variant))
        .route(
            "/api/variants/{id}",
            axum::routing::patch(update_variant).delete(delete_variant),
        )
}

fn parse_body(body: Result<Json<VariantBody>, JsonRejection>) -> Result<VariantBody, Rejection> {
    body.map(|Json(body)| body)
        .map_err(|rejection| Rejection::Malformed(rejection.body_text()))
}

#[instrument(skip(state, session))]
async fn variants_page(
    State(state): State<AppState>,
    session: SessionContext,
    Query(params): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let shop = session.tenant()?;
    let variants = state.scope(shop).variants().list().await?;

    let template = VariantsTemplate {
        variants,
        api_key: state.verifier().api_key().to_owned(),
        id_token: session.token().unwrap_or_default().to_owned(),
        error_message: error_message(params.error.as_deref()),
    };
    Ok(Html(template.render()?))
}

#[instrument(skip(state, session))]
async fn list_variants(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<VariantsResponse>, AppError> {
    let shop = session.tenant()?;
    let variants = state.scope(shop).variants().list().await?;

    Ok(Json(VariantsResponse {
        success: true,
        variants,
    }))
}

#[instrument(skip_all)]
async fn create_variant(
    State(state): State<AppState>,
    session: SessionContext,
    body: Result<Json<VariantBody>, JsonRejection>,
) -> Response {
    let input = parse_body(body).and_then(|body| body.validate_new().map_err(Rejection::from));

    Mutation::new(&state, &session)
        .validate(input)
        .authorize()
        .execute(|scope, variant| async move {
            let created = scope.variants().insert(variant).await?;
            tracing::info!(id = %created.id, "Variant created");
            Ok::<_, RepositoryError>(Mutated::Done(created))
        })
        .await
        .format(JsonEnvelope::new(|variant| VariantPayload { variant }))
}

/// Validate the path id and the body together so both report their fields.
fn update_input(id: &str, body: VariantBody) -> Result<(VariantId, VariantPatch), Rejection> {
    match (variant_key(id), body.validate_patch()) {
        (Ok(id), Ok(patch)) => Ok((id, patch)),
        (Err(mut err), Err(other)) => {
            err.extend(other);
            Err(Rejection::Invalid(err))
        }
        (Err(err), Ok(_)) | (Ok(_), Err(err)) => Err(Rejection::Invalid(err)),
    }
}

#[instrument(skip(state, session, body))]
async fn update_variant(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
    body: Result<Json<VariantBody>, JsonRejection>,
) -> Response {
    let input = parse_body(body).and_then(|body| update_input(&id, body));

    Mutation::new(&state, &session)
        .validate(input)
        .authorize()
        .execute(|scope, (id, patch)| async move {
            let updated = scope.variants().update(&id, patch).await?;
            Ok::<_, RepositoryError>(Mutated::found(updated, "Variant not found"))
        })
        .await
        .format(JsonEnvelope::new(|variant| VariantPayload { variant }))
}

#[instrument(skip(state, session))]
async fn delete_variant(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
) -> Response {
    let input: Result<VariantId, ValidationError> = variant_key(&id);

    Mutation::new(&state, &session)
        .validate(input)
        .authorize()
        .execute(|scope, id| async move {
            let deleted = scope.variants().delete(&id).await?;
            if let Some(variant) = &deleted {
                tracing::info!(id = %variant.id, "Variant deleted");
            }
            Ok::<_, RepositoryError>(Mutated::found(deleted, "Variant not found"))
        })
        .await
        .format(JsonEnvelope::new(|_| MessagePayload {
            message: "Variant deleted successfully",
        }))
}
