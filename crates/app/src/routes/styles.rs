//! Style management routes.
//!
//! The styles page is a server-rendered form; every form post carries an
//! `_action` of `create`, `update` or `delete` and redirects back to the
//! listing.

use askama::Template;
use axum::{
    Form, Json, Router,
    extract::{Query, State, rejection::FormRejection},
    response::{Html, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::SessionContext;
use crate::models::Style;
use crate::mutation::{Mutated, Mutation, RedirectTo, Rejection};
use crate::schemas::{StyleCommand, StyleForm};
use crate::state::{AppState, TenantScope};

/// Listing view the form redirects back to.
pub const STYLES_PATH: &str = "/app/styles";

/// Styles page template.
#[derive(Template)]
#[template(path = "styles/index.html")]
pub struct StylesTemplate {
    pub styles: Vec<Style>,
    /// App client ID for App Bridge.
    pub api_key: String,
    pub id_token: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StylesResponse {
    pub success: bool,
    pub styles: Vec<Style>,
}

/// Build the styles router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(STYLES_PATH, get(styles_page).post(style_action))
        .route("/api/styles", get(list_styles))
}

/// Map a redirect `error` code to a banner message.
pub(crate) fn error_message(code: Option<&str>) -> Option<String> {
    code.map(|code| match code {
        "not_found" => "That item no longer exists.".to_owned(),
        _ => "Something went wrong. Please try again.".to_owned(),
    })
}

#[instrument(skip(state, session))]
async fn styles_page(
    State(state): State<AppState>,
    session: SessionContext,
    Query(params): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let shop = session.tenant()?;
    let styles = state.scope(shop).styles().list().await?;

    let template = StylesTemplate {
        styles,
        api_key: state.verifier().api_key().to_owned(),
        id_token: session.token().unwrap_or_default().to_owned(),
        error_message: error_message(params.error.as_deref()),
    };
    Ok(Html(template.render()?))
}

#[instrument(skip(state, session))]
async fn list_styles(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<StylesResponse>, AppError> {
    let shop = session.tenant()?;
    let styles = state.scope(shop).styles().list().await?;

    Ok(Json(StylesResponse {
        success: true,
        styles,
    }))
}

#[instrument(skip_all)]
async fn style_action(
    State(state): State<AppState>,
    session: SessionContext,
    form: Result<Form<StyleForm>, FormRejection>,
) -> Response {
    let command = match form {
        Ok(Form(form)) => form.validate().map_err(Rejection::from),
        Err(rejection) => Err(Rejection::Malformed(rejection.body_text())),
    };

    Mutation::new(&state, &session)
        .validate(command)
        .authorize()
        .execute(run_style_command)
        .await
        .format(RedirectTo::new(STYLES_PATH).with_token(session.token()))
}

/// One persistence call per command.
///
/// A delete that matches no row still redirects to the listing; it is
/// logged so mismatches stay visible.
async fn run_style_command(
    scope: TenantScope,
    command: StyleCommand,
) -> Result<Mutated<()>, RepositoryError> {
    tracing::debug!(action = command.action(), "Running style command");
    match command {
        StyleCommand::Create(style) => {
            let created = scope.styles().insert(style).await?;
            tracing::info!(uuid = %created.uuid, "Style created");
            Ok(Mutated::Done(()))
        }
        StyleCommand::Update { id, patch } => {
            let updated = scope.styles().update(&id, patch).await?;
            Ok(Mutated::found(updated.map(|_| ()), "Style not found"))
        }
        StyleCommand::Delete(id) => {
            if scope.styles().delete(&id).await?.is_none() {
                tracing::warn!(uuid = %id, shop = %scope.shop(), "Style delete matched no rows");
            }
            Ok(Mutated::Done(()))
        }
    }
}
