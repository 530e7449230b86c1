//! Route handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use axum_extra::extract::Form;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use libthreadcast::{AccessToken, ContainerId, PostId, StatusReport, ThreadcastError};

use crate::error::ApiError;
use crate::forms::{IndexQuery, PublishRequest, RepostRequest, UploadForm};
use crate::pages::{self, IndexPage, PublishPage, UploadPage};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: String,
}

/// Index page; signed-in visitors go on to where they were headed
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IndexQuery>,
) -> Response {
    if state.access_token().is_some() {
        return Redirect::to(query.destination()).into_response();
    }
    match pages::render(IndexPage) {
        Ok(html) => html.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Redirect {
    state.sign_out();
    info!("Signed out");
    Redirect::to("/")
}

pub async fn upload_page() -> Result<Html<String>, ApiError> {
    pages::render(UploadPage::new())
}

/// Create the container for a submitted compose form
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<AccessToken>,
    Form(form): Form<UploadForm>,
) -> Result<Json<IdResponse>, ApiError> {
    let spec = form.into_compose_state()?.to_post_spec();
    let id = state.service.submit(&spec, &token).await?;
    Ok(Json(IdResponse { id: id.into_inner() }))
}

/// Publish page; the page polls with the service's own policy
pub async fn publish_page(
    State(state): State<Arc<AppState>>,
    Path(container_id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let id = ContainerId::parse(&container_id)?;
    let policy = state.service.orchestrator().policy();
    pages::render(PublishPage::new(&id, policy))
}

/// One status query for the publish page
pub async fn container_status(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<AccessToken>,
    Path(container_id): Path<String>,
) -> Result<Json<StatusReport>, ApiError> {
    let id = ContainerId::parse(&container_id)?;
    match state.service.container_status(&id, &token).await {
        Ok(report) => Ok(Json(report)),
        Err(ThreadcastError::Remote(e)) => Err(ApiError::new(
            StatusCode::OK,
            format!("Error querying container status: {}", e),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn publish(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<AccessToken>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<IdResponse>, ApiError> {
    let id = ContainerId::parse(&request.container_id)?;
    let post_id = state.service.orchestrator().publish(&id, &token).await?;
    Ok(Json(IdResponse {
        id: post_id.into_inner(),
    }))
}

/// Repost, then show the repost on its own page
pub async fn repost(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<AccessToken>,
    Json(request): Json<RepostRequest>,
) -> Result<Redirect, ApiError> {
    let id = PostId::parse(&request.repost_id)?;
    match state.service.repost(&id, &token).await {
        Ok(repost_id) => Ok(Redirect::to(&format!("/threads/{}", repost_id))),
        Err(e) => {
            warn!(post_id = %id, "Repost failed");
            Err(e.into())
        }
    }
}
