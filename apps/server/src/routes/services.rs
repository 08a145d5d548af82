//! Service catalog: listing, search, autocomplete and admin CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use barbearia_core::{CoreError, Service, ServiceInput};
use barbearia_db::ServiceQuery;
use serde::Deserialize;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ServiceListParams {
    pub q: Option<String>,
    pub category: Option<String>,
    /// Include unavailable services (admin listing).
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuickSearchParams {
    #[serde(default)]
    pub q: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/services", get(list_services).post(create_service))
        .route("/api/services/categories", get(categories))
        .route("/api/services/quick-search", get(quick_search))
        .route(
            "/api/services/:id",
            get(get_service).put(update_service).delete(delete_service),
        )
}

async fn list_services(
    State(state): State<AppState>,
    Query(params): Query<ServiceListParams>,
) -> ApiResult<Json<Vec<Service>>> {
    let query = ServiceQuery {
        term: params.q,
        category: params.category,
        only_available: !params.all,
    };
    Ok(Json(state.db.services().search(&query).await?))
}

async fn categories(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.db.services().categories().await?))
}

async fn quick_search(
    State(state): State<AppState>,
    Query(params): Query<QuickSearchParams>,
) -> ApiResult<Json<Vec<Service>>> {
    Ok(Json(state.db.services().quick_search(&params.q).await?))
}

async fn get_service(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Service>> {
    let service = state
        .db
        .services()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::ServiceNotFound(id))?;
    Ok(Json(service))
}

async fn create_service(
    State(state): State<AppState>,
    Json(input): Json<ServiceInput>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    let service = state.db.services().create(&input).await?;
    info!(id = %service.id, name = %service.name, "Service created");
    Ok((StatusCode::CREATED, Json(service)))
}

async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ServiceInput>,
) -> ApiResult<Json<Service>> {
    Ok(Json(state.db.services().update(&id, &input).await?))
}

async fn delete_service(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.services().delete(&id).await?;
    info!(id = %id, "Service deleted");
    Ok(StatusCode::NO_CONTENT)
}
