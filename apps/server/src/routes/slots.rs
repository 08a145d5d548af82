use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use barbearia_core::TimeSlot;
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::routes::optional_date;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DateParams {
    pub date: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/slots", get(list_for_date))
        .route("/api/slots/:id/toggle", post(toggle))
        .route("/api/slots/:id", delete(delete_slot))
}

/// Every slot on a day, across professionals.
async fn list_for_date(
    State(state): State<AppState>,
    Query(params): Query<DateParams>,
) -> ApiResult<Json<Vec<TimeSlot>>> {
    let date = optional_date("date", params.date.as_deref())?
        .ok_or_else(|| ApiError::validation("date is required"))?;
    Ok(Json(state.db.slots().list_for_date(date).await?))
}

async fn toggle(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<TimeSlot>> {
    Ok(Json(state.db.slots().toggle(&id).await?))
}

async fn delete_slot(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.slots().delete(&id).await?;
    info!(id = %id, "Slot deleted");
    Ok(StatusCode::NO_CONTENT)
}
