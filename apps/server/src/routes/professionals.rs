//! Professionals and their daily agenda of time slots.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use barbearia_core::slots::generate_slots;
use barbearia_core::time::hhmm;
use barbearia_core::{CoreError, Professional, ProfessionalInput, TimeSlot, DEFAULT_SLOT_INTERVAL_MINUTES};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::routes::optional_date;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProfessionalListParams {
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SlotListParams {
    pub date: Option<String>,
    /// Include taken slots.
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSlotsRequest {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default = "default_interval")]
    pub interval_minutes: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_interval() -> u32 {
    DEFAULT_SLOT_INTERVAL_MINUTES
}

#[derive(Debug, Serialize)]
pub struct GenerateSlotsResponse {
    pub slots: Vec<TimeSlot>,
    pub message: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/professionals", get(list_professionals).post(create_professional))
        .route("/api/professionals/:id", get(get_professional).put(update_professional))
        .route("/api/professionals/:id/slots", get(list_slots).post(generate))
}

async fn list_professionals(
    State(state): State<AppState>,
    Query(params): Query<ProfessionalListParams>,
) -> ApiResult<Json<Vec<Professional>>> {
    Ok(Json(state.db.professionals().list(params.all).await?))
}

async fn load_professional(state: &AppState, id: &str) -> ApiResult<Professional> {
    state
        .db
        .professionals()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::ProfessionalNotFound(id.to_string()).into())
}

async fn get_professional(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Professional>> {
    Ok(Json(load_professional(&state, &id).await?))
}

async fn create_professional(
    State(state): State<AppState>,
    Json(input): Json<ProfessionalInput>,
) -> ApiResult<(StatusCode, Json<Professional>)> {
    let professional = state.db.professionals().create(&input).await?;
    info!(id = %professional.id, name = %professional.full_name, "Professional created");
    Ok((StatusCode::CREATED, Json(professional)))
}

async fn update_professional(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProfessionalInput>,
) -> ApiResult<Json<Professional>> {
    Ok(Json(state.db.professionals().update(&id, &input).await?))
}

async fn list_slots(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<SlotListParams>,
) -> ApiResult<Json<Vec<TimeSlot>>> {
    let date = optional_date("date", params.date.as_deref())?
        .ok_or_else(|| ApiError::validation("date is required"))?;
    load_professional(&state, &id).await?;

    let slots = if params.all {
        state.db.slots().list_for_professional(&id, date).await?
    } else {
        state.db.slots().list_available(&id, date).await?
    };
    Ok(Json(slots))
}

async fn generate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<GenerateSlotsRequest>,
) -> ApiResult<(StatusCode, Json<GenerateSlotsResponse>)> {
    load_professional(&state, &id).await?;

    let slots = generate_slots(
        &id,
        request.date,
        request.start_time,
        request.end_time,
        request.interval_minutes,
        request.notes.as_deref(),
    )?;
    let created = state.db.slots().create_many(&slots).await?;

    let message = format!("{} slots created", created.len());
    Ok((StatusCode::CREATED, Json(GenerateSlotsResponse { slots: created, message })))
}
