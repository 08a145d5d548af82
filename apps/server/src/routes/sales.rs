//! Point of sale: checkout and sales history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use barbearia_core::time::Period;
use barbearia_core::validation::validate_period_days;
use barbearia_core::{CoreError, NewSale, Sale, SaleStatus, DEFAULT_PERIOD_DAYS};
use chrono::Utc;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SaleListParams {
    pub days: Option<u32>,
    pub status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sales", get(list_sales).post(checkout))
        .route("/api/sales/:id", get(get_sale))
}

async fn list_sales(
    State(state): State<AppState>,
    Query(params): Query<SaleListParams>,
) -> ApiResult<Json<Vec<Sale>>> {
    let days = params.days.unwrap_or(DEFAULT_PERIOD_DAYS);
    validate_period_days(days)?;
    let status = match params.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<SaleStatus>()?),
        None => None,
    };

    let period = Period::last_days(Utc::now(), days);
    Ok(Json(state.db.sales().list(period, status).await?))
}

/// Records a sale and deducts stock under the configured oversell policy.
async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<NewSale>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let sale = state.db.sales().record_sale(&request, state.oversell_policy).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

async fn get_sale(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Sale>> {
    let sale = state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::SaleNotFound(id))?;
    Ok(Json(sale))
}
