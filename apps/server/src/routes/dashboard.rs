use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use barbearia_core::stats::{DashboardSummary, SalesStats};
use barbearia_core::DEFAULT_PERIOD_DAYS;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub days: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(summary))
        .route("/api/dashboard/sales-stats", get(sales_stats))
}

async fn summary(State(state): State<AppState>) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(state.db.reports().dashboard_summary().await?))
}

async fn sales_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> ApiResult<Json<SalesStats>> {
    let days = params.days.unwrap_or(DEFAULT_PERIOD_DAYS);
    Ok(Json(state.db.reports().sales_stats(days).await?))
}
