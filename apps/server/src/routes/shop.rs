//! Shop settings and the open/closed switch.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use barbearia_core::{ShopSettings, ShopSettingsInput};
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

/// Public status shown on the booking page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopStatus {
    pub open: bool,
    pub operating: bool,
    pub name: String,
}

impl From<&ShopSettings> for ShopStatus {
    fn from(settings: &ShopSettings) -> Self {
        ShopStatus {
            open: settings.open,
            operating: settings.is_operating(),
            name: settings.name.clone(),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shop", get(get_settings).put(update_settings))
        .route("/api/shop/status", get(status))
        .route("/api/shop/toggle", post(toggle))
}

async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<ShopSettings>> {
    Ok(Json(state.db.settings().get().await?))
}

async fn update_settings(
    State(state): State<AppState>,
    Json(input): Json<ShopSettingsInput>,
) -> ApiResult<Json<ShopSettings>> {
    let settings = state.db.settings().update(&input).await?;
    info!(name = %settings.name, "Shop settings updated");
    Ok(Json(settings))
}

async fn status(State(state): State<AppState>) -> ApiResult<Json<ShopStatus>> {
    let settings = state.db.settings().get().await?;
    Ok(Json(ShopStatus::from(&settings)))
}

async fn toggle(State(state): State<AppState>) -> ApiResult<Json<ShopStatus>> {
    let settings = state.db.settings().toggle_open().await?;
    Ok(Json(ShopStatus::from(&settings)))
}
