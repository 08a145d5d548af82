//! # HTTP Routes
//!
//! One module per resource. Each exposes `router()` with its full paths;
//! [`api_router`] merges them.
//!
//! ## Handler Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  async fn handler(State(state), Path/Query/Json) -> ApiResult<Json<T>>  │
//! │       │                                                                 │
//! │       ├── parse query strings into domain values (400 on failure)       │
//! │       ├── one repository call: state.db.<repo>().<op>(..)               │
//! │       └── `?` converts DbError/CoreError into ApiError                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod appointments;
pub mod dashboard;
pub mod health;
pub mod products;
pub mod professionals;
pub mod sales;
pub mod services;
pub mod shop;
pub mod slots;

use axum::Router;
use barbearia_core::time::parse_date;
use chrono::NaiveDate;

use crate::error::ApiResult;
use crate::state::AppState;

/// Every route of the API, without state or middleware.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(shop::router())
        .merge(services::router())
        .merge(professionals::router())
        .merge(slots::router())
        .merge(appointments::router())
        .merge(products::router())
        .merge(sales::router())
        .merge(dashboard::router())
}

/// Parses an optional `YYYY-MM-DD` query parameter; blank means absent.
pub(crate) fn optional_date(field: &str, raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Ok(Some(parse_date(field, value)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use barbearia_core::OversellPolicy;
    use barbearia_db::{Database, DbConfig};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::notifier::{DisabledNotifier, LogNotifier, Notifier};
    use crate::state::AppState;

    pub(crate) async fn state_with(notifier: Arc<dyn Notifier>) -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState::new(db, notifier, OversellPolicy::Clamp)
    }

    pub(crate) async fn state() -> AppState {
        state_with(Arc::new(LogNotifier)).await
    }

    pub(crate) async fn disabled_state() -> AppState {
        state_with(Arc::new(DisabledNotifier)).await
    }

    pub(crate) fn app(state: &AppState) -> Router {
        crate::create_router(state.clone(), true)
    }

    /// Sends one request and returns the status with the JSON body
    /// (`Value::Null` for empty bodies).
    pub(crate) async fn send(
        state: &AppState,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub(crate) async fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
        send(state, Method::GET, uri, None).await
    }

    pub(crate) async fn post(state: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
        send(state, Method::POST, uri, Some(body)).await
    }
}
