//! Appointment booking, history, status changes and WhatsApp hooks.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use barbearia_core::notify::{MessageContext, OutboundMessage};
use barbearia_core::{Appointment, AppointmentStatus, CoreError, NewAppointment};
use barbearia_db::AppointmentFilter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::routes::optional_date;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentListParams {
    pub date: Option<String>,
    pub service_id: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct MessageSent {
    pub sent: bool,
    pub message: OutboundMessage,
}

#[derive(Debug, Clone, Copy)]
enum Template {
    Confirmation,
    Reminder,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/appointments", get(list_appointments).post(book))
        .route("/api/appointments/:id", get(get_appointment))
        .route("/api/appointments/:id/status", post(change_status))
        .route("/api/appointments/:id/cancel", post(cancel))
        .route("/api/appointments/:id/whatsapp/confirmation", post(send_confirmation))
        .route("/api/appointments/:id/whatsapp/reminder", post(send_reminder))
}

async fn list_appointments(
    State(state): State<AppState>,
    Query(params): Query<AppointmentListParams>,
) -> ApiResult<Json<Vec<Appointment>>> {
    if matches!(params.limit, Some(limit) if limit <= 0) {
        return Err(ApiError::validation("limit must be positive"));
    }

    let filter = AppointmentFilter {
        date: optional_date("date", params.date.as_deref())?,
        service_id: params.service_id.filter(|s| !s.trim().is_empty()),
        limit: params.limit,
    };
    Ok(Json(state.db.appointments().list(&filter).await?))
}

async fn book(
    State(state): State<AppState>,
    Json(request): Json<NewAppointment>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    let appointment = state.db.appointments().book(&request).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

async fn load_appointment(state: &AppState, id: &str) -> ApiResult<Appointment> {
    state
        .db
        .appointments()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::AppointmentNotFound(id.to_string()).into())
}

async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(load_appointment(&state, &id).await?))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Json<Appointment>> {
    let next: AppointmentStatus = change.status.parse()?;
    let appointment = state.db.appointments().update_status(&id, next).await?;
    info!(id = %id, status = ?appointment.status, "Appointment status changed");
    Ok(Json(appointment))
}

async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.db.appointments().cancel(&id).await?))
}

async fn send_confirmation(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<MessageSent>> {
    notify(&state, &id, Template::Confirmation).await
}

async fn send_reminder(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<MessageSent>> {
    notify(&state, &id, Template::Reminder).await
}

/// Renders a template for the appointment and hands it to the notifier.
///
/// A delivered confirmation flags the appointment as confirmed over
/// WhatsApp; its status is left alone.
async fn notify(state: &AppState, id: &str, template: Template) -> ApiResult<Json<MessageSent>> {
    let appointment = load_appointment(state, id).await?;
    let service = state
        .db
        .services()
        .get_by_id(&appointment.service_id)
        .await?
        .ok_or_else(|| CoreError::ServiceNotFound(appointment.service_id.clone()))?;
    let professional = state
        .db
        .professionals()
        .get_by_id(&appointment.professional_id)
        .await?
        .ok_or_else(|| CoreError::ProfessionalNotFound(appointment.professional_id.clone()))?;
    let settings = state.db.settings().get().await?;

    let ctx = MessageContext {
        shop_name: &settings.name,
        service_name: &service.name,
        professional_name: &professional.full_name,
    };
    let message = match template {
        Template::Confirmation => OutboundMessage::confirmation(&appointment, ctx),
        Template::Reminder => OutboundMessage::reminder(&appointment, ctx),
    };

    if !state.notifier.send(&message) {
        warn!(id = %id, kind = ?message.kind, "WhatsApp message not sent");
        return Err(ApiError::internal("failed to send message"));
    }

    if let Template::Confirmation = template {
        state.db.appointments().mark_confirmed_via_whatsapp(id).await?;
    }

    Ok(Json(MessageSent { sent: true, message }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{disabled_state, get, post, state};
    use crate::state::AppState;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    /// Service, barber and one 10:00 slot on 2026-11-04.
    async fn setup(state: &AppState) -> (String, String) {
        let (_, service) = post(
            state,
            "/api/services",
            json!({ "name": "Corte", "price": 3500, "category": "Cabelo" }),
        )
        .await;
        let (_, barber) = post(state, "/api/professionals", json!({ "fullName": "João" })).await;
        let barber_id = barber["id"].as_str().unwrap().to_string();
        post(
            state,
            &format!("/api/professionals/{barber_id}/slots"),
            json!({ "date": "2026-11-04", "startTime": "10:00", "endTime": "10:30" }),
        )
        .await;
        (service["id"].as_str().unwrap().to_string(), barber_id)
    }

    fn booking(service_id: &str, barber_id: &str) -> Value {
        json!({
            "clientName": "Pedro Souza",
            "clientPhone": "11987654321",
            "serviceId": service_id,
            "professionalId": barber_id,
            "date": "2026-11-04",
            "time": "10:00"
        })
    }

    async fn book(state: &AppState) -> String {
        let (service_id, barber_id) = setup(state).await;
        let (status, body) = post(state, "/api/appointments", booking(&service_id, &barber_id)).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_booking_takes_the_slot() {
        let state = state().await;
        let (service_id, barber_id) = setup(&state).await;

        let (status, body) = post(&state, "/api/appointments", booking(&service_id, &barber_id)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");
        assert_eq!(body["totalValue"], 3500);

        let (status, body) = post(&state, "/api/appointments", booking(&service_id, &barber_id)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (_, slots) = get(&state, &format!("/api/professionals/{barber_id}/slots?date=2026-11-04")).await;
        assert!(slots.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_graph_and_cancel() {
        let state = state().await;
        let id = book(&state).await;

        let (status, body) = post(
            &state,
            &format!("/api/appointments/{id}/status"),
            json!({ "status": "completed" }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, _) = post(&state, &format!("/api/appointments/{id}/status"), json!({ "status": "bogus" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = post(
            &state,
            &format!("/api/appointments/{id}/status"),
            json!({ "status": "confirmed" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "confirmed");

        let (_, body) = post(&state, &format!("/api/appointments/{id}/cancel"), json!({})).await;
        assert_eq!(body["status"], "canceled");

        let (_, listed) = get(&state, "/api/appointments?date=2026-11-04").await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        let (status, _) = get(&state, "/api/appointments?limit=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_whatsapp_confirmation_sets_flag() {
        let state = state().await;
        let id = book(&state).await;

        let (status, body) = post(&state, &format!("/api/appointments/{id}/whatsapp/confirmation"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sent"], true);
        assert_eq!(body["message"]["to"], "11987654321");

        let (_, appointment) = get(&state, &format!("/api/appointments/{id}")).await;
        assert_eq!(appointment["confirmedViaWhatsapp"], true);
        assert_eq!(appointment["status"], "pending");

        let (status, _) = post(&state, &format!("/api/appointments/{id}/whatsapp/reminder"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_an_error() {
        let state = disabled_state().await;
        let id = book(&state).await;

        let (status, body) = post(&state, &format!("/api/appointments/{id}/whatsapp/confirmation"), json!({})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "failed to send message");

        let (_, appointment) = get(&state, &format!("/api/appointments/{id}")).await;
        assert_eq!(appointment["confirmedViaWhatsapp"], false);
    }
}
