//! # Appointments
//!
//! Bookings of a service with a professional, and the status machine that
//! governs them.
//!
//! ## Status Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   pending ──► confirmed ──► in_progress ──► completed (terminal)       │
//! │      │            │                                                     │
//! │      │            ├──────► no_show (terminal)                           │
//! │      │            │                                                     │
//! │      └────────────┴──────► canceled (terminal)                          │
//! │                                                                         │
//! │   Anything not drawn is rejected with InvalidStatusTransition.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::time;
use crate::types::Service;
use crate::validation::{validate_email, validate_name, validate_optional_text, validate_phone};

// =============================================================================
// Appointment Status
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    #[serde(alias = "pendente")]
    Pending,
    #[serde(alias = "confirmado")]
    Confirmed,
    #[serde(alias = "em_andamento")]
    InProgress,
    #[serde(alias = "concluido")]
    Completed,
    #[serde(alias = "cancelado")]
    Canceled,
    #[serde(alias = "falta")]
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Canceled,
        AppointmentStatus::NoShow,
    ];

    /// States reachable in one step from `self`.
    pub fn next_states(&self) -> &'static [AppointmentStatus] {
        use AppointmentStatus::*;
        match self {
            Pending => &[Confirmed, Canceled],
            Confirmed => &[InProgress, Canceled, NoShow],
            InProgress => &[Completed],
            Completed | Canceled | NoShow => &[],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.next_states().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Canceled => "canceled",
            AppointmentStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .or(match wanted.as_str() {
                "pendente" => Some(AppointmentStatus::Pending),
                "confirmado" => Some(AppointmentStatus::Confirmed),
                "em_andamento" => Some(AppointmentStatus::InProgress),
                "concluido" => Some(AppointmentStatus::Completed),
                "cancelado" => Some(AppointmentStatus::Canceled),
                "falta" => Some(AppointmentStatus::NoShow),
                _ => None,
            })
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: AppointmentStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Appointment
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: Option<String>,
    pub service_id: String,
    pub professional_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(with = "time::hhmm")]
    #[ts(as = "String")]
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    /// Price of the service at booking time.
    pub total_value: Money,
    pub confirmed_via_whatsapp: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Books `service` for the client; starts `pending` at the service price.
    pub fn book(request: &NewAppointment, service: &Service) -> CoreResult<Self> {
        request.validate()?;
        if !service.available {
            return Err(CoreError::ServiceUnavailable(service.id.clone()));
        }

        let now = Utc::now();
        Ok(Appointment {
            id: Uuid::new_v4().to_string(),
            client_name: request.client_name.trim().to_string(),
            client_phone: request.client_phone.trim().to_string(),
            client_email: request
                .client_email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            service_id: service.id.clone(),
            professional_id: request.professional_id.clone(),
            date: request.date,
            time: request.time,
            status: AppointmentStatus::Pending,
            notes: request.notes.clone().filter(|n| !n.trim().is_empty()),
            total_value: service.price,
            confirmed_via_whatsapp: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves to `next` if the status graph allows it.
    pub fn transition_to(&mut self, next: AppointmentStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn cancel(&mut self) -> CoreResult<()> {
        self.transition_to(AppointmentStatus::Canceled)
    }
}

// =============================================================================
// Booking Request
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub client_name: String,
    pub client_phone: String,
    #[serde(default)]
    pub client_email: Option<String>,
    pub service_id: String,
    pub professional_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(with = "time::hhmm")]
    #[ts(as = "String")]
    pub time: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewAppointment {
    pub fn validate(&self) -> CoreResult<()> {
        validate_name("client_name", &self.client_name, 100)?;
        validate_phone(&self.client_phone)?;
        if let Some(email) = self.client_email.as_deref().filter(|e| !e.trim().is_empty()) {
            validate_email(email)?;
        }
        if self.service_id.trim().is_empty() {
            return Err(ValidationError::required("service_id").into());
        }
        if self.professional_id.trim().is_empty() {
            return Err(ValidationError::required("professional_id").into());
        }
        validate_optional_text("notes", self.notes.as_deref(), 1000)?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::corte;

    fn request() -> NewAppointment {
        NewAppointment {
            client_name: " Maria Silva ".to_string(),
            client_phone: "11987654321".to_string(),
            client_email: Some("".to_string()),
            service_id: "svc-1".to_string(),
            professional_id: "prof-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn test_legal_transitions() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Canceled));
        assert!(Confirmed.can_transition_to(InProgress));
        assert!(Confirmed.can_transition_to(Canceled));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(InProgress.can_transition_to(Completed));
    }

    #[test]
    fn test_illegal_transitions() {
        use AppointmentStatus::*;
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(InProgress));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!InProgress.can_transition_to(Canceled));
        assert!(!Confirmed.can_transition_to(Pending));

        for terminal in [Completed, Canceled, NoShow] {
            assert!(terminal.is_terminal());
            for next in AppointmentStatus::ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_book_uses_service_price() {
        let service = corte();
        let appointment = Appointment::book(&request(), &service).unwrap();

        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.total_value, service.price);
        assert_eq!(appointment.client_name, "Maria Silva");
        assert_eq!(appointment.client_email, None);
        assert!(!appointment.confirmed_via_whatsapp);
    }

    #[test]
    fn test_book_rejects_unavailable_service() {
        let mut service = corte();
        service.available = false;
        assert!(matches!(
            Appointment::book(&request(), &service),
            Err(CoreError::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn test_book_validates_client() {
        let mut req = request();
        req.client_phone = "123".to_string();
        assert!(Appointment::book(&req, &corte()).is_err());
    }

    #[test]
    fn test_transition_to_walks_happy_path() {
        let mut appointment = Appointment::book(&request(), &corte()).unwrap();
        appointment.transition_to(AppointmentStatus::Confirmed).unwrap();
        appointment.transition_to(AppointmentStatus::InProgress).unwrap();
        appointment.transition_to(AppointmentStatus::Completed).unwrap();

        let err = appointment.cancel().unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidStatusTransition {
                from: AppointmentStatus::Completed,
                to: AppointmentStatus::Canceled
            }
        ));
        assert_eq!(appointment.status, AppointmentStatus::Completed);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("no_show".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::NoShow);
        assert_eq!("Confirmado".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Confirmed);
        assert!("done".parse::<AppointmentStatus>().is_err());

        let json = serde_json::to_string(&AppointmentStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
