//! # Appointment Repository
//!
//! Booking, status changes and history.
//!
//! ## Booking Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   ├── shop operating?            no  → ShopClosed                       │
//! │   ├── service exists/available?  no  → ServiceNotFound / Unavailable    │
//! │   ├── professional active?       no  → ProfessionalNotFound / Inactive  │
//! │   ├── slot at (prof, date, time)                                        │
//! │   │     none      → book without a slot                                 │
//! │   │     taken     → SlotUnavailable                                     │
//! │   │     free      → mark taken                                          │
//! │   └── INSERT appointment (pending, total = service price)               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Cancelling frees the slot again in the same transaction as the status
//! change.

use barbearia_core::stats::AppointmentCounts;
use barbearia_core::{Appointment, AppointmentStatus, CoreError, Money, NewAppointment};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{professional, service, settings, slot};
use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: String,
    client_name: String,
    client_phone: String,
    client_email: Option<String>,
    service_id: String,
    professional_id: String,
    date: NaiveDate,
    time: NaiveTime,
    status: AppointmentStatus,
    notes: Option<String>,
    total_value_cents: i64,
    confirmed_via_whatsapp: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Appointment {
            id: row.id,
            client_name: row.client_name,
            client_phone: row.client_phone,
            client_email: row.client_email,
            service_id: row.service_id,
            professional_id: row.professional_id,
            date: row.date,
            time: row.time,
            status: row.status,
            notes: row.notes,
            total_value: Money::from_cents(row.total_value_cents),
            confirmed_via_whatsapp: row.confirmed_via_whatsapp,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_APPOINTMENT: &str = r#"
    SELECT id, client_name, client_phone, client_email, service_id, professional_id,
           date, time, status, notes, total_value_cents, confirmed_via_whatsapp,
           created_at, updated_at
    FROM appointments
"#;

async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Appointment>> {
    let row = sqlx::query_as::<_, AppointmentRow>(&format!("{SELECT_APPOINTMENT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(Appointment::from))
}

/// History filter. Everything optional; `limit` caps the newest rows.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub date: Option<NaiveDate>,
    pub service_id: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct AppointmentRepository {
    pool: SqlitePool,
}

impl AppointmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AppointmentRepository { pool }
    }

    /// Books an appointment, claiming the matching slot when one exists.
    pub async fn book(&self, request: &NewAppointment) -> DbResult<Appointment> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        if !settings::fetch(&mut tx).await?.is_operating() {
            return Err(CoreError::ShopClosed.into());
        }

        let service = service::fetch(&mut tx, &request.service_id)
            .await?
            .ok_or_else(|| CoreError::ServiceNotFound(request.service_id.clone()))?;

        let professional = professional::fetch(&mut tx, &request.professional_id)
            .await?
            .ok_or_else(|| CoreError::ProfessionalNotFound(request.professional_id.clone()))?;
        if !professional.active {
            return Err(CoreError::ProfessionalInactive(professional.id).into());
        }

        let appointment = Appointment::book(request, &service)?;

        if let Some(existing) = slot::fetch_at(&mut tx, &professional.id, request.date, request.time).await? {
            if !existing.available {
                return Err(CoreError::SlotUnavailable {
                    professional_id: professional.id,
                    date: request.date.to_string(),
                    time: barbearia_core::time::format_hhmm(request.time),
                }
                .into());
            }
            slot::set_available_at(&mut tx, &professional.id, request.date, request.time, false).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO appointments (
                id, client_name, client_phone, client_email, service_id, professional_id,
                date, time, status, notes, total_value_cents, confirmed_via_whatsapp,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&appointment.id)
        .bind(&appointment.client_name)
        .bind(&appointment.client_phone)
        .bind(&appointment.client_email)
        .bind(&appointment.service_id)
        .bind(&appointment.professional_id)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(appointment.status)
        .bind(&appointment.notes)
        .bind(appointment.total_value.cents())
        .bind(appointment.confirmed_via_whatsapp)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            appointment_id = %appointment.id,
            service = %service.name,
            professional = %professional.full_name,
            date = %appointment.date,
            time = %appointment.time,
            "Appointment booked"
        );
        Ok(appointment)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Appointment>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// History, newest date first, then by time of day.
    pub async fn list(&self, filter: &AppointmentFilter) -> DbResult<Vec<Appointment>> {
        debug!(date = ?filter.date, service_id = ?filter.service_id, "Listing appointments");

        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_APPOINTMENT);
        sql.push(" WHERE 1 = 1");
        if let Some(date) = filter.date {
            sql.push(" AND date = ").push_bind(date);
        }
        if let Some(service_id) = filter.service_id.as_deref().filter(|s| !s.is_empty()) {
            sql.push(" AND service_id = ").push_bind(service_id.to_string());
        }
        sql.push(" ORDER BY date DESC, time");
        if let Some(limit) = filter.limit {
            sql.push(" LIMIT ").push_bind(limit.max(0));
        }

        let rows = sql.build_query_as::<AppointmentRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    /// The most recently created appointments.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "{SELECT_APPOINTMENT} ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    /// Moves an appointment along the status graph.
    ///
    /// Illegal moves fail with `InvalidStatusTransition` and change nothing.
    /// A move to `canceled` frees the booked slot.
    pub async fn update_status(&self, id: &str, next: AppointmentStatus) -> DbResult<Appointment> {
        let mut tx = self.pool.begin().await?;

        let mut appointment = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::AppointmentNotFound(id.to_string()))?;
        let previous = appointment.status;
        appointment.transition_to(next)?;

        sqlx::query("UPDATE appointments SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&appointment.id)
            .bind(appointment.status)
            .bind(appointment.updated_at)
            .execute(&mut *tx)
            .await?;

        if next == AppointmentStatus::Canceled {
            let released = slot::set_available_at(
                &mut tx,
                &appointment.professional_id,
                appointment.date,
                appointment.time,
                true,
            )
            .await?;
            debug!(appointment_id = %id, released, "Slot release on cancel");
        }

        tx.commit().await?;

        info!(appointment_id = %id, from = %previous, to = %next, "Appointment status changed");
        Ok(appointment)
    }

    pub async fn cancel(&self, id: &str) -> DbResult<Appointment> {
        self.update_status(id, AppointmentStatus::Canceled).await
    }

    /// Records that the WhatsApp confirmation went out.
    pub async fn mark_confirmed_via_whatsapp(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE appointments SET confirmed_via_whatsapp = 1, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::AppointmentNotFound(id.to_string()).into());
        }
        Ok(())
    }

    /// Totals for the dashboard cards.
    pub async fn counts(&self) -> DbResult<AppointmentCounts> {
        let rows: Vec<(AppointmentStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM appointments GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = AppointmentCounts::default();
        for (status, count) in rows {
            counts.total += count;
            match status {
                AppointmentStatus::Pending => counts.pending = count,
                AppointmentStatus::Confirmed => counts.confirmed = count,
                AppointmentStatus::Completed => counts.completed = count,
                _ => {}
            }
        }
        Ok(counts)
    }
}
