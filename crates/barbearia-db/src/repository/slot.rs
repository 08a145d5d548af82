//! # Time Slot Repository
//!
//! Persists the output of the slot generator and serves availability.
//!
//! ## Batch Semantics
//! ```text
//! generate_slots(08:00..10:00, 30) → [08:00, 08:30, 09:00, 09:30]
//!                                        │      │      │      │
//!                           INSERT ... ON CONFLICT DO NOTHING, one by one
//!                                        │      │      │      │
//!                                      new   exists   new    new
//!                                        │             │      │
//!                             returned:  ▼             ▼      ▼
//! ```
//! Each slot is its own statement. A failure halfway keeps the slots written
//! before it; existing `(professional, date, start)` rows are skipped.

use barbearia_core::TimeSlot;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct SlotRow {
    id: String,
    professional_id: String,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    available: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SlotRow> for TimeSlot {
    fn from(row: SlotRow) -> Self {
        TimeSlot {
            id: row.id,
            professional_id: row.professional_id,
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            available: row.available,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

const SELECT_SLOT: &str = r#"
    SELECT id, professional_id, date, start_time, end_time, available, notes, created_at
    FROM time_slots
"#;

/// The slot starting at `time` for a professional and day, if any.
pub(crate) async fn fetch_at(
    conn: &mut SqliteConnection,
    professional_id: &str,
    date: NaiveDate,
    time: NaiveTime,
) -> DbResult<Option<TimeSlot>> {
    let slot = sqlx::query_as::<_, SlotRow>(&format!(
        "{SELECT_SLOT} WHERE professional_id = ?1 AND date = ?2 AND start_time = ?3"
    ))
    .bind(professional_id)
    .bind(date)
    .bind(time)
    .fetch_optional(conn)
    .await?;

    Ok(slot.map(TimeSlot::from))
}

/// Sets availability on the slot starting at `time`. Returns whether a slot
/// existed.
pub(crate) async fn set_available_at(
    conn: &mut SqliteConnection,
    professional_id: &str,
    date: NaiveDate,
    time: NaiveTime,
    available: bool,
) -> DbResult<bool> {
    let result = sqlx::query(
        "UPDATE time_slots SET available = ?4 WHERE professional_id = ?1 AND date = ?2 AND start_time = ?3",
    )
    .bind(professional_id)
    .bind(date)
    .bind(time)
    .bind(available)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone)]
pub struct SlotRepository {
    pool: SqlitePool,
}

impl SlotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SlotRepository { pool }
    }

    /// Persists generated slots one at a time and returns those actually
    /// created.
    pub async fn create_many(&self, slots: &[TimeSlot]) -> DbResult<Vec<TimeSlot>> {
        let mut created = Vec::with_capacity(slots.len());

        for slot in slots {
            let result = sqlx::query(
                r#"
                INSERT INTO time_slots (
                    id, professional_id, date, start_time, end_time, available, notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT (professional_id, date, start_time) DO NOTHING
                "#,
            )
            .bind(&slot.id)
            .bind(&slot.professional_id)
            .bind(slot.date)
            .bind(slot.start_time)
            .bind(slot.end_time)
            .bind(slot.available)
            .bind(&slot.notes)
            .bind(slot.created_at)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() > 0 {
                created.push(slot.clone());
            } else {
                debug!(
                    professional_id = %slot.professional_id,
                    date = %slot.date,
                    start = %slot.start_time,
                    "Slot already exists, skipped"
                );
            }
        }

        info!(
            requested = slots.len(),
            created = created.len(),
            "Time slots persisted"
        );
        Ok(created)
    }

    /// A professional's bookable slots for one day, by start time.
    pub async fn list_available(&self, professional_id: &str, date: NaiveDate) -> DbResult<Vec<TimeSlot>> {
        let rows = sqlx::query_as::<_, SlotRow>(&format!(
            "{SELECT_SLOT} WHERE professional_id = ?1 AND date = ?2 AND available = 1 ORDER BY start_time"
        ))
        .bind(professional_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TimeSlot::from).collect())
    }

    /// Every slot of a professional for one day, taken or not.
    pub async fn list_for_professional(&self, professional_id: &str, date: NaiveDate) -> DbResult<Vec<TimeSlot>> {
        let rows = sqlx::query_as::<_, SlotRow>(&format!(
            "{SELECT_SLOT} WHERE professional_id = ?1 AND date = ?2 ORDER BY start_time"
        ))
        .bind(professional_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TimeSlot::from).collect())
    }

    /// Every slot on `date`, across professionals.
    pub async fn list_for_date(&self, date: NaiveDate) -> DbResult<Vec<TimeSlot>> {
        let rows = sqlx::query_as::<_, SlotRow>(&format!(
            "{SELECT_SLOT} WHERE date = ?1 ORDER BY start_time, professional_id"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TimeSlot::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TimeSlot>> {
        let row = sqlx::query_as::<_, SlotRow>(&format!("{SELECT_SLOT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(TimeSlot::from))
    }

    /// Flips availability in one statement and returns the updated slot.
    pub async fn toggle(&self, id: &str) -> DbResult<TimeSlot> {
        let row = sqlx::query_as::<_, SlotRow>(
            r#"
            UPDATE time_slots SET available = NOT available
            WHERE id = ?1
            RETURNING id, professional_id, date, start_time, end_time, available, notes, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("TimeSlot", id))?;

        debug!(id = %id, available = row.available, "Slot availability toggled");
        Ok(row.into())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM time_slots WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("TimeSlot", id));
        }

        debug!(id = %id, "Slot deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::professional::tests::input as professional_input;
    use crate::repository::test_support::db;
    use barbearia_core::slots::generate_slots;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn test_create_many_skips_existing() {
        let db = db().await;
        let professional = db.professionals().create(&professional_input("Carlos")).await.unwrap();

        let morning = generate_slots(&professional.id, day(), t(8, 0), t(9, 0), 30, None).unwrap();
        assert_eq!(db.slots().create_many(&morning).await.unwrap().len(), 2);

        let wider = generate_slots(&professional.id, day(), t(8, 0), t(10, 0), 30, None).unwrap();
        let created = db.slots().create_many(&wider).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].start_time, t(9, 0));

        let all = db.slots().list_for_professional(&professional.id, day()).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_professional_fails_on_first_slot() {
        let db = db().await;
        let slots = generate_slots("ghost", day(), t(8, 0), t(9, 0), 30, None).unwrap();
        assert!(matches!(
            db.slots().create_many(&slots).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_batch_keeps_earlier_slots() {
        let db = db().await;
        let professional = db.professionals().create(&professional_input("Carlos")).await.unwrap();
        let slots = generate_slots(&professional.id, day(), t(8, 0), t(10, 0), 30, None).unwrap();

        let taken = &slots[2];
        sqlx::query(
            "INSERT INTO time_slots (id, professional_id, date, start_time, end_time, available, notes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, 1, NULL, ?6)",
        )
        .bind(&taken.id)
        .bind(&professional.id)
        .bind(day().succ_opt().unwrap())
        .bind(t(14, 0))
        .bind(t(14, 30))
        .bind(taken.created_at)
        .execute(db.pool())
        .await
        .unwrap();

        assert!(db.slots().create_many(&slots).await.is_err());

        let kept = db.slots().list_for_professional(&professional.id, day()).await.unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0], slots[0]);
        assert_eq!(kept[1], slots[1]);
    }

    #[tokio::test]
    async fn test_toggle_unknown_slot() {
        let db = db().await;
        assert!(db.slots().toggle("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_toggle_twice_and_available_listing() {
        let db = db().await;
        let professional = db.professionals().create(&professional_input("Carlos")).await.unwrap();
        let slots = generate_slots(&professional.id, day(), t(8, 0), t(9, 30), 30, Some("manhã")).unwrap();
        db.slots().create_many(&slots).await.unwrap();

        let first = &slots[0];
        assert!(!db.slots().toggle(&first.id).await.unwrap().available);

        let available = db.slots().list_available(&professional.id, day()).await.unwrap();
        assert_eq!(available.len(), 2);
        assert_eq!(available[0].start_time, t(8, 30));
        assert_eq!(available[0].notes.as_deref(), Some("manhã"));

        assert!(db.slots().toggle(&first.id).await.unwrap().available);
        let restored = db.slots().get_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(&restored, first);
    }

    #[tokio::test]
    async fn test_delete_and_list_for_date() {
        let db = db().await;
        let a = db.professionals().create(&professional_input("Ana")).await.unwrap();
        let b = db.professionals().create(&professional_input("Bruno")).await.unwrap();
        for id in [&a.id, &b.id] {
            let slots = generate_slots(id, day(), t(8, 0), t(9, 0), 60, None).unwrap();
            db.slots().create_many(&slots).await.unwrap();
        }

        let on_day = db.slots().list_for_date(day()).await.unwrap();
        assert_eq!(on_day.len(), 2);

        db.slots().delete(&on_day[0].id).await.unwrap();
        assert!(db.slots().delete(&on_day[0].id).await.unwrap_err().is_not_found());
        assert_eq!(db.slots().list_for_date(day()).await.unwrap().len(), 1);
    }
}
