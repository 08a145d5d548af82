//! # Professional Repository
//!
//! Barbers and their profiles. Specialties are stored as a JSON array.

use barbearia_core::{Professional, ProfessionalInput};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{decode_list, encode_list};
use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct ProfessionalRow {
    id: String,
    full_name: String,
    phone: Option<String>,
    email: Option<String>,
    specialties: String,
    bio: Option<String>,
    years_experience: i64,
    rating: Option<f64>,
    active: bool,
    created_at: DateTime<Utc>,
}

impl ProfessionalRow {
    fn into_professional(self) -> DbResult<Professional> {
        Ok(Professional {
            id: self.id,
            full_name: self.full_name,
            phone: self.phone,
            email: self.email,
            specialties: decode_list(&self.specialties)?,
            bio: self.bio,
            years_experience: self.years_experience,
            rating: self.rating,
            active: self.active,
            created_at: self.created_at,
        })
    }
}

const SELECT_PROFESSIONAL: &str = r#"
    SELECT id, full_name, phone, email, specialties, bio,
           years_experience, rating, active, created_at
    FROM professionals
"#;

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Professional>> {
    sqlx::query_as::<_, ProfessionalRow>(&format!("{SELECT_PROFESSIONAL} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .map(ProfessionalRow::into_professional)
        .transpose()
}

#[derive(Debug, Clone)]
pub struct ProfessionalRepository {
    pool: SqlitePool,
}

impl ProfessionalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProfessionalRepository { pool }
    }

    /// Lists professionals by name; inactive ones only when asked.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Professional>> {
        let sql = if include_inactive {
            format!("{SELECT_PROFESSIONAL} ORDER BY full_name")
        } else {
            format!("{SELECT_PROFESSIONAL} WHERE active = 1 ORDER BY full_name")
        };

        sqlx::query_as::<_, ProfessionalRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ProfessionalRow::into_professional)
            .collect()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Professional>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn create(&self, input: &ProfessionalInput) -> DbResult<Professional> {
        let professional = input.build()?;
        self.insert(&professional).await?;
        Ok(professional)
    }

    pub async fn insert(&self, professional: &Professional) -> DbResult<()> {
        debug!(id = %professional.id, name = %professional.full_name, "Inserting professional");

        sqlx::query(
            r#"
            INSERT INTO professionals (
                id, full_name, phone, email, specialties, bio,
                years_experience, rating, active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&professional.id)
        .bind(&professional.full_name)
        .bind(&professional.phone)
        .bind(&professional.email)
        .bind(encode_list(&professional.specialties)?)
        .bind(&professional.bio)
        .bind(professional.years_experience)
        .bind(professional.rating)
        .bind(professional.active)
        .bind(professional.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(&self, id: &str, input: &ProfessionalInput) -> DbResult<Professional> {
        let mut professional = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Professional", id))?;
        input.apply_to(&mut professional)?;

        debug!(id = %id, "Updating professional");

        sqlx::query(
            r#"
            UPDATE professionals SET
                full_name = ?2,
                phone = ?3,
                email = ?4,
                specialties = ?5,
                bio = ?6,
                years_experience = ?7,
                rating = ?8,
                active = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&professional.id)
        .bind(&professional.full_name)
        .bind(&professional.phone)
        .bind(&professional.email)
        .bind(encode_list(&professional.specialties)?)
        .bind(&professional.bio)
        .bind(professional.years_experience)
        .bind(professional.rating)
        .bind(professional.active)
        .execute(&self.pool)
        .await?;

        Ok(professional)
    }

    /// Counts active professionals.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM professionals WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
