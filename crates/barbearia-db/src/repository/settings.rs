//! # Shop Settings Repository
//!
//! The single `shop_settings` row (id = 1). The migration inserts it, so
//! reads never come back empty on a migrated database.

use barbearia_core::{ShopSettings, ShopSettingsInput};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    name: String,
    phone: Option<String>,
    address: Option<String>,
    opening_hours: Option<String>,
    open: bool,
    active: bool,
    updated_at: DateTime<Utc>,
}

impl From<SettingsRow> for ShopSettings {
    fn from(row: SettingsRow) -> Self {
        ShopSettings {
            name: row.name,
            phone: row.phone,
            address: row.address,
            opening_hours: row.opening_hours,
            open: row.open,
            active: row.active,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_SETTINGS: &str = r#"
    SELECT name, phone, address, opening_hours, open, active, updated_at
    FROM shop_settings
    WHERE id = 1
"#;

/// Loads the settings on an existing connection (used inside transactions).
pub(crate) async fn fetch(conn: &mut SqliteConnection) -> DbResult<ShopSettings> {
    sqlx::query_as::<_, SettingsRow>(SELECT_SETTINGS)
        .fetch_optional(conn)
        .await?
        .map(ShopSettings::from)
        .ok_or_else(|| DbError::not_found("ShopSettings", "1"))
}

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self) -> DbResult<ShopSettings> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn).await
    }

    /// Applies an edit from the admin area and returns the stored settings.
    pub async fn update(&self, input: &ShopSettingsInput) -> DbResult<ShopSettings> {
        let mut settings = self.get().await?;
        input.apply_to(&mut settings)?;

        debug!(name = %settings.name, "Updating shop settings");

        self.save(&settings).await?;
        Ok(settings)
    }

    /// Flips the open/closed switch and returns the new settings.
    pub async fn toggle_open(&self) -> DbResult<ShopSettings> {
        let mut settings = self.get().await?;
        let open = settings.toggle_open();
        self.save(&settings).await?;

        info!(open, "Shop open state toggled");
        Ok(settings)
    }

    async fn save(&self, settings: &ShopSettings) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE shop_settings SET
                name = ?1,
                phone = ?2,
                address = ?3,
                opening_hours = ?4,
                open = ?5,
                active = ?6,
                updated_at = ?7
            WHERE id = 1
            "#,
        )
        .bind(&settings.name)
        .bind(&settings.phone)
        .bind(&settings.address)
        .bind(&settings.opening_hours)
        .bind(settings.open)
        .bind(settings.active)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
