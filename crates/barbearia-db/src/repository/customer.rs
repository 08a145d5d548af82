//! # Customer Repository
//!
//! Clothing customers, keyed by their phone digits. Rows are only created by
//! checkout; there is no separate customer form.

use barbearia_core::validation::normalize_phone;
use barbearia_core::{Customer, Money, Sale};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

const DEFAULT_CUSTOMER_NAME: &str = "Cliente";

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    phone: String,
    email: Option<String>,
    purchase_count: i64,
    total_spent_cents: i64,
    last_purchase_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            purchase_count: row.purchase_count,
            total_spent: Money::from_cents(row.total_spent_cents),
            last_purchase_at: row.last_purchase_at,
            created_at: row.created_at,
        }
    }
}

const SELECT_CUSTOMER: &str = r#"
    SELECT id, name, phone, email, purchase_count, total_spent_cents,
           last_purchase_at, created_at
    FROM customers
"#;

/// Adds `sale` to its customer's history, creating the customer on first
/// purchase. Sales without a usable phone are skipped. Returns whether a row
/// was written.
pub(crate) async fn record_purchase(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<bool> {
    let Some(phone) = sale
        .customer_phone
        .as_deref()
        .map(normalize_phone)
        .filter(|p| !p.is_empty())
    else {
        return Ok(false);
    };

    let name = sale
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_CUSTOMER_NAME);

    sqlx::query(
        r#"
        INSERT INTO customers (
            id, name, phone, email, purchase_count, total_spent_cents,
            last_purchase_at, created_at
        ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?6)
        ON CONFLICT (phone) DO UPDATE SET
            name = excluded.name,
            email = COALESCE(excluded.email, customers.email),
            purchase_count = customers.purchase_count + 1,
            total_spent_cents = customers.total_spent_cents + excluded.total_spent_cents,
            last_purchase_at = excluded.last_purchase_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(&phone)
    .bind(&sale.customer_email)
    .bind(sale.total.cents())
    .bind(sale.sold_at)
    .execute(conn)
    .await?;

    debug!(phone = %phone, sale_id = %sale.id, "Customer purchase recorded");
    Ok(true)
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Looks a customer up by phone, in any formatting.
    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!("{SELECT_CUSTOMER} WHERE phone = ?1"))
            .bind(normalize_phone(phone))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Customer::from))
    }

    /// Best customers first.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "{SELECT_CUSTOMER} ORDER BY total_spent_cents DESC, name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }
}
