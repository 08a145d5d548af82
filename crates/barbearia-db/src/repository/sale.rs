//! # Sale Repository
//!
//! Checkout and sale history.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_sale(request, policy)                                           │
//! │                                                                         │
//! │  attempt 1..=3                                                          │
//! │  ┌───────────────────────────────────────────────────────────────────┐  │
//! │  │ BEGIN                                                             │  │
//! │  │  1. load every referenced product (active only)                   │  │
//! │  │  2. snapshot line items, compute totals                           │  │
//! │  │  3. apply_sale_deduction(products, items, policy)                 │  │
//! │  │  4. write changed stock  WHERE version = <read version>           │  │
//! │  │  5. sale_number = VENDA-<timestamp>-<n>                           │  │
//! │  │  6. INSERT sale + sale_items                                      │  │
//! │  │  7. upsert customer by phone                                      │  │
//! │  │ COMMIT                                                            │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ├── Conflict (stale version / locked db) → retry with fresh reads │
//! │       └── any other error → rolled back, returned                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Dropping the transaction without commit rolls everything back, so an
//! early `?` never leaves stock decremented without a sale.

use std::collections::HashMap;

use barbearia_core::sale::{format_sale_number, sale_number_prefix, SaleTotals};
use barbearia_core::stock::apply_sale_deduction;
use barbearia_core::time::Period;
use barbearia_core::{
    CoreError, CoreResult, Money, NewSale, OversellPolicy, PaymentMethod, Product, Sale,
    SaleLineItem, SaleStatus, SizeBucket,
};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{customer, product};
use crate::error::{DbError, DbResult};

/// Checkout attempts before a version conflict is returned to the caller.
pub const MAX_CHECKOUT_ATTEMPTS: u32 = 3;

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    sale_number: String,
    subtotal_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    payment_method: PaymentMethod,
    status: SaleStatus,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    customer_email: Option<String>,
    seller: Option<String>,
    notes: Option<String>,
    sold_at: DateTime<Utc>,
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleLineItem>) -> Sale {
        Sale {
            id: self.id,
            sale_number: self.sale_number,
            items,
            subtotal: Money::from_cents(self.subtotal_cents),
            discount: Money::from_cents(self.discount_cents),
            total: Money::from_cents(self.total_cents),
            payment_method: self.payment_method,
            status: self.status,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_email: self.customer_email,
            seller: self.seller,
            notes: self.notes,
            sold_at: self.sold_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    product_id: String,
    product_name: String,
    category: String,
    size: SizeBucket,
    unit_price_cents: i64,
    unit_cost_cents: i64,
    quantity: i64,
}

impl From<SaleItemRow> for SaleLineItem {
    fn from(row: SaleItemRow) -> Self {
        SaleLineItem {
            product_id: row.product_id,
            product_name: row.product_name,
            category: row.category,
            size: row.size,
            unit_price: Money::from_cents(row.unit_price_cents),
            unit_cost: Money::from_cents(row.unit_cost_cents),
            quantity: row.quantity,
        }
    }
}

const SELECT_SALE: &str = r#"
    SELECT id, sale_number, subtotal_cents, discount_cents, total_cents,
           payment_method, status, customer_name, customer_phone, customer_email,
           seller, notes, sold_at
    FROM sales
"#;

async fn load_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleLineItem>> {
    let rows = sqlx::query_as::<_, SaleItemRow>(
        r#"
        SELECT product_id, product_name, category, size,
               unit_price_cents, unit_cost_cents, quantity
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY position
        "#,
    )
    .bind(sale_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(SaleLineItem::from).collect())
}

/// Next number for a sale at `at`: sales already sharing the timestamp
/// prefix, plus one.
pub(crate) async fn next_sale_number(conn: &mut SqliteConnection, at: DateTime<Utc>) -> DbResult<String> {
    let prefix = sale_number_prefix(at);
    let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE sale_number LIKE ?1")
        .bind(format!("{prefix}-%"))
        .fetch_one(conn)
        .await?;
    Ok(format_sale_number(at, taken + 1))
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, sale_number, subtotal_cents, discount_cents, total_cents,
            payment_method, status, customer_name, customer_phone, customer_email,
            seller, notes, sold_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.sale_number)
    .bind(sale.subtotal.cents())
    .bind(sale.discount.cents())
    .bind(sale.total.cents())
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(&sale.customer_name)
    .bind(&sale.customer_phone)
    .bind(&sale.customer_email)
    .bind(&sale.seller)
    .bind(&sale.notes)
    .bind(sale.sold_at)
    .execute(&mut *conn)
    .await?;

    for (position, item) in sale.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, position, product_id, product_name, category, size,
                unit_price_cents, unit_cost_cents, quantity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&sale.id)
        .bind(position as i64)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(&item.category)
        .bind(item.size)
        .bind(item.unit_price.cents())
        .bind(item.unit_cost.cents())
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale, decrementing stock in the same transaction.
    ///
    /// Version conflicts on the touched products are retried with fresh
    /// reads, up to [`MAX_CHECKOUT_ATTEMPTS`] in total.
    pub async fn record_sale(&self, request: &NewSale, policy: OversellPolicy) -> DbResult<Sale> {
        request.validate()?;

        let mut attempt = 1;
        loop {
            match self.try_record_sale(request, policy).await {
                Err(DbError::Conflict(reason)) if attempt < MAX_CHECKOUT_ATTEMPTS => {
                    warn!(attempt, reason = %reason, "Checkout conflict, retrying");
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn try_record_sale(&self, request: &NewSale, policy: OversellPolicy) -> DbResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let mut products: HashMap<String, Product> = HashMap::new();
        for item in &request.items {
            if products.contains_key(&item.product_id) {
                continue;
            }
            let found = product::fetch_active(&mut tx, &item.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;
            products.insert(found.id.clone(), found);
        }
        let read_versions: HashMap<String, i64> =
            products.values().map(|p| (p.id.clone(), p.version)).collect();

        let items = request
            .items
            .iter()
            .map(|item| {
                let product = products
                    .get(&item.product_id)
                    .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;
                SaleLineItem::from_product(product, item.size, item.quantity, item.unit_price)
            })
            .collect::<CoreResult<Vec<_>>>()?;
        let totals = SaleTotals::compute(&items, request.discount)?;

        let movements = apply_sale_deduction(&mut products, &items, policy)?;
        for movement in movements.iter().filter(|m| m.clamped) {
            warn!(
                product_id = %movement.product_id,
                size = %movement.bucket,
                available = movement.before,
                requested = movement.requested,
                "Oversold size bucket clamped to zero"
            );
        }

        let mut written: Vec<&str> = Vec::new();
        for movement in &movements {
            let id = movement.product_id.as_str();
            if written.contains(&id) {
                continue;
            }
            if let (Some(updated), Some(version)) = (products.get(id), read_versions.get(id)) {
                product::write_stock(&mut tx, updated, *version).await?;
            }
            written.push(id);
        }

        let sold_at = Utc::now();
        let sale_number = next_sale_number(&mut tx, sold_at).await?;
        let sale = Sale::new(sale_number, request, items, totals, sold_at);

        insert_sale(&mut tx, &sale).await?;
        customer::record_purchase(&mut tx, &sale).await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            total = %sale.total,
            items = sale.items.len(),
            payment = %sale.payment_method,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Gets a sale with its line items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, SaleRow>(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let items = load_items(&mut conn, &row.id).await?;
                Ok(Some(row.into_sale(items)))
            }
            None => Ok(None),
        }
    }

    /// Sales inside `period`, newest first, optionally by status.
    pub async fn list(&self, period: Period, status: Option<SaleStatus>) -> DbResult<Vec<Sale>> {
        debug!(from = %period.from, to = %period.to, status = ?status, "Listing sales");

        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_SALE);
        sql.push(" WHERE sold_at >= ")
            .push_bind(period.from)
            .push(" AND sold_at <= ")
            .push_bind(period.to);
        if let Some(status) = status {
            sql.push(" AND status = ").push_bind(status);
        }
        sql.push(" ORDER BY sold_at DESC");

        let mut conn = self.pool.acquire().await?;
        let rows = sql.build_query_as::<SaleRow>().fetch_all(&mut *conn).await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let items = load_items(&mut conn, &row.id).await?;
            sales.push(row.into_sale(items));
        }
        Ok(sales)
    }

    pub async fn list_completed_in(&self, period: Period) -> DbResult<Vec<Sale>> {
        self.list(period, Some(SaleStatus::Completed)).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
