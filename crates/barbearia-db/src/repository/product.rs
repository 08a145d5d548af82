//! # Product Repository
//!
//! Clothing inventory with per-size stock counters.
//!
//! ## Optimistic Concurrency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  read product (version = 7)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET ..., version = 8                                   │
//! │  WHERE id = ? AND version = 7                                           │
//! │       │                                                                 │
//! │       ├── 1 row  → written                                              │
//! │       └── 0 rows → someone else wrote first → DbError::Conflict         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! `total_stock` is recomputed from the buckets on every write; the table's
//! CHECK constraint rejects anything else.

use barbearia_core::{CoreError, Money, Product, ProductInput, StockCounts};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::{decode_list, encode_list};
use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    category: String,
    price_cents: i64,
    cost_price_cents: i64,
    stock_pp: i64,
    stock_p: i64,
    stock_m: i64,
    stock_g: i64,
    stock_gg: i64,
    minimum_stock: i64,
    brand: Option<String>,
    color: Option<String>,
    material: Option<String>,
    tags: String,
    active: bool,
    featured: bool,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> DbResult<Product> {
        Ok(Product {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            price: Money::from_cents(self.price_cents),
            cost_price: Money::from_cents(self.cost_price_cents),
            stock: StockCounts {
                pp: self.stock_pp,
                p: self.stock_p,
                m: self.stock_m,
                g: self.stock_g,
                gg: self.stock_gg,
            },
            minimum_stock: self.minimum_stock,
            brand: self.brand,
            color: self.color,
            material: self.material,
            tags: decode_list(&self.tags)?,
            active: self.active,
            featured: self.featured,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT id, name, description, category, price_cents, cost_price_cents,
           stock_pp, stock_p, stock_m, stock_g, stock_gg, minimum_stock,
           brand, color, material, tags, active, featured, version,
           created_at, updated_at
    FROM products
"#;

fn collect(rows: Vec<ProductRow>) -> DbResult<Vec<Product>> {
    rows.into_iter().map(ProductRow::into_product).collect()
}

/// An active product by id, on the caller's connection.
pub(crate) async fn fetch_active(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE id = ?1 AND active = 1"))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .map(ProductRow::into_product)
        .transpose()
}

/// Writes the stock counters of `product`, expecting `expected_version` in
/// the row. Bumps the version.
pub(crate) async fn write_stock(
    conn: &mut SqliteConnection,
    product: &Product,
    expected_version: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products SET
            stock_pp = ?3,
            stock_p = ?4,
            stock_m = ?5,
            stock_g = ?6,
            stock_gg = ?7,
            total_stock = ?8,
            version = version + 1,
            updated_at = ?9
        WHERE id = ?1 AND version = ?2
        "#,
    )
    .bind(&product.id)
    .bind(expected_version)
    .bind(product.stock.pp)
    .bind(product.stock.p)
    .bind(product.stock.m)
    .bind(product.stock.g)
    .bind(product.stock.gg)
    .bind(product.total_stock())
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::Conflict(format!(
            "product {} changed since it was read (version {})",
            product.id, expected_version
        )));
    }
    Ok(())
}

/// Inventory search parameters.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Case-insensitive match on name or brand.
    pub term: Option<String>,
    pub category: Option<String>,
    pub low_stock_only: bool,
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    pub async fn create(&self, input: &ProductInput) -> DbResult<Product> {
        let product = input.build()?;
        self.insert(&product).await?;
        Ok(product)
    }

    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, category, price_cents, cost_price_cents,
                stock_pp, stock_p, stock_m, stock_g, stock_gg, total_stock, minimum_stock,
                brand, color, material, tags, active, featured, version,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20,
                ?21, ?22
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price.cents())
        .bind(product.cost_price.cents())
        .bind(product.stock.pp)
        .bind(product.stock.p)
        .bind(product.stock.m)
        .bind(product.stock.g)
        .bind(product.stock.gg)
        .bind(product.total_stock())
        .bind(product.minimum_stock)
        .bind(&product.brand)
        .bind(&product.color)
        .bind(&product.material)
        .bind(encode_list(&product.tags)?)
        .bind(product.active)
        .bind(product.featured)
        .bind(product.version)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ProductRow::into_product)
            .transpose()
    }

    pub async fn exists_by_name(&self, name: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE name = ?1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Applies an edit, guarded by the version the edit was based on.
    ///
    /// Fails with `Conflict` when the row moved on in between (e.g. a sale
    /// decremented stock).
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        let mut product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        let expected_version = product.version;
        input.apply_to(&mut product)?;
        product.version = expected_version + 1;

        debug!(id = %id, version = product.version, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?3,
                description = ?4,
                category = ?5,
                price_cents = ?6,
                cost_price_cents = ?7,
                stock_pp = ?8,
                stock_p = ?9,
                stock_m = ?10,
                stock_g = ?11,
                stock_gg = ?12,
                total_stock = ?13,
                minimum_stock = ?14,
                brand = ?15,
                color = ?16,
                material = ?17,
                tags = ?18,
                active = ?19,
                featured = ?20,
                version = ?21,
                updated_at = ?22
            WHERE id = ?1 AND version = ?2
            "#,
        )
        .bind(&product.id)
        .bind(expected_version)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price.cents())
        .bind(product.cost_price.cents())
        .bind(product.stock.pp)
        .bind(product.stock.p)
        .bind(product.stock.m)
        .bind(product.stock.g)
        .bind(product.stock.gg)
        .bind(product.total_stock())
        .bind(product.minimum_stock)
        .bind(&product.brand)
        .bind(&product.color)
        .bind(&product.material)
        .bind(encode_list(&product.tags)?)
        .bind(product.active)
        .bind(product.featured)
        .bind(product.version)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::Conflict(format!(
                "product {id} was modified concurrently"
            )));
        }

        Ok(product)
    }

    /// Marks a product inactive. Sale history keeps its snapshots.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET active = 0, version = version + 1, updated_at = ?2 WHERE id = ?1 AND active = 1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        debug!(id = %id, "Product deactivated");
        Ok(())
    }

    /// Searches active products by name.
    pub async fn search(&self, query: &ProductQuery) -> DbResult<Vec<Product>> {
        debug!(term = ?query.term, category = ?query.category, low_stock = query.low_stock_only, "Searching products");

        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_PRODUCT);
        sql.push(" WHERE active = 1");

        if let Some(term) = query.term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", term.to_lowercase());
            sql.push(" AND (LOWER(name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(COALESCE(brand, '')) LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            sql.push(" AND category = ").push_bind(category.to_string());
        }
        if query.low_stock_only {
            sql.push(" AND total_stock <= minimum_stock");
        }
        sql.push(" ORDER BY name");

        collect(sql.build_query_as::<ProductRow>().fetch_all(&self.pool).await?)
    }

    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        self.search(&ProductQuery::default()).await
    }

    /// Active products at or below their minimum stock.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        self.search(&ProductQuery {
            low_stock_only: true,
            ..ProductQuery::default()
        })
        .await
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
