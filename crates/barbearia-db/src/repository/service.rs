//! # Service Repository
//!
//! The barbershop's catalog: CRUD, search and autocomplete.
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQL narrows:   available = 1 (unless all)  AND  category = ?          │
//! │                 ORDER BY featured DESC, name                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Rust filters:  Service::matches_term(term)                             │
//! │                 (substring on name/description/category, exact tag)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Tags live in a JSON column, so exact tag matching happens after decoding.

use barbearia_core::{
    CoreError, Service, ServiceInput, QUICK_SEARCH_LIMIT, QUICK_SEARCH_MIN_CHARS,
};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::{decode_list, encode_list, settings};
use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: String,
    name: String,
    description: Option<String>,
    price_cents: i64,
    category: String,
    available: bool,
    featured: bool,
    duration_minutes: i64,
    tags: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceRow {
    fn into_service(self) -> DbResult<Service> {
        Ok(Service {
            id: self.id,
            name: self.name,
            description: self.description,
            price: barbearia_core::Money::from_cents(self.price_cents),
            category: self.category,
            available: self.available,
            featured: self.featured,
            duration_minutes: self.duration_minutes,
            tags: decode_list(&self.tags)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_SERVICE: &str = r#"
    SELECT id, name, description, price_cents, category, available, featured,
           duration_minutes, tags, created_at, updated_at
    FROM services
"#;

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Service>> {
    sqlx::query_as::<_, ServiceRow>(&format!("{SELECT_SERVICE} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .map(ServiceRow::into_service)
        .transpose()
}

/// Catalog search parameters.
#[derive(Debug, Clone)]
pub struct ServiceQuery {
    pub term: Option<String>,
    pub category: Option<String>,
    /// Restrict to bookable services. Public listings always set this.
    pub only_available: bool,
}

impl Default for ServiceQuery {
    fn default() -> Self {
        ServiceQuery {
            term: None,
            category: None,
            only_available: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    /// Searches the catalog, featured services first.
    ///
    /// Listing available services fails with `ShopClosed` while the shop is
    /// not operating; the admin listing (`only_available = false`) always
    /// works.
    pub async fn search(&self, query: &ServiceQuery) -> DbResult<Vec<Service>> {
        debug!(term = ?query.term, category = ?query.category, "Searching services");

        if query.only_available {
            let mut conn = self.pool.acquire().await?;
            if !settings::fetch(&mut conn).await?.is_operating() {
                return Err(CoreError::ShopClosed.into());
            }
        }

        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_SERVICE);
        sql.push(" WHERE 1 = 1");
        if query.only_available {
            sql.push(" AND available = 1");
        }
        if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            sql.push(" AND category = ").push_bind(category.to_string());
        }
        sql.push(" ORDER BY featured DESC, name");

        let term = query.term.as_deref().unwrap_or("");
        let services = sql
            .build_query_as::<ServiceRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ServiceRow::into_service)
            .collect::<DbResult<Vec<_>>>()?
            .into_iter()
            .filter(|service| service.matches_term(term))
            .collect::<Vec<_>>();

        debug!(count = services.len(), "Service search returned");
        Ok(services)
    }

    /// Autocomplete over available services.
    ///
    /// Terms shorter than two characters return nothing.
    pub async fn quick_search(&self, term: &str) -> DbResult<Vec<Service>> {
        let term = term.trim();
        if term.chars().count() < QUICK_SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }

        let mut services = self
            .search(&ServiceQuery {
                term: Some(term.to_string()),
                ..ServiceQuery::default()
            })
            .await?;
        services.truncate(QUICK_SEARCH_LIMIT);
        Ok(services)
    }

    /// Distinct categories of available services, sorted.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM services WHERE available = 1 ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Service>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn create(&self, input: &ServiceInput) -> DbResult<Service> {
        let service = input.build()?;
        self.insert(&service).await?;
        Ok(service)
    }

    pub async fn insert(&self, service: &Service) -> DbResult<()> {
        debug!(id = %service.id, name = %service.name, "Inserting service");

        sqlx::query(
            r#"
            INSERT INTO services (
                id, name, description, price_cents, category, available,
                featured, duration_minutes, tags, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price.cents())
        .bind(&service.category)
        .bind(service.available)
        .bind(service.featured)
        .bind(service.duration_minutes)
        .bind(encode_list(&service.tags)?)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(&self, id: &str, input: &ServiceInput) -> DbResult<Service> {
        let mut service = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Service", id))?;
        input.apply_to(&mut service)?;

        debug!(id = %id, "Updating service");

        sqlx::query(
            r#"
            UPDATE services SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                category = ?5,
                available = ?6,
                featured = ?7,
                duration_minutes = ?8,
                tags = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price.cents())
        .bind(&service.category)
        .bind(service.available)
        .bind(service.featured)
        .bind(service.duration_minutes)
        .bind(encode_list(&service.tags)?)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(service)
    }

    /// Deletes a service. Fails with a foreign key violation while
    /// appointments still reference it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting service");

        let result = sqlx::query("DELETE FROM services WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::test_support::db;
    use barbearia_core::Money;

    pub(crate) fn input(name: &str, category: &str, price: i64) -> ServiceInput {
        ServiceInput {
            name: name.to_string(),
            description: None,
            price: Money::from_cents(price),
            category: category.to_string(),
            available: true,
            featured: false,
            duration_minutes: 30,
            tags: Vec::new(),
        }
    }

    async fn seeded() -> crate::Database {
        let db = db().await;
        let repo = db.services();

        let mut corte = input("Corte Masculino", "Cabelo", 3500);
        corte.tags = vec!["degradê".to_string()];
        repo.create(&corte).await.unwrap();

        let mut barba = input("Barba Completa", "Barba", 2500);
        barba.featured = true;
        barba.description = Some("Toalha quente e navalha".to_string());
        repo.create(&barba).await.unwrap();

        let mut pigmentacao = input("Pigmentação", "Cabelo", 4000);
        pigmentacao.available = false;
        repo.create(&pigmentacao).await.unwrap();

        db
    }

    fn names(services: &[Service]) -> Vec<&str> {
        services.iter().map(|s| s.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_search_orders_featured_first() {
        let db = seeded().await;
        let all = db.services().search(&ServiceQuery::default()).await.unwrap();
        assert_eq!(names(&all), vec!["Barba Completa", "Corte Masculino"]);

        let admin = db
            .services()
            .search(&ServiceQuery {
                only_available: false,
                ..ServiceQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(admin.len(), 3);
    }

    #[tokio::test]
    async fn test_search_by_term_category_and_tag() {
        let db = seeded().await;
        let repo = db.services();

        let by_description = repo
            .search(&ServiceQuery {
                term: Some("NAVALHA".to_string()),
                ..ServiceQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(names(&by_description), vec!["Barba Completa"]);

        let by_tag = repo
            .search(&ServiceQuery {
                term: Some("degradê".to_string()),
                ..ServiceQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(names(&by_tag), vec!["Corte Masculino"]);

        let by_category = repo
            .search(&ServiceQuery {
                category: Some("Cabelo".to_string()),
                ..ServiceQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(names(&by_category), vec!["Corte Masculino"]);
    }

    #[tokio::test]
    async fn test_quick_search_needs_two_chars() {
        let db = seeded().await;
        assert!(db.services().quick_search("c").await.unwrap().is_empty());
        assert_eq!(db.services().quick_search("co").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_categories_only_available() {
        let db = seeded().await;
        assert_eq!(db.services().categories().await.unwrap(), vec!["Barba", "Cabelo"]);
    }

    #[tokio::test]
    async fn test_closed_shop_refuses_public_listing() {
        let db = seeded().await;
        db.settings().toggle_open().await.unwrap();

        let err = db.services().search(&ServiceQuery::default()).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ShopClosed)));

        let admin = ServiceQuery {
            only_available: false,
            ..ServiceQuery::default()
        };
        assert_eq!(db.services().search(&admin).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = seeded().await;
        let repo = db.services();
        let service = repo.create(&input("Sobrancelha", "Estética", 1500)).await.unwrap();

        let mut edit = input("Sobrancelha na Navalha", "Estética", 1800);
        edit.duration_minutes = 15;
        let updated = repo.update(&service.id, &edit).await.unwrap();
        assert_eq!(updated.price.cents(), 1800);

        let stored = repo.get_by_id(&service.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Sobrancelha na Navalha");
        assert_eq!(stored.duration_minutes, 15);

        repo.delete(&service.id).await.unwrap();
        assert!(repo.delete(&service.id).await.unwrap_err().is_not_found());
        assert_eq!(repo.count().await.unwrap(), 3);
    }
}
