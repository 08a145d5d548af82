//! # Report Repository
//!
//! Read-only aggregates for the admin dashboard. The queries fetch plain
//! rows; the arithmetic lives in `barbearia_core::stats`.

use barbearia_core::stats::{DashboardSummary, InventoryOverview, SalesStats};
use barbearia_core::time::Period;
use barbearia_core::validation::validate_period_days;
use barbearia_core::{Money, ProductView, RECENT_APPOINTMENTS_LIMIT};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::appointment::AppointmentRepository;
use super::product::ProductRepository;
use super::professional::ProfessionalRepository;
use super::sale::SaleRepository;
use super::service::ServiceRepository;
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Cards and lists shown on the dashboard landing page.
    pub async fn dashboard_summary(&self) -> DbResult<DashboardSummary> {
        let appointments = AppointmentRepository::new(self.pool.clone());
        let products = ProductRepository::new(self.pool.clone());
        let sales = SaleRepository::new(self.pool.clone());

        let today = sales.list_completed_in(Period::day(Utc::now().date_naive())).await?;

        let summary = DashboardSummary {
            service_count: ServiceRepository::new(self.pool.clone()).count().await?,
            professional_count: ProfessionalRepository::new(self.pool.clone()).count().await?,
            appointments: appointments.counts().await?,
            recent_appointments: appointments.recent(RECENT_APPOINTMENTS_LIMIT).await?,
            product_count: products.count().await?,
            low_stock_products: products
                .low_stock()
                .await?
                .into_iter()
                .map(ProductView::from)
                .collect(),
            sale_count: sales.count().await?,
            today_sales_total: today.iter().map(|s| s.total).sum::<Money>(),
            today_sale_count: today.len() as i64,
        };

        debug!(
            appointments = summary.appointments.total,
            sales_today = summary.today_sale_count,
            "Dashboard summary built"
        );
        Ok(summary)
    }

    /// Statistics over completed sales of the last `days` days.
    pub async fn sales_stats(&self, days: u32) -> DbResult<SalesStats> {
        validate_period_days(days).map_err(barbearia_core::CoreError::from)?;

        let period = Period::last_days(Utc::now(), days);
        let sales = SaleRepository::new(self.pool.clone())
            .list_completed_in(period)
            .await?;

        debug!(days, sales = sales.len(), "Computing sales statistics");
        Ok(SalesStats::compute(&sales, period, days))
    }

    /// Units and value on hand across active products.
    pub async fn inventory_overview(&self) -> DbResult<InventoryOverview> {
        let products = ProductRepository::new(self.pool.clone()).list_active().await?;
        Ok(InventoryOverview::from_products(products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::product::tests::{full_stock, input as product_input};
    use crate::repository::test_support::db;
    use barbearia_core::{NewSale, NewSaleItem, OversellPolicy, PaymentMethod, SizeBucket, StockCounts};

    fn sale_of(product_id: &str, quantity: i64, method: PaymentMethod) -> NewSale {
        NewSale {
            items: vec![NewSaleItem {
                product_id: product_id.to_string(),
                size: SizeBucket::M,
                quantity,
                unit_price: None,
            }],
            discount: Money::zero(),
            payment_method: method,
            customer_name: None,
            customer_phone: None,
            customer_email: None,
            seller: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let db = db().await;
        let summary = db.reports().dashboard_summary().await.unwrap();

        assert_eq!(summary.service_count, 0);
        assert_eq!(summary.appointments.total, 0);
        assert!(summary.recent_appointments.is_empty());
        assert!(summary.today_sales_total.is_zero());
    }

    #[tokio::test]
    async fn test_dashboard_counts_today_sales() {
        let db = db().await;
        let product = db.products().create(&product_input("Camiseta", full_stock())).await.unwrap();
        db.sales()
            .record_sale(&sale_of(&product.id, 2, PaymentMethod::Cash), OversellPolicy::Clamp)
            .await
            .unwrap();

        let summary = db.reports().dashboard_summary().await.unwrap();
        assert_eq!(summary.sale_count, 1);
        assert_eq!(summary.today_sale_count, 1);
        assert_eq!(summary.today_sales_total.cents(), 5980);
        assert_eq!(summary.product_count, 1);
    }

    #[tokio::test]
    async fn test_sales_stats_and_inventory() {
        let db = db().await;
        let product = db.products().create(&product_input("Camiseta", full_stock())).await.unwrap();
        db.products()
            .create(&product_input("Regata", StockCounts::new(0, 1, 0, 0, 0).unwrap()))
            .await
            .unwrap();

        db.sales()
            .record_sale(&sale_of(&product.id, 1, PaymentMethod::Pix), OversellPolicy::Clamp)
            .await
            .unwrap();
        db.sales()
            .record_sale(&sale_of(&product.id, 3, PaymentMethod::Pix), OversellPolicy::Clamp)
            .await
            .unwrap();

        let stats = db.reports().sales_stats(30).await.unwrap();
        assert_eq!(stats.kpis.sale_count, 2);
        assert_eq!(stats.kpis.gross_revenue.cents(), 4 * 2990);
        assert_eq!(stats.by_payment_method.len(), 5);
        assert_eq!(stats.by_weekday.len(), 7);
        assert_eq!(stats.top_products[0].quantity, 4);

        assert!(matches!(db.reports().sales_stats(0).await, Err(DbError::Domain(_))));
        assert!(db.reports().sales_stats(366).await.is_err());

        let overview = db.reports().inventory_overview().await.unwrap();
        assert_eq!(overview.product_count, 2);
        assert_eq!(overview.total_units, 55 - 4 + 1);
        assert_eq!(overview.low_stock.len(), 1);
        assert_eq!(overview.low_stock[0].product.name, "Regata");
        assert_eq!(overview.low_stock[0].total_stock, 1);
    }
}
