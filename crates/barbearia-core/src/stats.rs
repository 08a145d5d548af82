//! # Sales Statistics
//!
//! Aggregations behind the admin dashboard. Everything here is computed in
//! memory from already-loaded sales and products; the database layer only
//! decides which rows to load.
//!
//! ## Report Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SalesStats (completed sales inside the period)                         │
//! │                                                                         │
//! │   kpis           count, gross, discounts, net, avg ticket,              │
//! │                  avg discount, unique customers                         │
//! │   by_payment     all 5 methods, zeros included                          │
//! │   by_seller      value desc, "Não informado" for blanks                 │
//! │   top_products   10 best by revenue                                     │
//! │   by_weekday     always 7 rows, Monday first                            │
//! │   gross_profit   Σ (unit_price − unit_cost) × qty                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::appointment::Appointment;
use crate::money::Money;
use crate::sale::{PaymentMethod, Sale, SaleStatus};
use crate::stock::{Product, ProductView};
use crate::time::Period;
use crate::validation::normalize_phone;

/// How many products the ranking keeps.
pub const TOP_PRODUCTS_LIMIT: usize = 10;

const WEEKDAYS: [(Weekday, &str); 7] = [
    (Weekday::Mon, "Segunda"),
    (Weekday::Tue, "Terça"),
    (Weekday::Wed, "Quarta"),
    (Weekday::Thu, "Quinta"),
    (Weekday::Fri, "Sexta"),
    (Weekday::Sat, "Sábado"),
    (Weekday::Sun, "Domingo"),
];

// =============================================================================
// KPIs
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesKpis {
    pub sale_count: i64,
    /// Σ subtotal, before discounts.
    pub gross_revenue: Money,
    pub total_discounts: Money,
    pub net_revenue: Money,
    pub average_ticket: Money,
    pub average_discount: Money,
    pub unique_customers: i64,
}

impl SalesKpis {
    /// KPIs over completed sales. Other statuses are ignored.
    pub fn from_sales<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Self {
        let mut kpis = SalesKpis::default();
        let mut customers = HashSet::new();

        for sale in sales.into_iter().filter(|s| s.status == SaleStatus::Completed) {
            kpis.sale_count += 1;
            kpis.gross_revenue += sale.subtotal;
            kpis.total_discounts += sale.discount;
            if let Some(key) = customer_key(sale) {
                customers.insert(key);
            }
        }

        let count = kpis.sale_count as u64;
        kpis.net_revenue = kpis.gross_revenue - kpis.total_discounts;
        kpis.average_ticket = kpis.net_revenue.average_over(count);
        kpis.average_discount = kpis.total_discounts.average_over(count);
        kpis.unique_customers = customers.len() as i64;
        kpis
    }
}

/// Phone digits when present, otherwise the lowercased name.
fn customer_key(sale: &Sale) -> Option<String> {
    let by_phone = sale
        .customer_phone
        .as_deref()
        .map(normalize_phone)
        .filter(|p| !p.is_empty())
        .map(|p| format!("tel:{p}"));

    by_phone.or_else(|| {
        sale.customer_name
            .as_deref()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .map(|n| format!("nome:{n}"))
    })
}

// =============================================================================
// Breakdowns
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodTotal {
    pub method: PaymentMethod,
    pub value: Money,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SellerTotal {
    pub seller: String,
    pub value: Money,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayTotal {
    /// ISO weekday number, 1 = Monday.
    pub day: u32,
    pub label: String,
    pub value: Money,
    pub count: i64,
}

// =============================================================================
// Sales Stats
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesStats {
    pub period_days: u32,
    #[ts(as = "String")]
    pub from: DateTime<Utc>,
    #[ts(as = "String")]
    pub to: DateTime<Utc>,
    pub kpis: SalesKpis,
    pub by_payment_method: Vec<PaymentMethodTotal>,
    pub by_seller: Vec<SellerTotal>,
    pub top_products: Vec<TopProduct>,
    pub by_weekday: Vec<WeekdayTotal>,
    pub gross_profit: Money,
}

impl SalesStats {
    /// Builds the report from the sales inside `period`.
    ///
    /// Sales outside the period or not `completed` are skipped, so callers
    /// may pass a superset.
    pub fn compute(sales: &[Sale], period: Period, period_days: u32) -> Self {
        let completed: Vec<&Sale> = sales
            .iter()
            .filter(|s| s.status == SaleStatus::Completed && period.contains(s.sold_at))
            .collect();

        SalesStats {
            period_days,
            from: period.from,
            to: period.to,
            kpis: SalesKpis::from_sales(completed.iter().copied()),
            by_payment_method: by_payment_method(&completed),
            by_seller: by_seller(&completed),
            top_products: top_products(&completed, TOP_PRODUCTS_LIMIT),
            by_weekday: by_weekday(&completed),
            gross_profit: completed.iter().map(|s| s.gross_profit()).sum(),
        }
    }
}

fn by_payment_method(sales: &[&Sale]) -> Vec<PaymentMethodTotal> {
    PaymentMethod::ALL
        .into_iter()
        .map(|method| {
            let (value, count) = sales
                .iter()
                .filter(|s| s.payment_method == method)
                .fold((Money::zero(), 0), |(v, c), s| (v + s.total, c + 1));
            PaymentMethodTotal { method, value, count }
        })
        .collect()
}

fn by_seller(sales: &[&Sale]) -> Vec<SellerTotal> {
    let mut totals: HashMap<&str, (Money, i64)> = HashMap::new();
    for sale in sales {
        let entry = totals.entry(sale.seller_label()).or_default();
        entry.0 += sale.total;
        entry.1 += 1;
    }

    let mut rows: Vec<SellerTotal> = totals
        .into_iter()
        .map(|(seller, (value, count))| SellerTotal {
            seller: seller.to_string(),
            value,
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.seller.cmp(&b.seller)));
    rows
}

fn top_products(sales: &[&Sale], limit: usize) -> Vec<TopProduct> {
    let mut ranking: HashMap<&str, TopProduct> = HashMap::new();
    for item in sales.iter().flat_map(|s| s.items.iter()) {
        let entry = ranking.entry(&item.product_id).or_insert_with(|| TopProduct {
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            quantity: 0,
            revenue: Money::zero(),
        });
        entry.quantity += item.quantity;
        entry.revenue += item.line_total();
    }

    let mut rows: Vec<TopProduct> = ranking.into_values().collect();
    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    rows.truncate(limit);
    rows
}

fn by_weekday(sales: &[&Sale]) -> Vec<WeekdayTotal> {
    WEEKDAYS
        .iter()
        .map(|(weekday, label)| {
            let (value, count) = sales
                .iter()
                .filter(|s| s.sold_at.weekday() == *weekday)
                .fold((Money::zero(), 0), |(v, c), s| (v + s.total, c + 1));
            WeekdayTotal {
                day: weekday.number_from_monday(),
                label: label.to_string(),
                value,
                count,
            }
        })
        .collect()
}

// =============================================================================
// Inventory Overview
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryOverview {
    pub product_count: i64,
    pub total_units: i64,
    /// Σ total_stock × price.
    pub stock_value: Money,
    pub low_stock: Vec<ProductView>,
}

impl InventoryOverview {
    pub fn from_products(products: Vec<Product>) -> Self {
        let product_count = products.len() as i64;
        let total_units = products.iter().map(Product::total_stock).sum();
        let stock_value = products.iter().map(Product::stock_value).sum();
        let low_stock = products
            .into_iter()
            .filter(Product::is_low_stock)
            .map(ProductView::from)
            .collect();

        InventoryOverview {
            product_count,
            total_units,
            stock_value,
            low_stock,
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentCounts {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub service_count: i64,
    pub professional_count: i64,
    pub appointments: AppointmentCounts,
    pub recent_appointments: Vec<Appointment>,
    pub product_count: i64,
    pub low_stock_products: Vec<ProductView>,
    pub sale_count: i64,
    pub today_sales_total: Money,
    pub today_sale_count: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sale::{NewSale, NewSaleItem, SaleLineItem, SaleTotals};
    use crate::stock::tests::camiseta;
    use crate::stock::SizeBucket;
    use chrono::{Duration, TimeZone};

    // 2024-03-11 is a Monday.
    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 11, 15, 0, 0).unwrap()
    }

    fn sale(
        lines: &[(&str, i64, i64)],
        discount: i64,
        method: PaymentMethod,
        seller: Option<&str>,
        phone: Option<&str>,
        sold_at: DateTime<Utc>,
    ) -> Sale {
        let items: Vec<SaleLineItem> = lines
            .iter()
            .map(|(id, price, qty)| {
                let mut product = camiseta(id);
                product.name = format!("Produto {id}");
                product.price = Money::from_cents(*price);
                SaleLineItem::from_product(&product, SizeBucket::M, *qty, None).unwrap()
            })
            .collect();
        let totals = SaleTotals::compute(&items, Money::from_cents(discount)).unwrap();
        let request = NewSale {
            items: vec![NewSaleItem {
                product_id: "x".to_string(),
                size: SizeBucket::M,
                quantity: 1,
                unit_price: None,
            }],
            discount: Money::from_cents(discount),
            payment_method: method,
            customer_name: Some("Cliente".to_string()),
            customer_phone: phone.map(str::to_string),
            customer_email: None,
            seller: seller.map(str::to_string),
            notes: None,
        };
        Sale::new(format!("VENDA-{}", sold_at.timestamp()), &request, items, totals, sold_at)
    }

    fn period() -> Period {
        Period::last_days(monday() + Duration::days(7), 30)
    }

    #[test]
    fn test_kpis() {
        let sales = vec![
            sale(&[("a", 1000, 2)], 100, PaymentMethod::Pix, None, Some("11 9999-0000"), monday()),
            sale(&[("b", 1001, 1)], 0, PaymentMethod::Cash, None, Some("1199990000"), monday()),
            sale(&[("a", 500, 1)], 0, PaymentMethod::Cash, None, None, monday()),
        ];
        let kpis = SalesKpis::from_sales(&sales);

        assert_eq!(kpis.sale_count, 3);
        assert_eq!(kpis.gross_revenue.cents(), 3501);
        assert_eq!(kpis.total_discounts.cents(), 100);
        assert_eq!(kpis.net_revenue.cents(), 3401);
        assert_eq!(kpis.average_ticket.cents(), 1134);
        assert_eq!(kpis.average_discount.cents(), 33);
        // Same phone digits count once; the third sale is keyed by name.
        assert_eq!(kpis.unique_customers, 2);
    }

    #[test]
    fn test_kpis_empty() {
        let kpis = SalesKpis::from_sales(&Vec::<Sale>::new());
        assert_eq!(kpis, SalesKpis::default());
    }

    #[test]
    fn test_stats_skip_non_completed_and_out_of_period() {
        let mut canceled = sale(&[("a", 1000, 1)], 0, PaymentMethod::Pix, None, None, monday());
        canceled.status = SaleStatus::Canceled;
        let old = sale(&[("a", 1000, 1)], 0, PaymentMethod::Pix, None, None, monday() - Duration::days(90));
        let ok = sale(&[("a", 1000, 1)], 0, PaymentMethod::Pix, None, None, monday());

        let stats = SalesStats::compute(&[canceled, old, ok], period(), 30);
        assert_eq!(stats.kpis.sale_count, 1);
        assert_eq!(stats.kpis.net_revenue.cents(), 1000);
    }

    #[test]
    fn test_payment_methods_always_listed() {
        let sales = vec![sale(&[("a", 1000, 1)], 0, PaymentMethod::Credit, None, None, monday())];
        let stats = SalesStats::compute(&sales, period(), 30);

        assert_eq!(stats.by_payment_method.len(), 5);
        for row in &stats.by_payment_method {
            if row.method == PaymentMethod::Credit {
                assert_eq!((row.value.cents(), row.count), (1000, 1));
            } else {
                assert_eq!((row.value.cents(), row.count), (0, 0));
            }
        }
    }

    #[test]
    fn test_sellers_sorted_with_fallback() {
        let sales = vec![
            sale(&[("a", 1000, 1)], 0, PaymentMethod::Pix, Some("Ana"), None, monday()),
            sale(&[("a", 3000, 1)], 0, PaymentMethod::Pix, None, None, monday()),
            sale(&[("a", 1500, 1)], 0, PaymentMethod::Pix, Some("Bruno"), None, monday()),
            sale(&[("a", 1500, 1)], 0, PaymentMethod::Pix, Some(" "), None, monday()),
        ];
        let stats = SalesStats::compute(&sales, period(), 30);

        let names: Vec<&str> = stats.by_seller.iter().map(|s| s.seller.as_str()).collect();
        assert_eq!(names, vec!["Não informado", "Bruno", "Ana"]);
        assert_eq!(stats.by_seller[0].value.cents(), 4500);
        assert_eq!(stats.by_seller[0].count, 2);
    }

    #[test]
    fn test_top_products_limited_and_ranked() {
        let sales: Vec<Sale> = (0..12)
            .map(|i| {
                let id = format!("p{i:02}");
                sale(&[(id.as_str(), 100 * (i + 1), 1)], 0, PaymentMethod::Pix, None, None, monday())
            })
            .chain(std::iter::once(sale(
                &[("p00", 100, 20)],
                0,
                PaymentMethod::Pix,
                None,
                None,
                monday(),
            )))
            .collect();
        let stats = SalesStats::compute(&sales, period(), 30);

        assert_eq!(stats.top_products.len(), TOP_PRODUCTS_LIMIT);
        assert_eq!(stats.top_products[0].product_id, "p00");
        assert_eq!(stats.top_products[0].quantity, 21);
        assert_eq!(stats.top_products[0].revenue.cents(), 2100);
        assert_eq!(stats.top_products[1].product_id, "p11");
    }

    #[test]
    fn test_weekdays_monday_first() {
        let sales = vec![
            sale(&[("a", 1000, 1)], 0, PaymentMethod::Pix, None, None, monday()),
            sale(&[("a", 700, 1)], 0, PaymentMethod::Pix, None, None, monday() + Duration::days(6)),
        ];
        let stats = SalesStats::compute(&sales, period(), 30);

        assert_eq!(stats.by_weekday.len(), 7);
        assert_eq!(stats.by_weekday[0].label, "Segunda");
        assert_eq!(stats.by_weekday[0].value.cents(), 1000);
        assert_eq!(stats.by_weekday[6].day, 7);
        assert_eq!(stats.by_weekday[6].count, 1);
        assert_eq!(stats.by_weekday[3].count, 0);
    }

    #[test]
    fn test_gross_profit() {
        // camiseta costs 1500 per unit
        let sales = vec![sale(&[("a", 2990, 3)], 500, PaymentMethod::Pix, None, None, monday())];
        let stats = SalesStats::compute(&sales, period(), 30);
        assert_eq!(stats.gross_profit.cents(), (2990 - 1500) * 3);
    }

    #[test]
    fn test_inventory_overview() {
        let mut low = camiseta("low");
        low.stock = crate::stock::StockCounts::new(0, 1, 1, 1, 0).unwrap();
        let products = vec![camiseta("a"), low];

        let overview = InventoryOverview::from_products(products);
        assert_eq!(overview.product_count, 2);
        assert_eq!(overview.total_units, 58);
        assert_eq!(overview.stock_value.cents(), 58 * 2990);
        assert_eq!(overview.low_stock.len(), 1);
        assert_eq!(overview.low_stock[0].product.id, "low");
        assert_eq!(overview.low_stock[0].total_stock, 3);
        assert!(overview.low_stock[0].low_stock);
    }
}
