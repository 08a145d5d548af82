//! # Sales
//!
//! Point-of-sale records for the clothing counter.
//!
//! ## Checkout Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewSale (request)                                                      │
//! │   items: [{product_id, size, quantity, unit_price?}]                    │
//! │       │ validate()                                                      │
//! │       ▼                                                                 │
//! │  SaleLineItem::from_product   ← snapshot name, category, price, cost    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleTotals::compute          subtotal = Σ unit_price × quantity        │
//! │       │                       total    = subtotal − discount            │
//! │       ▼                                                                 │
//! │  Sale::new                    append-only from here on                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::stock::{Product, SizeBucket};
use crate::validation::{
    validate_email, validate_name, validate_optional_text, validate_phone, validate_price_cents,
    validate_quantity,
};
use crate::MAX_SALE_ITEMS;

/// Seller label used when a sale has none.
pub const UNKNOWN_SELLER: &str = "Não informado";

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[serde(alias = "dinheiro")]
    Cash,
    #[serde(alias = "debito")]
    Debit,
    #[serde(alias = "credito")]
    Credit,
    Pix,
    #[serde(alias = "outro")]
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Debit,
        PaymentMethod::Credit,
        PaymentMethod::Pix,
        PaymentMethod::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// Lifecycle of a sale. Checkout creates `Completed` sales; only those count
/// towards revenue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[serde(alias = "pendente")]
    Pending,
    #[default]
    #[serde(alias = "concluida")]
    Completed,
    #[serde(alias = "cancelada")]
    Canceled,
    #[serde(alias = "devolvida")]
    Returned,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Canceled => "canceled",
            SaleStatus::Returned => "returned",
        }
    }
}

impl FromStr for SaleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendente" => Ok(SaleStatus::Pending),
            "completed" | "concluida" => Ok(SaleStatus::Completed),
            "canceled" | "cancelada" => Ok(SaleStatus::Canceled),
            "returned" | "devolvida" => Ok(SaleStatus::Returned),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["pending", "completed", "canceled", "returned"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// One product line of a sale.
///
/// Name, category, price and cost are copied from the product at checkout so
/// later catalog edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineItem {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub size: SizeBucket,
    pub unit_price: Money,
    pub unit_cost: Money,
    pub quantity: i64,
}

impl SaleLineItem {
    /// Builds a validated line from a product snapshot.
    ///
    /// `unit_price` overrides the catalog price (e.g. a negotiated price at
    /// the counter); the cost is always the product's.
    pub fn from_product(
        product: &Product,
        size: SizeBucket,
        quantity: i64,
        unit_price: Option<Money>,
    ) -> CoreResult<Self> {
        if quantity > crate::MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: crate::MAX_ITEM_QUANTITY,
            });
        }
        validate_quantity(quantity)?;

        let unit_price = unit_price.unwrap_or(product.price);
        validate_price_cents("unit_price", unit_price.cents())?;

        Ok(SaleLineItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            category: product.category.clone(),
            size,
            unit_price,
            unit_cost: product.cost_price,
            quantity,
        })
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// `(unit_price - unit_cost) × quantity`.
    pub fn line_profit(&self) -> Money {
        (self.unit_price - self.unit_cost).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Monetary summary of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

impl SaleTotals {
    /// `subtotal = Σ unit_price × quantity`, `total = subtotal − discount`.
    ///
    /// Rejects empty or oversized sales, negative discounts, discounts
    /// larger than the subtotal and subtotals that overflow.
    pub fn compute(items: &[SaleLineItem], discount: Money) -> CoreResult<Self> {
        if items.is_empty() {
            return Err(CoreError::EmptySale);
        }
        if items.len() > MAX_SALE_ITEMS {
            return Err(CoreError::SaleTooLarge { max: MAX_SALE_ITEMS });
        }
        validate_price_cents("discount", discount.cents())?;

        let subtotal = items
            .iter()
            .try_fold(Money::zero(), |acc, item| {
                item.unit_price
                    .checked_mul(item.quantity)
                    .and_then(|line| acc.checked_add(line))
            })
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "subtotal".to_string(),
                min: 0,
                max: i64::MAX,
            })?;
        if discount > subtotal {
            return Err(CoreError::DiscountExceedsSubtotal { discount, subtotal });
        }

        Ok(SaleTotals {
            subtotal,
            discount,
            total: subtotal - discount,
        })
    }
}

// =============================================================================
// Checkout Request
// =============================================================================

/// A requested line: which product, which size, how many.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSaleItem {
    pub product_id: String,
    pub size: SizeBucket,
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Option<Money>,
}

/// Everything the counter sends to record a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub items: Vec<NewSaleItem>,
    #[serde(default)]
    pub discount: Money,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewSale {
    /// Shape checks that need no database lookup.
    pub fn validate(&self) -> CoreResult<()> {
        if self.items.is_empty() {
            return Err(CoreError::EmptySale);
        }
        if self.items.len() > MAX_SALE_ITEMS {
            return Err(CoreError::SaleTooLarge { max: MAX_SALE_ITEMS });
        }
        for item in &self.items {
            if item.product_id.trim().is_empty() {
                return Err(ValidationError::required("product_id").into());
            }
            validate_quantity(item.quantity)?;
        }
        validate_price_cents("discount", self.discount.cents())?;

        if let Some(name) = non_blank(&self.customer_name) {
            validate_name("customer_name", name, 100)?;
        }
        if let Some(phone) = non_blank(&self.customer_phone) {
            validate_phone(phone)?;
        }
        if let Some(email) = non_blank(&self.customer_email) {
            validate_email(email)?;
        }
        if let Some(seller) = non_blank(&self.seller) {
            validate_name("seller", seller, 100)?;
        }
        validate_optional_text("notes", self.notes.as_deref(), 1000)?;
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Sale
// =============================================================================

/// A completed checkout. Created once; line items are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// Human-readable number, `VENDA-YYYYMMDDHHMMSS-NNN`.
    pub sale_number: String,
    pub items: Vec<SaleLineItem>,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub seller: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

impl Sale {
    /// Assembles a completed sale from validated parts.
    pub fn new(
        sale_number: String,
        request: &NewSale,
        items: Vec<SaleLineItem>,
        totals: SaleTotals,
        sold_at: DateTime<Utc>,
    ) -> Self {
        Sale {
            id: Uuid::new_v4().to_string(),
            sale_number,
            items,
            subtotal: totals.subtotal,
            discount: totals.discount,
            total: totals.total,
            payment_method: request.payment_method,
            status: SaleStatus::Completed,
            customer_name: non_blank(&request.customer_name).map(str::to_string),
            customer_phone: non_blank(&request.customer_phone).map(str::to_string),
            customer_email: non_blank(&request.customer_email).map(str::to_string),
            seller: non_blank(&request.seller).map(str::to_string),
            notes: non_blank(&request.notes).map(str::to_string),
            sold_at,
        }
    }

    /// Gross profit: `Σ (unit_price − unit_cost) × quantity`.
    pub fn gross_profit(&self) -> Money {
        self.items.iter().map(SaleLineItem::line_profit).sum()
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Seller name for reports, with the "not informed" fallback.
    pub fn seller_label(&self) -> &str {
        self.seller
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SELLER)
    }

    /// Whether the stored totals agree with the line items.
    pub fn totals_consistent(&self) -> bool {
        let subtotal: Money = self.items.iter().map(SaleLineItem::line_total).sum();
        self.subtotal == subtotal && self.total == self.subtotal - self.discount
    }
}

// =============================================================================
// Sale Numbers
// =============================================================================

/// The timestamp part of a sale number, `VENDA-YYYYMMDDHHMMSS`.
pub fn sale_number_prefix(at: DateTime<Utc>) -> String {
    format!("VENDA-{}", at.format("%Y%m%d%H%M%S"))
}

/// Full sale number; `sequence` counts sales sharing the same second.
///
/// ```rust
/// use barbearia_core::sale::format_sale_number;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 5).unwrap();
/// assert_eq!(format_sale_number(at, 1), "VENDA-20240315143005-001");
/// ```
pub fn format_sale_number(at: DateTime<Utc>, sequence: i64) -> String {
    format!("{}-{:03}", sale_number_prefix(at), sequence)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::tests::camiseta;
    use chrono::TimeZone;

    fn request(items: Vec<NewSaleItem>, discount: i64) -> NewSale {
        NewSale {
            items,
            discount: Money::from_cents(discount),
            payment_method: PaymentMethod::Pix,
            customer_name: Some("João".to_string()),
            customer_phone: Some("(11) 98765-4321".to_string()),
            customer_email: None,
            seller: Some("  ".to_string()),
            notes: None,
        }
    }

    fn item(product_id: &str, size: SizeBucket, quantity: i64) -> NewSaleItem {
        NewSaleItem {
            product_id: product_id.to_string(),
            size,
            quantity,
            unit_price: None,
        }
    }

    #[test]
    fn test_line_item_snapshots_product() {
        let product = camiseta("cam-1");
        let line = SaleLineItem::from_product(&product, SizeBucket::M, 3, None).unwrap();

        assert_eq!(line.product_name, "Camiseta Básica Preta");
        assert_eq!(line.unit_price, Money::from_cents(2990));
        assert_eq!(line.unit_cost, Money::from_cents(1500));
        assert_eq!(line.line_total().cents(), 8970);
        assert_eq!(line.line_profit().cents(), 4470);
    }

    #[test]
    fn test_line_item_validation() {
        let product = camiseta("cam-1");
        assert!(SaleLineItem::from_product(&product, SizeBucket::M, 0, None).is_err());
        assert!(matches!(
            SaleLineItem::from_product(&product, SizeBucket::M, 5000, None),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert!(SaleLineItem::from_product(&product, SizeBucket::M, 1, Some(Money::from_cents(-1))).is_err());

        let custom = SaleLineItem::from_product(&product, SizeBucket::M, 2, Some(Money::from_cents(2500))).unwrap();
        assert_eq!(custom.line_total().cents(), 5000);
    }

    #[test]
    fn test_totals_invariant() {
        let a = camiseta("a");
        let mut b = camiseta("b");
        b.price = Money::from_cents(4590);

        let items = vec![
            SaleLineItem::from_product(&a, SizeBucket::P, 2, None).unwrap(),
            SaleLineItem::from_product(&b, SizeBucket::G, 1, None).unwrap(),
        ];
        let totals = SaleTotals::compute(&items, Money::from_cents(570)).unwrap();

        assert_eq!(totals.subtotal.cents(), 2 * 2990 + 4590);
        assert_eq!(totals.total, totals.subtotal - totals.discount);
        assert_eq!(totals.total.cents(), 10_000);
    }

    #[test]
    fn test_totals_rejections() {
        let product = camiseta("a");
        let items = vec![SaleLineItem::from_product(&product, SizeBucket::P, 1, None).unwrap()];

        assert!(matches!(
            SaleTotals::compute(&[], Money::zero()),
            Err(CoreError::EmptySale)
        ));
        assert!(matches!(
            SaleTotals::compute(&items, Money::from_cents(2991)),
            Err(CoreError::DiscountExceedsSubtotal { .. })
        ));
        assert!(SaleTotals::compute(&items, Money::from_cents(-1)).is_err());

        let full = SaleTotals::compute(&items, Money::from_cents(2990)).unwrap();
        assert!(full.total.is_zero());
    }

    #[test]
    fn test_huge_prices_are_refused() {
        let product = camiseta("a");
        assert!(matches!(
            SaleLineItem::from_product(&product, SizeBucket::M, 3, Some(Money::from_cents(i64::MAX / 2))),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // Lines built elsewhere still cannot wrap the subtotal
        let mut line = SaleLineItem::from_product(&product, SizeBucket::M, 3, None).unwrap();
        line.unit_price = Money::from_cents(i64::MAX / 2);
        assert!(matches!(
            SaleTotals::compute(&[line], Money::zero()),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let max = SaleLineItem::from_product(
            &product,
            SizeBucket::M,
            crate::MAX_ITEM_QUANTITY,
            Some(Money::from_cents(crate::MAX_PRICE_CENTS)),
        )
        .unwrap();
        let totals = SaleTotals::compute(&vec![max; crate::MAX_SALE_ITEMS], Money::zero()).unwrap();
        assert_eq!(
            totals.subtotal.cents(),
            crate::MAX_PRICE_CENTS * crate::MAX_ITEM_QUANTITY * crate::MAX_SALE_ITEMS as i64
        );
    }

    #[test]
    fn test_new_sale_validation() {
        assert!(request(vec![item("a", SizeBucket::M, 1)], 0).validate().is_ok());
        assert!(matches!(request(vec![], 0).validate(), Err(CoreError::EmptySale)));
        assert!(request(vec![item("a", SizeBucket::M, 0)], 0).validate().is_err());
        assert!(request(vec![item(" ", SizeBucket::M, 1)], 0).validate().is_err());

        let mut bad_phone = request(vec![item("a", SizeBucket::M, 1)], 0);
        bad_phone.customer_phone = Some("abc".to_string());
        assert!(bad_phone.validate().is_err());
    }

    #[test]
    fn test_sale_assembly() {
        let product = camiseta("cam-1");
        let req = request(vec![item("cam-1", SizeBucket::M, 2)], 980);
        let items = vec![SaleLineItem::from_product(&product, SizeBucket::M, 2, None).unwrap()];
        let totals = SaleTotals::compute(&items, req.discount).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 5).unwrap();

        let sale = Sale::new(format_sale_number(at, 2), &req, items, totals, at);

        assert_eq!(sale.sale_number, "VENDA-20240315143005-002");
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.total.cents(), 5980 - 980);
        assert!(sale.totals_consistent());
        assert_eq!(sale.seller, None);
        assert_eq!(sale.seller_label(), UNKNOWN_SELLER);
        assert_eq!(sale.gross_profit().cents(), 2 * (2990 - 1500));
        assert_eq!(sale.item_count(), 2);
    }

    #[test]
    fn test_enum_wire_names() {
        let method: PaymentMethod = serde_json::from_str("\"dinheiro\"").unwrap();
        assert_eq!(method, PaymentMethod::Cash);
        assert_eq!(serde_json::to_string(&PaymentMethod::Pix).unwrap(), "\"pix\"");

        assert_eq!("concluida".parse::<SaleStatus>().unwrap(), SaleStatus::Completed);
        assert_eq!(SaleStatus::default(), SaleStatus::Completed);
        assert!("paid".parse::<SaleStatus>().is_err());
    }
}
