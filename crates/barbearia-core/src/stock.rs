//! # Stock Ledger
//!
//! Clothing products keep one counter per size bucket. A sale decrements the
//! bucket each line item names; `total_stock` is always the sum of the five
//! sized buckets.
//!
//! ## Deduction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_sale_deduction(products, line_items, policy)                     │
//! │                                                                         │
//! │  1. Every product_id must be present ──────► else ProductNotFound       │
//! │  2. Stage new counts on a copy                                          │
//! │       unsized bucket        → untouched                                 │
//! │       requested > available → Clamp: floor at 0 (clamped = true)        │
//! │                               Reject: InsufficientStock                 │
//! │  3. Commit staged counts into the products                              │
//! │                                                                         │
//! │  Steps 1-2 never mutate, so a failed call leaves every product as is.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use barbearia_core::stock::StockCounts;
//!
//! let counts = StockCounts::new(5, 10, 20, 15, 5).unwrap();
//! assert_eq!(counts.total(), 55);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::sale::SaleLineItem;
use crate::validation::{validate_stock_count, ValidationResult};

// =============================================================================
// Size Bucket
// =============================================================================

/// One of the fixed inventory subdivisions of a clothing product.
///
/// `Unsized` covers accessories without size variants (caps, socks). It has
/// no counter and is never decremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Pp,
    P,
    M,
    G,
    Gg,
    #[serde(alias = "unico", alias = "único")]
    Unsized,
}

impl SizeBucket {
    /// The five buckets that carry a counter, smallest first.
    pub const SIZED: [SizeBucket; 5] = [
        SizeBucket::Pp,
        SizeBucket::P,
        SizeBucket::M,
        SizeBucket::G,
        SizeBucket::Gg,
    ];

    pub fn is_sized(&self) -> bool {
        !matches!(self, SizeBucket::Unsized)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SizeBucket::Pp => "PP",
            SizeBucket::P => "P",
            SizeBucket::M => "M",
            SizeBucket::G => "G",
            SizeBucket::Gg => "GG",
            SizeBucket::Unsized => "unsized",
        }
    }
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SizeBucket {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pp" => Ok(SizeBucket::Pp),
            "p" => Ok(SizeBucket::P),
            "m" => Ok(SizeBucket::M),
            "g" => Ok(SizeBucket::G),
            "gg" => Ok(SizeBucket::Gg),
            "unsized" | "unico" | "único" | "u" => Ok(SizeBucket::Unsized),
            _ => Err(ValidationError::NotAllowed {
                field: "size".to_string(),
                allowed: ["PP", "P", "M", "G", "GG", "unsized"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Stock Counts
// =============================================================================

/// Per-bucket stock counters. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockCounts {
    pub pp: i64,
    pub p: i64,
    pub m: i64,
    pub g: i64,
    pub gg: i64,
}

impl StockCounts {
    /// Builds validated counts (each must be `>= 0`).
    pub fn new(pp: i64, p: i64, m: i64, g: i64, gg: i64) -> ValidationResult<Self> {
        let counts = StockCounts { pp, p, m, g, gg };
        counts.validate()?;
        Ok(counts)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        for bucket in SizeBucket::SIZED {
            let field = format!("stock_{}", bucket.label().to_lowercase());
            validate_stock_count(&field, self.get(bucket).unwrap_or(0))?;
        }
        Ok(())
    }

    /// Counter for a sized bucket; `None` for [`SizeBucket::Unsized`].
    pub fn get(&self, bucket: SizeBucket) -> Option<i64> {
        match bucket {
            SizeBucket::Pp => Some(self.pp),
            SizeBucket::P => Some(self.p),
            SizeBucket::M => Some(self.m),
            SizeBucket::G => Some(self.g),
            SizeBucket::Gg => Some(self.gg),
            SizeBucket::Unsized => None,
        }
    }

    fn slot_mut(&mut self, bucket: SizeBucket) -> Option<&mut i64> {
        match bucket {
            SizeBucket::Pp => Some(&mut self.pp),
            SizeBucket::P => Some(&mut self.p),
            SizeBucket::M => Some(&mut self.m),
            SizeBucket::G => Some(&mut self.g),
            SizeBucket::Gg => Some(&mut self.gg),
            SizeBucket::Unsized => None,
        }
    }

    /// Sum of the five sized buckets, `None` on overflow.
    pub fn checked_total(&self) -> Option<i64> {
        [self.p, self.m, self.g, self.gg]
            .into_iter()
            .try_fold(self.pp, i64::checked_add)
    }

    /// Sum of the five sized buckets.
    ///
    /// Validated counts never overflow; anything else saturates.
    pub fn total(&self) -> i64 {
        self.checked_total().unwrap_or(i64::MAX)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A clothing item sold at the counter.
///
/// `total_stock` is not stored on the struct; [`Product::total_stock`]
/// derives it from the buckets, and the repository persists that value on
/// every write.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Money,
    pub cost_price: Money,
    pub stock: StockCounts,
    pub minimum_stock: i64,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub material: Option<String>,
    pub tags: Vec<String>,
    pub active: bool,
    pub featured: bool,
    /// Optimistic concurrency token, bumped on every write.
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn total_stock(&self) -> i64 {
        self.stock.total()
    }

    /// Low stock means at or below the configured minimum.
    pub fn is_low_stock(&self) -> bool {
        self.total_stock() <= self.minimum_stock
    }

    /// Markup over cost in basis points, `None` without a cost price.
    pub fn margin_bps(&self) -> Option<i64> {
        self.price.margin_bps_over(self.cost_price)
    }

    /// Units on hand valued at the sale price.
    pub fn stock_value(&self) -> Money {
        self.price.multiply_quantity(self.total_stock())
    }
}

/// A product as the API returns it, with its derived stock figures.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub total_stock: i64,
    pub low_stock: bool,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        ProductView {
            total_stock: product.total_stock(),
            low_stock: product.is_low_stock(),
            product,
        }
    }
}

// =============================================================================
// Deduction
// =============================================================================

/// What to do when a line item asks for more units than its bucket holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OversellPolicy {
    /// Floor the bucket at zero and let the sale through.
    #[default]
    Clamp,
    /// Fail the whole sale with [`CoreError::InsufficientStock`].
    Reject,
}

impl FromStr for OversellPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clamp" => Ok(OversellPolicy::Clamp),
            "reject" => Ok(OversellPolicy::Reject),
            _ => Err(ValidationError::NotAllowed {
                field: "oversell_policy".to_string(),
                allowed: vec!["clamp".to_string(), "reject".to_string()],
            }),
        }
    }
}

/// One applied bucket decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub product_id: String,
    pub bucket: SizeBucket,
    pub requested: i64,
    pub before: i64,
    pub after: i64,
    /// True when fewer units were available than requested.
    pub clamped: bool,
}

/// Decrements the size buckets named by `items` on the matching products.
///
/// All-or-nothing: a missing product or (under [`OversellPolicy::Reject`])
/// an oversold bucket returns an error before any product is touched.
/// Several line items hitting the same bucket are applied cumulatively.
///
/// Returns the applied movements in line-item order. Unsized items produce
/// no movement.
pub fn apply_sale_deduction(
    products: &mut HashMap<String, Product>,
    items: &[SaleLineItem],
    policy: OversellPolicy,
) -> CoreResult<Vec<StockMovement>> {
    if let Some(missing) = items.iter().find(|item| !products.contains_key(&item.product_id)) {
        return Err(CoreError::ProductNotFound(missing.product_id.clone()));
    }

    let mut staged: HashMap<&str, StockCounts> = HashMap::new();
    let mut movements = Vec::with_capacity(items.len());

    for item in items {
        let product_stock = products
            .get(&item.product_id)
            .map(|p| p.stock)
            .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;
        let counts = staged.entry(item.product_id.as_str()).or_insert(product_stock);

        let Some(slot) = counts.slot_mut(item.size) else {
            continue;
        };

        let before = *slot;
        if item.quantity > before && policy == OversellPolicy::Reject {
            return Err(CoreError::InsufficientStock {
                product_id: item.product_id.clone(),
                bucket: item.size.to_string(),
                available: before,
                requested: item.quantity,
            });
        }

        let after = (before - item.quantity).max(0);
        *slot = after;

        movements.push(StockMovement {
            product_id: item.product_id.clone(),
            bucket: item.size,
            requested: item.quantity,
            before,
            after,
            clamped: item.quantity > before,
        });
    }

    for (product_id, counts) in staged {
        if let Some(product) = products.get_mut(product_id) {
            product.stock = counts;
        }
    }

    Ok(movements)
}

// =============================================================================
// Unit Tests
// =============================================================================
