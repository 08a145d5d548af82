//! # Domain Types
//!
//! Catalog and reference entities of the barbershop.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Professional  │   │     Service     │   │  ShopSettings   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  full_name      │   │  name, category │   │  open (toggle)  │       │
//! │  │  specialties    │   │  price (Money)  │   │  active         │       │
//! │  │  active         │   │  tags           │   │  → operating    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   Inputs (request payloads):                       │
//! │  │    Customer     │   ServiceInput, ProfessionalInput,                 │
//! │  │  ─────────────  │   ProductInput, ShopSettingsInput                  │
//! │  │  phone (unique) │                                                    │
//! │  │  total_spent    │   Each validates itself and builds or updates      │
//! │  └─────────────────┘   the entity it describes.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Slots, appointments, products and sales live in their own modules
//! ([`crate::slots`], [`crate::appointment`], [`crate::stock`], [`crate::sale`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::stock::{Product, StockCounts};
use crate::validation::{
    validate_duration_minutes, validate_email, validate_name, validate_optional_text, validate_phone,
    validate_price_cents, validate_stock_count, ValidationResult,
};
use crate::{DEFAULT_MINIMUM_STOCK, DEFAULT_SERVICE_DURATION_MINUTES};

// =============================================================================
// Professional
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub specialties: Vec<String>,
    pub bio: Option<String>,
    pub years_experience: i64,
    /// Average review score, 0.0 to 5.0.
    pub rating: Option<f64>,
    pub active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalInput {
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub years_experience: i64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl ProfessionalInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("full_name", &self.full_name, 100)?;
        if let Some(phone) = blank_to_none(&self.phone) {
            validate_phone(&phone)?;
        }
        if let Some(email) = blank_to_none(&self.email) {
            validate_email(&email)?;
        }
        validate_stock_count("years_experience", self.years_experience)?;
        validate_optional_text("bio", self.bio.as_deref(), 1000)?;
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(ValidationError::OutOfRange {
                    field: "rating".to_string(),
                    min: 0,
                    max: 5,
                });
            }
        }
        Ok(())
    }

    pub fn build(&self) -> CoreResult<Professional> {
        self.validate()?;
        let mut professional = Professional {
            id: Uuid::new_v4().to_string(),
            full_name: String::new(),
            phone: None,
            email: None,
            specialties: Vec::new(),
            bio: None,
            years_experience: 0,
            rating: None,
            active: true,
            created_at: Utc::now(),
        };
        self.write_into(&mut professional);
        Ok(professional)
    }

    pub fn apply_to(&self, professional: &mut Professional) -> CoreResult<()> {
        self.validate()?;
        self.write_into(professional);
        Ok(())
    }

    fn write_into(&self, professional: &mut Professional) {
        professional.full_name = self.full_name.trim().to_string();
        professional.phone = blank_to_none(&self.phone);
        professional.email = blank_to_none(&self.email);
        professional.specialties = normalize_tags(&self.specialties);
        professional.bio = blank_to_none(&self.bio);
        professional.years_experience = self.years_experience;
        professional.rating = self.rating;
        professional.active = self.active;
    }
}

// =============================================================================
// Service
// =============================================================================

/// Something the barbershop offers: a haircut, a beard trim, a package.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub category: String,
    pub available: bool,
    pub featured: bool,
    pub duration_minutes: i64,
    pub tags: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Case-insensitive search match.
    ///
    /// Matches when `term` is a substring of the name, description or
    /// category, or equals one of the tags. An empty term matches
    /// everything.
    ///
    /// ```rust,ignore
    /// assert!(barba.matches_term("BARBA"));
    /// assert!(barba.matches_term("navalha"));   // exact tag
    /// assert!(!barba.matches_term("naval"));    // partial tag
    /// ```
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        let contains = |text: &str| text.to_lowercase().contains(&term);

        contains(&self.name)
            || self.description.as_deref().is_some_and(contains)
            || contains(&self.category)
            || self.tags.iter().any(|tag| tag.to_lowercase() == term)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    pub category: String,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ServiceInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, 100)?;
        validate_name("category", &self.category, 50)?;
        validate_price_cents("price", self.price.cents())?;
        validate_duration_minutes(self.duration_minutes)?;
        validate_optional_text("description", self.description.as_deref(), 2000)?;
        Ok(())
    }

    pub fn build(&self) -> CoreResult<Service> {
        self.validate()?;
        let now = Utc::now();
        let mut service = Service {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            description: None,
            price: Money::zero(),
            category: String::new(),
            available: true,
            featured: false,
            duration_minutes: DEFAULT_SERVICE_DURATION_MINUTES,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.write_into(&mut service);
        Ok(service)
    }

    pub fn apply_to(&self, service: &mut Service) -> CoreResult<()> {
        self.validate()?;
        self.write_into(service);
        service.updated_at = Utc::now();
        Ok(())
    }

    fn write_into(&self, service: &mut Service) {
        service.name = self.name.trim().to_string();
        service.description = blank_to_none(&self.description);
        service.price = self.price;
        service.category = self.category.trim().to_string();
        service.available = self.available;
        service.featured = self.featured;
        service.duration_minutes = self.duration_minutes;
        service.tags = normalize_tags(&self.tags);
    }
}

// =============================================================================
// Product Input
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub price: Money,
    #[serde(default)]
    pub cost_price: Money,
    #[serde(default)]
    pub stock: StockCounts,
    #[serde(default = "default_minimum_stock")]
    pub minimum_stock: i64,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub featured: bool,
}

impl ProductInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, 200)?;
        validate_name("category", &self.category, 50)?;
        validate_price_cents("price", self.price.cents())?;
        validate_price_cents("cost_price", self.cost_price.cents())?;
        validate_stock_count("minimum_stock", self.minimum_stock)?;
        self.stock.validate()?;
        validate_optional_text("description", self.description.as_deref(), 2000)?;
        Ok(())
    }

    pub fn build(&self) -> CoreResult<Product> {
        self.validate()?;
        let now = Utc::now();
        let mut product = Product {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            description: None,
            category: String::new(),
            price: Money::zero(),
            cost_price: Money::zero(),
            stock: StockCounts::default(),
            minimum_stock: DEFAULT_MINIMUM_STOCK,
            brand: None,
            color: None,
            material: None,
            tags: Vec::new(),
            active: true,
            featured: false,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.write_into(&mut product);
        Ok(product)
    }

    /// Overwrites the editable fields; `id`, `version` and `created_at` stay.
    pub fn apply_to(&self, product: &mut Product) -> CoreResult<()> {
        self.validate()?;
        self.write_into(product);
        product.updated_at = Utc::now();
        Ok(())
    }

    fn write_into(&self, product: &mut Product) {
        product.name = self.name.trim().to_string();
        product.description = blank_to_none(&self.description);
        product.category = self.category.trim().to_string();
        product.price = self.price;
        product.cost_price = self.cost_price;
        product.stock = self.stock;
        product.minimum_stock = self.minimum_stock;
        product.brand = blank_to_none(&self.brand);
        product.color = blank_to_none(&self.color);
        product.material = blank_to_none(&self.material);
        product.tags = normalize_tags(&self.tags);
        product.active = self.active;
        product.featured = self.featured;
    }
}

// =============================================================================
// Shop Settings
// =============================================================================

/// Single-row shop configuration edited from the admin area.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShopSettings {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<String>,
    /// Day-to-day open/closed switch.
    pub open: bool,
    /// Master switch; an inactive shop never operates.
    pub active: bool,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ShopSettings {
    pub fn is_operating(&self) -> bool {
        self.open && self.active
    }

    /// Flips `open` and returns the new value.
    pub fn toggle_open(&mut self) -> bool {
        self.open = !self.open;
        self.updated_at = Utc::now();
        self.open
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShopSettingsInput {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl ShopSettingsInput {
    pub fn apply_to(&self, settings: &mut ShopSettings) -> CoreResult<()> {
        validate_name("name", &self.name, 100)?;
        if let Some(phone) = blank_to_none(&self.phone) {
            validate_phone(&phone)?;
        }
        validate_optional_text("address", self.address.as_deref(), 200)?;
        validate_optional_text("opening_hours", self.opening_hours.as_deref(), 200)?;

        settings.name = self.name.trim().to_string();
        settings.phone = blank_to_none(&self.phone);
        settings.address = blank_to_none(&self.address);
        settings.opening_hours = blank_to_none(&self.opening_hours);
        settings.active = self.active;
        settings.updated_at = Utc::now();
        Ok(())
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A clothing customer, keyed by phone and upserted at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub purchase_count: i64,
    pub total_spent: Money,
    #[ts(as = "Option<String>")]
    pub last_purchase_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Trims tags, drops empty ones and removes case-insensitive duplicates,
/// keeping first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(tags.len());
    let mut out = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let key = tag.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(tag.to_string());
        }
    }
    out
}

fn blank_to_none(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn default_true() -> bool {
    true
}

fn default_duration() -> i64 {
    DEFAULT_SERVICE_DURATION_MINUTES
}

fn default_minimum_stock() -> i64 {
    DEFAULT_MINIMUM_STOCK
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn corte() -> Service {
        ServiceInput {
            name: "Corte Masculino".to_string(),
            description: Some("Corte com máquina e tesoura".to_string()),
            price: Money::from_cents(3500),
            category: "Cabelo".to_string(),
            available: true,
            featured: true,
            duration_minutes: 30,
            tags: vec!["degradê".to_string(), "Tesoura".to_string()],
        }
        .build()
        .unwrap()
    }

    #[test]
    fn test_service_matches_term() {
        let service = corte();
        assert!(service.matches_term(""));
        assert!(service.matches_term("CORTE"));
        assert!(service.matches_term("máquina"));
        assert!(service.matches_term("cabelo"));
        assert!(service.matches_term("tesoura"));
        assert!(!service.matches_term("tesou"));
        assert!(!service.matches_term("barba"));
    }

    #[test]
    fn test_service_input_defaults_from_json() {
        let input: ServiceInput = serde_json::from_str(
            r#"{"name":"Barba","price":2500,"category":"Barba","tags":[" navalha ","","Navalha"]}"#,
        )
        .unwrap();
        let service = input.build().unwrap();

        assert!(service.available);
        assert!(!service.featured);
        assert_eq!(service.duration_minutes, DEFAULT_SERVICE_DURATION_MINUTES);
        assert_eq!(service.tags, vec!["navalha".to_string()]);
    }

    #[test]
    fn test_service_input_validation() {
        let mut input: ServiceInput =
            serde_json::from_str(r#"{"name":"","price":2500,"category":"Barba"}"#).unwrap();
        assert!(input.build().is_err());

        input.name = "Barba".to_string();
        input.duration_minutes = 0;
        assert!(input.build().is_err());

        input.duration_minutes = 45;
        input.price = Money::from_cents(-10);
        assert!(input.build().is_err());
    }

    #[test]
    fn test_product_input_build_and_apply() {
        let input: ProductInput = serde_json::from_str(
            r#"{"name":"Short Esportivo","category":"Shorts","price":4590,"costPrice":2200,
                "stock":{"pp":0,"p":8,"m":15,"g":12,"gg":5},"brand":" "}"#,
        )
        .unwrap();
        let mut product = input.build().unwrap();

        assert_eq!(product.total_stock(), 40);
        assert_eq!(product.minimum_stock, DEFAULT_MINIMUM_STOCK);
        assert_eq!(product.brand, None);
        assert_eq!(product.version, 1);

        let id = product.id.clone();
        let mut edit = input.clone();
        edit.stock.m = -1;
        assert!(edit.apply_to(&mut product).is_err());

        edit.stock.m = 3;
        edit.apply_to(&mut product).unwrap();
        assert_eq!(product.id, id);
        assert_eq!(product.total_stock(), 28);
    }

    #[test]
    fn test_professional_input() {
        let input = ProfessionalInput {
            full_name: "Carlos Barbeiro".to_string(),
            phone: Some("11 98888-7777".to_string()),
            email: None,
            specialties: vec!["Corte".to_string(), "corte".to_string(), "Barba".to_string()],
            bio: None,
            years_experience: 8,
            rating: Some(4.5),
            active: true,
        };
        let professional = input.build().unwrap();
        assert_eq!(professional.specialties, vec!["Corte", "Barba"]);

        let mut bad = input.clone();
        bad.years_experience = -1;
        assert!(bad.build().is_err());

        let mut bad = input.clone();
        bad.rating = Some(5.5);
        assert!(bad.build().is_err());
    }

    #[test]
    fn test_shop_settings_operating() {
        let mut settings = ShopSettings {
            name: "Barbearia".to_string(),
            phone: None,
            address: None,
            opening_hours: None,
            open: true,
            active: true,
            updated_at: Utc::now(),
        };
        assert!(settings.is_operating());

        assert!(!settings.toggle_open());
        assert!(!settings.is_operating());
        assert!(settings.toggle_open());

        settings.active = false;
        assert!(!settings.is_operating());
    }

    #[test]
    fn test_shop_settings_input() {
        let mut settings = ShopSettings {
            name: "Old".to_string(),
            phone: None,
            address: None,
            opening_hours: None,
            open: false,
            active: true,
            updated_at: Utc::now(),
        };
        let input = ShopSettingsInput {
            name: " Barbearia do Zé ".to_string(),
            phone: Some("(11) 3333-4444".to_string()),
            address: Some("Rua A, 10".to_string()),
            opening_hours: Some("Seg-Sáb 9h-19h".to_string()),
            active: true,
        };
        input.apply_to(&mut settings).unwrap();
        assert_eq!(settings.name, "Barbearia do Zé");
        assert!(!settings.open);
    }
}
