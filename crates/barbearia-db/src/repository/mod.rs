//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                                                           │
//! │       │  db.sales().record_sale(&request, policy)                       │
//! │       ▼                                                                 │
//! │  SaleRepository                                                         │
//! │  ├── loads rows into FromRow structs (SaleRow, SaleItemRow)             │
//! │  ├── converts them into core types (Sale, SaleLineItem)                 │
//! │  └── lets barbearia-core decide (totals, stock deduction)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! │                                                                         │
//! │  Row structs never leave this crate; callers only see core types.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SettingsRepository`](settings::SettingsRepository) - Shop settings row
//! - [`ProfessionalRepository`](professional::ProfessionalRepository) - Barbers
//! - [`ServiceRepository`](service::ServiceRepository) - Catalog and search
//! - [`SlotRepository`](slot::SlotRepository) - Time slots
//! - [`AppointmentRepository`](appointment::AppointmentRepository) - Booking and status
//! - [`ProductRepository`](product::ProductRepository) - Clothing inventory
//! - [`SaleRepository`](sale::SaleRepository) - Checkout and sale history
//! - [`CustomerRepository`](customer::CustomerRepository) - Purchase history by phone
//! - [`ReportRepository`](report::ReportRepository) - Dashboard and statistics

pub mod appointment;
pub mod customer;
pub mod product;
pub mod professional;
pub mod report;
pub mod sale;
pub mod service;
pub mod settings;
pub mod slot;

use crate::error::DbResult;

/// Encodes a list column (`tags`, `specialties`) as a JSON array.
pub(crate) fn encode_list(values: &[String]) -> DbResult<String> {
    Ok(serde_json::to_string(values)?)
}

/// Decodes a JSON array column. An empty string reads as an empty list.
pub(crate) fn decode_list(raw: &str) -> DbResult<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Database, DbConfig};

    pub(crate) async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_columns() {
        let tags = vec!["degradê".to_string(), "tesoura".to_string()];
        let raw = encode_list(&tags).unwrap();
        assert_eq!(decode_list(&raw).unwrap(), tags);
        assert!(decode_list("").unwrap().is_empty());
        assert!(decode_list("not json").is_err());
    }
}
