//! # barbearia-core: Pure Business Logic for the Barbershop Backend
//!
//! Domain types and rules shared by the database layer and the HTTP server.
//! Nothing in here touches a database, the network or the file system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/server (axum JSON API)                    │   │
//! │  │   /api/services  /api/appointments  /api/sales  /api/dashboard  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                barbearia-db (SQLite repositories)               │   │
//! │  │          queries, migrations, transactional checkout            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ barbearia-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   slots        stock         appointment     sale / stats       │   │
//! │  │   generator    ledger        state machine   totals, KPIs       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`slots`] - Time slot generation for a professional's day
//! - [`stock`] - Products, size buckets and the sale deduction ledger
//! - [`appointment`] - Bookings and their status machine
//! - [`sale`] - Line items, totals, sale numbers
//! - [`stats`] - Dashboard KPIs and breakdowns
//! - [`types`] - Services, professionals, shop settings, customers
//! - [`notify`] - WhatsApp message templates
//! - [`money`] - Integer centavos
//! - [`time`] - Wall-clock and period helpers
//! - [`validation`] - Input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use barbearia_core::slots::generate_slots;
//! use chrono::{NaiveDate, NaiveTime};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//! let start = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
//! let end = NaiveTime::from_hms_opt(8, 50, 0).unwrap();
//!
//! // The trailing 20 minutes do not fit a 30-minute slot.
//! let slots = generate_slots("prof-1", date, start, end, 30, None).unwrap();
//! assert_eq!(slots.len(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod appointment;
pub mod error;
pub mod money;
pub mod notify;
pub mod sale;
pub mod slots;
pub mod stats;
pub mod stock;
pub mod time;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use appointment::{Appointment, AppointmentStatus, NewAppointment};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use sale::{NewSale, NewSaleItem, PaymentMethod, Sale, SaleLineItem, SaleStatus};
pub use slots::TimeSlot;
pub use stock::{OversellPolicy, Product, ProductView, SizeBucket, StockCounts, StockMovement};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity on one sale line.
///
/// Catches typos like 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest accepted price or discount: R$ 1.000.000,00.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Highest count a single size bucket may hold.
pub const MAX_STOCK_PER_SIZE: i64 = 1_000_000;

pub const DEFAULT_SLOT_INTERVAL_MINUTES: u32 = 30;

/// Longest slot the generator accepts.
pub const MAX_SLOT_INTERVAL_MINUTES: u32 = 240;

pub const DEFAULT_SERVICE_DURATION_MINUTES: i64 = 30;

/// Products at or below this many units are flagged as low stock.
pub const DEFAULT_MINIMUM_STOCK: i64 = 5;

/// Default window for sales statistics.
pub const DEFAULT_PERIOD_DAYS: u32 = 30;

pub const MAX_PERIOD_DAYS: u32 = 365;

/// Autocomplete ignores shorter terms.
pub const QUICK_SEARCH_MIN_CHARS: usize = 2;

pub const QUICK_SEARCH_LIMIT: usize = 10;

/// Appointments shown on the dashboard.
pub const RECENT_APPOINTMENTS_LIMIT: i64 = 10;
