//! # barbearia-db: Database Layer for the Barbershop Backend
//!
//! SQLite storage through sqlx. Every query of the system lives here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Request Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   barbearia-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ SaleRepo       │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo    │    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs on   │    │ AppointmentRepo│    │ _schema.sql  │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  barbearia.db (platform data dir, or BARBEARIA_DATABASE_PATH)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use barbearia_db::{Database, DbConfig};
//! use barbearia_core::OversellPolicy;
//!
//! let db = Database::new(DbConfig::new("barbearia.db")).await?;
//!
//! let services = db.services().quick_search("cor").await?;
//! let sale = db.sales().record_sale(&request, OversellPolicy::Clamp).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::appointment::{AppointmentFilter, AppointmentRepository};
pub use repository::customer::CustomerRepository;
pub use repository::product::{ProductQuery, ProductRepository};
pub use repository::professional::ProfessionalRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
pub use repository::service::{ServiceQuery, ServiceRepository};
pub use repository::settings::SettingsRepository;
pub use repository::slot::SlotRepository;
