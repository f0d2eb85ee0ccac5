//! # tally-db: Database Layer for Tally
//!
//! This crate provides database access for the Tally shop manager.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Tally Data Flow                              │
//! │                                                                     │
//! │  Caller (dashboard handler, export job, seed tool)                  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                    tally-db (THIS CRATE)                      │ │
//! │  │                                                               │ │
//! │  │  ┌─────────────┐   ┌────────────────┐   ┌─────────────────┐  │ │
//! │  │  │  Database   │   │  Repositories  │   │   Migrations    │  │ │
//! │  │  │  (pool.rs)  │   │ branch/product │   │   (embedded)    │  │ │
//! │  │  │             │◄──│ sale/user      │   │ 001_initial_    │  │ │
//! │  │  │ SqlitePool  │   │ report         │   │   schema.sql    │  │ │
//! │  │  └─────────────┘   └────────────────┘   └─────────────────┘  │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite Database (single file, WAL mode)                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repositories (branch, product, sale, user, report)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/tally.db")).await?;
//!
//! // Record a sale; stock is reconciled in the same transaction.
//! let sale = db.sales().record_sale(new_sale).await?;
//!
//! // Owner dashboard numbers.
//! let summary = db.reports().dashboard_summary(Utc::now()).await?;
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

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::branch::BranchRepository;
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::report::ReportRepository;
pub use repository::sale::{NewSale, SaleFilter, SaleRepository, SaleUpdate};
pub use repository::user::{ShopkeeperOverview, UserRepository};
