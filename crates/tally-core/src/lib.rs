//! # tally-core: Pure Business Logic for Tally
//!
//! This crate is the **heart** of the Tally shop manager. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                           │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │          Presentation / Auth / PDF (external collaborators)   │ │
//! │  └─────────────────────────────┬─────────────────────────────────┘ │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │               ★ tally-core (THIS CRATE) ★                     │ │
//! │  │                                                               │ │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ │ │
//! │  │  │  types  │ │  money  │ │ access  │ │ report  │ │validate │ │ │
//! │  │  │ Product │ │  Money  │ │  Role   │ │ Window  │ │  rules  │ │ │
//! │  │  │  Sale   │ │  cents  │ │  gates  │ │ profit  │ │  checks │ │ │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘ │ │
//! │  │                                                               │ │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │ │
//! │  └─────────────────────────────┬─────────────────────────────────┘ │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │                  tally-db (Database Layer)                    │ │
//! │  │        SQLite queries, migrations, reconciliation             │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Branch, Product, Sale, UserAccount, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`access`] - Role resolution and capability gates
//! - [`report`] - Reporting windows and aggregate math
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::Money` instead of
// `use tally_core::money::Money`

pub use access::{Dashboard, Role};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use report::{DashboardSummary, ReportWindow};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single sale line.
///
/// ## Business Reason
/// Prevents accidental over-recording (e.g., typing 1000 instead of 10).
/// Configurable per-shop in future versions.
pub const MAX_SALE_QUANTITY: i64 = 999;

/// Default low-stock threshold assigned to new products.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
