//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  tally-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  tally-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures, wraps          │
//! │                         CoreError raised inside transactions        │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → DbError → caller               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, quantities, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::access::Role;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// These should be caught and translated to user-friendly messages; none
/// of them implies any state was mutated.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale (creation or quantity edit) asked for more units than the
    /// product has on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Record sale (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Body Mist 100ml", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Form shows: "Insufficient stock for this product."
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Caller's role does not permit the operation. Surfaced as a
    /// redirect to the caller's own dashboard, not as a hard failure.
    #[error("Access denied: requires {required:?} role")]
    AccessDenied { required: Role },

    /// Quantity edit targets a sale whose product reference was nulled
    /// and tries to change the quantity (there is no stock to reconcile
    /// against).
    #[error("Sale {sale_id} has no product; quantity cannot be changed")]
    OrphanSaleQuantityEdit { sale_id: String },

    /// A user tried to deactivate their own account.
    #[error("You cannot deactivate your own account")]
    SelfDeactivation,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when input doesn't meet requirements, before any business
/// logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
