//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌───────────────┐    ┌────────────────┐    ┌──────────────────┐   │
//! │  │    Branch     │1──*│    Product     │1──*│      Sale        │   │
//! │  │  ───────────  │    │  ────────────  │    │  ──────────────  │   │
//! │  │  id (UUID)    │    │  id (UUID)     │    │  id (UUID)       │   │
//! │  │  name         │    │  stock (>= 0)  │    │  quantity_sold   │   │
//! │  │  location     │    │  cost/selling  │    │  amount_paid     │   │
//! │  └───────────────┘    │  price cents   │    │  amount_left     │   │
//! │                       └────────────────┘    │  mode            │   │
//! │                                             └──────────────────┘   │
//! │                                                                     │
//! │  ┌───────────────┐    ┌──────────────────────┐                     │
//! │  │  UserAccount  │1──1│ ShopkeeperPermission │                     │
//! │  │  flags+groups │    │ can_edit_stock: bool │                     │
//! │  └───────────────┘    └──────────────────────┘                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A sale keeps an *optional* product reference: when a product is removed
//! from the catalogue the sale row survives with the reference nulled, so
//! the revenue history is never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Branch
// =============================================================================

/// A physical retail location owning its own inventory and sales.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Branch {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, e.g. "Osu Branch".
    pub name: String,

    /// Street address or neighbourhood.
    pub location: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product stocked at a branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on dashboards and receipts.
    pub name: String,

    /// Countable quantity available for sale.
    ///
    /// Invariant: >= 0 after any committed operation. Mutated only by the
    /// reconciliation code around sale creation/edit/deletion and by
    /// explicit stock adjustments.
    pub stock: i64,

    /// Acquisition cost per unit, in cents.
    pub cost_price_cents: i64,

    /// Selling price per unit, in cents.
    pub selling_price_cents: i64,

    /// Stock level at which the product appears on the low-stock report.
    pub low_stock_threshold: i64,

    /// Branch owning this product.
    pub branch_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Returns the cost price as a Money type.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Margin per unit: selling price minus cost price.
    #[inline]
    pub fn unit_margin(&self) -> Money {
        self.selling_price() - self.cost_price()
    }

    /// Checks whether the requested quantity can be fulfilled from stock.
    #[inline]
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Checks whether the product sits below its low-stock threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock < self.low_stock_threshold
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

/// How the customer settled (or partially settled) a sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Physical cash payment.
    Cash,
    /// Mobile money transfer.
    MobileMoney,
    /// Bank transfer.
    BankTransfer,
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Cash
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded point-of-sale transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,

    /// Optional walk-in customer details.
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,

    /// Product sold. Nulled if the product is later removed from the
    /// catalogue; the sale itself is never deleted on that path.
    pub product_id: Option<String>,

    /// Units sold. Always positive.
    pub quantity_sold: i64,

    /// Amount the customer has paid, in cents.
    pub amount_paid_cents: i64,

    /// Outstanding balance, in cents.
    pub amount_left_cents: i64,

    /// Payment mode used.
    pub mode: PaymentMode,

    /// The shopkeeper who recorded the sale. Nulled if the account is
    /// later removed.
    pub shopkeeper_id: Option<String>,

    /// Branch the sale belongs to, inherited from the product at
    /// creation time.
    pub branch_id: String,

    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl Sale {
    /// Returns the amount paid as Money.
    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }

    /// Returns the outstanding balance as Money.
    #[inline]
    pub fn amount_left(&self) -> Money {
        Money::from_cents(self.amount_left_cents)
    }

    /// Full price of the sale at the product's current selling price.
    pub fn total_price_with(&self, product: &Product) -> Money {
        product.selling_price().multiply_quantity(self.quantity_sold)
    }

    /// Profit realized by this sale, canonical formula:
    /// `(selling_price - cost_price) * quantity_sold`.
    ///
    /// See [`crate::report::margin_profit_cents`] for the single place the
    /// formula lives. A sale whose product reference has been nulled
    /// yields zero profit while still counting toward revenue.
    pub fn profit_with(&self, product: &Product) -> Money {
        Money::from_cents(crate::report::margin_profit_cents(
            product.selling_price_cents,
            product.cost_price_cents,
            self.quantity_sold,
        ))
    }
}

// =============================================================================
// Users & Groups
// =============================================================================

/// Group membership driving role resolution.
///
/// A user can belong to several groups; [`crate::access::resolve_role`]
/// picks the effective role in priority order.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Owner,
    Manager,
    Shopkeeper,
}

/// A staff account.
///
/// Credentials and session handling belong to the external auth provider;
/// this type only carries the identity and flags the access policy needs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub email: String,

    /// Staff flag: grants Owner-tier access regardless of groups.
    pub is_staff: bool,

    /// Superuser flag: grants Owner-tier access regardless of groups.
    pub is_superuser: bool,

    /// Deactivated accounts keep their history but cannot act.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Shopkeeper Permission
// =============================================================================

/// Per-shopkeeper stock-edit capability, one-to-one with the account.
///
/// Defaults to `can_edit_stock = false` at registration and is flippable
/// only by Owner-tier callers (see [`crate::access`]).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ShopkeeperPermission {
    pub shopkeeper_id: String,
    pub can_edit_stock: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================
