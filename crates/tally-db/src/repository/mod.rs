//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                     │
//! │                                                                     │
//! │  Repositories abstract database access behind a clean API.          │
//! │                                                                     │
//! │  Caller                                                             │
//! │       │  db.sales().record_sale(new_sale)                           │
//! │       ▼                                                             │
//! │  SaleRepository                                                     │
//! │  ├── record_sale(&self, new_sale)   ← stock + sale in one tx        │
//! │  ├── edit_sale(&self, id, update)                                   │
//! │  └── delete_sale(&self, id)                                         │
//! │       │  SQL                                                        │
//! │       ▼                                                             │
//! │  SQLite Database                                                    │
//! │                                                                     │
//! │  Benefits:                                                          │
//! │  • SQL is isolated in one place                                     │
//! │  • The stock/sale atomicity rule is enforced in exactly one spot    │
//! │  • Easy to test against an in-memory database                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`branch::BranchRepository`] - Branch CRUD and branch detail
//! - [`product::ProductRepository`] - Product CRUD, stock, low-stock list
//! - [`sale::SaleRepository`] - Sale reconciliation and listings
//! - [`user::UserRepository`] - Accounts, groups, shopkeeper permissions
//! - [`report::ReportRepository`] - Revenue/profit aggregation

pub mod branch;
pub mod product;
pub mod report;
pub mod sale;
pub mod user;
