//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Delta-based stock adjustment
//! - Low-stock listing for the replenishment report
//!
//! ## Stock Update Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                                                                     │
//! │  ❌ WRONG: read-modify-write from application memory                │
//! │     let p = get(id); p.stock -= 3; update(p);                       │
//! │     (two concurrent sales both read stock=4, both write 1)          │
//! │                                                                     │
//! │  ✅ CORRECT: conditional delta update in SQL                        │
//! │     UPDATE products SET stock = stock + δ                           │
//! │     WHERE id = ? AND stock + δ >= 0                                 │
//! │                                                                     │
//! │  The store serializes the two updates; the second one either sees   │
//! │  the decremented count or is rejected. Stock can never go           │
//! │  negative no matter the interleaving.                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::validation::{validate_low_stock_threshold, validate_name, validate_price_cents};
use tally_core::{CoreError, Product};

/// Fields for creating a product; id and timestamps are generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub stock: i64,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub low_stock_threshold: i64,
    pub branch_id: String,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const PRODUCT_COLUMNS: &str = "id, name, stock, cost_price_cents, selling_price_cents, \
     low_stock_threshold, branch_id, created_at, updated_at";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists the products stocked at one branch.
    pub async fn list_for_branch(&self, branch_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE branch_id = ?1 ORDER BY name"
        ))
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    pub async fn insert(&self, new: NewProduct) -> DbResult<Product> {
        validate_catalogue_fields(
            &new.name,
            new.cost_price_cents,
            new.selling_price_cents,
            new.low_stock_threshold,
        )?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            stock: new.stock,
            cost_price_cents: new.cost_price_cents,
            selling_price_cents: new.selling_price_cents,
            low_stock_threshold: new.low_stock_threshold,
            branch_id: new.branch_id,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, stock, cost_price_cents, selling_price_cents,
                low_stock_threshold, branch_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.stock)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.low_stock_threshold)
        .bind(&product.branch_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Updates an existing product's catalogue fields and stock.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_catalogue_fields(
            &product.name,
            product.cost_price_cents,
            product.selling_price_cents,
            product.low_stock_threshold,
        )?;

        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                stock = ?3,
                cost_price_cents = ?4,
                selling_price_cents = ?5,
                low_stock_threshold = ?6,
                branch_id = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.stock)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.low_stock_threshold)
        .bind(&product.branch_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adjusts product stock by a delta (negative for outgoing units,
    /// positive for restocking).
    ///
    /// The update is conditional on the result staying non-negative, so
    /// concurrent adjustments serialize correctly at the store. Fails
    /// with `InsufficientStock` when the delta would drive stock below
    /// zero.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing product from an insufficient one.
            let product = self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", id))?;
            return Err(DbError::Domain(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock,
                requested: -delta,
            }));
        }

        Ok(())
    }

    /// Products sitting below their low-stock threshold, ordered by name.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE stock < low_stock_threshold ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Deletes a product.
    ///
    /// Historical sales survive: the schema nulls their product
    /// reference rather than cascading. No stock reconciliation happens
    /// on this path.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for dashboards and diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Rejects bad catalogue input before any SQL runs, so callers see a
/// `ValidationError` instead of a raw constraint failure from the store.
fn validate_catalogue_fields(
    name: &str,
    cost_price_cents: i64,
    selling_price_cents: i64,
    low_stock_threshold: i64,
) -> DbResult<()> {
    validate_name(name).map_err(CoreError::from)?;
    validate_price_cents(cost_price_cents).map_err(CoreError::from)?;
    validate_price_cents(selling_price_cents).map_err(CoreError::from)?;
    validate_low_stock_threshold(low_stock_threshold).map_err(CoreError::from)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
