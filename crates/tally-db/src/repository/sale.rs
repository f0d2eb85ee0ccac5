//! # Sale Repository
//!
//! Database operations for sales, including the stock reconciliation
//! that keeps the inventory ledger consistent with the sales log.
//!
//! ## Reconciliation Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  record_sale   stock -= quantity      (rejected if it would go <0) │
//! │  edit_sale     stock += old - new     (rejected if it would go <0) │
//! │  delete_sale   stock += quantity      (never rejected)             │
//! │                                                                     │
//! │  Each operation runs in ONE transaction: the stock delta and the    │
//! │  sale row commit together or not at all. The delta itself is a      │
//! │  conditional UPDATE, so two concurrent sales of the last unit       │
//! │  cannot both succeed.                                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A sale whose product has since been deleted (product reference is
//! NULL) keeps its historical amounts. Its quantity can no longer be
//! edited, because there is no ledger row to reconcile against.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::validation::{validate_amount_cents, validate_quantity};
use tally_core::{CoreError, PaymentMode, Product, ReportWindow, Sale};

/// Fields for recording a sale; the branch is taken from the product
/// and the id and timestamp are generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    pub product_id: String,
    pub quantity_sold: i64,
    pub amount_paid_cents: i64,
    pub amount_left_cents: i64,
    pub mode: PaymentMode,
    pub shopkeeper_id: Option<String>,
}

/// Partial update for an existing sale. `None` fields keep their
/// current value. The product reference is fixed at creation and
/// cannot be changed here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleUpdate {
    pub customer_name: Option<Option<String>>,
    pub customer_contact: Option<Option<String>>,
    pub quantity_sold: Option<i64>,
    pub amount_paid_cents: Option<i64>,
    pub amount_left_cents: Option<i64>,
    pub mode: Option<PaymentMode>,
}

/// Filter for the sales log. All criteria are optional and combine
/// with AND; the customer filter is a case-insensitive substring match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleFilter {
    pub window: ReportWindow,
    pub customer: Option<String>,
    pub shopkeeper_id: Option<String>,
    pub branch_id: Option<String>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

const SALE_COLUMNS: &str = "id, customer_name, customer_contact, product_id, quantity_sold, \
     amount_paid_cents, amount_left_cents, mode, shopkeeper_id, branch_id, timestamp";

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale and decrements the product's stock atomically.
    ///
    /// Fails with `InsufficientStock` when fewer units are on hand than
    /// requested; in that case nothing is written.
    pub async fn record_sale(&self, new: NewSale) -> DbResult<Sale> {
        validate_quantity(new.quantity_sold).map_err(CoreError::from)?;
        validate_amount_cents(new.amount_paid_cents).map_err(CoreError::from)?;
        validate_amount_cents(new.amount_left_cents).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, stock, cost_price_cents, selling_price_cents, \
             low_stock_threshold, branch_id, created_at, updated_at \
             FROM products WHERE id = ?1",
        )
        .bind(&new.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Product", &new.product_id))?;

        let decremented = sqlx::query(
            "UPDATE products SET stock = stock - ?2, updated_at = ?3 \
             WHERE id = ?1 AND stock >= ?2",
        )
        .bind(&product.id)
        .bind(new.quantity_sold)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            return Err(DbError::Domain(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock,
                requested: new.quantity_sold,
            }));
        }

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            customer_name: new.customer_name,
            customer_contact: new.customer_contact,
            product_id: Some(product.id.clone()),
            quantity_sold: new.quantity_sold,
            amount_paid_cents: new.amount_paid_cents,
            amount_left_cents: new.amount_left_cents,
            mode: new.mode,
            shopkeeper_id: new.shopkeeper_id,
            branch_id: product.branch_id.clone(),
            timestamp: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_name, customer_contact, product_id, quantity_sold,
                amount_paid_cents, amount_left_cents, mode, shopkeeper_id,
                branch_id, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_name)
        .bind(&sale.customer_contact)
        .bind(&sale.product_id)
        .bind(sale.quantity_sold)
        .bind(sale.amount_paid_cents)
        .bind(sale.amount_left_cents)
        .bind(sale.mode)
        .bind(&sale.shopkeeper_id)
        .bind(&sale.branch_id)
        .bind(sale.timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            product_id = %product.id,
            quantity = %sale.quantity_sold,
            "Recorded sale"
        );

        Ok(sale)
    }

    /// Applies a partial edit to a sale, reconciling stock by the
    /// quantity delta when the quantity changes.
    ///
    /// Lowering the quantity returns units to stock; raising it draws
    /// more and fails with `InsufficientStock` when they are not on
    /// hand. Quantity edits on a sale whose product was deleted are
    /// rejected with `OrphanSaleQuantityEdit`.
    pub async fn edit_sale(&self, id: &str, update: SaleUpdate) -> DbResult<Sale> {
        if let Some(amount) = update.amount_paid_cents {
            validate_amount_cents(amount).map_err(CoreError::from)?;
        }
        if let Some(amount) = update.amount_left_cents {
            validate_amount_cents(amount).map_err(CoreError::from)?;
        }

        let mut tx = self.pool.begin().await?;

        let mut sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))?;

        if let Some(new_quantity) = update.quantity_sold {
            if new_quantity != sale.quantity_sold {
                validate_quantity(new_quantity).map_err(CoreError::from)?;

                let product_id = sale.product_id.clone().ok_or(DbError::Domain(
                    CoreError::OrphanSaleQuantityEdit {
                        sale_id: sale.id.clone(),
                    },
                ))?;

                let delta = sale.quantity_sold - new_quantity;
                let adjusted = sqlx::query(
                    "UPDATE products SET stock = stock + ?2, updated_at = ?3 \
                     WHERE id = ?1 AND stock + ?2 >= 0",
                )
                .bind(&product_id)
                .bind(delta)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;

                if adjusted.rows_affected() == 0 {
                    let product = sqlx::query_as::<_, Product>(
                        "SELECT id, name, stock, cost_price_cents, selling_price_cents, \
                         low_stock_threshold, branch_id, created_at, updated_at \
                         FROM products WHERE id = ?1",
                    )
                    .bind(&product_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| DbError::not_found("Product", &product_id))?;

                    return Err(DbError::Domain(CoreError::InsufficientStock {
                        product: product.name,
                        available: product.stock,
                        requested: -delta,
                    }));
                }

                sale.quantity_sold = new_quantity;
            }
        }

        if let Some(customer_name) = update.customer_name {
            sale.customer_name = customer_name;
        }
        if let Some(customer_contact) = update.customer_contact {
            sale.customer_contact = customer_contact;
        }
        if let Some(amount_paid) = update.amount_paid_cents {
            sale.amount_paid_cents = amount_paid;
        }
        if let Some(amount_left) = update.amount_left_cents {
            sale.amount_left_cents = amount_left;
        }
        if let Some(mode) = update.mode {
            sale.mode = mode;
        }

        sqlx::query(
            r#"
            UPDATE sales SET
                customer_name = ?2,
                customer_contact = ?3,
                quantity_sold = ?4,
                amount_paid_cents = ?5,
                amount_left_cents = ?6,
                mode = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_name)
        .bind(&sale.customer_contact)
        .bind(sale.quantity_sold)
        .bind(sale.amount_paid_cents)
        .bind(sale.amount_left_cents)
        .bind(sale.mode)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(sale_id = %sale.id, "Edited sale");

        Ok(sale)
    }

    /// Deletes a sale, returning its units to stock when the product
    /// still exists.
    pub async fn delete_sale(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))?;

        if let Some(product_id) = &sale.product_id {
            sqlx::query(
                "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
            )
            .bind(product_id)
            .bind(sale.quantity_sold)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(sale_id = %id, quantity = %sale.quantity_sold, "Deleted sale");

        Ok(())
    }

    /// Gets a sale by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists the most recent sales, newest first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY timestamp DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists sales inside a half-open time window, newest first.
    pub async fn list_in(&self, window: ReportWindow) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE (?1 IS NULL OR timestamp >= ?1) AND (?2 IS NULL OR timestamp < ?2) \
             ORDER BY timestamp DESC"
        ))
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists one shopkeeper's sales inside a half-open time window,
    /// newest first.
    pub async fn list_for_shopkeeper_in(
        &self,
        shopkeeper_id: &str,
        window: ReportWindow,
    ) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE shopkeeper_id = ?1 \
               AND (?2 IS NULL OR timestamp >= ?2) AND (?3 IS NULL OR timestamp < ?3) \
             ORDER BY timestamp DESC"
        ))
        .bind(shopkeeper_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists sales matching a combined filter, newest first.
    pub async fn list_filtered(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let customer_pattern = filter
            .customer
            .as_ref()
            .map(|c| format!("%{}%", c.to_lowercase()));

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE (?1 IS NULL OR timestamp >= ?1) AND (?2 IS NULL OR timestamp < ?2) \
               AND (?3 IS NULL OR LOWER(COALESCE(customer_name, '')) LIKE ?3) \
               AND (?4 IS NULL OR shopkeeper_id = ?4) \
               AND (?5 IS NULL OR branch_id = ?5) \
             ORDER BY timestamp DESC"
        ))
        .bind(filter.window.start)
        .bind(filter.window.end)
        .bind(customer_pattern)
        .bind(&filter.shopkeeper_id)
        .bind(&filter.branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Counts all sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;

    async fn setup(stock: i64) -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let branch = db.branches().insert("Main", "High Street").await.unwrap();
        let product = db
            .products()
            .insert(NewProduct {
                name: "Eau de Parfum 50ml".to_string(),
                stock,
                cost_price_cents: 500,
                selling_price_cents: 800,
                low_stock_threshold: 5,
                branch_id: branch.id,
            })
            .await
            .unwrap();
        (db, product)
    }

    fn new_sale(product_id: &str, quantity: i64) -> NewSale {
        NewSale {
            customer_name: Some("Ama".to_string()),
            customer_contact: None,
            product_id: product_id.to_string(),
            quantity_sold: quantity,
            amount_paid_cents: 800 * quantity,
            amount_left_cents: 0,
            mode: PaymentMode::Cash,
            shopkeeper_id: None,
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_record_edit_delete_round_trip_restores_stock() {
        let (db, product) = setup(10).await;
        let sales = db.sales();

        let sale = sales.record_sale(new_sale(&product.id, 4)).await.unwrap();
        assert_eq!(stock_of(&db, &product.id).await, 6);

        let edited = sales
            .edit_sale(
                &sale.id,
                SaleUpdate {
                    quantity_sold: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.quantity_sold, 2);
        assert_eq!(stock_of(&db, &product.id).await, 8);

        sales.delete_sale(&sale.id).await.unwrap();
        assert_eq!(stock_of(&db, &product.id).await, 10);
        assert!(sales.get_by_id(&sale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_sale_insufficient_stock_writes_nothing() {
        let (db, product) = setup(3).await;

        let err = db
            .sales()
            .record_sale(new_sale(&product.id, 5))
            .await
            .unwrap_err();
        assert!(err.is_insufficient_stock());

        assert_eq!(stock_of(&db, &product.id).await, 3);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_sale_exact_stock_reaches_zero() {
        let (db, product) = setup(3).await;

        db.sales().record_sale(new_sale(&product.id, 3)).await.unwrap();
        assert_eq!(stock_of(&db, &product.id).await, 0);
    }

    #[tokio::test]
    async fn test_edit_sale_raising_quantity_beyond_stock_fails() {
        let (db, product) = setup(10).await;
        let sales = db.sales();

        let sale = sales.record_sale(new_sale(&product.id, 4)).await.unwrap();

        // 6 units remain; going to 11 needs 7 more.
        let err = sales
            .edit_sale(
                &sale.id,
                SaleUpdate {
                    quantity_sold: Some(11),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_insufficient_stock());

        assert_eq!(stock_of(&db, &product.id).await, 6);
        let unchanged = sales.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(unchanged.quantity_sold, 4);
    }

    #[tokio::test]
    async fn test_edit_sale_non_quantity_fields() {
        let (db, product) = setup(10).await;
        let sales = db.sales();

        let sale = sales.record_sale(new_sale(&product.id, 2)).await.unwrap();

        let edited = sales
            .edit_sale(
                &sale.id,
                SaleUpdate {
                    customer_name: Some(Some("Kofi".to_string())),
                    amount_paid_cents: Some(1500),
                    amount_left_cents: Some(100),
                    mode: Some(PaymentMode::MobileMoney),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.customer_name.as_deref(), Some("Kofi"));
        assert_eq!(edited.amount_paid_cents, 1500);
        assert_eq!(edited.mode, PaymentMode::MobileMoney);
        // No quantity change, so stock is untouched.
        assert_eq!(stock_of(&db, &product.id).await, 8);
    }

    #[tokio::test]
    async fn test_orphan_sale_quantity_edit_rejected() {
        let (db, product) = setup(10).await;
        let sales = db.sales();

        let sale = sales.record_sale(new_sale(&product.id, 2)).await.unwrap();
        db.products().delete(&product.id).await.unwrap();

        let err = sales
            .edit_sale(
                &sale.id,
                SaleUpdate {
                    quantity_sold: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::OrphanSaleQuantityEdit { .. })
        ));

        // Non-quantity edits still go through.
        let edited = sales
            .edit_sale(
                &sale.id,
                SaleUpdate {
                    customer_name: Some(Some("Walk-in".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.customer_name.as_deref(), Some("Walk-in"));
    }

    #[tokio::test]
    async fn test_delete_orphan_sale_skips_stock_restore() {
        let (db, product) = setup(10).await;
        let sales = db.sales();

        let sale = sales.record_sale(new_sale(&product.id, 2)).await.unwrap();
        db.products().delete(&product.id).await.unwrap();

        sales.delete_sale(&sale.id).await.unwrap();
        assert_eq!(sales.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_sale_rejects_zero_quantity() {
        let (db, product) = setup(10).await;

        let err = db
            .sales()
            .record_sale(new_sale(&product.id, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_record_sale_rejects_negative_amounts() {
        let (db, product) = setup(10).await;

        let mut bad = new_sale(&product.id, 1);
        bad.amount_paid_cents = -5000;
        let err = db.sales().record_sale(bad).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let mut bad = new_sale(&product.id, 1);
        bad.amount_left_cents = -1;
        let err = db.sales().record_sale(bad).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        // No sale row, no stock movement, no phantom revenue.
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(stock_of(&db, &product.id).await, 10);
        assert_eq!(
            db.reports()
                .revenue_in(ReportWindow::all_time())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_edit_sale_rejects_negative_amounts() {
        let (db, product) = setup(10).await;
        let sales = db.sales();

        let sale = sales.record_sale(new_sale(&product.id, 2)).await.unwrap();

        let err = sales
            .edit_sale(
                &sale.id,
                SaleUpdate {
                    amount_paid_cents: Some(-100),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let unchanged = sales.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(unchanged.amount_paid_cents, 1600);
    }

    #[tokio::test]
    async fn test_list_filtered_by_customer_substring() {
        let (db, product) = setup(50).await;
        let sales = db.sales();

        sales.record_sale(new_sale(&product.id, 1)).await.unwrap();
        let mut other = new_sale(&product.id, 1);
        other.customer_name = Some("Kwabena Mensah".to_string());
        sales.record_sale(other).await.unwrap();

        let filter = SaleFilter {
            customer: Some("mensah".to_string()),
            ..Default::default()
        };
        let matched = sales.list_filtered(&filter).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].customer_name.as_deref(), Some("Kwabena Mensah"));
    }

    #[tokio::test]
    async fn test_list_for_shopkeeper_in_window() {
        let (db, product) = setup(50).await;
        let sales = db.sales();

        let branch = db.branches().list().await.unwrap().remove(0);
        let keeper = db
            .users()
            .register_shopkeeper("yaa", "yaa@example.com")
            .await
            .unwrap();

        let mut mine = new_sale(&product.id, 1);
        mine.shopkeeper_id = Some(keeper.id.clone());
        sales.record_sale(mine).await.unwrap();
        sales.record_sale(new_sale(&product.id, 1)).await.unwrap();

        let listed = sales
            .list_for_shopkeeper_in(&keeper.id, ReportWindow::all_time())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].branch_id, branch.id);
    }
}
