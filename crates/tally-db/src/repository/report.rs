//! # Report Repository
//!
//! Read-only aggregation over the sales log for the dashboards.
//!
//! ## Window Semantics
//! Every aggregate accepts a [`ReportWindow`], a half-open interval
//! `[start, end)` with either bound optional. `NULL` bounds collapse in
//! SQL via `(? IS NULL OR ...)`, so all-time and bounded windows share
//! one query.
//!
//! ## Profit
//! Profit is margin on what was sold: `(selling - cost) * quantity`,
//! summed per sale with a LEFT JOIN onto products. A sale whose product
//! was deleted still counts toward revenue but contributes zero profit,
//! because its prices are gone with the catalogue row.

use sqlx::SqlitePool;

use crate::error::DbResult;
use chrono::{DateTime, Utc};
use tally_core::report::{average_sale_value, DashboardSummary};
use tally_core::{Money, ReportWindow};

/// Repository for aggregate reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Total revenue (amounts paid) inside a window, in cents.
    pub async fn revenue_in(&self, window: ReportWindow) -> DbResult<i64> {
        let revenue: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_paid_cents), 0) FROM sales \
             WHERE (?1 IS NULL OR timestamp >= ?1) AND (?2 IS NULL OR timestamp < ?2)",
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(revenue)
    }

    /// Total profit inside a window, in cents.
    pub async fn profit_in(&self, window: ReportWindow) -> DbResult<i64> {
        let profit: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM( \
                 (p.selling_price_cents - p.cost_price_cents) * s.quantity_sold), 0) \
             FROM sales s \
             LEFT JOIN products p ON p.id = s.product_id \
             WHERE (?1 IS NULL OR s.timestamp >= ?1) AND (?2 IS NULL OR s.timestamp < ?2)",
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(profit)
    }

    /// Total units sold inside a window.
    pub async fn total_quantity_in(&self, window: ReportWindow) -> DbResult<i64> {
        let quantity: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity_sold), 0) FROM sales \
             WHERE (?1 IS NULL OR timestamp >= ?1) AND (?2 IS NULL OR timestamp < ?2)",
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(quantity)
    }

    /// Number of sales inside a window.
    pub async fn sales_count_in(&self, window: ReportWindow) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sales \
             WHERE (?1 IS NULL OR timestamp >= ?1) AND (?2 IS NULL OR timestamp < ?2)",
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// One shopkeeper's revenue inside a window, in cents.
    pub async fn revenue_for_shopkeeper_in(
        &self,
        shopkeeper_id: &str,
        window: ReportWindow,
    ) -> DbResult<i64> {
        let revenue: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_paid_cents), 0) FROM sales \
             WHERE shopkeeper_id = ?1 \
               AND (?2 IS NULL OR timestamp >= ?2) AND (?3 IS NULL OR timestamp < ?3)",
        )
        .bind(shopkeeper_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(revenue)
    }

    /// Average sale value across a window: revenue per unit sold.
    pub async fn average_sale_value_in(&self, window: ReportWindow) -> DbResult<Money> {
        let revenue = self.revenue_in(window).await?;
        let quantity = self.total_quantity_in(window).await?;
        Ok(average_sale_value(Money::from_cents(revenue), quantity))
    }

    /// Computes the owner-dashboard headline numbers as of `now`.
    ///
    /// Daily figures cover today's UTC calendar day, monthly figures the
    /// current UTC calendar month, both as half-open windows.
    pub async fn dashboard_summary(&self, now: DateTime<Utc>) -> DbResult<DashboardSummary> {
        let all = ReportWindow::all_time();
        let today = ReportWindow::today(now);
        let month = ReportWindow::month_of(now);

        let total_revenue_cents = self.revenue_in(all).await?;
        let total_profit_cents = self.profit_in(all).await?;
        let daily_revenue_cents = self.revenue_in(today).await?;
        let daily_profit_cents = self.profit_in(today).await?;
        let monthly_revenue_cents = self.revenue_in(month).await?;
        let monthly_profit_cents = self.profit_in(month).await?;

        let total_sales_count = self.sales_count_in(all).await?;
        let total_quantity = self.total_quantity_in(all).await?;

        let total_products_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        let total_shopkeepers_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users u \
             JOIN user_groups g ON g.user_id = u.id AND g.group_name = 'shopkeeper'",
        )
        .fetch_one(&self.pool)
        .await?;

        let active_shopkeepers_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users u \
             JOIN user_groups g ON g.user_id = u.id AND g.group_name = 'shopkeeper' \
             WHERE u.is_active = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        let average_sale_value_cents =
            average_sale_value(Money::from_cents(total_revenue_cents), total_quantity).cents();

        Ok(DashboardSummary {
            total_revenue_cents,
            total_profit_cents,
            daily_revenue_cents,
            daily_profit_cents,
            monthly_revenue_cents,
            monthly_profit_cents,
            total_sales_count,
            total_products_count,
            active_shopkeepers_count,
            total_shopkeepers_count,
            average_sale_value_cents,
        })
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
    use crate::repository::sale::NewSale;
    use tally_core::{PaymentMode, Product};

    async fn setup() -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let branch = db.branches().insert("Main", "High Street").await.unwrap();
        let product = db
            .products()
            .insert(NewProduct {
                name: "Eau de Parfum 50ml".to_string(),
                stock: 100,
                cost_price_cents: 500,
                selling_price_cents: 800,
                low_stock_threshold: 5,
                branch_id: branch.id,
            })
            .await
            .unwrap();
        (db, product)
    }

    async fn record(db: &Database, product_id: &str, quantity: i64, paid_cents: i64) {
        db.sales()
            .record_sale(NewSale {
                customer_name: None,
                customer_contact: None,
                product_id: product_id.to_string(),
                quantity_sold: quantity,
                amount_paid_cents: paid_cents,
                amount_left_cents: 0,
                mode: PaymentMode::Cash,
                shopkeeper_id: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_revenue_and_profit_all_time() {
        let (db, product) = setup().await;
        record(&db, &product.id, 2, 1600).await;
        record(&db, &product.id, 1, 800).await;

        let reports = db.reports();
        let all = ReportWindow::all_time();

        assert_eq!(reports.revenue_in(all).await.unwrap(), 2400);
        // (800 - 500) * 3 units
        assert_eq!(reports.profit_in(all).await.unwrap(), 900);
        assert_eq!(reports.sales_count_in(all).await.unwrap(), 2);
        assert_eq!(reports.total_quantity_in(all).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_empty_window_yields_zeroes() {
        let (db, _) = setup().await;
        let reports = db.reports();
        let all = ReportWindow::all_time();

        assert_eq!(reports.revenue_in(all).await.unwrap(), 0);
        assert_eq!(reports.profit_in(all).await.unwrap(), 0);
        assert_eq!(
            reports.average_sale_value_in(all).await.unwrap(),
            Money::zero()
        );
    }

    #[tokio::test]
    async fn test_window_bounds_are_half_open() {
        let (db, product) = setup().await;
        record(&db, &product.id, 1, 800).await;

        let sale_ts = db.sales().list_recent(1).await.unwrap()[0].timestamp;
        let reports = db.reports();

        // [ts, ts + 1s) includes the sale; a window ending exactly at ts does not.
        let includes = ReportWindow::between(sale_ts, sale_ts + chrono::Duration::seconds(1));
        assert_eq!(reports.revenue_in(includes).await.unwrap(), 800);

        let ends_at_ts = ReportWindow {
            start: None,
            end: Some(sale_ts),
        };
        assert_eq!(reports.revenue_in(ends_at_ts).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_orphan_sale_counts_revenue_but_zero_profit() {
        let (db, product) = setup().await;
        record(&db, &product.id, 2, 1600).await;
        db.products().delete(&product.id).await.unwrap();

        let reports = db.reports();
        let all = ReportWindow::all_time();
        assert_eq!(reports.revenue_in(all).await.unwrap(), 1600);
        assert_eq!(reports.profit_in(all).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dashboard_summary() {
        let (db, product) = setup().await;
        record(&db, &product.id, 2, 1600).await;
        record(&db, &product.id, 2, 1400).await;
        db.users()
            .register_shopkeeper("ama", "ama@example.com")
            .await
            .unwrap();

        let summary = db.reports().dashboard_summary(Utc::now()).await.unwrap();

        assert_eq!(summary.total_revenue_cents, 3000);
        assert_eq!(summary.total_profit_cents, 1200);
        // Both sales happened just now, so daily == monthly == total.
        assert_eq!(summary.daily_revenue_cents, 3000);
        assert_eq!(summary.monthly_revenue_cents, 3000);
        assert_eq!(summary.total_sales_count, 2);
        assert_eq!(summary.total_products_count, 1);
        assert_eq!(summary.total_shopkeepers_count, 1);
        assert_eq!(summary.active_shopkeepers_count, 1);
        // 3000 cents over 4 units
        assert_eq!(summary.average_sale_value_cents, 750);

        // The summary is handed to the dashboard as JSON.
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total_revenue_cents"], 3000);
        assert_eq!(json["average_sale_value_cents"], 750);
    }

    #[tokio::test]
    async fn test_revenue_for_shopkeeper() {
        let (db, product) = setup().await;
        let keeper = db
            .users()
            .register_shopkeeper("ama", "ama@example.com")
            .await
            .unwrap();

        db.sales()
            .record_sale(NewSale {
                customer_name: None,
                customer_contact: None,
                product_id: product.id.clone(),
                quantity_sold: 1,
                amount_paid_cents: 800,
                amount_left_cents: 0,
                mode: PaymentMode::MobileMoney,
                shopkeeper_id: Some(keeper.id.clone()),
            })
            .await
            .unwrap();
        record(&db, &product.id, 1, 800).await;

        let revenue = db
            .reports()
            .revenue_for_shopkeeper_in(&keeper.id, ReportWindow::all_time())
            .await
            .unwrap();
        assert_eq!(revenue, 800);
    }
}
