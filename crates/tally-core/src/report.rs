//! # Reporting Primitives
//!
//! Time windows and aggregate math backing the revenue/profit reports.
//!
//! ## Window Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 Half-Open Windows: [start, end)                     │
//! │                                                                     │
//! │  today(2026-02-03T14:00Z)                                           │
//! │    = [2026-02-03T00:00Z, 2026-02-04T00:00Z)                         │
//! │                                                                     │
//! │  month_of(2026-02-03T14:00Z)                                        │
//! │    = [2026-02-01T00:00Z, 2026-03-01T00:00Z)                         │
//! │                                                                     │
//! │  A sale stamped exactly at window start IS included;                │
//! │  one stamped exactly at window end is NOT. Consecutive windows      │
//! │  therefore tile the timeline without double-counting.               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The actual SUM queries live in the database layer; this module owns the
//! window arithmetic and the two formulas every report shares, so there is
//! exactly one definition of each.

use chrono::{DateTime, Duration, Months, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Report Window
// =============================================================================

/// A half-open time window `[start, end)` for report queries.
///
/// Either bound may be absent: `all_time()` has neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportWindow {
    #[ts(as = "Option<String>")]
    pub start: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub end: Option<DateTime<Utc>>,
}

impl ReportWindow {
    /// The unbounded window covering the whole sales history.
    pub const fn all_time() -> Self {
        ReportWindow {
            start: None,
            end: None,
        }
    }

    /// The UTC calendar day containing `now`.
    pub fn today(now: DateTime<Utc>) -> Self {
        let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        ReportWindow {
            start: Some(start),
            end: Some(start + Duration::days(1)),
        }
    }

    /// The UTC calendar month containing `now`.
    pub fn month_of(now: DateTime<Utc>) -> Self {
        use chrono::Datelike;

        let date = now.date_naive();
        let first = date - Duration::days(date.day0() as i64);
        let next = first.checked_add_months(Months::new(1)).unwrap_or(first);
        ReportWindow {
            start: Some(first.and_time(NaiveTime::MIN).and_utc()),
            end: Some(next.and_time(NaiveTime::MIN).and_utc()),
        }
    }

    /// The trailing 7 days ending at `now` (exclusive).
    pub fn last_week(now: DateTime<Utc>) -> Self {
        ReportWindow {
            start: Some(now - Duration::days(7)),
            end: Some(now),
        }
    }

    /// An arbitrary `[start, end)` window.
    pub const fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        ReportWindow {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Whether a timestamp falls inside the window.
    /// Start is inclusive, end is exclusive.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| ts >= s) && self.end.is_none_or(|e| ts < e)
    }
}

// =============================================================================
// Aggregate Formulas
// =============================================================================

/// Canonical profit formula: `(selling_price - cost_price) * quantity`.
///
/// This is the single definition used by the per-sale helper and every
/// aggregate query. Profit measures margin on what was sold, independent
/// of how much of the bill has been settled so far; the outstanding
/// balance is tracked separately on the sale.
#[inline]
pub const fn margin_profit_cents(selling_cents: i64, cost_cents: i64, quantity: i64) -> i64 {
    (selling_cents - cost_cents) * quantity
}

/// Average sale value: revenue divided by total units sold.
///
/// Guards the empty window: zero units sold yields zero, not a division
/// error.
pub fn average_sale_value(revenue: Money, total_quantity: i64) -> Money {
    if total_quantity <= 0 {
        Money::zero()
    } else {
        Money::from_cents(revenue.cents() / total_quantity)
    }
}

// =============================================================================
// Dashboard Summary
// =============================================================================

/// The owner-dashboard headline numbers, computed by the report
/// repository and handed to the presentation layer as-is.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub total_revenue_cents: i64,
    pub total_profit_cents: i64,
    pub daily_revenue_cents: i64,
    pub daily_profit_cents: i64,
    pub monthly_revenue_cents: i64,
    pub monthly_profit_cents: i64,
    pub total_sales_count: i64,
    pub total_products_count: i64,
    pub active_shopkeepers_count: i64,
    pub total_shopkeepers_count: i64,
    pub average_sale_value_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().unwrap()
    }

    #[test]
    fn test_today_window_bounds() {
        let w = ReportWindow::today(utc(2026, 2, 3, 14, 30, 0));
        assert_eq!(w.start, Some(utc(2026, 2, 3, 0, 0, 0)));
        assert_eq!(w.end, Some(utc(2026, 2, 4, 0, 0, 0)));
    }

    #[test]
    fn test_half_open_boundaries() {
        let w = ReportWindow::today(utc(2026, 2, 3, 14, 30, 0));

        // Start inclusive, end exclusive.
        assert!(w.contains(utc(2026, 2, 3, 0, 0, 0)));
        assert!(w.contains(utc(2026, 2, 3, 23, 59, 59)));
        assert!(!w.contains(utc(2026, 2, 4, 0, 0, 0)));
        assert!(!w.contains(utc(2026, 2, 2, 23, 59, 59)));
    }

    #[test]
    fn test_month_window() {
        let w = ReportWindow::month_of(utc(2026, 2, 15, 9, 0, 0));
        assert_eq!(w.start, Some(utc(2026, 2, 1, 0, 0, 0)));
        assert_eq!(w.end, Some(utc(2026, 3, 1, 0, 0, 0)));
    }

    #[test]
    fn test_month_window_december_rolls_year() {
        let w = ReportWindow::month_of(utc(2025, 12, 31, 23, 59, 59));
        assert_eq!(w.start, Some(utc(2025, 12, 1, 0, 0, 0)));
        assert_eq!(w.end, Some(utc(2026, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_all_time_contains_everything() {
        let w = ReportWindow::all_time();
        assert!(w.contains(utc(1990, 1, 1, 0, 0, 0)));
        assert!(w.contains(utc(2100, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_consecutive_days_tile_without_overlap() {
        let day1 = ReportWindow::today(utc(2026, 2, 3, 12, 0, 0));
        let day2 = ReportWindow::today(utc(2026, 2, 4, 12, 0, 0));
        let midnight = utc(2026, 2, 4, 0, 0, 0);

        assert!(!day1.contains(midnight));
        assert!(day2.contains(midnight));
    }

    #[test]
    fn test_margin_profit() {
        assert_eq!(margin_profit_cents(800, 500, 4), 1200);
        assert_eq!(margin_profit_cents(500, 800, 2), -600);
        assert_eq!(margin_profit_cents(800, 500, 0), 0);
    }

    #[test]
    fn test_average_sale_value_guards_zero() {
        assert_eq!(
            average_sale_value(Money::from_cents(0), 0),
            Money::zero()
        );
        assert_eq!(
            average_sale_value(Money::from_cents(900), 3).cents(),
            300
        );
    }
}
