//! Admin dashboard aggregates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::id::OrderId;
use super::price::Price;
use super::status::OrderStatus;

/// Summary KPIs with period-over-period comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_sales: Price,
    #[serde(default)]
    pub total_sales_previous: Price,
    pub new_orders: i64,
    #[serde(default)]
    pub new_orders_previous: i64,
    pub new_customers: i64,
    #[serde(default)]
    pub new_customers_previous: i64,
    #[serde(default)]
    pub sales_change_percent: Option<i64>,
    #[serde(default)]
    pub orders_change_percent: Option<i64>,
    #[serde(default)]
    pub customers_change_percent: Option<i64>,
}

impl DashboardSummary {
    /// Sales delta, preferring the backend's figure.
    #[must_use]
    pub fn sales_change(&self) -> i64 {
        self.sales_change_percent.unwrap_or_else(|| {
            percentage_change_decimal(self.total_sales, self.total_sales_previous)
        })
    }

    /// Orders delta, preferring the backend's figure.
    #[must_use]
    pub fn orders_change(&self) -> i64 {
        self.orders_change_percent
            .unwrap_or_else(|| percentage_change(self.new_orders, self.new_orders_previous))
    }

    /// Customers delta, preferring the backend's figure.
    #[must_use]
    pub fn customers_change(&self) -> i64 {
        self.customers_change_percent.unwrap_or_else(|| {
            percentage_change(self.new_customers, self.new_customers_previous)
        })
    }
}

/// A recent order row for the dashboard widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentOrder {
    pub id: OrderId,
    pub customer_name: String,
    pub total: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One point on the sales chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesPoint {
    pub date: NaiveDate,
    pub sales: Price,
}

/// Rounded percentage change from `previous` to `current`.
///
/// A zero baseline reports 100 for any growth and 0 otherwise.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn percentage_change(current: i64, previous: i64) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    // KPI counts stay far below f64's exact integer range
    (((current - previous) as f64 / previous as f64) * 100.0).round() as i64
}

fn percentage_change_decimal(current: Price, previous: Price) -> i64 {
    use rust_decimal::prelude::ToPrimitive;

    if previous == Price::ZERO {
        return if current > Price::ZERO { 100 } else { 0 };
    }
    let ratio = (current.amount() - previous.amount()) / previous.amount()
        * rust_decimal::Decimal::ONE_HUNDRED;
    ratio.round().to_i64().unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_change() {
        assert_eq!(percentage_change(150, 100), 50);
        assert_eq!(percentage_change(50, 100), -50);
        assert_eq!(percentage_change(5, 0), 100);
        assert_eq!(percentage_change(0, 0), 0);
        assert_eq!(percentage_change(2, 3), -33);
    }

    #[test]
    fn test_summary_deltas_fall_back_to_computed() {
        let summary: DashboardSummary = serde_json::from_str(
            r#"{"total_sales": 1500.0, "total_sales_previous": 1000,
                "new_orders": 12, "new_orders_previous": 8,
                "new_customers": 3, "customers_change_percent": 7}"#,
        )
        .unwrap();
        assert_eq!(summary.sales_change(), 50);
        assert_eq!(summary.orders_change(), 50);
        assert_eq!(summary.customers_change(), 7);
    }

    #[test]
    fn test_sales_point_parses_date() {
        let point: SalesPoint =
            serde_json::from_str(r#"{"date":"2024-03-01","sales":"120.50"}"#).unwrap();
        assert_eq!(point.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(point.sales, Price::from_cents(12050));
    }
}
