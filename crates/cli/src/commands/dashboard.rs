//! Staff dashboard.

use fitsupply_client::{ClientError, Store};
use fitsupply_core::DashboardSummary;

use super::{CommandError, emit, row};

pub async fn run(store: &Store) -> Result<(), CommandError> {
    let widgets = store.dashboard().fetch_all_widgets().await;

    // The summary is the page; the other widgets degrade to a note.
    let summary = widgets.summary?;
    let mut lines = summary_lines(&summary);

    lines.push(String::new());
    lines.push("Recent orders".to_string());
    match widgets.recent_orders {
        Ok(orders) if orders.is_empty() => lines.push("  none".to_string()),
        Ok(orders) => {
            let widths = [6, 24, 12, 10];
            lines.extend(orders.iter().map(|o| {
                row(
                    &[
                        &format!("  {}", o.id),
                        &o.customer_name,
                        o.status.as_str(),
                        &o.total.to_string(),
                    ],
                    &widths,
                )
            }));
        }
        Err(e) => lines.push(unavailable(&e)),
    }

    lines.push(String::new());
    lines.push("Sales".to_string());
    match widgets.sales_chart {
        Ok(points) => lines.extend(
            points
                .iter()
                .map(|p| format!("  {}  {}", p.date.format("%Y-%m-%d"), p.sales)),
        ),
        Err(e) => lines.push(unavailable(&e)),
    }

    emit(&lines)
}

fn summary_lines(summary: &DashboardSummary) -> Vec<String> {
    vec![
        format!(
            "Total sales:   {} ({:+}%)",
            summary.total_sales,
            summary.sales_change()
        ),
        format!(
            "New orders:    {} ({:+}%)",
            summary.new_orders,
            summary.orders_change()
        ),
        format!(
            "New customers: {} ({:+}%)",
            summary.new_customers,
            summary.customers_change()
        ),
    ]
}

fn unavailable(error: &ClientError) -> String {
    format!("  unavailable: {error}")
}
