//! Order history and staff status updates.

use clap::Subcommand;
use fitsupply_client::{Lookup, Store};
use fitsupply_core::{Order, OrderId, OrderStatus};

use super::{CommandError, emit, row};

#[derive(Subcommand)]
pub enum OrdersAction {
    /// List orders, newest first
    List {
        /// Match order number or customer
        #[arg(short, long)]
        search: Option<String>,

        /// Only orders with this status
        #[arg(long)]
        status: Option<String>,
    },
    /// Show the most recent order
    Latest,
    /// Set an order's status (staff)
    Status { id: OrderId, status: String },
}

pub async fn run(store: &Store, action: OrdersAction) -> Result<(), CommandError> {
    let orders = store.orders();
    match action {
        OrdersAction::List { search, status } => {
            orders.list_orders().await?;
            let status = status.map(OrderStatus::from);
            let found = orders.filter(search.as_deref().unwrap_or_default(), status.as_ref());
            emit(&order_table(&found))
        }
        OrdersAction::Latest => match orders.latest_order().await? {
            Lookup::Found(order) => emit(&order_detail(&order)),
            Lookup::NotFound => emit(&["No orders yet".to_string()]),
        },
        OrdersAction::Status { id, status } => {
            let status = OrderStatus::from(status);
            if matches!(status, OrderStatus::Other(_)) {
                let allowed: Vec<&str> = OrderStatus::ASSIGNABLE.iter().map(OrderStatus::as_str).collect();
                return Err(CommandError::Input(format!(
                    "Unknown status '{status}'. Use one of: {}",
                    allowed.join(", ")
                )));
            }
            let order = orders.update_order_status(id, &status).await?;
            emit(&[format!("Order {} is now {}", order.order_number, order.status.label())])
        }
    }
}

const WIDTHS: [usize; 5] = [6, 16, 24, 12, 10];

fn order_table(orders: &[Order]) -> Vec<String> {
    if orders.is_empty() {
        return vec!["No orders found".to_string()];
    }
    let mut lines = vec![row(&["ID", "NUMBER", "CUSTOMER", "STATUS", "TOTAL"], &WIDTHS)];
    lines.extend(orders.iter().map(|order| {
        row(
            &[
                &order.id.to_string(),
                &order.order_number,
                &order.customer_name(),
                order.status.as_str(),
                &order.total_amount.to_string(),
            ],
            &WIDTHS,
        )
    }));
    lines
}

fn order_detail(order: &Order) -> Vec<String> {
    let mut lines = vec![format!("Order {} ({})", order.order_number, order.status.label())];
    if let Some(created) = order.created_at {
        lines.push(format!("Placed: {}", created.format("%Y-%m-%d %H:%M")));
    }
    lines.extend(order.items.iter().map(|item| {
        format!(
            "  {} x{} @ {} = {}",
            item.product_name, item.quantity, item.price_at_time, item.subtotal
        )
    }));
    lines.push(format!("Total: {}", order.total_amount));
    if !order.shipping_address.is_empty() {
        lines.push(String::new());
        lines.push(order.shipping_address.clone());
    }
    lines
}
