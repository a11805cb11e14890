use log::*;
use nursery_order_engine::{db_types::Order, traits::OrderStore, OrderFlowApi};

use crate::{cart::Cart, errors::StorefrontError};

/// The customer's order history: past orders, newest first, with a one-tap "Order Again".
pub struct OrderHistoryScreen<B: OrderStore> {
    api: OrderFlowApi<B>,
}

impl<B: OrderStore> OrderHistoryScreen<B> {
    pub fn new(api: OrderFlowApi<B>) -> Self {
        Self { api }
    }

    pub async fn orders_for(&self, customer_id: &str) -> Result<Vec<Order>, StorefrontError> {
        let orders = self.api.history_for_customer(customer_id).await?;
        debug!("📜️ {} past orders for {customer_id}", orders.len());
        Ok(orders)
    }
}

/// Copies a past order's items back into the cart ("Order Again").
pub fn reorder(order: &Order, cart: &mut Cart) {
    cart.replace(order.items.clone());
}

/// The order date the way the history list shows it.
pub fn formatted_order_date(order: &Order) -> String {
    order.created_at.format("%d %b %Y, %H:%M").to_string()
}
