use std::sync::Arc;

use log::*;
use nursery_order_engine::{db_types::Order, traits::OrderStore, OrderFlowApi};

use crate::{
    errors::StorefrontError,
    ui::{Navigator, Screen},
};

/// The courier's dashboard: the work list of orders still awaiting delivery.
pub struct DeliveryHomeScreen<B: OrderStore> {
    api: OrderFlowApi<B>,
    navigator: Arc<dyn Navigator>,
}

impl<B: OrderStore> DeliveryHomeScreen<B> {
    pub fn new(api: OrderFlowApi<B>, navigator: Arc<dyn Navigator>) -> Self {
        Self { api, navigator }
    }

    /// Pending orders across all customers, oldest first.
    pub async fn pending_orders(&self) -> Result<Vec<Order>, StorefrontError> {
        let orders = self.api.pending_orders().await?;
        debug!("🏠️ {} orders awaiting delivery", orders.len());
        Ok(orders)
    }

    /// Opens the tracking screen for one job, carrying the destination along the way so the map
    /// can draw before the first snapshot arrives.
    pub async fn open_order(&self, order: &Order) {
        self.navigator
            .navigate(Screen::DeliveryTracking {
                order_id: order.order_id.clone(),
                destination: order.destination,
            })
            .await;
    }
}
