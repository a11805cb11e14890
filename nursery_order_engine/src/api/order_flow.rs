use std::fmt::Debug;

use log::*;
use nursery_common::GeoPoint;

use crate::{
    api::OrderFlowError,
    db_types::{DeliveryStatus, NewOrder, Order, OrderId, OrderUpdate},
    events::{EventProducers, OrderCreatedEvent, OrderDeliveredEvent, OrderWatch},
    traits::{OrderQueryFilter, OrderStore},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: placing orders at checkout,
/// publishing courier positions, and confirming delivery. It owns nothing ambient; the backend
/// and the event producers are injected by the composition root.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone> Clone for OrderFlowApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderStore
{
    /// Stores a checkout as a new order record and fires the order-created hook.
    ///
    /// The call is idempotent on the order id: re-submitting an existing id returns the stored
    /// record without firing the hook again. On failure nothing is stored, so the caller can
    /// keep its local state (the cart) intact and retry.
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        let (stored, inserted) = self.db.insert_order(order).await?;
        if inserted {
            debug!(
                "🛒️ Order {} placed for customer {}: {} for {} item lines",
                stored.order_id,
                stored.customer_id,
                stored.total,
                stored.items.len()
            );
            self.call_order_created_hook(&stored).await;
        }
        Ok(stored)
    }

    /// One-shot read of an order. `None` means "not there (yet)" and is not an error.
    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        Ok(self.db.fetch_order(order_id).await?)
    }

    /// The customer's destination for an order. Unlike [`Self::fetch_order`], a missing record
    /// here is a hard error: callers only ask for a destination once the order is known to
    /// exist.
    pub async fn fetch_destination(&self, order_id: &OrderId) -> Result<GeoPoint, OrderFlowError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        Ok(order.destination)
    }

    /// Overwrites the order's delivery location with the courier's current position. Last write
    /// wins; there is no version check, and concurrent publishers race silently.
    pub async fn update_delivery_position(
        &self,
        order_id: &OrderId,
        position: GeoPoint,
    ) -> Result<Order, OrderFlowError> {
        let update = OrderUpdate::default().with_delivery_location(position);
        let order = self.db.update_order(order_id, update).await?;
        trace!("🛒️ Delivery position for {order_id} is now {position}");
        Ok(order)
    }

    /// The terminal transition: sets the order's delivery status to `Delivered`.
    ///
    /// There is no guard against double invocation; re-marking a delivered order is a harmless
    /// overwrite. The order-delivered hook fires once per actual Pending → Delivered edge, so
    /// hook consumers see a single completion per order.
    pub async fn mark_delivered(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let already_delivered = self
            .db
            .fetch_order(order_id)
            .await?
            .map(|o| o.is_delivered())
            .unwrap_or(false);
        let update = OrderUpdate::default().with_status(DeliveryStatus::Delivered);
        let order = self.db.update_order(order_id, update).await?;
        if already_delivered {
            debug!("🛒️ Order {order_id} was already delivered. Overwrite was a no-op.");
        } else {
            info!("🛒️ Order {order_id} marked as delivered");
            self.call_order_delivered_hook(&order).await;
        }
        Ok(order)
    }

    /// Opens a change subscription on the order record. See [`OrderStore::watch`].
    pub fn watch_order(&self, order_id: &OrderId) -> OrderWatch {
        self.db.watch(order_id)
    }

    /// Orders awaiting delivery, across all customers, oldest first. This is the delivery
    /// dashboard's work list.
    pub async fn pending_orders(&self) -> Result<Vec<Order>, OrderFlowError> {
        let filter = OrderQueryFilter::default().with_status(DeliveryStatus::Pending);
        Ok(self.db.fetch_orders(filter).await?)
    }

    /// One customer's orders, newest first.
    pub async fn history_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderFlowError> {
        let filter = OrderQueryFilter::default().with_customer_id(customer_id).newest_first();
        Ok(self.db.fetch_orders(filter).await?)
    }

    /// Fetches orders according to arbitrary criteria. The admin dashboard reads everything
    /// through this.
    pub async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        Ok(self.db.fetch_orders(filter).await?)
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for emitter in &self.producers.order_created_producer {
            trace!("🛒️ Notifying order-created hook subscribers for {}", order.order_id);
            emitter.publish_event(OrderCreatedEvent::new(order.clone())).await;
        }
    }

    async fn call_order_delivered_hook(&self, order: &Order) {
        for emitter in &self.producers.order_delivered_producer {
            trace!("🛒️ Notifying order-delivered hook subscribers for {}", order.order_id);
            emitter.publish_event(OrderDeliveredEvent::new(order.clone())).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
