use crate::db_types::Order;

/// Fired once when a checkout lands a brand-new order record. Idempotent re-inserts of an
/// existing order id do not fire this event.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired once per actual Pending → Delivered transition. Re-marking an already-delivered order
/// overwrites the record harmlessly but does not fire this event again.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDeliveredEvent {
    pub order: Order,
}

impl OrderDeliveredEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}
