use async_trait::async_trait;
use thiserror::Error;

use crate::{
    db_types::{DeliveryStatus, NewOrder, Order, OrderId, OrderUpdate},
    events::OrderWatch,
};

/// This trait defines the behaviour of backends that hold order records for the storefront.
///
/// The contract deliberately mirrors a document store:
/// * Writes are unconditional overwrites of named fields. There is no version check and no
///   transaction discipline across fields; concurrent writers race silently and the last write
///   wins per field.
/// * A record can be watched before it exists; watchers simply receive the first snapshot once
///   the record lands.
#[async_trait]
pub trait OrderStore: Clone + Send + Sync + 'static {
    /// The URL of the backing database.
    fn url(&self) -> &str;

    /// Stores a new order. This call is idempotent on `order_id`: re-submitting an existing id
    /// returns the stored record untouched.
    ///
    /// Returns the stored order and `true` if the record was inserted, or `false` if it already
    /// existed.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError>;

    /// One-shot read of an order record. Returns `None` when the record does not exist (yet);
    /// callers racing against order creation must treat this as "no update yet" rather than as a
    /// failure.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Fetches orders matching the filter.
    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;

    /// Overwrites the mutable fields named in `update` and returns the record as stored.
    /// Fails with [`OrderStoreError::OrderNotFound`] if the record is absent.
    async fn update_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<Order, OrderStoreError>;

    /// Opens a change subscription on one order record. Every mutation performed through this
    /// store delivers the updated snapshot to all watchers of that record. Dropping the returned
    /// handle unsubscribes.
    fn watch(&self, order_id: &OrderId) -> OrderWatch;

    /// Closes the backing connection.
    async fn close(&mut self) -> Result<(), OrderStoreError> {
        Ok(())
    }
}

//--------------------------------------  OrderQueryFilter  ----------------------------------------------------------
/// Criteria for listing orders: the delivery dashboard asks for Pending orders across all
/// customers; order history asks for one customer's orders, newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderQueryFilter {
    pub customer_id: Option<String>,
    pub statuses: Vec<DeliveryStatus>,
    pub newest_first: bool,
}

impl OrderQueryFilter {
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_status(mut self, status: DeliveryStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() && self.statuses.is_empty()
    }
}

//--------------------------------------  OrderStoreError  -----------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Could not write to the order store. {0}")]
    WriteError(String),
    #[error("Could not read from the order store. {0}")]
    ReadError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl OrderStoreError {
    pub fn write(e: impl std::fmt::Display) -> Self {
        Self::WriteError(e.to_string())
    }

    pub fn read(e: impl std::fmt::Display) -> Self {
        Self::ReadError(e.to_string())
    }
}
