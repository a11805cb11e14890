//! Per-record change subscriptions.
//!
//! A [`WatchRegistry`] hands out [`OrderWatch`] handles, one per subscriber per order. Every
//! mutation the store performs is pushed to all watchers of that record as a full snapshot.
//! Watches are independent: the customer screen and the delivery screen each hold their own
//! handle on the same record and release it on their own schedule. Dropping a handle is the
//! unsubscribe; there is no separate call to forget.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use log::*;
use tokio::sync::broadcast;

use crate::db_types::{Order, OrderId};

/// Snapshots queued per watcher before older ones are discarded. A slow observer only ever needs
/// the latest state, so lagging skips forward rather than erroring out.
const WATCH_BUFFER: usize = 32;

#[derive(Clone, Default)]
pub struct WatchRegistry {
    channels: Arc<Mutex<HashMap<OrderId, broadcast::Sender<Order>>>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a subscription on `order_id`. The record does not have to exist yet; the first
    /// snapshot arrives with the first mutation that lands.
    pub fn watch(&self, order_id: &OrderId) -> OrderWatch {
        let mut channels = self.channels.lock().expect("watch registry lock poisoned");
        let sender =
            channels.entry(order_id.clone()).or_insert_with(|| broadcast::channel(WATCH_BUFFER).0);
        trace!("👁️ New watch on order {order_id}");
        OrderWatch { order_id: order_id.clone(), receiver: sender.subscribe() }
    }

    /// Pushes an updated snapshot to every watcher of the record. Channels with no remaining
    /// watchers are pruned as a side effect.
    pub fn notify(&self, order: &Order) {
        let mut channels = self.channels.lock().expect("watch registry lock poisoned");
        if let Some(sender) = channels.get(&order.order_id) {
            if sender.send(order.clone()).is_err() {
                // Every receiver is gone; drop the channel until someone watches again.
                channels.remove(&order.order_id);
            }
        }
    }

    /// The number of live watchers on the record. Used to assert teardown in tests.
    pub fn watcher_count(&self, order_id: &OrderId) -> usize {
        let channels = self.channels.lock().expect("watch registry lock poisoned");
        channels.get(order_id).map(|s| s.receiver_count()).unwrap_or(0)
    }
}

/// A live change subscription on one order record. Dropping the handle unsubscribes.
pub struct OrderWatch {
    order_id: OrderId,
    receiver: broadcast::Receiver<Order>,
}

impl OrderWatch {
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Waits for the next snapshot of the watched record. Returns `None` once the store side of
    /// the subscription has gone away. A watcher that fell behind skips to the oldest retained
    /// snapshot rather than failing.
    pub async fn changed(&mut self) -> Option<Order> {
        loop {
            match self.receiver.recv().await {
                Ok(order) => return Some(order),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("👁️ Watch on {} lagged, skipped {skipped} snapshots", self.order_id);
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
