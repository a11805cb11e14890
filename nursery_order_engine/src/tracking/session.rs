use log::*;
use nursery_common::GeoPoint;

use crate::{
    db_types::{Order, OrderId},
    events::OrderWatch,
    tracking::PositionPublisher,
};

/// What a snapshot of the watched order means for the hosting screen.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingUpdate {
    /// The courier moved; redraw the marker and extend the path.
    Position(GeoPoint),
    /// The order just transitioned to Delivered. Fired exactly once per session, on the edge;
    /// later snapshots of the already-delivered record do not repeat it.
    Delivered(Box<Order>),
}

/// A screen-scoped tracking bundle: one change subscription on an order record, optionally the
/// courier's position publisher, and the last-observed delivery state.
///
/// A session is created when a tracking screen mounts and must be fully released when the screen
/// unmounts or navigates away: [`TrackingSession::shutdown`] stops the publisher (waiting for
/// any in-flight tick) and drops the subscription. Dropping the session without calling
/// `shutdown` still releases everything, aborting the publisher instead of waiting for it.
pub struct TrackingSession {
    order_id: OrderId,
    watch: OrderWatch,
    publisher: Option<PositionPublisher>,
    destination: Option<GeoPoint>,
    last_position: Option<GeoPoint>,
    path: Vec<GeoPoint>,
    delivered_seen: bool,
}

impl TrackingSession {
    pub fn new(watch: OrderWatch) -> Self {
        let order_id = watch.order_id().clone();
        Self {
            order_id,
            watch,
            publisher: None,
            destination: None,
            last_position: None,
            path: Vec::new(),
            delivered_seen: false,
        }
    }

    pub fn with_publisher(mut self, publisher: PositionPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_destination(mut self, destination: GeoPoint) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn destination(&self) -> Option<GeoPoint> {
        self.destination
    }

    pub fn last_position(&self) -> Option<GeoPoint> {
        self.last_position
    }

    /// Every courier position observed so far, oldest first.
    pub fn path(&self) -> &[GeoPoint] {
        &self.path
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered_seen
    }

    pub fn has_publisher(&self) -> bool {
        self.publisher.is_some()
    }

    /// Waits for the next snapshot that means something to the screen. Snapshots that change
    /// neither the position nor the status are absorbed here. Returns `None` once the store side
    /// of the subscription has gone away.
    pub async fn next_update(&mut self) -> Option<TrackingUpdate> {
        loop {
            let order = self.watch.changed().await?;
            if let Some(update) = self.apply(&order) {
                return Some(update);
            }
        }
    }

    /// Classifies one snapshot. Pure state bookkeeping, factored out of [`Self::next_update`] so
    /// the edge-trigger rules can be exercised without a live store.
    pub fn apply(&mut self, order: &Order) -> Option<TrackingUpdate> {
        if order.is_delivered() {
            if self.delivered_seen {
                trace!("🧭️ Order {} snapshot after delivery, ignored", self.order_id);
                return None;
            }
            self.delivered_seen = true;
            self.record_position(order.delivery_location);
            debug!("🧭️ Order {} delivered", self.order_id);
            return Some(TrackingUpdate::Delivered(Box::new(order.clone())));
        }
        if self.last_position != Some(order.delivery_location) {
            self.record_position(order.delivery_location);
            return Some(TrackingUpdate::Position(order.delivery_location));
        }
        None
    }

    /// Stops the position publisher, if one is running, and waits for it. Must be called before
    /// the Delivered confirmation write so no stale position can trail the terminal transition.
    pub async fn stop_publisher(&mut self) {
        if let Some(publisher) = self.publisher.take() {
            publisher.stop().await;
        }
    }

    /// Releases the whole session: publisher stopped and awaited, subscription dropped.
    pub async fn shutdown(mut self) {
        self.stop_publisher().await;
        debug!("🧭️ Tracking session for {} shut down", self.order_id);
        // `self` drops here, releasing the watch.
    }

    fn record_position(&mut self, position: GeoPoint) {
        self.last_position = Some(position);
        self.path.push(position);
    }
}
