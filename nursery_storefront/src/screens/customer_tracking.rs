use std::sync::Arc;

use log::*;
use nursery_order_engine::{
    db_types::OrderId,
    tracking::{TrackingSession, TrackingUpdate},
    traits::OrderStore,
    OrderFlowApi,
};

use crate::{
    errors::StorefrontError,
    ui::{AlertSink, Navigator},
};

/// The customer's live tracking screen: a watch on their order, no publisher.
///
/// The screen tolerates mounting before the order record is readable (checkout and subscription
/// can race); until the first snapshot lands it simply has nothing to show. When the delivered
/// edge arrives the customer is alerted once, the session is released and the shell is sent
/// back.
pub struct CustomerTrackingScreen<B: OrderStore> {
    api: OrderFlowApi<B>,
    alerts: Arc<dyn AlertSink>,
    navigator: Arc<dyn Navigator>,
    session: Option<TrackingSession>,
}

impl<B: OrderStore> CustomerTrackingScreen<B> {
    pub fn new(api: OrderFlowApi<B>, alerts: Arc<dyn AlertSink>, navigator: Arc<dyn Navigator>) -> Self {
        Self { api, alerts, navigator, session: None }
    }

    pub async fn mount(&mut self, order_id: &OrderId) -> Result<(), StorefrontError> {
        // Subscribe first so no mutation can slip between the initial read and the watch.
        let watch = self.api.watch_order(order_id);
        let mut session = TrackingSession::new(watch);
        match self.api.fetch_order(order_id).await? {
            Some(order) => {
                session = session.with_destination(order.destination);
                if let Some(TrackingUpdate::Delivered(order)) = session.apply(&order) {
                    // Already delivered before we ever mounted: surface it and leave.
                    info!("🗺️ Order {} was already delivered at mount", order.order_id);
                    self.surface_completion(&session).await;
                    self.navigator.go_back().await;
                    return Ok(());
                }
            },
            None => {
                debug!("🗺️ Order {order_id} is not readable yet. Waiting for the first snapshot.");
            },
        }
        self.session = Some(session);
        Ok(())
    }

    /// Whether the screen still holds a live session.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&TrackingSession> {
        self.session.as_ref()
    }

    /// The next meaningful update for the map. The delivered edge is self-handling: it alerts
    /// the customer, releases the session and navigates back before being returned.
    pub async fn next_update(&mut self) -> Option<TrackingUpdate> {
        let session = self.session.as_mut()?;
        let update = session.next_update().await?;
        match &update {
            TrackingUpdate::Position(p) => {
                trace!("🗺️ Courier for {} now at {p}", session.order_id());
            },
            TrackingUpdate::Delivered(_) => {
                let session = self.session.take().expect("session vanished mid-update");
                self.surface_completion(&session).await;
                session.shutdown().await;
                self.navigator.go_back().await;
            },
        }
        Some(update)
    }

    /// Drives the screen until the order is delivered or the subscription ends.
    pub async fn run_to_completion(&mut self) {
        while let Some(update) = self.next_update().await {
            if matches!(update, TrackingUpdate::Delivered(_)) {
                break;
            }
        }
    }

    /// Simulated unmount: release the subscription without waiting for delivery.
    pub async fn unmount(&mut self) {
        if let Some(session) = self.session.take() {
            session.shutdown().await;
        }
    }

    async fn surface_completion(&self, session: &TrackingSession) {
        self.alerts
            .alert("Order Delivered", &format!("Your order {} has been delivered.", session.order_id()))
            .await;
    }
}
