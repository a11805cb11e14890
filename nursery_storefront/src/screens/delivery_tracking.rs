use std::{sync::Arc, time::Duration};

use log::*;
use nursery_order_engine::{
    db_types::OrderId,
    tracking::{PositionPublisher, TrackingSession, TrackingUpdate},
    traits::{LocationProvider, OrderStore},
    OrderFlowApi,
};

use crate::{
    errors::StorefrontError,
    ui::{AlertSink, Choice, ConfirmationPrompt, Navigator, Screen},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkDeliveredOutcome {
    /// The terminal write landed; the shell has been sent back to the dashboard.
    Confirmed,
    /// The courier backed out of the prompt. Nothing changed.
    Cancelled,
}

/// The courier's tracking screen for one order: a watch on the record plus the position
/// publisher that feeds it.
///
/// The Mark-Delivered action is gated behind a confirmation prompt. On confirm the publisher is
/// stopped *before* the status write, so no stale position can land after the terminal
/// transition. A failed write leaves the order Pending and the action retryable.
pub struct DeliveryTrackingScreen<B: OrderStore> {
    api: OrderFlowApi<B>,
    locator: Arc<dyn LocationProvider>,
    prompt: Arc<dyn ConfirmationPrompt>,
    alerts: Arc<dyn AlertSink>,
    navigator: Arc<dyn Navigator>,
    publish_interval: Duration,
    session: Option<TrackingSession>,
}

impl<B: OrderStore> DeliveryTrackingScreen<B> {
    pub fn new(
        api: OrderFlowApi<B>,
        locator: Arc<dyn LocationProvider>,
        prompt: Arc<dyn ConfirmationPrompt>,
        alerts: Arc<dyn AlertSink>,
        navigator: Arc<dyn Navigator>,
        publish_interval: Duration,
    ) -> Self {
        Self { api, locator, prompt, alerts, navigator, publish_interval, session: None }
    }

    /// Mounts the screen: resolves the destination, opens the watch and, permission allowing,
    /// starts publishing the courier's position. A refused permission is surfaced once and the
    /// screen still tracks; it just publishes nothing.
    pub async fn mount(&mut self, order_id: &OrderId) -> Result<(), StorefrontError> {
        let destination = self.api.fetch_destination(order_id).await?;
        let watch = self.api.watch_order(order_id);
        let mut session = TrackingSession::new(watch).with_destination(destination);

        match self.locator.ensure_permission().await {
            Ok(()) => {
                let publisher = PositionPublisher::start(
                    self.api.db().clone(),
                    order_id.clone(),
                    self.locator.clone(),
                    self.publish_interval,
                );
                session = session.with_publisher(publisher);
            },
            Err(e) => {
                warn!("🚚️ Tracking {order_id} without publishing: {e}");
                self.alerts
                    .alert("Permission Denied", "We need location permission to track your position.")
                    .await;
            },
        }
        self.session = Some(session);
        info!("🚚️ Delivery tracking mounted for order {order_id}");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&TrackingSession> {
        self.session.as_ref()
    }

    /// The next meaningful update for the courier's map.
    pub async fn next_update(&mut self) -> Option<TrackingUpdate> {
        self.session.as_mut()?.next_update().await
    }

    /// The confirmation gate in front of the terminal transition.
    pub async fn mark_delivered(&mut self) -> Result<MarkDeliveredOutcome, StorefrontError> {
        let session = self.session.as_mut().ok_or(StorefrontError::NotMounted)?;
        let choice = self
            .prompt
            .confirm("Mark as Delivered", "Confirm that this order has been handed to the customer?")
            .await;
        if choice == Choice::No {
            debug!("🚚️ Mark-delivered cancelled for {}", session.order_id());
            return Ok(MarkDeliveredOutcome::Cancelled);
        }

        // Stop the publisher first; once the terminal write lands no position may follow it.
        session.stop_publisher().await;
        let order_id = session.order_id().clone();
        match self.api.mark_delivered(&order_id).await {
            Ok(_) => {
                self.unmount().await;
                self.navigator.navigate(Screen::DeliveryHome).await;
                Ok(MarkDeliveredOutcome::Confirmed)
            },
            Err(e) => {
                error!("🚚️ Error updating status for {order_id}: {e}");
                self.alerts
                    .alert("Error", "Could not update the delivery status. The order is still pending; please retry.")
                    .await;
                Err(e.into())
            },
        }
    }

    /// Simulated unmount: stops the publisher and releases the subscription.
    pub async fn unmount(&mut self) {
        if let Some(session) = self.session.take() {
            session.shutdown().await;
        }
    }
}
