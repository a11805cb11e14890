use std::sync::Arc;

use log::*;
use nursery_common::{GeoPoint, Rupees};
use nursery_order_engine::{
    db_types::{NewOrder, Order},
    traits::{LocationProvider, OrderStore},
    OrderFlowApi,
};

use crate::{
    cart::Cart,
    errors::StorefrontError,
    screens::CustomerDetails,
    ui::{AlertSink, Choice, ConfirmationPrompt, Navigator, Screen},
};

#[derive(Debug)]
pub enum CheckoutOutcome {
    /// The order was written and the cart cleared; the shell has been sent to the tracking
    /// screen.
    Placed(Order),
    /// The customer backed out (or the cart was empty). Nothing changed.
    Cancelled,
    /// The location permission was refused. The customer was alerted once; nothing changed.
    PermissionDenied,
}

/// The checkout action behind the cart screen.
///
/// Order of operations matters here: the cart is cleared only after the order write has
/// succeeded, so a refused permission, a missing fix or a store failure all leave the checkout
/// retryable with the cart intact.
pub struct CheckoutFlow<B: OrderStore> {
    api: OrderFlowApi<B>,
    locator: Arc<dyn LocationProvider>,
    prompt: Arc<dyn ConfirmationPrompt>,
    alerts: Arc<dyn AlertSink>,
    navigator: Arc<dyn Navigator>,
    delivery_fee: Rupees,
    depot: GeoPoint,
}

impl<B: OrderStore> CheckoutFlow<B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api: OrderFlowApi<B>,
        locator: Arc<dyn LocationProvider>,
        prompt: Arc<dyn ConfirmationPrompt>,
        alerts: Arc<dyn AlertSink>,
        navigator: Arc<dyn Navigator>,
        delivery_fee: Rupees,
        depot: GeoPoint,
    ) -> Self {
        Self { api, locator, prompt, alerts, navigator, delivery_fee, depot }
    }

    pub async fn place_order(
        &self,
        customer: &CustomerDetails,
        cart: &mut Cart,
    ) -> Result<CheckoutOutcome, StorefrontError> {
        if cart.is_empty() {
            debug!("🧾️ Checkout requested with an empty cart. Nothing to do.");
            return Ok(CheckoutOutcome::Cancelled);
        }
        let choice =
            self.prompt.confirm("Confirm Checkout", "Are you sure you want to proceed to checkout?").await;
        if choice == Choice::No {
            debug!("🧾️ Checkout cancelled by {}", customer.customer_id);
            return Ok(CheckoutOutcome::Cancelled);
        }

        if let Err(e) = self.locator.ensure_permission().await {
            warn!("🧾️ Checkout aborted for {}: {e}", customer.customer_id);
            self.alerts.alert("Permission Denied", "We need location permission to proceed.").await;
            return Ok(CheckoutOutcome::PermissionDenied);
        }
        let destination = match self.locator.current_position().await {
            Ok(p) => p,
            Err(e) => {
                self.alerts.alert("Error", "Could not fetch location").await;
                return Err(e.into());
            },
        };

        let total = cart.subtotal() + self.delivery_fee;
        let mut order =
            NewOrder::new(customer.customer_id.clone(), cart.items().to_vec(), total, destination)
                .with_depot(self.depot);
        if let (Some(name), Some(email)) = (&customer.name, &customer.email) {
            order = order.with_customer_details(name.clone(), email.clone());
        }

        let placed = match self.api.place_order(order).await {
            Ok(placed) => placed,
            Err(e) => {
                error!("🧾️ Error saving order for {}: {e}", customer.customer_id);
                self.alerts.alert("Error", "An error occurred while placing your order.").await;
                return Err(e.into());
            },
        };

        // Only now is it safe to drop the local state.
        cart.clear();
        info!("🧾️ Order {} placed successfully. Total {}", placed.order_id, placed.total);
        self.navigator.navigate(Screen::CustomerTracking { order_id: placed.order_id.clone() }).await;
        Ok(CheckoutOutcome::Placed(placed))
    }
}
