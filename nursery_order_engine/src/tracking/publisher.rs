use std::{sync::Arc, time::Duration};

use log::*;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

use crate::{
    db_types::{OrderId, OrderUpdate},
    traits::{LocationProvider, OrderStore},
};

/// Periodically reads the courier's device position and overwrites the order's delivery
/// location.
///
/// The publisher has two independent stop triggers, and both must work: dropping the handle
/// (screen teardown) aborts the task outright, and [`PositionPublisher::stop`] signals the loop
/// and waits for it to finish, guaranteeing that no store write begins after `stop` returns.
/// Callers marking an order as delivered must call `stop` before issuing the status write, so a
/// stale position can never land after the terminal transition.
///
/// Failure policy inside the loop: a failed position read or store write skips that tick and the
/// loop carries on; a permission denial stops the publisher for good. Neither surfaces beyond a
/// log line, since there is no operator action a tick can usefully demand.
pub struct PositionPublisher {
    order_id: OrderId,
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl PositionPublisher {
    pub fn start<B: OrderStore>(
        store: B,
        order_id: OrderId,
        locator: Arc<dyn LocationProvider>,
        period: Duration,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let id = order_id.clone();
        let handle = tokio::spawn(async move {
            publish_loop(store, id, locator, period, stop_rx).await;
        });
        Self { order_id, stop_tx, handle: Some(handle) }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Signals the loop to stop and waits for it to wind down. Once this returns, no further
    /// position write will begin.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("🛵️ Position publisher for {} ended abnormally: {e}", self.order_id);
            }
        }
        debug!("🛵️ Position publisher for {} stopped", self.order_id);
    }
}

impl Drop for PositionPublisher {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            trace!("🛵️ Position publisher for {} aborted on drop", self.order_id);
        }
    }
}

async fn publish_loop<B: OrderStore>(
    store: B,
    order_id: OrderId,
    locator: Arc<dyn LocationProvider>,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    if let Err(e) = locator.ensure_permission().await {
        // The hosting screen surfaces the denial to the operator once; the loop itself just
        // stops without retrying.
        warn!("🛵️ Not publishing positions for {order_id}: {e}");
        return;
    }
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("🛵️ Position publisher started for order {order_id}");
    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {},
        }
        if *stop_rx.borrow() {
            break;
        }
        let position = match locator.current_position().await {
            Ok(p) => p,
            Err(e) if e.is_permission_denied() => {
                warn!("🛵️ Location permission revoked while tracking {order_id}. Publisher stopping.");
                break;
            },
            Err(e) => {
                debug!("🛵️ Skipping position tick for {order_id}: {e}");
                continue;
            },
        };
        // The position read can be slow; re-check the stop signal so a confirmation issued in
        // the meantime is never trailed by one more write.
        if *stop_rx.borrow() {
            break;
        }
        let update = OrderUpdate::default().with_delivery_location(position);
        match store.update_order(&order_id, update).await {
            Ok(_) => trace!("🛵️ Published position {position} for order {order_id}"),
            Err(e) => debug!("🛵️ Position write for {order_id} failed, tick skipped: {e}"),
        }
    }
    info!("🛵️ Position publisher for order {order_id} has shut down");
}
