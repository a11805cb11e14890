use std::{path::Path, sync::Arc};

use dotenvy::dotenv;
use futures::FutureExt;
use log::*;
use nursery_common::{GeoPoint, Rupees};
use nursery_order_engine::{
    events::{EventHandlers, EventHooks},
    tracking::TrackingUpdate,
    OrderFlowApi, SqliteStore,
};
use nursery_storefront::{
    screens::{
        formatted_order_date, CheckoutFlow, CheckoutOutcome, CustomerDetails, CustomerTrackingScreen,
        DeliveryHomeScreen, DeliveryTrackingScreen, MarkDeliveredOutcome, OrderHistoryScreen,
    },
    sim::{route_between, RecordingAlerts, RecordingNavigator, ScriptedPrompt, SimulatedLocator},
    ui::Choice,
    AppConfig, Cart, StorefrontError,
};
use tokio::time::timeout;

/// Drives one simulated order from checkout to delivery with every collaborator stubbed by the
/// `sim` module, which is as close to the real shop as a terminal gets.
#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = AppConfig::from_env_or_default();

    info!("🚀️ Nursery storefront demo starting");
    match run_demo(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}

async fn run_demo(config: AppConfig) -> Result<(), StorefrontError> {
    let started = chrono::Utc::now();
    ensure_db_directory(&config.database_url);
    let store = SqliteStore::new_with_url(&config.database_url, 5)
        .await
        .map_err(|e| StorefrontError::InitializeError(e.to_string()))?;

    // Hooks stand in for the shop's notification side.
    let mut hooks = EventHooks::default();
    hooks.on_order_created(|event| {
        async move {
            info!("📣️ New order {} is ready for dispatch ({})", event.order.order_id, event.order.total);
        }
        .boxed()
    });
    hooks.on_order_delivered(|event| {
        async move {
            info!("📣️ Order {} delivered for customer {}", event.order.order_id, event.order.customer_id);
        }
        .boxed()
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let api = OrderFlowApi::new(store, producers);
    let navigator = Arc::new(RecordingNavigator::default());
    let alerts = Arc::new(RecordingAlerts::default());

    // Customer side: fill the cart and check out.
    let customer = CustomerDetails::new("demo-customer").with_contact("Asha", "asha@example.com");
    let mut cart = Cart::default();
    cart.add("areca-palm", "Areca Palm", Rupees::from(250));
    cart.add("snake-plant", "Snake Plant", Rupees::from(150));
    cart.add("rose", "Rose", Rupees::from(120));
    info!("🚀️ Cart subtotal {} + delivery {}", cart.subtotal(), config.delivery_fee);

    let home = GeoPoint::new(15.598293, 73.807998);
    let checkout = CheckoutFlow::new(
        api.clone(),
        Arc::new(SimulatedLocator::fixed(home)),
        Arc::new(ScriptedPrompt::new(Choice::Yes)),
        alerts.clone(),
        navigator.clone(),
        config.delivery_fee,
        config.depot,
    );
    let order = match checkout.place_order(&customer, &mut cart).await? {
        CheckoutOutcome::Placed(order) => order,
        other => {
            return Err(StorefrontError::InitializeError(format!("checkout did not complete: {other:?}")))
        },
    };

    // The customer keeps their tracking screen open until the plants arrive.
    let mut customer_screen = CustomerTrackingScreen::new(api.clone(), alerts.clone(), navigator.clone());
    customer_screen.mount(&order.order_id).await?;
    let customer_task = tokio::spawn(async move {
        customer_screen.run_to_completion().await;
    });

    // Delivery side: pick the job off the dashboard and drive the route.
    let dashboard = DeliveryHomeScreen::new(api.clone(), navigator.clone());
    let pending = dashboard.pending_orders().await?;
    info!("🚀️ Dashboard shows {} pending order(s)", pending.len());
    let job = pending
        .iter()
        .find(|o| o.order_id == order.order_id)
        .cloned()
        .ok_or_else(|| StorefrontError::InitializeError("placed order missing from dashboard".to_string()))?;
    dashboard.open_order(&job).await;

    let route = route_between(config.depot, job.destination, 6);
    let final_stop = *route.last().expect("route cannot be empty");
    let mut delivery_screen = DeliveryTrackingScreen::new(
        api.clone(),
        Arc::new(SimulatedLocator::new(route)),
        Arc::new(ScriptedPrompt::new(Choice::Yes)),
        alerts.clone(),
        navigator.clone(),
        config.publish_interval,
    );
    delivery_screen.mount(&job.order_id).await?;

    // Watch the courier close in until the route is exhausted.
    while let Ok(Some(update)) = timeout(config.publish_interval * 3, delivery_screen.next_update()).await {
        if let TrackingUpdate::Position(p) = update {
            info!("🚀️ Courier at {p}, {:.0}m to go", p.distance_m(&job.destination));
            if p == final_stop {
                break;
            }
        }
    }

    match delivery_screen.mark_delivered().await? {
        MarkDeliveredOutcome::Confirmed => info!("🚀️ Delivery confirmed"),
        MarkDeliveredOutcome::Cancelled => warn!("🚀️ Courier backed out of the confirmation"),
    }
    if let Err(e) = customer_task.await {
        warn!("🚀️ Customer screen task failed: {e}");
    }

    // Afterwards: the order is history.
    let history = OrderHistoryScreen::new(api.clone());
    for past in history.orders_for(&customer.customer_id).await? {
        info!(
            "🚀️ {} — {} — {} item lines — {} — {}",
            past.order_id,
            formatted_order_date(&past),
            past.items.len(),
            past.total,
            past.delivery_status
        );
    }

    let elapsed = chrono::Utc::now() - started;
    info!("🚀️ Demo complete in {}ms", elapsed.num_milliseconds());
    Ok(())
}

/// `create_if_missing` creates the database file, but not its parent directory.
fn ensure_db_directory(url: &str) {
    if let Some(path) = url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
    }
}
