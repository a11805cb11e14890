use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use nursery_common::{GeoPoint, Rupees};
use nursery_order_engine::{
    db_types::{DeliveryStatus, NewOrder, Order, OrderId, OrderItem, OrderUpdate, DEPOT_LOCATION},
    events::{EventProducers, OrderWatch},
    test_utils::prepare_env::memory_store,
    traits::{OrderQueryFilter, OrderStore, OrderStoreError},
    OrderFlowApi, SqliteStore,
};
use nursery_storefront::{
    screens::{
        CheckoutFlow, CheckoutOutcome, CustomerDetails, CustomerTrackingScreen, DeliveryHomeScreen,
        DeliveryTrackingScreen, MarkDeliveredOutcome,
    },
    sim::{route_between, NavEvent, RecordingAlerts, RecordingNavigator, ScriptedPrompt, SimulatedLocator},
    ui::{Choice, Screen},
    Cart,
};
use tokio::time::timeout;

const TICK: Duration = Duration::from_millis(25);

fn delivery_screen(
    api: OrderFlowApi<SqliteStore>,
    locator: Arc<SimulatedLocator>,
    prompt: ScriptedPrompt,
    alerts: Arc<RecordingAlerts>,
    navigator: Arc<RecordingNavigator>,
) -> DeliveryTrackingScreen<SqliteStore> {
    DeliveryTrackingScreen::new(api, locator, Arc::new(prompt), alerts, navigator, TICK)
}

#[tokio::test]
async fn a_full_delivery_run_end_to_end() {
    let store = memory_store().await;
    let api = OrderFlowApi::new(store.clone(), EventProducers::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let customer_alerts = Arc::new(RecordingAlerts::default());
    let courier_alerts = Arc::new(RecordingAlerts::default());

    // Customer checkout: Rs. 520 of plants plus the Rs. 30 surcharge.
    let mut cart = Cart::default();
    cart.add("areca-palm", "Areca Palm", Rupees::from(250));
    cart.add("snake-plant", "Snake Plant", Rupees::from(150));
    cart.add("rose", "Rose", Rupees::from(120));
    let home = GeoPoint::new(15.598293, 73.807998);
    let checkout = CheckoutFlow::new(
        api.clone(),
        Arc::new(SimulatedLocator::fixed(home)),
        Arc::new(ScriptedPrompt::new(Choice::Yes)),
        customer_alerts.clone(),
        navigator.clone(),
        Rupees::from(30),
        DEPOT_LOCATION,
    );
    let customer = CustomerDetails::new("cust-alice").with_contact("Alice", "alice@example.com");
    let order = match checkout.place_order(&customer, &mut cart).await.unwrap() {
        CheckoutOutcome::Placed(order) => order,
        other => panic!("expected a placed order, got {other:?}"),
    };
    assert_eq!(order.total, Rupees::from(550));
    assert_eq!(order.delivery_location, GeoPoint::new(15.590386, 73.810582));

    // The customer opens their tracking screen and leaves it running.
    let mut customer_screen =
        CustomerTrackingScreen::new(api.clone(), customer_alerts.clone(), navigator.clone());
    customer_screen.mount(&order.order_id).await.unwrap();
    let customer_task = tokio::spawn(async move {
        customer_screen.run_to_completion().await;
    });

    // The courier finds the job on the dashboard.
    let dashboard = DeliveryHomeScreen::new(api.clone(), navigator.clone());
    let pending = dashboard.pending_orders().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].order_id, order.order_id);
    dashboard.open_order(&pending[0]).await;

    // ... and drives the route while positions stream to the record.
    let route = route_between(DEPOT_LOCATION, order.destination, 4);
    let final_stop = *route.last().unwrap();
    let mut screen = delivery_screen(
        api.clone(),
        Arc::new(SimulatedLocator::new(route)),
        ScriptedPrompt::new(Choice::Yes),
        courier_alerts.clone(),
        navigator.clone(),
    );
    screen.mount(&order.order_id).await.unwrap();
    assert!(screen.session().unwrap().has_publisher());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(4);
    let mut reached = false;
    while tokio::time::Instant::now() < deadline {
        let current = api.fetch_order(&order.order_id).await.unwrap().unwrap().delivery_location;
        if current == final_stop {
            reached = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(reached, "the courier never reached the doorstep");

    // Confirmation gate: publisher stops, the terminal write lands, the shell goes home.
    assert_eq!(screen.mark_delivered().await.unwrap(), MarkDeliveredOutcome::Confirmed);
    assert!(!screen.is_active());

    timeout(Duration::from_secs(5), customer_task).await.expect("customer screen never saw delivery").unwrap();

    // Exactly one completion notice on the customer side, then silence.
    let completions: Vec<_> =
        customer_alerts.entries().into_iter().filter(|(title, _)| title == "Order Delivered").collect();
    assert_eq!(completions.len(), 1);

    // Both screens are torn down: no subscriptions remain on the record.
    assert_eq!(store.watch_registry().watcher_count(&order.order_id), 0);

    // The stored record carries the last published position and the terminal status.
    let stored = api.fetch_order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(stored.delivery_status, DeliveryStatus::Delivered);
    assert_eq!(stored.delivery_location, final_stop);

    let events = navigator.events();
    assert!(events.contains(&NavEvent::Navigate(Screen::DeliveryHome)), "courier returned to the dashboard");
    assert!(events.contains(&NavEvent::Back), "customer screen navigated back");
}

#[tokio::test]
async fn backing_out_of_the_confirmation_leaves_the_order_pending() {
    let store = memory_store().await;
    let api = OrderFlowApi::new(store.clone(), EventProducers::default());
    let placed = api
        .place_order(NewOrder::new(
            "cust-bob",
            vec![OrderItem::new("tulsi", "Tulsi", Rupees::from(80), 1)],
            Rupees::from(110),
            GeoPoint::new(15.601, 73.812),
        ))
        .await
        .unwrap();

    let navigator = Arc::new(RecordingNavigator::default());
    let alerts = Arc::new(RecordingAlerts::default());
    let mut screen = delivery_screen(
        api.clone(),
        Arc::new(SimulatedLocator::fixed(DEPOT_LOCATION)),
        ScriptedPrompt::new(Choice::No),
        alerts.clone(),
        navigator.clone(),
    );
    screen.mount(&placed.order_id).await.unwrap();

    assert_eq!(screen.mark_delivered().await.unwrap(), MarkDeliveredOutcome::Cancelled);
    // Nothing moved: the order is untouched and the screen still tracks.
    assert!(screen.is_active());
    let stored = api.fetch_order(&placed.order_id).await.unwrap().unwrap();
    assert_eq!(stored.delivery_status, DeliveryStatus::Pending);
    assert!(!navigator.events().contains(&NavEvent::Navigate(Screen::DeliveryHome)));

    screen.unmount().await;
    assert_eq!(store.watch_registry().watcher_count(&placed.order_id), 0);
}

/// A backend whose next status write fails, standing in for a network drop at the worst moment.
#[derive(Clone)]
struct FlakyStore {
    inner: SqliteStore,
    fail_next_status_write: Arc<AtomicBool>,
}

impl FlakyStore {
    fn new(inner: SqliteStore) -> Self {
        Self { inner, fail_next_status_write: Arc::new(AtomicBool::new(true)) }
    }
}

#[async_trait]
impl OrderStore for FlakyStore {
    fn url(&self) -> &str {
        self.inner.url()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError> {
        self.inner.insert_order(order).await
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        self.inner.fetch_order(order_id).await
    }

    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError> {
        self.inner.fetch_orders(query).await
    }

    async fn update_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<Order, OrderStoreError> {
        if update.delivery_status.is_some() && self.fail_next_status_write.swap(false, Ordering::SeqCst) {
            return Err(OrderStoreError::write("connection reset mid-write"));
        }
        self.inner.update_order(order_id, update).await
    }

    fn watch(&self, order_id: &OrderId) -> OrderWatch {
        self.inner.watch(order_id)
    }
}

#[tokio::test]
async fn a_failed_status_write_leaves_the_action_retryable() {
    let store = FlakyStore::new(memory_store().await);
    let api = OrderFlowApi::new(store.clone(), EventProducers::default());
    let placed = api
        .place_order(NewOrder::new(
            "cust-carol",
            vec![OrderItem::new("fern", "Fern", Rupees::from(200), 1)],
            Rupees::from(230),
            GeoPoint::new(15.596, 73.809),
        ))
        .await
        .unwrap();

    let navigator = Arc::new(RecordingNavigator::default());
    let alerts = Arc::new(RecordingAlerts::default());
    let mut screen = DeliveryTrackingScreen::new(
        api.clone(),
        Arc::new(SimulatedLocator::fixed(DEPOT_LOCATION)),
        Arc::new(ScriptedPrompt::new(Choice::Yes)),
        alerts.clone(),
        navigator.clone(),
        TICK,
    );
    screen.mount(&placed.order_id).await.unwrap();

    // First attempt: the write dies. The order stays Pending and the courier is told.
    assert!(screen.mark_delivered().await.is_err());
    assert_eq!(alerts.count(), 1);
    assert!(screen.is_active(), "a failed confirmation must not tear the screen down");
    let stored = api.fetch_order(&placed.order_id).await.unwrap().unwrap();
    assert_eq!(stored.delivery_status, DeliveryStatus::Pending);

    // Re-invoking the action succeeds.
    assert_eq!(screen.mark_delivered().await.unwrap(), MarkDeliveredOutcome::Confirmed);
    let stored = api.fetch_order(&placed.order_id).await.unwrap().unwrap();
    assert_eq!(stored.delivery_status, DeliveryStatus::Delivered);
    assert_eq!(navigator.last(), Some(NavEvent::Navigate(Screen::DeliveryHome)));
}
