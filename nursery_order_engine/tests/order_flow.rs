use nursery_common::{GeoPoint, Rupees};
use nursery_order_engine::{
    db_types::{DeliveryStatus, NewOrder, OrderItem, DEPOT_LOCATION},
    events::EventProducers,
    traits::{OrderQueryFilter, OrderStore},
    OrderFlowApi, SqliteStore,
};

mod support;

use support::memory_store;

fn checkout_items() -> Vec<OrderItem> {
    vec![
        OrderItem::new("areca-palm", "Areca Palm", Rupees::from(250), 1),
        OrderItem::new("snake-plant", "Snake Plant", Rupees::from(150), 1),
        OrderItem::new("rose", "Rose", Rupees::from(120), 1),
    ]
}

fn checkout_order() -> NewOrder {
    let items = checkout_items();
    let subtotal: Rupees = items.iter().map(OrderItem::line_total).sum();
    let total = subtotal + Rupees::from(30);
    NewOrder::new("cust-alice", items, total, GeoPoint::new(15.598293, 73.807998))
        .with_customer_details("Alice", "alice@example.com")
}

async fn api() -> OrderFlowApi<SqliteStore> {
    OrderFlowApi::new(memory_store().await, EventProducers::default())
}

#[tokio::test]
async fn checkout_creates_a_pending_order_at_the_depot() {
    let api = api().await;
    let placed = api.place_order(checkout_order()).await.expect("Error placing order");

    assert_eq!(placed.total, Rupees::from(550));
    assert_eq!(placed.delivery_status, DeliveryStatus::Pending);
    assert_eq!(placed.delivery_location, DEPOT_LOCATION);
    assert_eq!(placed.delivery_location, GeoPoint::new(15.590386, 73.810582));
    assert_eq!(placed.destination, GeoPoint::new(15.598293, 73.807998));
    assert_eq!(placed.items, checkout_items());
    assert_eq!(placed.customer_name.as_deref(), Some("Alice"));

    let fetched = api.fetch_order(&placed.order_id).await.unwrap().expect("order vanished");
    assert_eq!(fetched, placed);
}

#[tokio::test]
async fn placing_the_same_order_twice_is_idempotent() {
    let store = memory_store().await;
    let order = checkout_order();
    let (first, inserted) = store.insert_order(order.clone()).await.expect("Error inserting order");
    assert!(inserted);
    let (second, inserted) = store.insert_order(order.clone()).await.expect("Error re-inserting order");
    assert!(!inserted);
    assert_eq!(first, second);
    assert!(order.is_equivalent(&second));
}

#[tokio::test]
async fn delivery_status_only_moves_forward() {
    let api = api().await;
    let placed = api.place_order(checkout_order()).await.unwrap();
    assert_eq!(placed.delivery_status, DeliveryStatus::Pending);

    let delivered = api.mark_delivered(&placed.order_id).await.expect("Error marking delivered");
    assert_eq!(delivered.delivery_status, DeliveryStatus::Delivered);

    // Re-marking is a harmless overwrite: no error, no observable change.
    let again = api.mark_delivered(&placed.order_id).await.expect("Second mark must not fail");
    assert_eq!(again.delivery_status, DeliveryStatus::Delivered);
    assert_eq!(again.order_id, delivered.order_id);

    let stored = api.fetch_order(&placed.order_id).await.unwrap().unwrap();
    assert_eq!(stored.delivery_status, DeliveryStatus::Delivered);
}

#[tokio::test]
async fn missing_records_read_as_absent_not_as_failures() {
    let api = api().await;
    let ghost = "ORD-missing01".parse().unwrap();

    // A plain read reports "not there yet" without erroring.
    assert!(api.fetch_order(&ghost).await.unwrap().is_none());

    // Asking for the destination of an order that should exist is a hard error.
    let err = api.fetch_destination(&ghost).await.expect_err("destination of a ghost order");
    assert!(err.is_not_found());

    // So is mutating it.
    let err = api.mark_delivered(&ghost).await.expect_err("delivering a ghost order");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn dashboards_see_the_right_slices() {
    let api = api().await;
    let a = api
        .place_order(NewOrder::new(
            "cust-alice",
            checkout_items(),
            Rupees::from(550),
            GeoPoint::new(15.598, 73.808),
        ))
        .await
        .unwrap();
    let b = api
        .place_order(NewOrder::new(
            "cust-bob",
            vec![OrderItem::new("tulsi", "Tulsi", Rupees::from(80), 2)],
            Rupees::from(190),
            GeoPoint::new(15.601, 73.812),
        ))
        .await
        .unwrap();
    let a2 = api
        .place_order(NewOrder::new(
            "cust-alice",
            vec![OrderItem::new("fern", "Fern", Rupees::from(200), 1)],
            Rupees::from(230),
            GeoPoint::new(15.598, 73.808),
        ))
        .await
        .unwrap();
    api.mark_delivered(&a.order_id).await.unwrap();

    // The delivery dashboard lists Pending orders only, oldest first.
    let pending = api.pending_orders().await.unwrap();
    let pending_ids: Vec<_> = pending.iter().map(|o| o.order_id.clone()).collect();
    assert_eq!(pending_ids, vec![b.order_id.clone(), a2.order_id.clone()]);

    // History is per customer, newest first, and includes delivered orders.
    let history = api.history_for_customer("cust-alice").await.unwrap();
    let history_ids: Vec<_> = history.iter().map(|o| o.order_id.clone()).collect();
    assert_eq!(history_ids, vec![a2.order_id.clone(), a.order_id.clone()]);

    // The admin view reads everything.
    let all = api.search_orders(OrderQueryFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn malformed_records_degrade_instead_of_crashing() {
    let store = memory_store().await;
    let api = OrderFlowApi::new(store.clone(), EventProducers::default());
    let placed = api.place_order(checkout_order()).await.unwrap();

    sqlx::query("UPDATE orders SET items = 'not-json', delivery_status = 'Shipped' WHERE order_id = $1")
        .bind(placed.order_id.as_str())
        .execute(store.pool())
        .await
        .expect("Error corrupting the record");

    let order = api.fetch_order(&placed.order_id).await.unwrap().expect("order must still load");
    assert!(order.items.is_empty());
    assert_eq!(order.delivery_status, DeliveryStatus::Pending);
}
