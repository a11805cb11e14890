#![allow(dead_code)]
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use log::*;
use nursery_common::GeoPoint;
use nursery_order_engine::{
    db_types::{NewOrder, Order, OrderId, OrderUpdate},
    events::OrderWatch,
    traits::{LocationError, LocationProvider, OrderQueryFilter, OrderStore, OrderStoreError},
    SqliteStore,
};

pub fn init_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
}

pub async fn memory_store() -> SqliteStore {
    init_test_env();
    SqliteStore::new_in_memory().await.expect("Error creating in-memory store")
}

/// A geolocation stand-in that replays a scripted route, then keeps reporting the final point.
pub struct RouteLocator {
    granted: bool,
    route: Mutex<VecDeque<GeoPoint>>,
    last: Mutex<Option<GeoPoint>>,
}

impl RouteLocator {
    pub fn new(route: impl IntoIterator<Item = GeoPoint>) -> Self {
        Self { granted: true, route: Mutex::new(route.into_iter().collect()), last: Mutex::new(None) }
    }

    pub fn denied() -> Self {
        Self { granted: false, route: Mutex::new(VecDeque::new()), last: Mutex::new(None) }
    }
}

#[async_trait]
impl LocationProvider for RouteLocator {
    async fn ensure_permission(&self) -> Result<(), LocationError> {
        if self.granted {
            Ok(())
        } else {
            Err(LocationError::PermissionDenied)
        }
    }

    async fn current_position(&self) -> Result<GeoPoint, LocationError> {
        if !self.granted {
            return Err(LocationError::PermissionDenied);
        }
        let next = self.route.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next.or(*last) {
            Some(p) => {
                *last = Some(p);
                Ok(p)
            },
            None => Err(LocationError::Unavailable("no fix yet".to_string())),
        }
    }
}

/// Wraps a store and counts position writes, so tests can assert that no tick lands after the
/// publisher's stop signal.
#[derive(Clone)]
pub struct CountingStore<B> {
    inner: B,
    position_writes: Arc<AtomicUsize>,
}

impl<B> CountingStore<B> {
    pub fn new(inner: B) -> Self {
        Self { inner, position_writes: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn position_writes(&self) -> usize {
        self.position_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<B: OrderStore> OrderStore for CountingStore<B> {
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
        if update.delivery_location.is_some() {
            self.position_writes.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.update_order(order_id, update).await
    }

    fn watch(&self, order_id: &OrderId) -> OrderWatch {
        self.inner.watch(order_id)
    }
}

/// Polls `cond` until it holds or the timeout lapses.
pub async fn wait_until(timeout_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    cond()
}
