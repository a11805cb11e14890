//! # SQLite order store
//!
//! The storefront's order records live in a single `orders` table. The store pairs the table
//! with a [`WatchRegistry`] so that every mutation performed through this handle is pushed to
//! all watchers of the affected record, which is the engine's stand-in for a document store's
//! change-subscription primitive. All mutations are unconditional single-row overwrites; there
//! is no optimistic concurrency control, matching the last-write-wins contract of
//! [`OrderStore`].
mod errors;
pub(crate) mod orders;

use std::str::FromStr;

use async_trait::async_trait;
pub use errors::SqliteStoreError;
use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderUpdate},
    events::{OrderWatch, WatchRegistry},
    traits::{OrderQueryFilter, OrderStore, OrderStoreError},
};

const SQLITE_DB_URL: &str = "sqlite://data/nursery_store.db";

pub fn db_url() -> String {
    let result = std::env::var("NURSERY_DATABASE_URL").unwrap_or_else(|_| {
        info!("NURSERY_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

#[derive(Clone)]
pub struct SqliteStore {
    url: String,
    pool: SqlitePool,
    watchers: WatchRegistry,
}

impl SqliteStore {
    /// Opens (creating if necessary) the database at `url` and runs pending migrations.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteStoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./src/sqlite/migrations").run(&pool).await?;
        Ok(Self { url: url.to_string(), pool, watchers: WatchRegistry::new() })
    }

    /// An in-memory store on a single pinned connection. Used by tests and the demo binary.
    pub async fn new_in_memory() -> Result<Self, SqliteStoreError> {
        Self::new_with_url("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The registry backing [`OrderStore::watch`]. Exposed so tests can assert subscription
    /// teardown.
    pub fn watch_registry(&self) -> &WatchRegistry {
        &self.watchers
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    fn url(&self) -> &str {
        &self.url
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError> {
        let mut conn = self.pool.acquire().await.map_err(OrderStoreError::write)?;
        let (stored, inserted) =
            orders::idempotent_insert(order, &mut conn).await.map_err(OrderStoreError::write)?;
        if inserted {
            debug!("🗄️ Order {} stored for customer {}", stored.order_id, stored.customer_id);
            self.watchers.notify(&stored);
        } else {
            debug!("🗄️ Order {} already exists. Insert skipped.", stored.order_id);
        }
        Ok((stored, inserted))
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await.map_err(OrderStoreError::read)?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await.map_err(OrderStoreError::read)
    }

    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await.map_err(OrderStoreError::read)?;
        orders::fetch_orders(query, &mut conn).await.map_err(OrderStoreError::read)
    }

    async fn update_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<Order, OrderStoreError> {
        let mut conn = self.pool.acquire().await.map_err(OrderStoreError::write)?;
        let affected =
            orders::update_order(order_id, update, &mut conn).await.map_err(OrderStoreError::write)?;
        if affected == 0 {
            return Err(OrderStoreError::OrderNotFound(order_id.clone()));
        }
        let stored = orders::fetch_order_by_order_id(order_id, &mut conn)
            .await
            .map_err(OrderStoreError::read)?
            .ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))?;
        self.watchers.notify(&stored);
        Ok(stored)
    }

    fn watch(&self, order_id: &OrderId) -> OrderWatch {
        self.watchers.watch(order_id)
    }

    async fn close(&mut self) -> Result<(), OrderStoreError> {
        self.pool.close().await;
        Ok(())
    }
}
