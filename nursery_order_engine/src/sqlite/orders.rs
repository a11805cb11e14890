use chrono::{DateTime, Utc};
use log::{error, trace};
use nursery_common::{GeoPoint, Rupees};
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{DeliveryStatus, NewOrder, Order, OrderId, OrderItem, OrderUpdate},
    sqlite::SqliteStoreError,
    traits::OrderQueryFilter,
};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    order_id: String,
    customer_id: String,
    customer_name: Option<String>,
    email: Option<String>,
    items: String,
    total: Rupees,
    delivery_status: String,
    dest_latitude: f64,
    dest_longitude: f64,
    delivery_latitude: f64,
    delivery_longitude: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        // A record with unreadable items still renders: history shows an empty item list rather
        // than refusing to load.
        let items = serde_json::from_str::<Vec<OrderItem>>(&row.items).unwrap_or_else(|e| {
            error!("📃️ Order {} has malformed items ({e}). Treating the list as empty.", row.order_id);
            Vec::new()
        });
        Self {
            id: row.id,
            order_id: OrderId::from(row.order_id),
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            email: row.email,
            items,
            total: row.total,
            destination: GeoPoint::new(row.dest_latitude, row.dest_longitude),
            delivery_status: DeliveryStatus::from(row.delivery_status),
            delivery_location: GeoPoint::new(row.delivery_latitude, row.delivery_longitude),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_id, customer_id, customer_name, email, items, total, delivery_status, \
                             dest_latitude, dest_longitude, delivery_latitude, delivery_longitude, created_at, \
                             updated_at";

/// Inserts the order if its `order_id` is not present yet, otherwise leaves the stored record
/// untouched. Returns the stored order and whether an insert happened.
pub(crate) async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), SqliteStoreError> {
    if let Some(existing) = fetch_order_by_order_id(&order.order_id, conn).await? {
        return Ok((existing, false));
    }
    insert_order(&order, conn).await?;
    let stored = fetch_order_by_order_id(&order.order_id, conn)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok((stored, true))
}

/// Inserts a new order using the given connection. Not atomic on its own; embed it in a
/// transaction and pass `&mut *tx` if atomicity with other writes is needed.
async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<(), SqliteStoreError> {
    let items = serde_json::to_string(&order.items)?;
    sqlx::query(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                customer_name,
                email,
                items,
                total,
                delivery_status,
                dest_latitude,
                dest_longitude,
                delivery_latitude,
                delivery_longitude,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(&order.customer_id)
    .bind(&order.customer_name)
    .bind(&order.email)
    .bind(items)
    .bind(order.total)
    .bind(DeliveryStatus::Pending.to_string())
    .bind(order.destination.latitude)
    .bind(order.destination.longitude)
    .bind(order.delivery_location.latitude)
    .bind(order.delivery_location.longitude)
    .bind(order.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Returns the stored record for `order_id`, or `None` if it does not exist.
pub(crate) async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteStoreError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1 LIMIT 1");
    let row = sqlx::query_as::<_, OrderRow>(&sql).bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(row.map(Order::from))
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Results are ordered by creation time, ascending unless the filter asks for newest first.
pub(crate) async fn fetch_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteStoreError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(customer_id) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id);
    }
    if !query.statuses.is_empty() {
        let statuses =
            query.statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("delivery_status IN ({statuses})"));
    }
    if query.newest_first {
        builder.push(" ORDER BY created_at DESC, id DESC");
    } else {
        builder.push(" ORDER BY created_at ASC, id ASC");
    }

    trace!("📃️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<OrderRow>().fetch_all(conn).await?;
    trace!("📃️ Result of fetch_orders: {:?}", rows.len());
    Ok(rows.into_iter().map(Order::from).collect())
}

/// Overwrites the mutable fields named in `update`. Returns the number of affected rows; zero
/// means the record does not exist.
pub(crate) async fn update_order(
    id: &OrderId,
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteStoreError> {
    if update.is_empty() {
        trace!("📃️ No fields to update for order {id}. Update request skipped.");
        return Ok(0);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(status) = update.delivery_status {
        set_clause.push("delivery_status = ");
        set_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(location) = update.delivery_location {
        set_clause.push("delivery_latitude = ");
        set_clause.push_bind_unseparated(location.latitude);
        set_clause.push("delivery_longitude = ");
        set_clause.push_bind_unseparated(location.longitude);
    }
    builder.push(" WHERE order_id = ");
    builder.push_bind(id.as_str());
    trace!("📃️ Executing query: {}", builder.sql());
    let res = builder.build().execute(conn).await?;
    Ok(res.rows_affected())
}
