use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use nursery_common::{GeoPoint, Rupees};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// The nursery's dispatch point. Every new order starts its delivery from here until the courier
/// publishes a real position.
pub const DEPOT_LOCATION: GeoPoint = GeoPoint { latitude: 15.590386, longitude: 73.810582 };

//--------------------------------------   DeliveryStatus     --------------------------------------------------------
/// The delivery lifecycle of an order. There are exactly two states; an order is never cancelled
/// or failed, and the only transition is `Pending` to `Delivered`, one way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// The order has been placed and is awaiting (or undergoing) delivery.
    Pending,
    /// The courier has confirmed the drop-off. Terminal.
    Delivered,
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "Pending"),
            DeliveryStatus::Delivered => write!(f, "Delivered"),
        }
    }
}

impl From<String> for DeliveryStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid delivery status in stored record: {value}. Treating the order as Pending.");
            DeliveryStatus::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid delivery status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for DeliveryStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Delivered" => Ok(Self::Delivered),
            s => Err(StatusConversionError(format!("Invalid delivery status: {s}"))),
        }
    }
}

//--------------------------------------       OrderId        --------------------------------------------------------
/// An opaque, client-generated order identifier of the form `ORD-` followed by nine base-36
/// characters. Uniqueness is probabilistic, not guaranteed; the store treats a re-insert of an
/// existing id as idempotent rather than as corruption.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh identifier token at the client, matching the storefront's historical
    /// `ORD-xxxxxxxxx` shape.
    pub fn random() -> Self {
        const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut rng = rand::thread_rng();
        let token: String = (0..9).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect();
        Self(format!("ORD-{token}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------      OrderItem       --------------------------------------------------------
/// One line of the cart at checkout time. Stored verbatim on the order record so that history and
/// reordering survive later catalogue changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Rupees,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, unit_price: Rupees, quantity: u32) -> Self {
        Self { product_id: product_id.into(), name: name.into(), unit_price, quantity }
    }

    pub fn line_total(&self) -> Rupees {
        self.unit_price * i64::from(self.quantity)
    }
}

//--------------------------------------        Order         --------------------------------------------------------
/// A stored order record. `destination` is written once at checkout and never changes;
/// `delivery_location` is overwritten by the courier's position publisher while the order is
/// `Pending`; `delivery_status` is written exactly once, by the courier's confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub items: Vec<OrderItem>,
    pub total: Rupees,
    pub destination: GeoPoint,
    pub delivery_status: DeliveryStatus,
    pub delivery_location: GeoPoint,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_delivered(&self) -> bool {
        self.delivery_status == DeliveryStatus::Delivered
    }
}

//--------------------------------------       NewOrder       --------------------------------------------------------
/// A checkout payload, before the store has assigned a row id. The delivery location starts at
/// the depot; the position publisher takes over from there.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub items: Vec<OrderItem>,
    /// The total charged, including the fixed delivery surcharge.
    pub total: Rupees,
    /// Where the order must be delivered: the customer's position at checkout time.
    pub destination: GeoPoint,
    /// Where the courier starts from.
    pub delivery_location: GeoPoint,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(customer_id: impl Into<String>, items: Vec<OrderItem>, total: Rupees, destination: GeoPoint) -> Self {
        Self {
            order_id: OrderId::random(),
            customer_id: customer_id.into(),
            customer_name: None,
            email: None,
            items,
            total,
            destination,
            delivery_location: DEPOT_LOCATION,
            created_at: Utc::now(),
        }
    }

    pub fn with_customer_details(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self.email = Some(email.into());
        self
    }

    pub fn with_depot(mut self, depot: GeoPoint) -> Self {
        self.delivery_location = depot;
        self
    }

    pub fn is_equivalent(&self, order: &Order) -> bool {
        self.order_id == order.order_id
            && self.customer_id == order.customer_id
            && self.items == order.items
            && self.total == order.total
            && self.destination == order.destination
    }
}

//--------------------------------------     OrderUpdate      --------------------------------------------------------
/// A partial update to the mutable fields of an order record. Every write is an unconditional
/// overwrite of the named field; there is no version check.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub delivery_status: Option<DeliveryStatus>,
    pub delivery_location: Option<GeoPoint>,
}

impl OrderUpdate {
    pub fn with_status(mut self, status: DeliveryStatus) -> Self {
        self.delivery_status = Some(status);
        self
    }

    pub fn with_delivery_location(mut self, location: GeoPoint) -> Self {
        self.delivery_location = Some(location);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.delivery_status.is_none() && self.delivery_location.is_none()
    }
}
