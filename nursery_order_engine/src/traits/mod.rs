//! Behaviour contracts for the engine's external collaborators: the order store backend and the
//! device geolocation service. Concrete implementations are injected at the composition root;
//! nothing in the engine reaches for an ambient singleton.
mod location;
mod order_store;

pub use location::{LocationError, LocationProvider};
pub use order_store::{OrderQueryFilter, OrderStore, OrderStoreError};
