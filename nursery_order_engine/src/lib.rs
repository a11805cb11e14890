//! Nursery Order Engine
//!
//! The order lifecycle and live delivery tracking core of the nursery storefront. The library
//! is divided into three main sections:
//! 1. Order storage ([`SqliteStore`] behind the [`traits::OrderStore`] contract). The store
//!    keeps one record per checkout and doubles as the change-notification source: every
//!    mutation made through a store handle is pushed to all watchers of the affected record.
//! 2. The order flow API ([`OrderFlowApi`]): placing orders, publishing courier positions,
//!    confirming delivery, and the dashboard/history queries. Constructed at the application's
//!    composition root with an injected backend; there are no ambient service handles.
//! 3. Live tracking ([`mod@tracking`]): the courier-side [`tracking::PositionPublisher`]
//!    interval task and the screen-scoped [`tracking::TrackingSession`] that turns raw record
//!    snapshots into position and delivered-edge updates.
//!
//! The engine also provides a set of events that can be hooked into ([`mod@events`]): an order
//! being created and an order being delivered. Hooks are global and fire-and-forget; per-record
//! watches are the lifecycle-managed counterpart for screens.
mod api;
pub mod db_types;
pub mod events;
mod sqlite;
pub mod tracking;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{OrderFlowApi, OrderFlowError};
pub use sqlite::{db_url, SqliteStore, SqliteStoreError};
