//! The presentation-layer collaborators the screen flows write into. The real mobile shell
//! renders maps and dialogs; the engine only needs these narrow seams. Implementations are
//! injected at the composition root ([`crate::sim`] provides simulated ones).
use async_trait::async_trait;
use nursery_common::GeoPoint;
use nursery_order_engine::db_types::OrderId;

/// Navigation targets the order flows can send the shell to. Payload fields carry the same
/// parameters the mobile router passed between screens.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Cart,
    CustomerTracking { order_id: OrderId },
    DeliveryHome,
    DeliveryTracking { order_id: OrderId, destination: GeoPoint },
    OrderHistory,
}

#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, screen: Screen);
    async fn go_back(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
}

/// A blocking yes/no prompt. Cancelling a dialog reads as `No`.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, title: &str, message: &str) -> Choice;
}

/// One-way, non-blocking user alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn alert(&self, title: &str, message: &str);
}
