//! The storefront's screen flows: the state and side-effect logic behind each screen, with all
//! rendering left to the shell. Each flow is constructed with injected collaborators and owns
//! nothing ambient.
mod checkout;
mod customer_tracking;
mod delivery_home;
mod delivery_tracking;
mod order_history;

pub use checkout::{CheckoutFlow, CheckoutOutcome};
pub use customer_tracking::CustomerTrackingScreen;
pub use delivery_home::DeliveryHomeScreen;
pub use delivery_tracking::{DeliveryTrackingScreen, MarkDeliveredOutcome};
pub use order_history::{formatted_order_date, reorder, OrderHistoryScreen};

/// Who is checking out. Authentication and role resolution live outside this crate; flows just
/// receive the resolved identity.
#[derive(Debug, Clone)]
pub struct CustomerDetails {
    pub customer_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl CustomerDetails {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self { customer_id: customer_id.into(), name: None, email: None }
    }

    pub fn with_contact(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.email = Some(email.into());
        self
    }
}
