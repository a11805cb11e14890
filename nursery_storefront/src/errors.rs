use nursery_order_engine::{traits::LocationError, OrderFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Could not initialize the storefront. {0}")]
    InitializeError(String),
    #[error("{0}")]
    OrderFlow(#[from] OrderFlowError),
    #[error("{0}")]
    Location(#[from] LocationError),
    #[error("The tracking screen is not mounted")]
    NotMounted,
    #[error("Invalid storefront configuration. {0}")]
    ConfigurationError(String),
}
